//! # App
//!
//! Headless orchestrator. Watches controller snapshots and loads fleet data
//! whenever credentials are valid and the selection changed:
//!
//! ```text
//! ModeSnapshot ──valid?──► list groups ──► vehicles (selected group or all)
//!                                               │
//!                                               ├──► optional recent positions
//!                                               └──► GPS_STATS_UPDATE / GPS_ERROR
//! ```
//!
//! Load failures are reported to the parent and logged; the loop keeps
//! running.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use shared::dto::{Group, Vehicle};
use shared::protocol::StatsStatus;
use shared::utils::{format_coordinates, format_odometer};

use crate::core::error::GpsError;
use crate::core::service::GpsApi;
use crate::embed::{ModeController, ModeSnapshot, ParentReporter};
use crate::services::api::DEFAULT_HISTORY_LIMIT;
use crate::session::AppMode;

#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Positions kept per vehicle when history is loaded.
    pub history_limit: usize,
    /// Attach recent positions to every listed vehicle.
    pub load_history: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            load_history: false,
        }
    }
}

/// Result of one successful load.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub mode: AppMode,
    pub group_code: Option<String>,
    pub groups: Vec<Group>,
    pub vehicles: Vec<Vehicle>,
    pub loaded_at: DateTime<Utc>,
}

/// What a load depends on. The token only counts in dev mode; in production
/// a refresh rotates it without changing what is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadKey {
    mode: AppMode,
    group_code: Option<String>,
    dev_token: Option<String>,
}

impl LoadKey {
    fn of(snapshot: &ModeSnapshot) -> Self {
        Self {
            mode: snapshot.mode,
            group_code: snapshot.selected_group.clone(),
            dev_token: (snapshot.mode == AppMode::Dev).then(|| snapshot.token.clone()),
        }
    }
}

pub struct App {
    controller: Arc<ModeController>,
    gps: Arc<dyn GpsApi>,
    reporter: ParentReporter,
    options: AppOptions,
}

impl App {
    pub fn new(
        controller: Arc<ModeController>,
        gps: Arc<dyn GpsApi>,
        reporter: ParentReporter,
        options: AppOptions,
    ) -> Self {
        Self {
            controller,
            gps,
            reporter,
            options,
        }
    }

    /// Load groups and vehicles for `snapshot`'s selection.
    #[tracing::instrument(skip_all, fields(mode = %snapshot.mode, group_code = ?snapshot.selected_group))]
    pub async fn load(&self, snapshot: &ModeSnapshot) -> Result<DashboardView, GpsError> {
        self.reporter.stats(0, 0, StatsStatus::Offline);

        let groups = self
            .gps
            .list_groups()
            .await
            .map_err(|e| self.report_failure(e))?;

        let vehicles = match snapshot.selected_group.as_deref() {
            Some(code) => self.gps.vehicles_by_group(code).await,
            None => self.gps.all_vehicles().await,
        }
        .map_err(|e| self.report_failure(e))?;

        let vehicles = if self.options.load_history {
            self.attach_history(vehicles).await
        } else {
            vehicles
        };

        self.reporter.stats(vehicles.len(), groups.len(), StatsStatus::Online);
        tracing::info!(groups = groups.len(), vehicles = vehicles.len(), "Dashboard loaded");

        Ok(DashboardView {
            mode: snapshot.mode,
            group_code: snapshot.selected_group.clone(),
            groups,
            vehicles,
            loaded_at: Utc::now(),
        })
    }

    /// One vehicle with its recent positions.
    pub async fn vehicle_detail(&self, vehicle_code: &str) -> Result<Vehicle, GpsError> {
        let mut vehicle = self.gps.vehicle(vehicle_code).await?;
        let positions = self
            .gps
            .vehicle_history(vehicle_code, self.options.history_limit)
            .await;
        vehicle.recent_positions = Some(positions);
        Ok(vehicle)
    }

    /// React to snapshot changes until `shutdown` resolves or the controller
    /// goes away. A failed load is retried once the selection or the token
    /// changes; `shutdown` also interrupts a load in flight.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut snapshots = self.controller.subscribe();
        let mut announced = false;
        let mut loaded: Option<LoadKey> = None;
        let mut failed: Option<(LoadKey, String)> = None;
        tokio::pin!(shutdown);

        loop {
            let snapshot = snapshots.borrow_and_update().clone();

            match snapshot.mode {
                AppMode::Production if !announced => announced = self.reporter.ready(),
                AppMode::Dev => announced = false,
                _ => {}
            }

            if snapshot.token_is_valid {
                let key = LoadKey::of(&snapshot);
                let attempt = (key.clone(), snapshot.token.clone());
                if loaded.as_ref() != Some(&key) && failed.as_ref() != Some(&attempt) {
                    let outcome = tokio::select! {
                        outcome = self.load(&snapshot) => outcome,
                        _ = &mut shutdown => {
                            tracing::info!("Shutdown requested during load");
                            break;
                        }
                    };
                    match outcome {
                        Ok(view) => {
                            log_view(&view);
                            loaded = Some(key);
                            failed = None;
                        }
                        Err(_) => {
                            tracing::info!("Load failed, waiting for new credentials or selection");
                            failed = Some(attempt);
                        }
                    }
                }
            } else {
                let had_load = loaded.take().is_some();
                failed = None;
                if had_load {
                    tracing::info!(mode = %snapshot.mode, "Credentials no longer valid, waiting");
                }
            }

            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
            }
        }
    }

    async fn attach_history(&self, vehicles: Vec<Vehicle>) -> Vec<Vehicle> {
        let limit = self.options.history_limit;
        let histories = join_all(
            vehicles
                .iter()
                .map(|vehicle| self.gps.vehicle_history(&vehicle.code, limit)),
        )
        .await;

        vehicles
            .into_iter()
            .zip(histories)
            .map(|(mut vehicle, positions)| {
                vehicle.recent_positions = Some(positions);
                vehicle
            })
            .collect()
    }

    fn report_failure(&self, err: GpsError) -> GpsError {
        tracing::error!(code = err.code(), error = %err, "Dashboard load failed");
        self.reporter.error(&err);
        self.reporter.stats(0, 0, StatsStatus::Error);
        err
    }
}

fn log_view(view: &DashboardView) {
    for vehicle in &view.vehicles {
        tracing::debug!(
            code = %vehicle.code,
            name = %vehicle.name,
            spz = %vehicle.spz,
            position = %format_coordinates(&vehicle.last_position),
            odometer = %format_odometer(vehicle.odometer),
            speed = vehicle.speed,
            "Vehicle"
        );
    }
}
