//! # Mode Controller
//!
//! Owns the credential state machine of the dashboard:
//!
//! ```text
//! Uninitialized ──start()──► Dev ◄──set_mode()──► Production
//! ```
//!
//! - **Dev**: the user enters a token; it is persisted and restored on the
//!   next switch back to dev. Parent messages are ignored.
//! - **Production**: credentials come from the parent. A handshake task asks
//!   for the token and group at a fixed cadence until both are present.
//!
//! Every change publishes a [`ModeSnapshot`] that the app loop watches.
//! Background tasks hold only a `Weak` reference to the controller and are
//! aborted on a switch to dev, on [`ModeController::shutdown`] and on drop.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use lib_utils::normalize_non_empty;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared::protocol::{
    build_legacy_group_request, build_legacy_token_request, build_request_group, build_request_token,
    GROUP_CODE_ATTRIBUTE,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::channel::{events_from_message, ParentChannel};
use super::frame::{forward_group_attribute, FrameElement};
use crate::core::error::AppError;
use crate::session::{AppMode, Session};
use crate::storage::{Storage, DEV_TOKEN_KEY, MODE_KEY};

pub const DEFAULT_HANDSHAKE_INTERVAL: Duration = Duration::from_secs(2);

/// Where a group selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrigin {
    Message,
    FrameAttribute,
    User,
}

/// Credential update delivered to the controller.
#[derive(Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    TokenReceived(String),
    GroupSelected { code: String, origin: GroupOrigin },
}

impl fmt::Debug for ControllerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerEvent::TokenReceived(_) => f.debug_tuple("TokenReceived").field(&"<redacted>").finish(),
            ControllerEvent::GroupSelected { code, origin } => f
                .debug_struct("GroupSelected")
                .field("code", code)
                .field("origin", origin)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Delay between credential requests while embedded.
    pub handshake_interval: Duration,
    /// Also post `request_access_token` / `request_group_code`.
    pub legacy_requests: bool,
    /// Overrides the persisted mode on start.
    pub initial_mode: Option<AppMode>,
    /// Seeded when no dev token is persisted. Never counts as user-set.
    pub default_dev_token: Option<String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            handshake_interval: DEFAULT_HANDSHAKE_INTERVAL,
            legacy_requests: true,
            initial_mode: None,
            default_dev_token: None,
        }
    }
}

/// Published view of the credential state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ModeSnapshot {
    pub started: bool,
    pub mode: AppMode,
    pub token: String,
    pub is_user_token: bool,
    pub received_from_parent: bool,
    pub selected_group: Option<String>,
    pub token_is_valid: bool,
}

impl ModeSnapshot {
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

impl fmt::Debug for ModeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeSnapshot")
            .field("started", &self.started)
            .field("mode", &self.mode)
            .field("has_token", &self.has_token())
            .field("is_user_token", &self.is_user_token)
            .field("received_from_parent", &self.received_from_parent)
            .field("selected_group", &self.selected_group)
            .field("token_is_valid", &self.token_is_valid)
            .finish()
    }
}

/// Whether the held token may be used for data loading.
///
/// - dev: a non-empty token the user set explicitly
/// - production: a non-empty token from the parent and a selected group
pub fn token_is_valid(
    mode: AppMode,
    token: &str,
    is_user_token: bool,
    received_from_parent: bool,
    selected_group: Option<&str>,
) -> bool {
    if token.is_empty() {
        return false;
    }
    match mode {
        AppMode::Dev => is_user_token,
        AppMode::Production => received_from_parent && selected_group.is_some_and(|g| !g.is_empty()),
    }
}

#[derive(Debug, Default)]
struct Credentials {
    started: bool,
    is_user_token: bool,
    received_from_parent: bool,
    selected_group: Option<String>,
}

#[derive(Default)]
struct Tasks {
    events: Option<JoinHandle<()>>,
    handshake: Option<JoinHandle<()>>,
    attribute: Option<JoinHandle<()>>,
}

impl Tasks {
    fn abort_embedded(&mut self) {
        for handle in [self.handshake.take(), self.attribute.take()].into_iter().flatten() {
            handle.abort();
        }
    }

    fn abort_all(&mut self) {
        self.abort_embedded();
        if let Some(handle) = self.events.take() {
            handle.abort();
        }
    }
}

pub struct ModeController {
    session: Arc<Session>,
    storage: Arc<dyn Storage>,
    parent: Arc<dyn ParentChannel>,
    frame: Option<Arc<FrameElement>>,
    options: ControllerOptions,
    state: RwLock<Credentials>,
    snapshots: watch::Sender<ModeSnapshot>,
    events_tx: async_channel::Sender<ControllerEvent>,
    events_rx: async_channel::Receiver<ControllerEvent>,
    tasks: Mutex<Tasks>,
}

impl ModeController {
    pub fn new(
        session: Arc<Session>,
        storage: Arc<dyn Storage>,
        parent: Arc<dyn ParentChannel>,
        frame: Option<Arc<FrameElement>>,
        options: ControllerOptions,
    ) -> Arc<Self> {
        let (snapshots, _) = watch::channel(ModeSnapshot::default());
        let (events_tx, events_rx) = async_channel::unbounded();
        let controller = Arc::new(Self {
            session,
            storage,
            parent,
            frame,
            options,
            state: RwLock::new(Credentials::default()),
            snapshots,
            events_tx,
            events_rx,
            tasks: Mutex::new(Tasks::default()),
        });
        controller.publish();
        controller
    }

    /// Enter the initial mode. Must be called from within a tokio runtime;
    /// calling it twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        {
            let mut state = self.state.write();
            if state.started {
                tracing::debug!("Mode controller already started");
                return;
            }
            state.started = true;
        }

        let persisted = self.storage.get(MODE_KEY).and_then(|raw| AppMode::parse(&raw));
        let mode = self.options.initial_mode.or(persisted).unwrap_or_default();

        if !self.session.has_token() {
            let seed = self.saved_dev_token().or_else(|| self.default_dev_token());
            if let Some(seed) = seed {
                self.session.set_token(seed);
            }
        }

        let events = self.spawn_event_loop();
        self.tasks.lock().events = Some(events);

        tracing::info!(mode = %mode, persisted = ?persisted.map(|m| m.as_str()), "Mode controller started");
        self.session.set_mode(mode);
        self.persist_mode(mode);
        self.enter(mode);
    }

    /// Switch modes. Returns `false` when already in `mode`.
    pub fn set_mode(self: &Arc<Self>, mode: AppMode) -> bool {
        if !self.state.read().started {
            self.start();
        }
        if !self.session.set_mode(mode) {
            return false;
        }

        tracing::info!(mode = %mode, "Switching mode");
        self.persist_mode(mode);
        self.enter(mode);
        true
    }

    pub fn toggle_mode(self: &Arc<Self>) -> AppMode {
        let next = self.session.mode().toggled();
        self.set_mode(next);
        next
    }

    /// Token typed by the user. In dev mode it is persisted and counts as
    /// delivered.
    pub fn set_token(&self, raw: &str) -> Result<(), AppError> {
        let token = normalize_non_empty(raw, "Token").map_err(AppError::Validation)?;
        let mode = self.session.mode();

        self.session.set_token(token.clone());
        {
            let mut state = self.state.write();
            state.is_user_token = true;
            if mode == AppMode::Dev {
                state.received_from_parent = true;
            }
        }

        if mode == AppMode::Dev {
            if let Err(e) = self.storage.set(DEV_TOKEN_KEY, &token) {
                tracing::warn!(error = %e, "Failed to persist dev token");
            }
        }

        tracing::info!(mode = %mode, "Token set by user");
        self.publish();
        Ok(())
    }

    /// Group picked by the user; `None` or an empty code clears the selection.
    pub fn set_selected_group(&self, code: Option<&str>) {
        let code = code.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
        tracing::debug!(group_code = ?code, "Group selected by user");
        self.state.write().selected_group = code;
        self.publish();
    }

    /// Apply one credential update. Returns `true` when it was accepted.
    pub fn apply(&self, event: ControllerEvent) -> bool {
        let mode = self.session.mode();
        match event {
            ControllerEvent::TokenReceived(token) => {
                if mode != AppMode::Production {
                    tracing::debug!(mode = %mode, "Ignoring parent token outside production");
                    return false;
                }
                if token.trim().is_empty() {
                    return false;
                }
                self.session.set_token(token);
                {
                    let mut state = self.state.write();
                    state.received_from_parent = true;
                    state.is_user_token = true;
                }
                tracing::info!("Token received from parent");
            }
            ControllerEvent::GroupSelected { code, origin } => {
                if origin != GroupOrigin::User && mode != AppMode::Production {
                    tracing::debug!(origin = ?origin, "Ignoring parent group outside production");
                    return false;
                }
                let code = code.trim();
                if code.is_empty() {
                    return false;
                }
                tracing::info!(group_code = %code, origin = ?origin, "Group selected");
                self.state.write().selected_group = Some(code.to_string());
            }
        }
        self.publish();
        true
    }

    /// Decode and apply a raw parent message. Returns the number of updates
    /// accepted; malformed messages change nothing.
    pub fn handle_message(&self, raw: &Value) -> usize {
        events_from_message(raw)
            .into_iter()
            .filter(|event| self.apply(event.clone()))
            .count()
    }

    /// Sender for inbound adapters running outside the controller.
    pub fn event_sender(&self) -> async_channel::Sender<ControllerEvent> {
        self.events_tx.clone()
    }

    pub fn snapshot(&self) -> ModeSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModeSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn handshake_active(&self) -> bool {
        self.tasks
            .lock()
            .handshake
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop all background work and close the inbound event channel.
    pub fn shutdown(&self) {
        self.tasks.lock().abort_all();
        self.events_tx.close();
        tracing::info!("Mode controller stopped");
    }

    fn enter(self: &Arc<Self>, mode: AppMode) {
        match mode {
            AppMode::Dev => self.enter_dev(),
            AppMode::Production => self.enter_production(),
        }
    }

    fn enter_dev(&self) {
        self.tasks.lock().abort_embedded();

        if let Some(saved) = self.saved_dev_token() {
            self.session.set_token(saved);
        } else if let Some(preset) = self.default_dev_token().filter(|_| !self.session.has_token()) {
            self.session.set_token(preset);
        }
        self.state.write().received_from_parent = true;

        tracing::debug!(has_token = self.session.has_token(), "Entered dev mode");
        self.publish();
    }

    fn enter_production(self: &Arc<Self>) {
        let token = self.session.token();
        let is_dev_token = self.saved_dev_token().is_some_and(|saved| saved == token)
            || self.options.default_dev_token.as_deref() == Some(token.as_str());
        if !token.is_empty() && is_dev_token {
            self.session.clear_token();
        }
        self.state.write().received_from_parent = false;
        self.publish();

        let handshake = self.spawn_handshake();
        let attribute = self.frame.as_ref().map(|frame| {
            tokio::spawn(forward_group_attribute(
                frame.observe(GROUP_CODE_ATTRIBUTE),
                self.events_tx.clone(),
            ))
        });

        let mut tasks = self.tasks.lock();
        tasks.abort_embedded();
        tasks.handshake = Some(handshake);
        tasks.attribute = attribute;
        tracing::debug!(frame = self.frame.is_some(), "Entered production mode");
    }

    fn spawn_event_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let events = self.events_rx.clone();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                controller.apply(event);
            }
        })
    }

    fn spawn_handshake(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        // interval() panics on a zero period
        let period = self.options.handshake_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut rounds: u64 = 0;
            loop {
                ticker.tick().await;
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                if controller.handshake_complete() {
                    tracing::info!(rounds, "All required data received, stopping requests");
                    break;
                }
                controller.request_credentials();
                rounds += 1;
            }
        })
    }

    fn handshake_complete(&self) -> bool {
        let state = self.state.read();
        state.received_from_parent && state.selected_group.is_some() && self.session.has_token()
    }

    fn request_credentials(&self) {
        let mut outbound = vec![build_request_token().to_value(), build_request_group().to_value()];
        if self.options.legacy_requests {
            outbound.push(build_legacy_token_request());
            outbound.push(build_legacy_group_request());
        }
        for message in outbound {
            if let Err(e) = self.parent.post_value(message) {
                tracing::warn!(error = %e, "Failed to request credentials from parent");
            }
        }
    }

    fn saved_dev_token(&self) -> Option<String> {
        self.storage.get(DEV_TOKEN_KEY).filter(|token| !token.is_empty())
    }

    fn default_dev_token(&self) -> Option<String> {
        self.options
            .default_dev_token
            .clone()
            .filter(|token| !token.trim().is_empty())
    }

    fn persist_mode(&self, mode: AppMode) {
        if let Err(e) = self.storage.set(MODE_KEY, mode.as_str()) {
            tracing::warn!(error = %e, "Failed to persist mode");
        }
    }

    fn publish(&self) {
        let token = self.session.token();
        let mode = self.session.mode();
        let snapshot = {
            let state = self.state.read();
            ModeSnapshot {
                started: state.started,
                mode,
                token_is_valid: token_is_valid(
                    mode,
                    &token,
                    state.is_user_token,
                    state.received_from_parent,
                    state.selected_group.as_deref(),
                ),
                token,
                is_user_token: state.is_user_token,
                received_from_parent: state.received_from_parent,
                selected_group: state.selected_group.clone(),
            }
        };
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl Drop for ModeController {
    fn drop(&mut self) {
        self.tasks.get_mut().abort_all();
    }
}
