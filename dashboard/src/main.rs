//! # GPS Dashboard
//!
//! Headless harness. The parent page is modeled by stdio: inbound parent
//! messages arrive as JSON lines on stdin, outbound messages are written as
//! JSON lines to stdout. Logs go to stderr and `logs/`.

use std::sync::Arc;

use anyhow::Context;
use dashboard::app::{App, AppOptions};
use dashboard::config::DashboardConfig;
use dashboard::embed::{forward_lines, FrameElement, LineChannel, ModeController, ParentChannel, ParentReporter};
use dashboard::services::api::{ApiClient, GpsService, ReqwestTransport};
use dashboard::session::Session;
use dashboard::storage::FileStorage;
use shared::protocol::GROUP_CODE_ATTRIBUTE;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _guard = dashboard::debug::init();

    let config = DashboardConfig::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    tracing::info!(?config, "Configuration loaded");

    let storage_path = config.resolve_storage_path()?;
    let storage = Arc::new(
        FileStorage::open(&storage_path)
            .with_context(|| format!("opening storage at {}", storage_path.display()))?,
    );

    let session = Arc::new(Session::default());
    let parent: Arc<dyn ParentChannel> = Arc::new(LineChannel::stdout());
    let frame = config
        .frame_group_code
        .as_deref()
        .map(|code| Arc::new(FrameElement::with_attribute(GROUP_CODE_ATTRIBUTE, code)));

    let controller = ModeController::new(
        session.clone(),
        storage,
        parent.clone(),
        frame,
        config.controller_options(),
    );
    controller.start();

    if let Some(token) = config.dev_token.as_deref() {
        if let Err(e) = controller.set_token(token) {
            tracing::warn!(error = %e, "Ignoring DASHBOARD_DEV_TOKEN");
        }
    }
    if let Some(group) = config.group_code.as_deref() {
        controller.set_selected_group(Some(group));
    }

    let events = controller.event_sender();
    let stdin_task = tokio::spawn(async move {
        let forwarded = forward_lines(BufReader::new(tokio::io::stdin()), events).await;
        tracing::debug!(forwarded, "Parent input closed");
    });

    let api = Arc::new(
        ApiClient::new(Arc::new(ReqwestTransport::new()), session.clone(), config.client_options())
            .with_parent(parent.clone()),
    );
    let gps = GpsService::new(api, config.base_url.clone()).with_timeout(config.request_timeout);
    let app = App::new(
        controller.clone(),
        Arc::new(gps),
        ParentReporter::new(parent, session),
        AppOptions {
            history_limit: config.history_limit,
            load_history: config.load_history,
        },
    );

    app.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    })
    .await;

    controller.shutdown();
    stdin_task.abort();
    tracing::info!("Dashboard stopped");
    Ok(())
}
