//! Synchronizes the redirects spreadsheet into a Cloudflare bulk redirect list.

pub mod auth;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod errors;
pub mod metrics_defs;
pub mod rules_list;
pub mod service;
pub mod sheets;

#[cfg(test)]
mod testutils;

use controller::Controller;
use errors::SyncError;
use service::SyncService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;

pub const APP_NAME: &str = "directomatic";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serves the API and admin listeners until either one fails.
pub async fn run(config: config::Config) -> Result<(), SyncError> {
    config.validate()?;

    let controller = Controller::from_config(&config);
    let sync_service = SyncService::new(controller, config.auth_token.clone());
    let sync_task = run_http_service(&config.listener.host, config.listener.port, sync_service);

    let admin_service = AdminService::<_, SyncError>::new(|| true, VERSION);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tracing::info!(
        locales = config.redirects.locales.len(),
        default_locale = %config.redirects.default_locale,
        "Starting sheet sync"
    );

    tokio::try_join!(sync_task, admin_task)?;
    Ok(())
}
