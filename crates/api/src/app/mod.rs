//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: session ledger, alert bus and notification worker
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::notify::{LogNotifier, Notifier};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router with the log-based notifier.
pub fn build_app(config: AppConfig) -> std::io::Result<(Router, Arc<services::AppServices>)> {
    let notifier = LogNotifier::new(config.alert_recipients.clone());
    build_app_with_notifier(config, notifier)
}

/// Build the full HTTP router, delivering low-stock alerts to `notifier`.
pub fn build_app_with_notifier<N>(
    config: AppConfig,
    notifier: N,
) -> std::io::Result<(Router, Arc<services::AppServices>)>
where
    N: Notifier,
{
    let services = Arc::new(services::AppServices::new(config, notifier)?);

    let app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(Arc::clone(&services))));

    Ok((app, services))
}
