use std::sync::{Arc, Mutex};

use tracing::info;

use stockwatch_events::{EventBus, InMemoryEventBus};
use stockwatch_inventory::{StockAlert, StockSession};

use crate::config::AppConfig;
use crate::notify::{Notifier, NotificationWorker, WorkerHandle};

pub type AlertBus = Arc<InMemoryEventBus<StockAlert>>;

/// Shared application state: the session ledger plus its notification plumbing.
///
/// Everything is in memory and dies with the process.
#[derive(Debug)]
pub struct AppServices {
    session: StockSession<AlertBus>,
    config: AppConfig,
    notification_worker: Mutex<Option<WorkerHandle>>,
}

impl AppServices {
    pub fn new<N>(config: AppConfig, notifier: N) -> std::io::Result<Self>
    where
        N: Notifier,
    {
        let bus: AlertBus = Arc::new(InMemoryEventBus::new());
        let worker = NotificationWorker::spawn("stock-alert-notifier", bus.subscribe(), notifier)?;

        let session = StockSession::new(bus).with_window(config.forecast_window());
        info!(
            window_days = config.forecast_window_days,
            recipients = config.alert_recipients.len(),
            "stock services initialized"
        );

        Ok(Self {
            session,
            config,
            notification_worker: Mutex::new(Some(worker)),
        })
    }

    pub fn session(&self) -> &StockSession<AlertBus> {
        &self.session
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stop the notification worker. Idempotent.
    pub fn shutdown(&self) {
        let worker = self
            .notification_worker
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(worker) = worker {
            worker.shutdown();
        }
    }
}
