//! Low-stock notification delivery.
//!
//! Alerts are raised by the stock session onto an in-memory bus. A background
//! worker drains the bus and hands each alert to a `Notifier`. Delivery is
//! fire-and-forget: failures are logged and dropped, never retried, and never
//! reach the ledger.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use stockwatch_events::Subscription;
use stockwatch_inventory::StockAlert;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier unavailable: {0}")]
    Unavailable(String),

    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },
}

/// Outbound channel for low-stock alerts (SMS gateway, chat, log...).
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, alert: &StockAlert) -> Result<(), NotifyError>;
}

impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&self, alert: &StockAlert) -> Result<(), NotifyError> {
        (**self).notify(alert)
    }
}

/// Human-readable text for an alert.
pub fn alert_message(alert: &StockAlert) -> String {
    format!(
        "critical stock for {}: {} units remaining",
        alert.material, alert.quantity
    )
}

/// Writes one log line per configured recipient instead of calling a gateway.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    recipients: Vec<String>,
}

impl LogNotifier {
    pub fn new(recipients: Vec<String>) -> Self {
        Self { recipients }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, alert: &StockAlert) -> Result<(), NotifyError> {
        if self.recipients.is_empty() {
            debug!(material = %alert.material, "no alert recipients configured");
            return Ok(());
        }

        let message = alert_message(alert);
        for recipient in &self.recipients {
            info!(
                recipient = %recipient,
                alert_id = %alert.alert_id,
                message = %message,
                "stock alert dispatched"
            );
        }
        Ok(())
    }
}

/// Keeps every alert it receives; for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    inner: Mutex<Vec<StockAlert>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<StockAlert> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Notifier for InMemoryNotifier {
    fn notify(&self, alert: &StockAlert) -> Result<(), NotifyError> {
        self.inner
            .lock()
            .map_err(|_| NotifyError::Unavailable("lock poisoned".to_string()))?
            .push(alert.clone());
        Ok(())
    }
}

/// Handle to control and join the notification worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

#[derive(Debug)]
pub struct NotificationWorker;

impl NotificationWorker {
    /// Spawn a thread that forwards every alert from `sub` to `notifier`.
    ///
    /// The worker stops on `WorkerHandle::shutdown` or when the bus is dropped.
    pub fn spawn<N>(
        name: &'static str,
        sub: Subscription<StockAlert>,
        notifier: N,
    ) -> std::io::Result<WorkerHandle>
    where
        N: Notifier,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, notifier))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<N>(
    name: &'static str,
    sub: Subscription<StockAlert>,
    shutdown_rx: mpsc::Receiver<()>,
    notifier: N,
) where
    N: Notifier,
{
    let tick = Duration::from_millis(250);
    info!(worker = name, "notification worker started");

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(alert) => {
                if let Err(err) = notifier.notify(&alert) {
                    warn!(
                        worker = name,
                        material = %alert.material,
                        error = %err,
                        "stock alert delivery failed"
                    );
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(worker = name, "notification worker stopped");
}
