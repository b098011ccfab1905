//! Shared, in-memory ledger session.
//!
//! Wraps one `Ledger` behind a single `RwLock`:
//! - mutations take the write lock, so validate + update + append is atomic
//! - reads take the read lock and see a consistent snapshot
//! - threshold alerts are published only after the write lock is released, so a
//!   slow or failing consumer cannot stall or corrupt the ledger
//!
//! Nothing here touches the filesystem; the ledger lives as long as the session.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use stockwatch_core::{DomainError, MaterialName};
use stockwatch_events::EventBus;

use crate::alert::StockAlert;
use crate::forecast::{DEFAULT_WINDOW_DAYS, Forecaster};
use crate::ledger::{Ledger, StockRecord};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("ledger lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
pub struct StockSession<B>
where
    B: EventBus<StockAlert>,
{
    ledger: RwLock<Ledger>,
    alerts: B,
    window: Duration,
}

impl<B> StockSession<B>
where
    B: EventBus<StockAlert>,
{
    pub fn new(alerts: B) -> Self {
        Self {
            ledger: RwLock::new(Ledger::new()),
            alerts,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }

    /// Default forecast window for `forecast`.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn alerts(&self) -> &B {
        &self.alerts
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, SessionError> {
        self.ledger.write().map_err(|_| SessionError::Poisoned)
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, Ledger>, SessionError> {
        self.ledger.read().map_err(|_| SessionError::Poisoned)
    }

    pub fn record_delivery(
        &self,
        material: &str,
        quantity: f64,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Result<StockRecord, SessionError> {
        let (record, alert) = {
            let mut ledger = self.write()?;
            let record = ledger
                .record_delivery(material, quantity, threshold, now)
                .inspect_err(|err| debug!(material, error = %err, "delivery rejected"))?
                .clone();
            (record, ledger.check_threshold(material, now))
        };

        info!(
            material = %record.material,
            delivered = quantity,
            on_hand = record.quantity.value(),
            threshold = record.critical_threshold.value(),
            "delivery recorded"
        );
        self.raise(alert);
        Ok(record)
    }

    pub fn record_withdrawal(
        &self,
        material: &str,
        quantity: f64,
        now: DateTime<Utc>,
    ) -> Result<StockRecord, SessionError> {
        let (record, alert) = {
            let mut ledger = self.write()?;
            let record = ledger
                .record_withdrawal(material, quantity, now)
                .inspect_err(|err| debug!(material, error = %err, "withdrawal rejected"))?
                .clone();
            (record, ledger.check_threshold(material, now))
        };

        info!(
            material = %record.material,
            withdrawn = quantity,
            on_hand = record.quantity.value(),
            "withdrawal recorded"
        );
        self.raise(alert);
        Ok(record)
    }

    fn raise(&self, alert: Option<StockAlert>) {
        let Some(alert) = alert else {
            return;
        };
        warn!(
            material = %alert.material,
            quantity = alert.quantity,
            threshold = alert.threshold,
            "stock below critical threshold"
        );
        if let Err(err) = self.alerts.publish(alert) {
            warn!(error = ?err, "failed to publish stock alert");
        }
    }

    /// Run `f` against a consistent read-only view of the ledger.
    pub fn read<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T, SessionError> {
        let ledger = self.read_guard()?;
        Ok(f(&ledger))
    }

    /// Run `f` against a forecaster using the session's default window.
    pub fn forecast<T>(&self, f: impl FnOnce(&Forecaster<'_>) -> T) -> Result<T, SessionError> {
        let ledger = self.read_guard()?;
        let forecaster = Forecaster::new(&ledger).with_window(self.window);
        Ok(f(&forecaster))
    }

    pub fn current_stock(&self) -> Result<BTreeMap<MaterialName, StockRecord>, SessionError> {
        self.read(Ledger::current_stock)
    }
}
