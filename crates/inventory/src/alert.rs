//! Critical-threshold status and alerts.
//!
//! The ledger only computes whether a material is below its threshold. Acting
//! on that (formatting a message, sending it) is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_core::{AlertId, MaterialName, Quantity};

use crate::ledger::Ledger;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Healthy,
    /// Strictly below the critical threshold.
    Critical,
}

impl StockStatus {
    pub fn of(quantity: Quantity, threshold: Quantity) -> Self {
        if quantity < threshold {
            StockStatus::Critical
        } else {
            StockStatus::Healthy
        }
    }
}

/// A threshold breach observed after a successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAlert {
    pub alert_id: AlertId,
    pub material: MaterialName,
    pub quantity: f64,
    pub threshold: f64,
    pub raised_at: DateTime<Utc>,
}

impl Ledger {
    /// Returns an alert if `material` is currently below its critical threshold.
    pub fn check_threshold(&self, material: &str, now: DateTime<Utc>) -> Option<StockAlert> {
        let record = self.stock_record(material)?;
        if !record.is_critical() {
            return None;
        }
        Some(StockAlert {
            alert_id: AlertId::new(),
            material: record.material.clone(),
            quantity: record.quantity.value(),
            threshold: record.critical_threshold.value(),
            raised_at: now,
        })
    }
}
