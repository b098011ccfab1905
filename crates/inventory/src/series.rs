//! Stock-over-time reconstruction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_core::MaterialName;
use stockwatch_events::Projection;

use crate::ledger::Transaction;

/// Stock level right after one transaction.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPoint {
    pub timestamp: DateTime<Utc>,
    pub quantity: f64,
}

/// Running-total projection over one material's transactions.
///
/// Starts at zero and emits one point per applied transaction. The total is a
/// plain `f64` rather than a `Quantity`: if timestamps were recorded out of
/// order, a withdrawal can sort ahead of the delivery that funded it and the
/// intermediate total dips below zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StockTimeSeries {
    material: MaterialName,
    running: f64,
    points: Vec<StockPoint>,
}

impl StockTimeSeries {
    pub fn new(material: MaterialName) -> Self {
        Self {
            material,
            running: 0.0,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[StockPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&StockPoint> {
        self.points.last()
    }

    pub fn into_points(self) -> Vec<StockPoint> {
        self.points
    }
}

impl Projection for StockTimeSeries {
    type Ev = Transaction;

    fn apply(&mut self, tx: &Transaction) {
        if tx.material != self.material {
            return;
        }
        self.running += tx.kind.signed(tx.quantity);
        self.points.push(StockPoint {
            timestamp: tx.timestamp,
            quantity: self.running,
        });
    }
}
