use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use stockwatch_inventory::{MaterialOverview, StockPoint, StockRecord, Transaction};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
    pub material: String,
    pub quantity: f64,
    /// Falls back to the configured default; either way it replaces the
    /// material's current threshold.
    pub threshold: Option<f64>,
    /// Business time of the movement; defaults to the server clock.
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub material: String,
    pub quantity: f64,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub window_days: Option<i64>,
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn record_to_json(record: &StockRecord) -> serde_json::Value {
    json!({
        "material": record.material,
        "quantity": record.quantity,
        "critical_threshold": record.critical_threshold,
        "last_updated": record.last_updated,
        "status": record.status(),
    })
}

pub fn transaction_to_json(tx: &Transaction) -> serde_json::Value {
    json!({
        "sequence": tx.sequence,
        "timestamp": tx.timestamp,
        "quantity": tx.quantity,
        "kind": tx.kind,
    })
}

pub fn point_to_json(point: &StockPoint) -> serde_json::Value {
    json!({
        "timestamp": point.timestamp,
        "quantity": point.quantity,
    })
}

/// One overview row, plus the human-readable depletion text.
pub fn overview_to_json(row: &MaterialOverview) -> Result<serde_json::Value, serde_json::Error> {
    let mut value = serde_json::to_value(row)?;
    value["depletion_display"] = row.depletion.to_string().into();
    Ok(value)
}
