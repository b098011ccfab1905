use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_core::MaterialName;

use crate::alert::StockStatus;
use crate::forecast::DepletionProjection;

/// Dashboard row: current level, status and forecast for one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialOverview {
    pub material: MaterialName,
    pub quantity: f64,
    pub critical_threshold: f64,
    pub last_updated: DateTime<Utc>,
    pub status: StockStatus,
    pub depletion: DepletionProjection,
}
