//! Stock ledger and depletion forecasting.
//!
//! This crate contains the inventory business rules, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage). Time is always
//! supplied by the caller.

pub mod alert;
pub mod forecast;
pub mod ledger;
pub mod overview;
pub mod series;
pub mod session;

pub use alert::{StockAlert, StockStatus};
pub use forecast::{ConsumptionRate, DEFAULT_WINDOW_DAYS, DepletionProjection, Forecaster};
pub use ledger::{
    Ledger, LedgerCommand, LedgerEvent, MaterialDelivered, MaterialWithdrawn, RecordDelivery,
    RecordWithdrawal, StockRecord, Transaction, TransactionKind,
};
pub use overview::MaterialOverview;
pub use series::{StockPoint, StockTimeSeries};
pub use session::{SessionError, StockSession};
