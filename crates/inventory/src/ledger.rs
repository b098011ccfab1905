use std::collections::{BTreeMap, HashMap};
use std::ops::RangeBounds;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stockwatch_core::{Aggregate, DomainError, DomainResult, MaterialName, Quantity};
use stockwatch_events::Event;

use crate::alert::StockStatus;

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Delivery,
    Withdrawal,
}

impl TransactionKind {
    /// Contribution of a movement of `quantity` to the stock level.
    pub fn signed(self, quantity: Quantity) -> f64 {
        match self {
            TransactionKind::Delivery => quantity.value(),
            TransactionKind::Withdrawal => -quantity.value(),
        }
    }
}

/// Immutable log entry for one successful delivery or withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Position in the ledger-wide log (insertion order).
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub material: MaterialName,
    /// Magnitude moved; direction lives in `kind`.
    pub quantity: Quantity,
    pub kind: TransactionKind,
}

impl Event for Transaction {
    fn event_type(&self) -> &'static str {
        match self.kind {
            TransactionKind::Delivery => "inventory.transaction.delivery",
            TransactionKind::Withdrawal => "inventory.transaction.withdrawal",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Current on-hand state of one material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub material: MaterialName,
    pub quantity: Quantity,
    pub critical_threshold: Quantity,
    pub last_updated: DateTime<Utc>,
}

impl StockRecord {
    pub fn status(&self) -> StockStatus {
        StockStatus::of(self.quantity, self.critical_threshold)
    }

    pub fn is_critical(&self) -> bool {
        self.status() == StockStatus::Critical
    }
}

/// Command: RecordDelivery.
///
/// Amounts are raw caller input; they are validated when the command is handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDelivery {
    pub material: MaterialName,
    pub quantity: f64,
    pub threshold: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordWithdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordWithdrawal {
    pub material: MaterialName,
    pub quantity: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RecordDelivery(RecordDelivery),
    RecordWithdrawal(RecordWithdrawal),
}

/// Event: MaterialDelivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDelivered {
    pub material: MaterialName,
    pub quantity: Quantity,
    pub threshold: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MaterialWithdrawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialWithdrawn {
    pub material: MaterialName,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    MaterialDelivered(MaterialDelivered),
    MaterialWithdrawn(MaterialWithdrawn),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::MaterialDelivered(_) => "inventory.material.delivered",
            LedgerEvent::MaterialWithdrawn(_) => "inventory.material.withdrawn",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::MaterialDelivered(e) => e.occurred_at,
            LedgerEvent::MaterialWithdrawn(e) => e.occurred_at,
        }
    }
}

/// Aggregate: the stock ledger.
///
/// Owns the append-only transaction log and the per-material `StockRecord`
/// index derived from it. The index is a cached fold over the log: for each
/// material, `quantity == Σ deliveries − Σ withdrawals`.
///
/// The ledger never reads a clock; every mutation takes `now` from the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: BTreeMap<MaterialName, StockRecord>,
    log: Vec<Transaction>,
    /// Log positions per material, in insertion order.
    by_material: HashMap<MaterialName, Vec<usize>>,
    version: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger by applying previously produced events in order.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a LedgerEvent>) -> Self {
        let mut ledger = Self::new();
        for event in events {
            ledger.apply(event);
        }
        ledger
    }

    /// Record an inbound movement.
    ///
    /// Creates the material on first sight. The threshold is overwritten on
    /// every delivery (last write wins), and a zero-quantity delivery is still
    /// logged.
    pub fn record_delivery(
        &mut self,
        material: &str,
        quantity: f64,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> DomainResult<&StockRecord> {
        let material = MaterialName::new(material);
        let cmd = LedgerCommand::RecordDelivery(RecordDelivery {
            material: material.clone(),
            quantity,
            threshold,
            occurred_at: now,
        });
        self.execute(&cmd)?;
        self.record_after_mutation(material)
    }

    /// Record an outbound movement. Rejected wholesale if it would drive the
    /// quantity negative.
    pub fn record_withdrawal(
        &mut self,
        material: &str,
        quantity: f64,
        now: DateTime<Utc>,
    ) -> DomainResult<&StockRecord> {
        let material = MaterialName::new(material);
        let cmd = LedgerCommand::RecordWithdrawal(RecordWithdrawal {
            material: material.clone(),
            quantity,
            occurred_at: now,
        });
        self.execute(&cmd)?;
        self.record_after_mutation(material)
    }

    fn record_after_mutation(&self, material: MaterialName) -> DomainResult<&StockRecord> {
        self.records
            .get(&material)
            .ok_or(DomainError::UnknownMaterial(material))
    }

    /// Snapshot of every known material's record at call time.
    pub fn current_stock(&self) -> BTreeMap<MaterialName, StockRecord> {
        self.records.clone()
    }

    pub fn stock_record(&self, material: &str) -> Option<&StockRecord> {
        self.records.get(material)
    }

    /// Known materials, ordered by name.
    pub fn materials(&self) -> impl Iterator<Item = &MaterialName> {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &StockRecord> {
        self.records.values()
    }

    /// The whole log in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.log
    }

    /// Transactions for `material` whose timestamp falls within `range`,
    /// ascending by timestamp with ties kept in insertion order.
    ///
    /// Pass `..` for an unbounded query. Unknown materials yield an empty vec.
    pub fn transactions_for<R>(&self, material: &str, range: R) -> Vec<&Transaction>
    where
        R: RangeBounds<DateTime<Utc>>,
    {
        let Some(positions) = self.by_material.get(material) else {
            return Vec::new();
        };

        let mut matching: Vec<&Transaction> = positions
            .iter()
            .map(|&idx| &self.log[idx])
            .filter(|tx| range.contains(&tx.timestamp))
            .collect();
        matching.sort_by_key(|tx| (tx.timestamp, tx.sequence));
        matching
    }

    fn append(
        &mut self,
        material: &MaterialName,
        quantity: Quantity,
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
    ) {
        let idx = self.log.len();
        self.by_material.entry(material.clone()).or_default().push(idx);
        self.log.push(Transaction {
            sequence: idx as u64,
            timestamp,
            material: material.clone(),
            quantity,
            kind,
        });
    }

    fn handle_delivery(&self, cmd: &RecordDelivery) -> DomainResult<Vec<LedgerEvent>> {
        let quantity = Quantity::parse(cmd.quantity, "quantity")?;
        let threshold = Quantity::parse(cmd.threshold, "threshold")?;

        if let Some(record) = self.records.get(&cmd.material) {
            // Rejects sums that overflow to infinity.
            record.quantity.checked_add(quantity)?;
        }

        Ok(vec![LedgerEvent::MaterialDelivered(MaterialDelivered {
            material: cmd.material.clone(),
            quantity,
            threshold,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_withdrawal(&self, cmd: &RecordWithdrawal) -> DomainResult<Vec<LedgerEvent>> {
        let record = self
            .records
            .get(&cmd.material)
            .ok_or_else(|| DomainError::unknown_material(cmd.material.clone()))?;

        let quantity = Quantity::parse(cmd.quantity, "quantity")?;

        if record.quantity.checked_sub(quantity).is_none() {
            return Err(DomainError::insufficient_stock(
                cmd.material.clone(),
                quantity.value(),
                record.quantity.value(),
            ));
        }

        Ok(vec![LedgerEvent::MaterialWithdrawn(MaterialWithdrawn {
            material: cmd.material.clone(),
            quantity,
            occurred_at: cmd.occurred_at,
        })])
    }
}

impl Aggregate for Ledger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::MaterialDelivered(e) => {
                let record = self
                    .records
                    .entry(e.material.clone())
                    .or_insert_with(|| StockRecord {
                        material: e.material.clone(),
                        quantity: Quantity::ZERO,
                        critical_threshold: e.threshold,
                        last_updated: e.occurred_at,
                    });
                record.quantity = record.quantity + e.quantity;
                record.critical_threshold = e.threshold;
                record.last_updated = e.occurred_at;

                self.append(&e.material, e.quantity, TransactionKind::Delivery, e.occurred_at);
                debug!(
                    event_type = event.event_type(),
                    event_version = event.version(),
                    material = %e.material,
                    quantity = e.quantity.value(),
                    "delivery applied"
                );
            }
            LedgerEvent::MaterialWithdrawn(e) => {
                let Some(record) = self.records.get_mut(&e.material) else {
                    warn!(
                        event_type = event.event_type(),
                        material = %e.material,
                        "withdrawal for unknown material ignored"
                    );
                    return;
                };
                let Some(remaining) = record.quantity.checked_sub(e.quantity) else {
                    warn!(
                        event_type = event.event_type(),
                        material = %e.material,
                        requested = e.quantity.value(),
                        available = record.quantity.value(),
                        "over-withdrawal ignored"
                    );
                    return;
                };
                record.quantity = remaining;
                record.last_updated = e.occurred_at;

                self.append(&e.material, e.quantity, TransactionKind::Withdrawal, e.occurred_at);
                debug!(
                    event_type = event.event_type(),
                    event_version = event.version(),
                    material = %e.material,
                    quantity = e.quantity.value(),
                    "withdrawal applied"
                );
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RecordDelivery(cmd) => self.handle_delivery(cmd),
            LedgerCommand::RecordWithdrawal(cmd) => self.handle_withdrawal(cmd),
        }
    }

    fn version(&self) -> u64 {
        self.version
    }
}
