//! Domain error model.

use thiserror::Error;

use crate::id::MaterialName;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a local, recoverable rejection: the operation that returns
/// it has not mutated any state. Infrastructure concerns (locks, notifiers,
/// configuration) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (negative quantity/threshold, empty name, NaN).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A withdrawal targeted a material the ledger has never seen.
    #[error("unknown material: {0}")]
    UnknownMaterial(MaterialName),

    /// A withdrawal asked for more than is currently on hand.
    #[error("insufficient stock for {material}: requested {requested}, available {available}")]
    InsufficientStock {
        material: MaterialName,
        requested: f64,
        available: f64,
    },
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unknown_material(material: MaterialName) -> Self {
        Self::UnknownMaterial(material)
    }

    pub fn insufficient_stock(material: MaterialName, requested: f64, available: f64) -> Self {
        Self::InsufficientStock {
            material,
            requested,
            available,
        }
    }

    /// Stable machine-readable code (used by the HTTP layer).
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidInput(_) => "invalid_input",
            DomainError::UnknownMaterial(_) => "unknown_material",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
        }
    }
}
