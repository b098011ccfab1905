//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, construct a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A non-negative, finite amount of material.
///
/// Used both for stock levels and for the magnitude of a movement; the
/// direction of a movement is carried separately, never by the sign.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantity(f64);

impl ValueObject for Quantity {}

impl Quantity {
    pub const ZERO: Quantity = Quantity(0.0);

    /// Validate a raw amount. `field` names the offending input in the error.
    pub fn parse(value: f64, field: &str) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::invalid_input(format!("{field} must be a finite number")));
        }
        if value < 0.0 {
            return Err(DomainError::invalid_input(format!(
                "{field} cannot be negative (got {value})"
            )));
        }
        // Normalise -0.0 so it never leaks into displays.
        Ok(Self(value + 0.0))
    }

    pub fn new(value: f64) -> DomainResult<Self> {
        Self::parse(value, "quantity")
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn checked_add(self, other: Quantity) -> DomainResult<Quantity> {
        Self::parse(self.0 + other.0, "quantity")
    }

    /// Subtract, returning `None` when the result would be negative.
    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        if other.0 > self.0 {
            return None;
        }
        Some(Self(self.0 - other.0))
    }
}

/// Sum of two valid quantities. Callers that need a finiteness guarantee
/// (e.g. user input) should use `checked_add`.
impl core::ops::Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl TryFrom<f64> for Quantity {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for f64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
