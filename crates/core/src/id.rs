//! Identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Name of a material, used as its identity key.
///
/// Comparison is exact: case and surrounding whitespace are significant, so
/// `"Sand"` and `"sand "` are two different materials. Any string is a valid
/// key, including the empty one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MaterialName(String);

impl MaterialName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for MaterialName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MaterialName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Hash/Eq/Ord are derived from the inner `String`, so they agree with `str`'s.
impl core::borrow::Borrow<str> for MaterialName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for MaterialName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MaterialName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<MaterialName> for String {
    fn from(value: MaterialName) -> Self {
        value.0
    }
}

impl FromStr for MaterialName {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Identifier of a raised threshold alert.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer `from_uuid` in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for AlertId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AlertId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_input(format!("AlertId: {e}")))?;
        Ok(Self(uuid))
    }
}
