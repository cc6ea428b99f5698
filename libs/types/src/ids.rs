//! Identifier types
//!
//! - `BuildId`: UUID v7 per snapshot build, time-sortable for log correlation
//! - `Address`: fixed 32-byte address-like identifier stored in records
//! - `MarketName`: bounded market label stored in the record name slot

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::errors::ValidationError;

/// Unique identifier for one snapshot build
///
/// Uses UUID v7 so builds sort chronologically in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(Uuid);

impl BuildId {
    /// Create a new BuildId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed 32-byte identifier (collection mint, authority, ...).
///
/// Serialized as a 64-character lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 32]);

impl Address {
    pub const LEN: usize = 32;
    pub const ZERO: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(s).map_err(|e| ValidationError::InvalidAddress(format!("{s}: {e}")))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| ValidationError::InvalidAddress(format!("{s}: expected 32 bytes, got {}", v.len())))?;
        Ok(Self(array))
    }

    /// SHA-256 of an arbitrary identifier string.
    pub fn digest(identifier: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Hex-decode the identifier if it is a 32-byte hex string, otherwise digest it.
    ///
    /// Collection identifiers from marketplaces are usually base58 text longer
    /// than 32 bytes, so they are digested into the fixed slot.
    pub fn derive(identifier: &str) -> Self {
        Self::from_hex(identifier).unwrap_or_else(|_| Self::digest(identifier))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.to_hex()
    }
}

/// Market label, at most [`MarketName::MAX_LEN`] UTF-8 bytes.
///
/// Format: "COLLECTION-QUOTE" (e.g., "SMB-SOL", "DEGODS-SOL")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarketName(String);

impl MarketName {
    /// Width of the record name slot.
    pub const MAX_LEN: usize = 10;

    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let s = name.into();
        if s.is_empty() {
            return Err(ValidationError::MarketNameEmpty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(ValidationError::MarketNameTooLong {
                len: s.len(),
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(s))
    }

    /// Build "COLLECTION-QUOTE".
    pub fn for_pair(collection: &str, quote: &str) -> Result<Self, ValidationError> {
        Self::new(format!("{collection}-{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Zero-padded fixed-width bytes for the record name slot.
    pub fn to_fixed_bytes(&self) -> [u8; Self::MAX_LEN] {
        let mut out = [0u8; Self::MAX_LEN];
        out[..self.0.len()].copy_from_slice(self.0.as_bytes());
        out
    }

    /// Inverse of [`to_fixed_bytes`](Self::to_fixed_bytes); trailing zero bytes are trimmed.
    pub fn from_fixed_bytes(bytes: &[u8; Self::MAX_LEN]) -> Result<Self, ValidationError> {
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let s = std::str::from_utf8(&bytes[..end])
            .map_err(|e| ValidationError::MarketNameEncoding(e.to_string()))?;
        Self::new(s)
    }
}

impl fmt::Display for MarketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for MarketName {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MarketName> for String {
    fn from(m: MarketName) -> Self {
        m.0
    }
}
