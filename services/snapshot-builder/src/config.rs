//! Snapshot builder configuration
//!
//! Plain value passed into the pipeline at startup. Deserializable from
//! JSON, with defaults matching the common deployment (8 levels per side,
//! whole-unit native prices, 10^9 base units per native token).

use serde::{Deserialize, Serialize};
use types::errors::ValidationError;
use types::ids::{Address, MarketName};
use types::numeric::{Exponents, MAX_EXPONENT};

use crate::aggregator::{DepthPolicy, Quantization};
use crate::bounds::OverflowPolicy;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("capacity must be positive")]
    ZeroCapacity,

    #[error("base units per native token must be positive")]
    ZeroBaseUnits,

    #[error("collection symbol must be non-empty")]
    EmptyCollection,

    #[error("collection identifier must be non-empty")]
    EmptyIdentifier,

    #[error("quantization exponent {0} out of range")]
    ExponentOutOfRange(i32),

    #[error("invalid market name: {0}")]
    MarketName(#[from] ValidationError),

    #[error("config parse error: {0}")]
    Parse(String),
}

/// Currency the book is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Prices in the chain's native token
    #[default]
    Native,
    /// Prices converted to a stable unit via the exchange-rate source
    Stable,
}

/// Configuration for one market's snapshot builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Collection symbol, first half of the market name (e.g. "SMB")
    pub collection: String,
    /// Collection identifier passed to the sources (mint or hex address)
    pub identifier: String,
    /// Levels per side
    pub capacity: usize,
    pub quote: QuoteMode,
    pub native_symbol: String,
    pub stable_symbol: String,
    /// Indivisible units per native token
    pub base_units_per_native: u64,
    pub quantization: Quantization,
    pub depth_policy: DepthPolicy,
    pub overflow: OverflowPolicy,
    /// Expected store exponents; zero fields are read from the store and a
    /// non-zero field that disagrees with it fails the publish
    pub store_exponents: Option<Exponents>,
    /// Authority credential presented to the store
    pub authority: Address,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            collection: "SMB".to_string(),
            identifier: "SMBH3wF6baUj6JWtzYvqcKuj2XCKWDqQxzspY12xPND".to_string(),
            capacity: 8,
            quote: QuoteMode::Native,
            native_symbol: "SOL".to_string(),
            stable_symbol: "USDC".to_string(),
            base_units_per_native: 1_000_000_000,
            quantization: Quantization::default(),
            depth_policy: DepthPolicy::default(),
            overflow: OverflowPolicy::default(),
            store_exponents: None,
            authority: Address::ZERO,
        }
    }
}

impl SnapshotConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.base_units_per_native == 0 {
            return Err(ConfigError::ZeroBaseUnits);
        }
        if self.collection.is_empty() {
            return Err(ConfigError::EmptyCollection);
        }
        if self.identifier.is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        if self.quantization.exponent.unsigned_abs() > MAX_EXPONENT {
            return Err(ConfigError::ExponentOutOfRange(self.quantization.exponent));
        }
        self.market_name()?;
        Ok(())
    }

    pub fn quote_symbol(&self) -> &str {
        match self.quote {
            QuoteMode::Native => &self.native_symbol,
            QuoteMode::Stable => &self.stable_symbol,
        }
    }

    /// "COLLECTION-QUOTE", bounded to the record name slot.
    pub fn market_name(&self) -> Result<MarketName, ConfigError> {
        Ok(MarketName::for_pair(&self.collection, self.quote_symbol())?)
    }

    pub fn market_address(&self) -> Address {
        Address::derive(&self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SnapshotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.market_name().unwrap().as_str(), "SMB-SOL");
    }

    #[test]
    fn test_stable_quote_market_name() {
        let config = SnapshotConfig {
            quote: QuoteMode::Stable,
            ..Default::default()
        };
        assert_eq!(config.market_name().unwrap().as_str(), "SMB-USDC");
    }

    #[test]
    fn test_market_name_too_long() {
        let config = SnapshotConfig {
            collection: "DEGODS".to_string(),
            quote: QuoteMode::Stable,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MarketName(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = SnapshotConfig {
            capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_exponent_range_checked() {
        let config = SnapshotConfig {
            quantization: Quantization {
                exponent: -40,
                round: true,
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ExponentOutOfRange(-40)));
    }

    #[test]
    fn test_from_json_partial() {
        let config = SnapshotConfig::from_json_str(
            r#"{"collection":"ABC","capacity":16,"quote":"stable","depth_policy":"legacy_tail"}"#,
        )
        .unwrap();
        assert_eq!(config.capacity, 16);
        assert_eq!(config.quote, QuoteMode::Stable);
        assert_eq!(config.depth_policy, DepthPolicy::LegacyTail);
        assert_eq!(config.base_units_per_native, 1_000_000_000);
        assert_eq!(config.market_name().unwrap().as_str(), "ABC-USDC");
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            SnapshotConfig::from_json_str(r#"{"capacity":"eight"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            SnapshotConfig::from_json_str(r#"{"base_units_per_native":0}"#),
            Err(ConfigError::ZeroBaseUnits)
        );
    }
}
