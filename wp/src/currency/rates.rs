//! Currency-rate lookup collaborator

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Errors from a rate lookup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("no rate available for {from} -> {to}")]
    Unavailable { from: String, to: String },

    #[error("rate provider failed: {0}")]
    Provider(String),
}

/// Source of exchange rates
///
/// A rate converts one unit of `from` into units of `to`.
#[async_trait]
pub trait RateLookup: Send + Sync {
    async fn lookup_rate(&self, from: &str, to: &str) -> Result<f64, RateError>;
}

/// Rates from a fixed table quoted against the canonical currency
///
/// `per_unit["USD"] = 25000.0` means one USD is worth 25,000 units of the
/// canonical currency. Cross rates go through the canonical currency.
#[derive(Debug, Clone)]
pub struct StaticRates {
    canonical: String,
    per_unit: HashMap<String, f64>,
}

impl StaticRates {
    pub fn new(canonical: impl Into<String>, per_unit: HashMap<String, f64>) -> Self {
        let canonical = canonical.into().to_ascii_uppercase();
        let per_unit = per_unit
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();
        Self { canonical, per_unit }
    }

    /// Value of one unit of `code` in the canonical currency
    fn canonical_value(&self, code: &str) -> Option<f64> {
        if code == self.canonical {
            Some(1.0)
        } else {
            self.per_unit.get(code).copied()
        }
    }
}

#[async_trait]
impl RateLookup for StaticRates {
    async fn lookup_rate(&self, from: &str, to: &str) -> Result<f64, RateError> {
        let from = from.to_ascii_uppercase();
        let to = to.to_ascii_uppercase();
        debug!(%from, %to, "StaticRates::lookup_rate: called");

        if from == to {
            return Ok(1.0);
        }

        match (self.canonical_value(&from), self.canonical_value(&to)) {
            (Some(from_value), Some(to_value)) => Ok(from_value / to_value),
            _ => {
                debug!(%from, %to, "StaticRates::lookup_rate: pair not in table");
                Err(RateError::Unavailable { from, to })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StaticRates {
        StaticRates::new(
            "VND",
            HashMap::from([
                ("usd".to_string(), 25_000.0),
                ("EUR".to_string(), 27_000.0),
                ("BAD".to_string(), -1.0),
            ]),
        )
    }

    #[tokio::test]
    async fn test_identity_direct_inverse_cross() {
        let rates = table();
        assert_eq!(rates.lookup_rate("VND", "VND").await.unwrap(), 1.0);
        assert_eq!(rates.lookup_rate("USD", "VND").await.unwrap(), 25_000.0);
        assert_eq!(rates.lookup_rate("VND", "USD").await.unwrap(), 1.0 / 25_000.0);
        assert_eq!(rates.lookup_rate("EUR", "USD").await.unwrap(), 27_000.0 / 25_000.0);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_rates_unavailable() {
        let rates = table();
        assert!(matches!(
            rates.lookup_rate("XYZ", "VND").await,
            Err(RateError::Unavailable { .. })
        ));
        assert!(rates.lookup_rate("BAD", "VND").await.is_err());
    }
}
