//! Canonical-currency normalization with a per-run rate cache

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::parse::{code_for_symbol, code_for_word, parse_price};
use super::rates::RateLookup;
use crate::domain::{CurrencyIndicator, NormalizedPrice, RawPrice};

/// A price that cannot be normalized at all
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("invalid amount {0}")]
    InvalidAmount(f64),

    #[error("no amount found in {0:?}")]
    Unparseable(String),
}

/// Rates fetched during one planning run
///
/// Each currency pair is looked up at most once. Concurrent requests for
/// the same pair wait on the same cell and all observe the winning value,
/// including a cached "unavailable".
#[derive(Default)]
pub struct RateCache {
    rates: DashMap<(String, String), Arc<OnceCell<Option<f64>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached rate for the pair, looking it up on first use
    pub async fn get_or_lookup(&self, from: &str, to: &str, lookup: &dyn RateLookup) -> Option<f64> {
        let cell = self
            .rates
            .entry((from.to_string(), to.to_string()))
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();

        if let Some(rate) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(%from, %to, ?rate, "RateCache HIT");
            return *rate;
        }

        *cell
            .get_or_init(|| async {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(%from, %to, "RateCache MISS");
                match lookup.lookup_rate(from, to).await {
                    Ok(rate) if rate.is_finite() && rate > 0.0 => Some(rate),
                    Ok(rate) => {
                        warn!(%from, %to, rate, "Rate lookup returned an unusable rate");
                        None
                    }
                    Err(e) => {
                        warn!(%from, %to, error = %e, "Rate lookup failed");
                        None
                    }
                }
            })
            .await
    }

    /// Number of pairs resolved so far
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (usize, usize) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}

/// Converts priced quantities into the canonical planning currency
///
/// Create one per planning run; the embedded cache keeps every conversion
/// within the run on the same rate.
pub struct CurrencyNormalizer {
    canonical: String,
    lookup: Arc<dyn RateLookup>,
    cache: RateCache,
}

impl CurrencyNormalizer {
    pub fn new(canonical: impl Into<String>, lookup: Arc<dyn RateLookup>) -> Self {
        Self {
            canonical: canonical.into().to_ascii_uppercase(),
            lookup,
            cache: RateCache::new(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Best-effort mapping of an indicator to a currency code
    pub fn resolve_code(&self, indicator: &CurrencyIndicator) -> Option<String> {
        match indicator {
            CurrencyIndicator::Code(code) => Some(code.to_ascii_uppercase()),
            CurrencyIndicator::Symbol(symbol) => code_for_symbol(symbol).map(str::to_string),
            CurrencyIndicator::Unknown(Some(hint)) => code_for_word(hint).map(str::to_string),
            CurrencyIndicator::Unknown(None) => None,
        }
    }

    /// Normalize an amount with a currency indicator
    ///
    /// Unresolvable currencies and failed lookups yield an unverified price
    /// carrying the source amount; they are never assumed canonical.
    pub async fn normalize(&self, amount: f64, indicator: CurrencyIndicator) -> Result<NormalizedPrice, NormalizeError> {
        debug!(amount, %indicator, "CurrencyNormalizer::normalize: called");
        if !amount.is_finite() || amount < 0.0 {
            return Err(NormalizeError::InvalidAmount(amount));
        }

        let rate = match self.resolve_code(&indicator) {
            Some(code) if code == self.canonical => Some(1.0),
            Some(code) => self.cache.get_or_lookup(&code, &self.canonical, self.lookup.as_ref()).await,
            None => {
                debug!(%indicator, "CurrencyNormalizer::normalize: currency unresolved");
                None
            }
        };

        Ok(match rate {
            Some(rate) => NormalizedPrice {
                amount: amount * rate,
                currency: self.canonical.clone(),
                source_amount: amount,
                source_currency: indicator,
                rate: Some(rate),
                verified: true,
            },
            None => NormalizedPrice {
                amount,
                currency: self.canonical.clone(),
                source_amount: amount,
                source_currency: indicator,
                rate: None,
                verified: false,
            },
        })
    }

    /// Normalize a price as reported by a specialist step
    pub async fn normalize_raw(&self, price: &RawPrice) -> Result<NormalizedPrice, NormalizeError> {
        match price {
            RawPrice::Structured { amount, currency } => {
                let indicator = currency
                    .as_deref()
                    .map(CurrencyIndicator::classify)
                    .unwrap_or(CurrencyIndicator::Unknown(None));
                self.normalize(*amount, indicator).await
            }
            RawPrice::Bare(amount) => self.normalize(*amount, CurrencyIndicator::Unknown(None)).await,
            RawPrice::Text(text) => self.normalize_text(text).await,
        }
    }

    /// Normalize a free-text price through the input adapter
    pub async fn normalize_text(&self, text: &str) -> Result<NormalizedPrice, NormalizeError> {
        let parsed = parse_price(text).ok_or_else(|| NormalizeError::Unparseable(text.to_string()))?;
        self.normalize(parsed.amount, parsed.indicator).await
    }
}
