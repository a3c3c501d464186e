//! Priced quantities before and after currency normalization

use serde::{Deserialize, Serialize};

/// What a raw price says about its currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CurrencyIndicator {
    /// ISO 4217 style code, upper-cased (e.g. "USD")
    Code(String),
    /// A currency symbol (e.g. "$", "₫")
    Symbol(String),
    /// Absent, or a hint that could not be classified (e.g. "bucks")
    Unknown(Option<String>),
}

impl CurrencyIndicator {
    /// Classify a free-form currency label as a code, symbol or unknown hint
    pub fn classify(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            return Self::Unknown(None);
        }
        if label.len() == 3 && label.chars().all(|c| c.is_ascii_alphabetic()) {
            return Self::Code(label.to_ascii_uppercase());
        }
        if label.chars().count() <= 3 && label.chars().all(|c| !c.is_alphanumeric() || c == 'đ' || c == 'Đ') {
            return Self::Symbol(label.to_string());
        }
        Self::Unknown(Some(label.to_string()))
    }
}

impl std::fmt::Display for CurrencyIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Symbol(symbol) => write!(f, "{}", symbol),
            Self::Unknown(Some(hint)) => write!(f, "{}?", hint),
            Self::Unknown(None) => write!(f, "?"),
        }
    }
}

/// A price as reported by a specialist step
///
/// Steps may report a structured amount with an optional currency label,
/// a bare number, or free text such as "1,200,000 VND" or "$85/night".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Structured {
        amount: f64,
        #[serde(default)]
        currency: Option<String>,
    },
    Bare(f64),
    Text(String),
}

impl RawPrice {
    pub fn amount(amount: f64, currency: &str) -> Self {
        Self::Structured {
            amount,
            currency: Some(currency.to_string()),
        }
    }
}

impl std::fmt::Display for RawPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured {
                amount,
                currency: Some(currency),
            } => write!(f, "{} {}", amount, currency),
            Self::Structured { amount, currency: None } | Self::Bare(amount) => write!(f, "{}", amount),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A price expressed in the canonical planning currency
///
/// When `verified` is false no rate could be found and `amount` is the
/// unconverted source amount; it must not be read as canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPrice {
    pub amount: f64,
    pub currency: String,
    pub source_amount: f64,
    pub source_currency: CurrencyIndicator,
    pub rate: Option<f64>,
    pub verified: bool,
}

/// A price that could not be converted, surfaced in the final plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnverifiedPrice {
    /// What the price belongs to (e.g. "flight: Vietnam Airlines")
    pub item: String,
    pub amount: f64,
    pub currency: CurrencyIndicator,
}
