//! Currency handling: free-text price parsing, rate lookup and normalization

mod format;
mod normalizer;
mod parse;
mod rates;

pub use format::{format_amount, format_money};
pub use normalizer::{CurrencyNormalizer, NormalizeError, RateCache};
pub use parse::{ParsedPrice, code_for_symbol, code_for_word, parse_price};
pub use rates::{RateError, RateLookup, StaticRates};
