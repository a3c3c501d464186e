//! Free-text price input adapter
//!
//! Turns strings such as "1000 USD", "$1,200", "500.000đ", "10 triệu" or
//! "1.5k euros" into an amount plus a currency indicator. No rate logic here.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::CurrencyIndicator;

/// Number with optional thousands/decimal separators
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d.,]*\d|\d").expect("valid number regex"));

/// Scale word right after the number
static SCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(k|nghìn|ngàn|thousand|m|mil|million|millions|triệu|trieu|tr|b|bn|billion|tỷ|ty)\b")
        .expect("valid scale regex")
});

/// Codes recognised in free text
const KNOWN_CODES: &[&str] = &[
    "VND", "USD", "EUR", "GBP", "JPY", "KRW", "THB", "SGD", "CNY", "AUD", "CAD", "CHF", "HKD", "TWD", "MYR", "IDR",
    "PHP", "INR", "NZD", "LAK", "KHR",
];

/// Currency words and the code they stand for
const CURRENCY_WORDS: &[(&str, &str)] = &[
    ("dollars", "USD"),
    ("dollar", "USD"),
    ("bucks", "USD"),
    ("euros", "EUR"),
    ("euro", "EUR"),
    ("pounds", "GBP"),
    ("pound", "GBP"),
    ("yen", "JPY"),
    ("won", "KRW"),
    ("baht", "THB"),
    ("yuan", "CNY"),
    ("rmb", "CNY"),
    ("đồng", "VND"),
    ("dong", "VND"),
    ("vnđ", "VND"),
];

/// Symbols and the code they stand for; longer symbols first
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("US$", "USD"),
    ("S$", "SGD"),
    ("A$", "AUD"),
    ("C$", "CAD"),
    ("HK$", "HKD"),
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₩", "KRW"),
    ("฿", "THB"),
    ("₫", "VND"),
    ("đ", "VND"),
];

/// A price pulled out of free text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    pub amount: f64,
    pub indicator: CurrencyIndicator,
}

/// Code for a currency symbol, if known
pub fn code_for_symbol(symbol: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, code)| *code)
}

/// Code for a currency word such as "dollars" or "baht", if known
pub fn code_for_word(word: &str) -> Option<&'static str> {
    let word = word.trim().to_lowercase();
    if let Some(code) = KNOWN_CODES.iter().find(|c| c.eq_ignore_ascii_case(&word)) {
        return Some(*code);
    }
    CURRENCY_WORDS.iter().find(|(w, _)| *w == word).map(|(_, code)| *code)
}

/// Extract an amount and currency from free text
///
/// Returns None when the text contains no number. The sign is ignored;
/// prices are magnitudes.
pub fn parse_price(text: &str) -> Option<ParsedPrice> {
    debug!(%text, "parse_price: called");
    let number = NUMBER_RE.find(text)?;
    let mut amount = parse_number(number.as_str())?;

    let rest = &text[number.end()..];
    if let Some(scale) = SCALE_RE.captures(&rest.to_lowercase()) {
        let factor = match &scale[1] {
            "k" | "nghìn" | "ngàn" | "thousand" => 1e3,
            "m" | "mil" | "million" | "millions" | "triệu" | "trieu" | "tr" => 1e6,
            _ => 1e9,
        };
        debug!(factor, "parse_price: applying scale word");
        amount *= factor;
    }

    let indicator = detect_indicator(text);
    debug!(amount, %indicator, "parse_price: parsed");
    Some(ParsedPrice { amount, indicator })
}

/// Interpret one number token with `,`/`.` separators
///
/// With both separators the last one is the decimal point. With one kind of
/// separator, repeated use or exactly three trailing digits means thousands.
fn parse_number(token: &str) -> Option<f64> {
    let commas = token.matches(',').count();
    let dots = token.matches('.').count();

    let cleaned = if commas > 0 && dots > 0 {
        let decimal = if token.rfind(',') > token.rfind('.') { ',' } else { '.' };
        let thousands = if decimal == ',' { '.' } else { ',' };
        token.replace(thousands, "").replace(decimal, ".")
    } else if commas + dots > 0 {
        let sep = if commas > 0 { ',' } else { '.' };
        let trailing = token.rsplit(sep).next().map(str::len).unwrap_or(0);
        if commas + dots > 1 || trailing == 3 {
            token.replace(sep, "")
        } else {
            token.replace(sep, ".")
        }
    } else {
        token.to_string()
    };

    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Find the currency named anywhere in the text
fn detect_indicator(text: &str) -> CurrencyIndicator {
    for word in text
        .split(|c: char| c.is_whitespace() || c == '/' || c == '(' || c == ')' || c.is_ascii_digit())
        .filter(|w| !w.is_empty())
    {
        let trimmed = word.trim_matches(|c: char| c == ',' || c == '.' || c == '-');
        if trimmed.len() == 3 && KNOWN_CODES.iter().any(|c| c.eq_ignore_ascii_case(trimmed)) {
            return CurrencyIndicator::Code(trimmed.to_ascii_uppercase());
        }
        if let Some(code) = CURRENCY_WORDS.iter().find(|(w, _)| w.eq_ignore_ascii_case(trimmed)).map(|(_, c)| c) {
            return CurrencyIndicator::Code(code.to_string());
        }
    }

    for (symbol, _) in CURRENCY_SYMBOLS {
        if *symbol == "đ" {
            // Only as a suffix glued to a number, e.g. "500.000đ"
            let glued = text
                .char_indices()
                .any(|(i, c)| c == 'đ' && text[..i].chars().last().is_some_and(|p| p.is_ascii_digit()));
            if glued {
                return CurrencyIndicator::Symbol("đ".to_string());
            }
        } else if text.contains(symbol) {
            return CurrencyIndicator::Symbol(symbol.to_string());
        }
    }

    CurrencyIndicator::Unknown(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: &str) -> CurrencyIndicator {
        CurrencyIndicator::Code(c.to_string())
    }

    fn symbol(s: &str) -> CurrencyIndicator {
        CurrencyIndicator::Symbol(s.to_string())
    }

    #[test]
    fn test_plain_amount_with_code() {
        assert_eq!(
            parse_price("1000 USD"),
            Some(ParsedPrice {
                amount: 1000.0,
                indicator: code("USD")
            })
        );
        assert_eq!(parse_price("usd 250").unwrap().indicator, code("USD"));
    }

    #[test]
    fn test_bare_number_has_unknown_currency() {
        let parsed = parse_price("100000000").unwrap();
        assert_eq!(parsed.amount, 100_000_000.0);
        assert_eq!(parsed.indicator, CurrencyIndicator::Unknown(None));
    }

    #[test]
    fn test_separators() {
        assert_eq!(parse_price("$1,200").unwrap().amount, 1200.0);
        assert_eq!(parse_price("500.000đ").unwrap().amount, 500_000.0);
        assert_eq!(parse_price("12.50 EUR").unwrap().amount, 12.5);
        assert_eq!(parse_price("1.234.567 VND").unwrap().amount, 1_234_567.0);
        assert_eq!(parse_price("1,234.56 USD").unwrap().amount, 1234.56);
        assert_eq!(parse_price("1.234,56 EUR").unwrap().amount, 1234.56);
    }

    #[test]
    fn test_scale_words() {
        assert_eq!(parse_price("10 triệu").unwrap().amount, 10_000_000.0);
        assert_eq!(parse_price("1.5k euros").unwrap().amount, 1500.0);
        assert_eq!(parse_price("2 million dong").unwrap().amount, 2_000_000.0);
        assert_eq!(parse_price("2 million dong").unwrap().indicator, code("VND"));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(parse_price("$85 per night").unwrap().indicator, symbol("$"));
        assert_eq!(parse_price("€40").unwrap().indicator, symbol("€"));
        assert_eq!(parse_price("500.000đ").unwrap().indicator, symbol("đ"));
        assert_eq!(parse_price("US$ 90").unwrap().indicator, symbol("US$"));
    }

    #[test]
    fn test_words_do_not_trigger_codes() {
        // "per" and "for" are three letters but not currencies
        assert_eq!(
            parse_price("90 per person for two").unwrap().indicator,
            CurrencyIndicator::Unknown(None)
        );
    }

    #[test]
    fn test_no_number() {
        assert_eq!(parse_price("cheap"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_lookup_tables() {
        assert_eq!(code_for_symbol("₫"), Some("VND"));
        assert_eq!(code_for_symbol("?"), None);
        assert_eq!(code_for_word("Dollars"), Some("USD"));
        assert_eq!(code_for_word("usd"), Some("USD"));
        assert_eq!(code_for_word("doubloons"), None);
    }
}
