//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const WEATHER: &str = include_str!("../../prompts/weather.pmt");
pub const LOGISTICS: &str = include_str!("../../prompts/logistics.pmt");
pub const ACCOMMODATION: &str = include_str!("../../prompts/accommodation.pmt");
pub const ITINERARY: &str = include_str!("../../prompts/itinerary.pmt");
pub const BUDGET: &str = include_str!("../../prompts/budget.pmt");
pub const ADVISORY: &str = include_str!("../../prompts/advisory.pmt");
pub const SOUVENIR: &str = include_str!("../../prompts/souvenir.pmt");

/// Destination suggestion prompt used by the intake dialogue
pub const SUGGEST: &str = include_str!("../../prompts/suggest.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "weather" => Some(WEATHER),
        "logistics" => Some(LOGISTICS),
        "accommodation" => Some(ACCOMMODATION),
        "itinerary" => Some(ITINERARY),
        "budget" => Some(BUDGET),
        "advisory" => Some(ADVISORY),
        "souvenir" => Some(SOUVENIR),
        "suggest" => Some(SUGGEST),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_describe_json_output() {
        for prompt in [WEATHER, LOGISTICS, ACCOMMODATION, ITINERARY, BUDGET, ADVISORY, SOUVENIR] {
            assert!(prompt.contains("JSON"));
        }
    }

    #[test]
    fn test_suggest_prompt_has_no_match_sentinel() {
        assert!(SUGGEST.contains("NO_MATCH"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
