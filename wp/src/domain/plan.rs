//! The compiled travel plan and its sections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionstore::Record;

use super::budget::BudgetReport;
use super::itinerary::Itinerary;
use super::money::UnverifiedPrice;
use super::option::{AccommodationOption, FlightOption};
use super::request::TravelRequest;

/// Schema version written into every compiled plan
pub const PLAN_SCHEMA_VERSION: &str = "1.0";

/// A plan section that is either present or an explicit placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    Available { value: T },
    Unavailable { reason: String },
}

impl<T> StepOutcome<T> {
    pub fn available(value: T) -> Self {
        Self::Available { value }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Available { value } => Some(value),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Seasonal context from the Context phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherContext {
    pub season: String,
    pub summary: String,
    #[serde(default)]
    pub packing_notes: Vec<String>,
    #[serde(default)]
    pub seasonal_events: Vec<String>,
}

/// The chosen candidate and what it costs for the whole trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selected<T> {
    pub option: T,
    /// Whole-trip cost in the canonical currency (or source currency if unverified)
    pub total_cost: f64,
    pub verified: bool,
    /// Caveat attached by the selection policy, if any
    #[serde(default)]
    pub note: Option<String>,
}

pub type SelectedFlight = Selected<FlightOption>;
pub type SelectedAccommodation = Selected<AccommodationOption>;

/// A described location mentioned in the advisory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationNote {
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Practical advice and warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryNotes {
    pub warnings_and_tips: Vec<String>,
    #[serde(default)]
    pub visa_info: Option<String>,
    #[serde(default)]
    pub safety_tips: Vec<String>,
    #[serde(default)]
    pub sim_and_apps: Vec<String>,
    #[serde(default)]
    pub locations: Vec<LocationNote>,
}

/// A souvenir suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Souvenir {
    pub item: String,
    pub description: String,
    #[serde(default)]
    pub estimated_price: Option<String>,
    #[serde(default)]
    pub where_to_buy: Option<String>,
}

/// The immutable result of one planning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPlan {
    pub id: String,
    pub version: String,
    pub compiled_at: DateTime<Utc>,
    pub request: TravelRequest,
    pub weather: WeatherContext,
    pub flight: StepOutcome<SelectedFlight>,
    pub accommodation: StepOutcome<SelectedAccommodation>,
    pub itinerary: Itinerary,
    pub budget: BudgetReport,
    pub advisory: StepOutcome<AdvisoryNotes>,
    pub souvenirs: StepOutcome<Vec<Souvenir>>,
    pub unverified_prices: Vec<UnverifiedPrice>,
    /// Placeholders and degraded inputs, in phase order
    pub annotations: Vec<String>,
}

impl TravelPlan {
    /// Last update timestamp (Unix milliseconds); plans never change after compilation
    pub fn updated_at(&self) -> i64 {
        self.compiled_at.timestamp_millis()
    }

    /// True when every optional section was produced and every price verified
    pub fn is_fully_resolved(&self) -> bool {
        self.flight.is_available()
            && self.accommodation.is_available()
            && self.advisory.is_available()
            && self.souvenirs.is_available()
            && self.unverified_prices.is_empty()
    }
}

impl Record for TravelPlan {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        TravelPlan::updated_at(self)
    }

    fn collection_name() -> &'static str {
        "plans"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outcome_serde_shape() {
        let available: StepOutcome<u32> = StepOutcome::available(7);
        let json = serde_json::to_value(&available).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["value"], 7);

        let unavailable: StepOutcome<u32> = StepOutcome::unavailable("logistics timed out");
        let json = serde_json::to_value(&unavailable).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "logistics timed out");

        let back: StepOutcome<u32> = serde_json::from_value(json).unwrap();
        assert!(!back.is_available());
        assert!(back.value().is_none());
    }
}
