//! Candidate flight and accommodation options offered by the Options phase

use serde::{Deserialize, Serialize};

use super::money::{NormalizedPrice, RawPrice};
use super::request::TravelRequest;

fn default_score() -> f64 {
    0.5
}

/// A flight offer; `price` is per traveler for the round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOption {
    pub airline: String,
    #[serde(default)]
    pub flight_type: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub cabin_class: Option<String>,
    pub price: RawPrice,
    #[serde(default)]
    pub normalized: Option<NormalizedPrice>,
    /// Relevance/quality score in [0, 1]
    #[serde(default = "default_score")]
    pub score: f64,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub booking_platforms: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A lodging offer; `price` is per night for the whole party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationOption {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    pub price: RawPrice,
    #[serde(default)]
    pub normalized: Option<NormalizedPrice>,
    /// Relevance/quality score in [0, 1]
    #[serde(default = "default_score")]
    pub score: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub distance_to_center: Option<String>,
    #[serde(default)]
    pub booking_platforms: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A candidate produced by the Options phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateOption {
    Flight(FlightOption),
    Accommodation(AccommodationOption),
}

impl CandidateOption {
    /// Provider shown to the user (airline or property name)
    pub fn provider(&self) -> &str {
        match self {
            Self::Flight(f) => &f.airline,
            Self::Accommodation(a) => &a.name,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Flight(f) => format!("flight: {}", f.airline),
            Self::Accommodation(a) => format!("accommodation: {}", a.name),
        }
    }

    pub fn raw_price(&self) -> &RawPrice {
        match self {
            Self::Flight(f) => &f.price,
            Self::Accommodation(a) => &a.price,
        }
    }

    pub fn normalized(&self) -> Option<&NormalizedPrice> {
        match self {
            Self::Flight(f) => f.normalized.as_ref(),
            Self::Accommodation(a) => a.normalized.as_ref(),
        }
    }

    pub fn set_normalized(&mut self, price: NormalizedPrice) {
        match self {
            Self::Flight(f) => f.normalized = Some(price),
            Self::Accommodation(a) => a.normalized = Some(price),
        }
    }

    /// Relevance score clamped to [0, 1]; non-finite scores count as 0
    pub fn score(&self) -> f64 {
        let score = match self {
            Self::Flight(f) => f.score,
            Self::Accommodation(a) => a.score,
        };
        if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
    }

    pub fn is_verified(&self) -> bool {
        self.normalized().map(|p| p.verified).unwrap_or(false)
    }

    /// Units of the price this trip consumes (travelers for flights, nights for lodging)
    pub fn units(&self, request: &TravelRequest) -> u32 {
        match self {
            Self::Flight(_) => request.num_travelers,
            Self::Accommodation(_) => request.nights(),
        }
    }

    /// Whole-trip cost in the normalized currency, if normalized
    pub fn trip_cost(&self, request: &TravelRequest) -> Option<f64> {
        self.normalized().map(|p| p.amount * f64::from(self.units(request)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurrencyIndicator, TravelStyle};
    use chrono::NaiveDate;

    fn request() -> TravelRequest {
        TravelRequest {
            destination: "Da Lat".to_string(),
            departure_point: "Hanoi".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 12, 25).unwrap(),
            trip_duration: 5,
            num_travelers: 2,
            budget: 25_000_000.0,
            currency: "VND".to_string(),
            travel_style: TravelStyle::SelfGuided,
            notes: String::new(),
        }
    }

    fn priced(amount: f64) -> NormalizedPrice {
        NormalizedPrice {
            amount,
            currency: "VND".to_string(),
            source_amount: amount,
            source_currency: CurrencyIndicator::Code("VND".to_string()),
            rate: Some(1.0),
            verified: true,
        }
    }

    #[test]
    fn test_deserialize_tagged_flight() {
        let json = r#"{"kind": "flight", "airline": "Vietjet", "price": {"amount": 80, "currency": "USD"}, "score": 0.9}"#;
        let option: CandidateOption = serde_json::from_str(json).unwrap();
        assert_eq!(option.provider(), "Vietjet");
        assert_eq!(option.score(), 0.9);
        assert!(option.normalized().is_none());
        assert!(!option.is_verified());
    }

    #[test]
    fn test_missing_score_defaults() {
        let json = r#"{"kind": "accommodation", "name": "Hillside Inn", "price": "900000 VND"}"#;
        let option: CandidateOption = serde_json::from_str(json).unwrap();
        assert_eq!(option.score(), 0.5);
    }

    #[test]
    fn test_trip_cost_uses_units() {
        let req = request();

        let mut flight = CandidateOption::Flight(FlightOption {
            airline: "Vietjet".to_string(),
            flight_type: None,
            departure_time: None,
            arrival_time: None,
            duration: None,
            cabin_class: None,
            price: RawPrice::Bare(2_000_000.0),
            normalized: None,
            score: 1.7,
            benefits: vec![],
            booking_platforms: vec![],
            notes: None,
        });
        assert_eq!(flight.trip_cost(&req), None);
        flight.set_normalized(priced(2_000_000.0));
        assert_eq!(flight.trip_cost(&req), Some(4_000_000.0));
        assert_eq!(flight.score(), 1.0);

        let mut room = CandidateOption::Accommodation(AccommodationOption {
            name: "Hillside Inn".to_string(),
            kind: None,
            area: None,
            price: RawPrice::Bare(900_000.0),
            normalized: None,
            score: 0.8,
            rating: None,
            amenities: vec![],
            distance_to_center: None,
            booking_platforms: vec![],
            notes: None,
        });
        room.set_normalized(priced(900_000.0));
        assert_eq!(room.trip_cost(&req), Some(3_600_000.0));
    }
}
