//! Typed input/output records for each specialist step
//!
//! Specialists exchange JSON; these contracts pin down the shape of each
//! step's payload so the orchestrator only ever handles typed records.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccommodationOption, AdvisoryNotes, FlightOption, Itinerary, RawPrice, SelectedAccommodation, SelectedFlight,
    Souvenir, TravelRequest, TravelStyle, WeatherContext,
};
use crate::orchestrator::Phase;

/// The specialist steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepName {
    Weather,
    Logistics,
    Accommodation,
    Itinerary,
    Budget,
    Advisory,
    Souvenir,
}

impl StepName {
    pub const ALL: [StepName; 7] = [
        StepName::Weather,
        StepName::Logistics,
        StepName::Accommodation,
        StepName::Itinerary,
        StepName::Budget,
        StepName::Advisory,
        StepName::Souvenir,
    ];

    pub fn phase(&self) -> Phase {
        match self {
            Self::Weather => Phase::Context,
            Self::Logistics | Self::Accommodation => Phase::Options,
            Self::Itinerary => Phase::Selection,
            Self::Budget | Self::Advisory | Self::Souvenir => Phase::Analysis,
        }
    }

    /// Steps whose failure aborts the whole run
    pub fn is_load_bearing(&self) -> bool {
        matches!(self, Self::Weather | Self::Itinerary)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Logistics => "logistics",
            Self::Accommodation => "accommodation",
            Self::Itinerary => "itinerary",
            Self::Budget => "budget",
            Self::Advisory => "advisory",
            Self::Souvenir => "souvenir",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Binds a step name to its payload types
pub trait StepContract {
    const STEP: StepName;
    type Input: Serialize + Send + Sync;
    type Output: DeserializeOwned + Send;

    /// Structural checks on a decoded output; failures count as validation failures
    fn check(_output: &Self::Output) -> Result<(), String> {
        Ok(())
    }
}

// === Context ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInput {
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub trip_duration: u32,
}

impl WeatherInput {
    pub fn from_request(request: &TravelRequest) -> Self {
        Self {
            destination: request.destination.clone(),
            departure_date: request.departure_date,
            return_date: request.return_date(),
            trip_duration: request.trip_duration,
        }
    }
}

pub struct WeatherStep;

impl StepContract for WeatherStep {
    const STEP: StepName = StepName::Weather;
    type Input = WeatherInput;
    type Output = WeatherContext;

    fn check(output: &WeatherContext) -> Result<(), String> {
        if output.season.trim().is_empty() && output.summary.trim().is_empty() {
            return Err("weather context is empty".to_string());
        }
        Ok(())
    }
}

// === Options ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsInput {
    pub departure_point: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub num_travelers: u32,
    pub budget: f64,
    pub currency: String,
    pub weather: WeatherContext,
}

impl LogisticsInput {
    pub fn new(request: &TravelRequest, weather: &WeatherContext) -> Self {
        Self {
            departure_point: request.departure_point.clone(),
            destination: request.destination.clone(),
            departure_date: request.departure_date,
            return_date: request.return_date(),
            num_travelers: request.num_travelers,
            budget: request.budget,
            currency: request.currency.clone(),
            weather: weather.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticsOutput {
    pub flights: Vec<FlightOption>,
    #[serde(default)]
    pub booking_tips: Vec<String>,
}

pub struct LogisticsStep;

impl StepContract for LogisticsStep {
    const STEP: StepName = StepName::Logistics;
    type Input = LogisticsInput;
    type Output = LogisticsOutput;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationInput {
    pub destination: String,
    pub check_in: NaiveDate,
    pub nights: u32,
    pub num_travelers: u32,
    pub budget: f64,
    pub currency: String,
    pub travel_style: TravelStyle,
    pub weather: WeatherContext,
}

impl AccommodationInput {
    pub fn new(request: &TravelRequest, weather: &WeatherContext) -> Self {
        Self {
            destination: request.destination.clone(),
            check_in: request.departure_date,
            nights: request.nights(),
            num_travelers: request.num_travelers,
            budget: request.budget,
            currency: request.currency.clone(),
            travel_style: request.travel_style,
            weather: weather.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationOutput {
    pub options: Vec<AccommodationOption>,
    #[serde(default)]
    pub best_areas: Vec<String>,
    #[serde(default)]
    pub booking_tips: Vec<String>,
}

pub struct AccommodationStep;

impl StepContract for AccommodationStep {
    const STEP: StepName = StepName::Accommodation;
    type Input = AccommodationInput;
    type Output = AccommodationOutput;
}

// === Selection ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryInput {
    pub request: TravelRequest,
    pub weather: WeatherContext,
    /// The selected flight, if any flight could be selected
    pub flight: Option<FlightOption>,
    /// The selected accommodation, if any could be selected
    pub accommodation: Option<AccommodationOption>,
}

pub struct ItineraryStep;

impl StepContract for ItineraryStep {
    const STEP: StepName = StepName::Itinerary;
    type Input = ItineraryInput;
    type Output = Itinerary;

    fn check(output: &Itinerary) -> Result<(), String> {
        output.check()
    }
}

// === Analysis ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInput {
    pub request: TravelRequest,
    pub flight: Option<SelectedFlight>,
    pub accommodation: Option<SelectedAccommodation>,
    pub itinerary: Itinerary,
}

/// One category line as estimated by the budget specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub name: String,
    pub amount: RawPrice,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetOutput {
    pub categories: Vec<BudgetLine>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

pub struct BudgetStep;

impl StepContract for BudgetStep {
    const STEP: StepName = StepName::Budget;
    type Input = BudgetInput;
    type Output = BudgetOutput;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryInput {
    pub destination: String,
    pub departure_point: String,
    pub departure_date: NaiveDate,
    pub travel_style: TravelStyle,
    pub weather: WeatherContext,
    pub locations: Vec<String>,
}

impl AdvisoryInput {
    pub fn new(request: &TravelRequest, weather: &WeatherContext, itinerary: &Itinerary) -> Self {
        Self {
            destination: request.destination.clone(),
            departure_point: request.departure_point.clone(),
            departure_date: request.departure_date,
            travel_style: request.travel_style,
            weather: weather.clone(),
            locations: itinerary.locations.clone(),
        }
    }
}

pub struct AdvisoryStep;

impl StepContract for AdvisoryStep {
    const STEP: StepName = StepName::Advisory;
    type Input = AdvisoryInput;
    type Output = AdvisoryNotes;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SouvenirInput {
    pub destination: String,
    pub locations: Vec<String>,
    pub budget: f64,
    pub currency: String,
}

impl SouvenirInput {
    pub fn new(request: &TravelRequest, itinerary: &Itinerary) -> Self {
        Self {
            destination: request.destination.clone(),
            locations: itinerary.locations.clone(),
            budget: request.budget,
            currency: request.currency.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SouvenirOutput {
    pub souvenirs: Vec<Souvenir>,
}

pub struct SouvenirStep;

impl StepContract for SouvenirStep {
    const STEP: StepName = StepName::Souvenir;
    type Input = SouvenirInput;
    type Output = SouvenirOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bearing_steps() {
        let load_bearing: Vec<_> = StepName::ALL.into_iter().filter(|s| s.is_load_bearing()).collect();
        assert_eq!(load_bearing, vec![StepName::Weather, StepName::Itinerary]);
    }

    #[test]
    fn test_step_name_parse_and_serde() {
        assert_eq!(StepName::parse("Logistics"), Some(StepName::Logistics));
        assert_eq!(StepName::parse("teleport"), None);
        assert_eq!(serde_json::to_string(&StepName::Souvenir).unwrap(), "\"souvenir\"");
    }

    #[test]
    fn test_logistics_output_decodes_loose_prices() {
        let json = serde_json::json!({
            "flights": [
                {"airline": "Vietjet", "price": "1,200,000 VND", "score": 0.8},
                {"airline": "Bamboo", "price": {"amount": 60, "currency": "USD"}}
            ]
        });
        let output: LogisticsOutput = serde_json::from_value(json).unwrap();
        assert_eq!(output.flights.len(), 2);
        assert_eq!(output.flights[1].score, 0.5);
        assert!(output.booking_tips.is_empty());
    }

    #[test]
    fn test_itinerary_contract_rejects_empty_schedule() {
        let empty = Itinerary {
            daily_schedules: vec![],
            locations: vec![],
            summary: None,
        };
        assert!(ItineraryStep::check(&empty).is_err());
    }
}
