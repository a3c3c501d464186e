//! Trip request types
//!
//! A [`RequestDraft`] is filled slot by slot during intake. Once every
//! mandatory field is present it freezes into an immutable [`TravelRequest`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest trip, in days, that intake or planning accepts
pub const MAX_TRIP_DAYS: u32 = 365;

/// One slot of the trip request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestField {
    Destination,
    DeparturePoint,
    DepartureDate,
    TripDuration,
    NumTravelers,
    Budget,
    TravelStyle,
    Notes,
}

impl RequestField {
    /// Mandatory fields in the default prompting order
    pub const MANDATORY: [RequestField; 7] = [
        RequestField::Destination,
        RequestField::DeparturePoint,
        RequestField::DepartureDate,
        RequestField::TripDuration,
        RequestField::NumTravelers,
        RequestField::Budget,
        RequestField::TravelStyle,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::DeparturePoint => "departure point",
            Self::DepartureDate => "departure date",
            Self::TripDuration => "trip duration",
            Self::NumTravelers => "number of travelers",
            Self::Budget => "budget",
            Self::TravelStyle => "travel style",
            Self::Notes => "notes",
        }
    }

    pub fn is_mandatory(&self) -> bool {
        !matches!(self, Self::Notes)
    }
}

impl std::fmt::Display for RequestField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// How the travelers want to travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelStyle {
    SelfGuided,
    Tour,
}

impl std::fmt::Display for TravelStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfGuided => write!(f, "self-guided"),
            Self::Tour => write!(f, "tour"),
        }
    }
}

/// A complete, frozen trip request
///
/// The budget is always expressed in `currency`, the canonical planning currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRequest {
    pub destination: String,
    pub departure_point: String,
    pub departure_date: NaiveDate,
    pub trip_duration: u32,
    pub num_travelers: u32,
    pub budget: f64,
    pub currency: String,
    pub travel_style: TravelStyle,
    #[serde(default)]
    pub notes: String,
}

impl TravelRequest {
    /// Date of the last day of the trip
    ///
    /// Saturates at the calendar's end for durations no validated request has.
    pub fn return_date(&self) -> NaiveDate {
        self.departure_date
            .checked_add_days(chrono::Days::new(u64::from(self.trip_duration.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Nights of accommodation needed (at least one)
    pub fn nights(&self) -> u32 {
        self.trip_duration.saturating_sub(1).max(1)
    }

    /// Check the completeness invariant on a request built outside intake
    pub fn validate(&self) -> Result<(), String> {
        if self.destination.trim().is_empty() {
            return Err("destination is empty".to_string());
        }
        if self.departure_point.trim().is_empty() {
            return Err("departure point is empty".to_string());
        }
        if !(1..=MAX_TRIP_DAYS).contains(&self.trip_duration) {
            return Err(format!("trip duration must be between 1 and {} days", MAX_TRIP_DAYS));
        }
        if self.num_travelers == 0 {
            return Err("number of travelers must be positive".to_string());
        }
        if !(self.budget.is_finite() && self.budget > 0.0) {
            return Err("budget must be a positive amount".to_string());
        }
        if self.currency.trim().is_empty() {
            return Err("currency is empty".to_string());
        }
        Ok(())
    }
}

/// A partially collected trip request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDraft {
    pub destination: Option<String>,
    pub departure_point: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub trip_duration: Option<u32>,
    pub num_travelers: Option<u32>,
    pub budget: Option<f64>,
    pub travel_style: Option<TravelStyle>,
    pub notes: Option<String>,
}

impl RequestDraft {
    /// Whether a field currently holds a value
    pub fn is_set(&self, field: RequestField) -> bool {
        match field {
            RequestField::Destination => self.destination.is_some(),
            RequestField::DeparturePoint => self.departure_point.is_some(),
            RequestField::DepartureDate => self.departure_date.is_some(),
            RequestField::TripDuration => self.trip_duration.is_some(),
            RequestField::NumTravelers => self.num_travelers.is_some(),
            RequestField::Budget => self.budget.is_some(),
            RequestField::TravelStyle => self.travel_style.is_some(),
            RequestField::Notes => self.notes.is_some(),
        }
    }

    /// Clear a single field
    pub fn clear(&mut self, field: RequestField) {
        debug!(%field, "RequestDraft::clear: called");
        match field {
            RequestField::Destination => self.destination = None,
            RequestField::DeparturePoint => self.departure_point = None,
            RequestField::DepartureDate => self.departure_date = None,
            RequestField::TripDuration => self.trip_duration = None,
            RequestField::NumTravelers => self.num_travelers = None,
            RequestField::Budget => self.budget = None,
            RequestField::TravelStyle => self.travel_style = None,
            RequestField::Notes => self.notes = None,
        }
    }

    /// Unset mandatory fields, in the given priority order
    pub fn missing_fields(&self, order: &[RequestField]) -> Vec<RequestField> {
        order
            .iter()
            .copied()
            .filter(|f| f.is_mandatory() && !self.is_set(*f))
            .collect()
    }

    /// A draft is complete iff every field except notes is set
    pub fn is_complete(&self) -> bool {
        RequestField::MANDATORY.iter().all(|f| self.is_set(*f))
    }

    /// Freeze into a [`TravelRequest`], or None while a mandatory field is missing
    pub fn freeze(&self, currency: &str) -> Option<TravelRequest> {
        debug!(complete = self.is_complete(), "RequestDraft::freeze: called");
        Some(TravelRequest {
            destination: self.destination.clone()?,
            departure_point: self.departure_point.clone()?,
            departure_date: self.departure_date?,
            trip_duration: self.trip_duration?,
            num_travelers: self.num_travelers?,
            budget: self.budget?,
            currency: currency.to_string(),
            travel_style: self.travel_style?,
            notes: self.notes.clone().unwrap_or_default(),
        })
    }
}
