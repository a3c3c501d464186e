//! Selection policy for candidate options
//!
//! Minimize whole-trip cost subject to a relevance floor. Costs within a
//! relative tolerance of the cheapest tie; ties go to the higher score,
//! then the lower exact cost.

use tracing::debug;

use crate::config::PlanningConfig;
use crate::domain::{CandidateOption, TravelRequest};

pub const BELOW_FLOOR_NOTE: &str = "below relevance floor";
pub const UNVERIFIED_NOTE: &str = "price unverified";

/// The winning candidate of a list
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    /// Position in the candidate list
    pub index: usize,
    /// Whole-trip cost; 0 when the price could not be read at all
    pub total_cost: f64,
    pub verified: bool,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    pub relevance_floor: f64,
    pub tie_tolerance: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from_config(&PlanningConfig::default())
    }
}

impl SelectionPolicy {
    pub fn new(relevance_floor: f64, tie_tolerance: f64) -> Self {
        Self {
            relevance_floor,
            tie_tolerance,
        }
    }

    pub fn from_config(config: &PlanningConfig) -> Self {
        Self::new(config.relevance_floor, config.price_tie_tolerance)
    }

    /// Pick one candidate, or None for an empty list
    pub fn select(&self, candidates: &[CandidateOption], request: &TravelRequest) -> Option<Choice> {
        debug!(count = candidates.len(), "SelectionPolicy::select: called");
        if candidates.is_empty() {
            return None;
        }

        let mut notes = Vec::new();
        let mut pool: Vec<usize> = (0..candidates.len())
            .filter(|i| candidates[*i].score() >= self.relevance_floor)
            .collect();
        if pool.is_empty() {
            debug!("SelectionPolicy::select: no candidate meets the floor");
            notes.push(BELOW_FLOOR_NOTE);
            pool = (0..candidates.len()).collect();
        }

        let verified: Vec<usize> = pool.iter().copied().filter(|i| candidates[*i].is_verified()).collect();
        if verified.is_empty() {
            notes.push(UNVERIFIED_NOTE);
        } else {
            pool = verified;
        }

        let cost = |i: usize| candidates[i].trip_cost(request).unwrap_or(f64::INFINITY);
        let cheapest = pool.iter().map(|i| cost(*i)).fold(f64::INFINITY, f64::min);
        let ceiling = cheapest * (1.0 + self.tie_tolerance);

        let best = pool
            .iter()
            .copied()
            .filter(|i| cost(*i) <= ceiling || cheapest.is_infinite())
            .reduce(|best, i| {
                let (a, b) = (&candidates[best], &candidates[i]);
                if b.score() > a.score() || (b.score() == a.score() && cost(i) < cost(best)) {
                    i
                } else {
                    best
                }
            })?;

        let total_cost = cost(best);
        debug!(index = best, total_cost, "SelectionPolicy::select: chosen");
        Some(Choice {
            index: best,
            total_cost: if total_cost.is_finite() { total_cost } else { 0.0 },
            verified: candidates[best].is_verified(),
            note: (!notes.is_empty()).then(|| notes.join("; ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurrencyIndicator, FlightOption, NormalizedPrice, RawPrice, TravelStyle};
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

    fn flight(airline: &str, price: f64, score: f64, verified: bool) -> CandidateOption {
        CandidateOption::Flight(FlightOption {
            airline: airline.to_string(),
            flight_type: None,
            departure_time: None,
            arrival_time: None,
            duration: None,
            cabin_class: None,
            price: RawPrice::Bare(price),
            normalized: Some(NormalizedPrice {
                amount: price,
                currency: "VND".to_string(),
                source_amount: price,
                source_currency: CurrencyIndicator::Code("VND".to_string()),
                rate: verified.then_some(1.0),
                verified,
            }),
            score,
            benefits: vec![],
            booking_platforms: vec![],
            notes: None,
        })
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(SelectionPolicy::default().select(&[], &request()), None);
    }

    #[test]
    fn test_cheapest_eligible_wins() {
        let candidates = vec![
            flight("Cheap but irrelevant", 500_000.0, 0.2, true),
            flight("Vietjet", 1_500_000.0, 0.7, true),
            flight("Vietnam Airlines", 2_500_000.0, 0.9, true),
        ];
        let choice = SelectionPolicy::default().select(&candidates, &request()).unwrap();
        assert_eq!(choice.index, 1);
        assert_eq!(choice.total_cost, 3_000_000.0);
        assert!(choice.verified);
        assert_eq!(choice.note, None);
    }

    #[test]
    fn test_near_tie_goes_to_higher_score() {
        let candidates = vec![
            flight("Vietjet", 1_000_000.0, 0.6, true),
            flight("Bamboo", 1_005_000.0, 0.8, true),
            flight("Pacific", 1_200_000.0, 1.0, true),
        ];
        let choice = SelectionPolicy::default().select(&candidates, &request()).unwrap();
        assert_eq!(choice.index, 1);
    }

    #[test]
    fn test_equal_score_tie_goes_to_lower_price() {
        let candidates = vec![
            flight("Bamboo", 1_005_000.0, 0.8, true),
            flight("Vietjet", 1_000_000.0, 0.8, true),
        ];
        let choice = SelectionPolicy::default().select(&candidates, &request()).unwrap();
        assert_eq!(choice.index, 1);
    }

    #[test]
    fn test_verified_preferred_over_cheaper_unverified() {
        let candidates = vec![
            flight("Mystery", 10.0, 0.9, false),
            flight("Vietjet", 1_500_000.0, 0.7, true),
        ];
        let choice = SelectionPolicy::default().select(&candidates, &request()).unwrap();
        assert_eq!(choice.index, 1);
    }

    #[test]
    fn test_nothing_meets_floor() {
        let candidates = vec![
            flight("A", 2_000_000.0, 0.1, true),
            flight("B", 1_000_000.0, 0.3, true),
        ];
        let choice = SelectionPolicy::default().select(&candidates, &request()).unwrap();
        assert_eq!(choice.index, 1);
        assert_eq!(choice.note.as_deref(), Some(BELOW_FLOOR_NOTE));
    }

    #[test]
    fn test_all_unverified_is_noted() {
        let candidates = vec![flight("A", 80.0, 0.9, false)];
        let choice = SelectionPolicy::default().select(&candidates, &request()).unwrap();
        assert!(!choice.verified);
        assert_eq!(choice.note.as_deref(), Some(UNVERIFIED_NOTE));
    }
}
