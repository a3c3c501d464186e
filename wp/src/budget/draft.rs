//! Budget report draft
//!
//! The selected flight and accommodation are priced at their selected
//! whole-trip cost. Every other category comes from the budget step's
//! estimate, normalized through the run's currency normalizer. Without an
//! estimate the draft falls back to the selections plus the itinerary's
//! activity estimates.

use tracing::{debug, warn};

use crate::currency::CurrencyNormalizer;
use crate::domain::{
    BudgetReport, CategoryKind, Itinerary, SelectedAccommodation, SelectedFlight, StepOutcome, TravelRequest,
    UnverifiedPrice,
};
use crate::steps::BudgetOutput;

pub const FALLBACK_NOTE: &str = "budget estimate unavailable; derived from the selections and itinerary estimates";

/// A draft report and what was learned while building it
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub report: BudgetReport,
    /// Estimate lines that could not be converted
    pub unverified: Vec<UnverifiedPrice>,
    pub annotations: Vec<String>,
}

type Line = (String, CategoryKind, f64, Option<String>);

/// Build the draft report for a run
pub async fn build_draft(
    request: &TravelRequest,
    flight: &StepOutcome<SelectedFlight>,
    accommodation: &StepOutcome<SelectedAccommodation>,
    estimate: Option<&BudgetOutput>,
    itinerary: &Itinerary,
    normalizer: &CurrencyNormalizer,
) -> BudgetDraft {
    debug!(has_estimate = estimate.is_some(), "build_draft: called");
    let mut lines: Vec<Line> = Vec::new();
    let mut unverified = Vec::new();
    let mut annotations = Vec::new();

    let flight = flight.value().filter(|s| s.verified);
    let accommodation = accommodation.value().filter(|s| s.verified);

    if let Some(selected) = flight {
        lines.push((
            CategoryKind::Flight.label().to_string(),
            CategoryKind::Flight,
            selected.total_cost,
            Some(format!("{} x {} traveler(s)", selected.option.airline, request.num_travelers)),
        ));
    }
    if let Some(selected) = accommodation {
        lines.push((
            CategoryKind::Accommodation.label().to_string(),
            CategoryKind::Accommodation,
            selected.total_cost,
            Some(format!("{} x {} night(s)", selected.option.name, request.nights())),
        ));
    }

    match estimate {
        Some(estimate) => {
            for line in &estimate.categories {
                let kind = CategoryKind::from_name(&line.name);
                let replaced = match kind {
                    CategoryKind::Flight => flight.is_some(),
                    CategoryKind::Accommodation => accommodation.is_some(),
                    _ => false,
                };
                if replaced {
                    debug!(name = %line.name, "build_draft: estimate replaced by selection");
                    continue;
                }

                match normalizer.normalize_raw(&line.amount).await {
                    Ok(price) if price.verified => {
                        lines.push((line.name.clone(), kind, price.amount, line.notes.clone()));
                    }
                    Ok(price) => {
                        warn!(name = %line.name, amount = price.source_amount, "Budget line is unverified");
                        unverified.push(UnverifiedPrice {
                            item: format!("budget: {}", line.name),
                            amount: price.source_amount,
                            currency: price.source_currency,
                        });
                        lines.push((line.name.clone(), kind, 0.0, Some(format!("unverified: {}", line.amount))));
                    }
                    Err(e) => {
                        warn!(name = %line.name, error = %e, "Budget line dropped");
                        annotations.push(format!("budget line '{}' dropped: {}", line.name, e));
                    }
                }
            }
        }
        None => {
            annotations.push(FALLBACK_NOTE.to_string());
            let activities = itinerary.estimated_cost();
            if activities > 0.0 {
                lines.push((
                    CategoryKind::Activities.label().to_string(),
                    CategoryKind::Activities,
                    activities,
                    Some("sum of itinerary activity estimates".to_string()),
                ));
            }
        }
    }

    let mut report = BudgetReport::draft(lines, normalizer.canonical());
    if let Some(estimate) = estimate {
        report.recommendations.extend(estimate.recommendations.iter().cloned());
    }

    BudgetDraft {
        report,
        unverified,
        annotations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{RateLookup, StaticRates};
    use crate::domain::{Activity, DailySchedule, FlightOption, RawPrice, Selected, TravelStyle};
    use crate::steps::BudgetLine;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::Arc;

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

    fn normalizer() -> CurrencyNormalizer {
        let rates: Arc<dyn RateLookup> = Arc::new(StaticRates::new(
            "VND",
            HashMap::from([("USD".to_string(), 25_000.0)]),
        ));
        CurrencyNormalizer::new("VND", rates)
    }

    fn selected_flight(total_cost: f64) -> StepOutcome<SelectedFlight> {
        StepOutcome::available(Selected {
            option: FlightOption {
                airline: "Vietjet".to_string(),
                flight_type: None,
                departure_time: None,
                arrival_time: None,
                duration: None,
                cabin_class: None,
                price: RawPrice::amount(total_cost / 2.0, "VND"),
                normalized: None,
                score: 0.8,
                benefits: vec![],
                booking_platforms: vec![],
                notes: None,
            },
            total_cost,
            verified: true,
            note: None,
        })
    }

    fn itinerary() -> Itinerary {
        Itinerary {
            daily_schedules: vec![DailySchedule {
                day: 1,
                date: None,
                title: "Arrival".to_string(),
                activities: vec![Activity {
                    time: "14:00 - 16:00".to_string(),
                    location: "Xuan Huong Lake".to_string(),
                    activity_type: None,
                    description: String::new(),
                    cost_estimate: Some(500_000.0),
                    notes: None,
                }],
            }],
            locations: vec![],
            summary: None,
        }
    }

    fn line(name: &str, amount: RawPrice) -> BudgetLine {
        BudgetLine {
            name: name.to_string(),
            amount,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_selection_replaces_estimate() {
        let estimate = BudgetOutput {
            categories: vec![
                line("Flights", RawPrice::amount(9_999_999.0, "VND")),
                line("Food & Dining", RawPrice::amount(100.0, "USD")),
            ],
            recommendations: vec!["Book early".to_string()],
        };
        let draft = build_draft(
            &request(),
            &selected_flight(3_000_000.0),
            &StepOutcome::unavailable("accommodation step timed out"),
            Some(&estimate),
            &itinerary(),
            &normalizer(),
        )
        .await;

        assert_eq!(draft.report.amount_for(CategoryKind::Flight), 3_000_000.0);
        assert_eq!(draft.report.amount_for(CategoryKind::Food), 2_500_000.0);
        assert_eq!(draft.report.total, 5_500_000.0);
        assert_eq!(draft.report.recommendations, vec!["Book early".to_string()]);
        assert!(draft.unverified.is_empty());
        assert!(draft.annotations.is_empty());
    }

    #[tokio::test]
    async fn test_unverified_estimate_line_is_excluded() {
        let estimate = BudgetOutput {
            categories: vec![line("Shopping", RawPrice::amount(50.0, "LAK"))],
            recommendations: vec![],
        };
        let draft = build_draft(
            &request(),
            &StepOutcome::unavailable("no flights"),
            &StepOutcome::unavailable("no rooms"),
            Some(&estimate),
            &itinerary(),
            &normalizer(),
        )
        .await;

        assert_eq!(draft.report.total, 0.0);
        assert_eq!(draft.unverified.len(), 1);
        assert_eq!(draft.unverified[0].item, "budget: Shopping");
        assert_eq!(draft.unverified[0].amount, 50.0);
    }

    #[tokio::test]
    async fn test_fallback_without_estimate() {
        let draft = build_draft(
            &request(),
            &selected_flight(3_000_000.0),
            &StepOutcome::unavailable("no rooms"),
            None,
            &itinerary(),
            &normalizer(),
        )
        .await;

        assert_eq!(draft.report.total, 3_500_000.0);
        assert_eq!(draft.report.amount_for(CategoryKind::Activities), 500_000.0);
        assert_eq!(draft.annotations, vec![FALLBACK_NOTE.to_string()]);
    }
}
