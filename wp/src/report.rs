//! Plain-text rendering of a compiled plan and live run progress

use std::fmt::Write;

use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::currency::format_money;
use crate::domain::{StepOutcome, TravelPlan};
use crate::events::{EventBus, PlanEvent};

/// Render a plan as a plain-text report
pub fn render_text(plan: &TravelPlan) -> String {
    let mut out = String::new();
    let request = &plan.request;
    let currency = &plan.budget.currency;

    let _ = writeln!(
        out,
        "Trip plan {} (schema {}, compiled {})",
        plan.id,
        plan.version,
        plan.compiled_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "{} from {}, {} to {} ({} days), {} traveler(s), {}",
        request.destination,
        request.departure_point,
        request.departure_date,
        request.return_date(),
        request.trip_duration,
        request.num_travelers,
        request.travel_style
    );
    let _ = writeln!(out, "Budget: {}", format_money(request.budget, &request.currency));
    if !request.notes.is_empty() {
        let _ = writeln!(out, "Notes: {}", request.notes);
    }

    let _ = writeln!(out, "\nWeather: {} - {}", plan.weather.season, plan.weather.summary);
    if !plan.weather.packing_notes.is_empty() {
        let _ = writeln!(out, "  Packing: {}", plan.weather.packing_notes.join(", "));
    }

    match &plan.flight {
        StepOutcome::Available { value } => {
            let _ = writeln!(
                out,
                "\nFlight: {} - {} total{}",
                value.option.airline,
                format_money(value.total_cost, currency),
                value.note.as_ref().map(|n| format!(" ({})", n)).unwrap_or_default()
            );
        }
        StepOutcome::Unavailable { reason } => {
            let _ = writeln!(out, "\nFlight: unavailable ({})", reason);
        }
    }
    match &plan.accommodation {
        StepOutcome::Available { value } => {
            let _ = writeln!(
                out,
                "Accommodation: {} - {} total{}",
                value.option.name,
                format_money(value.total_cost, currency),
                value.note.as_ref().map(|n| format!(" ({})", n)).unwrap_or_default()
            );
        }
        StepOutcome::Unavailable { reason } => {
            let _ = writeln!(out, "Accommodation: unavailable ({})", reason);
        }
    }

    let _ = writeln!(out, "\nItinerary:");
    for day in &plan.itinerary.daily_schedules {
        let date = day.date.map(|d| format!(" ({})", d)).unwrap_or_default();
        let _ = writeln!(out, "  Day {}{} {}", day.day, date, day.title);
        for activity in &day.activities {
            let cost = activity
                .cost_estimate
                .map(|c| format!(" [{}]", format_money(c, currency)))
                .unwrap_or_default();
            let _ = writeln!(out, "    {:14} {}{}", activity.time, activity.location, cost);
        }
    }

    let _ = writeln!(
        out,
        "\nBudget ({}): {} of {}",
        plan.budget.status,
        format_money(plan.budget.total, currency),
        format_money(request.budget, &request.currency)
    );
    for category in &plan.budget.categories {
        let _ = writeln!(
            out,
            "  {:20} {:>20} {:>6.1}%",
            category.name,
            format_money(category.amount, currency),
            category.percentage
        );
    }
    for recommendation in &plan.budget.recommendations {
        let _ = writeln!(out, "  - {}", recommendation);
    }

    match &plan.advisory {
        StepOutcome::Available { value } => {
            let _ = writeln!(out, "\nAdvisory:");
            for tip in value.warnings_and_tips.iter().chain(&value.safety_tips) {
                let _ = writeln!(out, "  - {}", tip);
            }
            if let Some(visa) = &value.visa_info {
                let _ = writeln!(out, "  Visa: {}", visa);
            }
        }
        StepOutcome::Unavailable { reason } => {
            let _ = writeln!(out, "\nAdvisory: unavailable ({})", reason);
        }
    }

    match &plan.souvenirs {
        StepOutcome::Available { value } => {
            let _ = writeln!(out, "\nSouvenirs:");
            for souvenir in value {
                let _ = writeln!(out, "  - {}: {}", souvenir.item, souvenir.description);
            }
        }
        StepOutcome::Unavailable { reason } => {
            let _ = writeln!(out, "\nSouvenirs: unavailable ({})", reason);
        }
    }

    if !plan.unverified_prices.is_empty() {
        let _ = writeln!(out, "\nUnverified prices:");
        for price in &plan.unverified_prices {
            let _ = writeln!(out, "  - {}: {} {}", price.item, price.amount, price.currency);
        }
    }

    if !plan.annotations.is_empty() {
        let _ = writeln!(out, "\nAnnotations:");
        for annotation in &plan.annotations {
            let _ = writeln!(out, "  - {}", annotation);
        }
    }

    out
}

/// Print run progress until the run completes or fails
///
/// Abort the handle if the run never started.
pub fn spawn_progress_printer(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let line = event.describe();
                    match &event {
                        PlanEvent::RunFailed { .. } | PlanEvent::StepFailed { .. } => {
                            eprintln!("  {} {}", "✗".red(), line)
                        }
                        PlanEvent::Placeholder { .. } | PlanEvent::StepRetrying { .. } => {
                            eprintln!("  {} {}", "!".yellow(), line)
                        }
                        PlanEvent::PhaseStarted { .. } => eprintln!("{}", line.cyan()),
                        _ => eprintln!("  {}", line.dimmed()),
                    }
                    if matches!(event, PlanEvent::RunCompleted { .. } | PlanEvent::RunFailed { .. }) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
