//! Ratio and ceiling checks on a budget report
//!
//! Validation annotates; it never rejects a plan and never touches amounts.

use tracing::{debug, warn};

use crate::config::BudgetConfig;
use crate::currency::format_money;
use crate::domain::{BudgetReport, BudgetStatus, CategoryKind, UnverifiedPrice};

/// Applies the category ceilings and the absolute ceiling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetValidator {
    flight_ratio: f64,
    accommodation_ratio: f64,
}

impl Default for BudgetValidator {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}

impl BudgetValidator {
    pub fn new(flight_ratio: f64, accommodation_ratio: f64) -> Self {
        Self {
            flight_ratio,
            accommodation_ratio,
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.flight_ratio, config.accommodation_ratio)
    }

    /// Annotate a draft report against the trip budget
    ///
    /// Status is over-budget when the total exceeds the budget, warning when
    /// a category ceiling is reached or a price is unverified, and
    /// within-budget otherwise.
    pub fn validate(&self, mut report: BudgetReport, budget: f64, unverified: &[UnverifiedPrice]) -> BudgetReport {
        debug!(total = report.total, budget, "BudgetValidator::validate: called");
        let currency = report.currency.clone();
        let mut warning = false;

        for (kind, ratio) in [
            (CategoryKind::Flight, self.flight_ratio),
            (CategoryKind::Accommodation, self.accommodation_ratio),
        ] {
            let amount = report.amount_for(kind);
            let ceiling = ratio * budget;
            if amount > 0.0 && amount >= ceiling {
                debug!(?kind, amount, ceiling, "BudgetValidator::validate: ceiling reached");
                warning = true;
                report.recommendations.push(format!(
                    "{} costs of {} take {:.0}% of the budget (limit {:.0}%). Look for cheaper {} options.",
                    kind.label(),
                    format_money(amount, &currency),
                    share(amount, budget),
                    ratio * 100.0,
                    kind.label().to_lowercase(),
                ));
            }
        }

        if !unverified.is_empty() {
            warning = true;
            let items: Vec<String> = unverified
                .iter()
                .map(|p| format!("{} ({} {})", p.item, p.amount, p.currency))
                .collect();
            report.recommendations.push(format!(
                "{} price(s) could not be converted to {} and are not counted in the total: {}. Check them before booking.",
                unverified.len(),
                currency,
                items.join(", ")
            ));
        }

        report.status = if report.total > budget {
            warn!(total = report.total, budget, "Plan is over budget");
            report.recommendations.push(format!(
                "The estimated total of {} exceeds the budget of {} by {}.",
                format_money(report.total, &currency),
                format_money(budget, &currency),
                format_money(report.total - budget, &currency),
            ));
            BudgetStatus::OverBudget
        } else if warning {
            BudgetStatus::Warning
        } else {
            BudgetStatus::WithinBudget
        };

        debug!(status = %report.status, "BudgetValidator::validate: done");
        report
    }
}

fn share(amount: f64, budget: f64) -> f64 {
    if budget > 0.0 { amount / budget * 100.0 } else { 100.0 }
}
