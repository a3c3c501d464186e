//! Budget report types
//!
//! A report is derived from category amounts; it is never hand-edited.
//! The validator only annotates `status` and `recommendations`.

use serde::{Deserialize, Serialize};

/// Well-known budget categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Flight,
    Accommodation,
    Food,
    LocalTransport,
    Activities,
    Shopping,
    Miscellaneous,
}

impl CategoryKind {
    /// Guess the kind from a free-form category name
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));
        if has(&["flight", "airfare", "air ticket", "plane"]) {
            Self::Flight
        } else if has(&["accommodation", "hotel", "lodging", "hostel", "homestay", "stay"]) {
            Self::Accommodation
        } else if has(&["food", "dining", "meal", "restaurant"]) {
            Self::Food
        } else if has(&["transport", "taxi", "bus", "train", "transfer"]) {
            Self::LocalTransport
        } else if has(&["activit", "attraction", "ticket", "tour", "entrance"]) {
            Self::Activities
        } else if has(&["shopping", "souvenir", "gift"]) {
            Self::Shopping
        } else {
            Self::Miscellaneous
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Flight => "Flight",
            Self::Accommodation => "Accommodation",
            Self::Food => "Food & Dining",
            Self::LocalTransport => "Local Transport",
            Self::Activities => "Activities",
            Self::Shopping => "Shopping",
            Self::Miscellaneous => "Miscellaneous",
        }
    }
}

/// One line of the budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetCategory {
    pub name: String,
    pub kind: CategoryKind,
    /// Amount in the canonical currency
    pub amount: f64,
    /// Share of the report total, 0-100
    pub percentage: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Overall verdict of the budget check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetStatus {
    #[default]
    WithinBudget,
    OverBudget,
    Warning,
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithinBudget => write!(f, "within-budget"),
            Self::OverBudget => write!(f, "over-budget"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Cost breakdown of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub categories: Vec<BudgetCategory>,
    pub total: f64,
    pub currency: String,
    pub status: BudgetStatus,
    pub recommendations: Vec<String>,
}

impl BudgetReport {
    /// Build a draft report from (name, kind, amount, notes) lines
    ///
    /// Non-finite and negative amounts are treated as zero. Percentages are
    /// shares of the summed total.
    pub fn draft(lines: Vec<(String, CategoryKind, f64, Option<String>)>, currency: &str) -> Self {
        let lines: Vec<_> = lines
            .into_iter()
            .map(|(name, kind, amount, notes)| {
                let amount = if amount.is_finite() && amount > 0.0 { amount } else { 0.0 };
                (name, kind, amount, notes)
            })
            .collect();
        let total: f64 = lines.iter().map(|(_, _, amount, _)| amount).sum();

        let categories = lines
            .into_iter()
            .map(|(name, kind, amount, notes)| BudgetCategory {
                percentage: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
                name,
                kind,
                amount,
                notes,
            })
            .collect();

        Self {
            categories,
            total,
            currency: currency.to_string(),
            status: BudgetStatus::WithinBudget,
            recommendations: Vec::new(),
        }
    }

    /// Sum of the categories of a kind
    pub fn amount_for(&self, kind: CategoryKind) -> f64 {
        self.categories.iter().filter(|c| c.kind == kind).map(|c| c.amount).sum()
    }
}
