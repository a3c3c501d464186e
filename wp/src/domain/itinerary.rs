//! Day-by-day itinerary produced by the Selection phase

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One scheduled activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Time window, e.g. "08:00 - 10:00"
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Estimated cost in the canonical currency
    #[serde(default)]
    pub cost_estimate: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Activities of a single trip day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule {
    /// 1-based day index
    pub day: u32,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub title: String,
    pub activities: Vec<Activity>,
}

impl DailySchedule {
    /// Sum of the known activity cost estimates
    pub fn estimated_cost(&self) -> f64 {
        self.activities
            .iter()
            .filter_map(|a| a.cost_estimate)
            .filter(|c| c.is_finite() && *c > 0.0)
            .sum()
    }
}

/// The complete itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub daily_schedules: Vec<DailySchedule>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Itinerary {
    /// Sum of activity estimates over every day
    pub fn estimated_cost(&self) -> f64 {
        self.daily_schedules.iter().map(DailySchedule::estimated_cost).sum()
    }

    /// Order days by index and fill missing dates from the departure date
    pub fn normalize_days(&mut self, departure: NaiveDate) {
        self.daily_schedules.sort_by_key(|d| d.day);
        for day in &mut self.daily_schedules {
            if day.date.is_none() {
                day.date = departure.checked_add_days(chrono::Days::new(u64::from(day.day.saturating_sub(1))));
            }
        }
    }

    /// Structural checks: at least one day, unique positive day indices
    pub fn check(&self) -> Result<(), String> {
        if self.daily_schedules.is_empty() {
            return Err("itinerary has no days".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for day in &self.daily_schedules {
            if day.day == 0 {
                return Err("day indices start at 1".to_string());
            }
            if !seen.insert(day.day) {
                return Err(format!("day {} appears twice", day.day));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(cost: Option<f64>) -> Activity {
        Activity {
            time: "09:00 - 11:00".to_string(),
            location: "Xuan Huong Lake".to_string(),
            activity_type: Some("sightseeing".to_string()),
            description: "Walk around the lake".to_string(),
            cost_estimate: cost,
            notes: None,
        }
    }

    fn day(index: u32, costs: &[Option<f64>]) -> DailySchedule {
        DailySchedule {
            day: index,
            date: None,
            title: format!("Day {}", index),
            activities: costs.iter().map(|c| activity(*c)).collect(),
        }
    }

    #[test]
    fn test_estimated_cost_skips_unknown_and_negative() {
        let itinerary = Itinerary {
            daily_schedules: vec![day(1, &[Some(100.0), None]), day(2, &[Some(-5.0), Some(50.0)])],
            locations: vec![],
            summary: None,
        };
        assert_eq!(itinerary.estimated_cost(), 150.0);
    }

    #[test]
    fn test_normalize_days_sorts_and_dates() {
        let mut itinerary = Itinerary {
            daily_schedules: vec![day(2, &[]), day(1, &[])],
            locations: vec![],
            summary: None,
        };
        let departure = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        itinerary.normalize_days(departure);

        assert_eq!(itinerary.daily_schedules[0].day, 1);
        assert_eq!(itinerary.daily_schedules[0].date, Some(departure));
        assert_eq!(itinerary.daily_schedules[1].date, NaiveDate::from_ymd_opt(2025, 12, 26));
    }

    #[test]
    fn test_check_rejects_duplicates_and_empty() {
        let empty = Itinerary {
            daily_schedules: vec![],
            locations: vec![],
            summary: None,
        };
        assert!(empty.check().is_err());

        let dup = Itinerary {
            daily_schedules: vec![day(1, &[]), day(1, &[])],
            locations: vec![],
            summary: None,
        };
        assert!(dup.check().unwrap_err().contains("twice"));
    }
}
