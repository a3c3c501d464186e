//! Plan compiler: deterministic assembly of a run's outputs

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    AdvisoryNotes, BudgetReport, Itinerary, SelectedAccommodation, SelectedFlight, Souvenir, StepOutcome, TravelPlan,
    TravelRequest, UnverifiedPrice, WeatherContext,
};

/// A required compiler input was never produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("missing required input: {0}")]
    MissingInput(&'static str),
}

/// Everything phases 1 to 4 produced
#[derive(Debug, Clone, PartialEq)]
pub struct PlanInputs {
    pub request: TravelRequest,
    pub weather: Option<WeatherContext>,
    pub flight: StepOutcome<SelectedFlight>,
    pub accommodation: StepOutcome<SelectedAccommodation>,
    pub itinerary: Option<Itinerary>,
    pub budget: Option<BudgetReport>,
    pub advisory: StepOutcome<AdvisoryNotes>,
    pub souvenirs: StepOutcome<Vec<Souvenir>>,
    pub unverified_prices: Vec<UnverifiedPrice>,
    pub annotations: Vec<String>,
}

impl PlanInputs {
    /// Inputs with nothing produced yet; every optional section unavailable
    pub fn new(request: TravelRequest) -> Self {
        Self {
            request,
            weather: None,
            flight: StepOutcome::unavailable("not run"),
            accommodation: StepOutcome::unavailable("not run"),
            itinerary: None,
            budget: None,
            advisory: StepOutcome::unavailable("not run"),
            souvenirs: StepOutcome::unavailable("not run"),
            unverified_prices: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// Assemble the plan
///
/// Same inputs, version, timestamp and id give the same plan.
pub fn compile(
    inputs: PlanInputs,
    version: &str,
    compiled_at: DateTime<Utc>,
    id: String,
) -> Result<TravelPlan, CompileError> {
    debug!(%id, %version, "compile: called");
    let weather = inputs.weather.ok_or(CompileError::MissingInput("weather context"))?;
    let itinerary = inputs.itinerary.ok_or(CompileError::MissingInput("itinerary"))?;
    let budget = inputs.budget.ok_or(CompileError::MissingInput("budget report"))?;

    Ok(TravelPlan {
        id,
        version: version.to_string(),
        compiled_at,
        request: inputs.request,
        weather,
        flight: inputs.flight,
        accommodation: inputs.accommodation,
        itinerary,
        budget,
        advisory: inputs.advisory,
        souvenirs: inputs.souvenirs,
        unverified_prices: inputs.unverified_prices,
        annotations: inputs.annotations,
    })
}
