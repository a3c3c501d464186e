//! PlanningOrchestrator - runs the five planning phases for one request
//!
//! Phases are hard gates: each one settles every step it launched before
//! the next begins. Options and Analysis fan out with `tokio::join!`;
//! Context and Selection are single load-bearing steps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::Phase;
use super::error::PlanningError;
use super::selection::SelectionPolicy;
use crate::budget::{BudgetValidator, PlanInputs, build_draft, compile};
use crate::config::{BudgetConfig, Config, PlanningConfig};
use crate::currency::{CurrencyNormalizer, RateLookup, StaticRates};
use crate::domain::{
    CandidateOption, Itinerary, Selected, StepOutcome, TravelPlan, TravelRequest, UnverifiedPrice, WeatherContext,
    generate_id,
};
use crate::events::{EventBus, EventEmitter};
use crate::steps::{
    AccommodationInput, AccommodationOutput, AccommodationStep, AdvisoryInput, AdvisoryStep, BudgetInput, BudgetStep,
    CandidateCollector, FailureKind, ItineraryInput, ItineraryStep, LogisticsInput, LogisticsOutput, LogisticsStep,
    SouvenirInput, SouvenirStep, Specialist, StepFailure, StepName, WeatherInput, WeatherStep, disposition,
};

/// Runs planning requests against a specialist
///
/// Holds no per-run state; every call to [`plan`](Self::plan) gets its own
/// collector, rate cache and annotations.
pub struct PlanningOrchestrator {
    specialist: Arc<dyn Specialist>,
    rates: Arc<dyn RateLookup>,
    config: PlanningConfig,
    budget: BudgetConfig,
    events: Option<Arc<EventBus>>,
}

impl PlanningOrchestrator {
    pub fn new(specialist: Arc<dyn Specialist>, rates: Arc<dyn RateLookup>, config: PlanningConfig) -> Self {
        debug!(?config, "PlanningOrchestrator::new: called");
        Self {
            specialist,
            rates,
            config,
            budget: BudgetConfig::default(),
            events: None,
        }
    }

    /// Orchestrator with the configured planning, budget and rate settings
    pub fn from_config(config: &Config, specialist: Arc<dyn Specialist>) -> Self {
        let rates = Arc::new(StaticRates::new(&config.currency.canonical, config.currency.rates.clone()));
        Self::new(specialist, rates, config.planning.clone()).with_budget_config(config.budget.clone())
    }

    pub fn with_budget_config(mut self, budget: BudgetConfig) -> Self {
        self.budget = budget;
        self
    }

    /// Publish progress events on a bus
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run all five phases for a complete request
    ///
    /// Non-load-bearing failures become annotated placeholders in the plan;
    /// a load-bearing failure aborts with the failing phase.
    pub async fn plan(&self, request: &TravelRequest) -> Result<TravelPlan, PlanningError> {
        debug!(destination = %request.destination, "PlanningOrchestrator::plan: called");
        request.validate().map_err(PlanningError::InvalidRequest)?;

        let run_id = generate_id("run", &request.destination);
        let emitter = self.events.as_ref().map(|bus| bus.emitter_for(&run_id));
        info!(%run_id, destination = %request.destination, "Planning run started");
        if let Some(events) = &emitter {
            events.run_started(&request.destination);
        }

        let mut collector = CandidateCollector::new(
            self.specialist.clone(),
            Duration::from_millis(self.config.step_timeout_ms),
            self.config.max_concurrent_steps,
        )
        .with_retries(self.config.max_retries, Duration::from_millis(self.config.retry_backoff_ms));
        if let Some(events) = &emitter {
            collector = collector.with_events(events.clone());
        }

        let mut run = Run {
            request,
            collector,
            normalizer: CurrencyNormalizer::new(&request.currency, self.rates.clone()),
            policy: SelectionPolicy::from_config(&self.config),
            validator: BudgetValidator::from_config(&self.budget),
            schema_version: &self.config.schema_version,
            events: emitter.clone(),
            unverified: Vec::new(),
            annotations: Vec::new(),
        };

        let result = run.execute().await;
        let (hits, misses) = run.normalizer.cache().stats();
        debug!(%run_id, hits, misses, "PlanningOrchestrator::plan: rate cache stats");

        match result {
            Ok(plan) => {
                info!(%run_id, plan_id = %plan.id, annotations = plan.annotations.len(), "Planning run completed");
                if let Some(events) = &emitter {
                    events.run_completed(&plan.id, plan.annotations.len());
                }
                Ok(plan)
            }
            Err(e) => {
                warn!(%run_id, error = %e, "Planning run failed");
                if let (Some(events), Some(phase)) = (&emitter, e.phase()) {
                    events.run_failed(phase, &e.to_string());
                }
                Err(e)
            }
        }
    }
}

/// State of one planning run
struct Run<'a> {
    request: &'a TravelRequest,
    collector: CandidateCollector,
    normalizer: CurrencyNormalizer,
    policy: SelectionPolicy,
    validator: BudgetValidator,
    schema_version: &'a str,
    events: Option<EventEmitter>,
    unverified: Vec<UnverifiedPrice>,
    annotations: Vec<String>,
}

impl Run<'_> {
    async fn execute(&mut self) -> Result<TravelPlan, PlanningError> {
        let mut inputs = PlanInputs::new(self.request.clone());

        // 1. Context
        let started = self.begin(Phase::Context);
        let weather = self.context().await?;
        self.end(Phase::Context, started);

        // 2. Options
        let started = self.begin(Phase::Options);
        let (flights, rooms) = self.options(&weather).await?;
        self.end(Phase::Options, started);

        // 3. Selection
        let started = self.begin(Phase::Selection);
        inputs.flight = self.choose("flight", flights, |c| match c {
            CandidateOption::Flight(f) => Some(f),
            CandidateOption::Accommodation(_) => None,
        });
        inputs.accommodation = self.choose("accommodation", rooms, |c| match c {
            CandidateOption::Accommodation(a) => Some(a),
            CandidateOption::Flight(_) => None,
        });
        let itinerary = self.itinerary(&weather, &inputs).await?;
        self.end(Phase::Selection, started);

        // 4. Analysis
        let started = self.begin(Phase::Analysis);
        self.analysis(&weather, &itinerary, &mut inputs).await?;
        self.end(Phase::Analysis, started);

        // 5. Compilation
        let started = self.begin(Phase::Compilation);
        inputs.weather = Some(weather);
        inputs.itinerary = Some(itinerary);
        inputs.unverified_prices = std::mem::take(&mut self.unverified);
        inputs.annotations = std::mem::take(&mut self.annotations);
        let plan = compile(
            inputs,
            self.schema_version,
            Utc::now(),
            generate_id("plan", &self.request.destination),
        )
        .map_err(|source| PlanningError::Compile {
            phase: Phase::Compilation,
            source,
        })?;
        self.end(Phase::Compilation, started);

        Ok(plan)
    }

    async fn context(&mut self) -> Result<WeatherContext, PlanningError> {
        let input = WeatherInput::from_request(self.request);
        let result = self.collector.collect::<WeatherStep>(&input).await;
        self.settle(StepName::Weather, "weather", result)?
            .into_required(StepName::Weather)
    }

    /// Collect both candidate lists concurrently, then normalize their prices
    async fn options(
        &mut self,
        weather: &WeatherContext,
    ) -> Result<(StepOutcome<Vec<CandidateOption>>, StepOutcome<Vec<CandidateOption>>), PlanningError> {
        let logistics = LogisticsInput::new(self.request, weather);
        let accommodation = AccommodationInput::new(self.request, weather);
        let (flights, rooms) = tokio::join!(
            self.collector.collect::<LogisticsStep>(&logistics),
            self.collector.collect::<AccommodationStep>(&accommodation),
        );

        let flights = self.settle(StepName::Logistics, "flight", flights.map(flight_candidates))?;
        let rooms = self.settle(StepName::Accommodation, "accommodation", rooms.map(room_candidates))?;

        let flights = match flights {
            StepOutcome::Available { value } => StepOutcome::available(self.normalize(value).await),
            unavailable => unavailable,
        };
        let rooms = match rooms {
            StepOutcome::Available { value } => StepOutcome::available(self.normalize(value).await),
            unavailable => unavailable,
        };
        Ok((flights, rooms))
    }

    /// Normalize every candidate price; candidates without a readable amount are dropped
    async fn normalize(&mut self, candidates: Vec<CandidateOption>) -> Vec<CandidateOption> {
        let normalizer = &self.normalizer;
        let prices = join_all(candidates.iter().map(|c| normalizer.normalize_raw(c.raw_price()))).await;

        let mut kept = Vec::with_capacity(candidates.len());
        for (mut candidate, price) in candidates.into_iter().zip(prices) {
            match price {
                Ok(price) => {
                    if !price.verified {
                        debug!(candidate = %candidate.label(), "Run::normalize: price unverified");
                    }
                    candidate.set_normalized(price);
                    kept.push(candidate);
                }
                Err(e) => {
                    warn!(candidate = %candidate.label(), error = %e, "Dropping candidate with unreadable price");
                    self.annotations.push(format!("{} dropped: {}", candidate.label(), e));
                }
            }
        }
        kept
    }

    /// Apply the selection policy to one candidate list
    fn choose<T>(
        &mut self,
        section: &str,
        candidates: StepOutcome<Vec<CandidateOption>>,
        extract: fn(CandidateOption) -> Option<T>,
    ) -> StepOutcome<Selected<T>> {
        let mut candidates = match candidates {
            StepOutcome::Available { value } => value,
            StepOutcome::Unavailable { reason } => return StepOutcome::unavailable(reason),
        };

        let Some(choice) = self.policy.select(&candidates, self.request) else {
            return self.placeholder(section, format!("no usable {} options were found", section));
        };

        let candidate = candidates.swap_remove(choice.index);
        info!(section, choice = %candidate.label(), total_cost = choice.total_cost, "Option selected");
        if let Some(note) = &choice.note {
            self.annotations.push(format!("{} selection: {}", section, note));
        }
        if !choice.verified
            && let Some(price) = candidate.normalized()
        {
            warn!(candidate = %candidate.label(), "Selected price is unverified");
            self.unverified.push(UnverifiedPrice {
                item: candidate.label(),
                amount: price.source_amount,
                currency: price.source_currency.clone(),
            });
        }

        match extract(candidate) {
            Some(option) => StepOutcome::available(Selected {
                option,
                total_cost: choice.total_cost,
                verified: choice.verified,
                note: choice.note,
            }),
            None => self.placeholder(section, format!("{} candidate list held another kind of option", section)),
        }
    }

    async fn itinerary(&mut self, weather: &WeatherContext, inputs: &PlanInputs) -> Result<Itinerary, PlanningError> {
        let input = ItineraryInput {
            request: self.request.clone(),
            weather: weather.clone(),
            flight: inputs.flight.value().map(|s| s.option.clone()),
            accommodation: inputs.accommodation.value().map(|s| s.option.clone()),
        };
        let result = self.collector.collect::<ItineraryStep>(&input).await;
        let mut itinerary = self
            .settle(StepName::Itinerary, "itinerary", result)?
            .into_required(StepName::Itinerary)?;
        itinerary.normalize_days(self.request.departure_date);
        debug!(days = itinerary.daily_schedules.len(), "Run::itinerary: schedule ready");
        Ok(itinerary)
    }

    /// Budget, advisory and souvenirs concurrently, then the validated budget report
    async fn analysis(
        &mut self,
        weather: &WeatherContext,
        itinerary: &Itinerary,
        inputs: &mut PlanInputs,
    ) -> Result<(), PlanningError> {
        let budget_input = BudgetInput {
            request: self.request.clone(),
            flight: inputs.flight.value().cloned(),
            accommodation: inputs.accommodation.value().cloned(),
            itinerary: itinerary.clone(),
        };
        let advisory_input = AdvisoryInput::new(self.request, weather, itinerary);
        let souvenir_input = SouvenirInput::new(self.request, itinerary);

        let (estimate, advisory, souvenirs) = tokio::join!(
            self.collector.collect::<BudgetStep>(&budget_input),
            self.collector.collect::<AdvisoryStep>(&advisory_input),
            self.collector.collect::<SouvenirStep>(&souvenir_input),
        );

        let estimate = self.settle(StepName::Budget, "budget estimate", estimate)?;
        inputs.advisory = self.settle(StepName::Advisory, "advisory", advisory)?;
        inputs.souvenirs = self.settle(StepName::Souvenir, "souvenirs", souvenirs.map(|o| o.souvenirs))?;

        let draft = build_draft(
            self.request,
            &inputs.flight,
            &inputs.accommodation,
            estimate.value(),
            itinerary,
            &self.normalizer,
        )
        .await;
        self.unverified.extend(draft.unverified);
        self.annotations.extend(draft.annotations);

        let report = self.validator.validate(draft.report, self.request.budget, &self.unverified);
        info!(total = report.total, status = %report.status, "Budget validated");
        inputs.budget = Some(report);
        Ok(())
    }

    /// Turn a settled step into an outcome, or abort the run
    fn settle<T>(
        &mut self,
        step: StepName,
        section: &str,
        result: Result<T, StepFailure>,
    ) -> Result<StepOutcome<T>, PlanningError> {
        match result {
            Ok(value) => Ok(StepOutcome::available(value)),
            Err(failure) => match disposition(step, &failure) {
                FailureKind::Fatal => Err(PlanningError::StepFailed {
                    phase: step.phase(),
                    step,
                    failure,
                }),
                _ => Ok(self.placeholder(section, format!("{} step failed: {}", step, failure.message))),
            },
        }
    }

    fn placeholder<T>(&mut self, section: &str, reason: String) -> StepOutcome<T> {
        warn!(section, %reason, "Section unavailable");
        if let Some(events) = &self.events {
            events.placeholder(section, &reason);
        }
        self.annotations.push(format!("{} unavailable: {}", section, reason));
        StepOutcome::unavailable(reason)
    }

    fn begin(&self, phase: Phase) -> Instant {
        info!(%phase, index = phase.index(), "Phase started");
        if let Some(events) = &self.events {
            events.phase_started(phase);
        }
        Instant::now()
    }

    fn end(&self, phase: Phase, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(%phase, duration_ms, "Phase completed");
        if let Some(events) = &self.events {
            events.phase_completed(phase, duration_ms);
        }
    }
}

fn flight_candidates(output: LogisticsOutput) -> Vec<CandidateOption> {
    output.flights.into_iter().map(CandidateOption::Flight).collect()
}

fn room_candidates(output: AccommodationOutput) -> Vec<CandidateOption> {
    output.options.into_iter().map(CandidateOption::Accommodation).collect()
}

trait IntoRequired<T> {
    fn into_required(self, step: StepName) -> Result<T, PlanningError>;
}

impl<T> IntoRequired<T> for StepOutcome<T> {
    /// Value of a load-bearing step; a placeholder here means the run cannot go on
    fn into_required(self, step: StepName) -> Result<T, PlanningError> {
        match self {
            StepOutcome::Available { value } => Ok(value),
            StepOutcome::Unavailable { reason } => Err(PlanningError::StepFailed {
                phase: step.phase(),
                step,
                failure: StepFailure::new(FailureKind::Fatal, reason),
            }),
        }
    }
}
