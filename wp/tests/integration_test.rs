//! Integration tests for Waypoint
//!
//! These tests drive intake and planning end to end with scripted
//! collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tempfile::TempDir;

use waypoint::config::{Config, PlanningConfig, SuggestionsConfig};
use waypoint::currency::{RateError, RateLookup, StaticRates};
use waypoint::domain::{BudgetStatus, CategoryKind, IntakeState, StepOutcome, TravelRequest, TravelStyle};
use waypoint::events::{EventBus, PlanEvent};
use waypoint::intake::{CatalogSuggester, IntakeMachine};
use waypoint::orchestrator::{Phase, PlanningError, PlanningOrchestrator};
use waypoint::steps::{FailureKind, ScriptedSpecialist, StepName};
use waypoint::storage::{FileStore, MemoryStore, SessionStore};

// =============================================================================
// Fixtures
// =============================================================================

fn request() -> TravelRequest {
    TravelRequest {
        destination: "Da Lat".to_string(),
        departure_point: "Hanoi".to_string(),
        departure_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        trip_duration: 3,
        num_travelers: 2,
        budget: 10_000_000.0,
        currency: "VND".to_string(),
        travel_style: TravelStyle::SelfGuided,
        notes: String::new(),
    }
}

fn weather() -> Value {
    json!({
        "season": "Dry season",
        "summary": "Cool mornings, sunny afternoons",
        "packing_notes": ["light jacket"]
    })
}

fn flights() -> Value {
    json!({
        "flights": [
            {"airline": "Vietjet", "price": {"amount": 1200000, "currency": "VND"}, "score": 0.8},
            {"airline": "Vietnam Airlines", "price": {"amount": 80, "currency": "USD"}, "score": 0.9}
        ]
    })
}

fn rooms() -> Value {
    json!({
        "options": [
            {"name": "Hillside Inn", "price": {"amount": 900000, "currency": "VND"}, "score": 0.7},
            {"name": "Pine Lodge", "price": {"amount": 30, "currency": "LAK"}, "score": 0.9}
        ]
    })
}

fn itinerary() -> Value {
    json!({
        "daily_schedules": [
            {"day": 2, "title": "Lakes", "activities": [
                {"time": "08:00 - 10:00", "location": "Tuyen Lam Lake", "cost_estimate": 100000}
            ]},
            {"day": 1, "title": "Arrival", "activities": [
                {"time": "14:00 - 16:00", "location": "Xuan Huong Lake"}
            ]},
            {"day": 3, "title": "Departure", "activities": []}
        ],
        "locations": ["Xuan Huong Lake", "Tuyen Lam Lake"]
    })
}

fn estimate() -> Value {
    json!({
        "categories": [
            {"name": "Flights", "amount": {"amount": 3000000, "currency": "VND"}},
            {"name": "Food", "amount": {"amount": 1500000, "currency": "VND"}}
        ],
        "recommendations": ["Book the night bus back to save a hotel night."]
    })
}

fn advisory() -> Value {
    json!({"warnings_and_tips": ["Carry cash for the night market"], "safety_tips": ["Watch for motorbikes"]})
}

fn souvenirs() -> Value {
    json!({"souvenirs": [{"item": "Artichoke tea", "description": "Local herbal tea"}]})
}

/// A specialist that answers every step successfully
fn full_script() -> ScriptedSpecialist {
    ScriptedSpecialist::new()
        .with_output(StepName::Weather, weather())
        .with_output(StepName::Logistics, flights())
        .with_output(StepName::Accommodation, rooms())
        .with_output(StepName::Itinerary, itinerary())
        .with_output(StepName::Budget, estimate())
        .with_output(StepName::Advisory, advisory())
        .with_output(StepName::Souvenir, souvenirs())
}

fn orchestrator(specialist: Arc<ScriptedSpecialist>) -> PlanningOrchestrator {
    PlanningOrchestrator::from_config(&Config::default(), specialist)
}

// =============================================================================
// Intake Tests
// =============================================================================

fn intake() -> IntakeMachine {
    IntakeMachine::from_config(
        &Config::default(),
        Arc::new(CatalogSuggester::new(SuggestionsConfig::default().catalogue)),
    )
    .with_today(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap())
}

#[tokio::test]
async fn test_intake_suggestion_to_complete_request() {
    let machine = intake();
    let mut session = machine.start();

    let turns = [
        "I'm not sure where to go",
        "somewhere with mountains, trekking and rice terraces",
        "yes",
        "Hanoi",
        "2025-12-25",
        "3 days",
        "2 people",
        "1000 USD",
        "self-guided",
    ];
    for turn in turns {
        machine.handle_turn(&mut session, turn).await;
    }
    assert_eq!(session.state, IntakeState::Confirming);
    let summary = session.last_assistant_text().unwrap();
    assert!(summary.contains("Sa Pa"));
    assert!(summary.contains("25,000,000 VND"));

    let reply = machine.handle_turn(&mut session, "none").await;
    assert!(reply.contains("confirmed"));
    assert!(session.is_complete());

    let request = session.request.clone().unwrap();
    assert_eq!(request.destination, "Sa Pa");
    assert_eq!(request.departure_point, "Hanoi");
    assert_eq!(request.trip_duration, 3);
    assert_eq!(request.num_travelers, 2);
    assert_eq!(request.budget, 25_000_000.0);
    assert_eq!(request.currency, "VND");
    assert_eq!(request.travel_style, TravelStyle::SelfGuided);
    assert_eq!(request.return_date(), NaiveDate::from_ymd_opt(2025, 12, 27).unwrap());
    assert!(request.validate().is_ok());
}

#[tokio::test]
async fn test_intake_mountain_suggestion_turns() {
    let machine = intake();
    let mut session = machine.start();

    let turns = [
        "I need suggestions",
        "mountains, cool weather",
        "yes",
        "Hanoi",
        "2025-12-25",
        "5",
        "2",
        "1000 USD",
        "independent",
        "none",
    ];
    for turn in turns {
        machine.handle_turn(&mut session, turn).await;
    }

    assert_eq!(session.state, IntakeState::Complete);
    // greeting, then one reply per turn
    assert_eq!(session.turns.len(), 1 + 2 * turns.len());

    let request = session.request.clone().unwrap();
    assert_eq!(request.destination, "Sa Pa");
    assert_eq!(request.departure_point, "Hanoi");
    assert_eq!(request.departure_date, NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
    assert_eq!(request.trip_duration, 5);
    assert_eq!(request.num_travelers, 2);
    assert_eq!(request.budget, 25_000_000.0);
    assert_eq!(request.currency, "VND");
    assert_eq!(request.travel_style, TravelStyle::SelfGuided);
    assert_eq!(request.notes, "");
    assert_eq!(request.return_date(), NaiveDate::from_ymd_opt(2025, 12, 29).unwrap());
}

#[tokio::test]
async fn test_intake_session_survives_store_round_trip() {
    let machine = intake();
    let store = MemoryStore::new();
    let mut session = machine.start();

    for turn in ["Hue", "Hanoi", "2025-12-25"] {
        machine.handle_turn(&mut session, turn).await;
        store.put_session(&session).unwrap();
    }

    let mut resumed = store.get_session(&session.id).unwrap().unwrap();
    assert_eq!(resumed, session);
    for turn in ["4", "2", "8000000", "tour", "none"] {
        machine.handle_turn(&mut resumed, turn).await;
    }
    assert!(resumed.is_complete());
    assert_eq!(resumed.request.unwrap().destination, "Hue");
}

// =============================================================================
// Orchestrator Tests
// =============================================================================

#[tokio::test]
async fn test_full_plan() {
    let specialist = Arc::new(full_script());
    let plan = orchestrator(specialist.clone()).plan(&request()).await.unwrap();

    assert!(plan.id.contains("plan-da-lat"));
    assert_eq!(plan.version, "1.0");
    assert_eq!(plan.weather.season, "Dry season");

    // Cheapest whole-trip flight wins: 2 x 1,200,000 VND beats 2 x 80 USD
    let flight = plan.flight.value().unwrap();
    assert_eq!(flight.option.airline, "Vietjet");
    assert_eq!(flight.total_cost, 2_400_000.0);

    // The LAK-priced lodge cannot be verified, so the verified inn is chosen
    let stay = plan.accommodation.value().unwrap();
    assert_eq!(stay.option.name, "Hillside Inn");
    assert_eq!(stay.total_cost, 1_800_000.0);
    assert!(stay.verified);

    let days: Vec<u32> = plan.itinerary.daily_schedules.iter().map(|d| d.day).collect();
    assert_eq!(days, vec![1, 2, 3]);
    assert_eq!(
        plan.itinerary.daily_schedules[2].date,
        NaiveDate::from_ymd_opt(2026, 2, 3)
    );

    assert_eq!(plan.budget.amount_for(CategoryKind::Flight), 2_400_000.0);
    assert_eq!(plan.budget.amount_for(CategoryKind::Accommodation), 1_800_000.0);
    assert_eq!(plan.budget.amount_for(CategoryKind::Food), 1_500_000.0);
    assert_eq!(plan.budget.total, 5_700_000.0);
    assert_eq!(plan.budget.status, BudgetStatus::WithinBudget);
    assert!(
        plan.budget
            .recommendations
            .iter()
            .any(|r| r.contains("night bus"))
    );

    assert!(plan.advisory.is_available());
    assert_eq!(plan.souvenirs.value().unwrap().len(), 1);
    assert!(plan.unverified_prices.is_empty());
    assert!(plan.annotations.is_empty());
    assert_eq!(specialist.total_calls(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_logistics_timeout_degrades_flight_only() {
    let specialist = Arc::new(full_script_without(StepName::Logistics).with_delay(
        StepName::Logistics,
        Duration::from_secs(600),
        flights(),
    ));

    let config = PlanningConfig {
        step_timeout_ms: 30_000,
        retry_backoff_ms: 0,
        ..PlanningConfig::default()
    };
    let rates = Arc::new(StaticRates::new("VND", Config::default().currency.rates));
    let plan = PlanningOrchestrator::new(specialist.clone(), rates, config)
        .plan(&request())
        .await
        .unwrap();

    assert_eq!(specialist.calls(StepName::Logistics), 2);
    match &plan.flight {
        StepOutcome::Unavailable { reason } => {
            assert_eq!(reason, "logistics step failed: logistics step timed out after 30000ms")
        }
        StepOutcome::Available { .. } => panic!("flight should be a placeholder"),
    }
    assert_eq!(plan.accommodation.value().unwrap().option.name, "Hillside Inn");
    assert!(
        plan.annotations
            .iter()
            .any(|a| a.starts_with("flight unavailable: logistics step failed"))
    );
    // Without a verified flight the estimate's flight line stays in the report
    assert_eq!(plan.budget.amount_for(CategoryKind::Flight), 3_000_000.0);
}

#[tokio::test]
async fn test_weather_failure_aborts_before_options() {
    let specialist = Arc::new(
        full_script_without(StepName::Weather).with_failure(StepName::Weather, FailureKind::Validation, "bad season"),
    );
    let err = orchestrator(specialist.clone()).plan(&request()).await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Context));
    assert_eq!(err.step(), Some(StepName::Weather));
    assert!(err.to_string().starts_with("planning could not be completed: context phase failed"));
    assert_eq!(specialist.calls(StepName::Logistics), 0);
    assert_eq!(specialist.calls(StepName::Accommodation), 0);
}

#[tokio::test]
async fn test_accommodation_failure_becomes_placeholder() {
    let specialist = Arc::new(
        full_script_without(StepName::Accommodation).with_failure(
            StepName::Accommodation,
            FailureKind::Unavailable,
            "no rooms",
        ),
    );
    let plan = orchestrator(specialist).plan(&request()).await.unwrap();

    assert!(!plan.accommodation.is_available());
    assert!(plan.flight.is_available());
    assert!(
        plan.annotations
            .contains(&"accommodation unavailable: accommodation step failed: no rooms".to_string())
    );
}

#[tokio::test]
async fn test_itinerary_failure_aborts_in_selection() {
    let specialist = Arc::new(
        full_script_without(StepName::Itinerary).with_output(StepName::Itinerary, json!({"daily_schedules": []})),
    );
    let err = orchestrator(specialist.clone()).plan(&request()).await.unwrap_err();

    assert!(matches!(
        err,
        PlanningError::StepFailed {
            phase: Phase::Selection,
            step: StepName::Itinerary,
            ..
        }
    ));
    assert_eq!(specialist.calls(StepName::Budget), 0);
    assert_eq!(specialist.calls(StepName::Advisory), 0);
}

#[tokio::test]
async fn test_missing_budget_estimate_falls_back() {
    let specialist = Arc::new(full_script_without(StepName::Budget));
    let plan = orchestrator(specialist).plan(&request()).await.unwrap();

    assert!(
        plan.annotations
            .iter()
            .any(|a| a == waypoint::budget::FALLBACK_NOTE)
    );
    assert_eq!(plan.budget.amount_for(CategoryKind::Activities), 100_000.0);
    assert_eq!(plan.budget.total, 2_400_000.0 + 1_800_000.0 + 100_000.0);
}

#[tokio::test]
async fn test_expensive_flight_warns() {
    let specialist = Arc::new(full_script_without(StepName::Logistics).with_output(
        StepName::Logistics,
        json!({"flights": [{"airline": "Bamboo", "price": {"amount": 2500000, "currency": "VND"}}]}),
    ));
    let plan = orchestrator(specialist).plan(&request()).await.unwrap();

    assert_eq!(plan.budget.amount_for(CategoryKind::Flight), 5_000_000.0);
    assert_eq!(plan.budget.status, BudgetStatus::Warning);
    assert!(
        plan.budget
            .recommendations
            .iter()
            .any(|r| r.contains("Flight costs of 5,000,000 VND take 50% of the budget"))
    );
}

#[tokio::test]
async fn test_invalid_request_rejected() {
    let specialist = Arc::new(full_script());
    let mut bad = request();
    bad.num_travelers = 0;

    let err = orchestrator(specialist.clone()).plan(&bad).await.unwrap_err();
    assert!(matches!(err, PlanningError::InvalidRequest(_)));
    assert_eq!(err.phase(), None);
    assert_eq!(specialist.total_calls(), 0);
}

#[tokio::test]
async fn test_out_of_range_duration_rejected_before_any_step() {
    let specialist = Arc::new(full_script());
    let mut endless = request();
    endless.trip_duration = u32::MAX;

    let err = orchestrator(specialist.clone()).plan(&endless).await.unwrap_err();
    match err {
        PlanningError::InvalidRequest(reason) => assert!(reason.contains("trip duration")),
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
    assert_eq!(specialist.total_calls(), 0);
}

#[tokio::test]
async fn test_events_follow_phase_order() {
    let bus = Arc::new(EventBus::new(512));
    let mut rx = bus.subscribe();
    let plan = orchestrator(Arc::new(full_script()))
        .with_events(bus.clone())
        .plan(&request())
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(PlanEvent::RunStarted { .. })));
    match events.last() {
        Some(PlanEvent::RunCompleted { plan_id, .. }) => assert_eq!(plan_id, &plan.id),
        other => panic!("expected RunCompleted, got {:?}", other),
    }

    let phases: Vec<Phase> = events
        .iter()
        .filter_map(|e| match e {
            PlanEvent::PhaseStarted { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, Phase::ALL.to_vec());

    let run_id = events[0].run_id().to_string();
    assert!(events.iter().all(|e| e.run_id() == run_id));
}

/// Rates that drift on every lookup and count calls
struct DriftingRates {
    calls: AtomicUsize,
}

#[async_trait]
impl RateLookup for DriftingRates {
    async fn lookup_rate(&self, from: &str, _to: &str) -> Result<f64, RateError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match from {
            "USD" => Ok(25_000.0 + 1_000.0 * n as f64),
            other => Err(RateError::Unavailable {
                from: other.to_string(),
                to: "VND".to_string(),
            }),
        }
    }
}

#[tokio::test]
async fn test_one_rate_per_pair_per_run() {
    let specialist = Arc::new(
        ScriptedSpecialist::new()
            .with_output(StepName::Weather, weather())
            .with_output(
                StepName::Logistics,
                json!({"flights": [
                    {"airline": "A", "price": {"amount": 40, "currency": "USD"}, "score": 0.9},
                    {"airline": "B", "price": {"amount": 50, "currency": "USD"}, "score": 0.8},
                    {"airline": "C", "price": "$60", "score": 0.7}
                ]}),
            )
            .with_output(
                StepName::Accommodation,
                json!({"options": [{"name": "Dalat Hostel", "price": {"amount": 20, "currency": "usd"}}]}),
            )
            .with_output(StepName::Itinerary, itinerary())
            .with_output(
                StepName::Budget,
                json!({"categories": [{"name": "Food", "amount": {"amount": 60, "currency": "USD"}}]}),
            )
            .with_output(StepName::Advisory, advisory())
            .with_output(StepName::Souvenir, souvenirs()),
    );
    let rates = Arc::new(DriftingRates {
        calls: AtomicUsize::new(0),
    });

    let plan = PlanningOrchestrator::new(specialist, rates.clone(), PlanningConfig::default())
        .plan(&request())
        .await
        .unwrap();

    assert_eq!(rates.calls.load(Ordering::SeqCst), 1);
    assert_eq!(plan.flight.value().unwrap().option.airline, "A");
    assert_eq!(plan.flight.value().unwrap().total_cost, 40.0 * 25_000.0 * 2.0);
    assert_eq!(plan.accommodation.value().unwrap().total_cost, 20.0 * 25_000.0 * 2.0);
    assert_eq!(plan.budget.amount_for(CategoryKind::Food), 60.0 * 25_000.0);
}

#[tokio::test]
async fn test_runs_do_not_share_rates() {
    let rates = Arc::new(DriftingRates {
        calls: AtomicUsize::new(0),
    });
    let planner = PlanningOrchestrator::new(Arc::new(full_script()), rates.clone(), PlanningConfig::default());

    let first = planner.plan(&request()).await.unwrap();
    let second = planner.plan(&request()).await.unwrap();

    // Each run looks up USD and LAK once
    assert_eq!(rates.calls.load(Ordering::SeqCst), 4);
    assert_ne!(first.id, second.id);
}

fn full_script_without(step: StepName) -> ScriptedSpecialist {
    let outputs: HashMap<StepName, Value> = [
        (StepName::Weather, weather()),
        (StepName::Logistics, flights()),
        (StepName::Accommodation, rooms()),
        (StepName::Itinerary, itinerary()),
        (StepName::Budget, estimate()),
        (StepName::Advisory, advisory()),
        (StepName::Souvenir, souvenirs()),
    ]
    .into_iter()
    .filter(|(s, _)| *s != step)
    .collect();

    let specialist = ScriptedSpecialist::new();
    for (step, output) in outputs {
        specialist.push(step, waypoint::steps::ScriptedReply::Output(output));
    }
    specialist
}

// =============================================================================
// Storage Tests
// =============================================================================

#[tokio::test]
async fn test_plan_persisted_and_listed() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileStore::open(temp_dir.path()).unwrap();

    let plan = orchestrator(Arc::new(full_script())).plan(&request()).await.unwrap();
    store.put_plan(&plan).unwrap();

    let loaded = store.get_plan(&plan.id).unwrap().unwrap();
    assert_eq!(loaded, plan);
    assert_eq!(store.list_plans().unwrap().len(), 1);
    assert!(temp_dir.path().join("plans").join(format!("{}.json", plan.id)).exists());
}

async fn plan_deleted_once(store: &dyn SessionStore) {
    let plan = orchestrator(Arc::new(full_script())).plan(&request()).await.unwrap();
    store.put_plan(&plan).unwrap();

    assert!(store.delete_plan(&plan.id).unwrap());
    assert!(store.get_plan(&plan.id).unwrap().is_none());
    assert!(store.list_plans().unwrap().is_empty());
    assert!(!store.delete_plan(&plan.id).unwrap());
}

#[tokio::test]
async fn test_plan_delete_memory_store() {
    plan_deleted_once(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_plan_delete_file_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileStore::open(temp_dir.path()).unwrap();
    plan_deleted_once(&store).await;
    assert!(!temp_dir.path().join("plans").read_dir().unwrap().any(|_| true));
}
