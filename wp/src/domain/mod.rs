//! Domain types for waypoint
//!
//! Trip requests, conversation sessions, candidate options, itineraries,
//! budget reports and the compiled plan. Sessions and plans are persisted
//! through the session store.

mod budget;
mod id;
mod itinerary;
mod money;
mod option;
mod plan;
mod request;
mod session;

pub use budget::{BudgetCategory, BudgetReport, BudgetStatus, CategoryKind};
pub use id::{IdResolver, generate_id};
pub use itinerary::{Activity, DailySchedule, Itinerary};
pub use money::{CurrencyIndicator, NormalizedPrice, RawPrice, UnverifiedPrice};
pub use option::{AccommodationOption, CandidateOption, FlightOption};
pub use plan::{
    AdvisoryNotes, LocationNote, PLAN_SCHEMA_VERSION, Selected, SelectedAccommodation, SelectedFlight, Souvenir,
    StepOutcome, TravelPlan, WeatherContext,
};
pub use request::{MAX_TRIP_DAYS, RequestDraft, RequestField, TravelRequest, TravelStyle};
pub use session::{ConversationSession, IntakeState, Speaker, Turn};
