//! Intake state machine
//!
//! Drives one [`ConversationSession`] from an empty draft to a frozen
//! [`TravelRequest`](crate::domain::TravelRequest), one user turn at a time.
//! Every handled turn appends exactly one assistant turn. Unusable input is
//! never an error; it becomes a re-prompt.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use super::messages;
use super::parse::{
    has_edit_intent, is_affirmative, is_bare_negative, is_negative, is_none_reply, is_uncertain, mentioned_field,
    parse_date, parse_duration, parse_place, parse_style, parse_travelers,
};
use super::suggest::{DestinationSuggester, Suggestion};
use crate::config::{Config, IntakeConfig};
use crate::currency::{CurrencyNormalizer, RateLookup, StaticRates, format_money, parse_price};
use crate::domain::{ConversationSession, CurrencyIndicator, IntakeState, RequestField, Turn};

/// Why a reply could not fill the prompted field
type Rejection = Option<String>;

/// Slot-filling dialogue over a conversation session
pub struct IntakeMachine {
    config: IntakeConfig,
    canonical: String,
    suggester: Arc<dyn DestinationSuggester>,
    rates: Arc<dyn RateLookup>,
    today: Option<NaiveDate>,
}

impl IntakeMachine {
    pub fn new(
        config: IntakeConfig,
        canonical: impl Into<String>,
        suggester: Arc<dyn DestinationSuggester>,
        rates: Arc<dyn RateLookup>,
    ) -> Self {
        let canonical = canonical.into().to_ascii_uppercase();
        debug!(%canonical, "IntakeMachine::new: called");
        Self {
            config,
            canonical,
            suggester,
            rates,
            today: None,
        }
    }

    /// Machine using the configured intake settings and static rate table
    pub fn from_config(config: &Config, suggester: Arc<dyn DestinationSuggester>) -> Self {
        let rates = Arc::new(StaticRates::new(
            config.currency.canonical.clone(),
            config.currency.rates.clone(),
        ));
        Self::new(config.intake.clone(), config.currency.canonical.clone(), suggester, rates)
    }

    /// Fix "today" for departure-date checks
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Open a new session with the greeting and the first question
    pub fn start(&self) -> ConversationSession {
        let mut session = ConversationSession::new(&self.config.field_order);
        info!(session_id = %session.id, "Intake session started");
        let opening = self.opening(&session);
        session.push(Turn::assistant(opening));
        session
    }

    /// Clear the draft and start over, keeping the transcript
    pub fn reset(&self, session: &mut ConversationSession) {
        info!(session_id = %session.id, "Intake session reset");
        session.draft = Default::default();
        session.request = None;
        session.reprompts = 0;
        session.state = IntakeState::Collecting {
            missing: session.draft.missing_fields(&self.config.field_order),
        };
        let opening = self.opening(session);
        session.push(Turn::assistant(opening));
    }

    fn opening(&self, session: &ConversationSession) -> String {
        let first = session
            .missing_fields()
            .first()
            .copied()
            .unwrap_or(RequestField::Destination);
        format!("{} {}", messages::greeting(), messages::prompt_for(first, &self.canonical))
    }

    /// Handle one user turn and return the assistant reply
    pub async fn handle_turn(&self, session: &mut ConversationSession, text: &str) -> String {
        debug!(session_id = %session.id, state = %session.state, "IntakeMachine::handle_turn: called");
        session.push(Turn::user(text));

        let reply = match session.state.clone() {
            IntakeState::Collecting { missing } => match missing.first().copied() {
                Some(field) => self.on_collecting(session, field, text).await,
                None => self.advance(session),
            },
            IntakeState::Suggesting => self.on_suggesting(session, text).await,
            IntakeState::SuggestionOffered { destination } => self.on_offered(session, &destination, text).await,
            IntakeState::Confirming => self.on_confirming(session, text),
            IntakeState::Complete => messages::already_complete().to_string(),
        };

        debug!(state = %session.state, "IntakeMachine::handle_turn: transitioned");
        session.push(Turn::assistant(reply.clone()));
        reply
    }

    async fn on_collecting(&self, session: &mut ConversationSession, field: RequestField, text: &str) -> String {
        if field == RequestField::Destination && is_uncertain(text) {
            debug!("IntakeMachine::on_collecting: entering suggestion dialogue");
            session.reprompts = 0;
            session.state = IntakeState::Suggesting;
            return messages::ask_preferences().to_string();
        }

        match self.fill(session, field, text).await {
            Ok(()) => self.advance(session),
            Err(reason) => self.reprompt(session, field, reason.as_deref()),
        }
    }

    /// Parse the reply for `field` and store it
    async fn fill(&self, session: &mut ConversationSession, field: RequestField, text: &str) -> Result<(), Rejection> {
        let draft = &mut session.draft;
        match field {
            RequestField::Destination => draft.destination = Some(parse_place(text).ok_or(None)?),
            RequestField::DeparturePoint => draft.departure_point = Some(parse_place(text).ok_or(None)?),
            RequestField::DepartureDate => {
                let date = parse_date(text).ok_or(None)?;
                if self.config.require_future_date && date <= self.today() {
                    return Err(Some(format!("the departure date must be after {}", self.today())));
                }
                draft.departure_date = Some(date);
            }
            RequestField::TripDuration => draft.trip_duration = Some(parse_duration(text).ok_or(None)?),
            RequestField::NumTravelers => draft.num_travelers = Some(parse_travelers(text).ok_or(None)?),
            RequestField::Budget => draft.budget = Some(self.parse_budget(text).await?),
            RequestField::TravelStyle => draft.travel_style = Some(parse_style(text).ok_or(None)?),
            RequestField::Notes => draft.notes = Some(text.trim().to_string()),
        }
        debug!(%field, "IntakeMachine::fill: stored");
        Ok(())
    }

    /// Budget in the canonical currency
    ///
    /// Bare amounts are already canonical; foreign amounts must convert.
    async fn parse_budget(&self, text: &str) -> Result<f64, Rejection> {
        let parsed = parse_price(text).ok_or(None)?;
        if parsed.amount <= 0.0 {
            return Err(Some("the budget must be more than zero".to_string()));
        }
        if parsed.indicator == CurrencyIndicator::Unknown(None) {
            return Ok(parsed.amount);
        }

        let normalizer = CurrencyNormalizer::new(self.canonical.clone(), self.rates.clone());
        let price = normalizer
            .normalize(parsed.amount, parsed.indicator.clone())
            .await
            .map_err(|_| None)?;
        if price.verified {
            info!(
                source = %format_money(parsed.amount, &parsed.indicator.to_string()),
                canonical = %format_money(price.amount, &self.canonical),
                "Converted budget"
            );
            Ok(price.amount)
        } else {
            Err(Some(format!(
                "I can't convert {} to {}; please give the budget in {} or a common currency like USD",
                parsed.indicator, self.canonical, self.canonical
            )))
        }
    }

    async fn on_suggesting(&self, session: &mut ConversationSession, text: &str) -> String {
        if is_negative(text) && !is_uncertain(text) {
            return self.reopen_destination(session);
        }
        match self.suggester.suggest(text).await {
            Suggestion::Destination(destination) => {
                let reply = messages::offer_suggestion(&destination);
                session.state = IntakeState::SuggestionOffered { destination };
                reply
            }
            Suggestion::NoMatch => {
                session.reprompts += 1;
                messages::no_match().to_string()
            }
        }
    }

    async fn on_offered(&self, session: &mut ConversationSession, destination: &str, text: &str) -> String {
        if is_affirmative(text) {
            info!(%destination, "Suggested destination accepted");
            session.draft.destination = Some(destination.to_string());
            return self.advance(session);
        }
        if is_negative(text) {
            return self.reopen_destination(session);
        }
        // Anything else refines the preferences
        if text.split_whitespace().count() >= 2 {
            return self.on_suggesting(session, text).await;
        }
        messages::suggestion_unclear(destination)
    }

    fn reopen_destination(&self, session: &mut ConversationSession) -> String {
        session.reprompts = 0;
        session.state = IntakeState::Collecting {
            missing: session.draft.missing_fields(&self.config.field_order),
        };
        messages::suggestion_declined(&self.canonical)
    }

    fn on_confirming(&self, session: &mut ConversationSession, text: &str) -> String {
        if is_none_reply(text) || is_affirmative(text) {
            return self.complete(session);
        }

        if has_edit_intent(text)
            && let Some(field) = mentioned_field(text)
        {
            if field == RequestField::Notes {
                session.draft.clear(RequestField::Notes);
                return messages::summary(&session.draft, &self.canonical);
            }
            info!(%field, "Re-opening field");
            session.draft.clear(field);
            session.reprompts = 0;
            session.state = IntakeState::Collecting {
                missing: session.draft.missing_fields(&self.config.field_order),
            };
            return messages::reopened(field, &self.canonical);
        }
        if is_bare_negative(text) {
            return messages::which_field().to_string();
        }

        debug!("IntakeMachine::on_confirming: storing notes");
        session.draft.notes = Some(text.trim().to_string());
        messages::summary(&session.draft, &self.canonical)
    }

    fn complete(&self, session: &mut ConversationSession) -> String {
        match session.draft.freeze(&self.canonical) {
            Some(request) => {
                info!(session_id = %session.id, destination = %request.destination, "Trip request complete");
                let reply = messages::confirmed(&request.destination);
                session.request = Some(request);
                session.state = IntakeState::Complete;
                reply
            }
            // A field went missing under us; ask for it
            None => self.advance(session),
        }
    }

    /// Move to the next missing field, or to confirmation when none remain
    fn advance(&self, session: &mut ConversationSession) -> String {
        session.reprompts = 0;
        let missing = session.draft.missing_fields(&self.config.field_order);
        match missing.first().copied() {
            Some(next) => {
                session.state = IntakeState::Collecting { missing };
                messages::prompt_for(next, &self.canonical)
            }
            None => {
                session.state = IntakeState::Confirming;
                messages::summary(&session.draft, &self.canonical)
            }
        }
    }

    fn reprompt(&self, session: &mut ConversationSession, field: RequestField, reason: Option<&str>) -> String {
        session.reprompts += 1;
        let escalate = session.reprompts >= self.config.max_reprompts;
        debug!(%field, reprompts = session.reprompts, escalate, "IntakeMachine::reprompt: called");
        messages::reprompt(field, &self.canonical, reason, escalate)
    }
}
