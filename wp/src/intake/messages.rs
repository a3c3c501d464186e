//! Assistant replies of the intake dialogue

use crate::currency::format_money;
use crate::domain::{RequestDraft, RequestField};

pub fn greeting() -> &'static str {
    "Hi! I'll help you plan your trip. I just need a few details first."
}

/// The question asking for a field
pub fn prompt_for(field: RequestField, canonical: &str) -> String {
    match field {
        RequestField::Destination => {
            "Where would you like to go? If you're not sure yet, just say so and I can suggest a destination."
                .to_string()
        }
        RequestField::DeparturePoint => "Where will you be departing from?".to_string(),
        RequestField::DepartureDate => "What date would you like to leave?".to_string(),
        RequestField::TripDuration => "How many days will the trip last?".to_string(),
        RequestField::NumTravelers => "How many people are traveling?".to_string(),
        RequestField::Budget => format!(
            "What is your total budget for the trip? Amounts without a currency are read as {}.",
            canonical
        ),
        RequestField::TravelStyle => "Would you rather travel self-guided, or join a tour?".to_string(),
        RequestField::Notes => "Any special requests or notes for the trip?".to_string(),
    }
}

/// An example of a reply the parser accepts
pub fn example_for(field: RequestField, canonical: &str) -> String {
    match field {
        RequestField::Destination => "Da Lat".to_string(),
        RequestField::DeparturePoint => "Hanoi".to_string(),
        RequestField::DepartureDate => "2026-12-25 or 25/12/2026".to_string(),
        RequestField::TripDuration => "5, or 1 week".to_string(),
        RequestField::NumTravelers => "2".to_string(),
        RequestField::Budget => format!("20000000 (in {}) or 1000 USD", canonical),
        RequestField::TravelStyle => "self-guided or tour".to_string(),
        RequestField::Notes => "vegetarian meals, no early flights".to_string(),
    }
}

/// Re-prompt after an unusable reply
///
/// `escalate` adds an explicit example; on the destination it also offers
/// suggestions.
pub fn reprompt(field: RequestField, canonical: &str, reason: Option<&str>, escalate: bool) -> String {
    let mut text = match reason {
        Some(reason) => format!("Sorry, {}. ", reason),
        None => format!("Sorry, I couldn't understand that as the {}. ", field.label()),
    };
    text.push_str(&prompt_for(field, canonical));
    if escalate {
        text.push_str(&format!(" For example: {}.", example_for(field, canonical)));
        if field == RequestField::Destination {
            text.push_str(" Or say \"suggest\" and I'll recommend somewhere.");
        }
    }
    text
}

pub fn ask_preferences() -> &'static str {
    "No problem! Tell me what you're looking for: scenery, climate, activities, budget level."
}

pub fn offer_suggestion(destination: &str) -> String {
    format!("How about {}? Shall I plan the trip there? (yes/no)", destination)
}

pub fn no_match() -> &'static str {
    "I couldn't find a destination matching that. Could you describe it differently, or name a place you have in mind?"
}

pub fn suggestion_declined(canonical: &str) -> String {
    format!("Okay. {}", prompt_for(RequestField::Destination, canonical))
}

pub fn suggestion_unclear(destination: &str) -> String {
    format!("Should I go with {}? Please answer yes or no.", destination)
}

/// Summary of a complete draft with the confirmation and notes question
pub fn summary(draft: &RequestDraft, canonical: &str) -> String {
    let value = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        "Here is your trip request:".to_string(),
        format!("  Destination:     {}", value(draft.destination.clone())),
        format!("  Departing from:  {}", value(draft.departure_point.clone())),
        format!("  Departure date:  {}", value(draft.departure_date.map(|d| d.to_string()))),
        format!(
            "  Duration:        {}",
            value(draft.trip_duration.map(|d| format!("{} day(s)", d)))
        ),
        format!("  Travelers:       {}", value(draft.num_travelers.map(|n| n.to_string()))),
        format!(
            "  Budget:          {}",
            value(draft.budget.map(|b| format_money(b, canonical)))
        ),
        format!("  Travel style:    {}", value(draft.travel_style.map(|s| s.to_string()))),
    ];
    if let Some(notes) = draft.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("  Notes:           {}", notes));
    }
    lines.push(String::new());
    lines.push(
        "Reply \"yes\" to confirm, tell me what to change (e.g. \"change the budget\"), \
         or add any special requests as notes."
            .to_string(),
    );
    lines.join("\n")
}

pub fn which_field() -> &'static str {
    "Which detail should I change? For example: \"change the departure date\"."
}

pub fn reopened(field: RequestField, canonical: &str) -> String {
    format!("Sure, let's update the {}. {}", field.label(), prompt_for(field, canonical))
}

pub fn confirmed(destination: &str) -> String {
    format!("Great, your trip to {} is confirmed. I'll start planning!", destination)
}

pub fn already_complete() -> &'static str {
    "Your trip request is already confirmed and can no longer be changed. Reset the conversation to start a new one."
}
