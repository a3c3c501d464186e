//! Field parsers and reply classifiers for the intake dialogue
//!
//! Every parser returns None for input it cannot use; the state machine
//! turns that into a re-prompt.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::domain::{MAX_TRIP_DAYS, RequestField, TravelStyle};

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid iso date regex"));

static DMY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").expect("valid dmy date regex"));

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid integer regex"));

const MAX_PLACE_LEN: usize = 100;

/// Lead-ins stripped from destination and departure replies, longest first
const PLACE_LEAD_INS: &[&str] = &[
    "i would like to go to",
    "i'd like to go to",
    "we would like to go to",
    "we'd like to go to",
    "i want to travel to",
    "we want to travel to",
    "i want to go to",
    "we want to go to",
    "i am leaving from",
    "we are leaving from",
    "departing from",
    "leaving from",
    "flying from",
    "i want to visit",
    "we want to visit",
    "i live in",
    "we live in",
    "i'm in",
    "i am in",
    "we are in",
    "going to",
    "travel to",
    "go to",
    "visit",
    "from",
    "to",
];

const UNCERTAIN_PHRASES: &[&str] = &[
    "suggest",
    "not sure",
    "unsure",
    "don't know",
    "dont know",
    "do not know",
    "no idea",
    "no clue",
    "recommend",
    "anywhere",
    "help me choose",
    "help me decide",
    "surprise me",
    "undecided",
    "any ideas",
];

const AFFIRMATIVE_WORDS: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "confirm", "confirmed", "right", "perfect",
    "great", "absolutely", "definitely",
];

const AFFIRMATIVE_PHRASES: &[&str] = &[
    "looks good",
    "sounds good",
    "go ahead",
    "that's right",
    "thats right",
    "all good",
    "let's go",
    "lets go",
];

const NEGATIVE_WORDS: &[&str] = &["no", "n", "nope", "nah", "not", "wrong", "incorrect"];

/// Words that may pad a bare "no" without adding content
const NEGATIVE_FILLER: &[&str] = &[
    "that's", "thats", "it's", "its", "is", "isn't", "quite", "right", "correct", "please", "sorry", "thanks",
];

const NONE_REPLIES: &[&str] = &[
    "none",
    "nothing",
    "skip",
    "n/a",
    "na",
    "no notes",
    "no note",
    "no thanks",
    "no thank you",
    "nothing else",
    "no special requests",
    "no requests",
    "that's all",
    "thats all",
];

const EDIT_WORDS: &[&str] = &[
    "change", "edit", "update", "fix", "modify", "correct", "wrong", "actually", "instead", "switch", "redo",
];

/// Phrases naming a request field; checked in order, so specific phrases come first
const FIELD_PHRASES: &[(&str, RequestField)] = &[
    ("departure point", RequestField::DeparturePoint),
    ("starting point", RequestField::DeparturePoint),
    ("origin", RequestField::DeparturePoint),
    ("departure date", RequestField::DepartureDate),
    ("date", RequestField::DepartureDate),
    ("dates", RequestField::DepartureDate),
    ("when", RequestField::DepartureDate),
    ("destination", RequestField::Destination),
    ("where", RequestField::Destination),
    ("duration", RequestField::TripDuration),
    ("how long", RequestField::TripDuration),
    ("days", RequestField::TripDuration),
    ("nights", RequestField::TripDuration),
    ("length", RequestField::TripDuration),
    ("travelers", RequestField::NumTravelers),
    ("travellers", RequestField::NumTravelers),
    ("people", RequestField::NumTravelers),
    ("persons", RequestField::NumTravelers),
    ("guests", RequestField::NumTravelers),
    ("group size", RequestField::NumTravelers),
    ("budget", RequestField::Budget),
    ("money", RequestField::Budget),
    ("style", RequestField::TravelStyle),
    ("tour", RequestField::TravelStyle),
    ("departure", RequestField::DeparturePoint),
    ("from", RequestField::DeparturePoint),
    ("notes", RequestField::Notes),
];

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

const SELF_GUIDED_WORDS: &[&str] = &[
    "self",
    "independent",
    "independently",
    "own",
    "diy",
    "backpack",
    "backpacking",
    "backpacker",
    "myself",
    "ourselves",
];

const SELF_GUIDED_PHRASES: &[&str] = &["no tour", "without a tour", "free and easy", "not a tour"];

const TOUR_WORDS: &[&str] = &[
    "tour",
    "tours",
    "guided",
    "guide",
    "group",
    "package",
    "agency",
    "organized",
    "organised",
];

/// Lowercased words, split on anything that is not a letter, digit or apostrophe
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '/'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `phrase` occurs in `text` on word boundaries
fn has_phrase(text: &str, phrase: &str) -> bool {
    let haystack = format!(" {} ", words(text).join(" "));
    let needle = format!(" {} ", words(phrase).join(" "));
    haystack.contains(&needle)
}

fn has_any_word(text: &str, list: &[&str]) -> bool {
    words(text).iter().any(|w| list.contains(&w.as_str()))
}

/// Destination or departure point from free text
pub fn parse_place(text: &str) -> Option<String> {
    debug!(%text, "parse_place: called");
    let mut place = text.trim();
    for lead_in in PLACE_LEAD_INS {
        let prefixed = place.get(..lead_in.len()).is_some_and(|p| p.eq_ignore_ascii_case(lead_in));
        if prefixed && place[lead_in.len()..].starts_with(char::is_whitespace) {
            place = &place[lead_in.len()..];
            break;
        }
    }
    let place = place
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ','))
        .trim();

    if place.is_empty() || place.chars().count() > MAX_PLACE_LEN {
        debug!("parse_place: empty or too long");
        return None;
    }
    if !place.chars().any(char::is_alphabetic) {
        debug!("parse_place: no letters");
        return None;
    }
    if is_uncertain(place) {
        debug!("parse_place: reads as uncertainty");
        return None;
    }
    if is_affirmative(place) || is_negative(place) || is_none_reply(place) {
        debug!("parse_place: reads as a yes/no reply");
        return None;
    }
    Some(place.to_string())
}

/// Date as YYYY-MM-DD, DD/MM/YYYY or DD-MM-YYYY
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    debug!(%text, "parse_date: called");
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?);
        if date.is_some() {
            return date;
        }
    }
    let caps = DMY_DATE_RE.captures(text)?;
    NaiveDate::from_ymd_opt(caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?)
}

/// First integer in the text, or a number word
fn first_number(text: &str) -> Option<u32> {
    if let Some(m) = INTEGER_RE.find(text) {
        return m.as_str().parse().ok();
    }
    words(text)
        .iter()
        .find_map(|w| NUMBER_WORDS.iter().find(|(word, _)| *word == w.as_str()).map(|(_, n)| *n))
}

/// Trip length in days (1..=365); "N weeks" counts seven days per week
pub fn parse_duration(text: &str) -> Option<u32> {
    debug!(%text, "parse_duration: called");
    let number = first_number(text);
    let weeks = words(text).iter().any(|w| w == "week" || w == "weeks");
    let days = match (number, weeks) {
        (Some(n), true) => n.checked_mul(7)?,
        (None, true) => 7,
        (Some(n), false) => n,
        (None, false) => return None,
    };
    (1..=MAX_TRIP_DAYS).contains(&days).then_some(days)
}

/// Number of travelers (1..=100)
pub fn parse_travelers(text: &str) -> Option<u32> {
    debug!(%text, "parse_travelers: called");
    if has_any_word(text, &["alone", "solo", "myself"]) || has_phrase(text, "just me") {
        return Some(1);
    }
    if has_phrase(text, "a couple") || has_phrase(text, "my partner and i") {
        return Some(2);
    }
    first_number(text).filter(|n| (1..=100).contains(n))
}

/// Travel style; self-guided terms win over tour terms
pub fn parse_style(text: &str) -> Option<TravelStyle> {
    debug!(%text, "parse_style: called");
    if has_any_word(text, SELF_GUIDED_WORDS) || SELF_GUIDED_PHRASES.iter().any(|p| has_phrase(text, p)) {
        return Some(TravelStyle::SelfGuided);
    }
    if has_any_word(text, TOUR_WORDS) {
        return Some(TravelStyle::Tour);
    }
    None
}

/// The user does not know where to go
pub fn is_uncertain(text: &str) -> bool {
    let lower = text.to_lowercase().replace('\u{2019}', "'");
    UNCERTAIN_PHRASES.iter().any(|p| lower.contains(p))
}

/// A short yes-style reply
pub fn is_affirmative(text: &str) -> bool {
    let words = words(text);
    if words.is_empty() || words.len() > 4 || words.iter().any(|w| NEGATIVE_WORDS.contains(&w.as_str())) {
        return false;
    }
    AFFIRMATIVE_WORDS.contains(&words[0].as_str()) || AFFIRMATIVE_PHRASES.iter().any(|p| has_phrase(text, p))
}

/// A short no-style reply
pub fn is_negative(text: &str) -> bool {
    words(text)
        .first()
        .is_some_and(|w| NEGATIVE_WORDS.contains(&w.as_str()))
}

/// A "no" with nothing else in it, such as "no" or "nope, that's not right"
pub fn is_bare_negative(text: &str) -> bool {
    let words = words(text);
    is_negative(text)
        && words
            .iter()
            .all(|w| NEGATIVE_WORDS.contains(&w.as_str()) || NEGATIVE_FILLER.contains(&w.as_str()))
}

/// "Nothing to add" reply to the notes question
pub fn is_none_reply(text: &str) -> bool {
    let normalized = words(text).join(" ");
    NONE_REPLIES.contains(&normalized.as_str())
}

/// The reply asks to change something
pub fn has_edit_intent(text: &str) -> bool {
    is_negative(text) || has_any_word(text, EDIT_WORDS)
}

/// The first request field the text names, if any
pub fn mentioned_field(text: &str) -> Option<RequestField> {
    FIELD_PHRASES
        .iter()
        .find(|(phrase, _)| has_phrase(text, phrase))
        .map(|(_, field)| *field)
}
