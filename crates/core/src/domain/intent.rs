use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::showtime::ShowId;

/// Loose field name → value mapping as produced by the extractor.
pub type ParameterMap = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    ListMovies,
    GetShowtimes,
    BookTicket,
}

impl IntentKind {
    pub const ALL: [IntentKind; 3] = [Self::ListMovies, Self::GetShowtimes, Self::BookTicket];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListMovies => "list_movies",
            Self::GetShowtimes => "get_showtimes",
            Self::BookTicket => "book_ticket",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "list_movies" => Some(Self::ListMovies),
            "get_showtimes" => Some(Self::GetShowtimes),
            "book_ticket" => Some(Self::BookTicket),
            _ => None,
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort extractor output. `intent` is `None` for unparseable or
/// unrecognized requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedIntent {
    pub intent: Option<IntentKind>,
    pub parameters: ParameterMap,
}

impl ExtractedIntent {
    pub fn new(intent: IntentKind, parameters: ParameterMap) -> Self {
        Self { intent: Some(intent), parameters }
    }

    pub fn unrecognized() -> Self {
        Self::default()
    }

    /// Reads `{"intent": ..., "parameters": {...}}`. Anything that does not
    /// have that shape degrades to an unrecognized intent.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::unrecognized();
        };

        let intent = object.get("intent").and_then(Value::as_str).and_then(IntentKind::parse);
        let parameters = object.get("parameters").and_then(Value::as_object).cloned();

        Self { intent, parameters: parameters.unwrap_or_default() }
    }
}

/// A fully specified request, one variant per intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum IntentRequest {
    ListMovies { location: String },
    GetShowtimes { movie_name: String, location: String },
    BookTicket(BookingRequest),
}

impl IntentRequest {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::ListMovies { .. } => IntentKind::ListMovies,
            Self::GetShowtimes { .. } => IntentKind::GetShowtimes,
            Self::BookTicket(_) => IntentKind::BookTicket,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub show_id: ShowId,
    pub seats: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ExtractedIntent, IntentKind};

    #[test]
    fn extracted_intent_reads_well_formed_payload() {
        let extracted = ExtractedIntent::from_value(&json!({
            "intent": "list_movies",
            "parameters": {"location": "Delhi"}
        }));

        assert_eq!(extracted.intent, Some(IntentKind::ListMovies));
        assert_eq!(extracted.parameters.get("location"), Some(&json!("Delhi")));
    }

    #[test]
    fn unknown_intent_name_degrades_to_none() {
        let extracted = ExtractedIntent::from_value(&json!({
            "intent": "cancel_ticket",
            "parameters": {"show_id": "S1"}
        }));

        assert_eq!(extracted.intent, None);
    }

    #[test]
    fn non_object_payload_degrades_to_unrecognized() {
        assert_eq!(ExtractedIntent::from_value(&json!(["list_movies"])), ExtractedIntent::default());
        assert_eq!(
            ExtractedIntent::from_value(&json!({"intent": null, "parameters": null})),
            ExtractedIntent::default()
        );
    }

    #[test]
    fn intent_names_round_trip_through_parse() {
        for kind in IntentKind::ALL {
            assert_eq!(IntentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(IntentKind::parse(" Book_Ticket "), Some(IntentKind::BookTicket));
    }
}
