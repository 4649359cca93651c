//! Required-field table and boundary conversion from loose parameters into
//! a typed [`IntentRequest`].

use serde_json::Value;

use crate::domain::intent::{BookingRequest, IntentKind, IntentRequest, ParameterMap};
use crate::domain::showtime::ShowId;
use crate::errors::DomainError;

pub fn required_fields(intent: IntentKind) -> &'static [&'static str] {
    match intent {
        IntentKind::ListMovies => &["location"],
        IntentKind::GetShowtimes => &["movie_name", "location"],
        IntentKind::BookTicket => &["show_id", "seats"],
    }
}

/// Required fields of `intent` that are absent or empty, in table order.
pub fn find_missing(intent: IntentKind, parameters: &ParameterMap) -> Vec<&'static str> {
    required_fields(intent)
        .iter()
        .copied()
        .filter(|field| is_missing(parameters.get(*field)))
        .collect()
}

pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Coerces raw `seats` input to an integer. Accepts JSON integers and
/// integer strings.
pub fn coerce_seats(value: &Value) -> Result<i64, DomainError> {
    let invalid = || DomainError::InvalidParameter {
        field: "seats",
        reason: format!("expected a whole number, got {value}"),
    };

    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(invalid),
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

impl IntentRequest {
    /// Builds a typed request once every required field is present.
    pub fn from_parameters(
        intent: IntentKind,
        parameters: &ParameterMap,
    ) -> Result<Self, DomainError> {
        let missing = find_missing(intent, parameters);
        if !missing.is_empty() {
            return Err(DomainError::MissingParameters(missing));
        }

        let request = match intent {
            IntentKind::ListMovies => {
                Self::ListMovies { location: text_field(parameters, "location")? }
            }
            IntentKind::GetShowtimes => Self::GetShowtimes {
                movie_name: text_field(parameters, "movie_name")?,
                location: text_field(parameters, "location")?,
            },
            IntentKind::BookTicket => Self::BookTicket(BookingRequest {
                show_id: ShowId(text_field(parameters, "show_id")?),
                seats: parameters.get("seats").map(coerce_seats).transpose()?.unwrap_or_default(),
                user_id: optional_text_field(parameters, "user_id"),
            }),
        };

        Ok(request)
    }
}

fn text_field(parameters: &ParameterMap, field: &'static str) -> Result<String, DomainError> {
    match parameters.get(field) {
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(other) => Err(DomainError::InvalidParameter {
            field,
            reason: format!("expected text, got {other}"),
        }),
        None => Err(DomainError::MissingParameters(vec![field])),
    }
}

fn optional_text_field(parameters: &ParameterMap, field: &str) -> Option<String> {
    match parameters.get(field) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}
