//! Interactive completion of required parameters.

use std::collections::VecDeque;

use async_trait::async_trait;
use marquee_core::domain::intent::{IntentKind, IntentRequest, ParameterMap};
use marquee_core::errors::DomainError;
use marquee_core::validation::{coerce_seats, find_missing};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const INVALID_NUMBER: &str = "Please enter a valid number.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPrompt {
    pub intent: IntentKind,
    pub field: &'static str,
    pub text: String,
}

impl FieldPrompt {
    pub fn for_field(intent: IntentKind, field: &'static str) -> Self {
        let text = match field {
            "location" => "Please provide the city (e.g., Delhi/Mumbai/Bengaluru): ".to_string(),
            "movie_name" => "Which movie?: ".to_string(),
            "show_id" => "Enter show_id to book: ".to_string(),
            "seats" => "How many seats?: ".to_string(),
            other => format!("Provide {other}: "),
        };
        Self { intent, field, text }
    }
}

#[derive(Debug, Error)]
pub enum RequesterError {
    #[error("input closed")]
    Closed,
    #[error("requester i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of answers for missing fields: a console, a chat thread, or a
/// script in tests.
#[async_trait]
pub trait Requester: Send {
    async fn prompt(&mut self, prompt: &FieldPrompt) -> Result<String, RequesterError>;

    async fn notify(&mut self, message: &str) -> Result<(), RequesterError>;

    /// Yes/no question. Only an answer of `yes` (any case) counts as yes.
    async fn confirm(&mut self, question: &str) -> Result<bool, RequesterError>;
}

#[derive(Debug, Error)]
pub enum SlotFillError {
    #[error("requester closed while asking for `{field}`: {source}")]
    RequesterClosed {
        field: &'static str,
        #[source]
        source: RequesterError,
    },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SlotFillingController;

impl SlotFillingController {
    pub fn new() -> Self {
        Self
    }

    /// Asks for missing fields in table order until none remain. `seats`
    /// answers that are not whole numbers are reported and asked again.
    pub async fn fill(
        &self,
        intent: IntentKind,
        mut parameters: ParameterMap,
        requester: &mut dyn Requester,
    ) -> Result<ParameterMap, SlotFillError> {
        loop {
            let Some(field) = find_missing(intent, &parameters).first().copied() else {
                return Ok(parameters);
            };

            let prompt = FieldPrompt::for_field(intent, field);
            let answer = requester
                .prompt(&prompt)
                .await
                .map_err(|source| SlotFillError::RequesterClosed { field, source })?;
            let answer = answer.trim().to_string();

            let value = if field == "seats" {
                match coerce_seats(&Value::String(answer)) {
                    Ok(seats) => Value::from(seats),
                    Err(_) => {
                        requester
                            .notify(INVALID_NUMBER)
                            .await
                            .map_err(|source| SlotFillError::RequesterClosed { field, source })?;
                        continue;
                    }
                }
            } else {
                Value::String(answer)
            };

            debug!(event_name = "slot_filling.field_filled", intent = intent.as_str(), field);
            parameters.insert(field.to_string(), value);
        }
    }

    /// Fills the map and converts it into a typed request. A present but
    /// ill-typed field (say `seats: "two"` from the extractor) is reported,
    /// cleared, and asked for again.
    pub async fn complete(
        &self,
        intent: IntentKind,
        mut parameters: ParameterMap,
        requester: &mut dyn Requester,
    ) -> Result<IntentRequest, SlotFillError> {
        loop {
            parameters = self.fill(intent, parameters, requester).await?;

            match IntentRequest::from_parameters(intent, &parameters) {
                Ok(request) => return Ok(request),
                Err(DomainError::InvalidParameter { field, reason }) => {
                    let message = if field == "seats" {
                        INVALID_NUMBER.to_string()
                    } else {
                        format!("Invalid {field}: {reason}")
                    };
                    requester
                        .notify(&message)
                        .await
                        .map_err(|source| SlotFillError::RequesterClosed { field, source })?;
                    parameters.remove(field);
                }
                // `fill` only returns once nothing is missing.
                Err(_) => continue,
            }
        }
    }
}

/// Replays canned answers in order and records what it was asked.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRequester {
    answers: VecDeque<String>,
    prompts: Vec<FieldPrompt>,
    notices: Vec<String>,
}

impl ScriptedRequester {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { answers: answers.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    pub fn prompts(&self) -> &[FieldPrompt] {
        &self.prompts
    }

    pub fn asked_fields(&self) -> Vec<&'static str> {
        self.prompts.iter().map(|prompt| prompt.field).collect()
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

#[async_trait]
impl Requester for ScriptedRequester {
    async fn prompt(&mut self, prompt: &FieldPrompt) -> Result<String, RequesterError> {
        self.prompts.push(prompt.clone());
        self.answers.pop_front().ok_or(RequesterError::Closed)
    }

    async fn notify(&mut self, message: &str) -> Result<(), RequesterError> {
        self.notices.push(message.to_string());
        Ok(())
    }

    async fn confirm(&mut self, question: &str) -> Result<bool, RequesterError> {
        self.notices.push(question.to_string());
        let answer = self.answers.pop_front().ok_or(RequesterError::Closed)?;
        Ok(answer.trim().eq_ignore_ascii_case("yes"))
    }
}
