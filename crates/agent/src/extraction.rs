use std::sync::Arc;

use async_trait::async_trait;
use marquee_core::domain::intent::ExtractedIntent;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::LlmClient;

pub const INTENT_PROMPT: &str = r#"
You are an intent & parameter extractor for a movie booking system.
Valid intents and mandatory parameters:
- list_movies: { "location": string }
- get_showtimes: { "movie_name": string, "location": string }
- book_ticket: { "show_id": string, "seats": number, "user_id"?: string }

Return STRICT JSON ONLY like:
{"intent": "list_movies", "parameters": {"location": "Delhi"}}
"#;

/// Maps an utterance to an intent. Never fails: anything unusable comes back
/// as [`ExtractedIntent::unrecognized`].
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, utterance: &str) -> ExtractedIntent;
}

pub struct LlmIntentExtractor {
    client: Arc<dyn LlmClient>,
}

impl LlmIntentExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntentExtractor for LlmIntentExtractor {
    async fn extract(&self, utterance: &str) -> ExtractedIntent {
        let content = match self.client.complete(INTENT_PROMPT, utterance).await {
            Ok(content) => content,
            Err(error) => {
                warn!(event_name = "extraction.llm_failed", error = %error, "intent extraction unavailable");
                return ExtractedIntent::unrecognized();
            }
        };

        let extracted = parse_extraction(&content);
        info!(
            event_name = "extraction.completed",
            intent = extracted.intent.map(|intent| intent.as_str()).unwrap_or("none"),
            parameters = extracted.parameters.len(),
        );
        extracted
    }
}

/// Parses model output, tolerating a surrounding Markdown code fence.
pub fn parse_extraction(content: &str) -> ExtractedIntent {
    match serde_json::from_str::<Value>(strip_code_fences(content)) {
        Ok(value) => ExtractedIntent::from_value(&value),
        Err(error) => {
            warn!(event_name = "extraction.non_json", error = %error, content, "llm returned non-JSON");
            ExtractedIntent::unrecognized()
        }
    }
}

/// Removes a leading ```` ``` ```` (with optional language tag) and a
/// trailing ```` ``` ````.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = body.trim_start_matches(|ch: char| ch.is_alphanumeric() || ch == '_');
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}
