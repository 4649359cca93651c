//! Conversational front half of the booking assistant.
//!
//! The agent turns a free-form utterance into a dispatchable request:
//! 1. **Extraction** (`extraction`) - an LLM maps text to `{intent, parameters}`.
//! 2. **Slot filling** (`slot_filling`) - missing required fields are asked
//!    for through a `Requester`, one at a time.
//! 3. **Dispatch** (`runtime`) - the completed request goes to the core
//!    `Dispatcher`, and a showtime lookup can roll into a booking.
//!
//! The LLM only translates. Seat counts and availability are decided by
//! the core services.

pub mod extraction;
pub mod llm;
pub mod runtime;
pub mod slot_filling;

pub use extraction::{IntentExtractor, LlmIntentExtractor, INTENT_PROMPT};
pub use llm::{ChatCompletionsClient, LlmClient};
pub use runtime::{AgentRuntime, BOOKING_FOLLOW_UP};
pub use slot_filling::{
    FieldPrompt, Requester, RequesterError, ScriptedRequester, SlotFillError,
    SlotFillingController, INVALID_NUMBER,
};
