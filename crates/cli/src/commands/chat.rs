//! Interactive `chat` command.

use std::sync::Arc;

use async_trait::async_trait;
use marquee_agent::{
    AgentRuntime, ChatCompletionsClient, FieldPrompt, LlmIntentExtractor, Requester,
    RequesterError, SlotFillError,
};
use marquee_core::dispatch::Dispatcher;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use crate::commands::{
    build_runtime, load_config, open_inventory, CommandResult, EXIT_CONFIG, EXIT_RUNTIME,
};
use crate::render::render;

const BANNER: &str = "🎬 Movie Booking Assistant (type 'exit' to quit)";

pub fn run() -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let client = match ChatCompletionsClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                format!("configuration issue: {error}"),
                EXIT_CONFIG,
            );
        }
    };
    let runtime = match build_runtime("chat") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async {
        let inventory = match open_inventory("chat", &config).await {
            Ok(inventory) => inventory,
            Err(failure) => return failure,
        };
        let agent = AgentRuntime::new(
            Arc::new(LlmIntentExtractor::new(Arc::new(client))),
            Dispatcher::new(inventory, config.dispatch.retry_policy()),
        );
        let mut console = ConsoleRequester::stdio();

        match converse(&agent, &mut console).await {
            Ok(turns) => {
                info!(event_name = "chat.ended", turns);
                CommandResult { exit_code: 0, output: String::new() }
            }
            Err(error) => {
                CommandResult::failure("chat", "console_io", error.to_string(), EXIT_RUNTIME)
            }
        }
    })
}

/// Runs the conversation until `exit`, `quit`, or end of input. Returns the
/// number of utterances handled.
pub async fn converse<R, W>(
    agent: &AgentRuntime,
    console: &mut ConsoleRequester<R, W>,
) -> Result<usize, RequesterError>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    console.say(BANNER).await?;
    let mut turns = 0;

    loop {
        let Some(utterance) = console.ask("You: ").await? else {
            break;
        };
        if matches!(utterance.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }
        if utterance.is_empty() {
            continue;
        }
        turns += 1;

        let extracted = agent.extract(&utterance).await;
        let intent_label = extracted.intent.map(|intent| intent.as_str()).unwrap_or("None");
        console.say(&format!("✅ Detected intent: {intent_label}")).await?;
        console.say(&format!("✅ Params: {}", Value::Object(extracted.parameters.clone()))).await?;

        let Some(intent) = extracted.intent else {
            console.say("❌ No intent recognized.").await?;
            continue;
        };

        let request = match agent.complete(intent, extracted.parameters, console).await {
            Ok(request) => request,
            Err(SlotFillError::RequesterClosed { source: RequesterError::Closed, .. }) => break,
            Err(SlotFillError::RequesterClosed { source, .. }) => return Err(source),
        };
        console.say(&format!("➡ Dispatching {}", describe(&request))).await?;
        let result = agent.dispatch(&request).await;
        console.say("🤖 Result:").await?;
        console.say(&render(&result)).await?;

        if !AgentRuntime::offers_booking(&request, &result) {
            continue;
        }
        if !console.confirm(marquee_agent::BOOKING_FOLLOW_UP).await? {
            continue;
        }
        match agent.follow_up_booking(console).await {
            Ok((_, booking)) => {
                console.say("🤖 Booking Result:").await?;
                console.say(&render(&booking)).await?;
            }
            Err(SlotFillError::RequesterClosed { source: RequesterError::Closed, .. }) => break,
            Err(SlotFillError::RequesterClosed { source, .. }) => return Err(source),
        }
    }

    Ok(turns)
}

fn describe(request: &marquee_core::domain::intent::IntentRequest) -> String {
    serde_json::to_string(request).unwrap_or_else(|_| request.kind().to_string())
}

/// Line-oriented requester over an async reader and writer.
pub struct ConsoleRequester<R, W> {
    reader: R,
    writer: W,
}

impl ConsoleRequester<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleRequester<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    pub async fn say(&mut self, line: &str) -> Result<(), RequesterError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Writes `prompt` without a newline and reads one trimmed line.
    /// `None` means end of input.
    pub async fn ask(&mut self, prompt: &str) -> Result<Option<String>, RequesterError> {
        self.writer.write_all(prompt.as_bytes()).await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[async_trait]
impl<R, W> Requester for ConsoleRequester<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn prompt(&mut self, prompt: &FieldPrompt) -> Result<String, RequesterError> {
        self.ask(&prompt.text).await?.ok_or(RequesterError::Closed)
    }

    async fn notify(&mut self, message: &str) -> Result<(), RequesterError> {
        self.say(message).await
    }

    async fn confirm(&mut self, question: &str) -> Result<bool, RequesterError> {
        let answer = self.ask(question).await?.ok_or(RequesterError::Closed)?;
        Ok(answer.eq_ignore_ascii_case("yes"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use marquee_agent::{AgentRuntime, IntentExtractor};
    use marquee_core::dispatch::{Dispatcher, RetryPolicy};
    use marquee_core::domain::intent::ExtractedIntent;
    use marquee_core::store::Inventory;
    use marquee_db::{DemoDataset, InMemoryInventoryStore};
    use serde_json::json;
    use tokio::io::BufReader;

    use super::{converse, ConsoleRequester};

    /// Recognizes a handful of fixed phrases.
    struct PhraseExtractor;

    #[async_trait]
    impl IntentExtractor for PhraseExtractor {
        async fn extract(&self, utterance: &str) -> ExtractedIntent {
            let value = match utterance {
                "movies in mumbai" => {
                    json!({"intent": "list_movies", "parameters": {"location": "Mumbai"}})
                }
                "inception times" => json!({"intent": "get_showtimes", "parameters": {"movie_name": "Inception"}}),
                "dune times" => json!({
                    "intent": "get_showtimes",
                    "parameters": {"movie_name": "Dune", "location": "Delhi"}
                }),
                "book" => json!({"intent": "book_ticket", "parameters": {}}),
                _ => json!({"intent": null, "parameters": {}}),
            };
            ExtractedIntent::from_value(&value)
        }
    }

    fn agent() -> AgentRuntime {
        let inventory = Inventory::shared(InMemoryInventoryStore::new(DemoDataset::movies()));
        AgentRuntime::new(
            Arc::new(PhraseExtractor),
            Dispatcher::new(inventory, RetryPolicy::new(3, Duration::from_millis(1))),
        )
    }

    async fn transcript(input: &str) -> (usize, String) {
        let mut console = ConsoleRequester::new(BufReader::new(input.as_bytes()), Vec::new());
        let turns = converse(&agent(), &mut console).await.expect("conversation");
        (turns, String::from_utf8(console.into_writer()).expect("utf-8 transcript"))
    }

    #[tokio::test]
    async fn exit_ends_the_conversation() {
        let (turns, output) = transcript("exit\nmovies in mumbai\n").await;

        assert_eq!(turns, 0);
        assert!(output.starts_with("🎬 Movie Booking Assistant"));
        assert!(!output.contains("Detected intent"));
    }

    #[tokio::test]
    async fn listing_is_rendered_after_detection() {
        let (turns, output) = transcript("movies in mumbai\nquit\n").await;

        assert_eq!(turns, 1);
        assert!(output.contains("✅ Detected intent: list_movies"));
        assert!(output.contains("- Interstellar (Sci-Fi) [M3] in Mumbai"));
    }

    #[tokio::test]
    async fn unrecognized_input_is_reported() {
        let (_, output) = transcript("what's up\n").await;

        assert!(output.contains("✅ Detected intent: None"));
        assert!(output.contains("❌ No intent recognized."));
    }

    #[tokio::test]
    async fn showtimes_prompt_for_city_then_offer_booking() {
        let input = "inception times\nDelhi\nyes\nS2\nlots\n2\n";
        let (_, output) = transcript(input).await;

        assert!(output.contains("Please provide the city (e.g., Delhi/Mumbai/Bengaluru): "));
        assert!(output.contains("- [S2] 07:30 PM @ INOX Nehru Place  — seats 2/60"));
        assert!(output.contains("Would you like to book tickets"));
        assert!(output.contains("Enter show_id to book: "));
        assert!(output.contains("Please enter a valid number."));
        assert!(output.contains("🤖 Booking Result:\n✅ 2 seats booked for show S2 (0 seats left)"));
    }

    #[tokio::test]
    async fn empty_booking_prompts_show_then_seats_before_dispatch() {
        let (turns, output) = transcript("book\nS1\n2\nexit\n").await;

        assert_eq!(turns, 1);
        let show_prompt = output.find("Enter show_id to book: ").expect("show_id prompt");
        let seats_prompt = output.find("How many seats?: ").expect("seats prompt");
        let dispatched = output.find("➡ Dispatching").expect("dispatch line");
        assert!(show_prompt < seats_prompt && seats_prompt < dispatched);
        assert!(output.contains("✅ 2 seats booked for show S1 (38 seats left)"));
    }

    #[tokio::test]
    async fn declined_follow_up_returns_to_the_prompt() {
        let (turns, output) = transcript("inception times\nDelhi\nno\nmovies in mumbai\n").await;

        assert_eq!(turns, 2);
        assert!(output.contains("Would you like to book tickets"));
        assert!(!output.contains("Enter show_id to book: "));
        assert!(!output.contains("🤖 Booking Result:"));
        assert!(output.contains("- Interstellar (Sci-Fi) [M3] in Mumbai"));
    }

    #[tokio::test]
    async fn missing_showtimes_do_not_offer_a_booking() {
        let (_, output) = transcript("dune times\n").await;

        assert!(output.contains("❌ no showtimes found"));
        assert!(!output.contains("Would you like to book tickets"));
    }

    #[tokio::test]
    async fn end_of_input_while_slot_filling_ends_quietly() {
        let (turns, output) = transcript("book\nS1\n").await;

        assert_eq!(turns, 1);
        assert!(output.ends_with("How many seats?: "));
    }
}
