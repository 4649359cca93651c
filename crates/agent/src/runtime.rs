use std::sync::Arc;

use marquee_core::dispatch::{DispatchResult, Dispatcher};
use marquee_core::domain::intent::{ExtractedIntent, IntentKind, IntentRequest, ParameterMap};
use serde_json::Value;
use tracing::info;

use crate::extraction::IntentExtractor;
use crate::slot_filling::{Requester, SlotFillError, SlotFillingController};

pub const BOOKING_FOLLOW_UP: &str =
    "🎟️ Would you like to book tickets for one of these shows? (yes/no): ";

pub struct AgentRuntime {
    extractor: Arc<dyn IntentExtractor>,
    slot_filler: SlotFillingController,
    dispatcher: Dispatcher,
}

impl AgentRuntime {
    pub fn new(extractor: Arc<dyn IntentExtractor>, dispatcher: Dispatcher) -> Self {
        Self { extractor, slot_filler: SlotFillingController::new(), dispatcher }
    }

    pub async fn extract(&self, utterance: &str) -> ExtractedIntent {
        self.extractor.extract(utterance).await
    }

    pub async fn complete(
        &self,
        intent: IntentKind,
        parameters: ParameterMap,
        requester: &mut dyn Requester,
    ) -> Result<IntentRequest, SlotFillError> {
        self.slot_filler.complete(intent, parameters, requester).await
    }

    pub async fn dispatch(&self, request: &IntentRequest) -> DispatchResult {
        let result = self.dispatcher.invoke(request).await;
        info!(
            event_name = "agent.dispatched",
            intent = request.kind().as_str(),
            offers_booking = Self::offers_booking(request, &result),
        );
        result
    }

    /// A successful showtime listing can roll straight into a booking.
    pub fn offers_booking(request: &IntentRequest, result: &DispatchResult) -> bool {
        matches!(request, IntentRequest::GetShowtimes { .. })
            && matches!(result, DispatchResult::Showtimes(_))
    }

    /// Slot-fills a fresh booking (empty `show_id` and `seats`) and dispatches it.
    pub async fn follow_up_booking(
        &self,
        requester: &mut dyn Requester,
    ) -> Result<(IntentRequest, DispatchResult), SlotFillError> {
        let mut parameters = ParameterMap::new();
        parameters.insert("show_id".to_string(), Value::String(String::new()));
        parameters.insert("seats".to_string(), Value::String(String::new()));

        let request = self.complete(IntentKind::BookTicket, parameters, requester).await?;
        let result = self.dispatch(&request).await;
        Ok((request, result))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use marquee_core::dispatch::{DispatchResult, Dispatcher, RetryPolicy};
    use marquee_core::domain::intent::{ExtractedIntent, IntentRequest};
    use marquee_core::domain::movie::{Movie, MovieId};
    use marquee_core::domain::showtime::{SeatCount, ShowId, Showtime};
    use marquee_core::store::{Inventory, InventoryStore, StoreError};
    use serde_json::{json, Value};

    use super::AgentRuntime;
    use crate::extraction::IntentExtractor;
    use crate::slot_filling::{ScriptedRequester, SlotFillError};

    struct FixedExtractor(Value);

    #[async_trait]
    impl IntentExtractor for FixedExtractor {
        async fn extract(&self, _utterance: &str) -> ExtractedIntent {
            ExtractedIntent::from_value(&self.0)
        }
    }

    #[derive(Default)]
    struct VecStore(Mutex<Vec<Movie>>);

    #[async_trait]
    impl InventoryStore for VecStore {
        async fn load_all(&self) -> Result<Vec<Movie>, StoreError> {
            Ok(self.0.lock().expect("store lock").clone())
        }

        async fn commit(&self, movies: &[Movie]) -> Result<(), StoreError> {
            *self.0.lock().expect("store lock") = movies.to_vec();
            Ok(())
        }
    }

    fn runtime(extraction: Value) -> AgentRuntime {
        let store = VecStore(Mutex::new(vec![Movie {
            movie_id: MovieId("M1".to_string()),
            name: "Inception".to_string(),
            genre: "Sci-Fi".to_string(),
            location: "Delhi".to_string(),
            showtimes: vec![Showtime {
                show_id: ShowId("S1".to_string()),
                time: "18:30".to_string(),
                theatre_name: "PVR Select City".to_string(),
                seats: SeatCount::new(2, 10),
            }],
        }]));
        let dispatcher = Dispatcher::new(
            Inventory::shared(store),
            RetryPolicy::new(3, Duration::from_millis(1)),
        );
        AgentRuntime::new(Arc::new(FixedExtractor(extraction)), dispatcher)
    }

    #[tokio::test]
    async fn empty_booking_intent_prompts_show_then_seats_before_dispatch() {
        let runtime = runtime(json!({"intent": "book_ticket", "parameters": {}}));
        let mut requester = ScriptedRequester::new(["S1", "2"]);

        let extracted = runtime.extract("book tickets").await;
        let intent = extracted.intent.expect("recognized intent");
        let request =
            runtime.complete(intent, extracted.parameters, &mut requester).await.expect("filled");

        assert_eq!(requester.asked_fields(), vec!["show_id", "seats"]);
        let result = serde_json::to_value(runtime.dispatch(&request).await).expect("serialize");
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["remaining"], json!(0));
    }

    #[tokio::test]
    async fn unparseable_extraction_is_unrecognized() {
        let runtime = runtime(json!("not an object"));

        let extracted = runtime.extract("hello").await;

        assert_eq!(extracted.intent, None);
        assert!(extracted.parameters.is_empty());
    }

    #[tokio::test]
    async fn only_found_showtimes_offer_a_booking() {
        let runtime = runtime(json!({}));
        let lookup = |movie_name: &str| IntentRequest::GetShowtimes {
            movie_name: movie_name.to_string(),
            location: "delhi".to_string(),
        };

        let found = lookup("INCEPTION");
        assert!(AgentRuntime::offers_booking(&found, &runtime.dispatch(&found).await));

        let missing = lookup("Dune");
        let result = runtime.dispatch(&missing).await;
        assert_eq!(result, DispatchResult::rejected("no showtimes found"));
        assert!(!AgentRuntime::offers_booking(&missing, &result));

        let listing = IntentRequest::ListMovies { location: "Delhi".to_string() };
        assert!(!AgentRuntime::offers_booking(&listing, &runtime.dispatch(&listing).await));
    }

    #[tokio::test]
    async fn follow_up_booking_asks_for_show_and_seats() {
        let runtime = runtime(json!({}));
        let mut requester = ScriptedRequester::new(["s1", "1"]);

        let (request, result) = runtime.follow_up_booking(&mut requester).await.expect("booking");

        assert_eq!(requester.asked_fields(), vec!["show_id", "seats"]);
        assert!(matches!(request, IntentRequest::BookTicket(_)));
        let booked = serde_json::to_value(&result).expect("serialize");
        assert_eq!(booked["remaining"], json!(1));
    }

    #[tokio::test]
    async fn closed_requester_aborts_follow_up() {
        let runtime = runtime(json!({}));
        let mut requester = ScriptedRequester::new(["S1"]);

        let error = runtime.follow_up_booking(&mut requester).await.expect_err("closed");

        assert!(matches!(error, SlotFillError::RequesterClosed { field: "seats", .. }));
    }
}
