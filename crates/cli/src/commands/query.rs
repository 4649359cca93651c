//! One-shot `movies`, `showtimes`, and `book` commands.

use marquee_core::dispatch::{DispatchResult, Dispatcher};
use marquee_core::domain::intent::IntentRequest;

use crate::commands::{
    build_runtime, load_config, open_inventory, CommandResult, EXIT_REJECTED, EXIT_STORE,
};
use crate::render::render;

/// Dispatches `request` against the configured store. Prints the dispatch
/// result as JSON, or rendered text with `text`.
pub fn run(command: &str, request: IntentRequest, text: bool) -> CommandResult {
    let config = match load_config(command) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime(command) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let outcome = runtime.block_on(async {
        let inventory = open_inventory(command, &config).await?;
        let dispatcher = Dispatcher::new(inventory, config.dispatch.retry_policy());
        Ok::<_, CommandResult>(dispatcher.invoke(&request).await)
    });

    match outcome {
        Ok(result) => present(command, &result, text),
        Err(failure) => failure,
    }
}

pub(crate) fn present(command: &str, result: &DispatchResult, text: bool) -> CommandResult {
    let exit_code = match result {
        DispatchResult::Failed { .. } => EXIT_STORE,
        DispatchResult::Rejected { .. } => EXIT_REJECTED,
        _ => 0,
    };

    if text {
        return CommandResult { exit_code, output: render(result) };
    }

    match serde_json::to_string_pretty(result) {
        Ok(output) => CommandResult { exit_code, output },
        Err(error) => CommandResult::failure(
            command,
            "serialization",
            format!("failed to serialize result: {error}"),
            EXIT_STORE,
        ),
    }
}

#[cfg(test)]
mod tests {
    use marquee_core::dispatch::DispatchResult;

    use super::present;

    #[test]
    fn rejection_keeps_dispatch_shape_and_flags_exit_code() {
        let result = present("book", &DispatchResult::rejected("show not found"), false);

        assert_eq!(result.exit_code, 1);
        let payload: serde_json::Value =
            serde_json::from_str(&result.output).expect("json output");
        assert_eq!(payload, serde_json::json!({"error": "show not found"}));
    }

    #[test]
    fn exhausted_retries_map_to_store_exit_code() {
        let result = present(
            "movies",
            &DispatchResult::Failed {
                error: "failed after retries".to_string(),
                attempts: 3,
                last_error: "persistence failure: disk".to_string(),
            },
            true,
        );

        assert_eq!(result.exit_code, 4);
        assert!(result.output.starts_with("❌ failed after retries"));
    }
}
