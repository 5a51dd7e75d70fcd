use std::sync::Arc;

use tracing::debug;

use crate::config::AppRegistry;
use crate::errors::AppError;
use crate::models::{HistoryMessage, Message};
use crate::provider::{CompletionRequest, CompletionService, DEFAULT_SYSTEM_PROMPT};

const MAX_MESSAGE_LENGTH: usize = 8000;

/// Orchestrates a single request/response turn: validate, resolve the
/// persona's system prompt, call the completion service, hand back the
/// assistant message. Persistence stays with the caller.
#[derive(Clone)]
pub struct ChatService {
    registry: Arc<AppRegistry>,
    completion: CompletionService,
}

impl ChatService {
    pub fn new(registry: Arc<AppRegistry>, completion: CompletionService) -> Self {
        Self { registry, completion }
    }

    /// Runs one turn. Fails only on validation; provider trouble is recovered
    /// into a fallback answer, so a valid request always gets a message.
    pub async fn send_turn(
        &self,
        app_type: &str,
        message: &str,
        history: &[HistoryMessage],
    ) -> Result<Message, AppError> {
        // ── Validation ────────────────────────────────────────────────────────
        if message.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "message".to_string() });
        }
        if app_type.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "appType".to_string() });
        }
        if message.len() > MAX_MESSAGE_LENGTH {
            return Err(AppError::FieldTooLong {
                field_name: "message".to_string(),
                max_length: MAX_MESSAGE_LENGTH,
                actual_length: message.len(),
            });
        }

        // ── Resolve the persona's system prompt ───────────────────────────────
        // Chat never 404s: an unknown app id gets the generic preamble.
        let system_prompt = self
            .registry
            .resolve(app_type)
            .map(|config| config.system_prompt)
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        debug!("Chat turn for '{app_type}' with {} prior turn(s)", history.len());

        // ── Single completion attempt, fallback inside ────────────────────────
        let request = CompletionRequest {
            app_id: app_type,
            system_prompt: &system_prompt,
            history,
            message,
        };
        let completion = self.completion.complete(&request).await;

        Ok(Message::assistant(completion.text, completion.source))
    }
}
