use async_trait::async_trait;
use rig::completion::Chat;
use rig::message::Message as RigMessage;
use rig::prelude::CompletionClient;
use rig::providers::gemini;
use serde_json::json;

use crate::errors::AppError;
use crate::models::{HistoryMessage, MessageRole, ResponseSource};
use crate::provider::{CompletionBackend, CompletionRequest};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// Generation parameters are fixed configuration, not request-level knobs.
const TEMPERATURE: f64 = 0.8;
const MAX_OUTPUT_TOKENS: u64 = 2048;
const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;

/// Builds a rig [`RigMessage`] history list from the client-submitted turns.
/// The system prompt travels as the agent preamble, not as a history entry.
fn to_rig_history(history: &[HistoryMessage]) -> Vec<RigMessage> {
    history
        .iter()
        .map(|m| match m.role {
            MessageRole::User => RigMessage::user(&m.content),
            MessageRole::Assistant => RigMessage::assistant(&m.content),
        })
        .collect()
}

/// Hosted-API strategy over the rig [`gemini::Client`]. A fresh agent is
/// built per request so each turn replays the submitted history against the
/// persona's current system prompt.
pub struct GeminiBackend {
    client: gemini::Client,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        let client = gemini::Client::builder()
            .api_key(api_key)
            .build()
            .map_err(|e| AppError::ProviderUnavailable { message: e.to_string() })?;
        Ok(Self { client, model: DEFAULT_MODEL.to_string() })
    }
}

#[async_trait]
impl CompletionBackend for GeminiBackend {
    fn source(&self) -> ResponseSource {
        ResponseSource::GeminiApi
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AppError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(request.system_prompt)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_OUTPUT_TOKENS)
            .additional_params(json!({ "topP": TOP_P, "topK": TOP_K }))
            .build();

        let rig_history = to_rig_history(request.history);

        agent.chat(request.message, rig_history).await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("Connection refused") || msg.contains("connect") {
                AppError::ProviderUnavailable { message: msg }
            } else {
                AppError::CompletionFailed { message: msg }
            }
        })
    }
}
