use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::{ChatRequest, ChatResponse, ResponseSource};
use crate::routes::{error_response, AppState};

/// POST `/api/chat` — runs one chat turn. Validation failures are a 4xx;
/// provider failures never are, the turn recovers into a fallback answer.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match state
        .chat
        .send_turn(&request.app_type, &request.message, &request.conversation_history)
        .await
    {
        Ok(message) => Json(ChatResponse {
            success: true,
            response: message.content,
            app_type: request.app_type,
            timestamp: message.timestamp,
            source: message.source.unwrap_or(ResponseSource::Fallback),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppRegistry;
    use crate::provider::CompletionService;
    use crate::service::chat_service::ChatService;
    use crate::store::conversation_store::ConversationStore;
    use crate::store::kv::MemoryStore;
    use axum::http::StatusCode;
    use std::sync::Arc;

    fn state() -> AppState {
        let registry = Arc::new(AppRegistry::from_configs(std::path::Path::new("apps"), []));
        AppState {
            registry: registry.clone(),
            chat: ChatService::new(registry, CompletionService::fallback_only()),
            conversations: ConversationStore::new(Arc::new(MemoryStore::new())),
        }
    }

    fn request(message: &str, app_type: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            app_type: app_type.to_string(),
            conversation_history: vec![],
        }
    }

    #[tokio::test]
    async fn missing_fields_are_a_400() {
        let response = chat_handler(State(state()), Json(request("", ""))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_turn_succeeds_without_a_backend() {
        let response = chat_handler(State(state()), Json(request("hi", "study-buddy"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
