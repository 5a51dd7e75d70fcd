use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::{Conversation, Message};
use crate::routes::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    conversation_id: String,
}

#[derive(Serialize)]
struct SavedResponse {
    success: bool,
}

#[derive(Deserialize)]
pub struct SaveBody {
    pub messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBody {
    pub conversation_id: Option<String>,
}

/// POST `/api/apps/{appType}/conversations` — mints a new conversation id and
/// makes it active. Nothing is persisted until the first non-empty save.
pub async fn create_conversation_handler(
    Path(app_type): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let conversation_id = state.conversations.create_new(&app_type).await;
    Json(CreatedResponse { conversation_id })
}

/// GET `/api/apps/{appType}/conversations` — most-recent-first.
pub async fn list_conversations_handler(
    Path(app_type): Path<String>,
    State(state): State<AppState>,
) -> Json<Vec<Conversation>> {
    Json(state.conversations.list(&app_type).await)
}

/// GET `/api/apps/{appType}/conversations/{id}` — messages, empty if absent.
pub async fn load_conversation_handler(
    Path((app_type, conversation_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Json<Vec<Message>> {
    Json(state.conversations.load(&app_type, &conversation_id).await)
}

/// PUT `/api/apps/{appType}/conversations/{id}` — upserts the message list.
pub async fn save_conversation_handler(
    Path((app_type, conversation_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(body): Json<SaveBody>,
) -> impl IntoResponse {
    state.conversations.save(&app_type, &conversation_id, body.messages).await;
    Json(SavedResponse { success: true })
}

/// DELETE `/api/apps/{appType}/conversations/{id}`.
pub async fn delete_conversation_handler(
    Path((app_type, conversation_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    state.conversations.delete(&app_type, &conversation_id).await;
    Json(SavedResponse { success: true })
}

/// DELETE `/api/apps/{appType}/conversations` — drops the app's history.
pub async fn clear_conversations_handler(
    Path(app_type): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    state.conversations.clear_all(&app_type).await;
    Json(SavedResponse { success: true })
}

/// GET `/api/apps/{appType}/active` — the active conversation pointer.
pub async fn get_active_handler(
    Path(app_type): Path<String>,
    State(state): State<AppState>,
) -> Json<ActiveBody> {
    Json(ActiveBody { conversation_id: state.conversations.get_active(&app_type).await })
}

/// PUT `/api/apps/{appType}/active` — repoints the active conversation.
pub async fn set_active_handler(
    Path(app_type): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ActiveBody>,
) -> impl IntoResponse {
    if let Some(conversation_id) = body.conversation_id {
        state.conversations.set_active(&app_type, &conversation_id).await;
    }
    Json(SavedResponse { success: true })
}
