pub mod app_routes;
pub mod chat_routes;
pub mod conversation_routes;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::config::AppRegistry;
use crate::errors::AppError;
use crate::service::chat_service::ChatService;
use crate::store::conversation_store::ConversationStore;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AppRegistry>,
    pub chat: ChatService,
    pub conversations: ConversationStore,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(err: &AppError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorBody { error: err.to_string() })).into_response()
}
