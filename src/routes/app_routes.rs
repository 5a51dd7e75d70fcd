use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::routes::{error_response, AppState};

#[derive(Serialize)]
struct AppsResponse {
    success: bool,
    apps: Vec<AppConfig>,
}

#[derive(Serialize)]
struct AppResponse {
    success: bool,
    config: AppConfig,
}

/// GET `/api/apps` — all configured apps, stable order.
pub async fn list_apps_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(AppsResponse { success: true, apps: state.registry.all() })
}

/// GET `/api/apps/{appType}` — one app's config, or 404.
pub async fn get_app_handler(
    Path(app_type): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.registry.resolve(&app_type) {
        Some(config) => Json(AppResponse { success: true, config }).into_response(),
        None => error_response(&AppError::AppNotFound { id: app_type }),
    }
}
