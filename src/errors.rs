use thiserror::Error;

/// Top-level application error. All variants carry a human-readable message
/// for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Apps directory '{path}' is not readable")]
    AppsDirUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config for app '{app_id}': {message}")]
    InvalidAppConfig { app_id: String, message: String },

    #[error("App '{id}' not found")]
    AppNotFound { id: String },

    // ── Storage errors ───────────────────────────────────────────────────────
    #[error("Storage connection failed: {0}")]
    StorageConnectionFailed(#[source] sqlx::Error),

    #[error("Storage query failed: {message}")]
    StorageQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Corrupt record under key '{key}'")]
    CorruptRecord {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Provider errors ──────────────────────────────────────────────────────
    #[error("AI backend unavailable: {message}")]
    ProviderUnavailable { message: String },

    #[error("AI backend timed out after {seconds}s")]
    ProviderTimeout { seconds: u64 },

    #[error("Completion failed: {message}")]
    CompletionFailed { message: String },

    #[error("AI backend returned an empty completion")]
    EmptyCompletion,

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },
}

impl AppError {
    pub fn storage_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::StorageQueryFailed { message: message.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::AppNotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. } | AppError::FieldTooLong { .. })
    }
}
