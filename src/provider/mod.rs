pub mod cli;
pub mod fallback;
pub mod gemini;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::errors::AppError;
use crate::models::{HistoryMessage, ResponseSource};
use crate::provider::cli::CliBackend;
use crate::provider::fallback::FallbackResponder;
use crate::provider::gemini::GeminiBackend;

/// Preamble used when a persona resolves to an empty system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// One chat turn as seen by a completion backend.
pub struct CompletionRequest<'a> {
    pub app_id: &'a str,
    pub system_prompt: &'a str,
    pub history: &'a [HistoryMessage],
    pub message: &'a str,
}

/// A single upstream text-completion strategy. Implementations fail with an
/// error rather than returning empty text; recovery is the service's job.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn source(&self) -> ResponseSource;
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AppError>;
}

pub struct Completion {
    pub text: String,
    pub source: ResponseSource,
}

/// Wraps the backend chosen at startup and fails closed: any backend error,
/// timeout, or empty completion falls through to a canned per-app response,
/// so a turn always yields text.
#[derive(Clone)]
pub struct CompletionService {
    backend: Option<Arc<dyn CompletionBackend>>,
    fallback: Arc<FallbackResponder>,
}

impl CompletionService {
    /// Picks the backend once from the environment: a configured
    /// `GEMINI_API_KEY` wins, then `AGENT_CLI_BIN`, then fallback-only.
    pub fn from_env(apps_dir: &Path) -> Self {
        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            if !api_key.trim().is_empty() {
                match GeminiBackend::new(&api_key) {
                    Ok(backend) => {
                        debug!("Using hosted Gemini backend");
                        return Self::with_backend(Arc::new(backend));
                    }
                    Err(e) => error!("Failed to initialise Gemini backend: {e}"),
                }
            }
        }

        if let Ok(binary) = std::env::var("AGENT_CLI_BIN") {
            if !binary.trim().is_empty() {
                debug!("Using CLI backend at {binary}");
                return Self::with_backend(Arc::new(CliBackend::new(
                    binary.into(),
                    apps_dir.to_path_buf(),
                )));
            }
        }

        warn!("No AI backend configured; serving canned fallback responses");
        Self::fallback_only()
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend: Some(backend), fallback: Arc::new(FallbackResponder) }
    }

    pub fn fallback_only() -> Self {
        Self { backend: None, fallback: Arc::new(FallbackResponder) }
    }

    /// Runs one turn. Never fails: a single backend attempt, then the canned
    /// fallback.
    pub async fn complete(&self, request: &CompletionRequest<'_>) -> Completion {
        if let Some(backend) = &self.backend {
            match backend.complete(request).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Completion { text, source: backend.source() };
                }
                Ok(_) => {
                    warn!("{} backend returned empty text for '{}'", backend.source().as_str(), request.app_id);
                }
                Err(e) => {
                    error!("{} backend failed for '{}': {e}", backend.source().as_str(), request.app_id);
                }
            }
        }

        Completion {
            text: self.fallback.respond(request.app_id),
            source: ResponseSource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        fn source(&self) -> ResponseSource {
            ResponseSource::AgentCli
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, AppError> {
            Err(AppError::ProviderUnavailable { message: "boom".to_string() })
        }
    }

    struct EmptyBackend;

    #[async_trait]
    impl CompletionBackend for EmptyBackend {
        fn source(&self) -> ResponseSource {
            ResponseSource::GeminiApi
        }

        async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, AppError> {
            Ok("   ".to_string())
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        fn source(&self) -> ResponseSource {
            ResponseSource::GeminiApi
        }

        async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AppError> {
            Ok(format!("echo: {}", request.message))
        }
    }

    fn request<'a>() -> CompletionRequest<'a> {
        CompletionRequest {
            app_id: "study-buddy",
            system_prompt: DEFAULT_SYSTEM_PROMPT,
            history: &[],
            message: "hi",
        }
    }

    #[tokio::test]
    async fn healthy_backend_answer_is_passed_through() {
        let service = CompletionService::with_backend(Arc::new(EchoBackend));
        let completion = service.complete(&request()).await;
        assert_eq!(completion.text, "echo: hi");
        assert_eq!(completion.source, ResponseSource::GeminiApi);
    }

    #[tokio::test]
    async fn backend_error_falls_back_to_canned_response() {
        let service = CompletionService::with_backend(Arc::new(FailingBackend));
        let completion = service.complete(&request()).await;
        assert_eq!(completion.source, ResponseSource::Fallback);
        assert!(!completion.text.is_empty());
    }

    #[tokio::test]
    async fn empty_completion_falls_back_to_canned_response() {
        let service = CompletionService::with_backend(Arc::new(EmptyBackend));
        let completion = service.complete(&request()).await;
        assert_eq!(completion.source, ResponseSource::Fallback);
        assert!(!completion.text.is_empty());
    }

    #[tokio::test]
    async fn no_backend_serves_fallback() {
        let service = CompletionService::fallback_only();
        let completion = service.complete(&request()).await;
        assert_eq!(completion.source, ResponseSource::Fallback);
        assert!(!completion.text.is_empty());
    }
}
