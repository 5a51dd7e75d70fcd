use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::ResponseSource;
use crate::provider::{CompletionBackend, CompletionRequest};

const CLI_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Subprocess strategy: shells out to a local agent binary with the message
/// and the app's config directory. The binary owns the persona (prompt and
/// history handling), so the request's system prompt and history are not
/// forwarded.
pub struct CliBackend {
    binary: PathBuf,
    apps_dir: PathBuf,
}

impl CliBackend {
    pub fn new(binary: PathBuf, apps_dir: PathBuf) -> Self {
        Self { binary, apps_dir }
    }
}

#[async_trait]
impl CompletionBackend for CliBackend {
    fn source(&self) -> ResponseSource {
        ResponseSource::AgentCli
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AppError> {
        let config_dir = self.apps_dir.join(request.app_id);
        debug!("Invoking {} for '{}'", self.binary.display(), request.app_id);

        let mut command = Command::new(&self.binary);
        command
            .arg("chat")
            .arg(request.message)
            .arg("--config")
            .arg(&config_dir)
            .kill_on_drop(true);

        let output = tokio::time::timeout(CLI_TIMEOUT, command.output())
            .await
            .map_err(|_| AppError::ProviderTimeout { seconds: CLI_TIMEOUT.as_secs() })?
            .map_err(|e| AppError::ProviderUnavailable {
                message: format!("failed to spawn {}: {e}", self.binary.display()),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            warn!("CLI stderr: {}", stderr.trim());
        }

        if !output.status.success() {
            return Err(AppError::CompletionFailed {
                message: format!("CLI exited with {}", output.status),
            });
        }
        if output.stdout.len() > MAX_OUTPUT_BYTES {
            return Err(AppError::CompletionFailed {
                message: format!("CLI output exceeded {MAX_OUTPUT_BYTES} bytes"),
            });
        }

        let response = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if response.is_empty() {
            return Err(AppError::EmptyCompletion);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DEFAULT_SYSTEM_PROMPT;

    fn request<'a>() -> CompletionRequest<'a> {
        CompletionRequest {
            app_id: "study-buddy",
            system_prompt: DEFAULT_SYSTEM_PROMPT,
            history: &[],
            message: "hi",
        }
    }

    #[tokio::test]
    async fn missing_binary_reports_unavailable() {
        let backend =
            CliBackend::new(PathBuf::from("/no/such/agent-cli"), PathBuf::from("apps"));
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn empty_stdout_is_a_failure() {
        // `true` exits 0 with no output.
        let backend = CliBackend::new(PathBuf::from("/bin/true"), PathBuf::from("apps"));
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCompletion));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure() {
        let backend = CliBackend::new(PathBuf::from("/bin/false"), PathBuf::from("apps"));
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::CompletionFailed { .. }));
    }
}
