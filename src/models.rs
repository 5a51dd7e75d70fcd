use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Which backend produced an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    GeminiApi,
    AgentCli,
    Fallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::GeminiApi => "gemini-api",
            ResponseSource::AgentCli => "agent-cli",
            ResponseSource::Fallback => "fallback",
        }
    }
}

/// One turn in a conversation. Messages round-trip through the conversation
/// store as JSON, so optional fields stay off the wire when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            source: None,
            error: false,
        }
    }

    pub fn assistant(content: impl Into<String>, source: ResponseSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            source: Some(source),
            error: false,
        }
    }
}

/// A titled, ordered sequence of messages under one app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "appType")]
    pub app_type: String,
}

/// A prior turn as submitted by the client with a chat request. Only role and
/// content matter to the provider; ids and timestamps stay client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub app_type: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub app_type: String,
    pub timestamp: DateTime<Utc>,
    pub source: ResponseSource,
}
