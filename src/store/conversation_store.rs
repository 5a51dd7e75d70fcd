use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::{Conversation, Message, MessageRole};
use crate::store::kv::KeyValueStore;

const CONVERSATIONS_PREFIX: &str = "conversations:";
const ACTIVE_PREFIX: &str = "active:";

/// At most this many conversations are retained per app; oldest are evicted.
const MAX_CONVERSATIONS: usize = 50;
const TITLE_MAX_CHARS: usize = 50;

/// Per-app conversation history over an injected [`KeyValueStore`].
///
/// Storage failures are logged and degrade to "no history": reads return
/// empty, writes become no-ops. Last write wins; a single writer is assumed.
#[derive(Clone)]
pub struct ConversationStore {
    kv: Arc<dyn KeyValueStore>,
}

fn generate_title(messages: &[Message]) -> String {
    let Some(first_user) = messages.iter().find(|m| m.role == MessageRole::User) else {
        return "New Conversation".to_string();
    };
    let content = &first_user.content;
    if content.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        content.clone()
    }
}

impl ConversationStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn conversations_key(app_type: &str) -> String {
        format!("{CONVERSATIONS_PREFIX}{app_type}")
    }

    fn active_key(app_type: &str) -> String {
        format!("{ACTIVE_PREFIX}{app_type}")
    }

    /// All conversations for an app, most-recent-first.
    pub async fn list(&self, app_type: &str) -> Vec<Conversation> {
        let key = Self::conversations_key(app_type);
        let raw = match self.kv.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![],
            Err(e) => {
                error!("Failed to load conversations for '{app_type}': {e}");
                return vec![];
            }
        };
        match serde_json::from_str::<Vec<Conversation>>(&raw) {
            Ok(conversations) => conversations,
            Err(e) => {
                error!("{}", AppError::CorruptRecord { key, source: e });
                vec![]
            }
        }
    }

    async fn write_all(&self, app_type: &str, conversations: &[Conversation]) {
        let key = Self::conversations_key(app_type);
        let raw = match serde_json::to_string(conversations) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to encode conversations for '{app_type}': {e}");
                return;
            }
        };
        if let Err(e) = self.kv.set(&key, &raw).await {
            error!("Failed to save conversations for '{app_type}': {e}");
        }
    }

    /// Mints a new conversation id and makes it the active one. Nothing is
    /// persisted until the first non-empty [`save`](Self::save).
    pub async fn create_new(&self, app_type: &str) -> String {
        let conversation_id = format!("conv_{}", Utc::now().timestamp_micros());
        self.set_active(app_type, &conversation_id).await;
        debug!("Created new conversation {conversation_id} for '{app_type}'");
        conversation_id
    }

    /// Upserts a conversation. Empty message lists are never written, the
    /// title is recomputed from the first user message, and the saved
    /// conversation moves to the front of the capped per-app list.
    pub async fn save(&self, app_type: &str, conversation_id: &str, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }

        let mut conversations = self.list(app_type).await;
        conversations.retain(|c| c.id != conversation_id);
        conversations.insert(
            0,
            Conversation {
                id: conversation_id.to_string(),
                title: generate_title(&messages),
                messages,
                timestamp: Utc::now(),
                app_type: app_type.to_string(),
            },
        );
        conversations.truncate(MAX_CONVERSATIONS);

        self.write_all(app_type, &conversations).await;
    }

    /// Messages of one conversation; empty if it does not exist.
    pub async fn load(&self, app_type: &str, conversation_id: &str) -> Vec<Message> {
        self.list(app_type)
            .await
            .into_iter()
            .find(|c| c.id == conversation_id)
            .map(|c| c.messages)
            .unwrap_or_default()
    }

    /// Removes a conversation, clearing the active pointer if it pointed here.
    pub async fn delete(&self, app_type: &str, conversation_id: &str) {
        let mut conversations = self.list(app_type).await;
        conversations.retain(|c| c.id != conversation_id);
        self.write_all(app_type, &conversations).await;

        if self.get_active(app_type).await.as_deref() == Some(conversation_id) {
            if let Err(e) = self.kv.remove(&Self::active_key(app_type)).await {
                error!("Failed to clear active conversation for '{app_type}': {e}");
            }
        }
    }

    /// Drops the app's whole conversation list and active pointer.
    pub async fn clear_all(&self, app_type: &str) {
        if let Err(e) = self.kv.remove(&Self::conversations_key(app_type)).await {
            error!("Failed to clear conversations for '{app_type}': {e}");
        }
        if let Err(e) = self.kv.remove(&Self::active_key(app_type)).await {
            error!("Failed to clear active conversation for '{app_type}': {e}");
        }
    }

    pub async fn get_active(&self, app_type: &str) -> Option<String> {
        match self.kv.get(&Self::active_key(app_type)).await {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to read active conversation for '{app_type}': {e}");
                None
            }
        }
    }

    pub async fn set_active(&self, app_type: &str, conversation_id: &str) {
        if let Err(e) = self.kv.set(&Self::active_key(app_type), conversation_id).await {
            error!("Failed to set active conversation for '{app_type}': {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::MemoryStore;

    const APP: &str = "study-buddy";

    fn store() -> ConversationStore {
        ConversationStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn save_then_load_returns_latest_messages() {
        let store = store();

        store.save(APP, "conv_1", vec![Message::user("first")]).await;
        store
            .save(APP, "conv_1", vec![Message::user("first"), Message::user("second")])
            .await;

        let messages = store.load(APP, "conv_1").await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "second");
    }

    #[tokio::test]
    async fn empty_save_is_never_persisted() {
        let store = store();
        store.save(APP, "conv_1", vec![]).await;
        assert!(store.list(APP).await.is_empty());
    }

    #[tokio::test]
    async fn list_is_capped_at_fifty() {
        let store = store();
        for i in 0..60 {
            store.save(APP, &format!("conv_{i}"), vec![Message::user(format!("msg {i}"))]).await;
        }

        let conversations = store.list(APP).await;
        assert_eq!(conversations.len(), MAX_CONVERSATIONS);
        // Most recently saved is at the front; the oldest ten were evicted.
        assert_eq!(conversations[0].id, "conv_59");
        assert!(conversations.iter().all(|c| c.id != "conv_9"));
    }

    #[tokio::test]
    async fn resaving_moves_conversation_to_front() {
        let store = store();
        store.save(APP, "conv_a", vec![Message::user("a")]).await;
        store.save(APP, "conv_b", vec![Message::user("b")]).await;
        store.save(APP, "conv_a", vec![Message::user("a"), Message::user("again")]).await;

        let conversations = store.list(APP).await;
        assert_eq!(conversations[0].id, "conv_a");
        assert_eq!(conversations[1].id, "conv_b");
    }

    #[tokio::test]
    async fn short_first_message_becomes_title_verbatim() {
        let store = store();
        store.save(APP, "conv_1", vec![Message::user("What is a derivative?")]).await;

        let conversations = store.list(APP).await;
        assert_eq!(conversations[0].title, "What is a derivative?");
    }

    #[tokio::test]
    async fn long_first_message_is_truncated_with_marker() {
        let store = store();
        let long = "x".repeat(80);
        store.save(APP, "conv_1", vec![Message::user(long)]).await;

        let title = store.list(APP).await[0].title.clone();
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[tokio::test]
    async fn title_falls_back_when_no_user_message() {
        let store = store();
        store
            .save(APP, "conv_1", vec![Message::assistant("hello", crate::models::ResponseSource::Fallback)])
            .await;
        assert_eq!(store.list(APP).await[0].title, "New Conversation");
    }

    #[tokio::test]
    async fn create_new_sets_active_pointer() {
        let store = store();
        let id = store.create_new(APP).await;
        assert_eq!(store.get_active(APP).await.as_deref(), Some(id.as_str()));
        // Nothing persisted yet.
        assert!(store.list(APP).await.is_empty());
    }

    #[tokio::test]
    async fn deleting_active_conversation_clears_pointer() {
        let store = store();
        let id = store.create_new(APP).await;
        store.save(APP, &id, vec![Message::user("hi")]).await;

        store.delete(APP, &id).await;
        assert!(store.get_active(APP).await.is_none());
        assert!(store.load(APP, &id).await.is_empty());
    }

    #[tokio::test]
    async fn deleting_inactive_conversation_keeps_pointer() {
        let store = store();
        store.save(APP, "conv_old", vec![Message::user("old")]).await;
        let active = store.create_new(APP).await;

        store.delete(APP, "conv_old").await;
        assert_eq!(store.get_active(APP).await.as_deref(), Some(active.as_str()));
    }

    #[tokio::test]
    async fn apps_are_isolated_from_each_other() {
        let store = store();
        store.save("study-buddy", "conv_1", vec![Message::user("math")]).await;
        store.save("idea-forge", "conv_1", vec![Message::user("ideas")]).await;

        assert_eq!(store.list("study-buddy").await.len(), 1);
        assert_eq!(store.load("idea-forge", "conv_1").await[0].content, "ideas");
    }

    #[tokio::test]
    async fn clear_all_removes_list_and_pointer() {
        let store = store();
        let id = store.create_new(APP).await;
        store.save(APP, &id, vec![Message::user("hi")]).await;

        store.clear_all(APP).await;
        assert!(store.list(APP).await.is_empty());
        assert!(store.get_active(APP).await.is_none());
    }

    #[tokio::test]
    async fn load_of_unknown_conversation_is_empty() {
        let store = store();
        assert!(store.load(APP, "conv_missing").await.is_empty());
    }
}
