use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A conversation as the chat service reports it. Either direct (one peer)
/// or a group; `archived` and `pinned` are list-visibility states owned by
/// the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub unread_count: u32,
}

/// The two message fields the policy engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub from_me: bool,
    /// Seconds since epoch
    pub timestamp: i64,
}

/// Lifecycle and message events pushed by the chat service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChatEvent {
    PairingCode {
        code: String,
    },
    Authenticated,
    Ready,
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    MessageCreated {
        conversation_id: String,
        message: Message,
    },
}

/// The external chat-client capability — implement for any messaging
/// backend.
///
/// `connect` only initiates: success is signaled later by a `Ready` event
/// on the `listen` stream. Identifiers are the service's own opaque chat
/// ids.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn connect(&self) -> anyhow::Result<()>;

    async fn disconnect(&self) -> anyhow::Result<()>;

    /// All non-archived conversations, in list order
    async fn list_chats(&self) -> anyhow::Result<Vec<Conversation>>;

    /// Re-fetch one conversation's current state
    async fn chat_by_id(&self, id: &str) -> anyhow::Result<Conversation>;

    /// The `limit` most recent messages in a conversation, any order
    async fn recent_messages(&self, id: &str, limit: usize) -> anyhow::Result<Vec<Message>>;

    async fn archive(&self, id: &str) -> anyhow::Result<()>;

    /// Push events into `tx` until the service shuts down (long-running)
    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChatEvent>) -> anyhow::Result<()>;
}
