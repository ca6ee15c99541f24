use async_trait::async_trait;
use crate::error::Error;
use crate::models::message::ChatAction;

/// Outbound half of the messaging platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends `text` into `chat_id`, as a reply when `reply_to` is set.
    async fn send_message(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<(), Error>;
    async fn send_photo(&self, chat_id: i64, reply_to: Option<i64>, photo_url: &str) -> Result<(), Error>;
    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), Error>;
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), Error>;
    /// User ids of the chat's administrators (empty for private chats).
    async fn chat_administrators(&self, chat_id: i64) -> Result<Vec<i64>, Error>;
}
