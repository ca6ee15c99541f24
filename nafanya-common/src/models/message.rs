// File: nafanya-common/src/models/message.rs

use serde::{Deserialize, Serialize};

use crate::models::chat::ChatKind;

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_bot: bool,
}

impl MessageAuthor {
    /// "First Last", or just "First" when there is no last name.
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

/// The message an inbound message is replying to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepliedMessage {
    pub message_id: i64,
    pub from: Option<MessageAuthor>,
    pub text: String,
}

/// `/name args` parsed out of the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub name: String,
    pub arguments: String,
}

/// Transport-neutral view of one inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub chat_title: Option<String>,
    /// First/last name of the other party, set for private chats.
    pub chat_first_name: Option<String>,
    pub chat_last_name: Option<String>,
    pub from: MessageAuthor,
    pub text: String,
    pub command: Option<BotCommand>,
    pub reply_to: Option<RepliedMessage>,
}

impl InboundMessage {
    /// Display name a freshly provisioned chat profile gets.
    pub fn chat_display_name(&self) -> String {
        match self.chat_kind {
            ChatKind::Private => format!(
                "{} {}",
                self.chat_first_name.as_deref().unwrap_or_default(),
                self.chat_last_name.as_deref().unwrap_or_default()
            ),
            _ => self.chat_title.clone().unwrap_or_default(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.command.is_some()
    }
}

/// Status indicator shown to chat members while the bot works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAction::Typing => "typing",
            ChatAction::UploadPhoto => "upload_photo",
        }
    }
}
