// File: nafanya-common/src/models/mod.rs
pub mod ai;
pub mod admin;
pub mod chat;
pub mod message;

pub use ai::ProviderKind;
pub use admin::AdminRoster;
pub use chat::{ChatKind, ChatProfile, PromptKind};
pub use message::{BotCommand, ChatAction, InboundMessage, MessageAuthor, RepliedMessage};
