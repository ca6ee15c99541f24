// File: src/services/mod.rs

pub mod admin_command_service;
pub mod link_preview;
pub mod message_service;
pub mod prompt;

pub use admin_command_service::AdminCommandService;
pub use message_service::{MessageService, MessageSettings};
