//! Telegram Bot API transport: HTTPS JSON client and long-polling runtime.

pub mod client;
pub mod models;
pub mod runtime;

pub use client::TelegramClient;
pub use runtime::TelegramRuntime;
