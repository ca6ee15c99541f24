// File: src/cache/mod.rs

pub mod chat_config_cache;

pub use chat_config_cache::{ChatConfigCache, ChatTable};
