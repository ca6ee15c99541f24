// File: src/platforms/mod.rs

pub use nafanya_common::traits::platform_traits::ChatTransport;

pub mod telegram;
