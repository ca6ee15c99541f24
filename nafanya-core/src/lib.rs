// src/lib.rs

pub mod db;
pub mod repositories;
pub mod platforms;
pub mod cache;
pub mod crypto;
pub mod scheduler;
pub mod services;
pub mod telemetry;
pub mod test_utils;

pub use db::Database;
pub use nafanya_common::error::Error;
