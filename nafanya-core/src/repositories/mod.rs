// src/repositories/mod.rs

pub mod postgres;

pub use nafanya_common::traits::repository_traits::{AdminRosterRepository, ChatProfileRepository};
pub use postgres::{PostgresAdminRosterRepository, PostgresChatProfileRepository};
