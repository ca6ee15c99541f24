// src/repositories/postgres/mod.rs

pub mod chat_profile;
pub mod admin_roster;

pub use chat_profile::PostgresChatProfileRepository;
pub use admin_roster::PostgresAdminRosterRepository;
