// File: nafanya-common/src/traits/mod.rs
pub mod platform_traits;
pub mod repository_traits;
pub mod telemetry_traits;
