// File: src/telemetry.rs

use nafanya_common::traits::telemetry_traits::ErrorReporter;
use crate::Error;

pub const TELEMETRY_TARGET: &str = "telemetry";

/// Reports errors and breadcrumbs as structured `tracing` events on the
/// `telemetry` target, where any subscriber layer can pick them up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn capture_error(&self, error: &Error) {
        tracing::error!(
            target: TELEMETRY_TARGET,
            kind = error_kind(error),
            fatal = error.is_fatal(),
            "{}",
            error
        );
    }

    fn add_breadcrumb(&self, category: &str, message: &str) {
        tracing::debug!(target: TELEMETRY_TARGET, category, "{}", message);
    }
}

fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::NotFound(_) => "not_found",
        Error::Database(_) | Error::Migration(_) => "database",
        Error::Http(_) => "http",
        Error::Json(_) | Error::Parse(_) => "parse",
        Error::Io(_) => "io",
        Error::Platform(_) => "platform",
        Error::Config(_) => "config",
        Error::UnknownModel(_) | Error::ModelNotAvailable(_) | Error::Provider(_) => "provider",
        Error::Entropy(_) => "entropy",
        Error::Internal(_) => "internal",
    }
}
