use crate::error::Error;

/// Fire-and-forget error reporting. Implementations must never block the
/// caller or fail.
pub trait ErrorReporter: Send + Sync {
    fn capture_error(&self, error: &Error);

    /// Attaches context to whatever gets captured next on this event.
    fn add_breadcrumb(&self, category: &str, message: &str);
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn capture_error(&self, _error: &Error) {}
    fn add_breadcrumb(&self, _category: &str, _message: &str) {}
}
