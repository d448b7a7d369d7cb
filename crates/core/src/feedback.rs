//! User-facing feedback seam.
//!
//! Every failed operation is surfaced through a [`Notifier`] with a
//! human-readable message; nothing is silently swallowed. The UI layer
//! supplies the concrete implementation (toast, console, etc.).

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    /// Report a message to the user. `context` names the operation or
    /// entity that produced it (e.g. `"team.create"`).
    fn notify(&self, severity: Severity, context: &str, message: &str);
}

/// Notifier that discards everything. Intended for tests.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _severity: Severity, _context: &str, _message: &str) {}
}
