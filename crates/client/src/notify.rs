//! Default [`Notifier`] backed by tracing.

use lineops_core::feedback::{Notifier, Severity};

/// Notifier that emits structured log events. Embedding UIs replace
/// this with their toast system.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, context: &str, message: &str) {
        match severity {
            Severity::Info => tracing::info!(context, "{message}"),
            Severity::Warning => tracing::warn!(context, "{message}"),
            Severity::Error => tracing::error!(context, "{message}"),
        }
    }
}
