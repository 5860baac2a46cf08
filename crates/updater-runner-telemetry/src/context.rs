//! Run-level span helpers.
//!
//! # Design
//! - Provides an application-level span guard so every log line of a run carries the
//!   build identifier and the current phase.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    /// Enter the application-level tracing span for the lifetime of the guard.
    pub fn new(phase: impl Into<String>) -> Self {
        let phase = phase.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("run", phase = %phase, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Record the current run phase (e.g. `activating`, `polling`) on the active span.
pub fn record_run_phase(phase: &str) {
    Span::current().record("phase", tracing::field::display(phase));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_records_phase_changes() {
        let guard = GlobalContextGuard::new("bootstrap");
        record_run_phase("activating");
        record_run_phase("polling");
        drop(guard);
    }
}
