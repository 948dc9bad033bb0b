//! Debounced script validation.
//!
//! Every text change re-arms a single deadline. Only when no change has
//! happened for the configured delay does a validation run, so a burst of
//! keystrokes costs one compile. Results are tagged with the document revision
//! they were computed for and are dropped if the text has moved on since.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::compiler::{validate, Diagnostic, ScriptCompiler};

pub const DEFAULT_VALIDATION_DELAY: Duration = Duration::from_millis(1000);

/// Permission to run one validation for a given document revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationTicket {
    pub revision: u64,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    deadline: Instant,
    revision: u64,
}

#[derive(Clone, Debug)]
pub struct ScriptValidator {
    delay: Duration,
    pending: Option<Pending>,
    diagnostic: Diagnostic,
    diagnostic_revision: Option<u64>,
}

impl Default for ScriptValidator {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDATION_DELAY)
    }
}

impl ScriptValidator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            diagnostic: Diagnostic::clean(),
            diagnostic_revision: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Last applied diagnostic. It stays in place while newer edits are pending.
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.diagnostic
    }

    /// Revision the current diagnostic was computed for.
    pub fn diagnostic_revision(&self) -> Option<u64> {
        self.diagnostic_revision
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    /// Re-arms the timer, replacing any run that has not fired yet.
    pub fn text_changed(&mut self, revision: u64, now: Instant) {
        self.pending = Some(Pending {
            deadline: now + self.delay,
            revision,
        });
    }

    /// Drops a pending run and clears the diagnostic.
    pub fn reset(&mut self) {
        self.pending = None;
        self.diagnostic = Diagnostic::clean();
        self.diagnostic_revision = None;
    }

    /// Hands out the pending run once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<ValidationTicket> {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                Some(ValidationTicket {
                    revision: pending.revision,
                })
            }
            _ => None,
        }
    }

    /// Applies a finished run. Returns false when the result is stale.
    pub fn complete(
        &mut self,
        ticket: ValidationTicket,
        diagnostic: Diagnostic,
        current_revision: u64,
    ) -> bool {
        if ticket.revision != current_revision {
            debug!(
                ticket = ticket.revision,
                current = current_revision,
                "discarding stale validation"
            );
            return false;
        }
        self.diagnostic = diagnostic;
        self.diagnostic_revision = Some(ticket.revision);
        true
    }

    /// Runs a due validation synchronously. Returns true if the diagnostic was replaced.
    pub fn poll(
        &mut self,
        now: Instant,
        current_revision: u64,
        source: &str,
        compiler: &dyn ScriptCompiler,
    ) -> bool {
        let Some(ticket) = self.take_due(now) else {
            return false;
        };
        let diagnostic = validate(compiler, source);
        self.complete(ticket, diagnostic, current_revision)
    }

    /// Validates immediately, cancelling any pending run.
    pub fn validate_now(&mut self, revision: u64, source: &str, compiler: &dyn ScriptCompiler) {
        self.pending = None;
        let diagnostic = validate(compiler, source);
        self.complete(ValidationTicket { revision }, diagnostic, revision);
    }
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
