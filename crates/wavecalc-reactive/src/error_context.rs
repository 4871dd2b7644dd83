//! Single-slot error holder, one per display session.
//!
//! Clones share the slot, so a component and every view subscribed to it
//! observe the same latest error. Separate sessions create separate
//! contexts and never see each other's failures.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    slot: Arc<watch::Sender<Option<ErrorRecord>>>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot: Arc::new(slot) }
    }

    pub fn clear(&self) {
        self.slot.send_replace(None);
    }

    /// Overwrite the slot. When a span is given it is marked errored and the
    /// message is recorded on it; the span must declare `otel.status_code`
    /// and `exception.message` fields for the marks to stick.
    pub fn set(&self, kind: impl Into<String>, message: impl Into<String>, span: Option<&Span>) {
        let record = ErrorRecord { kind: kind.into(), message: message.into() };
        if let Some(span) = span {
            span.record("otel.status_code", "ERROR");
            span.record("exception.message", record.message.as_str());
        }
        tracing::debug!(kind = %record.kind, message = %record.message, "error recorded");
        self.slot.send_replace(Some(record));
    }

    pub fn current(&self) -> Option<ErrorRecord> {
        self.slot.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.slot.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ErrorRecord>> {
        self.slot.subscribe()
    }
}
