//! Operation log collaborator.
//!
//! Repository operations report every error envelope they return through an
//! [`OperationLog`] handed to them at construction, rather than through a
//! global logger. [`TracingLog`] forwards to `tracing`; [`MemoryLog`] keeps
//! the messages for inspection.

use std::sync::Mutex;

use crate::envelope::ErrorEnvelope;

pub trait OperationLog: Send + Sync {
    /// Records an error envelope at error severity.
    fn error(&self, err: &ErrorEnvelope);
}

/// Emits `tracing` error events tagged with the issuing component.
#[derive(Debug, Clone)]
pub struct TracingLog {
    component: String,
}

impl TracingLog {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl OperationLog for TracingLog {
    fn error(&self, err: &ErrorEnvelope) {
        tracing::error!(
            component = %self.component,
            entity = err.entity.name(),
            code = err.code.as_i32(),
            error_type = %err.error_type,
            "{}",
            err.message
        );
    }
}

/// Collects error messages in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl OperationLog for MemoryLog {
    fn error(&self, err: &ErrorEnvelope) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(err.message.clone());
        }
    }
}
