//! Lifecycle audit trail for access-key and sharing operations.
//!
//! Kept separate from `tracing` call sites (which are for operators) so a
//! caller can also wire up its own durable audit log without scraping logs.

use std::sync::Mutex;

/// One access-key or sharing lifecycle event.
#[derive(Clone, Debug)]
pub struct AuditEvent {
    pub operation: &'static str,
    pub writer_id: String,
    pub user_id: String,
    pub reader_id: String,
    pub record_type: String,
    pub outcome: &'static str,
}

pub trait AuditSinkSync: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Forwards every event to `tracing` at `info`. The default sink.
#[derive(Default)]
pub struct TracingAuditSink;

impl AuditSinkSync for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            operation = event.operation,
            writer_id = %event.writer_id,
            user_id = %event.user_id,
            reader_id = %event.reader_id,
            record_type = %event.record_type,
            outcome = event.outcome,
            "access key lifecycle event"
        );
    }
}

/// Collects events in memory for assertions in tests.
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink mutex poisoned").clone()
    }
}

impl AuditSinkSync for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().expect("audit sink mutex poisoned").push(event);
    }
}
