use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What the engine reports to its audit sink. These are consistency
/// observations, not errors: the engine has already taken its recovery path
/// by the time a record is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuditKind {
    /// The order index pointed at a (price, side) where the order no longer
    /// rests. Treated as cancel-not-found after cleanup.
    IndexDesync = 0,
    /// Cancel arrived for an id the engine has never seen or has already
    /// retired.
    CancelUnknown = 1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub kind: AuditKind,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    #[inline]
    pub fn new(kind: AuditKind, detail: String) -> Self {
        Self {
            kind,
            detail,
            timestamp: Utc::now(),
        }
    }
}

/// Optional telemetry sink injected into the engine at construction.
/// Production builds may omit it entirely; nothing in the hot path depends
/// on one being present.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// Bounded in-memory sink, mostly for tests and diagnostics runs.
#[derive(Debug)]
pub struct MemoryAuditLog {
    capacity: usize,
    records: Mutex<VecDeque<AuditRecord>>,
}

impl MemoryAuditLog {
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.lock().iter().cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, record: AuditRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_log_evicts_oldest_at_capacity() {
        let log = MemoryAuditLog::new(2);
        log.record(AuditRecord::new(AuditKind::CancelUnknown, "a".into()));
        log.record(AuditRecord::new(AuditKind::CancelUnknown, "b".into()));
        log.record(AuditRecord::new(AuditKind::IndexDesync, "c".into()));

        let records = log.snapshot();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].detail, "b");
        assert_eq!(records[1].kind, AuditKind::IndexDesync);
    }
}
