pub mod audit;
pub mod engine;

pub use audit::{AuditKind, AuditRecord, AuditSink, MemoryAuditLog};
pub use engine::{EngineConfig, EngineError, EngineStats, MatchOutcome, MatchingEngine};

pub type Result<T> = std::result::Result<T, EngineError>;
