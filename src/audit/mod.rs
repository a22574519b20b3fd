//! Audit logging: append-only JSONL emission of assessment decisions,
//! plus a read-side query/export engine over the three record kinds
//! (assessment, dimension score, failed validation). The log-viewing UI
//! a CLI would build on top of this stays out of scope here; only the
//! library seam ships.

pub mod logger;
pub mod query;

pub use logger::{AssessmentLogRow, AuditLogger, DimensionScoreRow, ExecutionDecision, FailedValidationRow};
pub use query::{AuditQueryEngine, AuditQueryFilter, ExportFormat};
