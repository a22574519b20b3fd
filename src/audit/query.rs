//! Read-side query/export over the assessment JSONL log. A log-*viewing
//! UI* stays out of scope, but the programmatic filter/export
//! capability such a UI would call into is part of the library surface:
//! filter by time range, function name, or outcome, then export to
//! JSON or CSV via a synchronous line-by-line JSONL reader.

use super::logger::{AssessmentLogRow, ExecutionDecision};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

/// Filter applied by [`AuditQueryEngine::query`]. All fields default to
/// "no constraint"; an absent field never excludes a row.
#[derive(Debug, Clone, Default)]
pub struct AuditQueryFilter {
    pub function_name: Option<String>,
    pub decision: Option<ExecutionDecision>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    pub fn with_decision(mut self, decision: ExecutionDecision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, row: &AssessmentLogRow) -> bool {
        if let Some(name) = &self.function_name {
            if &row.function_name != name {
                return false;
            }
        }
        if let Some(decision) = self.decision {
            if row.execution_decision != decision {
                return false;
            }
        }
        if let Some(since) = self.since {
            if row.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if row.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// Reads `adri_assessment_logs.jsonl` line-by-line so a partially
/// written tail (a concurrent writer mid-append) never aborts the
/// whole read — each line is parsed independently and malformed or
/// truncated trailing lines are simply skipped.
pub struct AuditQueryEngine {
    log_path: PathBuf,
}

impl AuditQueryEngine {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }

    pub fn query(&self, filter: &AuditQueryFilter) -> Result<Vec<AssessmentLogRow>> {
        if !self.log_path.is_file() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.log_path)?;
        let mut out = Vec::new();
        for line in contents.lines() {
            let Ok(row) = serde_json::from_str::<AssessmentLogRow>(line) else {
                continue;
            };
            if filter.matches(&row) {
                out.push(row);
            }
        }
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    pub fn export(&self, filter: &AuditQueryFilter, format: ExportFormat, dest: &Path) -> Result<()> {
        let rows = self.query(filter)?;
        let rendered = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&rows)?,
            ExportFormat::Csv => rows_to_csv(&rows),
        };
        std::fs::write(dest, rendered)?;
        Ok(())
    }
}

fn rows_to_csv(rows: &[AssessmentLogRow]) -> String {
    let mut out = String::from(
        "timestamp,assessment_id,overall_score,passed,standard_id,function_name,data_row_count,assessment_duration_ms,execution_decision\n",
    );
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{:?}\n",
            row.timestamp.to_rfc3339(),
            row.assessment_id,
            row.overall_score,
            row.passed,
            row.standard_id,
            row.function_name,
            row.data_row_count,
            row.assessment_duration_ms,
            row.execution_decision,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::logger::AuditLogger;

    fn row(function_name: &str, decision: ExecutionDecision) -> AssessmentLogRow {
        AssessmentLogRow {
            timestamp: Utc::now(),
            assessment_id: "a1".to_string(),
            overall_score: 90.0,
            passed: true,
            standard_id: "std".to_string(),
            function_name: function_name.to_string(),
            data_row_count: 3,
            assessment_duration_ms: 5,
            execution_decision: decision,
        }
    }

    #[test]
    fn filters_by_function_name() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(tmp.path()).unwrap();
        logger.log_assessment(&row("alpha", ExecutionDecision::Allowed), &[], &[]).unwrap();
        logger.log_assessment(&row("beta", ExecutionDecision::Blocked), &[], &[]).unwrap();

        let engine = AuditQueryEngine::new(tmp.path().join("adri_assessment_logs.jsonl"));
        let results = engine
            .query(&AuditQueryFilter::new().with_function_name("beta"))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].function_name, "beta");
    }

    #[test]
    fn missing_log_file_returns_empty() {
        let engine = AuditQueryEngine::new("/nonexistent/path/adri_assessment_logs.jsonl");
        assert!(engine.query(&AuditQueryFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn malformed_trailing_line_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("adri_assessment_logs.jsonl");
        let logger = AuditLogger::new(tmp.path()).unwrap();
        logger.log_assessment(&row("alpha", ExecutionDecision::Allowed), &[], &[]).unwrap();
        use std::io::Write;
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"{\"truncated\":").unwrap();

        let engine = AuditQueryEngine::new(path);
        let results = engine.query(&AuditQueryFilter::new()).unwrap();
        assert_eq!(results.len(), 1);
    }
}
