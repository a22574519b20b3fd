//! Append-only JSONL audit files, rendered synchronously: protection is
//! a plain blocking call, so there is no async runtime to hang a
//! buffered writer off of. Each of the three files is guarded by its
//! own `parking_lot::Mutex<File>`, opened once in append mode; a write
//! under the lock is one `write_all` of a newline-terminated JSON line,
//! keeping each line atomic even under concurrent writers.

use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const ASSESSMENT_LOG_FILE: &str = "adri_assessment_logs.jsonl";
const DIMENSION_LOG_FILE: &str = "adri_dimension_scores.jsonl";
const FAILED_VALIDATION_LOG_FILE: &str = "adri_failed_validations.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionDecision {
    Allowed,
    Blocked,
    WarnContinue,
    ContinueSilent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentLogRow {
    pub timestamp: DateTime<Utc>,
    pub assessment_id: String,
    pub overall_score: f64,
    pub passed: bool,
    pub standard_id: String,
    pub function_name: String,
    pub data_row_count: usize,
    pub assessment_duration_ms: u64,
    pub execution_decision: ExecutionDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScoreRow {
    pub assessment_id: String,
    pub timestamp: DateTime<Utc>,
    pub dimension: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedValidationRow {
    pub assessment_id: String,
    pub timestamp: DateTime<Utc>,
    pub field_name: String,
    pub issue_type: String,
    pub affected_rows: usize,
    pub affected_percentage: f64,
    pub sample_failures: Vec<String>,
    pub remediation: String,
}

/// Append-only JSONL sink for the three audit record kinds. Safe to
/// share across threads (`Arc<AuditLogger>`): each file has its own
/// lock, so writers to the assessment log never block writers to the
/// dimension log.
pub struct AuditLogger {
    assessment_file: Mutex<File>,
    dimension_file: Mutex<File>,
    failed_validation_file: Mutex<File>,
}

impl AuditLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            assessment_file: Mutex::new(open_append(&dir.join(ASSESSMENT_LOG_FILE))?),
            dimension_file: Mutex::new(open_append(&dir.join(DIMENSION_LOG_FILE))?),
            failed_validation_file: Mutex::new(open_append(&dir.join(FAILED_VALIDATION_LOG_FILE))?),
        })
    }

    /// Logs one assessment row, its per-dimension rows, and any failed
    /// validations, in that order. Dimension rows for the same
    /// assessment are written while holding a single lock acquisition
    /// so they land on disk as a contiguous block.
    pub fn log_assessment(
        &self,
        assessment: &AssessmentLogRow,
        dimensions: &[DimensionScoreRow],
        failed_validations: &[FailedValidationRow],
    ) -> Result<()> {
        write_line(&self.assessment_file, assessment)?;

        {
            let mut file = self.dimension_file.lock();
            for row in dimensions {
                write_line_locked(&mut file, row)?;
            }
        }

        {
            let mut file = self.failed_validation_file.lock();
            for row in failed_validations {
                write_line_locked(&mut file, row)?;
            }
        }

        Ok(())
    }
}

fn open_append(path: &PathBuf) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

fn write_line<T: Serialize>(file: &Mutex<File>, row: &T) -> Result<()> {
    let mut guard = file.lock();
    write_line_locked(&mut guard, row)
}

fn write_line_locked<T: Serialize>(file: &mut File, row: &T) -> Result<()> {
    let mut line = serde_json::to_string(row)?;
    line.push('\n');
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_assessment() -> AssessmentLogRow {
        AssessmentLogRow {
            timestamp: Utc::now(),
            assessment_id: "a1".to_string(),
            overall_score: 90.0,
            passed: true,
            standard_id: "std".to_string(),
            function_name: "process_orders".to_string(),
            data_row_count: 3,
            assessment_duration_ms: 5,
            execution_decision: ExecutionDecision::Allowed,
        }
    }

    #[test]
    fn writes_one_line_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(tmp.path()).unwrap();
        logger.log_assessment(&sample_assessment(), &[], &[]).unwrap();

        let contents = std::fs::read_to_string(tmp.path().join(ASSESSMENT_LOG_FILE)).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let parsed: AssessmentLogRow = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.assessment_id, "a1");
    }

    #[test]
    fn dimension_rows_append_together() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(tmp.path()).unwrap();
        let dims = vec![
            DimensionScoreRow {
                assessment_id: "a1".to_string(),
                timestamp: Utc::now(),
                dimension: "validity".to_string(),
                score: 18.0,
            },
            DimensionScoreRow {
                assessment_id: "a1".to_string(),
                timestamp: Utc::now(),
                dimension: "completeness".to_string(),
                score: 20.0,
            },
        ];
        logger.log_assessment(&sample_assessment(), &dims, &[]).unwrap();

        let contents = std::fs::read_to_string(tmp.path().join(DIMENSION_LOG_FILE)).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn concurrent_writers_never_interleave_a_line() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = std::sync::Arc::new(AuditLogger::new(tmp.path()).unwrap());
        let mut handles = Vec::new();
        for i in 0..8 {
            let logger = std::sync::Arc::clone(&logger);
            handles.push(std::thread::spawn(move || {
                let mut row = sample_assessment();
                row.assessment_id = format!("a{i}");
                logger.log_assessment(&row, &[], &[]).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let contents = std::fs::read_to_string(tmp.path().join(ASSESSMENT_LOG_FILE)).unwrap();
        assert_eq!(contents.lines().count(), 8);
        for line in contents.lines() {
            let parsed: std::result::Result<AssessmentLogRow, _> = serde_json::from_str(line);
            assert!(parsed.is_ok(), "line was not valid standalone JSON: {line}");
        }
    }
}
