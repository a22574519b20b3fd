//! In-process assessment cache keyed by `standard-identity:data-fingerprint`.
//! A `dashmap::DashMap` gives sharded locking with the TTL checked at
//! read time, without a single global lock.

use crate::types::AssessmentResult;
use dashmap::DashMap;
use std::time::Instant;

pub struct AssessmentCache {
    entries: DashMap<String, (AssessmentResult, Instant)>,
}

impl Default for AssessmentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns a cached result if present and younger than `ttl_hours`.
    /// A TTL of 0 (or negative) disables caching entirely.
    pub fn get(&self, key: &str, ttl_hours: f64) -> Option<AssessmentResult> {
        if ttl_hours <= 0.0 {
            return None;
        }
        let entry = self.entries.get(key)?;
        let (result, inserted_at) = entry.value();
        if inserted_at.elapsed().as_secs_f64() <= ttl_hours * 3600.0 {
            tracing::debug!(key, "assessment cache hit");
            Some(result.clone())
        } else {
            tracing::debug!(key, "assessment cache entry expired");
            None
        }
    }

    pub fn put(&self, key: String, result: AssessmentResult) {
        self.entries.insert(key, (result, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derives a short stable fingerprint over a dataset's shape and
/// contents. Unlike the reference implementation (which falls back to a
/// timestamp if hashing fails), this hash is over already-typed,
/// in-memory values and cannot fail.
pub fn fingerprint(data: &dyn crate::value::TabularView) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data.row_count().to_le_bytes());
    for name in data.column_names() {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        if let Some(cells) = data.column(name) {
            for cell in cells {
                hasher.update(cell.render().as_bytes());
                hasher.update([0u8]);
            }
        }
    }
    let digest = hasher.finalize();
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut out = String::with_capacity(chars);
    for byte in bytes {
        if out.len() >= chars {
            break;
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out.truncate(chars);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AssessmentResult, DimensionScore};
    use crate::value::{Cell, Column, Dataset};
    use std::collections::HashMap;

    fn dummy_result(score: f64) -> AssessmentResult {
        AssessmentResult {
            overall_score: score,
            passed: true,
            standard_id: "s".to_string(),
            assessment_date: chrono::Utc::now(),
            dimension_scores: HashMap::new(),
            rule_execution_log: Vec::new(),
            field_analysis: Vec::new(),
            failed_validations: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = AssessmentCache::new();
        cache.put("k".to_string(), dummy_result(90.0));
        assert!(cache.get("k", 0.0).is_none());
    }

    #[test]
    fn fresh_entry_is_reused() {
        let cache = AssessmentCache::new();
        cache.put("k".to_string(), dummy_result(90.0));
        assert!(cache.get("k", 1.0).is_some());
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let data = Dataset::new(vec![Column::new("a", vec![Cell::Integer(1), Cell::Integer(2)])]);
        assert_eq!(fingerprint(&data), fingerprint(&data));
    }

    #[test]
    fn fingerprint_differs_on_content_change() {
        let a = Dataset::new(vec![Column::new("a", vec![Cell::Integer(1)])]);
        let b = Dataset::new(vec![Column::new("a", vec![Cell::Integer(2)])]);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
