//! Summary statistics and pattern detection over a dataset.
//!
//! Advisory only — results feed inference and the generator's
//! explanations, but the validation engine never consults them.

use crate::types::FieldType;
use crate::value::{Cell, TabularView};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
});
static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9().\s-]{6,}[0-9]$").unwrap());
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    pub distinct_count: usize,
    pub distinct_percentage: f64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub iqr_outlier_count: Option<usize>,
    pub min_length: Option<usize>,
    pub avg_length: Option<f64>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternInfo {
    pub pattern_type: String,
    pub match_count: usize,
    pub match_percentage: f64,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column_name: String,
    pub declared_type: FieldType,
    pub statistics: ColumnStatistics,
    pub patterns: Vec<PatternInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub overall_completeness: f64,
    pub fields_with_nulls: Vec<String>,
    pub completely_null_fields: Vec<String>,
    pub duplicate_row_count: usize,
    pub potential_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResult {
    pub row_count: usize,
    pub column_count: usize,
    pub type_histogram: std::collections::HashMap<String, usize>,
    pub memory_estimate_bytes: usize,
    pub completeness_ratio: f64,
    pub column_profiles: Vec<ColumnProfile>,
    pub quality_assessment: QualityAssessment,
    pub recommendations: Vec<String>,
}

/// Profiles a [`TabularView`], optionally capping the number of rows it
/// reads.
pub struct DataProfiler {
    max_rows: Option<usize>,
    pattern_sample_limit: usize,
}

impl Default for DataProfiler {
    fn default() -> Self {
        Self {
            max_rows: None,
            pattern_sample_limit: 3,
        }
    }
}

impl DataProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows: Some(max_rows),
            ..Self::default()
        }
    }

    pub fn profile(&self, data: &dyn TabularView) -> ProfileResult {
        let row_count = self
            .max_rows
            .map(|cap| data.row_count().min(cap))
            .unwrap_or_else(|| data.row_count());

        // Columns are independent, so per-column profiling fans out across
        // threads via `par_iter`; collecting from an indexed slice preserves
        // column order, keeping the result deterministic across runs.
        let names = data.column_names();
        let column_profiles: Vec<ColumnProfile> = names
            .par_iter()
            .map(|name| {
                let cells = data.column(*name).unwrap_or(&[]);
                let cells = &cells[..cells.len().min(row_count)];
                self.profile_column(*name, cells)
            })
            .collect();

        let mut type_histogram = std::collections::HashMap::new();
        let mut fields_with_nulls = Vec::new();
        let mut completely_null_fields = Vec::new();
        let mut completeness_sum = 0.0;

        for profile in &column_profiles {
            if profile.statistics.null_count > 0 {
                fields_with_nulls.push(profile.column_name.clone());
            }
            if profile.statistics.null_count == profile.statistics.count && profile.statistics.count > 0 {
                completely_null_fields.push(profile.column_name.clone());
            }
            completeness_sum += 1.0 - profile.statistics.null_percentage / 100.0;
            *type_histogram.entry(profile.declared_type.as_str().to_string()).or_insert(0) += 1;
        }

        let column_count = column_profiles.len();
        let completeness_ratio = if column_count > 0 {
            completeness_sum / column_count as f64
        } else {
            1.0
        };
        let duplicate_row_count = count_duplicate_rows(data, row_count);

        let mut potential_issues = Vec::new();
        if !completely_null_fields.is_empty() {
            potential_issues.push(format!(
                "{} field(s) are entirely null: {}",
                completely_null_fields.len(),
                completely_null_fields.join(", ")
            ));
        }
        if duplicate_row_count > 0 {
            potential_issues.push(format!("{duplicate_row_count} duplicate row(s) detected"));
        }

        let recommendations = recommendations_for(&column_profiles, &potential_issues);

        ProfileResult {
            row_count,
            column_count,
            type_histogram,
            memory_estimate_bytes: estimate_memory(&column_profiles),
            completeness_ratio,
            column_profiles,
            quality_assessment: QualityAssessment {
                overall_completeness: completeness_ratio,
                fields_with_nulls,
                completely_null_fields,
                duplicate_row_count,
                potential_issues,
            },
            recommendations,
        }
    }

    fn profile_column(&self, name: &str, cells: &[Cell]) -> ColumnProfile {
        let count = cells.len();
        let null_count = cells.iter().filter(|c| c.is_null()).count();
        let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();

        let mut distinct = std::collections::HashSet::new();
        for c in &non_null {
            distinct.insert(c.render());
        }

        let numeric: Vec<f64> = non_null.iter().filter_map(|c| c.as_f64()).collect();
        let (min_value, max_value, mean, median, iqr_outlier_count) = if !numeric.is_empty()
            && numeric.len() == non_null.len()
        {
            numeric_stats(&numeric)
        } else {
            (None, None, None, None, None)
        };

        let is_textual = !non_null.is_empty() && numeric.len() != non_null.len();
        let (min_length, avg_length, max_length) = if is_textual {
            let lens: Vec<usize> = non_null.iter().map(|c| c.render().chars().count()).collect();
            let total: usize = lens.iter().sum();
            (
                lens.iter().copied().min(),
                Some(total as f64 / lens.len() as f64),
                lens.iter().copied().max(),
            )
        } else {
            (None, None, None)
        };

        let declared_type = if numeric.len() == non_null.len() && !non_null.is_empty() {
            if numeric.iter().all(|v| v.fract() == 0.0) {
                FieldType::Integer
            } else {
                FieldType::Float
            }
        } else if non_null.iter().all(|c| matches!(c, Cell::Bool(_))) && !non_null.is_empty() {
            FieldType::Boolean
        } else if !non_null.is_empty() && non_null.iter().all(|c| c.as_date().is_some()) {
            FieldType::Date
        } else {
            FieldType::String
        };

        let patterns = if is_textual {
            self.detect_patterns(&non_null)
        } else {
            Vec::new()
        };

        ColumnProfile {
            column_name: name.to_string(),
            declared_type,
            statistics: ColumnStatistics {
                count,
                null_count,
                null_percentage: pct(null_count, count),
                distinct_count: distinct.len(),
                distinct_percentage: pct(distinct.len(), count),
                min_value,
                max_value,
                mean,
                median,
                iqr_outlier_count,
                min_length,
                avg_length,
                max_length,
            },
            patterns,
        }
    }

    fn detect_patterns(&self, values: &[&Cell]) -> Vec<PatternInfo> {
        let mut out = Vec::new();
        for (label, re) in [
            ("email", &*EMAIL_PATTERN),
            ("phone", &*PHONE_PATTERN),
            ("date", &*DATE_PATTERN),
        ] {
            let matches: Vec<&&Cell> = values.iter().filter(|c| re.is_match(&c.render())).collect();
            if matches.is_empty() {
                continue;
            }
            out.push(PatternInfo {
                pattern_type: label.to_string(),
                match_count: matches.len(),
                match_percentage: pct(matches.len(), values.len()),
                examples: matches
                    .iter()
                    .take(self.pattern_sample_limit)
                    .map(|c| c.render())
                    .collect(),
            });
        }
        out
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn numeric_stats(values: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>, Option<usize>) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let min = sorted.first().copied();
    let max = sorted.last().copied();
    let mean = Some(sorted.iter().sum::<f64>() / sorted.len() as f64);
    let median = Some(quantile(&sorted, 0.5));
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    let outliers = sorted.iter().filter(|v| **v < lower || **v > upper).count();
    (min, max, mean, median, Some(outliers))
}

/// Linear-interpolation quantile over an already-sorted slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = pos - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

fn count_duplicate_rows(data: &dyn TabularView, row_count: usize) -> usize {
    let names = data.column_names();
    if names.is_empty() || row_count == 0 {
        return 0;
    }
    let columns: Vec<&[Cell]> = names.iter().filter_map(|n| data.column(n)).collect();
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = 0;
    for row in 0..row_count {
        let key: Vec<String> = columns
            .iter()
            .map(|col| col.get(row).map(|c| c.render()).unwrap_or_default())
            .collect();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }
    duplicates
}

fn estimate_memory(profiles: &[ColumnProfile]) -> usize {
    profiles
        .iter()
        .map(|p| {
            let per_cell = match p.declared_type {
                FieldType::Integer | FieldType::Float | FieldType::Boolean => 8,
                FieldType::Date => 4,
                FieldType::Datetime => 12,
                FieldType::String => p.statistics.avg_length.unwrap_or(16.0) as usize,
            };
            per_cell * p.statistics.count
        })
        .sum()
}

fn recommendations_for(profiles: &[ColumnProfile], issues: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for p in profiles {
        if p.statistics.null_percentage > 50.0 {
            out.push(format!(
                "column '{}' is more than half null ({:.1}%) — consider whether it should be nullable or dropped",
                p.column_name, p.statistics.null_percentage
            ));
        }
        if let Some(outliers) = p.statistics.iqr_outlier_count {
            if outliers > 0 {
                out.push(format!(
                    "column '{}' has {} IQR outlier(s) — review numeric range bounds",
                    p.column_name, outliers
                ));
            }
        }
    }
    if !issues.is_empty() {
        out.push("resolve the issues above before generating a standard from this sample".to_string());
    }
    out
}
