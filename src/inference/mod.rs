//! Per-field rule synthesis from a profiled column.
//!
//! `InferenceConfig` gathers the tunable thresholds (enum coverage,
//! range margins, quantile cutoffs) in one place rather than scattering
//! magic numbers through the inference functions below.

use crate::profiler::quantile;
use crate::types::{FieldRule, FieldType};
use crate::value::Cell;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(EMAIL_PATTERN).unwrap());

const ID_LIKE_TOKENS: [&str; 7] = ["id", "key", "code", "number", "num", "uuid", "guid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStrategy {
    Span,
    Iqr,
    Quantile,
    Mad,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub enum_min_coverage: f64,
    pub enum_max_unique: usize,
    pub enum_top_k: usize,
    pub range_margin_pct: f64,
    pub iqr_k: f64,
    pub quantile_low: f64,
    pub quantile_high: f64,
    pub mad_k: f64,
    pub date_margin_days: i64,
    pub max_pk_combo_size: usize,
    pub range_strategy: RangeStrategy,
    pub length_widen_fraction: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enum_min_coverage: 0.95,
            enum_max_unique: 30,
            enum_top_k: 10,
            range_margin_pct: 0.10,
            iqr_k: 1.5,
            quantile_low: 0.005,
            quantile_high: 0.995,
            mad_k: 3.0,
            date_margin_days: 3,
            max_pk_combo_size: 2,
            range_strategy: RangeStrategy::Span,
            length_widen_fraction: 0.0,
        }
    }
}

/// Name-based "id-like" heuristic shared by enum suppression and PK
/// detection: a case-insensitive substring match against a small token
/// set.
pub fn is_id_like(name: &str) -> bool {
    let lower = name.to_lowercase();
    ID_LIKE_TOKENS.iter().any(|t| lower.contains(t))
}

/// Infers the narrowest type tag the non-null cells of a column support.
pub fn infer_type_tag(cells: &[Cell]) -> FieldType {
    let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
    if non_null.is_empty() {
        return FieldType::String;
    }
    if non_null.iter().all(|c| matches!(c, Cell::Bool(_))) {
        return FieldType::Boolean;
    }
    if non_null.iter().all(|c| matches!(c, Cell::Integer(_))) {
        return FieldType::Integer;
    }
    if non_null
        .iter()
        .all(|c| matches!(c, Cell::Integer(_) | Cell::Float(_)))
    {
        return FieldType::Float;
    }
    if non_null.iter().all(|c| c.as_f64().is_some()) {
        return FieldType::Float;
    }
    if non_null.iter().all(|c| matches!(c, Cell::DateTime(_))) {
        return FieldType::Datetime;
    }
    if non_null.iter().all(|c| c.as_date().is_some()) {
        return FieldType::Date;
    }
    FieldType::String
}

pub fn infer_nullability(cells: &[Cell]) -> bool {
    cells.iter().any(|c| c.is_null())
}

/// Enum inference: only offered for `string`/`integer` columns that are
/// neither PK fields nor id-like by name.
pub fn infer_enum(
    name: &str,
    cells: &[Cell],
    field_type: FieldType,
    is_pk: bool,
    config: &InferenceConfig,
) -> Option<Vec<Cell>> {
    if is_pk || is_id_like(name) {
        return None;
    }
    if !matches!(field_type, FieldType::String | FieldType::Integer) {
        return None;
    }
    let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
    if non_null.is_empty() || cells.is_empty() {
        return None;
    }

    let mut counts: std::collections::HashMap<String, (Cell, usize)> = std::collections::HashMap::new();
    for c in &non_null {
        counts
            .entry(c.render())
            .or_insert_with(|| ((*c).clone(), 0))
            .1 += 1;
    }
    let distinct = counts.len();
    let coverage = non_null.len() as f64 / cells.len() as f64;

    // Coverage strategy: emit the full distinct set if it's small and
    // the column is mostly populated.
    if distinct <= config.enum_max_unique && coverage >= config.enum_min_coverage {
        return Some(counts.into_values().map(|(cell, _)| cell).collect());
    }

    // Tolerant strategy: walk by descending frequency until cumulative
    // coverage clears the bar.
    let mut ranked: Vec<(Cell, usize)> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let total = non_null.len();
    let mut accepted = Vec::new();
    let mut cumulative = 0usize;
    for (cell, count) in ranked {
        accepted.push(cell);
        cumulative += count;
        if cumulative as f64 / total as f64 >= config.enum_min_coverage {
            break;
        }
    }
    if accepted.len() <= config.enum_top_k && accepted.len() <= config.enum_max_unique {
        Some(accepted)
    } else {
        None
    }
}

/// Numeric range inference per the configured strategy. Bounds are
/// always outward-clamped to contain the observed min/max.
pub fn infer_numeric_range(cells: &[Cell], config: &InferenceConfig) -> (Option<f64>, Option<f64>) {
    let mut values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
    if values.is_empty() {
        return (None, None);
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let obs_min = values[0];
    let obs_max = values[values.len() - 1];

    let (lo, hi) = match config.range_strategy {
        RangeStrategy::Span => span_bounds(obs_min, obs_max, config.range_margin_pct),
        RangeStrategy::Iqr => {
            let q1 = quantile(&values, 0.25);
            let q3 = quantile(&values, 0.75);
            let iqr = q3 - q1;
            if iqr == 0.0 {
                span_bounds(obs_min, obs_max, config.range_margin_pct)
            } else {
                (q1 - config.iqr_k * iqr, q3 + config.iqr_k * iqr)
            }
        }
        RangeStrategy::Quantile => (
            quantile(&values, config.quantile_low),
            quantile(&values, config.quantile_high),
        ),
        RangeStrategy::Mad => {
            let median = quantile(&values, 0.5);
            let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
            let mut sorted_dev = deviations.clone();
            sorted_dev.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mad = quantile(&sorted_dev, 0.5);
            (median - config.mad_k * mad, median + config.mad_k * mad)
        }
    };

    // Outward clamp: training-pass guarantee.
    (Some(lo.min(obs_min)), Some(hi.max(obs_max)))
}

fn span_bounds(min: f64, max: f64, margin_pct: f64) -> (f64, f64) {
    let range = max - min;
    let margin = if range > 0.0 {
        range * margin_pct
    } else if min != 0.0 {
        min.abs() * margin_pct
    } else {
        1.0
    };
    (min - margin, max + margin)
}

/// Length bounds: always the observed extremes, optionally widened.
pub fn infer_length_bounds(cells: &[Cell], config: &InferenceConfig) -> (Option<usize>, Option<usize>) {
    let lengths: Vec<usize> = cells
        .iter()
        .filter(|c| !c.is_null())
        .map(|c| c.render().chars().count())
        .collect();
    if lengths.is_empty() {
        return (None, None);
    }
    let min = *lengths.iter().min().unwrap();
    let max = *lengths.iter().max().unwrap();
    if config.length_widen_fraction <= 0.0 {
        return (Some(min), Some(max));
    }
    let widen = ((max - min) as f64 * config.length_widen_fraction).ceil() as usize;
    (Some(min.saturating_sub(widen)), Some(max + widen))
}

/// Regex inference: only the conservative e-mail pattern, and only when
/// it covers 100% of non-null values.
pub fn infer_pattern(cells: &[Cell]) -> Option<String> {
    let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
    if non_null.is_empty() {
        return None;
    }
    if non_null.iter().all(|c| EMAIL_REGEX.is_match(&c.render())) {
        Some(EMAIL_PATTERN.to_string())
    } else {
        None
    }
}

/// Date window inference: observed extremes widened by a fixed margin
/// in days, stored inclusively.
pub fn infer_date_window(cells: &[Cell], config: &InferenceConfig) -> (Option<String>, Option<String>) {
    let dates: Vec<chrono::NaiveDate> = cells.iter().filter_map(|c| c.as_date()).collect();
    if dates.is_empty() {
        return (None, None);
    }
    let min = *dates.iter().min().unwrap();
    let max = *dates.iter().max().unwrap();
    let margin = chrono::Duration::days(config.date_margin_days);
    (
        Some((min - margin).format("%Y-%m-%d").to_string()),
        Some((max + margin).format("%Y-%m-%d").to_string()),
    )
}

/// Assembles a full [`FieldRule`] for one column.
pub fn infer_field_rule(
    name: &str,
    cells: &[Cell],
    is_pk: bool,
    config: &InferenceConfig,
) -> FieldRule {
    let field_type = infer_type_tag(cells);
    let mut rule = FieldRule::new(field_type);
    rule.nullable = infer_nullability(cells);

    match field_type {
        FieldType::Integer | FieldType::Float => {
            rule.allowed_values = infer_enum(name, cells, field_type, is_pk, config);
            if rule.allowed_values.is_none() {
                let (min, max) = infer_numeric_range(cells, config);
                rule.min_value = min;
                rule.max_value = max;
            }
        }
        FieldType::String => {
            rule.allowed_values = infer_enum(name, cells, field_type, is_pk, config);
            if rule.allowed_values.is_none() {
                let (min_len, max_len) = infer_length_bounds(cells, config);
                rule.min_length = min_len;
                rule.max_length = max_len;
                rule.pattern = infer_pattern(cells);
            }
        }
        FieldType::Date => {
            let (after, before) = infer_date_window(cells, config);
            rule.after_date = after;
            rule.before_date = before;
        }
        FieldType::Datetime | FieldType::Boolean => {}
    }

    rule
}

/// Primary-key detection: id-like single column, then id-like
/// composites, then all-column composites, then the first column as a
/// last resort.
pub fn infer_primary_key(
    column_names: &[&str],
    columns: &[&[Cell]],
    row_count: usize,
    config: &InferenceConfig,
) -> Vec<String> {
    if column_names.is_empty() || row_count == 0 {
        return Vec::new();
    }

    let is_unique_non_null = |indices: &[usize]| -> bool {
        let mut seen = HashSet::new();
        for row in 0..row_count {
            let mut key = Vec::with_capacity(indices.len());
            for &idx in indices {
                let cell = columns[idx].get(row);
                match cell {
                    Some(c) if !c.is_null() => key.push(c.render()),
                    _ => return false,
                }
            }
            if !seen.insert(key) {
                return false;
            }
        }
        true
    };

    let id_like_indices: Vec<usize> = column_names
        .iter()
        .enumerate()
        .filter(|(_, n)| is_id_like(n))
        .map(|(i, _)| i)
        .collect();

    for &idx in &id_like_indices {
        if is_unique_non_null(&[idx]) {
            return vec![column_names[idx].to_string()];
        }
    }

    for combo in combinations(&id_like_indices, config.max_pk_combo_size) {
        if is_unique_non_null(&combo) {
            return combo.iter().map(|&i| column_names[i].to_string()).collect();
        }
    }

    let all_indices: Vec<usize> = (0..column_names.len()).collect();
    for combo in combinations(&all_indices, config.max_pk_combo_size) {
        if is_unique_non_null(&combo) {
            return combo.iter().map(|&i| column_names[i].to_string()).collect();
        }
    }

    vec![column_names[0].to_string()]
}

fn combinations(items: &[usize], max_size: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for size in 1..=max_size.min(items.len()) {
        combinations_of_size(items, size, 0, &mut Vec::new(), &mut out);
    }
    out
}

fn combinations_of_size(
    items: &[usize],
    size: usize,
    start: usize,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if current.len() == size {
        out.push(current.clone());
        return;
    }
    for i in start..items.len() {
        current.push(items[i]);
        combinations_of_size(items, size, i + 1, current, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_prefers_integer_over_float() {
        let cells = vec![Cell::Integer(1), Cell::Integer(2)];
        assert_eq!(infer_type_tag(&cells), FieldType::Integer);
    }

    #[test]
    fn nullability_true_iff_nulls_observed() {
        assert!(!infer_nullability(&[Cell::Integer(1)]));
        assert!(infer_nullability(&[Cell::Integer(1), Cell::Null]));
    }

    #[test]
    fn enum_suppressed_for_id_like_name() {
        let config = InferenceConfig::default();
        let cells = vec![Cell::Text("a".into()), Cell::Text("b".into())];
        assert!(infer_enum("user_id", &cells, FieldType::String, false, &config).is_none());
    }

    #[test]
    fn enum_emitted_for_small_high_coverage_set() {
        let config = InferenceConfig::default();
        let cells: Vec<Cell> = (0..20)
            .map(|i| Cell::Text(if i % 2 == 0 { "red".into() } else { "blue".into() }))
            .collect();
        let enums = infer_enum("color", &cells, FieldType::String, false, &config).unwrap();
        assert_eq!(enums.len(), 2);
    }

    #[test]
    fn numeric_range_contains_observed_extremes() {
        let config = InferenceConfig {
            range_strategy: RangeStrategy::Iqr,
            ..InferenceConfig::default()
        };
        let cells = vec![
            Cell::Integer(1),
            Cell::Integer(2),
            Cell::Integer(3),
            Cell::Integer(100),
        ];
        let (min, max) = infer_numeric_range(&cells, &config);
        assert!(min.unwrap() <= 1.0);
        assert!(max.unwrap() >= 100.0);
    }

    #[test]
    fn pattern_requires_full_coverage() {
        let all_emails = vec![Cell::Text("a@b.com".into()), Cell::Text("c@d.com".into())];
        assert!(infer_pattern(&all_emails).is_some());
        let mixed = vec![Cell::Text("a@b.com".into()), Cell::Text("not-an-email".into())];
        assert!(infer_pattern(&mixed).is_none());
    }

    #[test]
    fn primary_key_prefers_id_like_unique_column() {
        let ids = vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(3)];
        let names_vec = vec![Cell::Text("a".into()), Cell::Text("a".into()), Cell::Text("b".into())];
        let columns: Vec<&[Cell]> = vec![&ids, &names_vec];
        let pk = infer_primary_key(&["id", "name"], &columns, 3, &InferenceConfig::default());
        assert_eq!(pk, vec!["id".to_string()]);
    }

    #[test]
    fn primary_key_falls_back_to_first_column() {
        let a = vec![Cell::Integer(1), Cell::Integer(1)];
        let b = vec![Cell::Integer(1), Cell::Integer(1)];
        let columns: Vec<&[Cell]> = vec![&a, &b];
        let pk = infer_primary_key(&["a", "b"], &columns, 2, &InferenceConfig::default());
        assert_eq!(pk, vec!["a".to_string()]);
    }
}
