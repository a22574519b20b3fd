//! Individual rule predicates. Each function is a pure `(cell, rule) ->
//! bool` (or takes a precompiled [`regex::Regex`] where recompiling per
//! call would be wasteful); none of them ever panics or propagates an
//! error — an unparseable value is simply a failing check, counted
//! against the relevant rule rather than raised.

use crate::types::{FieldRule, FieldType};
use crate::value::Cell;
use regex::Regex;

/// `type`: the cell's runtime type is compatible with the rule's tag.
/// `string` is the universal acceptor — every cell renders to a string,
/// and the training-pass enforcer relies on coercing a field to `string`
/// to resolve any type failure.
pub fn check_type(cell: &Cell, rule: &FieldRule) -> bool {
    match rule.field_type {
        FieldType::String => true,
        FieldType::Integer => matches!(cell, Cell::Integer(_)),
        FieldType::Float => matches!(cell, Cell::Integer(_) | Cell::Float(_)),
        FieldType::Boolean => matches!(cell, Cell::Bool(_)),
        FieldType::Date => cell.as_date().is_some(),
        FieldType::Datetime => cell.as_datetime().is_some(),
    }
}

/// `nullable`: a null value passes iff `nullable = true`. Non-null
/// values always pass this check — it only gates nulls.
pub fn check_nullable(cell: &Cell, rule: &FieldRule) -> bool {
    if cell.is_null() {
        rule.nullable
    } else {
        true
    }
}

/// `allowed_values`: skipped (passes) when the rule has no enum. Text
/// comparison is case-sensitive; numeric comparison coerces int/float.
pub fn check_allowed_values(cell: &Cell, rule: &FieldRule) -> bool {
    match &rule.allowed_values {
        None => true,
        Some(values) => values.iter().any(|v| v.canonical_eq(cell)),
    }
}

/// `min_value`/`max_value`: closed interval over numeric coercion. NaN
/// (or anything that fails to coerce) fails whenever a bound is active.
pub fn check_numeric_bounds(cell: &Cell, rule: &FieldRule) -> bool {
    if rule.min_value.is_none() && rule.max_value.is_none() {
        return true;
    }
    let Some(v) = cell.as_f64() else { return false };
    if let Some(min) = rule.min_value {
        if v < min {
            return false;
        }
    }
    if let Some(max) = rule.max_value {
        if v > max {
            return false;
        }
    }
    true
}

/// `min_length`/`max_length`: measured on the rendered string form, in
/// code points.
pub fn check_length_bounds(cell: &Cell, rule: &FieldRule) -> bool {
    if rule.min_length.is_none() && rule.max_length.is_none() {
        return true;
    }
    let len = cell.render().chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return false;
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return false;
        }
    }
    true
}

/// Compiles `rule.pattern` as a full-match regex. `pattern` is treated
/// as a full-match semantic: the stored pattern is anchored on both
/// ends regardless of whether the author already anchored it.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    let trimmed_start = pattern.strip_prefix('^').unwrap_or(pattern);
    let trimmed = trimmed_start.strip_suffix('$').unwrap_or(trimmed_start);
    Regex::new(&format!("^(?:{trimmed})$")).ok()
}

/// `pattern`: skipped (passes) when the rule has no pattern, or when
/// the pattern fails to compile (treated as an inert rule rather than a
/// hard error — parse errors on the *standard* are fatal elsewhere, but
/// a malformed per-field regex should not crash scoring).
pub fn check_pattern(cell: &Cell, rule: &FieldRule) -> bool {
    match &rule.pattern {
        None => true,
        Some(pattern) => match compile_pattern(pattern) {
            Some(re) => check_pattern_with(&re, cell),
            None => true,
        },
    }
}

pub fn check_pattern_with(regex: &Regex, cell: &Cell) -> bool {
    regex.is_match(&cell.render())
}

/// `date`/`datetime` window: value parsed as date/datetime must satisfy
/// `after <= v <= before` for whichever bounds are present.
pub fn check_date_bounds(cell: &Cell, rule: &FieldRule) -> bool {
    match rule.field_type {
        FieldType::Date => {
            if rule.after_date.is_none() && rule.before_date.is_none() {
                return true;
            }
            let Some(v) = cell.as_date() else { return false };
            if let Some(after) = rule.after_date.as_deref().and_then(parse_date) {
                if v < after {
                    return false;
                }
            }
            if let Some(before) = rule.before_date.as_deref().and_then(parse_date) {
                if v > before {
                    return false;
                }
            }
            true
        }
        FieldType::Datetime => {
            if rule.after_datetime.is_none() && rule.before_datetime.is_none() {
                return true;
            }
            let Some(v) = cell.as_datetime() else { return false };
            if let Some(after) = rule.after_datetime.as_deref().and_then(parse_datetime) {
                if v < after {
                    return false;
                }
            }
            if let Some(before) = rule.before_datetime.as_deref().and_then(parse_datetime) {
                if v > before {
                    return false;
                }
            }
            true
        }
        _ => true,
    }
}

fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
