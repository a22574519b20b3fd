//! Tabular value model and the `TabularView` seam.
//!
//! Cell values are a closed sum type rather than a dynamically-typed
//! scalar. `Dataset` is the in-memory reference implementation of
//! `TabularView`; other hosts (Arrow, Polars, a DB cursor) can
//! implement the trait directly instead of materializing a `Dataset`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single cell value. `date`/`datetime` carry already-parsed values;
/// text that merely *looks* like a date is still `Text` until a rule
/// checker parses it (see [`crate::rules::checkers`]).
///
/// Serialized as a plain scalar rather than an externally-tagged enum,
/// so that a hand-written YAML standard can write
/// `allowed_values: [active, inactive]` instead of a tagged form.
/// `Date`/`DateTime` round-trip through their rendered string form —
/// parsing text back into a typed date is the rule checkers' job, not
/// deserialization's.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Integer(i) => serializer.serialize_i64(*i),
            Cell::Float(f) => serializer.serialize_f64(*f),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Date(_) | Cell::DateTime(_) => serializer.serialize_str(&self.render()),
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a null, bool, number, or string cell value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Cell, E> {
        Ok(Cell::Null)
    }
    fn visit_none<E: de::Error>(self) -> std::result::Result<Cell, E> {
        Ok(Cell::Null)
    }
    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Cell, E> {
        Ok(Cell::Bool(v))
    }
    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Cell, E> {
        Ok(Cell::Integer(v))
    }
    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Cell, E> {
        Ok(Cell::Integer(v as i64))
    }
    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Cell, E> {
        Ok(Cell::Float(v))
    }
    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Cell, E> {
        Ok(Cell::Text(v.to_string()))
    }
    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Cell, E> {
        Ok(Cell::Text(v))
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Cell, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Rendered string form used for length/pattern checks. Bytes are
    /// never measured directly; callers measure `.chars().count()`.
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.0}")
                } else {
                    f.to_string()
                }
            }
            Cell::Text(s) => s.clone(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::DateTime(dt) => dt.to_rfc3339(),
        }
    }

    /// Numeric coercion used by range/bound checkers. NaN never results
    /// from a successful coercion; failed coercions return `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) if f.is_finite() => Some(*f),
            Cell::Float(_) => None,
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::DateTime(dt) => Some(dt.naive_utc().date()),
            Cell::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(s.trim())
                        .ok()
                        .map(|dt| dt.naive_utc().date())
                }),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Date(d) => Some(DateTime::<Utc>::from_naive_utc_and_offset(
                d.and_hms_opt(0, 0, 0)?,
                Utc,
            )),
            Cell::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Canonical comparison used by `allowed_values` — case-sensitive for
    /// text, numeric equality for numbers (int/float compared as f64).
    pub fn canonical_eq(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Integer(_) | Cell::Float(_), Cell::Integer(_) | Cell::Float(_)) => {
                matches!((self.as_f64(), other.as_f64()), (Some(a), Some(b)) if a == b)
            }
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Null, Cell::Null) => true,
            _ => self == other,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A single named column of cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }
}

/// Read-only capability over a dataset, independent of how it is stored.
/// This is the seam that lets the core crate depend on a trait rather
/// than any particular dataframe implementation.
///
/// `Sync` is a supertrait rather than an incidental bound: the profiler
/// fans out per-column work across threads (see
/// [`crate::profiler::DataProfiler`]), so any host-provided view must be
/// safely shareable across them.
pub trait TabularView: Sync {
    fn column_names(&self) -> Vec<&str>;
    fn row_count(&self) -> usize;
    fn column(&self, name: &str) -> Option<&[Cell]>;

    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// In-memory reference implementation of [`TabularView`]: an ordered
/// sequence of named columns, each a lazy-in-spirit (materialized here)
/// sequence of cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Dataset truncated to its first `n` rows, preserving column order.
    /// Used by the profiler's `max_rows` cap and by protection's
    /// auto-generation sampling limit.
    pub fn head(&self, n: usize) -> Dataset {
        Dataset::new(
            self.columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.cells.iter().take(n).cloned().collect()))
                .collect(),
        )
    }
}

impl TabularView for Dataset {
    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn row_count(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_slice())
    }
}
