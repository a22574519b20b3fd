//! ADRI — Agent Data Readiness Index.
//!
//! A guard that sits in front of agent and pipeline entry points and
//! refuses to let poor-quality tabular data reach them. Callers define a
//! YAML standard (by hand, or generated from a known-good sample),
//! protection assesses incoming data against it, and the result is
//! either allowed through, warned on, or raised as an error depending on
//! the configured failure mode.

pub mod audit;
pub mod config;
pub mod error;
pub mod generator;
pub mod inference;
pub mod profiler;
pub mod protection;
pub mod rules;
pub mod standards;
pub mod types;
pub mod validation;
pub mod value;

pub use error::{AdriError, Result};
pub use protection::guard::Guard;
pub use protection::{ProtectOptions, ProtectionEngine};
pub use types::{AssessmentResult, FieldRule, FieldType, Standard};
pub use value::{Cell, Column, Dataset, TabularView};
