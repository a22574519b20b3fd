//! The standard/assessment data model: serde-mapped onto the YAML
//! standard format and the JSON wire shapes used for audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The five scoring dimensions, in the fixed order they are summed.
pub const DIMENSIONS: [&str; 5] = [
    "validity",
    "completeness",
    "consistency",
    "freshness",
    "plausibility",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
        }
    }
}

/// A single field's type tag plus any subset of active constraints.
/// `Option<T>` fields that are `None` mean "no constraint" rather than
/// "constraint with a null value".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<crate::value::Cell>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_datetime: Option<String>,
}

impl FieldRule {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            nullable: false,
            allowed_values: None,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            pattern: None,
            after_date: None,
            before_date: None,
            after_datetime: None,
            before_datetime: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleWeights {
    #[serde(default)]
    pub rule_weights: HashMap<String, f64>,
    #[serde(default)]
    pub field_overrides: HashMap<String, HashMap<String, f64>>,
}

impl RuleWeights {
    /// Weight for `rule` on `field`, falling back to the dimension-wide
    /// weight, then to zero (an unweighted rule never contributes).
    pub fn weight_for(&self, field: &str, rule: &str) -> f64 {
        self.field_overrides
            .get(field)
            .and_then(|overrides| overrides.get(rule))
            .or_else(|| self.rule_weights.get(rule))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionConfig {
    pub minimum_score: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub scoring: RuleWeights,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            minimum_score: 0.0,
            weight: 1.0,
            scoring: RuleWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordIdentification {
    pub primary_key_fields: Vec<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardMetadataHeader {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    pub overall_minimum: f64,
    #[serde(default)]
    pub field_requirements: HashMap<String, FieldRule>,
    #[serde(default)]
    pub dimension_requirements: HashMap<String, DimensionConfig>,
}

/// An assembled YAML standard document: the contract describing the
/// expected shape and quality of a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standard {
    pub standards: StandardMetadataHeader,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_identification: Option<RecordIdentification>,
    pub requirements: Requirements,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Standard {
    pub fn field_requirements(&self) -> &HashMap<String, FieldRule> {
        &self.requirements.field_requirements
    }

    pub fn primary_key_fields(&self) -> &[String] {
        self.record_identification
            .as_ref()
            .map(|r| r.primary_key_fields.as_slice())
            .unwrap_or(&[])
    }

    pub fn dimension_config(&self, dimension: &str) -> DimensionConfig {
        self.requirements
            .dimension_requirements
            .get(dimension)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleExecutionLogEntry {
    pub dimension: String,
    pub rule: String,
    pub field: Option<String>,
    pub pass_count: usize,
    pub fail_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedValidation {
    pub assessment_id: String,
    pub field_name: String,
    pub issue_type: String,
    pub affected_rows: usize,
    pub affected_percentage: f64,
    pub sample_failures: Vec<String>,
    pub remediation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldAnalysis {
    pub field_name: String,
    pub present_in_data: bool,
    pub present_in_standard: bool,
}

/// The outcome of scoring a dataset against a standard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub overall_score: f64,
    pub passed: bool,
    pub standard_id: String,
    pub assessment_date: DateTime<Utc>,
    pub dimension_scores: HashMap<String, DimensionScore>,
    pub rule_execution_log: Vec<RuleExecutionLogEntry>,
    pub field_analysis: Vec<FieldAnalysis>,
    pub failed_validations: Vec<FailedValidation>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl AssessmentResult {
    pub fn dimension_score(&self, dimension: &str) -> Option<f64> {
        self.dimension_scores.get(dimension).map(|d| d.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_for_prefers_field_override() {
        let mut w = RuleWeights::default();
        w.rule_weights.insert("type".into(), 0.3);
        w.field_overrides
            .entry("age".into())
            .or_default()
            .insert("type".into(), 0.9);
        assert_eq!(w.weight_for("age", "type"), 0.9);
        assert_eq!(w.weight_for("name", "type"), 0.3);
        assert_eq!(w.weight_for("name", "unknown_rule"), 0.0);
    }
}
