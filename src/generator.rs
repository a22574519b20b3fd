//! Standard Generator: profile + infer + assemble + enforce the
//! training-pass guarantee (a generated standard must always score its
//! own generating dataset as passing).

use crate::inference::{infer_field_rule, infer_primary_key, InferenceConfig};
use crate::profiler::DataProfiler;
use crate::rules::checkers::{
    check_allowed_values, check_length_bounds, check_numeric_bounds, check_pattern, check_type,
};
use crate::types::{
    DimensionConfig, FieldRule, FieldType, RecordIdentification, Requirements, RuleWeights,
    Standard, StandardMetadataHeader,
};
use crate::value::{Cell, TabularView};
use serde_json::json;
use std::collections::HashMap;

const TRAINING_PASS_MAX_PASSES: usize = 2;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub overall_minimum: f64,
    pub inference: InferenceConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            overall_minimum: 75.0,
            inference: InferenceConfig::default(),
        }
    }
}

pub struct StandardGenerator {
    config: GeneratorConfig,
}

impl StandardGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generates a self-consistent standard named `name` from `data`.
    /// Guarantees that `data` always scores as passing against the
    /// returned standard.
    pub fn generate(&self, name: &str, data: &dyn TabularView) -> Standard {
        let profile = DataProfiler::new().profile(data);
        let column_names: Vec<&str> = data.column_names();
        let columns: Vec<&[Cell]> = column_names
            .iter()
            .map(|n| data.column(n).unwrap_or(&[]))
            .collect();
        let row_count = data.row_count();

        let pk_fields = infer_primary_key(&column_names, &columns, row_count, &self.config.inference);
        let pk_set: std::collections::HashSet<&str> = pk_fields.iter().map(|s| s.as_str()).collect();

        let mut field_requirements = HashMap::new();
        let mut explanations = serde_json::Map::new();

        for (idx, field_name) in column_names.iter().enumerate() {
            let cells = columns[idx];
            let is_pk = pk_set.contains(*field_name);
            let mut rule = infer_field_rule(field_name, cells, is_pk, &self.config.inference);

            let mut adjustments = Vec::new();
            enforce_training_pass(&mut rule, cells, &mut adjustments);

            let col_profile = profile
                .column_profiles
                .iter()
                .find(|c| c.column_name == *field_name);
            explanations.insert(
                field_name.to_string(),
                json!({
                    "active_rule": format!("{:?}", rule.field_type),
                    "stats": {
                        "null_percentage": col_profile.map(|p| p.statistics.null_percentage).unwrap_or(0.0),
                        "distinct_count": col_profile.map(|p| p.statistics.distinct_count).unwrap_or(0),
                        "min_value": rule.min_value,
                        "max_value": rule.max_value,
                        "min_length": rule.min_length,
                        "max_length": rule.max_length,
                    },
                    "rationale": rationale_for(field_name, &rule, is_pk),
                    "adjustments": adjustments,
                }),
            );

            field_requirements.insert(field_name.to_string(), rule);
        }

        let dimension_requirements = default_dimension_requirements();

        Standard {
            standards: StandardMetadataHeader {
                id: format!("{name}_standard"),
                name: name.to_string(),
                version: "1.0.0".to_string(),
                authority: None,
                description: Some(format!("Generated standard for '{name}'")),
            },
            record_identification: if pk_fields.is_empty() {
                None
            } else {
                Some(RecordIdentification {
                    primary_key_fields: pk_fields,
                    strategy: Some("inferred".to_string()),
                })
            },
            requirements: Requirements {
                overall_minimum: self.config.overall_minimum,
                field_requirements,
                dimension_requirements,
            },
            metadata: serde_json::Map::from_iter([("explanations".to_string(), explanations.into())]),
        }
    }
}

fn rationale_for(field_name: &str, rule: &FieldRule, is_pk: bool) -> String {
    if is_pk {
        return format!("'{field_name}' selected as (part of) the primary key: unique and non-null across the sample");
    }
    match (&rule.allowed_values, rule.pattern.as_ref(), rule.min_value) {
        (Some(values), _, _) => format!("'{field_name}' observed {} distinct value(s); constrained to an enum", values.len()),
        (_, Some(_), _) => format!("'{field_name}' matched a recognized pattern across all non-null samples"),
        (_, _, Some(_)) => format!("'{field_name}' numeric range bounded by observed extremes plus margin"),
        _ => format!("'{field_name}' constrained by type and observed length only"),
    }
}

fn default_dimension_requirements() -> HashMap<String, DimensionConfig> {
    let mut out = HashMap::new();

    let mut validity_weights = RuleWeights::default();
    validity_weights.rule_weights.insert("type".to_string(), 0.30);
    validity_weights.rule_weights.insert("allowed_values".to_string(), 0.20);
    validity_weights.rule_weights.insert("pattern".to_string(), 0.20);
    validity_weights.rule_weights.insert("length_bounds".to_string(), 0.10);
    validity_weights.rule_weights.insert("numeric_bounds".to_string(), 0.20);
    out.insert(
        "validity".to_string(),
        DimensionConfig {
            minimum_score: 0.0,
            weight: 1.0,
            scoring: validity_weights,
        },
    );

    let mut completeness_weights = RuleWeights::default();
    completeness_weights.rule_weights.insert("missing_required".to_string(), 1.0);
    out.insert(
        "completeness".to_string(),
        DimensionConfig {
            minimum_score: 0.0,
            weight: 1.0,
            scoring: completeness_weights,
        },
    );

    let mut consistency_weights = RuleWeights::default();
    consistency_weights.rule_weights.insert("primary_key_uniqueness".to_string(), 1.0);
    out.insert(
        "consistency".to_string(),
        DimensionConfig {
            minimum_score: 0.0,
            weight: 1.0,
            scoring: consistency_weights,
        },
    );

    out.insert(
        "freshness".to_string(),
        DimensionConfig {
            minimum_score: 0.0,
            weight: 1.0,
            scoring: RuleWeights::default(),
        },
    );

    let mut plausibility_weights = RuleWeights::default();
    plausibility_weights.rule_weights.insert("statistical_outliers".to_string(), 0.40);
    plausibility_weights.rule_weights.insert("categorical_frequency".to_string(), 0.30);
    plausibility_weights.rule_weights.insert("business_logic".to_string(), 0.15);
    plausibility_weights.rule_weights.insert("cross_field_consistency".to_string(), 0.15);
    out.insert(
        "plausibility".to_string(),
        DimensionConfig {
            minimum_score: 0.0,
            weight: 1.0,
            scoring: plausibility_weights,
        },
    );

    out
}

/// Iterates training values through the rule checkers in fixed order,
/// relaxing only the failing rule, up to [`TRAINING_PASS_MAX_PASSES`]
/// times. Termination is guaranteed: every action either widens a bound
/// to contain observed data or deletes a rule, and rules never regrow.
fn enforce_training_pass(rule: &mut FieldRule, cells: &[Cell], adjustments: &mut Vec<serde_json::Value>) {
    for _pass in 0..TRAINING_PASS_MAX_PASSES {
        let mut changed = false;

        for cell in cells {
            if cell.is_null() {
                if !rule.nullable {
                    rule.nullable = true;
                    adjustments.push(json!({
                        "rule": "nullable",
                        "action": "set_nullable_true",
                        "reason": "training-pass failure",
                    }));
                    changed = true;
                }
                continue;
            }

            if !check_type(cell, rule) {
                let before = rule.field_type.as_str().to_string();
                rule.field_type = FieldType::String;
                rule.min_value = None;
                rule.max_value = None;
                rule.after_date = None;
                rule.before_date = None;
                rule.after_datetime = None;
                rule.before_datetime = None;
                adjustments.push(json!({
                    "rule": "type",
                    "action": "coerced_to_string",
                    "before": before,
                    "after": "string",
                    "reason": "training-pass failure",
                }));
                changed = true;
                continue;
            }

            if !check_allowed_values(cell, rule) {
                rule.allowed_values = None;
                adjustments.push(json!({
                    "rule": "allowed_values",
                    "action": "deleted",
                    "reason": "training-pass failure",
                }));
                changed = true;
                continue;
            }

            if !check_length_bounds(cell, rule) {
                let observed = cell.render().chars().count();
                match (rule.min_length, rule.max_length) {
                    (Some(min), Some(max)) => {
                        rule.min_length = Some(min.min(observed));
                        rule.max_length = Some(max.max(observed));
                    }
                    _ => {
                        rule.min_length = None;
                        rule.max_length = None;
                    }
                }
                adjustments.push(json!({
                    "rule": "length_bounds",
                    "action": "widened_or_deleted",
                    "reason": "training-pass failure",
                }));
                changed = true;
                continue;
            }

            if !check_pattern(cell, rule) {
                rule.pattern = None;
                adjustments.push(json!({
                    "rule": "pattern",
                    "action": "deleted",
                    "reason": "training-pass failure",
                }));
                changed = true;
                continue;
            }

            if !check_numeric_bounds(cell, rule) {
                if let Some(observed) = cell.as_f64() {
                    rule.min_value = Some(rule.min_value.map_or(observed, |m| m.min(observed)));
                    rule.max_value = Some(rule.max_value.map_or(observed, |m| m.max(observed)));
                }
                adjustments.push(json!({
                    "rule": "numeric_range",
                    "action": "widened",
                    "reason": "training-pass failure",
                }));
                changed = true;
                continue;
            }

            if !crate::rules::checkers::check_date_bounds(cell, rule) {
                rule.after_date = None;
                rule.before_date = None;
                rule.after_datetime = None;
                rule.before_datetime = None;
                adjustments.push(json!({
                    "rule": "date_bounds",
                    "action": "deleted",
                    "reason": "training-pass failure",
                }));
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationEngine;
    use crate::value::{Column, Dataset};

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "email",
                vec![
                    Cell::Text("john@example.com".into()),
                    Cell::Text("jane@test.org".into()),
                    Cell::Text("bob@company.net".into()),
                ],
            ),
            Column::new("age", vec![Cell::Integer(25), Cell::Integer(30), Cell::Integer(35)]),
        ])
    }

    #[test]
    fn generated_standard_passes_its_own_data() {
        let data = sample();
        let standard = StandardGenerator::new(GeneratorConfig::default()).generate("customers", &data);
        let result = ValidationEngine::new().assess(&data, &standard);
        assert!(result.passed, "training-pass guarantee violated: {:?}", result.overall_score);
    }

    #[test]
    fn generated_standard_has_overall_minimum() {
        let data = sample();
        let standard = StandardGenerator::new(GeneratorConfig::default()).generate("customers", &data);
        assert_eq!(standard.requirements.overall_minimum, 75.0);
    }

    #[test]
    fn pk_detection_picks_id_like_column() {
        let data = Dataset::new(vec![
            Column::new("id", vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(3)]),
            Column::new("name", vec![Cell::Text("a".into()), Cell::Text("a".into()), Cell::Text("b".into())]),
        ]);
        let standard = StandardGenerator::new(GeneratorConfig::default()).generate("things", &data);
        assert_eq!(standard.primary_key_fields(), &["id".to_string()]);
    }

    #[test]
    fn training_pass_handles_out_of_range_values() {
        let data = Dataset::new(vec![Column::new(
            "score",
            vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(1_000_000)],
        )]);
        let standard = StandardGenerator::new(GeneratorConfig::default()).generate("scores", &data);
        let result = ValidationEngine::new().assess(&data, &standard);
        assert!(result.passed);
    }
}
