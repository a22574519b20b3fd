//! Validation Engine: scores a dataset against a standard across five
//! dimensions, each a weighted aggregation driven by the standard's
//! YAML `rule_weights`.

use crate::rules::checkers::{
    check_allowed_values, check_date_bounds, check_length_bounds, check_numeric_bounds,
    check_pattern, check_type,
};
use crate::types::{
    AssessmentResult, DimensionScore, FailedValidation, FieldAnalysis, FieldRule,
    RuleExecutionLogEntry, Standard,
};
use crate::value::{Cell, TabularView};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

const VALIDITY_RULES: [&str; 5] = [
    "type",
    "allowed_values",
    "pattern",
    "length_bounds",
    "numeric_bounds",
];

pub struct ValidationEngine {
    failed_sample_cap: usize,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self { failed_sample_cap: 5 }
    }
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failed_sample_cap(failed_sample_cap: usize) -> Self {
        Self { failed_sample_cap }
    }

    pub fn assess(&self, data: &dyn TabularView, standard: &Standard) -> AssessmentResult {
        let assessment_id = Uuid::new_v4().to_string();
        let mut rule_execution_log = Vec::new();
        let mut failed_validations = Vec::new();

        let validity = self.score_validity(data, standard, &mut rule_execution_log, &mut failed_validations, &assessment_id);
        let completeness = self.score_completeness(data, standard, &mut rule_execution_log);
        let consistency = self.score_consistency(data, standard, &mut rule_execution_log);
        let freshness = self.score_freshness(data, standard, &mut rule_execution_log);
        let plausibility = self.score_plausibility(data, standard, &mut rule_execution_log);

        let mut dimension_scores = HashMap::new();
        dimension_scores.insert("validity".to_string(), validity);
        dimension_scores.insert("completeness".to_string(), completeness);
        dimension_scores.insert("consistency".to_string(), consistency);
        dimension_scores.insert("freshness".to_string(), freshness);
        dimension_scores.insert("plausibility".to_string(), plausibility);

        let overall_score: f64 = dimension_scores.values().map(|d| d.score).sum();
        let passed = overall_score >= standard.requirements.overall_minimum;

        let mut required_field_names: Vec<&String> = standard.field_requirements().keys().collect();
        required_field_names.sort();
        let mut extra_field_names: Vec<&str> = data
            .column_names()
            .into_iter()
            .filter(|name| !standard.field_requirements().contains_key(*name))
            .collect();
        extra_field_names.sort();

        let field_analysis = required_field_names
            .into_iter()
            .map(|name| FieldAnalysis {
                field_name: name.clone(),
                present_in_data: data.has_column(name),
                present_in_standard: true,
            })
            .chain(extra_field_names.into_iter().map(|name| FieldAnalysis {
                field_name: name.to_string(),
                present_in_data: true,
                present_in_standard: false,
            }))
            .collect();

        AssessmentResult {
            overall_score,
            passed,
            standard_id: standard.standards.id.clone(),
            assessment_date: Utc::now(),
            dimension_scores,
            rule_execution_log,
            field_analysis,
            failed_validations,
            metadata: serde_json::Map::new(),
        }
    }

    fn score_validity(
        &self,
        data: &dyn TabularView,
        standard: &Standard,
        log: &mut Vec<RuleExecutionLogEntry>,
        failed: &mut Vec<FailedValidation>,
        assessment_id: &str,
    ) -> DimensionScore {
        let dim_config = standard.dimension_config("validity");
        let mut field_scores = Vec::new();

        let mut field_names: Vec<&String> = standard.field_requirements().keys().collect();
        field_names.sort();

        for field_name in field_names {
            let rule = &standard.field_requirements()[field_name];
            let Some(cells) = data.column(field_name) else {
                continue; // missing required fields are omitted from validity scoring
            };
            let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
            if non_null.is_empty() {
                continue;
            }

            let mut per_rule_fail: HashMap<&str, (usize, usize, Vec<String>)> = HashMap::new();
            let mut value_scores = Vec::new();

            for cell in &non_null {
                let mut weighted_sum = 0.0;
                let mut weight_total = 0.0;
                for rule_name in VALIDITY_RULES {
                    let weight = dim_config.scoring.weight_for(field_name, rule_name);
                    if weight <= 0.0 {
                        continue;
                    }
                    let pass = run_validity_check(rule_name, cell, rule);
                    let entry = per_rule_fail.entry(rule_name).or_insert((0, 0, Vec::new()));
                    if pass {
                        entry.0 += 1;
                    } else {
                        entry.1 += 1;
                        if entry.2.len() < self.failed_sample_cap {
                            entry.2.push(cell.render());
                        }
                    }
                    weighted_sum += weight * if pass { 1.0 } else { 0.0 };
                    weight_total += weight;
                }
                value_scores.push(if weight_total > 0.0 { weighted_sum / weight_total } else { 1.0 });
            }

            let mut rule_names: Vec<&&str> = per_rule_fail.keys().collect();
            rule_names.sort();

            for rule_name in rule_names {
                let (pass_count, fail_count, samples) = &per_rule_fail[rule_name];
                log.push(RuleExecutionLogEntry {
                    dimension: "validity".to_string(),
                    rule: rule_name.to_string(),
                    field: Some(field_name.clone()),
                    pass_count: *pass_count,
                    fail_count: *fail_count,
                });
                if *fail_count > 0 {
                    failed.push(FailedValidation {
                        assessment_id: assessment_id.to_string(),
                        field_name: field_name.clone(),
                        issue_type: rule_name.to_string(),
                        affected_rows: *fail_count,
                        affected_percentage: 100.0 * *fail_count as f64 / non_null.len() as f64,
                        sample_failures: samples.clone(),
                        remediation: remediation_for(rule_name, field_name),
                    });
                }
            }

            let mean_value_score = value_scores.iter().sum::<f64>() / value_scores.len() as f64;
            field_scores.push(mean_value_score * 20.0);
        }

        let score = if field_scores.is_empty() {
            20.0
        } else {
            field_scores.iter().sum::<f64>() / field_scores.len() as f64
        };

        DimensionScore {
            score,
            details: serde_json::Map::from_iter([("fields_scored".to_string(), json!(field_scores.len()))]),
        }
    }

    fn score_completeness(
        &self,
        data: &dyn TabularView,
        standard: &Standard,
        log: &mut Vec<RuleExecutionLogEntry>,
    ) -> DimensionScore {
        let mut field_scores = Vec::new();
        let mut pass = 0;
        let mut fail = 0;

        let mut field_names: Vec<&String> = standard.field_requirements().keys().collect();
        field_names.sort();

        for field_name in field_names {
            let rule = &standard.field_requirements()[field_name];
            let field_score = match data.column(field_name) {
                None => {
                    fail += 1;
                    0.0
                }
                Some(_) if rule.nullable => {
                    pass += 1;
                    20.0
                }
                Some(cells) => {
                    let row_count = data.row_count().max(1);
                    let non_null = cells.iter().filter(|c| !c.is_null()).count();
                    let ratio = non_null as f64 / row_count as f64;
                    if ratio >= 1.0 {
                        pass += 1;
                    } else {
                        fail += 1;
                    }
                    20.0 * ratio
                }
            };
            field_scores.push(field_score);
        }

        log.push(RuleExecutionLogEntry {
            dimension: "completeness".to_string(),
            rule: "missing_required".to_string(),
            field: None,
            pass_count: pass,
            fail_count: fail,
        });

        let score = if field_scores.is_empty() {
            20.0
        } else {
            field_scores.iter().sum::<f64>() / field_scores.len() as f64
        };

        DimensionScore {
            score,
            details: serde_json::Map::new(),
        }
    }

    fn score_consistency(
        &self,
        data: &dyn TabularView,
        standard: &Standard,
        log: &mut Vec<RuleExecutionLogEntry>,
    ) -> DimensionScore {
        let pk_fields = standard.primary_key_fields();
        if pk_fields.is_empty() {
            log.push(RuleExecutionLogEntry {
                dimension: "consistency".to_string(),
                rule: "primary_key_uniqueness".to_string(),
                field: None,
                pass_count: 0,
                fail_count: 0,
            });
            return DimensionScore {
                score: 20.0,
                details: serde_json::Map::new(),
            };
        }

        let row_count = data.row_count();
        let columns: Vec<&[Cell]> = pk_fields.iter().map(|f| data.column(f).unwrap_or(&[])).collect();
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = 0usize;

        for row in 0..row_count {
            let mut key = Vec::with_capacity(columns.len());
            let mut has_null = false;
            for col in &columns {
                match col.get(row) {
                    Some(c) if !c.is_null() => key.push(c.render()),
                    _ => {
                        has_null = true;
                        break;
                    }
                }
            }
            if has_null || !seen.insert(key) {
                duplicates += 1;
            }
        }

        let duplicate_rate = if row_count > 0 { duplicates as f64 / row_count as f64 } else { 0.0 };
        log.push(RuleExecutionLogEntry {
            dimension: "consistency".to_string(),
            rule: "primary_key_uniqueness".to_string(),
            field: None,
            pass_count: row_count.saturating_sub(duplicates),
            fail_count: duplicates,
        });

        DimensionScore {
            score: 20.0 * (1.0 - duplicate_rate),
            details: serde_json::Map::from_iter([("duplicate_rows".to_string(), json!(duplicates))]),
        }
    }

    fn score_freshness(
        &self,
        data: &dyn TabularView,
        standard: &Standard,
        log: &mut Vec<RuleExecutionLogEntry>,
    ) -> DimensionScore {
        let mut field_scores = Vec::new();

        let mut field_names: Vec<&String> = standard.field_requirements().keys().collect();
        field_names.sort();

        for field_name in field_names {
            let rule = &standard.field_requirements()[field_name];
            let has_window = rule.after_date.is_some()
                || rule.before_date.is_some()
                || rule.after_datetime.is_some()
                || rule.before_datetime.is_some();
            if !has_window {
                continue;
            }
            let Some(cells) = data.column(field_name) else { continue };
            let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
            if non_null.is_empty() {
                continue;
            }
            let within = non_null.iter().filter(|c| check_date_bounds(c, rule)).count();
            let pass_rate = within as f64 / non_null.len() as f64;
            log.push(RuleExecutionLogEntry {
                dimension: "freshness".to_string(),
                rule: "recency_window".to_string(),
                field: Some(field_name.clone()),
                pass_count: within,
                fail_count: non_null.len() - within,
            });
            field_scores.push(pass_rate * 20.0);
        }

        if field_scores.is_empty() {
            log.push(RuleExecutionLogEntry {
                dimension: "freshness".to_string(),
                rule: "recency_window".to_string(),
                field: None,
                pass_count: 0,
                fail_count: 0,
            });
            return DimensionScore {
                score: 20.0,
                details: serde_json::Map::new(),
            };
        }

        DimensionScore {
            score: field_scores.iter().sum::<f64>() / field_scores.len() as f64,
            details: serde_json::Map::new(),
        }
    }

    fn score_plausibility(
        &self,
        data: &dyn TabularView,
        standard: &Standard,
        log: &mut Vec<RuleExecutionLogEntry>,
    ) -> DimensionScore {
        let dim_config = standard.dimension_config("plausibility");
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        let outlier_score = self.statistical_outlier_score(data, standard);
        push_plausibility(&mut weighted_sum, &mut weight_total, &dim_config.scoring, "statistical_outliers", outlier_score, log);

        let categorical_score = self.categorical_frequency_score(data, standard);
        push_plausibility(&mut weighted_sum, &mut weight_total, &dim_config.scoring, "categorical_frequency", categorical_score, log);

        // business_logic / cross_field_consistency are extension points:
        // no predicates are registered by default, so the stub always
        // reports full compliance until a standard author supplies rules.
        push_plausibility(&mut weighted_sum, &mut weight_total, &dim_config.scoring, "business_logic", 1.0, log);
        push_plausibility(&mut weighted_sum, &mut weight_total, &dim_config.scoring, "cross_field_consistency", 1.0, log);

        let score = if weight_total > 0.0 { 20.0 * weighted_sum / weight_total } else { 20.0 };
        DimensionScore {
            score,
            details: serde_json::Map::new(),
        }
    }

    fn statistical_outlier_score(&self, data: &dyn TabularView, standard: &Standard) -> f64 {
        let mut ratios = Vec::new();
        for (field_name, rule) in standard.field_requirements() {
            if !matches!(rule.field_type, crate::types::FieldType::Integer | crate::types::FieldType::Float) {
                continue;
            }
            let Some(cells) = data.column(field_name) else { continue };
            let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
            if values.len() < 4 {
                continue;
            }
            let mut sorted = values.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let q1 = crate::profiler::quantile(&sorted, 0.25);
            let q3 = crate::profiler::quantile(&sorted, 0.75);
            let iqr = q3 - q1;
            let (lo, hi) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
            let outliers = values.iter().filter(|v| **v < lo || **v > hi).count();
            ratios.push(1.0 - outliers as f64 / values.len() as f64);
        }
        if ratios.is_empty() {
            1.0
        } else {
            ratios.iter().sum::<f64>() / ratios.len() as f64
        }
    }

    fn categorical_frequency_score(&self, data: &dyn TabularView, standard: &Standard) -> f64 {
        let mut scores = Vec::new();
        for (field_name, rule) in standard.field_requirements() {
            let Some(values) = &rule.allowed_values else { continue };
            if values.is_empty() {
                continue;
            }
            let Some(cells) = data.column(field_name) else { continue };
            let non_null: Vec<&Cell> = cells.iter().filter(|c| !c.is_null()).collect();
            if non_null.is_empty() {
                continue;
            }
            let mut counts: HashMap<String, usize> = HashMap::new();
            for c in &non_null {
                *counts.entry(c.render()).or_insert(0) += 1;
            }
            let max_share = counts.values().copied().max().unwrap_or(0) as f64 / non_null.len() as f64;
            // A single value dominating beyond 95% is treated as unstable.
            scores.push(if max_share > 0.95 { 1.0 - (max_share - 0.95) / 0.05 } else { 1.0 });
        }
        if scores.is_empty() {
            1.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }
}

fn push_plausibility(
    weighted_sum: &mut f64,
    weight_total: &mut f64,
    weights: &crate::types::RuleWeights,
    rule_name: &str,
    contribution: f64,
    log: &mut Vec<RuleExecutionLogEntry>,
) {
    let weight = weights.rule_weights.get(rule_name).copied().unwrap_or(0.0);
    if weight <= 0.0 {
        return;
    }
    *weighted_sum += weight * contribution;
    *weight_total += weight;
    log.push(RuleExecutionLogEntry {
        dimension: "plausibility".to_string(),
        rule: rule_name.to_string(),
        field: None,
        pass_count: if contribution >= 0.999 { 1 } else { 0 },
        fail_count: if contribution >= 0.999 { 0 } else { 1 },
    });
}

fn run_validity_check(rule_name: &str, cell: &Cell, rule: &FieldRule) -> bool {
    match rule_name {
        "type" => check_type(cell, rule),
        "allowed_values" => check_allowed_values(cell, rule),
        "pattern" => check_pattern(cell, rule),
        "length_bounds" => check_length_bounds(cell, rule),
        "numeric_bounds" => check_numeric_bounds(cell, rule),
        _ => true,
    }
}

fn remediation_for(rule_name: &str, field_name: &str) -> String {
    match rule_name {
        "type" => format!("ensure '{field_name}' values match the declared type"),
        "allowed_values" => format!("restrict '{field_name}' to the documented allowed values"),
        "pattern" => format!("ensure '{field_name}' values match the expected format"),
        "length_bounds" => format!("ensure '{field_name}' length falls within the expected bounds"),
        "numeric_bounds" => format!("ensure '{field_name}' falls within the expected numeric range"),
        _ => format!("review '{field_name}' against the standard"),
    }
}
