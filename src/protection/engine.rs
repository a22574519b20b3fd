//! Protection Engine: `resolve -> ensure -> assess -> decide -> audit ->
//! invoke`. Rust has no signature-reflection to pull a data parameter
//! out of an arbitrary callable, so callers pass the
//! [`crate::value::Dataset`] explicitly — the "extract data" step of
//! the pipeline is satisfied by construction rather than by inspecting
//! a callable's signature.

use crate::audit::{AssessmentLogRow, AuditLogger, DimensionScoreRow, ExecutionDecision, FailedValidationRow};
use crate::config::{AdriConfig, ConfigurationLoader, FailureMode};
use crate::error::{AdriError, Result};
use crate::generator::{GeneratorConfig, StandardGenerator};
use crate::standards::BundledStandardsLoader;
use crate::types::{Standard, DIMENSIONS};
use crate::validation::ValidationEngine;
use crate::value::{Dataset, TabularView};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::cache::{fingerprint, AssessmentCache};

/// Per-call overrides for [`ProtectionEngine::protect`]. Any field left
/// at its default falls back to the active [`AdriConfig`].
#[derive(Debug, Clone, Default)]
pub struct ProtectOptions {
    /// Name used in the `{function_name}_{data_param}` inference
    /// pattern when neither `standard_name` nor `standard_dict` is
    /// given. Defaults to `"data"`.
    pub data_param: Option<String>,
    pub standard_naming_pattern: Option<String>,
    pub standard_file: Option<PathBuf>,
    pub standard_name: Option<String>,
    pub standard_dict: Option<Standard>,
    pub min_score: Option<f64>,
    pub on_failure: Option<FailureMode>,
    pub dimensions: HashMap<String, f64>,
    pub auto_generate: Option<bool>,
    pub verbose: bool,
}

impl ProtectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_score(mut self, score: f64) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn with_on_failure(mut self, mode: FailureMode) -> Self {
        self.on_failure = Some(mode);
        self
    }

    pub fn with_standard_name(mut self, name: impl Into<String>) -> Self {
        self.standard_name = Some(name.into());
        self
    }

    pub fn with_standard_dict(mut self, standard: Standard) -> Self {
        self.standard_dict = Some(standard);
        self
    }

    pub fn with_dimension_minimum(mut self, dimension: impl Into<String>, minimum: f64) -> Self {
        self.dimensions.insert(dimension.into(), minimum);
        self
    }

    pub fn with_auto_generate(mut self, auto_generate: bool) -> Self {
        self.auto_generate = Some(auto_generate);
        self
    }

    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

/// Where a resolved standard came from — carried through to the
/// diagnostic message and the audit row (`standard_id`).
#[derive(Debug, Clone)]
enum StandardRef {
    Bundled(String),
    File(PathBuf),
    Inline,
}

impl StandardRef {
    fn display(&self) -> String {
        match self {
            StandardRef::Bundled(name) => format!("{name} (bundled)"),
            StandardRef::File(path) => path.display().to_string(),
            StandardRef::Inline => "<inline standard>".to_string(),
        }
    }

    fn cli_name(&self) -> String {
        match self {
            StandardRef::Bundled(name) => name.clone(),
            StandardRef::File(path) => path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("standard")
                .trim_end_matches("_standard")
                .to_string(),
            StandardRef::Inline => "standard".to_string(),
        }
    }
}

/// The outcome of the evaluate-decision step feeding failure dispatch.
/// An explicit decision type in place of exceptions-for-control-flow.
#[derive(Debug, Clone)]
enum Decision {
    Allowed,
    Blocked(String),
    WarnContinue(String),
    ContinueSilent(String),
}

/// Guards user function calls: resolves a standard, ensures it exists
/// (generating one if configured to), assesses the runtime dataset
/// against it, enforces the configured minimum score, and emits an
/// audit trail of the decision. Reentrant: holds no per-call mutable
/// state outside the internally-synchronized cache and audit logger.
pub struct ProtectionEngine {
    config: AdriConfig,
    bundled: Option<BundledStandardsLoader>,
    cache: AssessmentCache,
    audit: Option<Arc<AuditLogger>>,
    package_context: Option<PathBuf>,
}

impl ProtectionEngine {
    pub fn new(config: AdriConfig) -> Result<Self> {
        let bundled = BundledStandardsLoader::new(crate::standards::default_bundled_dir()).ok();
        let audit = Some(Arc::new(AuditLogger::new(&config.paths.audit_logs)?));
        Ok(Self {
            config,
            bundled,
            cache: AssessmentCache::new(),
            audit,
            package_context: None,
        })
    }

    /// Builds an engine with no bundled-standards directory and no
    /// audit sink — useful in hosts that embed ADRI without either
    /// concern (e.g. a pure in-memory test harness).
    pub fn bare(config: AdriConfig) -> Self {
        Self {
            config,
            bundled: None,
            cache: AssessmentCache::new(),
            audit: None,
            package_context: None,
        }
    }

    pub fn with_package_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.package_context = Some(context.into());
        self
    }

    pub fn cache(&self) -> &AssessmentCache {
        &self.cache
    }

    /// Runs the full `resolve -> ensure -> assess -> decide -> audit ->
    /// invoke` pipeline and, unless the decision is `Blocked`, calls
    /// `func` and returns its value.
    pub fn protect<T>(
        &self,
        function_name: &str,
        data: &Dataset,
        options: &ProtectOptions,
        func: impl FnOnce(&Dataset) -> T,
    ) -> Result<T> {
        let start = Instant::now();

        let (standard, standard_ref) = self.resolve_and_ensure(function_name, data, options)?;

        let fp = fingerprint(data);
        let cache_key = format!("{}:{}", standard.standards.id, fp);
        let ttl = self.config.protection.cache_duration_hours;

        let result = match self.cache.get(&cache_key, ttl) {
            Some(cached) => cached,
            None => {
                let assessed = ValidationEngine::with_failed_sample_cap(self.config.assessment.failed_sample_cap)
                    .assess(data, &standard);
                self.cache.put(cache_key, assessed.clone());
                assessed
            }
        };

        let min_score = options.min_score.unwrap_or(self.config.protection.default_min_score);
        let on_failure = options.on_failure.unwrap_or(self.config.protection.default_failure_mode);

        let decision = evaluate_decision(&result, min_score, &options.dimensions, &standard_ref, on_failure);

        let duration_ms = start.elapsed().as_millis() as u64;
        self.emit_audit(function_name, data, &result, &decision, duration_ms);

        match decision {
            Decision::Allowed => {
                if options.verbose {
                    tracing::info!(
                        score = result.overall_score,
                        standard = %standard_ref.display(),
                        function = function_name,
                        "ADRI Protection: ALLOWED"
                    );
                }
                Ok(func(data))
            }
            Decision::Blocked(message) => Err(AdriError::ProtectionError(message)),
            Decision::WarnContinue(message) => {
                tracing::warn!("Data quality warning: {message}");
                Ok(func(data))
            }
            Decision::ContinueSilent(message) => {
                tracing::debug!("Data quality failure (continuing): {message}");
                Ok(func(data))
            }
        }
    }

    fn resolve_and_ensure(
        &self,
        function_name: &str,
        data: &Dataset,
        options: &ProtectOptions,
    ) -> Result<(Standard, StandardRef)> {
        if let Some(standard) = &options.standard_dict {
            return Ok((standard.clone(), StandardRef::Inline));
        }

        let data_param = options.data_param.clone().unwrap_or_else(|| "data".to_string());

        if let Some(name) = &options.standard_name {
            if let Some(bundled) = &self.bundled {
                if bundled.exists(name) {
                    return Ok((bundled.load(name)?, StandardRef::Bundled(name.clone())));
                }
            }
            tracing::debug!(standard = name, "standard_name not found among bundled standards, falling back to file lookup");
            let path = self.resolve_path(name)?;
            return self.ensure_standard_at_path(path, data, options);
        }

        let pattern = options
            .standard_naming_pattern
            .clone()
            .unwrap_or_else(|| "{function_name}_{data_param}".to_string());
        let inferred_name = pattern
            .replace("{function_name}", function_name)
            .replace("{data_param}", &data_param);

        if let Some(bundled) = &self.bundled {
            if bundled.exists(&inferred_name) {
                return Ok((bundled.load(&inferred_name)?, StandardRef::Bundled(inferred_name)));
            }
        }

        let path = options
            .standard_file
            .clone()
            .map(Ok)
            .unwrap_or_else(|| self.resolve_path(&inferred_name))?;
        self.ensure_standard_at_path(path, data, options)
    }

    fn resolve_path(&self, name: &str) -> Result<PathBuf> {
        ConfigurationLoader::resolve_contract_path(name, self.package_context.as_deref(), &self.config)
    }

    fn ensure_standard_at_path(
        &self,
        path: PathBuf,
        data: &Dataset,
        options: &ProtectOptions,
    ) -> Result<(Standard, StandardRef)> {
        if path.is_file() {
            let raw = std::fs::read_to_string(&path)?;
            let standard: Standard = serde_yaml::from_str(&raw)?;
            return Ok((standard, StandardRef::File(path)));
        }

        let auto_generate = options
            .auto_generate
            .unwrap_or(self.config.protection.auto_generate_standards);
        if !auto_generate {
            return Err(AdriError::ProtectionError(format!(
                "Standard file not found: {}",
                path.display()
            )));
        }

        let sample: Dataset = match self.config.protection.auto_generate_sample_rows {
            Some(limit) => data.head(limit),
            None => data.clone(),
        };
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("generated")
            .to_string();
        let standard = StandardGenerator::new(GeneratorConfig {
            overall_minimum: self.config.generation.default_overall_minimum,
            ..GeneratorConfig::default()
        })
        .generate(&name, &sample);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_yaml::to_string(&standard)?)?;

        Ok((standard, StandardRef::File(path)))
    }

    fn emit_audit(
        &self,
        function_name: &str,
        data: &Dataset,
        result: &crate::types::AssessmentResult,
        decision: &Decision,
        duration_ms: u64,
    ) {
        let Some(audit) = &self.audit else { return };

        let execution_decision = match decision {
            Decision::Allowed => ExecutionDecision::Allowed,
            Decision::Blocked(_) => ExecutionDecision::Blocked,
            Decision::WarnContinue(_) => ExecutionDecision::WarnContinue,
            Decision::ContinueSilent(_) => ExecutionDecision::ContinueSilent,
        };

        let assessment_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now();

        let assessment_row = AssessmentLogRow {
            timestamp,
            assessment_id: assessment_id.clone(),
            overall_score: result.overall_score,
            passed: result.passed,
            standard_id: result.standard_id.clone(),
            function_name: function_name.to_string(),
            data_row_count: data.row_count(),
            assessment_duration_ms: duration_ms,
            execution_decision,
        };

        let dimension_rows: Vec<DimensionScoreRow> = DIMENSIONS
            .iter()
            .filter_map(|dim| {
                result.dimension_score(dim).map(|score| DimensionScoreRow {
                    assessment_id: assessment_id.clone(),
                    timestamp,
                    dimension: dim.to_string(),
                    score,
                })
            })
            .collect();

        let failed_rows: Vec<FailedValidationRow> = result
            .failed_validations
            .iter()
            .map(|f| FailedValidationRow {
                assessment_id: assessment_id.clone(),
                timestamp,
                field_name: f.field_name.clone(),
                issue_type: f.issue_type.clone(),
                affected_rows: f.affected_rows,
                affected_percentage: f.affected_percentage,
                sample_failures: f.sample_failures.clone(),
                remediation: f.remediation.clone(),
            })
            .collect();

        if let Err(e) = audit.log_assessment(&assessment_row, &dimension_rows, &failed_rows) {
            tracing::warn!("failed to write audit log: {e}");
        }
    }
}

fn evaluate_decision(
    result: &crate::types::AssessmentResult,
    min_score: f64,
    dimensions: &HashMap<String, f64>,
    standard_ref: &StandardRef,
    on_failure: FailureMode,
) -> Decision {
    if result.overall_score < min_score {
        let message = format_quality_error(result, min_score, standard_ref);
        return dispatch(on_failure, message);
    }

    for (dimension, floor) in dimensions {
        match result.dimension_score(dimension) {
            None => {
                let message = format!("Required dimension '{dimension}' not found in assessment");
                return dispatch(on_failure, message);
            }
            Some(score) if score < *floor => {
                let message =
                    format!("Dimension '{dimension}' score insufficient: {score:.1}/20 (required: {floor:.1}/20)");
                return dispatch(on_failure, message);
            }
            _ => {}
        }
    }

    Decision::Allowed
}

fn dispatch(on_failure: FailureMode, message: String) -> Decision {
    match on_failure {
        FailureMode::Raise => Decision::Blocked(message),
        FailureMode::Warn => Decision::WarnContinue(message),
        FailureMode::Continue => Decision::ContinueSilent(message),
    }
}

fn format_quality_error(result: &crate::types::AssessmentResult, min_score: f64, standard_ref: &StandardRef) -> String {
    let problem_dimensions: Vec<String> = DIMENSIONS
        .iter()
        .filter(|dim| result.dimension_score(dim).map(|s| s < 15.0).unwrap_or(false))
        .map(|d| d.to_string())
        .collect();
    let issues = identify_main_issues(&problem_dimensions);

    format!(
        "ADRI Protection: BLOCKED \u{274c} \u{2014} data quality {:.1}/100 is below the required {:.1}/100 for standard '{}': {}. Run `adri show-standard {}` for details.",
        result.overall_score,
        min_score,
        standard_ref.display(),
        issues,
        standard_ref.cli_name(),
    )
}

fn identify_main_issues(problem_dimensions: &[String]) -> String {
    if problem_dimensions.is_empty() {
        return "quality threshold not met".to_string();
    }

    let issue_text = |dim: &str| -> Option<&'static str> {
        match dim {
            "validity" => Some("invalid data formats detected (e.g., bad emails, invalid dates)"),
            "completeness" => Some("missing required data fields"),
            "consistency" => Some("inconsistent data formats"),
            "freshness" => Some("outdated data detected"),
            "plausibility" => Some("implausible values detected"),
            _ => None,
        }
    };

    let known: Vec<&str> = problem_dimensions.iter().filter_map(|d| issue_text(d)).collect();
    if known.is_empty() {
        return format!("{} data quality issues", problem_dimensions.len());
    }
    known.into_iter().take(2).collect::<Vec<_>>().join(" and ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigurationLoader;
    use crate::value::{Cell, Column};

    fn isolated_config(tmp: &Path) -> AdriConfig {
        let mut config = ConfigurationLoader::create_default_config("demo");
        config.paths.contracts = tmp.join("contracts");
        config.paths.assessments = tmp.join("assessments");
        config.paths.training_data = tmp.join("training-data");
        config.paths.audit_logs = tmp.join("audit-logs");
        config
    }

    fn good_data() -> Dataset {
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

    fn bad_data() -> Dataset {
        Dataset::new(vec![
            Column::new(
                "email",
                vec![
                    Cell::Text("not-an-email".into()),
                    Cell::Text("also bad".into()),
                    Cell::Null,
                    Cell::Text("x".into()),
                ],
            ),
            Column::new(
                "age",
                vec![Cell::Integer(-5), Cell::Integer(999), Cell::Null, Cell::Integer(200)],
            ),
        ])
    }

    #[test]
    fn excellent_input_passes_and_allows() {
        let tmp = tempfile::tempdir().unwrap();
        let config = isolated_config(tmp.path());
        let engine = ProtectionEngine::new(config).unwrap();
        let data = good_data();

        let options = ProtectOptions::new()
            .with_min_score(80.0)
            .with_auto_generate(true);
        let result = engine.protect("process_customers", &data, &options, |_| "ok");
        assert_eq!(result.unwrap(), "ok");
    }

    #[test]
    fn bad_input_raise_mode_blocks_and_does_not_invoke() {
        let tmp = tempfile::tempdir().unwrap();
        let config = isolated_config(tmp.path());
        let engine = ProtectionEngine::new(config).unwrap();

        // Generate a strict standard from good data first, then assess bad data against it.
        let good = good_data();
        let gen_options = ProtectOptions::new().with_min_score(80.0).with_auto_generate(true);
        engine.protect("process_customers", &good, &gen_options, |_| ()).unwrap();

        let bad = bad_data();
        let mut invoked = false;
        let options = ProtectOptions::new()
            .with_min_score(80.0)
            .with_on_failure(FailureMode::Raise);
        let result = engine.protect("process_customers", &bad, &options, |_| {
            invoked = true;
        });
        assert!(result.is_err());
        assert!(!invoked);
        match result {
            Err(AdriError::ProtectionError(msg)) => assert!(msg.contains("BLOCKED")),
            other => panic!("expected ProtectionError, got {other:?}"),
        }
    }

    #[test]
    fn bad_input_warn_mode_invokes_function() {
        let tmp = tempfile::tempdir().unwrap();
        let config = isolated_config(tmp.path());
        let engine = ProtectionEngine::new(config).unwrap();

        let good = good_data();
        let gen_options = ProtectOptions::new().with_min_score(80.0).with_auto_generate(true);
        engine.protect("process_customers", &good, &gen_options, |_| ()).unwrap();

        let bad = bad_data();
        let options = ProtectOptions::new()
            .with_min_score(80.0)
            .with_on_failure(FailureMode::Warn);
        let result = engine.protect("process_customers", &bad, &options, |_| "invoked");
        assert_eq!(result.unwrap(), "invoked");
    }

    #[test]
    fn dimension_override_blocks_even_when_overall_passes() {
        let result = crate::types::AssessmentResult {
            overall_score: 85.0,
            passed: true,
            standard_id: "s".to_string(),
            assessment_date: chrono::Utc::now(),
            dimension_scores: {
                let mut m = HashMap::new();
                m.insert(
                    "completeness".to_string(),
                    crate::types::DimensionScore {
                        score: 10.0,
                        details: serde_json::Map::new(),
                    },
                );
                m
            },
            rule_execution_log: Vec::new(),
            field_analysis: Vec::new(),
            failed_validations: Vec::new(),
            metadata: serde_json::Map::new(),
        };
        let mut dims = HashMap::new();
        dims.insert("completeness".to_string(), 15.0);
        let decision = evaluate_decision(&result, 80.0, &dims, &StandardRef::Inline, FailureMode::Raise);
        match decision {
            Decision::Blocked(msg) => assert!(msg.contains("completeness")),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn cache_hit_skips_second_assessment() {
        let tmp = tempfile::tempdir().unwrap();
        let config = isolated_config(tmp.path());
        let engine = ProtectionEngine::new(config).unwrap();
        let data = good_data();

        let options = ProtectOptions::new().with_min_score(80.0).with_auto_generate(true);
        engine.protect("process_customers", &data, &options, |_| ()).unwrap();
        assert_eq!(engine.cache().len(), 1);
        engine.protect("process_customers", &data, &options, |_| ()).unwrap();
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn identify_main_issues_matches_reference_wording() {
        assert_eq!(identify_main_issues(&[]), "quality threshold not met");
        assert_eq!(
            identify_main_issues(&["validity".to_string()]),
            "invalid data formats detected (e.g., bad emails, invalid dates)"
        );
        assert_eq!(
            identify_main_issues(&["completeness".to_string(), "consistency".to_string()]),
            "missing required data fields and inconsistent data formats"
        );
        assert_eq!(identify_main_issues(&["unknown_dimension".to_string()]), "1 data quality issues");
    }
}
