//! Config data model: environments, path layout, and resolution
//! strategy for locating contracts and writing assessment artifacts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    Raise,
    Warn,
    Continue,
}

impl Default for FailureMode {
    fn default() -> Self {
        FailureMode::Raise
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    Flat,
    PackageLocal,
    Hybrid,
}

impl Default for ResolutionStrategy {
    fn default() -> Self {
        ResolutionStrategy::Hybrid
    }
}

impl ResolutionStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "package_local" => Some(Self::PackageLocal),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    EnvOverride,
    PackageLocal,
    Centralized,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    pub strategy: ResolutionStrategy,
    pub package_subdirectory: String,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::default(),
            package_subdirectory: "adri".to_string(),
        }
    }
}

/// Audit-grade trace of how a contract path was resolved.
#[derive(Debug, Clone)]
pub struct ContractResolutionResult {
    pub path: PathBuf,
    pub source: ResolutionSource,
    pub package_context: Option<PathBuf>,
    pub exists: bool,
    pub strategy_used: ResolutionStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub contracts: PathBuf,
    pub assessments: PathBuf,
    pub training_data: PathBuf,
    pub audit_logs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            contracts: PathBuf::from("ADRI/contracts"),
            assessments: PathBuf::from("ADRI/assessments"),
            training_data: PathBuf::from("ADRI/training-data"),
            audit_logs: PathBuf::from("ADRI/audit-logs"),
        }
    }
}

impl PathsConfig {
    pub fn all(&self) -> [&std::path::Path; 4] {
        [&self.contracts, &self.assessments, &self.training_data, &self.audit_logs]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionConfig {
    pub default_min_score: f64,
    pub default_failure_mode: FailureMode,
    pub cache_duration_hours: f64,
    pub auto_generate_standards: bool,
    #[serde(default)]
    pub default_dimension_minimums: HashMap<String, f64>,
    /// Caps how many rows of the runtime dataset are sampled when
    /// auto-generating a standard. `None` trains on the full dataset.
    #[serde(default)]
    pub auto_generate_sample_rows: Option<usize>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            default_min_score: 75.0,
            default_failure_mode: FailureMode::default(),
            cache_duration_hours: 1.0,
            auto_generate_standards: false,
            default_dimension_minimums: HashMap::new(),
            auto_generate_sample_rows: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentConfig {
    pub failed_sample_cap: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self { failed_sample_cap: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub default_overall_minimum: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_overall_minimum: 75.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdriConfig {
    pub project_name: String,
    pub version: String,
    pub paths: PathsConfig,
    pub protection: ProtectionConfig,
    pub assessment: AssessmentConfig,
    pub generation: GenerationConfig,
}
