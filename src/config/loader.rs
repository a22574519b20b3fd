//! Config discovery and contract path resolution, following an explicit
//! precedence chain at each step rather than a single fixed path.

use super::types::{
    AdriConfig, ContractResolutionResult, ResolutionConfig, ResolutionSource, ResolutionStrategy,
};
use crate::error::{AdriError, Result};
use std::path::{Path, PathBuf};

const CONFIG_RELATIVE_PATH: &str = "ADRI/config.yaml";

pub struct ConfigurationLoader;

impl ConfigurationLoader {
    pub fn create_default_config(project_name: &str) -> AdriConfig {
        AdriConfig {
            project_name: project_name.to_string(),
            version: "1.0.0".to_string(),
            ..AdriConfig::default()
        }
    }

    pub fn validate_config(config: &AdriConfig) -> Result<()> {
        if config.project_name.trim().is_empty() {
            return Err(AdriError::ConfigInvalid("project_name must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&config.protection.default_min_score) {
            return Err(AdriError::ConfigInvalid(
                "protection.default_min_score must be within [0, 100]".to_string(),
            ));
        }
        if config.protection.cache_duration_hours < 0.0 {
            return Err(AdriError::ConfigInvalid(
                "protection.cache_duration_hours must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save_config(config: &AdriConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(config)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn load_config(path: &Path) -> Result<AdriConfig> {
        let raw = std::fs::read_to_string(path)
            .map_err(|_| AdriError::ConfigNotFound(path.display().to_string()))?;
        let config: AdriConfig = serde_yaml::from_str(&raw)?;
        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Walks up from `start_dir` to the user's home directory (inclusive)
    /// looking for `ADRI/config.yaml`.
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let home = dirs::home_dir();
        let mut current = start_dir.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_RELATIVE_PATH);
            if candidate.is_file() {
                return Some(candidate);
            }
            if home.as_deref() == Some(current.as_path()) {
                break;
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }
        None
    }

    /// Resolves the active configuration, in precedence order:
    /// `ADRI_CONFIG` (inline YAML) > `ADRI_CONFIG_PATH`/`ADRI_CONFIG_FILE`
    /// > `explicit_path` > auto-discovery from the current directory.
    pub fn get_active_config(explicit_path: Option<&Path>) -> Result<AdriConfig> {
        if let Ok(inline) = std::env::var("ADRI_CONFIG") {
            let config: AdriConfig = serde_yaml::from_str(&inline)?;
            Self::validate_config(&config)?;
            return Ok(config);
        }

        if let Ok(path) = std::env::var("ADRI_CONFIG_PATH").or_else(|_| std::env::var("ADRI_CONFIG_FILE")) {
            return Self::load_config(Path::new(&path));
        }

        if let Some(path) = explicit_path {
            return Self::load_config(path);
        }

        let cwd = std::env::current_dir()?;
        match Self::find_config_file(&cwd) {
            Some(path) => Self::load_config(&path),
            None => Err(AdriError::ConfigNotFound(
                "no ADRI/config.yaml found walking up from the current directory".to_string(),
            )),
        }
    }

    pub fn get_resolution_config() -> ResolutionConfig {
        let strategy = std::env::var("ADRI_RESOLUTION_STRATEGY")
            .ok()
            .and_then(|s| ResolutionStrategy::parse(&s))
            .unwrap_or_default();
        let package_subdirectory =
            std::env::var("ADRI_PACKAGE_SUBDIRECTORY").unwrap_or_else(|_| "adri".to_string());
        ResolutionConfig {
            strategy,
            package_subdirectory,
        }
    }

    /// Resolves `<name>`'s contract path under the configured strategy,
    /// returning only the path. See [`Self::resolve_contract_path_with_metadata`]
    /// for the audit-grade variant.
    pub fn resolve_contract_path(
        name: &str,
        package_context: Option<&Path>,
        config: &AdriConfig,
    ) -> Result<PathBuf> {
        Ok(Self::resolve_contract_path_with_metadata(name, package_context, config)?.path)
    }

    pub fn resolve_contract_path_with_metadata(
        name: &str,
        package_context: Option<&Path>,
        config: &AdriConfig,
    ) -> Result<ContractResolutionResult> {
        let resolution = Self::get_resolution_config();
        let filename = format!("{name}.yaml");

        if let Ok(dir) = std::env::var("ADRI_CONTRACTS_DIR") {
            let path = PathBuf::from(dir).join(&filename);
            let exists = path.is_file();
            return Ok(ContractResolutionResult {
                exists,
                source: ResolutionSource::EnvOverride,
                package_context: package_context.map(|p| p.to_path_buf()),
                strategy_used: resolution.strategy,
                path,
            });
        }

        let package_local_path = package_context.map(|ctx| {
            ctx.join(&resolution.package_subdirectory).join(&filename)
        });
        let centralized_path = config.paths.contracts.join(&filename);

        let (path, source) = match resolution.strategy {
            ResolutionStrategy::Flat => (centralized_path.clone(), ResolutionSource::Centralized),
            ResolutionStrategy::PackageLocal => match &package_local_path {
                Some(p) => (p.clone(), ResolutionSource::PackageLocal),
                None => (centralized_path.clone(), ResolutionSource::Fallback),
            },
            ResolutionStrategy::Hybrid => match &package_local_path {
                Some(p) if p.is_file() => (p.clone(), ResolutionSource::PackageLocal),
                _ => (centralized_path.clone(), ResolutionSource::Fallback),
            },
        };

        let exists = path.is_file();
        Ok(ContractResolutionResult {
            path,
            exists,
            source,
            package_context: package_context.map(|p| p.to_path_buf()),
            strategy_used: resolution.strategy,
        })
    }

    pub fn create_directory_structure(config: &AdriConfig) -> Result<()> {
        for dir in config.paths.all() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
