//! Bundled Standards Loader: discovers and parses the standards shipped
//! inside the crate's read-only asset directory, behind a
//! `Created -> Validated -> Ready` state machine and a bounded LRU
//! cache.

use crate::error::{AdriError, Result};
use crate::types::Standard;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const DEFAULT_CACHE_SIZE: usize = 128;

/// The directory this crate ships its own bundled standards in
/// (`standards/bundled/` at the repository root, resolved relative to
/// the crate manifest so it works regardless of the caller's cwd).
pub fn default_bundled_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("standards/bundled")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Created,
    Validated,
    Ready,
}

#[derive(Debug, Clone)]
pub struct StandardMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub file_path: PathBuf,
}

/// Loads standards from a bundled directory, caching parsed documents
/// behind a bounded LRU. Safe for concurrent `load`/`exists`/`list`/
/// `metadata` calls — the lock is never held while re-entering the
/// loader.
pub struct BundledStandardsLoader {
    dir: PathBuf,
    state: State,
    cache: Mutex<LruCache<String, Standard>>,
}

impl BundledStandardsLoader {
    /// Fails immediately with [`AdriError::StandardsDirectoryNotFound`]
    /// if `dir` does not exist or is not a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_cache_size(dir, DEFAULT_CACHE_SIZE)
    }

    pub fn with_cache_size(dir: impl Into<PathBuf>, cache_size: usize) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(AdriError::StandardsDirectoryNotFound(dir.display().to_string()));
        }
        let cache_size = NonZeroUsize::new(cache_size.max(1)).unwrap();
        Ok(Self {
            dir,
            state: State::Ready,
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.yaml"))
    }

    pub fn load(&self, name: &str) -> Result<Standard> {
        debug_assert_eq!(self.state, State::Ready);

        if let Some(cached) = self.cache.lock().get(name) {
            tracing::debug!(standard = name, "bundled standard cache hit");
            return Ok(cached.clone());
        }
        tracing::debug!(standard = name, "bundled standard cache miss");

        let path = self.path_for(name);
        if !path.is_file() {
            return Err(AdriError::StandardNotFound(name.to_string()));
        }
        let raw = std::fs::read_to_string(&path)?;
        let standard: Standard = serde_yaml::from_str(&raw)
            .map_err(|e| AdriError::invalid_standard_named(e.to_string(), name))?;
        validate_structure(&standard, name)?;

        self.cache.lock().put(name.to_string(), standard.clone());
        Ok(standard)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn metadata(&self, name: &str) -> Result<StandardMetadata> {
        let standard = self.load(name)?;
        Ok(StandardMetadata {
            id: standard.standards.id.clone(),
            name: standard.standards.name.clone(),
            version: standard.standards.version.clone(),
            description: standard.standards.description.clone(),
            file_path: self.path_for(name),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }
}

fn validate_structure(standard: &Standard, name: &str) -> Result<()> {
    if standard.standards.id.is_empty() || standard.standards.name.is_empty() || standard.standards.version.is_empty() {
        return Err(AdriError::invalid_standard_named(
            "'standards' section must declare id, name and version",
            name,
        ));
    }
    if !standard.requirements.overall_minimum.is_finite() {
        return Err(AdriError::invalid_standard_named(
            "'requirements.overall_minimum' must be a finite number",
            name,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_standard(dir: &Path, name: &str) {
        let yaml = format!(
            "standards:\n  id: {name}\n  name: {name}\n  version: \"1.0.0\"\nrequirements:\n  overall_minimum: 75.0\n  field_requirements: {{}}\n  dimension_requirements: {{}}\n"
        );
        let mut f = std::fs::File::create(dir.join(format!("{name}.yaml"))).unwrap();
        f.write_all(yaml.as_bytes()).unwrap();
    }

    #[test]
    fn missing_directory_fails_construction() {
        let err = BundledStandardsLoader::new("/nonexistent/path/xyz");
        assert!(matches!(err, Err(AdriError::StandardsDirectoryNotFound(_))));
    }

    #[test]
    fn load_parses_and_caches() {
        let tmp = tempfile::tempdir().unwrap();
        write_standard(tmp.path(), "customer_data");
        let loader = BundledStandardsLoader::new(tmp.path()).unwrap();
        let s1 = loader.load("customer_data").unwrap();
        let s2 = loader.load("customer_data").unwrap();
        assert_eq!(s1.standards.id, s2.standards.id);
    }

    #[test]
    fn list_is_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        write_standard(tmp.path(), "zeta");
        write_standard(tmp.path(), "alpha");
        let loader = BundledStandardsLoader::new(tmp.path()).unwrap();
        assert_eq!(loader.list().unwrap(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn exists_reflects_filesystem() {
        let tmp = tempfile::tempdir().unwrap();
        write_standard(tmp.path(), "present");
        let loader = BundledStandardsLoader::new(tmp.path()).unwrap();
        assert!(loader.exists("present"));
        assert!(!loader.exists("absent"));
    }

    #[test]
    fn bundled_customer_data_standard_loads() {
        let loader = BundledStandardsLoader::new(default_bundled_dir()).unwrap();
        let standard = loader.load("customer_data").unwrap();
        assert_eq!(standard.standards.name, "customer_data");
        assert_eq!(standard.primary_key_fields(), &["customer_id".to_string()]);
    }

    #[test]
    fn load_missing_standard_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = BundledStandardsLoader::new(tmp.path()).unwrap();
        assert!(matches!(loader.load("nope"), Err(AdriError::StandardNotFound(_))));
    }
}
