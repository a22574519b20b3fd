use thiserror::Error;

/// Crate-wide error type. One enum, one variant family per failing
/// subsystem, matching the rest of the corpus's convention of a single
/// `thiserror`-derived enum per crate.
#[derive(Error, Debug)]
pub enum AdriError {
    #[error("standard not found: {0}")]
    StandardNotFound(String),

    #[error("invalid standard{}: {message}", standard_name.as_ref().map(|n| format!(" '{n}'")).unwrap_or_default())]
    InvalidStandard {
        message: String,
        standard_name: Option<String>,
    },

    #[error("bundled standards directory not found: {0}")]
    StandardsDirectoryNotFound(String),

    #[error("config not found: {0}")]
    ConfigNotFound(String),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("{0}")]
    ProtectionError(String),

    #[error("data validation error: {0}")]
    DataValidationError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AdriError>;

impl AdriError {
    pub fn invalid_standard(message: impl Into<String>) -> Self {
        AdriError::InvalidStandard {
            message: message.into(),
            standard_name: None,
        }
    }

    pub fn invalid_standard_named(message: impl Into<String>, standard_name: impl Into<String>) -> Self {
        AdriError::InvalidStandard {
            message: message.into(),
            standard_name: Some(standard_name.into()),
        }
    }
}
