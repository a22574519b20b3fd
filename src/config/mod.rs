//! Config Resolver: configuration discovery plus contract-path
//! resolution strategies.

pub mod loader;
pub mod types;

pub use loader::ConfigurationLoader;
pub use types::{
    AdriConfig, AssessmentConfig, ContractResolutionResult, FailureMode, GenerationConfig,
    PathsConfig, ProtectionConfig, ResolutionConfig, ResolutionSource, ResolutionStrategy,
};
