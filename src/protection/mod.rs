//! Protection Engine: the runtime guard that wraps a user function call
//! with standard resolution, assessment, a pass/fail decision, and an
//! audit trail. [`guard::Guard`] is the ergonomic adapter most callers
//! use; [`engine::ProtectionEngine`] is the engine it delegates to.

pub mod cache;
pub mod engine;
pub mod guard;

pub use cache::{fingerprint, AssessmentCache};
pub use engine::{ProtectOptions, ProtectionEngine};
pub use guard::Guard;
