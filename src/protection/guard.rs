//! Guard Adapter: the ergonomic, explicit-contract entry point most
//! callers use instead of [`super::engine::ProtectionEngine`] directly.
//! Rust has no reflection to pull a function's data parameter out of
//! its argument list, so `Guard` takes the dataset as an explicit
//! argument to `protect` rather than inferring it from a wrapped
//! callable's positional/keyword arguments.

use crate::config::AdriConfig;
use crate::error::Result;
use crate::value::Dataset;

use super::engine::{ProtectOptions, ProtectionEngine};

/// A named, reusable guard: binds a function name and a set of
/// protection options to an underlying [`ProtectionEngine`], so a call
/// site only supplies the dataset and the closure to run.
///
/// ```ignore
/// let guard = Guard::new(engine, "process_orders")
///     .with_options(ProtectOptions::new().with_min_score(80.0));
/// let total = guard.call(&orders, |data| compute_total(data))?;
/// ```
pub struct Guard<'a> {
    engine: &'a ProtectionEngine,
    function_name: String,
    options: ProtectOptions,
}

impl<'a> Guard<'a> {
    pub fn new(engine: &'a ProtectionEngine, function_name: impl Into<String>) -> Self {
        Self {
            engine,
            function_name: function_name.into(),
            options: ProtectOptions::new(),
        }
    }

    pub fn with_options(mut self, options: ProtectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options_mut(&mut self) -> &mut ProtectOptions {
        &mut self.options
    }

    /// Runs `func(data)` through the bound engine's protection
    /// pipeline, under this guard's function name and options.
    pub fn call<T>(&self, data: &Dataset, func: impl FnOnce(&Dataset) -> T) -> Result<T> {
        self.engine.protect(&self.function_name, data, &self.options, func)
    }
}

/// Convenience constructor bypassing `ProtectionEngine` construction
/// for the common case of a single ad-hoc protected call.
pub fn protect<T>(
    config: AdriConfig,
    function_name: &str,
    data: &Dataset,
    options: ProtectOptions,
    func: impl FnOnce(&Dataset) -> T,
) -> Result<T> {
    let engine = ProtectionEngine::new(config)?;
    engine.protect(function_name, data, &options, func)
}
