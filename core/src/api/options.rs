//! Engine configuration.

use crate::vm::EvalOptions;

/// Options fixed for the lifetime of an [`Engine`](super::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Limits applied to every decode.
    pub eval: EvalOptions,
    /// Keep compiled programs for reuse by later calls with the same
    /// schema pair.
    pub cache_programs: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            eval: EvalOptions::default(),
            cache_programs: true,
        }
    }
}
