// =============================================================================
// Error Types
// =============================================================================
//
// Every fallible operation in the library returns `Result<T>`, which is
// `std::result::Result<T, GlmError>`. Errors are reported synchronously to the
// caller and never recovered internally.
//
// Numeric degeneracy (a softplus that underflows to zero, a NaN feature) is
// NOT an error: see `LikelihoodConfig` for the clamping policy.
//
// =============================================================================

use thiserror::Error;

/// Errors raised by the GLM evaluator and its hyperparameter container.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlmError {
    /// Inputs violate a precondition: no samples, label count differs from
    /// sample count, weight dimension differs from feature dimension, or a
    /// parameter value of the wrong kind.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parameter name that was never registered on the model.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GlmError>;
