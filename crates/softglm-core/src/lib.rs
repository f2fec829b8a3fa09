// =============================================================================
// softglm Core Library
// =============================================================================
//
// Log-likelihood and gradient evaluation for a softplus-link generalized
// linear model, plus the small amount of model plumbing around it.
//
// STRUCTURE:
// ----------
//   - likelihood:  The numeric core (log-likelihood, gradient, prediction)
//   - math:        Stable softplus / sigmoid
//   - glm:         The `Glm` estimator holding hyperparameters and weights
//   - updater:     Descent updaters consuming the gradient
//   - parameters:  Queryable parameter descriptors
//   - families:    Distribution family tags
//   - links:       Link function tags
//   - error:       Error types used throughout the library
//
// Evaluation is synchronous and pure. Nothing here spawns threads or keeps
// global state; the weights are passed (or owned by `Glm`) explicitly.
//
// =============================================================================

pub mod error;
pub mod families;
pub mod glm;
pub mod likelihood;
pub mod links;
pub mod math;
pub mod parameters;
pub mod updater;

pub use error::{GlmError, Result};
pub use families::DistributionFamily;
pub use glm::Glm;
pub use likelihood::{
    log_likelihood, log_likelihood_derivative, penalized_log_likelihood,
    penalized_log_likelihood_derivative, penalized_score, predict, score, LikelihoodConfig,
    LinearWeights,
};
pub use links::LinkFunction;
pub use parameters::{Mutability, ParameterDescriptor, ParameterTable, ParameterValue};
pub use updater::{DescendConfig, DescendKind, DescendUpdater};
