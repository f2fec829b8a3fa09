// =============================================================================
// GLM Estimator
// =============================================================================
//
// `Glm` bundles the hyperparameters (τ, family, link, descent updater), the
// numeric policy, and the current linear weights. Every evaluation borrows
// the weights; only `set_weights`, `init_weights`, `set_parameter`, and
// `descend_step` change them.
//
// The estimator does not run a training loop. A driver calls `descend_step`
// (or evaluates the gradient and updates the weights itself) as many times as
// it likes and decides when to stop.
//
// REGISTERED PARAMETERS
// ---------------------
//   tau              L2 regularization parameter        setting
//   descend_updater  updater used for the weights       setting
//   family           distribution family used           setting
//   link_fn          link function used                 setting
//   w                weight vector β                    model
//   bias             bias β₀                            model
//
// =============================================================================

use ndarray::{Array1, Array2};
use tracing::debug;

use crate::error::{GlmError, Result};
use crate::families::DistributionFamily;
use crate::likelihood::{self, LikelihoodConfig, LinearWeights};
use crate::links::LinkFunction;
use crate::parameters::{Mutability, ParameterTable, ParameterValue};
use crate::updater::DescendUpdater;

/// Softplus-link generalized linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct Glm {
    tau: f64,
    family: DistributionFamily,
    link: LinkFunction,
    updater: DescendUpdater,
    config: LikelihoodConfig,
    weights: LinearWeights,
    parameters: ParameterTable,
}

impl Default for Glm {
    fn default() -> Self {
        Self::new()
    }
}

impl Glm {
    /// Model with τ = 0, default family/link/updater and no features yet.
    pub fn new() -> Self {
        Self {
            tau: 0.0,
            family: DistributionFamily::default(),
            link: LinkFunction::default(),
            updater: DescendUpdater::default(),
            config: LikelihoodConfig::default(),
            weights: LinearWeights::zeros(0),
            parameters: register_parameters(),
        }
    }

    /// Model with explicit settings.
    ///
    /// # Errors
    /// `InvalidArgument` if `tau` is negative or not finite.
    pub fn with_settings(
        updater: DescendUpdater,
        family: DistributionFamily,
        link: LinkFunction,
        tau: f64,
    ) -> Result<Self> {
        likelihood::validate_tau(tau)?;
        Ok(Self {
            tau,
            family,
            link,
            updater,
            ..Self::new()
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn family(&self) -> DistributionFamily {
        self.family
    }

    pub fn link(&self) -> LinkFunction {
        self.link
    }

    pub fn updater(&self) -> &DescendUpdater {
        &self.updater
    }

    pub fn config(&self) -> &LikelihoodConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LikelihoodConfig) {
        self.config = config;
    }

    pub fn weights(&self) -> &LinearWeights {
        &self.weights
    }

    /// Replace the weights wholesale.
    pub fn set_weights(&mut self, weights: LinearWeights) {
        self.weights = weights;
    }

    /// Reset to zero weights for `d` features. Also clears updater velocity.
    pub fn init_weights(&mut self, d: usize) {
        self.weights = LinearWeights::zeros(d);
        self.updater.reset();
    }

    /// The registered parameter descriptors.
    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    // -------------------------------------------------------------------------
    // Evaluation (at the model's current weights)
    // -------------------------------------------------------------------------

    pub fn log_likelihood(&self, x: &Array2<f64>, labels: &Array1<f64>) -> Result<f64> {
        likelihood::log_likelihood(x, labels, &self.weights, &self.config)
    }

    pub fn log_likelihood_derivative(
        &self,
        x: &Array2<f64>,
        labels: &Array1<f64>,
    ) -> Result<Array1<f64>> {
        likelihood::log_likelihood_derivative(x, labels, &self.weights)
    }

    pub fn penalized_log_likelihood(&self, x: &Array2<f64>, labels: &Array1<f64>) -> Result<f64> {
        likelihood::penalized_log_likelihood(x, labels, &self.weights, self.tau, &self.config)
    }

    pub fn penalized_log_likelihood_derivative(
        &self,
        x: &Array2<f64>,
        labels: &Array1<f64>,
    ) -> Result<Array1<f64>> {
        likelihood::penalized_log_likelihood_derivative(x, labels, &self.weights, self.tau)
    }

    pub fn score(&self, x: &Array2<f64>, labels: &Array1<f64>) -> Result<Array1<f64>> {
        likelihood::score(x, labels, &self.weights, &self.config)
    }

    pub fn penalized_score(&self, x: &Array2<f64>, labels: &Array1<f64>) -> Result<Array1<f64>> {
        likelihood::penalized_score(x, labels, &self.weights, self.tau, &self.config)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        likelihood::predict(x, &self.weights)
    }

    /// One updater step uphill on the penalized log-likelihood.
    ///
    /// Follows [`Glm::penalized_score`], not `log_likelihood_derivative`,
    /// whose bias slot does not point along the objective. The updater
    /// descends, so it receives the negated score. With a small enough
    /// learning rate the penalized log-likelihood does not decrease.
    /// Returns the score evaluated before the step.
    pub fn descend_step(&mut self, x: &Array2<f64>, labels: &Array1<f64>) -> Result<Array1<f64>> {
        let grad = self.penalized_score(x, labels)?;
        let loss_grad = -&grad;
        let next = self.updater.update(&self.weights.to_flat(), &loss_grad)?;
        self.weights = LinearWeights::from_flat(&next)?;

        debug!(
            d = self.weights.dim(),
            bias = self.weights.beta0,
            "weights updated"
        );

        Ok(grad)
    }

    // -------------------------------------------------------------------------
    // Parameter access by name
    // -------------------------------------------------------------------------

    /// Read a registered parameter.
    pub fn get_parameter(&self, name: &str) -> Result<ParameterValue> {
        match name {
            "tau" => Ok(ParameterValue::Real(self.tau)),
            "descend_updater" => Ok(ParameterValue::Updater(self.updater.clone())),
            "family" => Ok(ParameterValue::Family(self.family)),
            "link_fn" => Ok(ParameterValue::Link(self.link)),
            "w" => Ok(ParameterValue::Vector(self.weights.beta.clone())),
            "bias" => Ok(ParameterValue::Real(self.weights.beta0)),
            _ => Err(GlmError::UnknownParameter(name.to_string())),
        }
    }

    /// Write a registered parameter.
    ///
    /// `family` and `link_fn` also accept `ParameterValue::Text` names. Once
    /// the weights have a dimension, `w` must keep it; use
    /// [`Glm::init_weights`] or [`Glm::set_weights`] to change it.
    ///
    /// # Errors
    /// `UnknownParameter` for names not in the table, `InvalidArgument` for a
    /// value of the wrong kind, an unparsable name, a `w` of the wrong length,
    /// or a negative τ.
    pub fn set_parameter(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        if !self.parameters.contains(name) {
            return Err(GlmError::UnknownParameter(name.to_string()));
        }

        match (name, value) {
            ("tau", ParameterValue::Real(tau)) => {
                likelihood::validate_tau(tau)?;
                self.tau = tau;
            }
            ("descend_updater", ParameterValue::Updater(updater)) => self.updater = updater,
            ("family", ParameterValue::Family(family)) => self.family = family,
            ("family", ParameterValue::Text(s)) => self.family = s.parse()?,
            ("link_fn", ParameterValue::Link(link)) => self.link = link,
            ("link_fn", ParameterValue::Text(s)) => self.link = s.parse()?,
            ("w", ParameterValue::Vector(beta)) => {
                let dim = self.weights.dim();
                if dim != 0 && beta.len() != dim {
                    return Err(GlmError::InvalidArgument(format!(
                        "w has {} elements but the model has {} features",
                        beta.len(),
                        dim
                    )));
                }
                self.weights.beta = beta;
            }
            ("bias", ParameterValue::Real(beta0)) => self.weights.beta0 = beta0,
            (_, other) => {
                return Err(GlmError::InvalidArgument(format!(
                    "parameter '{}' does not accept a {} value",
                    name,
                    other.kind()
                )));
            }
        }

        debug!(parameter = name, "parameter set");
        Ok(())
    }
}

fn register_parameters() -> ParameterTable {
    let mut table = ParameterTable::new();
    table
        .register("tau", "L2 Regularization parameter", Mutability::Setting)
        .register(
            "descend_updater",
            "Descend Updater used for updating weights",
            Mutability::Setting,
        )
        .register("family", "Distribution Family used", Mutability::Setting)
        .register("link_fn", "Link function used", Mutability::Setting)
        .register("w", "Parameter vector w", Mutability::Model)
        .register("bias", "Bias term", Mutability::Model);
    table
}

// =============================================================================
// Tests
// =============================================================================
