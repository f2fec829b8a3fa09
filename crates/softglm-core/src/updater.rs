//! Descent updaters that turn a gradient into new parameters.
//!
//! The [`DescendUpdater`] applies one step of a first-order method:
//!
//! - [`DescendKind::GradientDescent`]: `θ' = θ - η g`
//! - [`DescendKind::Momentum`]: `v' = μ v - η g`, `θ' = θ + v'`
//!
//! Updaters always *descend*: pass the gradient of the quantity being
//! minimized. Momentum keeps its velocity between calls; the velocity is sized
//! on first use and reset whenever the parameter dimension changes.
//!
//! The updater does not decide when to stop. Iteration belongs to the caller.

use ndarray::Array1;
use tracing::debug;

use crate::error::{GlmError, Result};

/// Which update rule to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DescendKind {
    /// Plain steepest descent
    #[default]
    GradientDescent,
    /// Heavy-ball momentum
    Momentum,
}

impl DescendKind {
    pub fn name(&self) -> &'static str {
        match self {
            DescendKind::GradientDescent => "gradient_descent",
            DescendKind::Momentum => "momentum",
        }
    }
}

/// Step-size settings shared by all update rules.
#[derive(Debug, Clone, PartialEq)]
pub struct DescendConfig {
    /// Step size η. Must be positive and finite.
    pub learning_rate: f64,
    /// Velocity decay μ in `[0, 1)`. Ignored by plain gradient descent.
    pub momentum: f64,
}

impl Default for DescendConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            momentum: 0.9,
        }
    }
}

/// First-order parameter updater.
///
/// # Example
///
/// ```
/// use ndarray::array;
/// use softglm_core::updater::DescendUpdater;
///
/// let mut updater = DescendUpdater::gradient_descent(0.5).unwrap();
/// let next = updater.update(&array![1.0, 2.0], &array![2.0, -2.0]).unwrap();
/// assert_eq!(next, array![0.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DescendUpdater {
    kind: DescendKind,
    config: DescendConfig,
    velocity: Option<Array1<f64>>,
}

impl Default for DescendUpdater {
    fn default() -> Self {
        Self {
            kind: DescendKind::default(),
            config: DescendConfig::default(),
            velocity: None,
        }
    }
}

impl DescendUpdater {
    /// Create an updater, validating the configuration.
    pub fn new(kind: DescendKind, config: DescendConfig) -> Result<Self> {
        if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
            return Err(GlmError::InvalidArgument(format!(
                "learning_rate must be positive and finite, got {}",
                config.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&config.momentum) {
            return Err(GlmError::InvalidArgument(format!(
                "momentum must be in [0, 1), got {}",
                config.momentum
            )));
        }
        Ok(Self {
            kind,
            config,
            velocity: None,
        })
    }

    pub fn gradient_descent(learning_rate: f64) -> Result<Self> {
        Self::new(
            DescendKind::GradientDescent,
            DescendConfig {
                learning_rate,
                ..DescendConfig::default()
            },
        )
    }

    pub fn momentum(learning_rate: f64, momentum: f64) -> Result<Self> {
        Self::new(DescendKind::Momentum, DescendConfig { learning_rate, momentum })
    }

    pub fn kind(&self) -> DescendKind {
        self.kind
    }

    pub fn config(&self) -> &DescendConfig {
        &self.config
    }

    /// Forget any accumulated velocity.
    pub fn reset(&mut self) {
        self.velocity = None;
    }

    /// Apply one step and return the new parameters.
    ///
    /// # Errors
    /// `InvalidArgument` if `params` and `gradient` differ in length.
    pub fn update(&mut self, params: &Array1<f64>, gradient: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != gradient.len() {
            return Err(GlmError::InvalidArgument(format!(
                "gradient has {} elements but params has {}",
                gradient.len(),
                params.len()
            )));
        }

        let lr = self.config.learning_rate;
        let next = match self.kind {
            DescendKind::GradientDescent => params - &(gradient * lr),
            DescendKind::Momentum => {
                let mu = self.config.momentum;
                let velocity = match self.velocity.take() {
                    Some(v) if v.len() == params.len() => v * mu - gradient * lr,
                    _ => gradient * -lr,
                };
                let next = params + &velocity;
                self.velocity = Some(velocity);
                next
            }
        };

        debug!(
            kind = self.kind.name(),
            dim = params.len(),
            learning_rate = lr,
            "descend step applied"
        );

        Ok(next)
    }
}
