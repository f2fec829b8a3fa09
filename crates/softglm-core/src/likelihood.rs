// =============================================================================
// Softplus GLM Likelihood and Gradient
// =============================================================================
//
// This is the numeric core of the estimator. Everything here is a pure
// function of its inputs: a feature matrix, labels, and the current weights.
//
// THE MODEL
// ---------
// For sample i with feature row x_i:
//
//     η_i = x_i · β + β₀           (linear predictor)
//     λ_i = log(1 + exp(η_i))      (softplus mean transform)
//
// and the log-likelihood (up to the label-only constant) is
//
//     ℓ(β, β₀) = Σ_i [ y_i × log(λ_i) - λ_i ]
//
// THE GRADIENT
// ------------
// The gradient vector has D + 1 slots: one per feature weight, then the bias.
//
//     slot j < D:  Σ_i (y_i - s_i) × x_ij        where s_i = sigmoid(η_i)
//     slot D:      Σ_i s_i - Σ_i y_i × s_i
//
// That vector is not the derivative of ℓ: its bias slot disagrees in sign
// with the weight slots. The exact derivative of ℓ (the score) is
//
//     ∂ℓ/∂η_i = (y_i / λ_i - 1) × s_i
//
// summed against x_ij for the weights and on its own for the bias. `score`
// returns it, and it is what optimizer steps follow.
//
// NUMERIC POLICY
// --------------
// softplus and sigmoid are evaluated in overflow-free form. λ_i is strictly
// positive in exact arithmetic, but in f64 it drops below `f64::MIN_POSITIVE`
// (into subnormals) once η_i < about -708, and underflows to 0 below about
// -745. Before taking log(λ_i) we floor λ_i at
// `LikelihoodConfig::lambda_floor`, so the result stays finite for every
// finite input. NaN features are not an error; they propagate into the sum.
//
// LAYOUT
// ------
// The feature matrix is N × D with one sample per row.
//
// =============================================================================

use ndarray::{s, Array1, Array2};
use tracing::{debug, trace};

use crate::error::{GlmError, Result};
use crate::math::{sigmoid, softplus};

// =============================================================================
// Configuration and State
// =============================================================================

/// Numeric policy for likelihood evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodConfig {
    /// Smallest λ passed to the logarithm.
    /// Default: `f64::MIN_POSITIVE`, which applies once η < about -708.
    pub lambda_floor: f64,
}

impl Default for LikelihoodConfig {
    fn default() -> Self {
        Self {
            lambda_floor: f64::MIN_POSITIVE,
        }
    }
}

/// Weight vector β and bias β₀ of a linear model.
///
/// Owned by whoever drives the optimizer; evaluation only borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearWeights {
    pub beta: Array1<f64>,
    pub beta0: f64,
}

impl LinearWeights {
    pub fn new(beta: Array1<f64>, beta0: f64) -> Self {
        Self { beta, beta0 }
    }

    /// All-zero weights for `d` features.
    pub fn zeros(d: usize) -> Self {
        Self {
            beta: Array1::zeros(d),
            beta0: 0.0,
        }
    }

    pub fn dim(&self) -> usize {
        self.beta.len()
    }

    /// Pack into a single vector laid out like the gradient: β then β₀.
    pub fn to_flat(&self) -> Array1<f64> {
        let d = self.dim();
        let mut flat = Array1::zeros(d + 1);
        flat.slice_mut(s![..d]).assign(&self.beta);
        flat[d] = self.beta0;
        flat
    }

    /// Inverse of [`LinearWeights::to_flat`].
    pub fn from_flat(flat: &Array1<f64>) -> Result<Self> {
        let Some(d) = flat.len().checked_sub(1) else {
            return Err(GlmError::InvalidArgument(
                "flat parameter vector must hold at least the bias".to_string(),
            ));
        };
        Ok(Self {
            beta: flat.slice(s![..d]).to_owned(),
            beta0: flat[d],
        })
    }
}

// =============================================================================
// Public Evaluators
// =============================================================================

/// Log-likelihood `Σ_i [ y_i log(λ_i) - λ_i ]` with λ_i = softplus(x_i·β + β₀).
///
/// # Errors
/// `InvalidArgument` if `x` has no rows, `labels` length differs from the row
/// count, or `β` length differs from the column count.
pub fn log_likelihood(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
    config: &LikelihoodConfig,
) -> Result<f64> {
    validate_inputs(x, labels, weights)?;

    let eta = linear_predictor(x, weights);
    let floor = config.lambda_floor;
    let mut clamped = 0usize;

    let value: f64 = eta
        .iter()
        .zip(labels.iter())
        .map(|(&e, &y)| {
            let lambda = floored_softplus(e, floor);
            if lambda == floor {
                clamped += 1;
            }
            y * lambda.ln() - lambda
        })
        .sum();

    if clamped > 0 {
        trace!(clamped, floor, "softplus mean floored before log");
    }
    debug!(n = x.nrows(), d = x.ncols(), value, "log-likelihood evaluated");

    Ok(value)
}

/// Gradient of the log-likelihood, length D + 1 (weights, then bias).
///
/// # Errors
/// Same preconditions as [`log_likelihood`].
pub fn log_likelihood_derivative(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
) -> Result<Array1<f64>> {
    validate_inputs(x, labels, weights)?;

    let d = x.ncols();
    let eta = linear_predictor(x, weights);
    let sig = eta.mapv(sigmoid);

    let residual = labels - &sig;
    let mut grad = Array1::zeros(d + 1);
    grad.slice_mut(s![..d]).assign(&x.t().dot(&residual));
    grad[d] = sig.sum() - (labels * &sig).sum();

    debug!(n = x.nrows(), d, bias_grad = grad[d], "log-likelihood gradient evaluated");

    Ok(grad)
}

/// Exact derivative of [`log_likelihood`], length D + 1 (weights, then bias).
///
/// Per sample `∂ℓ/∂η_i = (y_i / λ_i - 1) × sigmoid(η_i)`, with λ_i floored the
/// same way as in [`log_likelihood`]. Unlike [`log_likelihood_derivative`],
/// the weight and bias slots come from the same per-sample term, so a small
/// step along it never decreases the log-likelihood.
pub fn score(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
    config: &LikelihoodConfig,
) -> Result<Array1<f64>> {
    validate_inputs(x, labels, weights)?;

    let d = x.ncols();
    let floor = config.lambda_floor;
    let eta = linear_predictor(x, weights);
    let dl_deta: Array1<f64> = eta
        .iter()
        .zip(labels.iter())
        .map(|(&e, &y)| (y / floored_softplus(e, floor) - 1.0) * sigmoid(e))
        .collect();

    let mut grad = Array1::zeros(d + 1);
    grad.slice_mut(s![..d]).assign(&x.t().dot(&dl_deta));
    grad[d] = dl_deta.sum();

    debug!(n = x.nrows(), d, bias_score = grad[d], "score evaluated");

    Ok(grad)
}

/// [`score`] of the penalized objective: weight slots get `-τ × β_j`.
pub fn penalized_score(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
    tau: f64,
    config: &LikelihoodConfig,
) -> Result<Array1<f64>> {
    validate_tau(tau)?;
    let mut grad = score(x, labels, weights, config)?;
    let d = weights.dim();
    grad.slice_mut(s![..d]).scaled_add(-tau, &weights.beta);
    Ok(grad)
}

/// L2-penalized log-likelihood: `ℓ(β, β₀) - τ/2 × ‖β‖²`. The bias is not penalized.
pub fn penalized_log_likelihood(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
    tau: f64,
    config: &LikelihoodConfig,
) -> Result<f64> {
    validate_tau(tau)?;
    let ll = log_likelihood(x, labels, weights, config)?;
    Ok(ll - 0.5 * tau * weights.beta.dot(&weights.beta))
}

/// Gradient of [`penalized_log_likelihood`]: weight slots get `-τ × β_j`.
pub fn penalized_log_likelihood_derivative(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
    tau: f64,
) -> Result<Array1<f64>> {
    validate_tau(tau)?;
    let mut grad = log_likelihood_derivative(x, labels, weights)?;
    let d = weights.dim();
    grad.slice_mut(s![..d]).scaled_add(-tau, &weights.beta);
    Ok(grad)
}

/// Conditional mean λ_i = softplus(x_i·β + β₀) for every row of `x`.
///
/// An empty `x` yields an empty result.
pub fn predict(x: &Array2<f64>, weights: &LinearWeights) -> Result<Array1<f64>> {
    check_weight_dim(x, weights)?;
    Ok(linear_predictor(x, weights).mapv(softplus))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// η = Xβ + β₀
fn linear_predictor(x: &Array2<f64>, weights: &LinearWeights) -> Array1<f64> {
    x.dot(&weights.beta) + weights.beta0
}

/// softplus(η), raised to `floor` when smaller.
#[inline]
fn floored_softplus(eta: f64, floor: f64) -> f64 {
    let lambda = softplus(eta);
    if lambda < floor {
        floor
    } else {
        lambda
    }
}

fn validate_inputs(
    x: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &LinearWeights,
) -> Result<()> {
    let n = x.nrows();

    if n == 0 {
        return Err(GlmError::InvalidArgument(
            "feature matrix has no vectors".to_string(),
        ));
    }

    if labels.len() != n {
        return Err(GlmError::InvalidArgument(format!(
            "labels has {} elements but x has {} vectors",
            labels.len(),
            n
        )));
    }

    check_weight_dim(x, weights)
}

fn check_weight_dim(x: &Array2<f64>, weights: &LinearWeights) -> Result<()> {
    if weights.dim() != x.ncols() {
        return Err(GlmError::InvalidArgument(format!(
            "beta has {} elements but x has {} features",
            weights.dim(),
            x.ncols()
        )));
    }
    Ok(())
}

pub(crate) fn validate_tau(tau: f64) -> Result<()> {
    if !tau.is_finite() || tau < 0.0 {
        return Err(GlmError::InvalidArgument(format!(
            "tau must be finite and non-negative, got {}",
            tau
        )));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::f64::consts::LN_2;

    fn naive_sigmoid(z: f64) -> f64 {
        1.0 / (1.0 + (-z).exp())
    }

    #[test]
    fn test_single_zero_sample_is_minus_ln2() {
        // eta = 0, lambda = ln 2, label 0 -> likelihood = -ln 2
        let x = array![[0.0]];
        let y = array![0.0];
        let w = LinearWeights::zeros(1);

        let ll = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        assert_abs_diff_eq!(ll, -LN_2, epsilon = 1e-12);
        assert_abs_diff_eq!(ll, -0.6931, epsilon = 1e-4);
    }

    #[test]
    fn test_matches_hand_computation() {
        let x = array![[1.0, 2.0], [0.5, -1.0]];
        let y = array![3.0, 1.0];
        let w = LinearWeights::new(array![0.2, 0.1], -0.3);

        let expected: f64 = [(0.1_f64, 3.0_f64), (-0.3 + 0.1 - 0.1, 1.0)]
            .iter()
            .map(|&(eta, yi)| {
                let lambda = (1.0 + eta.exp()).ln();
                yi * lambda.ln() - lambda
            })
            .sum();

        let ll = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        assert_abs_diff_eq!(ll, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_input_is_invalid_argument() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        let w = LinearWeights::zeros(2);

        let err = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap_err();
        assert!(matches!(err, GlmError::InvalidArgument(_)));
        let err = log_likelihood_derivative(&x, &y, &w).unwrap_err();
        assert!(matches!(err, GlmError::InvalidArgument(_)));
    }

    #[test]
    fn test_label_mismatch_is_invalid_argument() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0];
        let w = LinearWeights::zeros(1);

        assert!(matches!(
            log_likelihood(&x, &y, &w, &LikelihoodConfig::default()),
            Err(GlmError::InvalidArgument(_))
        ));
        assert!(matches!(
            log_likelihood_derivative(&x, &y, &w),
            Err(GlmError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_weight_dimension_mismatch() {
        let x = array![[1.0, 2.0]];
        let y = array![1.0];
        let w = LinearWeights::zeros(3);

        assert!(matches!(
            log_likelihood(&x, &y, &w, &LikelihoodConfig::default()),
            Err(GlmError::InvalidArgument(_))
        ));
        assert!(matches!(predict(&x, &w), Err(GlmError::InvalidArgument(_))));
    }

    #[test]
    fn test_underflowing_lambda_is_clamped() {
        // softplus(-1000) underflows to exactly 0; log(0) would be -inf
        let x = array![[1.0]];
        let y = array![2.0];
        let w = LinearWeights::new(array![-1000.0], 0.0);
        let config = LikelihoodConfig::default();

        let ll = log_likelihood(&x, &y, &w, &config).unwrap();
        assert!(ll.is_finite());
        let expected = 2.0 * f64::MIN_POSITIVE.ln() - f64::MIN_POSITIVE;
        assert_abs_diff_eq!(ll, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_subnormal_lambda_is_clamped() {
        // softplus(-720) ~ 1.9e-313 is subnormal, below f64::MIN_POSITIVE
        let x = array![[1.0]];
        let y = array![1.0];
        let w = LinearWeights::new(array![-720.0], 0.0);

        assert!(softplus(-720.0) > 0.0);
        assert!(softplus(-720.0) < f64::MIN_POSITIVE);
        let ll = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        let expected = f64::MIN_POSITIVE.ln() - f64::MIN_POSITIVE;
        assert_abs_diff_eq!(ll, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_small_but_representable_lambda_is_not_clamped() {
        // softplus(-30) ~ exp(-30) is well above the floor: log(lambda) ~ -30
        let x = array![[1.0]];
        let y = array![1.0];
        let w = LinearWeights::new(array![-30.0], 0.0);

        let ll = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        assert_abs_diff_eq!(ll, -30.0, epsilon = 1e-6);
    }

    #[test]
    fn test_custom_floor() {
        let x = array![[1.0]];
        let y = array![1.0];
        let w = LinearWeights::new(array![-30.0], 0.0);
        let config = LikelihoodConfig { lambda_floor: 1e-10 };

        let ll = log_likelihood(&x, &y, &w, &config).unwrap();
        assert_abs_diff_eq!(ll, 1e-10_f64.ln() - 1e-10, epsilon = 1e-9);
    }

    #[test]
    fn test_large_eta_does_not_overflow() {
        let x = array![[1.0]];
        let y = array![1.0];
        let w = LinearWeights::new(array![1000.0], 0.0);

        let ll = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        assert_abs_diff_eq!(ll, 1000.0_f64.ln() - 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nan_feature_propagates() {
        let x = array![[f64::NAN]];
        let y = array![1.0];
        let w = LinearWeights::new(array![1.0], 0.0);

        let ll = log_likelihood(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        assert!(ll.is_nan());
    }

    #[test]
    fn test_gradient_has_d_plus_one_slots() {
        // The original routine sized its output by sample count (N + 1) and
        // only filled the bias slot. The gradient here is sized by feature
        // count and fills every weight slot.
        let x = array![[1.0, 0.0, 2.0], [0.0, 1.0, 1.0]];
        let y = array![1.0, 0.0];
        let w = LinearWeights::zeros(3);

        let grad = log_likelihood_derivative(&x, &y, &w).unwrap();
        assert_eq!(grad.len(), 4);
    }

    #[test]
    fn test_gradient_with_zero_features() {
        let x = Array2::<f64>::zeros((3, 0));
        let y = array![1.0, 0.0, 1.0];
        let w = LinearWeights::new(Array1::zeros(0), 0.0);

        let grad = log_likelihood_derivative(&x, &y, &w).unwrap();
        assert_eq!(grad.len(), 1);
        // s = 0.5 everywhere: 1.5 - (0.5 + 0.5)
        assert_abs_diff_eq!(grad[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_three_samples_by_hand() {
        let x = array![[1.0, 2.0], [-1.0, 0.5], [0.0, -3.0]];
        let y = array![1.0, 0.0, 2.0];
        let beta = [0.5, -0.25];
        let beta0 = 0.1;
        let w = LinearWeights::new(array![beta[0], beta[1]], beta0);

        let eta = [
            0.5 * 1.0 - 0.25 * 2.0 + 0.1,
            0.5 * -1.0 - 0.25 * 0.5 + 0.1,
            0.5 * 0.0 - 0.25 * -3.0 + 0.1,
        ];
        let s: Vec<f64> = eta.iter().map(|&z| naive_sigmoid(z)).collect();
        let labels = [1.0, 0.0, 2.0];

        let weighted: f64 = s.iter().zip(labels.iter()).map(|(si, yi)| si * yi).sum();
        let bias_expected = s.iter().sum::<f64>() - weighted;
        let grad0: f64 = (0..3).map(|i| (labels[i] - s[i]) * x[[i, 0]]).sum();
        let grad1: f64 = (0..3).map(|i| (labels[i] - s[i]) * x[[i, 1]]).sum();

        let grad = log_likelihood_derivative(&x, &y, &w).unwrap();
        // The original never filled the weight slots; they carry the full
        // per-feature components here.
        assert_abs_diff_eq!(grad[0], grad0, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[1], grad1, epsilon = 1e-12);
        assert_abs_diff_eq!(grad[2], bias_expected, epsilon = 1e-12);
    }

    #[test]
    fn test_score_matches_finite_differences() {
        let x = array![[1.0, 2.0], [-1.0, 0.5], [0.0, -3.0], [0.3, 0.3]];
        let y = array![1.0, 0.0, 2.0, 0.6];
        let w = LinearWeights::new(array![0.5, -0.25], 0.1);
        let config = LikelihoodConfig::default();

        let grad = score(&x, &y, &w, &config).unwrap();
        assert_eq!(grad.len(), 3);

        let h = 1e-6;
        let base = w.to_flat();
        for k in 0..3 {
            let mut up = base.clone();
            let mut down = base.clone();
            up[k] += h;
            down[k] -= h;
            let f_up = log_likelihood(&x, &y, &LinearWeights::from_flat(&up).unwrap(), &config)
                .unwrap();
            let f_down =
                log_likelihood(&x, &y, &LinearWeights::from_flat(&down).unwrap(), &config)
                    .unwrap();
            assert_abs_diff_eq!(grad[k], (f_up - f_down) / (2.0 * h), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_score_bias_differs_from_contract_gradient() {
        // All-zero labels at eta = 0: the contract bias slot is sum(s) = 1.0,
        // while the likelihood actually falls as the bias grows.
        let x = Array2::<f64>::zeros((2, 0));
        let y = array![0.0, 0.0];
        let w = LinearWeights::zeros(0);

        let contract = log_likelihood_derivative(&x, &y, &w).unwrap();
        let exact = score(&x, &y, &w, &LikelihoodConfig::default()).unwrap();
        assert_abs_diff_eq!(contract[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(exact[0], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_penalized_score_adds_ridge_term() {
        let x = array![[1.0, 2.0], [0.5, -1.0]];
        let y = array![1.0, 0.0];
        let w = LinearWeights::new(array![0.3, -0.2], 0.7);
        let config = LikelihoodConfig::default();

        let g = score(&x, &y, &w, &config).unwrap();
        let pg = penalized_score(&x, &y, &w, 2.0, &config).unwrap();
        assert_abs_diff_eq!(pg[0], g[0] - 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(pg[1], g[1] + 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(pg[2], g[2], epsilon = 1e-12);
    }

    #[test]
    fn test_penalty_only_touches_weights() {
        let x = array![[1.0, 2.0], [0.5, -1.0]];
        let y = array![1.0, 0.0];
        let w = LinearWeights::new(array![0.3, -0.2], 0.7);
        let config = LikelihoodConfig::default();
        let tau = 2.0;

        let ll = log_likelihood(&x, &y, &w, &config).unwrap();
        let pll = penalized_log_likelihood(&x, &y, &w, tau, &config).unwrap();
        assert_abs_diff_eq!(pll, ll - 0.5 * tau * (0.09 + 0.04), epsilon = 1e-12);

        let g = log_likelihood_derivative(&x, &y, &w).unwrap();
        let pg = penalized_log_likelihood_derivative(&x, &y, &w, tau).unwrap();
        assert_abs_diff_eq!(pg[0], g[0] - tau * 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(pg[1], g[1] + tau * 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(pg[2], g[2], epsilon = 1e-12);
    }

    #[test]
    fn test_negative_tau_rejected() {
        let x = array![[1.0]];
        let y = array![1.0];
        let w = LinearWeights::zeros(1);
        assert!(matches!(
            penalized_log_likelihood_derivative(&x, &y, &w, -1.0),
            Err(GlmError::InvalidArgument(_))
        ));
        assert!(matches!(
            penalized_log_likelihood(&x, &y, &w, f64::NAN, &LikelihoodConfig::default()),
            Err(GlmError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_predict_is_softplus_of_eta() {
        let x = array![[0.0], [1.0], [-2.0]];
        let w = LinearWeights::new(array![1.5], 0.5);

        let mean = predict(&x, &w).unwrap();
        for (i, &eta) in [0.5_f64, 2.0, -2.5].iter().enumerate() {
            assert_abs_diff_eq!(mean[i], (1.0 + eta.exp()).ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_flat_roundtrip_layout() {
        let w = LinearWeights::new(array![1.0, 2.0], 3.0);
        let flat = w.to_flat();
        assert_eq!(flat, array![1.0, 2.0, 3.0]);
        assert_eq!(LinearWeights::from_flat(&flat).unwrap(), w);
        assert!(LinearWeights::from_flat(&Array1::zeros(0)).is_err());
    }
}
