//! Numerically stable scalar transforms used by the likelihood.

/// Stable softplus: `log(1 + exp(x))`.
///
/// Rewritten as `max(x, 0) + log(1 + exp(-|x|))` so the exponential never
/// overflows. Strictly positive for finite `x` until `exp(x)` underflows
/// (around `x < -745`), where it returns exactly zero.
#[inline]
pub fn softplus(x: f64) -> f64 {
    let e = (-x.abs()).exp();
    x.max(0.0) + e.ln_1p()
}

/// Stable logistic sigmoid: `1 / (1 + exp(-x))`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    let e = (-x.abs()).exp();
    let recip = 1.0 / (1.0 + e);
    if x >= 0.0 {
        recip
    } else {
        e * recip
    }
}
