//! Log-space arithmetic helpers for the aligner.

/// Finite stand-in for `log(0)`. Chosen far enough from `f64::MIN` that a
/// handful of additions stay finite, which keeps the DP recurrences free of
/// NaN from `-inf + -inf` style expressions in the emission tables.
pub const LOG_ZERO: f64 = f64::MIN / 4.0;

/// log(sum(exp(v))) with the usual max subtraction for stability.
/// Entries of `-inf` contribute nothing; an all `-inf` input returns `-inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
  let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
  if !max.is_finite() {
    return max;
  }
  let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
  max + sum.ln()
}

/// `log(x)`, with zero mapped to the finite [`LOG_ZERO`] sentinel.
pub fn log_or_sentinel(x: f64) -> f64 {
  if x > 0.0 {
    x.ln()
  } else {
    LOG_ZERO
  }
}
