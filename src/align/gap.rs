//! Affine gap model parameters.

use crate::constants::{DEFAULT_GAP_EXTEND, DEFAULT_GAP_OPEN};
use crate::{invalid_input, out_of_range};
use eyre::Report;

/// Geometric gap model: per-site opening and extension probabilities, and the
/// unit length at which gaps are allowed (1 = arbitrary frameshifts,
/// 3 = in-frame only).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapParams {
  pub open: f64,
  pub extend: f64,
  pub len: usize,
}

impl Default for GapParams {
  fn default() -> Self {
    Self {
      open: DEFAULT_GAP_OPEN,
      extend: DEFAULT_GAP_EXTEND,
      len: 1,
    }
  }
}

/// The gap probabilities in log space, precomputed once per run.
#[derive(Debug, Clone, Copy)]
pub struct TransWeights {
  /// log(1 - open)
  pub no_gap: f64,
  /// log(1 - extend)
  pub gap_stop: f64,
  /// log(open)
  pub gap_open: f64,
  /// log(extend)
  pub gap_extend: f64,
}

impl TransWeights {
  pub fn new(gap: &GapParams) -> Result<Self, Report> {
    if gap.open <= 0.0 || gap.open >= 1.0 {
      return out_of_range!("gap opening probability must be in (0, 1), got {}", gap.open);
    }
    if gap.extend <= 0.0 || gap.extend >= 1.0 {
      return out_of_range!("gap extension probability must be in (0, 1), got {}", gap.extend);
    }
    if gap.len != 1 && gap.len != 3 {
      return invalid_input!("gap unit length must be 1 or 3, got {}", gap.len);
    }
    Ok(Self {
      no_gap: (-gap.open).ln_1p(),
      gap_stop: (-gap.extend).ln_1p(),
      gap_open: gap.open.ln(),
      gap_extend: gap.extend.ln(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::error::{error_kind, AlignError};
  use approx::assert_abs_diff_eq;

  #[test]
  fn default_weights_are_log_probabilities() {
    let w = TransWeights::new(&GapParams::default()).unwrap();
    assert_abs_diff_eq!(w.no_gap, (1.0 - 0.001_f64).ln(), epsilon = 1e-12);
    assert_abs_diff_eq!(w.gap_stop, (1.0_f64 / 6.0).ln(), epsilon = 1e-12);
    assert_abs_diff_eq!(w.gap_open.exp(), 0.001, epsilon = 1e-12);
    assert_abs_diff_eq!(w.gap_extend.exp(), 5.0 / 6.0, epsilon = 1e-12);
  }

  #[test]
  fn rejects_degenerate_probabilities() {
    for (open, extend) in [(0.0, 0.5), (1.0, 0.5), (0.5, 0.0), (0.5, 1.2)] {
      let err = TransWeights::new(&GapParams { open, extend, len: 1 }).unwrap_err();
      assert!(matches!(error_kind(&err), Some(AlignError::OutOfRange(_))));
    }
  }

  #[test]
  fn rejects_bad_gap_unit() {
    let err = TransWeights::new(&GapParams { len: 2, ..GapParams::default() }).unwrap_err();
    assert!(matches!(error_kind(&err), Some(AlignError::InvalidInput(_))));
  }
}
