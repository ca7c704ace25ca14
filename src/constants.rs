//! Model constants shared across the crate.

/// Nucleotide substitution rates estimated by Yang (1994). Used as the
/// fallback 4x4 kernel of the MG94 codon model when no GTR exchangeabilities
/// are supplied. Row/column order is A, C, G, T.
pub const YANG94_NUC_RATES: [[f64; 4]; 4] = [
  [-0.818, 0.132, 0.586, 0.100],
  [0.221, -1.349, 0.231, 0.897],
  [0.909, 0.215, -1.322, 0.198],
  [0.100, 0.537, 0.128, -0.765],
];

/// Default stationary nucleotide frequencies (A, C, G, T).
pub const DEFAULT_PI: [f64; 4] = [0.308, 0.185, 0.199, 0.308];

/// Default nonsynonymous/synonymous rate ratio.
pub const DEFAULT_OMEGA: f64 = 0.2;

/// Default branch length between the two sequences, in expected
/// substitutions per site.
pub const DEFAULT_BRANCH_LENGTH: f64 = 0.0133;

/// Default per-site gap opening probability.
pub const DEFAULT_GAP_OPEN: f64 = 0.001;

/// Default per-site gap extension probability (mean gap length of 6 sites).
pub const DEFAULT_GAP_EXTEND: f64 = 1.0 - 1.0 / 6.0;

/// Tolerance for checking that probability vectors and matrix rows are
/// normalized.
pub const NORM_TOLERANCE: f64 = 1e-6;
