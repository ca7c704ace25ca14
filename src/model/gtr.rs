//! General-time-reversible nucleotide kernel.

use crate::out_of_range;
use eyre::Report;
use ndarray::Array2;

/// Build the 4x4 GTR rate matrix from six exchangeabilities and the
/// stationary frequencies: `q(i,j) = sigma_ij * pi_j` off the diagonal, the
/// diagonal set to minus the row sum. `sigma` is ordered AC, AG, AT, CG, CT,
/// GT; each value must lie in [0, 1].
pub fn gtr_rates(pi: &[f64; 4], sigma: &[f64; 6]) -> Result<Array2<f64>, Report> {
  if sigma.iter().any(|s| *s < 0.0 || *s > 1.0) {
    return out_of_range!("GTR exchangeability values must be in [0, 1], got {sigma:?}");
  }

  let mut q = Array2::<f64>::zeros((4, 4));
  let pairs = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
  for (&(i, j), &s) in pairs.iter().zip(sigma.iter()) {
    q[[i, j]] = s;
    q[[j, i]] = s;
  }
  for i in 0..4 {
    for j in 0..4 {
      q[[i, j]] *= pi[j];
    }
  }
  for i in 0..4 {
    let row_sum: f64 = (0..4).filter(|j| *j != i).map(|j| q[[i, j]]).sum();
    q[[i, i]] = -row_sum;
  }
  Ok(q)
}
