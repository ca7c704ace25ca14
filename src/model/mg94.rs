//! Muse & Gaut (1994) codon substitution model.
//!
//! A 64x64 generator is assembled from a 4x4 nucleotide kernel (Yang 1994 by
//! default, GTR when exchangeabilities are supplied), with single-nucleotide
//! codon changes weighted by omega when they change the amino-acid group.
//! The generator is normalized to one expected substitution per unit branch
//! length and exponentiated over the branch.

use crate::alphabet::codon::{codon_base, codon_distance, is_synonymous, NUM_CODONS};
use crate::constants::{NORM_TOLERANCE, YANG94_NUC_RATES};
use crate::model::expm::expm;
use crate::model::gtr::gtr_rates;
use crate::out_of_range;
use eyre::Report;
use ndarray::Array2;

/// Stationary frequency of a codon under independent site frequencies.
fn codon_pi(index: usize, pi: &[f64; 4]) -> f64 {
  pi[codon_base(index, 0)] * pi[codon_base(index, 1)] * pi[codon_base(index, 2)]
}

fn validate_pi(pi: &[f64; 4]) -> Result<(), Report> {
  let total: f64 = pi.iter().sum();
  if (total - 1.0).abs() > NORM_TOLERANCE {
    return out_of_range!("nucleotide frequencies must sum to 1, got {total}");
  }
  if pi.iter().any(|p| *p < 0.0) {
    return out_of_range!("nucleotide frequencies must be non-negative, got {pi:?}");
  }
  Ok(())
}

/// The normalized MG94 generator (expected one substitution per unit time).
pub fn mg94_q(omega: f64, pi: &[f64; 4], sigma: &[f64; 6]) -> Result<Array2<f64>, Report> {
  validate_pi(pi)?;

  let nuc_q = if sigma.iter().any(|s| *s > 0.0) {
    gtr_rates(pi, sigma)?
  } else {
    Array2::from_shape_fn((4, 4), |(i, j)| YANG94_NUC_RATES[i][j])
  };

  let mut q = Array2::<f64>::zeros((NUM_CODONS, NUM_CODONS));
  let mut rate = 0.0;
  for i in 0..NUM_CODONS {
    let mut row_sum = 0.0;
    for j in 0..NUM_CODONS {
      if i == j || codon_distance(i, j) != 1 {
        continue;
      }
      let pos = (0..3)
        .find(|&p| codon_base(i, p) != codon_base(j, p))
        .expect("distance-1 codons differ at one position");
      let w = if is_synonymous(i, j) { 1.0 } else { omega };
      q[[i, j]] = w * nuc_q[[codon_base(i, pos), codon_base(j, pos)]];
      row_sum += q[[i, j]];
    }
    q[[i, i]] = -row_sum;
    rate += codon_pi(i, pi) * row_sum;
  }

  Ok(q / rate)
}

/// The 64x64 transition probability matrix P = exp(Q * t).
pub fn mg94_p(
  branch_length: f64,
  omega: f64,
  pi: &[f64; 4],
  sigma: &[f64; 6],
) -> Result<Array2<f64>, Report> {
  if branch_length <= 0.0 {
    return out_of_range!("branch length must be positive, got {branch_length}");
  }
  let q = mg94_q(omega, pi, sigma)?;
  // rounding in the exponential can leave entries a hair below zero
  Ok(expm(&(q * branch_length)).mapv(|x| x.max(0.0)))
}

/// Nucleotide-level companion of [`mg94_p`]: the same 4x4 kernel normalized
/// to one substitution per site and exponentiated. Drives the `dna` model.
pub fn nuc_p(
  branch_length: f64,
  pi: &[f64; 4],
  sigma: &[f64; 6],
) -> Result<Array2<f64>, Report> {
  if branch_length <= 0.0 {
    return out_of_range!("branch length must be positive, got {branch_length}");
  }
  validate_pi(pi)?;
  let q = if sigma.iter().any(|s| *s > 0.0) {
    gtr_rates(pi, sigma)?
  } else {
    Array2::from_shape_fn((4, 4), |(i, j)| YANG94_NUC_RATES[i][j])
  };
  let rate: f64 = (0..4).map(|i| -pi[i] * q[[i, i]]).sum();
  Ok(expm(&(q / rate * branch_length)).mapv(|x| x.max(0.0)))
}
