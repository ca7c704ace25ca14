//! Marginal projection of a codon substitution matrix.
//!
//! The 64x64 matrix P collapses into a 192x4 table indexed by
//! `(codon * 3 + phase, observed nucleotide)` storing
//! `log( sum over descendant codons with that base at that phase of P / pi )`.
//! The division by the background frequency makes the table a log-odds score
//! against the stationary composition, which is what the aligner consumes.

use crate::alphabet::codon::{codon_base, NUM_CODONS};
use crate::alphabet::nuc::{mask_bases, NUM_NUCS};
use crate::utils::log_space::log_or_sentinel;
use clap::ValueEnum;
use ndarray::Array2;

/// Rows of the marginal table: one per (codon, phase) pair.
pub const NUM_COD_PHASE: usize = NUM_CODONS * 3;

/// How an ambiguous descendant nucleotide is scored at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AmbPolicy {
  /// Mean of the log-scores over the bases the code can represent.
  #[default]
  Avg,
  /// Best (maximum) log-score over those bases.
  Best,
}

#[derive(Debug, Clone)]
pub struct MarginalTable {
  table: Array2<f64>,
}

impl MarginalTable {
  /// Project a 64x64 codon transition matrix.
  pub fn from_codon_p(p: &Array2<f64>, pi: &[f64; 4]) -> Self {
    let mut table = Array2::<f64>::zeros((NUM_COD_PHASE, NUM_NUCS));
    for cod in 0..NUM_CODONS {
      for phase in 0..3 {
        for nuc in 0..NUM_NUCS {
          let marg: f64 = (0..NUM_CODONS)
            .filter(|c| codon_base(*c, phase) == nuc)
            .map(|c| p[[cod, c]])
            .sum();
          table[[cod * 3 + phase, nuc]] = log_or_sentinel(marg / pi[nuc]);
        }
      }
    }
    Self { table }
  }

  /// Build the table from a plain 4x4 nucleotide transition matrix; every
  /// row depends only on the codon's base at that phase. Used by the `dna`
  /// model, which ignores codon structure but keeps the aligner interface.
  pub fn from_nuc_p(p: &Array2<f64>, pi: &[f64; 4]) -> Self {
    let mut table = Array2::<f64>::zeros((NUM_COD_PHASE, NUM_NUCS));
    for cod in 0..NUM_CODONS {
      for phase in 0..3 {
        let base = codon_base(cod, phase);
        for nuc in 0..NUM_NUCS {
          table[[cod * 3 + phase, nuc]] = log_or_sentinel(p[[base, nuc]] / pi[nuc]);
        }
      }
    }
    Self { table }
  }

  #[inline]
  pub fn entry(&self, cod_phase: usize, nuc: usize) -> f64 {
    self.table[[cod_phase, nuc]]
  }

  /// Log emission score of an observed descendant nucleotide (given as an
  /// IUPAC mask) against an ancestor (codon, phase) row.
  pub fn emission(&self, cod_phase: usize, mask: u8, amb: AmbPolicy) -> f64 {
    debug_assert!(mask != 0 && mask < 16);
    if mask.count_ones() == 1 {
      return self.entry(cod_phase, mask.trailing_zeros() as usize);
    }
    match amb {
      AmbPolicy::Avg => {
        let sum: f64 = mask_bases(mask).map(|n| self.entry(cod_phase, n)).sum();
        sum / f64::from(mask.count_ones())
      }
      AmbPolicy::Best => mask_bases(mask)
        .map(|n| self.entry(cod_phase, n))
        .fold(f64::NEG_INFINITY, f64::max),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alphabet::nuc::iupac_mask;
  use crate::constants::{DEFAULT_BRANCH_LENGTH, DEFAULT_OMEGA, DEFAULT_PI};
  use crate::model::mg94::mg94_p;
  use approx::assert_abs_diff_eq;
  use lazy_static::lazy_static;

  lazy_static! {
    static ref TABLE: MarginalTable = {
      let p = mg94_p(DEFAULT_BRANCH_LENGTH, DEFAULT_OMEGA, &DEFAULT_PI, &[0.0; 6]).unwrap();
      MarginalTable::from_codon_p(&p, &DEFAULT_PI)
    };
  }

  #[test]
  fn rows_are_normalized_against_background() {
    // sum over n of pi_n * exp(M[c,p,n]) recovers the row mass of P, which
    // is 1 for every codon and phase.
    for cod_phase in 0..NUM_COD_PHASE {
      let total: f64 = (0..NUM_NUCS)
        .map(|n| DEFAULT_PI[n] * TABLE.entry(cod_phase, n).exp())
        .sum();
      assert_abs_diff_eq!(total, 1.0, epsilon = 1e-6);
    }
  }

  #[test]
  fn identical_base_scores_highest_at_short_branch_lengths() {
    for cod in 0..NUM_CODONS {
      for phase in 0..3 {
        let base = codon_base(cod, phase);
        let row = cod * 3 + phase;
        let self_score = TABLE.entry(row, base);
        for n in 0..NUM_NUCS {
          if n != base {
            assert!(self_score > TABLE.entry(row, n));
          }
        }
      }
    }
  }

  #[test]
  fn avg_is_mean_of_logs_and_best_is_max() {
    let r = iupac_mask('R').unwrap();
    let row = 17; // arbitrary (codon, phase) row
    let a = TABLE.entry(row, 0);
    let g = TABLE.entry(row, 2);
    assert_abs_diff_eq!(
      TABLE.emission(row, r, AmbPolicy::Avg),
      (a + g) / 2.0,
      epsilon = 1e-12
    );
    assert_abs_diff_eq!(
      TABLE.emission(row, r, AmbPolicy::Best),
      a.max(g),
      epsilon = 1e-12
    );
  }

  #[test]
  fn canonical_mask_is_a_direct_lookup() {
    let t = iupac_mask('T').unwrap();
    assert_abs_diff_eq!(
      TABLE.emission(40, t, AmbPolicy::Avg),
      TABLE.entry(40, 3),
      epsilon = 1e-15
    );
  }
}
