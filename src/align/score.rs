//! Scoring of a pre-aligned pair by replaying its state sequence.
//!
//! The state at each column is read off the gap pattern: a gap in the
//! ancestor is an insertion, a gap in the descendant is a deletion, anything
//! else is a match. Transition weights are taken against the preceding state
//! and emissions use the same marginal lookups as the dynamic program, so a
//! replayed optimal alignment reproduces the Viterbi weight exactly.

use crate::align::encoding::encode_reference;
use crate::alphabet::nuc::iupac_mask_checked;
use crate::align::viterbi::{Aligner, State};
use crate::{invalid_input, length_constraint, unmodeled};
use eyre::Report;

impl Aligner {
  /// Log score of an explicit alignment: two equal-length gapped strings,
  /// ancestor first. Fails with `Unmodeled` if the alignment contains an
  /// insertion immediately after a deletion.
  pub fn score(&self, anc_aln: &str, des_aln: &str) -> Result<f64, Report> {
    if anc_aln.len() != des_aln.len() {
      return length_constraint!(
        "aligned sequences must have equal length, got {} and {}",
        anc_aln.len(),
        des_aln.len()
      );
    }

    let anc: String = anc_aln.chars().filter(|c| *c != '-').collect();
    let anc_rows = encode_reference(&anc)?;
    let w = &self.weights;

    let mut weight = 0.0;
    let mut state = State::Match;
    let mut anc_pos = 0_usize;
    for (column, (a, b)) in anc_aln.chars().zip(des_aln.chars()).enumerate() {
      let next = match (a, b) {
        ('-', '-') => {
          return invalid_input!("column {column} is gapped in both sequences");
        }
        ('-', _) => State::Ins,
        (_, '-') => State::Del,
        _ => State::Match,
      };

      match (state, next) {
        (State::Match, State::Match) => weight += 2.0 * w.no_gap,
        (State::Match, State::Del) => weight += w.no_gap + w.gap_open,
        (State::Match, State::Ins) => weight += w.gap_open,
        (State::Del, State::Match) => weight += w.gap_stop,
        (State::Del, State::Del) => weight += w.gap_extend,
        (State::Del, State::Ins) => {
          return unmodeled!("insertion after deletion at column {column}");
        }
        (State::Ins, State::Match) => weight += w.gap_stop + w.no_gap,
        (State::Ins, State::Del) => weight += w.gap_stop + w.gap_open,
        (State::Ins, State::Ins) => weight += w.gap_extend,
      }

      match next {
        State::Match => {
          let mask = iupac_mask_checked(b)?;
          weight += self.subst.emission(anc_rows[anc_pos] as usize, mask, self.amb);
          anc_pos += 1;
        }
        State::Del => anc_pos += 1,
        State::Ins => {}
      }
      state = next;
    }

    weight += match state {
      State::Match => w.no_gap,
      State::Del => 0.0,
      State::Ins => w.gap_stop,
    };
    Ok(weight)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::viterbi::tests::default_aligner;
  use crate::model::marginal::AmbPolicy;
  use crate::utils::error::{error_kind, AlignError};
  use approx::assert_abs_diff_eq;
  use rstest::rstest;

  #[rstest]
  #[case("CTCTGGATAGTG", "CT----ATAGTG", 1.51294)]
  #[case("CTCT--AT", "CTCTGGAT", -0.835939)]
  #[case("ACTCT-A", "ACTCTG-", -8.73357)]
  #[case("ACTCTA-", "ACTCTAG", -0.658564)]
  fn replays_reference_scores(#[case] anc: &str, #[case] des: &str, #[case] expected: f64) {
    let aligner = default_aligner(AmbPolicy::Avg, 1);
    assert_abs_diff_eq!(aligner.score(anc, des).unwrap(), expected, epsilon = 1e-4);
  }

  #[test]
  fn replay_matches_viterbi_weight() {
    let aligner = default_aligner(AmbPolicy::Avg, 1);
    let aligned = aligner.align("ACGTTAAGGGGT", "ACGAAT").unwrap();
    let replayed = aligner.score(&aligned.anc, &aligned.des).unwrap();
    assert_abs_diff_eq!(replayed, aligned.weight, epsilon = 1e-10);
  }

  #[test]
  fn rejects_insertion_after_deletion() {
    let aligner = default_aligner(AmbPolicy::Avg, 1);
    let err = aligner.score("ATAC-GGGTC", "ATA-GGGGTC").unwrap_err();
    assert!(matches!(error_kind(&err), Some(AlignError::Unmodeled(_))));
  }

  #[test]
  fn rejects_unequal_lengths() {
    let aligner = default_aligner(AmbPolicy::Avg, 1);
    let err = aligner.score("CTC", "CT").unwrap_err();
    assert!(matches!(error_kind(&err), Some(AlignError::LengthConstraint(_))));
  }

  #[test]
  fn scores_ambiguous_descendants_under_both_policies() {
    let avg = default_aligner(AmbPolicy::Avg, 1);
    let best = default_aligner(AmbPolicy::Best, 1);
    let avg_score = avg.score("CTCTGGATAGTG", "CT----ATAGTR").unwrap();
    let best_score = best.score("CTCTGGATAGTG", "CT----ATAGTR").unwrap();
    assert_abs_diff_eq!(avg_score, -1.03892, epsilon = 1e-4);
    assert_abs_diff_eq!(best_score, 1.51294, epsilon = 1e-4);
  }
}
