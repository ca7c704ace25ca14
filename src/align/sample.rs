//! Stochastic sampleback through the filled lattice.
//!
//! Starting from the terminal distribution over the three states at the last
//! cell, the previous state is drawn repeatedly from the categorical
//! distribution obtained by log-sum-exp-normalizing the predecessor
//! contributions `table[prev](i', j') + trans(prev -> state)`. The summed
//! log-probabilities of the drawn choices are reported as the sample's
//! `log_weight`; with a fixed seed the emitted bytes are reproducible.

use crate::align::encoding::EncodedPair;
use crate::align::viterbi::{Aligner, DpTables, PairAlignment, State};
use crate::utils::log_space::log_sum_exp;
use rand::Rng;

/// Draw an index from the categorical distribution with the given
/// log-weights; returns the index and its normalized log-probability.
fn draw_categorical(log_weights: [f64; 3], rng: &mut impl Rng) -> (u8, f64) {
  let total = log_sum_exp(&log_weights);
  let r: f64 = rng.gen();
  let mut cumulative = 0.0;
  let mut chosen = None;
  for (index, lw) in log_weights.iter().enumerate() {
    let p = (lw - total).exp();
    if p <= 0.0 {
      continue;
    }
    cumulative += p;
    chosen = Some(index as u8);
    if r < cumulative {
      break;
    }
  }
  let index = chosen.expect("at least one reachable predecessor");
  (index, log_weights[index as usize] - total)
}

impl Aligner {
  /// Draw one alignment from the filled lattice. The returned weight is the
  /// log-probability of the drawn path under the sampler's distribution.
  pub fn sample(
    &self,
    tables: &DpTables,
    pair: &EncodedPair,
    anc: &str,
    des: &str,
    rng: &mut impl Rng,
  ) -> PairAlignment {
    debug_assert_eq!(tables.rows(), pair.anc.len() / self.gap_len + 1);
    let g = self.gap_len;
    let len_a = tables.rows() - 1;
    let len_b = tables.cols() - 1;
    let gap_unit = "-".repeat(g);

    let mut anc_units: Vec<&str> = Vec::with_capacity(len_a + len_b);
    let mut des_units: Vec<&str> = Vec::with_capacity(len_a + len_b);

    let (tag, mut log_weight) =
      draw_categorical(self.terminal_cands(tables.cell(len_a, len_b)), rng);
    let mut state = State::from_tag(tag);

    let (mut i, mut j) = (len_a, len_b);
    while i > 0 || j > 0 {
      let cands = match state {
        State::Match => {
          anc_units.push(&anc[(i - 1) * g..i * g]);
          des_units.push(&des[(j - 1) * g..j * g]);
          let cands = self.match_cands(tables.cell(i - 1, j - 1));
          i -= 1;
          j -= 1;
          cands
        }
        State::Del => {
          anc_units.push(&anc[(i - 1) * g..i * g]);
          des_units.push(&gap_unit);
          let cands = self.del_cands(tables.cell(i - 1, j));
          i -= 1;
          cands
        }
        State::Ins => {
          anc_units.push(&gap_unit);
          des_units.push(&des[(j - 1) * g..j * g]);
          let cands = self.ins_cands(tables.cell(i, j - 1));
          j -= 1;
          cands
        }
      };
      let (tag, log_p) = draw_categorical(cands, rng);
      log_weight += log_p;
      state = State::from_tag(tag);
    }
    debug_assert_eq!(state, State::Match);

    anc_units.reverse();
    des_units.reverse();
    PairAlignment {
      anc: anc_units.concat(),
      des: des_units.concat(),
      weight: log_weight,
    }
  }

  /// Log-probability that the sampleback emits exactly the given alignment.
  /// This walks the same cells as [`Aligner::sample`] but follows the fixed
  /// path instead of drawing; used to validate sampled weights.
  pub fn sample_path_weight(
    &self,
    tables: &DpTables,
    anc_aln: &str,
    des_aln: &str,
  ) -> f64 {
    let g = self.gap_len;
    let states: Vec<State> = anc_aln
      .chars()
      .zip(des_aln.chars())
      .step_by(g)
      .map(|(a, b)| match (a, b) {
        ('-', _) => State::Ins,
        (_, '-') => State::Del,
        _ => State::Match,
      })
      .collect();

    let (mut i, mut j) = (tables.rows() - 1, tables.cols() - 1);
    let terminal = self.terminal_cands(tables.cell(i, j));
    let last = *states.last().expect("alignment is non-empty");
    let mut log_weight = terminal[last as usize] - log_sum_exp(&terminal);

    for (index, state) in states.iter().enumerate().rev() {
      let cands = match state {
        State::Match => {
          let cands = self.match_cands(tables.cell(i - 1, j - 1));
          i -= 1;
          j -= 1;
          cands
        }
        State::Del => {
          let cands = self.del_cands(tables.cell(i - 1, j));
          i -= 1;
          cands
        }
        State::Ins => {
          let cands = self.ins_cands(tables.cell(i, j - 1));
          j -= 1;
          cands
        }
      };
      let prev = if index == 0 { State::Match } else { states[index - 1] };
      log_weight += cands[prev as usize] - log_sum_exp(&cands);
    }
    log_weight
  }
}
