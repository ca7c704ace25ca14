//! Three-state affine-gap dynamic program over the marginal emission model.
//!
//! The hidden states are M (substitution), D (deletion, consumes the
//! ancestor) and I (insertion, consumes the descendant). An insertion
//! directly after a deletion is not modeled. The lattice steps by the gap
//! unit in both dimensions; emissions are looked up per nucleotide from the
//! phased marginal table. All scores are natural-log probabilities.
//!
//! Transitions (g = opening, e = extension probability):
//!
//! |from\to| M              | D              | I          |
//! |-------|----------------|----------------|------------|
//! | M     | 2·log(1-g)     | log(1-g)+log g | log g      |
//! | D     | log(1-e)       | log e          | forbidden  |
//! | I     | log(1-e)+log(1-g) | log(1-e)+log g | log e   |
//!
//! plus a terminal factor on leaving the last cell: log(1-g) from M, nothing
//! from D, log(1-e) from I.
//!
//! Two memory strategies exist: [`Aligner::align`] keeps two rolling rows of
//! scores plus a packed byte-per-cell back-pointer arena, while
//! [`Aligner::fill`] materializes all three score planes, which the
//! stochastic sampleback requires.

use crate::align::encoding::{encode_pair, EncodedPair};
use crate::align::gap::TransWeights;
use crate::model::marginal::{AmbPolicy, MarginalTable};
use crate::utils::error::AlignError;
use eyre::Report;
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
  Match = 0,
  Del = 1,
  Ins = 2,
}

impl State {
  const ALL: [State; 3] = [State::Match, State::Del, State::Ins];

  pub(crate) fn from_tag(tag: u8) -> Self {
    Self::ALL[tag as usize]
  }
}

/// A finished pairwise alignment: two equal-length gapped strings and the
/// log score of the path that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct PairAlignment {
  pub anc: String,
  pub des: String,
  pub weight: f64,
}

/// Scores of one lattice cell across the three planes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cell {
  pub mch: f64,
  pub del: f64,
  pub ins: f64,
}

impl Cell {
  const EMPTY: Cell = Cell {
    mch: f64::NEG_INFINITY,
    del: f64::NEG_INFINITY,
    ins: f64::NEG_INFINITY,
  };

  const ORIGIN: Cell = Cell {
    mch: 0.0,
    del: f64::NEG_INFINITY,
    ins: f64::NEG_INFINITY,
  };
}

/// Full score planes of the lattice, `(len_a/g + 1) x (len_b/g + 1)` each.
#[derive(Debug, Clone)]
pub struct DpTables {
  pub mch: Array2<f64>,
  pub del: Array2<f64>,
  pub ins: Array2<f64>,
}

impl DpTables {
  pub(crate) fn cell(&self, i: usize, j: usize) -> Cell {
    Cell {
      mch: self.mch[[i, j]],
      del: self.del[[i, j]],
      ins: self.ins[[i, j]],
    }
  }

  pub fn rows(&self) -> usize {
    self.mch.nrows()
  }

  pub fn cols(&self) -> usize {
    self.mch.ncols()
  }
}

/// Allocate one score plane, reporting failure instead of aborting.
fn try_plane(rows: usize, cols: usize) -> Result<Array2<f64>, Report> {
  let len = rows
    .checked_mul(cols)
    .ok_or_else(|| AlignError::ResourceExhausted(format!("DP table of {rows} x {cols} cells")))?;
  let mut data: Vec<f64> = Vec::new();
  data
    .try_reserve_exact(len)
    .map_err(|_| AlignError::ResourceExhausted(format!("DP table of {len} cells")))?;
  data.resize(len, f64::NEG_INFINITY);
  Ok(Array2::from_shape_vec((rows, cols), data)?)
}

fn try_arena(rows: usize, cols: usize) -> Result<Vec<u8>, Report> {
  let len = rows
    .checked_mul(cols)
    .ok_or_else(|| AlignError::ResourceExhausted(format!("back-pointer arena of {rows} x {cols} cells")))?;
  let mut arena: Vec<u8> = Vec::new();
  arena
    .try_reserve_exact(len)
    .map_err(|_| AlignError::ResourceExhausted(format!("back-pointer arena of {len} cells")))?;
  arena.resize(len, 0);
  Ok(arena)
}

/// Maximum of three candidates with deterministic ties: the first of
/// (M, D, I) wins.
fn best(cands: [f64; 3]) -> (f64, u8) {
  let mut value = cands[0];
  let mut tag = 0_u8;
  if cands[1] > value {
    value = cands[1];
    tag = 1;
  }
  if cands[2] > value {
    value = cands[2];
    tag = 2;
  }
  (value, tag)
}

/// The marginal pairwise aligner: substitution table, gap weights, ambiguity
/// policy and gap unit, assembled once per run.
#[derive(Debug, Clone)]
pub struct Aligner {
  pub subst: MarginalTable,
  pub weights: TransWeights,
  pub amb: AmbPolicy,
  pub gap_len: usize,
}

impl Aligner {
  /// Match emission for lattice cell (i, j): the sum of per-nucleotide
  /// marginal scores over one gap unit.
  pub(crate) fn emit_match(&self, pair: &EncodedPair, i: usize, j: usize) -> f64 {
    let g = self.gap_len;
    (0..g)
      .map(|k| {
        let row = pair.anc[(i - 1) * g + k] as usize;
        let mask = pair.des[(j - 1) * g + k];
        self.subst.emission(row, mask, self.amb)
      })
      .sum()
  }

  /// Candidate scores for entering M at some cell from its diagonal
  /// predecessor, ordered (from M, from D, from I). Emission excluded.
  pub(crate) fn match_cands(&self, diag: Cell) -> [f64; 3] {
    let w = &self.weights;
    [
      diag.mch + 2.0 * w.no_gap,
      diag.del + w.gap_stop,
      diag.ins + w.gap_stop + w.no_gap,
    ]
  }

  pub(crate) fn del_cands(&self, up: Cell) -> [f64; 3] {
    let w = &self.weights;
    [
      up.mch + w.no_gap + w.gap_open,
      up.del + w.gap_extend,
      up.ins + w.gap_stop + w.gap_open,
    ]
  }

  /// Insertion cannot follow a deletion; that candidate stays at -inf.
  pub(crate) fn ins_cands(&self, left: Cell) -> [f64; 3] {
    let w = &self.weights;
    [
      left.mch + w.gap_open,
      f64::NEG_INFINITY,
      left.ins + w.gap_extend,
    ]
  }

  /// Weights added on leaving the last cell in each state.
  pub(crate) fn terminal_cands(&self, last: Cell) -> [f64; 3] {
    let w = &self.weights;
    [last.mch + w.no_gap, last.del, last.ins + w.gap_stop]
  }

  fn compute_cell(&self, pair: &EncodedPair, i: usize, j: usize, diag: Cell, up: Cell, left: Cell) -> (Cell, u8) {
    let mut cell = Cell::EMPTY;
    let mut pointers = 0_u8;
    if i > 0 && j > 0 {
      let (value, tag) = best(self.match_cands(diag));
      cell.mch = value + self.emit_match(pair, i, j);
      pointers |= tag;
    }
    if i > 0 {
      let (value, tag) = best(self.del_cands(up));
      cell.del = value;
      pointers |= tag << 2;
    }
    if j > 0 {
      let (value, tag) = best(self.ins_cands(left));
      cell.ins = value;
      pointers |= tag << 4;
    }
    (cell, pointers)
  }

  /// Align an unaligned pair with the rolling-row Viterbi and reconstruct
  /// the best path from the back-pointer arena.
  pub fn align(&self, anc: &str, des: &str) -> Result<PairAlignment, Report> {
    let pair = encode_pair(anc, des, self.gap_len)?;
    let len_a = pair.anc.len() / self.gap_len;
    let len_b = pair.des.len() / self.gap_len;
    let cols = len_b + 1;

    let mut arena = try_arena(len_a + 1, cols)?;
    let mut prev_row = vec![Cell::EMPTY; cols];
    let mut cur_row = vec![Cell::EMPTY; cols];

    for i in 0..=len_a {
      for j in 0..=len_b {
        if i == 0 && j == 0 {
          cur_row[0] = Cell::ORIGIN;
          continue;
        }
        let diag = if i > 0 && j > 0 { prev_row[j - 1] } else { Cell::EMPTY };
        let up = if i > 0 { prev_row[j] } else { Cell::EMPTY };
        let left = if j > 0 { cur_row[j - 1] } else { Cell::EMPTY };
        let (cell, pointers) = self.compute_cell(&pair, i, j, diag, up, left);
        cur_row[j] = cell;
        arena[i * cols + j] = pointers;
      }
      std::mem::swap(&mut prev_row, &mut cur_row);
    }

    // after the final swap the last computed row is in prev_row
    let last = prev_row[len_b];
    let (weight, tag) = best(self.terminal_cands(last));
    let state = State::from_tag(tag);

    let (anc_aln, des_aln) = self.traceback(&arena, cols, len_a, len_b, state, anc, des);
    Ok(PairAlignment {
      anc: anc_aln,
      des: des_aln,
      weight,
    })
  }

  fn traceback(
    &self,
    arena: &[u8],
    cols: usize,
    len_a: usize,
    len_b: usize,
    final_state: State,
    anc: &str,
    des: &str,
  ) -> (String, String) {
    let g = self.gap_len;
    let gap_unit = "-".repeat(g);
    let mut anc_units: Vec<&str> = Vec::with_capacity(len_a + len_b);
    let mut des_units: Vec<&str> = Vec::with_capacity(len_a + len_b);

    let mut state = final_state;
    let (mut i, mut j) = (len_a, len_b);
    while i > 0 || j > 0 {
      let pointers = arena[i * cols + j];
      let prev = match state {
        State::Match => {
          anc_units.push(&anc[(i - 1) * g..i * g]);
          des_units.push(&des[(j - 1) * g..j * g]);
          i -= 1;
          j -= 1;
          pointers & 3
        }
        State::Del => {
          anc_units.push(&anc[(i - 1) * g..i * g]);
          des_units.push(&gap_unit);
          i -= 1;
          (pointers >> 2) & 3
        }
        State::Ins => {
          anc_units.push(&gap_unit);
          des_units.push(&des[(j - 1) * g..j * g]);
          j -= 1;
          (pointers >> 4) & 3
        }
      };
      state = State::from_tag(prev);
    }

    anc_units.reverse();
    des_units.reverse();
    (anc_units.concat(), des_units.concat())
  }

  /// Fill the full three score planes. Required by the sampleback, which
  /// revisits interior cells.
  pub fn fill(&self, pair: &EncodedPair) -> Result<DpTables, Report> {
    let len_a = pair.anc.len() / self.gap_len;
    let len_b = pair.des.len() / self.gap_len;

    let mut tables = DpTables {
      mch: try_plane(len_a + 1, len_b + 1)?,
      del: try_plane(len_a + 1, len_b + 1)?,
      ins: try_plane(len_a + 1, len_b + 1)?,
    };
    tables.mch[[0, 0]] = 0.0;

    for i in 0..=len_a {
      for j in 0..=len_b {
        if i == 0 && j == 0 {
          continue;
        }
        let diag = if i > 0 && j > 0 { tables.cell(i - 1, j - 1) } else { Cell::EMPTY };
        let up = if i > 0 { tables.cell(i - 1, j) } else { Cell::EMPTY };
        let left = if j > 0 { tables.cell(i, j - 1) } else { Cell::EMPTY };
        let (cell, _) = self.compute_cell(pair, i, j, diag, up, left);
        tables.mch[[i, j]] = cell.mch;
        tables.del[[i, j]] = cell.del;
        tables.ins[[i, j]] = cell.ins;
      }
    }
    Ok(tables)
  }

  /// Best terminal log score of a filled lattice.
  pub fn best_weight(&self, tables: &DpTables) -> f64 {
    let last = tables.cell(tables.rows() - 1, tables.cols() - 1);
    best(self.terminal_cands(last)).0
  }
}
