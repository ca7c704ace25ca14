//! Codon indices and the genetic code.
//!
//! A codon (b1, b2, b3) is packed into an index `b1*16 + b2*4 + b3` with the
//! canonical base order A, C, G, T, giving the lexicographic range 0..=63
//! (AAA = 0, TTT = 63). Stop codons stay in the state space; they carry their
//! own amino-acid group tag.

use crate::alphabet::nuc::{nuc_char, nuc_index};
use crate::invalid_input;
use eyre::Report;

pub const NUM_CODONS: usize = 64;

/// Amino acid (or stop, `*`) encoded by each codon index, standard genetic
/// code. 21 distinct group tags.
const GENETIC_CODE: &[u8; NUM_CODONS] =
  b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

/// Pack a nucleotide triplet into a codon index.
pub fn codon_index(triplet: [char; 3]) -> Result<usize, Report> {
  let mut index = 0;
  for c in triplet {
    match nuc_index(c) {
      Some(b) => index = index * 4 + b,
      None => return invalid_input!("invalid codon nucleotide: '{c}'"),
    }
  }
  Ok(index)
}

/// The three bases of a codon index, as characters.
pub fn codon_chars(index: usize) -> [char; 3] {
  [
    nuc_char((index >> 4) & 3),
    nuc_char((index >> 2) & 3),
    nuc_char(index & 3),
  ]
}

/// Base index at codon position `pos` (0..=2).
#[inline]
pub const fn codon_base(index: usize, pos: usize) -> usize {
  (index >> ((2 - pos) * 2)) & 3
}

/// Amino-acid group tag of a codon, 0..=20. Stop codons share one tag.
pub fn amino_group(index: usize) -> u8 {
  GENETIC_CODE[index]
}

/// Substitutions within an amino-acid group are synonymous.
pub fn is_synonymous(a: usize, b: usize) -> bool {
  GENETIC_CODE[a] == GENETIC_CODE[b]
}

/// Number of codon positions at which two codons differ (0..=3).
pub fn codon_distance(a: usize, b: usize) -> usize {
  (0..3).filter(|&pos| codon_base(a, pos) != codon_base(b, pos)).count()
}

#[cfg(test)]
mod tests {
  use super::*;
  use itertools::Itertools;
  use rstest::rstest;

  #[rstest]
  #[case(['A', 'A', 'A'], 0)]
  #[case(['A', 'T', 'G'], 14)]
  #[case(['T', 'T', 'T'], 63)]
  #[case(['G', 'C', 'A'], 36)]
  fn packs_codon_indices(#[case] triplet: [char; 3], #[case] expected: usize) {
    assert_eq!(codon_index(triplet).unwrap(), expected);
    assert_eq!(codon_chars(expected), triplet);
  }

  #[test]
  fn rejects_ambiguous_triplet() {
    assert!(codon_index(['A', 'N', 'G']).is_err());
  }

  #[test]
  fn translates_standard_code() {
    assert_eq!(amino_group(codon_index(['A', 'T', 'G']).unwrap()), b'M');
    assert_eq!(amino_group(codon_index(['T', 'G', 'G']).unwrap()), b'W');
    assert_eq!(amino_group(codon_index(['T', 'A', 'A']).unwrap()), b'*');
    assert_eq!(amino_group(codon_index(['T', 'G', 'A']).unwrap()), b'*');
    let groups = (0..NUM_CODONS).map(amino_group).unique().count();
    assert_eq!(groups, 21);
  }

  #[test]
  fn synonymous_serine_codons() {
    let tct = codon_index(['T', 'C', 'T']).unwrap();
    let agc = codon_index(['A', 'G', 'C']).unwrap();
    let act = codon_index(['A', 'C', 'T']).unwrap();
    assert!(is_synonymous(tct, agc));
    assert!(!is_synonymous(tct, act));
  }

  #[test]
  fn distance_counts_differing_positions() {
    let aaa = 0;
    let aac = codon_index(['A', 'A', 'C']).unwrap();
    let acc = codon_index(['A', 'C', 'C']).unwrap();
    let ttt = 63;
    assert_eq!(codon_distance(aaa, aaa), 0);
    assert_eq!(codon_distance(aaa, aac), 1);
    assert_eq!(codon_distance(aaa, acc), 2);
    assert_eq!(codon_distance(aaa, ttt), 3);
  }
}
