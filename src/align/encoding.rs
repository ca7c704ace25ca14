//! Sequence validation and encoding for the marginal aligner.
//!
//! The ancestor is encoded per nucleotide as `codon_index * 3 + phase`, the
//! row index of the marginal table for that position. The descendant is
//! encoded per nucleotide as an IUPAC mask so ambiguity policies can be
//! applied at emission time.

use crate::alphabet::codon::codon_index;
use crate::alphabet::nuc::{iupac_mask_checked, nuc_index};
use crate::{invalid_input, length_constraint};
use eyre::Report;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPair {
  /// Marginal-table row per ancestor nucleotide.
  pub anc: Vec<u16>,
  /// IUPAC mask per descendant nucleotide.
  pub des: Vec<u8>,
}

/// Encode a gap-free reference sequence. The reference must consist of
/// canonical bases only; its length must already be a multiple of 3.
pub fn encode_reference(anc: &str) -> Result<Vec<u16>, Report> {
  if anc.len() % 3 != 0 {
    return length_constraint!(
      "reference length must be a multiple of 3, got {}",
      anc.len()
    );
  }
  let chars: Vec<char> = anc.chars().collect();
  if let Some(c) = chars.iter().find(|c| nuc_index(**c).is_none()) {
    return invalid_input!(
      "reference sequences must contain only A, C, G, T, found '{c}'"
    );
  }
  let mut encoded = Vec::with_capacity(chars.len());
  for i in 0..chars.len() {
    let base = (i / 3) * 3;
    let cod = codon_index([chars[base], chars[base + 1], chars[base + 2]])?;
    encoded.push((cod * 3 + i % 3) as u16);
  }
  Ok(encoded)
}

/// Encode a descendant sequence as IUPAC masks.
pub fn encode_descendant(des: &str) -> Result<Vec<u8>, Report> {
  des.chars().map(iupac_mask_checked).collect()
}

/// Validate the length constraints of an unaligned pair and encode both
/// sequences. The ancestor length must be a multiple of 3 and of the gap
/// unit; the descendant length must be a multiple of the gap unit.
pub fn encode_pair(anc: &str, des: &str, gap_len: usize) -> Result<EncodedPair, Report> {
  if anc.len() % 3 != 0 || anc.len() % gap_len != 0 {
    return length_constraint!(
      "reference length must be a multiple of 3 and of the gap unit ({gap_len}), got {}",
      anc.len()
    );
  }
  if des.len() % gap_len != 0 {
    return length_constraint!(
      "descendant length must be a multiple of the gap unit ({gap_len}), got {}",
      des.len()
    );
  }
  Ok(EncodedPair {
    anc: encode_reference(anc)?,
    des: encode_descendant(des)?,
  })
}
