//! Progressive multiple alignment over a guide tree.
//!
//! The tree is re-rooted at the reference leaf, the leaf order and pairwise
//! distances come from the guide-tree walk, and each leaf is aligned against
//! the reference with an emission table built for its own distance. The
//! pairwise results are then composed into one alignment on reference
//! coordinates: every reference position owns the longest insertion run any
//! pair opened there, and sequences are padded with gaps where they carry no
//! mass. No multiple-alignment objective of its own is involved.

use crate::align::viterbi::PairAlignment;
use crate::commands::align::AlignParams;
use crate::invalid_input;
use crate::io::file::{create_file_or_stdout, FileFormat};
use crate::io::{read_seq_file, write_seq_data, SeqData};
use crate::tree::newick::read_newick_file;
use eyre::{Report, WrapErr};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MsaParams {
  pub align: AlignParams,
  pub tree: PathBuf,
}

pub fn run_msa(params: &MsaParams) -> Result<(), Report> {
  let reference = match &params.align.reference {
    Some(name) => name.clone(),
    None => return invalid_input!("msa requires a reference leaf (--ref)"),
  };

  let data = read_seq_file(&params.align.input)?;
  let mut tree = read_newick_file(&params.tree)?;
  if data.len() != tree.leaves().count() {
    return invalid_input!(
      "{} sequences for {} tree leaves",
      data.len(),
      tree.leaves().count()
    );
  }

  tree.reroot(&reference)?;
  let ref_index = tree
    .find_node(&reference)
    .expect("reroot verified the reference exists");
  let ref_seq = find_sequence(&data, &reference)?.to_owned();

  let mut names = vec![reference.clone()];
  let mut pairs = Vec::new();
  for (leaf, _) in tree.alignment_order() {
    if leaf == ref_index {
      continue;
    }
    let name = &tree.nodes[leaf].label;
    let seq = find_sequence(&data, name)?;
    let mut distance = tree.distance_to_reference(ref_index, leaf);
    if distance <= 0.0 {
      warn!("zero branch length between '{reference}' and '{name}', using the default");
      distance = crate::constants::DEFAULT_BRANCH_LENGTH;
    }
    let aligner = params.align.build_aligner(distance)?;
    let aligned = aligner
      .align(&ref_seq, seq)
      .wrap_err_with(|| format!("when aligning '{name}' against '{reference}'"))?;
    info!("aligned '{name}' at distance {distance:.5}, log weight {}", aligned.weight);
    names.push(name.clone());
    pairs.push(aligned);
  }

  let msa = compose_on_reference(&ref_seq, names, &pairs);
  let format = FileFormat::detect(&params.align.output)?;
  let mut writer = create_file_or_stdout(&params.align.output)?;
  write_seq_data(&mut *writer, format, &msa)
}

fn find_sequence<'a>(data: &'a SeqData, name: &str) -> Result<&'a String, Report> {
  data
    .names
    .iter()
    .position(|n| n == name)
    .map(|index| &data.seqs[index])
    .ok_or_else(|| {
      crate::utils::error::AlignError::InvalidInput(format!(
        "no sequence named '{name}' in the input"
      ))
      .into()
    })
}

/// Merge reference-anchored pairwise alignments into one block. Slot `r`
/// (0..=L over reference positions) receives the longest insertion run any
/// pair opened before reference base `r`; shorter runs are right-padded with
/// gaps.
fn compose_on_reference(ref_seq: &str, names: Vec<String>, pairs: &[PairAlignment]) -> SeqData {
  let len = ref_seq.len();
  let mut master_ins = vec![0_usize; len + 1];
  let mut per_pair: Vec<(Vec<String>, Vec<char>)> = Vec::with_capacity(pairs.len());

  for pair in pairs {
    let mut ins = vec![String::new(); len + 1];
    let mut aligned = vec!['-'; len];
    let mut r = 0_usize;
    for (a, b) in pair.anc.chars().zip(pair.des.chars()) {
      if a == '-' {
        ins[r].push(b);
      } else {
        aligned[r] = b;
        r += 1;
      }
    }
    for (slot, run) in ins.iter().enumerate() {
      master_ins[slot] = master_ins[slot].max(run.len());
    }
    per_pair.push((ins, aligned));
  }

  let mut seqs = Vec::with_capacity(pairs.len() + 1);

  let ref_chars: Vec<char> = ref_seq.chars().collect();
  let mut ref_row = String::new();
  for r in 0..=len {
    ref_row.extend(std::iter::repeat('-').take(master_ins[r]));
    if r < len {
      ref_row.push(ref_chars[r]);
    }
  }
  seqs.push(ref_row);

  for (ins, aligned) in &per_pair {
    let mut row = String::new();
    for r in 0..=len {
      row.push_str(&ins[r]);
      row.extend(std::iter::repeat('-').take(master_ins[r] - ins[r].len()));
      if r < len {
        row.push(aligned[r]);
      }
    }
    seqs.push(row);
  }

  SeqData { names, seqs }
}
