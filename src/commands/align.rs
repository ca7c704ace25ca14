//! The align and score drivers.

use crate::align::gap::{GapParams, TransWeights};
use crate::align::viterbi::Aligner;
use crate::constants::{DEFAULT_BRANCH_LENGTH, DEFAULT_OMEGA, DEFAULT_PI};
use crate::invalid_input;
use crate::io::file::{append_file, create_file_or_stdout, FileFormat};
use crate::io::{read_seq_file, write_seq_data, SeqData};
use crate::model::marginal::AmbPolicy;
use crate::model::subst::{build_subst_table, SubstParams};
use crate::utils::float_fmt::format_significant;
use eyre::{Report, WrapErr};
use log::info;
use std::io::Write;
use std::path::PathBuf;

/// Run configuration assembled by the CLI layer and threaded through the
/// drivers by reference. One instance per invocation; the model tables it
/// produces are owned by the driver call.
#[derive(Debug, Clone)]
pub struct AlignParams {
  pub input: PathBuf,
  pub output: PathBuf,
  pub model: String,
  pub weight_file: Option<PathBuf>,
  pub reference: Option<String>,
  pub rev: bool,
  pub gap: GapParams,
  pub amb: AmbPolicy,
  pub rate_csv: Option<PathBuf>,
  pub branch_length: f64,
  pub omega: f64,
  pub pi: [f64; 4],
  pub sigma: [f64; 6],
}

impl Default for AlignParams {
  fn default() -> Self {
    Self {
      input: PathBuf::new(),
      output: PathBuf::new(),
      model: "marginal".to_owned(),
      weight_file: None,
      reference: None,
      rev: false,
      gap: GapParams::default(),
      amb: AmbPolicy::Avg,
      rate_csv: None,
      branch_length: DEFAULT_BRANCH_LENGTH,
      omega: DEFAULT_OMEGA,
      pi: DEFAULT_PI,
      sigma: [0.0; 6],
    }
  }
}

impl AlignParams {
  /// Build the aligner for this run, optionally overriding the branch
  /// length (the guide-tree walk supplies per-pair distances).
  pub fn build_aligner(&self, branch_length: f64) -> Result<Aligner, Report> {
    let subst = build_subst_table(&SubstParams {
      model: self.model.clone(),
      branch_length,
      omega: self.omega,
      pi: self.pi,
      sigma: self.sigma,
      rate_csv: self.rate_csv.clone(),
    })?;
    Ok(Aligner {
      subst,
      weights: TransWeights::new(&self.gap)?,
      amb: self.amb,
      gap_len: self.gap.len,
    })
  }
}

/// Read the input pair for a pairwise operation.
pub fn read_pair(params: &AlignParams) -> Result<SeqData, Report> {
  let data = read_seq_file(&params.input)?;
  if data.len() != 2 {
    return invalid_input!("exactly two sequences required, got {}", data.len());
  }
  Ok(data)
}

/// Reorder the pair so the reference sits at index 0: a matching `--ref`
/// name wins, else `--rev` swaps, else a given-but-unmatched name fails.
pub fn order_reference(
  data: &mut SeqData,
  reference: Option<&str>,
  rev: bool,
) -> Result<(), Report> {
  match reference {
    Some(name) if data.names[0] == name => Ok(()),
    Some(name) if data.names[1] == name => {
      data.names.swap(0, 1);
      data.seqs.swap(0, 1);
      Ok(())
    }
    None | Some(_) if rev => {
      data.names.swap(0, 1);
      data.seqs.swap(0, 1);
      Ok(())
    }
    Some(name) => invalid_input!("reference not found: '{name}'"),
    None => Ok(()),
  }
}

fn append_weight_log(params: &AlignParams, weight: f64) -> Result<(), Report> {
  if let Some(path) = &params.weight_file {
    let mut writer = append_file(path)?;
    writeln!(
      writer,
      "{},{},{}",
      params.input.display(),
      params.model,
      format_significant(weight, 6)
    )?;
    writer.flush()?;
  }
  Ok(())
}

/// Align a pair of unaligned sequences and write the result.
pub fn run_align(params: &AlignParams) -> Result<(), Report> {
  let mut data = read_pair(params)?;
  let aligner = params.build_aligner(params.branch_length)?;
  order_reference(&mut data, params.reference.as_deref(), params.rev)?;

  let result = aligner
    .align(&data.seqs[0], &data.seqs[1])
    .wrap_err("when aligning the input pair")?;
  info!(
    "aligned '{}' against '{}', log weight {}",
    data.names[1], data.names[0], result.weight
  );

  append_weight_log(params, result.weight)?;

  data.seqs = vec![result.anc, result.des];
  let format = FileFormat::detect(&params.output)?;
  let mut writer = create_file_or_stdout(&params.output)?;
  write_seq_data(&mut *writer, format, &data)
}

/// Score an already-aligned pair, printing the log weight to stdout.
pub fn run_score(params: &AlignParams) -> Result<(), Report> {
  let mut data = read_pair(params)?;
  let aligner = params.build_aligner(params.branch_length)?;
  order_reference(&mut data, params.reference.as_deref(), params.rev)?;

  let weight = aligner.score(&data.seqs[0], &data.seqs[1])?;
  println!("{}", format_significant(weight, 6));
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::error::{error_kind, AlignError};
  use pretty_assertions::assert_eq;
  use std::io::Write;
  use tempfile::{tempdir, NamedTempFile};

  fn fasta_input(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
    write!(file, "{content}").unwrap();
    file.flush().unwrap();
    file
  }

  fn pair(names: [&str; 2], seqs: [&str; 2]) -> SeqData {
    SeqData {
      names: names.map(str::to_owned).to_vec(),
      seqs: seqs.map(str::to_owned).to_vec(),
    }
  }

  #[test]
  fn orders_by_reference_name() {
    let mut data = pair(["1", "2"], ["AAA", "CCC"]);
    order_reference(&mut data, Some("2"), false).unwrap();
    assert_eq!(data.names, vec!["2", "1"]);
    assert_eq!(data.seqs, vec!["CCC", "AAA"]);

    // already in front: no-op
    order_reference(&mut data, Some("2"), false).unwrap();
    assert_eq!(data.names, vec!["2", "1"]);
  }

  #[test]
  fn rev_swaps_without_a_name() {
    let mut data = pair(["a", "b"], ["AAA", "CCC"]);
    order_reference(&mut data, None, true).unwrap();
    assert_eq!(data.names, vec!["b", "a"]);
  }

  #[test]
  fn unmatched_reference_fails() {
    let mut data = pair(["a", "b"], ["AAA", "CCC"]);
    let err = order_reference(&mut data, Some("seq_name"), false).unwrap_err();
    assert!(matches!(error_kind(&err), Some(AlignError::InvalidInput(_))));
  }

  #[test]
  fn aligns_and_writes_fasta_with_weight_log(){
    let dir = tempdir().unwrap();
    let input = fasta_input(">1\nCTCTGGATAGTG\n>2\nCTATAGTG\n");
    let output = dir.path().join("out.fasta");
    let weight_file = dir.path().join("score.log");
    let params = AlignParams {
      input: input.path().to_owned(),
      output: output.clone(),
      weight_file: Some(weight_file.clone()),
      ..AlignParams::default()
    };
    run_align(&params).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, ">1\nCTCTGGATAGTG\n>2\nCT----ATAGTG\n");

    let log = std::fs::read_to_string(&weight_file).unwrap();
    let line = log.trim();
    assert!(line.starts_with(&format!("{},marginal,", input.path().display())));
    assert!(line.ends_with("1.51294"), "unexpected log line: {line}");
  }

  #[test]
  fn rejects_wrong_sequence_counts() {
    for content in [">1\nCTC\n", ">1\nCTC\n>2\nCTC\n>3\nCTC\n"] {
      let input = fasta_input(content);
      let params = AlignParams { input: input.path().to_owned(), ..AlignParams::default() };
      let err = run_align(&params).unwrap_err();
      assert!(matches!(error_kind(&err), Some(AlignError::InvalidInput(_))));
    }
  }

  #[test]
  fn score_rejects_insertion_after_deletion() {
    let input = fasta_input(">1\nATAC-GGGTC\n>2\nATA-GGGGTC\n");
    let params = AlignParams { input: input.path().to_owned(), ..AlignParams::default() };
    let err = run_score(&params).unwrap_err();
    assert!(matches!(error_kind(&err), Some(AlignError::Unmodeled(_))));
  }

  #[test]
  fn align_rejects_frameshifted_reference_with_gap_unit_three() {
    let input = fasta_input(">1\nGCGATTGCTGT\n>2\nGCGACTGTT\n");
    let params = AlignParams {
      input: input.path().to_owned(),
      gap: GapParams { len: 3, ..GapParams::default() },
      ..AlignParams::default()
    };
    let err = run_align(&params).unwrap_err();
    assert!(matches!(error_kind(&err), Some(AlignError::LengthConstraint(_))));
  }
}
