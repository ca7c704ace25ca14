//! Command-line interface.

use crate::align::gap::GapParams;
use crate::commands::align::AlignParams;
use crate::constants::{
  DEFAULT_BRANCH_LENGTH, DEFAULT_GAP_EXTEND, DEFAULT_GAP_OPEN, DEFAULT_OMEGA,
};
use crate::invalid_input;
use crate::model::marginal::AmbPolicy;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use eyre::Report;
use std::path::PathBuf;

/// Statistical pairwise alignment of coding DNA under a codon-aware
/// evolutionary model.
#[derive(Parser, Debug)]
#[clap(name = "coral", version, author)]
#[clap(args_conflicts_with_subcommands = true)]
pub struct CoralArgs {
  #[clap(subcommand)]
  pub command: Option<CoralCommand>,

  /// Without a subcommand, behaves as `coral align`.
  #[clap(flatten)]
  pub align: PairArgs,
}

#[derive(Subcommand, Debug)]
pub enum CoralCommand {
  /// Align a pair of sequences (the default).
  Align(PairArgs),

  /// Score an already-aligned pair and print the log weight.
  Score(PairArgs),

  /// Draw alignments from the pairwise lattice and emit them as JSON.
  Sample(SampleArgs),

  /// Progressive multiple alignment over a Newick guide tree.
  Msa(MsaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PairArgs {
  /// Input sequences (.fa, .fasta, .phy, .json); '-' or omitted reads JSON
  /// from standard input
  #[clap(value_name = "FILE")]
  pub input: Option<PathBuf>,

  /// Input sequences, flag form
  #[clap(short = 'f', long = "file", conflicts_with = "input", value_name = "FILE")]
  pub file: Option<PathBuf>,

  /// Substitution model: marginal (aliases mg94, m-coati), dna, ecm, m-ecm
  #[clap(short = 'm', long, default_value = "marginal")]
  pub model: String,

  /// Output path; the extension picks the format; '-' or omitted writes
  /// JSON to standard output
  #[clap(short = 'o', long, default_value = "-")]
  pub output: PathBuf,

  /// Append `input,model,weight` to this score log
  #[clap(short = 'w', long = "weight", value_name = "FILE")]
  pub weight: Option<PathBuf>,

  /// Name of the reference (ancestor) sequence
  #[clap(long = "ref", value_name = "NAME")]
  pub reference: Option<String>,

  /// Use the second input sequence as the reference
  #[clap(long)]
  pub rev: bool,

  /// Gap opening probability
  #[clap(long, value_name = "P", default_value_t = DEFAULT_GAP_OPEN)]
  pub gap_open: f64,

  /// Gap extension probability
  #[clap(long, value_name = "P", default_value_t = DEFAULT_GAP_EXTEND)]
  pub gap_extend: f64,

  /// Gap unit length: 1 allows frameshifts, 3 keeps gaps in frame
  #[clap(long, value_name = "LEN", default_value_t = 1)]
  pub gap_len: usize,

  /// Scoring policy for ambiguous nucleotides
  #[clap(long, value_enum, default_value_t = AmbPolicy::Avg)]
  pub amb: AmbPolicy,

  /// Codon substitution rate matrix CSV; overrides --model
  #[clap(long, value_name = "FILE")]
  pub rate: Option<PathBuf>,

  /// Branch length between the two sequences
  #[clap(long, value_name = "T", default_value_t = DEFAULT_BRANCH_LENGTH)]
  pub branch_length: f64,

  /// Nonsynonymous/synonymous rate ratio
  #[clap(long, value_name = "W", default_value_t = DEFAULT_OMEGA)]
  pub omega: f64,

  /// Nucleotide frequencies as A,C,G,T
  #[clap(long, value_name = "FREQS", value_delimiter = ',', allow_hyphen_values = true)]
  pub pi: Option<Vec<f64>>,

  /// GTR exchangeabilities as AC,AG,AT,CG,CT,GT
  #[clap(long, value_name = "SIGMAS", value_delimiter = ',', allow_hyphen_values = true)]
  pub sigma: Option<Vec<f64>>,

  #[clap(flatten)]
  pub verbose: Verbosity<WarnLevel>,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
  #[clap(flatten)]
  pub pair: PairArgs,

  /// Number of alignments to draw
  #[clap(long, value_name = "N", default_value_t = 1)]
  pub sample_size: usize,

  /// Seed string for the sampling RNG; omitted means entropy
  #[clap(long, value_name = "SEED")]
  pub seed: Option<String>,
}

#[derive(Args, Debug)]
pub struct MsaArgs {
  #[clap(flatten)]
  pub pair: PairArgs,

  /// Newick guide tree
  #[clap(short = 't', long, value_name = "FILE")]
  pub tree: PathBuf,
}

fn fixed_width<const N: usize>(name: &str, values: Option<&Vec<f64>>) -> Result<Option<[f64; N]>, Report> {
  match values {
    None => Ok(None),
    Some(values) => match <[f64; N]>::try_from(values.as_slice()) {
      Ok(array) => Ok(Some(array)),
      Err(_) => invalid_input!("--{name} takes exactly {N} comma-separated values, got {}", values.len()),
    },
  }
}

impl PairArgs {
  /// Merge the argument forms into the driver configuration.
  pub fn to_params(&self) -> Result<AlignParams, Report> {
    let defaults = AlignParams::default();
    let input = self
      .input
      .clone()
      .or_else(|| self.file.clone())
      .unwrap_or_default();
    Ok(AlignParams {
      input,
      output: self.output.clone(),
      model: self.model.clone(),
      weight_file: self.weight.clone(),
      reference: self.reference.clone(),
      rev: self.rev,
      gap: GapParams {
        open: self.gap_open,
        extend: self.gap_extend,
        len: self.gap_len,
      },
      amb: self.amb,
      rate_csv: self.rate.clone(),
      branch_length: self.branch_length,
      omega: self.omega,
      pi: fixed_width::<4>("pi", self.pi.as_ref())?.unwrap_or(defaults.pi),
      sigma: fixed_width::<6>("sigma", self.sigma.as_ref())?.unwrap_or(defaults.sigma),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn cli_definition_is_consistent() {
    CoralArgs::command().debug_assert();
  }

  #[test]
  fn bare_invocation_is_align() {
    let args = CoralArgs::parse_from(["coral", "pair.fasta", "-o", "out.phy"]);
    assert!(args.command.is_none());
    let params = args.align.to_params().unwrap();
    assert_eq!(params.input, PathBuf::from("pair.fasta"));
    assert_eq!(params.output, PathBuf::from("out.phy"));
    assert_eq!(params.model, "marginal");
  }

  #[test]
  fn subcommands_carry_their_own_flags() {
    let args = CoralArgs::parse_from([
      "coral", "sample", "pair.fasta", "--sample-size", "3", "--seed", "42",
    ]);
    match args.command {
      Some(CoralCommand::Sample(sample)) => {
        assert_eq!(sample.sample_size, 3);
        assert_eq!(sample.seed.as_deref(), Some("42"));
      }
      other => panic!("expected sample, got {other:?}"),
    }
  }

  #[test]
  fn pi_must_have_four_values() {
    let args = CoralArgs::parse_from(["coral", "pair.fasta", "--pi", "0.3,0.2,0.5"]);
    assert!(args.align.to_params().is_err());
  }

  #[test]
  fn pi_and_sigma_parse_comma_lists() {
    let args = CoralArgs::parse_from([
      "coral", "pair.fasta",
      "--pi", "0.308,0.185,0.199,0.308",
      "--sigma", "0.1,0.2,0.3,0.4,0.5,0.6",
    ]);
    let params = args.align.to_params().unwrap();
    assert_eq!(params.pi, [0.308, 0.185, 0.199, 0.308]);
    assert_eq!(params.sigma, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
  }
}
