pub mod fasta;
pub mod file;
pub mod json;
pub mod phylip;
pub mod rate_csv;

use crate::invalid_input;
use crate::io::file::{open_file_or_stdin, FileFormat};
use eyre::{Report, WrapErr};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Named sequences, possibly gapped. The common currency of every codec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqData {
  pub names: Vec<String>,
  pub seqs: Vec<String>,
}

impl SeqData {
  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

/// Read sequences from a path in the format its extension implies; `-` or an
/// empty path reads JSON from standard input.
pub fn read_seq_file(path: &Path) -> Result<SeqData, Report> {
  let format = FileFormat::detect(path)?;
  let reader = open_file_or_stdin(path)?;
  let data = match format {
    FileFormat::Fasta => fasta::read_fasta(reader),
    FileFormat::Phylip => phylip::read_phylip(reader),
    FileFormat::Json => json::read_json(reader),
  }
  .wrap_err_with(|| format!("when reading sequences from {path:?}"))?;

  if data.names.len() != data.seqs.len() {
    return invalid_input!(
      "{} names but {} sequences in {path:?}",
      data.names.len(),
      data.seqs.len()
    );
  }
  Ok(data)
}

/// Write sequences to a writer in the given format.
pub fn write_seq_data(
  writer: &mut dyn Write,
  format: FileFormat,
  data: &SeqData,
) -> Result<(), Report> {
  match format {
    FileFormat::Fasta => fasta::write_fasta(writer, data),
    FileFormat::Phylip => phylip::write_phylip(writer, data),
    FileFormat::Json => json::write_json(writer, data),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn reads_by_extension() {
    let mut file = tempfile::Builder::new().suffix(".fasta").tempfile().unwrap();
    writeln!(file, ">a\nACGT\n>b\nACG-").unwrap();
    let data = read_seq_file(file.path()).unwrap();
    assert_eq!(data.names, vec!["a", "b"]);
    assert_eq!(data.seqs, vec!["ACGT", "ACG-"]);
  }

  #[test]
  fn rejects_unknown_extensions() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, ">a\nACGT").unwrap();
    assert!(read_seq_file(file.path()).is_err());
  }
}
