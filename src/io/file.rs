use crate::invalid_input;
use eyre::{Report, WrapErr};
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{stdin, stdout, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Sequence file formats, chosen by path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
  Fasta,
  Phylip,
  Json,
}

impl FileFormat {
  /// Detect the format from a path. `-` and the empty path mean a standard
  /// stream carrying JSON.
  pub fn detect(path: &Path) -> Result<Self, Report> {
    if is_std_stream(path) {
      return Ok(FileFormat::Json);
    }
    let ext = path
      .extension()
      .and_then(|e| e.to_str())
      .map(str::to_ascii_lowercase);
    match ext.as_deref() {
      Some("fa" | "fasta") => Ok(FileFormat::Fasta),
      Some("phy") => Ok(FileFormat::Phylip),
      Some("json") => Ok(FileFormat::Json),
      _ => invalid_input!("unsupported sequence file format: {path:?}"),
    }
  }
}

pub fn is_std_stream(path: &Path) -> bool {
  path.as_os_str().is_empty() || path == PathBuf::from("-")
}

pub fn open_file_or_stdin(path: &Path) -> Result<Box<dyn BufRead>, Report> {
  if is_std_stream(path) {
    info!("reading from standard input");
    return Ok(Box::new(BufReader::new(stdin())));
  }
  let file = File::open(path).wrap_err_with(|| format!("when opening file {path:?}"))?;
  Ok(Box::new(BufReader::with_capacity(32 * 1024, file)))
}

pub fn create_file_or_stdout(path: &Path) -> Result<Box<dyn Write>, Report> {
  if is_std_stream(path) {
    return Ok(Box::new(BufWriter::new(stdout())));
  }
  let file = File::create(path).wrap_err_with(|| format!("when creating file {path:?}"))?;
  Ok(Box::new(BufWriter::with_capacity(32 * 1024, file)))
}

/// Open a file for line-appending, creating it if needed. Used by the score
/// log.
pub fn append_file(path: &Path) -> Result<Box<dyn Write>, Report> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .wrap_err_with(|| format!("when opening file {path:?} for appending"))?;
  Ok(Box::new(BufWriter::new(file)))
}

/// Read a whole file (or stdin for `-`) into a string.
pub fn read_file_to_string(path: &Path) -> Result<String, Report> {
  let mut reader = open_file_or_stdin(path)?;
  let mut data = String::new();
  reader
    .read_to_string(&mut data)
    .wrap_err_with(|| format!("when reading file {path:?}"))?;
  Ok(data)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case("pair.fasta", FileFormat::Fasta)]
  #[case("pair.fa", FileFormat::Fasta)]
  #[case("out.PHY", FileFormat::Phylip)]
  #[case("data.json", FileFormat::Json)]
  #[case("-", FileFormat::Json)]
  #[case("", FileFormat::Json)]
  fn detects_formats(#[case] path: &str, #[case] expected: FileFormat) {
    assert_eq!(FileFormat::detect(Path::new(path)).unwrap(), expected);
  }

  #[rstest]
  #[case("alignment.ext")]
  #[case("alignment")]
  fn rejects_unknown_formats(#[case] path: &str) {
    assert!(FileFormat::detect(Path::new(path)).is_err());
  }
}
