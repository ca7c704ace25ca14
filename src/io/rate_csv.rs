//! User-supplied codon substitution rate matrices.
//!
//! The file starts with one line holding the branch length, followed by
//! exactly 4096 rows `codon_src,codon_dst,rate` covering every ordered codon
//! pair once, in any order. The rates fill the instantaneous matrix Q, which
//! is scaled by the branch length and exponentiated; the result bypasses the
//! built-in model kernel entirely.

use crate::alphabet::codon::{codon_index, NUM_CODONS};
use crate::invalid_input;
use crate::model::expm::expm;
use eyre::{Report, WrapErr};
use ndarray::Array2;
use serde::Deserialize;
use std::io::BufRead;
use std::path::Path;

/// `codon_src,codon_dst,rate`
#[derive(Debug, Deserialize)]
struct RateRow(String, String, f64);

/// Read a rate matrix file and return the exponentiated 64x64 P matrix.
pub fn read_rate_matrix(path: &Path) -> Result<Array2<f64>, Report> {
  let mut reader = crate::io::file::open_file_or_stdin(path)?;
  let mut first_line = String::new();
  reader
    .read_line(&mut first_line)
    .wrap_err_with(|| format!("when reading branch length from {path:?}"))?;
  let branch_length: f64 = match first_line.trim().parse() {
    Ok(t) => t,
    Err(_) => {
      return invalid_input!(
        "rate matrix file {path:?} must start with a branch length, got '{}'",
        first_line.trim()
      )
    }
  };

  let mut q = Array2::<f64>::zeros((NUM_CODONS, NUM_CODONS));
  let mut seen = [[false; NUM_CODONS]; NUM_CODONS];
  let mut rows = 0_usize;

  let mut csv_reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .from_reader(reader);
  for record in csv_reader.deserialize::<RateRow>() {
    let row = match record {
      Ok(row) => row,
      Err(e) => return invalid_input!("malformed rate matrix row in {path:?}: {e}"),
    };
    let src = parse_codon(&row.0)?;
    let dst = parse_codon(&row.1)?;
    if seen[src][dst] {
      return invalid_input!(
        "codon pair {},{} appears more than once in {path:?}",
        row.0,
        row.1
      );
    }
    seen[src][dst] = true;
    q[[src, dst]] = row.2;
    rows += 1;
  }

  if rows != NUM_CODONS * NUM_CODONS {
    return invalid_input!(
      "rate matrix file {path:?} must contain exactly {} rows, found {rows}",
      NUM_CODONS * NUM_CODONS
    );
  }

  Ok(expm(&(q * branch_length)).mapv(|x| x.max(0.0)))
}

fn parse_codon(text: &str) -> Result<usize, Report> {
  let chars: Vec<char> = text.trim().chars().collect();
  match chars.as_slice() {
    [a, b, c] => codon_index([*a, *b, *c]),
    _ => invalid_input!("'{text}' is not a codon"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::alphabet::codon::codon_chars;
  use crate::constants::{DEFAULT_BRANCH_LENGTH, DEFAULT_OMEGA, DEFAULT_PI};
  use crate::model::mg94::{mg94_p, mg94_q};
  use approx::assert_abs_diff_eq;
  use std::io::Write;
  use tempfile::NamedTempFile;

  fn write_matrix_csv(q: &Array2<f64>, branch_length: f64, extra_rows: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{branch_length}").unwrap();
    for i in 0..NUM_CODONS {
      for j in 0..NUM_CODONS {
        let src: String = codon_chars(i).iter().collect();
        let dst: String = codon_chars(j).iter().collect();
        writeln!(file, "{src},{dst},{}", q[[i, j]]).unwrap();
      }
    }
    for _ in 0..extra_rows {
      writeln!(file, "AAA,AAA,0.0").unwrap();
    }
    file.flush().unwrap();
    file
  }

  #[test]
  fn reproduces_the_built_in_model() {
    // the normalized MG94 generator written to CSV must exponentiate to the
    // same P the kernel computes
    let q = mg94_q(DEFAULT_OMEGA, &DEFAULT_PI, &[0.0; 6]).unwrap();
    let file = write_matrix_csv(&q, DEFAULT_BRANCH_LENGTH, 0);
    let p_csv = read_rate_matrix(file.path()).unwrap();
    let p = mg94_p(DEFAULT_BRANCH_LENGTH, DEFAULT_OMEGA, &DEFAULT_PI, &[0.0; 6]).unwrap();
    assert_abs_diff_eq!(p_csv, p, epsilon = 1e-9);
  }

  #[test]
  fn rejects_wrong_row_counts() {
    let q = mg94_q(DEFAULT_OMEGA, &DEFAULT_PI, &[0.0; 6]).unwrap();
    let file = write_matrix_csv(&q, DEFAULT_BRANCH_LENGTH, 1);
    assert!(read_rate_matrix(file.path()).is_err());
  }

  #[test]
  fn rejects_missing_branch_length() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "AAA,AAC,0.5").unwrap();
    file.flush().unwrap();
    assert!(read_rate_matrix(file.path()).is_err());
  }
}
