//! FASTA reading and writing.
//!
//! Lines beginning with `;` are comments; a `>` starts a record and every
//! following line until the next record belongs to its sequence, with
//! whitespace stripped and letters uppercased. Mixed line endings are
//! tolerated. The writer wraps sequences at 60 columns.

use crate::invalid_input;
use crate::io::SeqData;
use eyre::Report;
use std::io::{BufRead, Write};

const LINE_WIDTH: usize = 60;

pub fn read_fasta(reader: Box<dyn BufRead + '_>) -> Result<SeqData, Report> {
  let mut data = SeqData::default();
  for line in reader.lines() {
    let line = line?;
    let line = line.trim_end_matches(['\r', '\n']);
    if line.starts_with(';') {
      continue;
    }
    if let Some(name) = line.strip_prefix('>') {
      data.names.push(name.trim().to_owned());
      data.seqs.push(String::new());
      continue;
    }
    let fragment: String = line
      .chars()
      .filter(|c| !c.is_whitespace())
      .map(|c| c.to_ascii_uppercase())
      .collect();
    if fragment.is_empty() {
      continue;
    }
    match data.seqs.last_mut() {
      Some(seq) => seq.push_str(&fragment),
      None => return invalid_input!("sequence data before the first FASTA header"),
    }
  }
  Ok(data)
}

pub fn write_fasta(writer: &mut dyn Write, data: &SeqData) -> Result<(), Report> {
  for (name, seq) in data.names.iter().zip(data.seqs.iter()) {
    writeln!(writer, ">{name}")?;
    for chunk in seq.as_bytes().chunks(LINE_WIDTH) {
      writer.write_all(chunk)?;
      writeln!(writer)?;
    }
  }
  writer.flush()?;
  Ok(())
}
