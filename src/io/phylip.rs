//! Sequential PHYLIP with interleaved 50-column blocks.
//!
//! Header `"<N> <L>"`, then a block of records with 10-column names and the
//! first 50 alignment columns, then unnamed continuation blocks separated by
//! blank lines.

use crate::invalid_input;
use crate::io::SeqData;
use eyre::Report;
use itertools::Itertools;
use std::io::{BufRead, Write};

const NAME_WIDTH: usize = 10;
const BLOCK_WIDTH: usize = 50;

pub fn read_phylip(reader: Box<dyn BufRead + '_>) -> Result<SeqData, Report> {
  let mut lines = Vec::new();
  for line in reader.lines() {
    let line = line?;
    let line = line.trim_end_matches(['\r', '\n']).to_owned();
    lines.push(line);
  }
  let mut iter = lines.iter().filter(|l| !l.trim().is_empty());

  let header = match iter.next() {
    Some(h) => h,
    None => return invalid_input!("empty PHYLIP input"),
  };
  let parsed = header
    .split_whitespace()
    .collect_tuple()
    .and_then(|(n, l)| Some((n.parse::<usize>().ok()?, l.parse::<usize>().ok()?)));
  let (count, length) = match parsed {
    Some(header) => header,
    None => return invalid_input!("invalid PHYLIP header: '{header}'"),
  };

  let mut data = SeqData::default();
  for record in iter.by_ref().take(count) {
    if record.len() > NAME_WIDTH {
      let (name, seq) = record.split_at(NAME_WIDTH);
      data.names.push(name.trim().to_owned());
      data.seqs.push(seq.split_whitespace().collect());
    } else {
      data.names.push(record.trim().to_owned());
      data.seqs.push(String::new());
    }
  }
  if data.names.len() != count {
    return invalid_input!(
      "PHYLIP header promises {count} sequences, found {}",
      data.names.len()
    );
  }

  // continuation blocks cycle through the records in order
  for (index, line) in iter.enumerate() {
    let seq = &mut data.seqs[index % count];
    seq.push_str(&line.split_whitespace().join(""));
  }

  for (name, seq) in data.names.iter().zip(data.seqs.iter()) {
    if seq.len() != length {
      return invalid_input!(
        "PHYLIP sequence '{name}' has {} columns, header promises {length}",
        seq.len()
      );
    }
  }
  Ok(data)
}

pub fn write_phylip(writer: &mut dyn Write, data: &SeqData) -> Result<(), Report> {
  let length = data.seqs.first().map_or(0, String::len);
  writeln!(writer, "{} {length}", data.len())?;

  let mut offset = 0;
  while offset < length || offset == 0 {
    if offset > 0 {
      writeln!(writer)?;
    }
    for (name, seq) in data.names.iter().zip(data.seqs.iter()) {
      let chunk = &seq[offset..(offset + BLOCK_WIDTH).min(seq.len())];
      if offset == 0 {
        writeln!(writer, "{name:<NAME_WIDTH$}{chunk}")?;
      } else {
        writeln!(writer, "{chunk}")?;
      }
    }
    offset += BLOCK_WIDTH;
  }
  writer.flush()?;
  Ok(())
}
