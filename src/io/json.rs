//! JSON codec for sequence data and the sample output stream.

use crate::invalid_input;
use crate::io::SeqData;
use crate::utils::float_fmt::format_significant;
use eyre::Report;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Read, Write};

/// Wire shape: `{"data":{"names":[...],"seqs":[...]}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonDoc {
  data: SeqData,
}

pub fn read_json(mut reader: Box<dyn BufRead + '_>) -> Result<SeqData, Report> {
  let mut text = String::new();
  reader.read_to_string(&mut text)?;
  match serde_json::from_str::<JsonDoc>(&text) {
    Ok(doc) => Ok(doc.data),
    Err(e) => invalid_input!("malformed JSON sequence data: {e}"),
  }
}

pub fn write_json(writer: &mut dyn Write, data: &SeqData) -> Result<(), Report> {
  let doc = JsonDoc { data: data.clone() };
  serde_json::to_writer(&mut *writer, &doc)?;
  writeln!(writer)?;
  writer.flush()?;
  Ok(())
}

/// One sampled alignment for the `sample` output array.
#[derive(Debug, Clone)]
pub struct SampleRecord {
  pub names: [String; 2],
  pub seqs: [String; 2],
  pub log_weight: f64,
}

/// Write sampled alignments in the fixed line-by-line array shape:
///
/// ```json
/// [
///   {
///     "aln": {
///       "A": "CC--CCCC",
///       "B": "CCCCCCCC"
///     },
///     "weight": 0.031239,
///     "log_weight": -3.46609
///   }
/// ]
/// ```
pub fn write_sample_records(writer: &mut dyn Write, records: &[SampleRecord]) -> Result<(), Report> {
  writeln!(writer, "[")?;
  for (index, record) in records.iter().enumerate() {
    writeln!(writer, "  {{")?;
    writeln!(writer, "    \"aln\": {{")?;
    writeln!(writer, "      \"{}\": \"{}\",", record.names[0], record.seqs[0])?;
    writeln!(writer, "      \"{}\": \"{}\"", record.names[1], record.seqs[1])?;
    writeln!(writer, "    }},")?;
    writeln!(
      writer,
      "    \"weight\": {},",
      format_significant(record.log_weight.exp(), 6)
    )?;
    writeln!(
      writer,
      "    \"log_weight\": {}",
      format_significant(record.log_weight, 6)
    )?;
    if index + 1 < records.len() {
      writeln!(writer, "  }},")?;
    } else {
      writeln!(writer, "  }}")?;
    }
  }
  writeln!(writer, "]")?;
  writer.flush()?;
  Ok(())
}
