//! The posterior sampling driver.

use crate::align::encoding::encode_pair;
use crate::commands::align::{order_reference, read_pair, AlignParams};
use crate::io::file::create_file_or_stdout;
use crate::io::json::{write_sample_records, SampleRecord};
use crate::utils::random::SampleRng;
use eyre::{Report, WrapErr};
use log::info;

/// Draw `sample_size` alignments of the input pair and write them as a JSON
/// array. The RNG is owned by the caller so seeding stays in one place.
pub fn run_sample(
  params: &AlignParams,
  sample_size: usize,
  rng: &mut SampleRng,
) -> Result<(), Report> {
  let mut data = read_pair(params)?;
  let aligner = params.build_aligner(params.branch_length)?;
  order_reference(&mut data, params.reference.as_deref(), params.rev)?;

  let (anc, des) = (&data.seqs[0], &data.seqs[1]);
  let pair = encode_pair(anc, des, params.gap.len)?;
  let tables = aligner.fill(&pair).wrap_err("when filling the sampling lattice")?;
  info!("lattice filled, drawing {sample_size} alignments");

  let records: Vec<SampleRecord> = (0..sample_size)
    .map(|_| {
      let drawn = aligner.sample(&tables, &pair, anc, des, rng);
      SampleRecord {
        names: [data.names[0].clone(), data.names[1].clone()],
        seqs: [drawn.anc, drawn.des],
        log_weight: drawn.weight,
      }
    })
    .collect();

  let mut writer = create_file_or_stdout(&params.output)?;
  write_sample_records(&mut *writer, &records)
}
