use clap::Parser;
use coral::cli::args::{CoralArgs, CoralCommand};
use coral::commands::align::{run_align, run_score};
use coral::commands::msa::{run_msa, MsaParams};
use coral::commands::sample::run_sample;
use coral::utils::global_init::{global_init, setup_logger};
use coral::utils::random::rng_from_seed;
use eyre::Report;

fn main() -> Result<(), Report> {
  global_init();
  let args = CoralArgs::parse();
  let command = args.command.unwrap_or(CoralCommand::Align(args.align));

  match command {
    CoralCommand::Align(pair) => {
      setup_logger(pair.verbose.log_level_filter());
      run_align(&pair.to_params()?)
    }
    CoralCommand::Score(pair) => {
      setup_logger(pair.verbose.log_level_filter());
      run_score(&pair.to_params()?)
    }
    CoralCommand::Sample(sample) => {
      setup_logger(sample.pair.verbose.log_level_filter());
      let params = sample.pair.to_params()?;
      let mut rng = rng_from_seed(sample.seed.as_deref());
      run_sample(&params, sample.sample_size, &mut rng)
    }
    CoralCommand::Msa(msa) => {
      setup_logger(msa.pair.verbose.log_level_filter());
      run_msa(&MsaParams {
        align: msa.pair.to_params()?,
        tree: msa.tree,
      })
    }
  }
}
