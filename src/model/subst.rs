//! Substitution-model dispatch.
//!
//! Maps the user-facing model name (plus parameter overrides) to the marginal
//! emission table the aligner consumes. A user rate matrix, when given,
//! always wins over the named model.

use crate::invalid_input;
use crate::io::rate_csv::read_rate_matrix;
use crate::model::marginal::MarginalTable;
use crate::model::mg94::{mg94_p, nuc_p};
use eyre::Report;
use log::debug;
use std::path::PathBuf;

/// Everything needed to build an emission table.
#[derive(Debug, Clone)]
pub struct SubstParams {
  pub model: String,
  pub branch_length: f64,
  pub omega: f64,
  pub pi: [f64; 4],
  pub sigma: [f64; 6],
  pub rate_csv: Option<PathBuf>,
}

impl Default for SubstParams {
  fn default() -> Self {
    Self {
      model: "marginal".to_owned(),
      branch_length: crate::constants::DEFAULT_BRANCH_LENGTH,
      omega: crate::constants::DEFAULT_OMEGA,
      pi: crate::constants::DEFAULT_PI,
      sigma: [0.0; 6],
      rate_csv: None,
    }
  }
}

pub fn build_subst_table(params: &SubstParams) -> Result<MarginalTable, Report> {
  if let Some(path) = &params.rate_csv {
    debug!("building emission table from user rate matrix {path:?}");
    let p = read_rate_matrix(path)?;
    return Ok(MarginalTable::from_codon_p(&p, &params.pi));
  }

  match params.model.as_str() {
    "mg94" | "marginal" | "m-coati" => {
      debug!(
        "building MG94 marginal table (t = {}, omega = {})",
        params.branch_length, params.omega
      );
      let p = mg94_p(params.branch_length, params.omega, &params.pi, &params.sigma)?;
      Ok(MarginalTable::from_codon_p(&p, &params.pi))
    }
    "dna" => {
      let p = nuc_p(params.branch_length, &params.pi, &params.sigma)?;
      Ok(MarginalTable::from_nuc_p(&p, &params.pi))
    }
    "ecm" | "m-ecm" => invalid_input!(
      "model '{}' needs its empirical rate table supplied with --rate",
      params.model
    ),
    "coati" => invalid_input!(
      "the transducer-composition model 'coati' is not available; use 'marginal'"
    ),
    other => invalid_input!("unknown substitution model: '{other}'"),
  }
}
