use eyre::Report;
use thiserror::Error;

/// Failure kinds with fixed semantics. Reports built from these variants can
/// be classified by callers with `Report::downcast_ref::<AlignError>()` no
/// matter how much context was layered on top.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
  /// Malformed file, unknown model or format, bad sequence content, missing
  /// reference name, wrong sequence count.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// A numeric parameter outside its domain (branch length, frequencies,
  /// exchangeabilities, gap probabilities).
  #[error("out of range: {0}")]
  OutOfRange(String),

  /// Sequence lengths incompatible with the codon/gap-unit structure.
  #[error("length constraint: {0}")]
  LengthConstraint(String),

  /// The requested computation falls outside the state machine, e.g. scoring
  /// an alignment with an insertion immediately after a deletion.
  #[error("not modeled: {0}")]
  Unmodeled(String),

  /// Allocation of the dynamic-programming tables failed.
  #[error("resource exhausted: {0}")]
  ResourceExhausted(String),
}

/// Classify a report by the error kind it carries, if any.
pub fn error_kind(report: &Report) -> Option<&AlignError> {
  report.downcast_ref::<AlignError>()
}

#[macro_export(local_inner_macros)]
macro_rules! invalid_input {
  ($($arg:tt)*) => {
    Err(eyre::Report::new($crate::utils::error::AlignError::InvalidInput(std::format!($($arg)*))))
  };
}

#[macro_export(local_inner_macros)]
macro_rules! out_of_range {
  ($($arg:tt)*) => {
    Err(eyre::Report::new($crate::utils::error::AlignError::OutOfRange(std::format!($($arg)*))))
  };
}

#[macro_export(local_inner_macros)]
macro_rules! length_constraint {
  ($($arg:tt)*) => {
    Err(eyre::Report::new($crate::utils::error::AlignError::LengthConstraint(std::format!($($arg)*))))
  };
}

#[macro_export(local_inner_macros)]
macro_rules! unmodeled {
  ($($arg:tt)*) => {
    Err(eyre::Report::new($crate::utils::error::AlignError::Unmodeled(std::format!($($arg)*))))
  };
}

pub use invalid_input;
pub use length_constraint;
pub use out_of_range;
pub use unmodeled;

#[cfg(test)]
mod tests {
  use super::*;
  use eyre::WrapErr;

  fn fails() -> Result<(), Report> {
    invalid_input!("three sequences, expected two")
  }

  #[test]
  fn kind_survives_context() {
    let report = fails().wrap_err("while reading input").unwrap_err();
    assert!(matches!(
      error_kind(&report),
      Some(AlignError::InvalidInput(_))
    ));
  }
}
