//! # Errors
//!
//! $$
//! \text{failure taxonomy: } \{\text{data},\ \text{optimization},\ \text{shape}\}
//! $$
//!
//! Shared error type for the portfolio pipeline.

use thiserror::Error;

/// Errors surfaced by the portfolio pipeline.
#[derive(Debug, Error)]
pub enum PortfolioError {
  /// Too few observations to compute returns or moments.
  #[error("insufficient data: {0}")]
  InsufficientData(String),

  /// An optimization routine could not produce a valid solution.
  #[error("optimization failed: {0}")]
  OptimizationFailure(String),

  /// An upstream data source could not supply the requested series.
  ///
  /// Never constructed inside this crate; propagated unchanged from
  /// data-loading collaborators that share this error type.
  #[error("data unavailable: {0}")]
  DataUnavailable(String),

  /// Weight vector and return matrix disagree on the number of assets.
  #[error("dimension mismatch: {0}")]
  DimensionMismatch(String),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
