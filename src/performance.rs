//! # Performance
//!
//! $$
//! R_{ann} = f\,\overline{r_p}, \qquad
//! \sigma_{ann} = \sqrt{f}\,\sigma(r_p), \qquad
//! G_t = \prod_{s \le t}(1 + r_{p,s})
//! $$
//!
//! Annualized summary statistics and cumulative growth for a fixed weight
//! vector applied to a return series.

use ndarray::Array1;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::returns::ReturnMatrix;

/// Annualized statistics of a weighted portfolio.
#[derive(Clone, Copy, Debug)]
pub struct PerformanceSummary {
  pub annualized_return: f64,
  pub annualized_risk: f64,
  /// `annualized_return / annualized_risk`, `NaN` when risk is zero.
  pub sharpe: f64,
}

/// Per-period portfolio returns `R w`.
pub fn portfolio_returns(returns: &ReturnMatrix, weights: &Array1<f64>) -> Result<Array1<f64>> {
  if weights.len() != returns.n_assets() {
    return Err(PortfolioError::DimensionMismatch(format!(
      "{} weights for {} assets",
      weights.len(),
      returns.n_assets()
    )));
  }
  Ok(returns.values().dot(weights))
}

/// Annualized return, risk and Sharpe ratio of a weighted portfolio.
///
/// `frequency` is the number of observation periods per year (52 for weekly
/// series). Risk uses the population standard deviation of the period
/// returns.
pub fn summarize(
  returns: &ReturnMatrix,
  weights: &Array1<f64>,
  frequency: f64,
) -> Result<PerformanceSummary> {
  let port = portfolio_returns(returns, weights)?;
  if port.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "no return observations to summarize".to_string(),
    ));
  }
  let t = port.len() as f64;

  let mean = port.sum() / t;
  let var = port.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / t;

  let annualized_return = frequency * mean;
  let annualized_risk = frequency.sqrt() * var.sqrt();
  let sharpe = if annualized_risk > 0.0 {
    annualized_return / annualized_risk
  } else {
    f64::NAN
  };

  Ok(PerformanceSummary {
    annualized_return,
    annualized_risk,
    sharpe,
  })
}

/// Running product of `1 + r_p`, one value per observation period.
pub fn cumulative_growth(returns: &ReturnMatrix, weights: &Array1<f64>) -> Result<Array1<f64>> {
  let port = portfolio_returns(returns, weights)?;
  let mut curve = Array1::zeros(port.len());
  let mut growth = 1.0;
  for (t, &r) in port.iter().enumerate() {
    growth *= 1.0 + r;
    curve[t] = growth;
  }
  Ok(curve)
}
