//! # Moments
//!
//! $$
//! \hat\mu = \frac{1}{T}\sum_t r_t, \qquad
//! \hat\Sigma = \frac{1}{T-1}\sum_t (r_t-\hat\mu)(r_t-\hat\mu)^\top
//! $$
//!
//! Sample mean and covariance of a return matrix.

use ndarray::Array1;
use ndarray::Array2;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::returns::ReturnMatrix;

/// Sufficient statistics of a return series: sample mean vector and sample
/// covariance matrix (unbiased, `T - 1` denominator).
#[derive(Clone, Debug)]
pub struct MomentEstimate {
  pub mean: Array1<f64>,
  pub cov: Array2<f64>,
}

impl MomentEstimate {
  pub fn n_assets(&self) -> usize {
    self.mean.len()
  }
}

/// Estimate mean and covariance from a return matrix.
///
/// Needs at least two return rows for the covariance denominator. The
/// covariance is symmetrized to remove floating-point asymmetry from the
/// accumulation order.
pub fn estimate_moments(returns: &ReturnMatrix) -> Result<MomentEstimate> {
  let values = returns.values();
  let t = values.nrows();
  let n = values.ncols();

  if t < 2 {
    return Err(PortfolioError::InsufficientData(format!(
      "need at least 2 return rows for a covariance estimate, got {}",
      t
    )));
  }

  let mut mean = Array1::<f64>::zeros(n);
  for row in values.rows() {
    mean += &row;
  }
  mean /= t as f64;

  let mut cov = Array2::<f64>::zeros((n, n));
  for row in values.rows() {
    for i in 0..n {
      let di = row[i] - mean[i];
      for j in i..n {
        cov[[i, j]] += di * (row[j] - mean[j]);
      }
    }
  }
  cov /= (t - 1) as f64;
  for i in 0..n {
    for j in 0..i {
      cov[[i, j]] = cov[[j, i]];
    }
  }

  Ok(MomentEstimate { mean, cov })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use ndarray::array;

  use super::*;

  fn returns_from(values: Array2<f64>) -> ReturnMatrix {
    let index: Vec<NaiveDate> = (0..values.nrows())
      .map(|i| {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::weeks(i as i64)
      })
      .collect();
    let tickers = (0..values.ncols()).map(|i| format!("A{}", i)).collect();
    ReturnMatrix::from_parts(index, tickers, values).unwrap()
  }

  #[test]
  fn matches_hand_computed_moments() {
    let returns = returns_from(array![[0.01, 0.02], [0.03, -0.02], [0.05, 0.03]]);
    let est = estimate_moments(&returns).unwrap();

    assert!((est.mean[0] - 0.03).abs() < 1e-12);
    assert!((est.mean[1] - 0.01).abs() < 1e-12);
    // var(x) with ddof=1: ((−0.02)² + 0² + 0.02²)/2 = 4e-4
    assert!((est.cov[[0, 0]] - 4e-4).abs() < 1e-12);
    // cov(x,y): ((−0.02)(0.01) + 0(−0.03) + (0.02)(0.02))/2 = 1e-4
    assert!((est.cov[[0, 1]] - 1e-4).abs() < 1e-12);
    assert_eq!(est.cov[[0, 1]], est.cov[[1, 0]]);
  }

  #[test]
  fn single_row_is_insufficient() {
    let returns = returns_from(array![[0.01, 0.02]]);
    assert!(matches!(
      estimate_moments(&returns),
      Err(PortfolioError::InsufficientData(_))
    ));
  }

  #[test]
  fn covariance_is_symmetric_psd_diagonal() {
    let returns = returns_from(array![
      [0.011, -0.004, 0.002],
      [-0.007, 0.009, 0.001],
      [0.003, 0.002, -0.006],
      [0.008, -0.001, 0.004]
    ]);
    let est = estimate_moments(&returns).unwrap();

    for i in 0..3 {
      assert!(est.cov[[i, i]] >= 0.0);
      for j in 0..3 {
        assert_eq!(est.cov[[i, j]], est.cov[[j, i]]);
      }
    }
  }
}
