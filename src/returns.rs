//! # Return Series
//!
//! $$
//! r_t = \frac{P_t}{P_{t-1}} - 1
//! $$
//!
//! Price matrix container and simple-return computation.

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::Axis;

use crate::error::PortfolioError;
use crate::error::Result;

/// Date-indexed adjusted-close prices, one column per asset.
///
/// Missing observations are stored as `NaN`. The date index is strictly
/// increasing with no duplicates.
#[derive(Clone, Debug)]
pub struct PriceMatrix {
  index: Vec<NaiveDate>,
  tickers: Vec<String>,
  values: Array2<f64>,
}

impl PriceMatrix {
  /// Build a price matrix, validating the date index against the value shape.
  pub fn new(index: Vec<NaiveDate>, tickers: Vec<String>, values: Array2<f64>) -> Result<Self> {
    if values.nrows() != index.len() || values.ncols() != tickers.len() {
      return Err(PortfolioError::DimensionMismatch(format!(
        "price values are {}x{} but index has {} dates and {} tickers",
        values.nrows(),
        values.ncols(),
        index.len(),
        tickers.len()
      )));
    }

    for pair in index.windows(2) {
      if pair[1] <= pair[0] {
        return Err(PortfolioError::InsufficientData(format!(
          "date index must be strictly increasing, got {} after {}",
          pair[1], pair[0]
        )));
      }
    }

    Ok(Self {
      index,
      tickers,
      values,
    })
  }

  pub fn index(&self) -> &[NaiveDate] {
    &self.index
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }
}

/// Date-indexed simple returns derived from a [`PriceMatrix`].
#[derive(Clone, Debug)]
pub struct ReturnMatrix {
  index: Vec<NaiveDate>,
  tickers: Vec<String>,
  values: Array2<f64>,
}

impl ReturnMatrix {
  /// Wrap a precomputed return matrix (e.g. supplied by a persistence layer).
  pub fn from_parts(
    index: Vec<NaiveDate>,
    tickers: Vec<String>,
    values: Array2<f64>,
  ) -> Result<Self> {
    if values.nrows() != index.len() || values.ncols() != tickers.len() {
      return Err(PortfolioError::DimensionMismatch(format!(
        "return values are {}x{} but index has {} dates and {} tickers",
        values.nrows(),
        values.ncols(),
        index.len(),
        tickers.len()
      )));
    }

    Ok(Self {
      index,
      tickers,
      values,
    })
  }

  pub fn index(&self) -> &[NaiveDate] {
    &self.index
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn n_periods(&self) -> usize {
    self.values.nrows()
  }
}

/// Compute period-over-period simple returns from a price matrix.
///
/// A row is kept only when every asset has a finite, positive prior price and
/// a finite current price; one bad observation invalidates the whole date.
/// Fails when fewer than one clean return row remains.
pub fn compute_returns(prices: &PriceMatrix) -> Result<ReturnMatrix> {
  let values = prices.values();
  let n_rows = values.nrows();
  let n_assets = values.ncols();

  if n_rows < 2 {
    return Err(PortfolioError::InsufficientData(format!(
      "need at least 2 price rows to compute returns, got {}",
      n_rows
    )));
  }

  let mut index = Vec::with_capacity(n_rows - 1);
  let mut rows = Vec::with_capacity(n_rows - 1);

  for t in 1..n_rows {
    let prev = values.index_axis(Axis(0), t - 1);
    let curr = values.index_axis(Axis(0), t);

    let clean = (0..n_assets).all(|a| prev[a].is_finite() && prev[a] > 0.0 && curr[a].is_finite());
    if !clean {
      continue;
    }

    let mut row = Vec::with_capacity(n_assets);
    for a in 0..n_assets {
      row.push(curr[a] / prev[a] - 1.0);
    }
    index.push(prices.index()[t]);
    rows.push(row);
  }

  if rows.is_empty() {
    return Err(PortfolioError::InsufficientData(
      "no complete consecutive price observations".to_string(),
    ));
  }

  let flat: Vec<f64> = rows.into_iter().flatten().collect();
  let values = Array2::from_shape_vec((index.len(), n_assets), flat)
    .map_err(|e| PortfolioError::DimensionMismatch(e.to_string()))?;

  ReturnMatrix::from_parts(index, prices.tickers().to_vec(), values)
}
