//! # Efficient Frontier
//!
//! $$
//! \min_{\mathbf{w}} \ \tfrac{1}{2}\mathbf{w}^\top\Sigma\mathbf{w}
//!   - \lambda\,\mu^\top\mathbf{w}
//! \quad \text{s.t.} \quad \mathbf{1}^\top\mathbf{w} = 1,\
//! l \le w_i \le u
//! $$
//!
//! Risk-premium sweep over a box-constrained mean-variance program.

use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::moments::MomentEstimate;

/// Sweep and constraint configuration for [`trace_frontier`].
#[derive(Clone, Debug, ImplNew)]
pub struct FrontierConfig {
  /// Lower bound per asset weight.
  pub min_allocation: f64,
  /// Upper bound per asset weight.
  pub max_allocation: f64,
  /// Upper end of the risk-premium sweep (inclusive).
  pub risk_premium_up: f64,
  /// Sweep step size.
  pub risk_increment: f64,
  /// Iteration cap per risk-premium level.
  pub max_iters: usize,
  /// Fixed-point residual below which a level counts as converged.
  pub tolerance: f64,
}

impl Default for FrontierConfig {
  fn default() -> Self {
    Self {
      min_allocation: 0.0,
      max_allocation: 0.5,
      risk_premium_up: 0.5,
      risk_increment: 0.005,
      max_iters: 20_000,
      tolerance: 1e-9,
    }
  }
}

/// One converged row of the efficient frontier.
#[derive(Clone, Debug)]
pub struct FrontierPoint {
  /// Risk-premium level this row was solved at.
  pub risk_premium: f64,
  /// Optimal weights, rounded to 4 decimals with the residual reabsorbed so
  /// the vector still sums to one.
  pub weights: Array1<f64>,
  /// Portfolio standard deviation at the reported weights.
  pub risk: f64,
  /// Expected portfolio return at the reported weights.
  pub expected_return: f64,
  /// `expected_return / risk`, `NaN` when risk is zero.
  pub sharpe: f64,
}

fn sigma_w(cov: &ndarray::Array2<f64>, w: &Array1<f64>) -> Array1<f64> {
  cov.dot(w)
}

/// Euclidean projection onto `{w : sum(w) = 1, lo <= w_i <= hi}`.
///
/// The projection is `w_i = clamp(v_i - tau, lo, hi)` for the unique shift
/// `tau` making the coordinates sum to one; `tau` is found by bisection on
/// the monotone sum.
fn project_capped_simplex(v: &Array1<f64>, lo: f64, hi: f64) -> Array1<f64> {
  let v_min = v.iter().cloned().fold(f64::INFINITY, f64::min);
  let v_max = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

  let mut tau_lo = v_min - hi;
  let mut tau_hi = v_max - lo;

  for _ in 0..100 {
    let tau = 0.5 * (tau_lo + tau_hi);
    let sum: f64 = v.iter().map(|&vi| (vi - tau).clamp(lo, hi)).sum();
    if sum > 1.0 {
      tau_lo = tau;
    } else {
      tau_hi = tau;
    }
  }

  let tau = 0.5 * (tau_lo + tau_hi);
  v.mapv(|vi| (vi - tau).clamp(lo, hi))
}

/// Solve one risk-premium level by projected gradient descent from the
/// uniform start. Returns `None` when the iteration cap is hit before the
/// fixed-point residual drops below tolerance.
fn solve_level(
  moments: &MomentEstimate,
  risk_premium: f64,
  config: &FrontierConfig,
) -> Option<Array1<f64>> {
  let n = moments.n_assets();
  let mut w = Array1::from_elem(n, 1.0 / n as f64);
  w = project_capped_simplex(&w, config.min_allocation, config.max_allocation);

  // trace(Sigma) upper-bounds the largest eigenvalue, so 1/trace is a safe
  // gradient step for this quadratic.
  let trace: f64 = (0..n).map(|i| moments.cov[[i, i]]).sum();
  let step = 1.0 / trace.max(1e-12);

  for _ in 0..config.max_iters {
    let grad = sigma_w(&moments.cov, &w) - &(risk_premium * &moments.mean);
    let descended = &w - &(step * &grad);
    let w_next = project_capped_simplex(&descended, config.min_allocation, config.max_allocation);

    let residual = w_next
      .iter()
      .zip(w.iter())
      .map(|(a, b)| (a - b).abs())
      .fold(0.0, f64::max);
    w = w_next;

    if residual < config.tolerance {
      return Some(w);
    }
  }

  None
}

/// Round weights to 4 decimals, then absorb the rounding residual into the
/// coordinates with headroom so the unit sum survives the rounding.
fn round_unit_sum(w: &Array1<f64>, lo: f64, hi: f64) -> Array1<f64> {
  let mut w = w.mapv(|x| (x * 1e4).round() / 1e4);

  let mut residual = 1.0 - w.sum();
  for i in 0..w.len() {
    if residual.abs() < 1e-12 {
      break;
    }
    let adjust = if residual > 0.0 {
      residual.min((hi - w[i]).max(0.0))
    } else {
      residual.max((lo - w[i]).min(0.0))
    };
    w[i] += adjust;
    residual -= adjust;
  }

  w
}

/// Evaluate risk, return and Sharpe for a weight vector.
pub(crate) fn risk_return_sharpe(moments: &MomentEstimate, w: &Array1<f64>) -> (f64, f64, f64) {
  let risk = w.dot(&sigma_w(&moments.cov, w)).max(0.0).sqrt();
  let ret = w.dot(&moments.mean);
  let sharpe = if risk > 0.0 { ret / risk } else { f64::NAN };
  (risk, ret, sharpe)
}

/// Trace the efficient frontier by sweeping the risk premium from zero to
/// `risk_premium_up` in `risk_increment` steps.
///
/// Levels that fail to converge are logged and skipped; the sweep itself
/// only fails when the bounds cannot hold a unit-sum portfolio at all.
/// Reported weights are rounded to 4 decimals, with the rounding residual
/// pushed back into the weights so each row still sums to one; the row
/// statistics are computed on the reported weights.
pub fn trace_frontier(
  moments: &MomentEstimate,
  config: &FrontierConfig,
) -> Result<Vec<FrontierPoint>> {
  let n = moments.n_assets();
  if n == 0 {
    return Err(PortfolioError::InsufficientData(
      "no assets in moment estimate".to_string(),
    ));
  }
  if config.risk_increment <= 0.0 {
    return Err(PortfolioError::OptimizationFailure(
      "risk_increment must be positive".to_string(),
    ));
  }
  if config.min_allocation > config.max_allocation
    || n as f64 * config.max_allocation < 1.0
    || n as f64 * config.min_allocation > 1.0
  {
    return Err(PortfolioError::OptimizationFailure(format!(
      "allocation bounds [{}, {}] cannot hold a unit-sum portfolio of {} assets",
      config.min_allocation, config.max_allocation, n
    )));
  }

  let n_levels = (config.risk_premium_up / config.risk_increment + 0.5).floor() as usize;
  let mut frontier = Vec::with_capacity(n_levels + 1);

  for k in 0..=n_levels {
    let risk_premium = k as f64 * config.risk_increment;

    let Some(w) = solve_level(moments, risk_premium, config) else {
      warn!(risk_premium, "frontier level did not converge, skipping row");
      continue;
    };

    let w = round_unit_sum(&w, config.min_allocation, config.max_allocation);
    let (risk, expected_return, sharpe) = risk_return_sharpe(moments, &w);
    frontier.push(FrontierPoint {
      risk_premium,
      weights: w,
      risk,
      expected_return,
      sharpe,
    });
  }

  Ok(frontier)
}

/// Pick the frontier row with the highest Sharpe ratio.
///
/// Rows with an undefined (`NaN`) Sharpe are ignored.
pub fn naive_portfolio(frontier: &[FrontierPoint]) -> Result<FrontierPoint> {
  frontier
    .iter()
    .filter(|p| p.sharpe.is_finite())
    .max_by(|a, b| a.sharpe.total_cmp(&b.sharpe))
    .cloned()
    .ok_or_else(|| {
      PortfolioError::OptimizationFailure(
        "frontier has no row with a defined Sharpe ratio".to_string(),
      )
    })
}

/// Risk/return/Sharpe triples of uniformly random sum-normalized portfolios,
/// used as the scatter cloud behind frontier charts.
#[derive(Clone, Debug)]
pub struct RandomPortfolios {
  pub risks: Vec<f64>,
  pub returns: Vec<f64>,
  pub sharpes: Vec<f64>,
}

/// Sample `count` random long-only portfolios with a fixed seed.
pub fn random_portfolios(moments: &MomentEstimate, count: usize, seed: u64) -> RandomPortfolios {
  let n = moments.n_assets();
  let mut rng = StdRng::seed_from_u64(seed);

  let mut risks = Vec::with_capacity(count);
  let mut returns = Vec::with_capacity(count);
  let mut sharpes = Vec::with_capacity(count);

  for _ in 0..count {
    let mut w = Array1::random_using(n, Uniform::new(0.0, 1.0), &mut rng);
    let sum = w.sum();
    if sum <= 0.0 {
      continue;
    }
    w /= sum;

    let (risk, ret, sharpe) = risk_return_sharpe(moments, &w);
    risks.push(risk);
    returns.push(ret);
    sharpes.push(sharpe);
  }

  RandomPortfolios {
    risks,
    returns,
    sharpes,
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;
  use ndarray::Array2;

  use super::*;

  fn sample_moments() -> MomentEstimate {
    MomentEstimate {
      mean: array![0.0021, 0.0009, 0.0015, 0.0004],
      cov: array![
        [4.0e-4, 0.8e-4, 0.5e-4, 0.1e-4],
        [0.8e-4, 2.5e-4, 0.4e-4, 0.1e-4],
        [0.5e-4, 0.4e-4, 3.0e-4, 0.2e-4],
        [0.1e-4, 0.1e-4, 0.2e-4, 0.9e-4]
      ],
    }
  }

  #[test]
  fn projection_lands_on_capped_simplex() {
    let v = array![0.9, -0.3, 0.5, 0.1];
    let w = project_capped_simplex(&v, 0.0, 0.5);

    assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
    assert!(w.iter().all(|&x| (0.0..=0.5).contains(&x)));
  }

  #[test]
  fn frontier_rows_satisfy_constraints() {
    let moments = sample_moments();
    let frontier = trace_frontier(&moments, &FrontierConfig::default()).unwrap();

    assert!(!frontier.is_empty());
    for point in &frontier {
      assert!((point.weights.sum() - 1.0).abs() < 1e-6);
      assert!(point
        .weights
        .iter()
        .all(|&w| (-1e-9..=0.5 + 1e-9).contains(&w)));
      assert!(point.risk >= 0.0);
    }
  }

  #[test]
  fn rounding_residual_is_reabsorbed() {
    let w = array![0.250049, 0.250049, 0.250049, 0.249853];
    let rounded = round_unit_sum(&w, 0.0, 0.5);

    assert!((rounded.sum() - 1.0).abs() < 1e-9);
    assert!(rounded.iter().all(|&x| (0.0..=0.5).contains(&x)));
    // The first coordinate with headroom absorbs the 1e-4 shortfall.
    assert!((rounded[0] - 0.2501).abs() < 1e-12);
  }

  #[test]
  fn frontier_rows_keep_unit_sum_after_rounding() {
    let moments = sample_moments();
    let frontier = trace_frontier(&moments, &FrontierConfig::default()).unwrap();

    for point in &frontier {
      assert!((point.weights.sum() - 1.0).abs() < 1e-9);
    }
  }

  #[test]
  fn risk_is_non_decreasing_along_sweep() {
    let moments = sample_moments();
    let frontier = trace_frontier(&moments, &FrontierConfig::default()).unwrap();

    for pair in frontier.windows(2) {
      // 1e-5 slack absorbs the 4-decimal rounding of reported weights.
      assert!(pair[1].risk >= pair[0].risk - 1e-5);
      assert!(pair[1].risk_premium > pair[0].risk_premium);
    }
  }

  #[test]
  fn sweep_is_deterministic() {
    let moments = sample_moments();
    let a = trace_frontier(&moments, &FrontierConfig::default()).unwrap();
    let b = trace_frontier(&moments, &FrontierConfig::default()).unwrap();

    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
      assert_eq!(x.weights, y.weights);
      assert_eq!(x.risk.to_bits(), y.risk.to_bits());
    }
  }

  #[test]
  fn matches_closed_form_when_box_is_slack() {
    // With wide bounds only the unit-sum constraint binds, so the optimum is
    // w = Sigma^{-1} (lambda mu + gamma 1) with gamma chosen for sum(w) = 1.
    let moments = sample_moments();
    let n = moments.n_assets();
    let lambda = 0.2;

    let config = FrontierConfig {
      min_allocation: -5.0,
      max_allocation: 5.0,
      risk_premium_up: lambda,
      risk_increment: lambda,
      ..FrontierConfig::default()
    };
    let frontier = trace_frontier(&moments, &config).unwrap();
    let solved = frontier
      .iter()
      .find(|p| (p.risk_premium - lambda).abs() < 1e-12)
      .unwrap();

    let sigma = nalgebra::DMatrix::from_fn(n, n, |i, j| moments.cov[[i, j]]);
    let mu = nalgebra::DVector::from_fn(n, |i, _| moments.mean[i]);
    let ones = nalgebra::DVector::from_element(n, 1.0);
    let sigma_inv = sigma.try_inverse().unwrap();

    let a = (&sigma_inv * &mu) * lambda;
    let b = &sigma_inv * &ones;
    let gamma = (1.0 - ones.dot(&a)) / ones.dot(&b);
    let expected = a + b * gamma;

    for i in 0..n {
      assert!((solved.weights[i] - expected[i]).abs() < 1e-3);
    }
  }

  #[test]
  fn infeasible_bounds_are_rejected() {
    let moments = sample_moments();
    let config = FrontierConfig {
      min_allocation: 0.0,
      max_allocation: 0.2,
      ..FrontierConfig::default()
    };

    assert!(matches!(
      trace_frontier(&moments, &config),
      Err(PortfolioError::OptimizationFailure(_))
    ));
  }

  #[test]
  fn naive_portfolio_picks_max_sharpe_row() {
    let moments = sample_moments();
    let frontier = trace_frontier(&moments, &FrontierConfig::default()).unwrap();
    let best = naive_portfolio(&frontier).unwrap();

    for point in &frontier {
      if point.sharpe.is_finite() {
        assert!(best.sharpe >= point.sharpe);
      }
    }
  }

  #[test]
  fn zero_risk_reports_nan_sharpe() {
    let moments = MomentEstimate {
      mean: array![0.001, 0.002],
      cov: Array2::zeros((2, 2)),
    };
    let (risk, _, sharpe) = risk_return_sharpe(&moments, &array![0.5, 0.5]);

    assert_eq!(risk, 0.0);
    assert!(sharpe.is_nan());
  }

  #[test]
  fn random_portfolios_are_normalized_and_seed_stable() {
    let moments = sample_moments();
    let a = random_portfolios(&moments, 200, 42);
    let b = random_portfolios(&moments, 200, 42);

    assert_eq!(a.risks.len(), 200);
    assert_eq!(a.risks, b.risks);
    assert!(a.risks.iter().all(|&r| r > 0.0));
  }
}
