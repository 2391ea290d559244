//! # Stress Scenarios
//!
//! $$
//! r_t \sim \mathcal{N}\!\left(s_\mu \hat\mu,\ s_\Sigma \hat\Sigma\right),
//! \qquad X_t = \prod_{s \le t} (1 + r_s)
//! $$
//!
//! Monte Carlo generation of correlated cumulative-growth paths under a
//! fixed catalog of stress scenarios, with shared randomness across
//! scenarios so that their paths are comparable draw by draw.

use impl_new_derive::ImplNew;
use nalgebra::DMatrix;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use tracing::debug;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::moments::MomentEstimate;

/// Mean and covariance scaling applied by a stress scenario. Pure data.
#[derive(Clone, Copy, Debug, PartialEq, ImplNew)]
pub struct ScenarioParameters {
  /// Factor applied to the mean return vector.
  pub scale_returns: f64,
  /// Factor applied to the covariance matrix.
  pub scale_cov: f64,
}

/// Fixed stress-scenario catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scenario {
  Baseline,
  MarketCrash,
  HighVolatility,
  CombinedStress,
}

impl Scenario {
  pub const ALL: [Scenario; 4] = [
    Scenario::Baseline,
    Scenario::MarketCrash,
    Scenario::HighVolatility,
    Scenario::CombinedStress,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Scenario::Baseline => "Baseline",
      Scenario::MarketCrash => "Market Crash",
      Scenario::HighVolatility => "High Volatility",
      Scenario::CombinedStress => "Combined Stress",
    }
  }

  pub fn parameters(&self) -> ScenarioParameters {
    match self {
      Scenario::Baseline => ScenarioParameters::new(1.0, 1.0),
      Scenario::MarketCrash => ScenarioParameters::new(0.5, 1.0),
      Scenario::HighVolatility => ScenarioParameters::new(1.0, 2.0),
      Scenario::CombinedStress => ScenarioParameters::new(0.5, 2.0),
    }
  }
}

/// Simulation size and seeding for [`monte_carlo`].
#[derive(Clone, Copy, Debug, ImplNew)]
pub struct StressConfig {
  /// Number of independent paths.
  pub num_sim: usize,
  /// Time steps per path.
  pub horizon: usize,
  /// Base seed; path `i` draws from a stream seeded with `seed + i`,
  /// identically for every scenario.
  pub seed: u64,
}

impl Default for StressConfig {
  fn default() -> Self {
    Self {
      num_sim: 1000,
      horizon: 52,
      seed: 42,
    }
  }
}

/// Cumulative-growth paths of shape `[num_sim, horizon, assets]`.
///
/// Step 0 already includes the first simulated return: `path[0] = 1 + r_0`.
/// Read-only once produced.
#[derive(Clone, Debug)]
pub struct SimulatedPaths {
  paths: Array3<f64>,
}

impl SimulatedPaths {
  pub fn paths(&self) -> &Array3<f64> {
    &self.paths
  }

  /// `(num_sim, horizon, assets)`.
  pub fn shape(&self) -> (usize, usize, usize) {
    let s = self.paths.shape();
    (s[0], s[1], s[2])
  }

  fn check_asset(&self, asset: usize) -> Result<()> {
    let n_assets = self.paths.shape()[2];
    if asset >= n_assets {
      return Err(PortfolioError::DimensionMismatch(format!(
        "asset index {} out of range for {} assets",
        asset, n_assets
      )));
    }
    Ok(())
  }

  /// Final-step cumulative values of one asset across all simulations.
  pub fn final_values(&self, asset: usize) -> Result<Array1<f64>> {
    self.check_asset(asset)?;
    let horizon = self.paths.shape()[1];
    Ok(
      self
        .paths
        .index_axis(ndarray::Axis(1), horizon - 1)
        .column(asset)
        .to_owned(),
    )
  }

  /// Percentile of the final cumulative value for one asset.
  ///
  /// `percentile` is on the 0..=100 scale; the default stress report uses
  /// the 5th percentile. Linear interpolation between order statistics.
  pub fn value_at_risk(&self, asset: usize, percentile: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&percentile) {
      return Err(PortfolioError::OptimizationFailure(format!(
        "percentile {} outside [0, 100]",
        percentile
      )));
    }

    let finals = self.final_values(asset)?;
    let mut sorted: Vec<f64> = finals.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(percentile_linear(&sorted, percentile))
  }

  /// First `limit` trajectories of one asset, `[limit, horizon]`, for fan
  /// charts.
  pub fn asset_paths(&self, asset: usize, limit: usize) -> Result<Array2<f64>> {
    self.check_asset(asset)?;
    let (num_sim, horizon, _) = self.shape();
    let take = limit.min(num_sim);

    let mut out = Array2::zeros((take, horizon));
    for i in 0..take {
      for t in 0..horizon {
        out[[i, t]] = self.paths[[i, t, asset]];
      }
    }
    Ok(out)
  }
}

fn percentile_linear(sorted: &[f64], percentile: f64) -> f64 {
  let n = sorted.len();
  if n == 1 {
    return sorted[0];
  }
  let rank = percentile / 100.0 * (n - 1) as f64;
  let lo = rank.floor() as usize;
  let frac = rank - lo as f64;
  if lo + 1 >= n {
    sorted[n - 1]
  } else {
    sorted[lo] * (1.0 - frac) + sorted[lo + 1] * frac
  }
}

/// Lower Cholesky factor of the scaled covariance, with escalating diagonal
/// jitter so that PSD-but-singular matrices (and the all-zero covariance)
/// still factorize.
fn scaled_cholesky(cov: &Array2<f64>, scale: f64) -> Result<Array2<f64>> {
  let n = cov.nrows();
  let base = DMatrix::from_fn(n, n, |i, j| cov[[i, j]] * scale);

  let mut jitter = 0.0;
  for attempt in 0..8 {
    let k = &base + DMatrix::identity(n, n) * jitter;
    if let Some(chol) = k.cholesky() {
      if attempt > 0 {
        debug!(jitter, "covariance factorized after diagonal jitter");
      }
      let l = chol.l();
      return Ok(Array2::from_shape_fn((n, n), |(i, j)| l[(i, j)]));
    }
    jitter = if jitter == 0.0 { 1e-12 } else { jitter * 10.0 };
  }

  Err(PortfolioError::OptimizationFailure(
    "scaled covariance matrix is not positive semi-definite".to_string(),
  ))
}

/// Generate `num_sim` multivariate-normal cumulative-growth paths for one
/// scenario.
///
/// Path `i` consumes its own stream seeded with `seed + i`, so the draws are
/// independent across paths, identical across scenarios, and the rayon
/// parallelization over paths cannot change the result.
pub fn monte_carlo(
  moments: &MomentEstimate,
  params: &ScenarioParameters,
  config: &StressConfig,
) -> Result<SimulatedPaths> {
  let n = moments.n_assets();
  if n == 0 {
    return Err(PortfolioError::InsufficientData(
      "no assets in moment estimate".to_string(),
    ));
  }
  if config.num_sim == 0 || config.horizon == 0 {
    return Err(PortfolioError::OptimizationFailure(format!(
      "num_sim ({}) and horizon ({}) must both be positive",
      config.num_sim, config.horizon
    )));
  }

  let mean: Array1<f64> = &moments.mean * params.scale_returns;
  let chol = scaled_cholesky(&moments.cov, params.scale_cov)?;
  let horizon = config.horizon;

  let rows: Vec<Vec<f64>> = (0..config.num_sim)
    .into_par_iter()
    .map(|i| {
      let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
      let mut growth = vec![1.0; n];
      let mut out = Vec::with_capacity(horizon * n);

      for _ in 0..horizon {
        let z: Vec<f64> = (0..n).map(|_| StandardNormal.sample(&mut rng)).collect();
        for a in 0..n {
          let mut r = mean[a];
          for k in 0..=a {
            r += chol[[a, k]] * z[k];
          }
          growth[a] *= 1.0 + r;
          out.push(growth[a]);
        }
      }

      out
    })
    .collect();

  let flat: Vec<f64> = rows.into_iter().flatten().collect();
  let paths = Array3::from_shape_vec((config.num_sim, horizon, n), flat)
    .map_err(|e| PortfolioError::DimensionMismatch(e.to_string()))?;

  Ok(SimulatedPaths { paths })
}

#[cfg(test)]
mod tests {
  use ndarray::array;
  use ndarray::Array2;

  use super::*;

  fn sample_moments() -> MomentEstimate {
    MomentEstimate {
      mean: array![0.002, 0.001],
      cov: array![[4.0e-4, 1.0e-4], [1.0e-4, 2.5e-4]],
    }
  }

  #[test]
  fn path_set_has_exact_shape() {
    let config = StressConfig {
      num_sim: 37,
      horizon: 13,
      seed: 42,
    };
    let paths = monte_carlo(
      &sample_moments(),
      &Scenario::Baseline.parameters(),
      &config,
    )
    .unwrap();

    assert_eq!(paths.shape(), (37, 13, 2));
  }

  #[test]
  fn first_step_includes_first_return() {
    // Deterministic drift: zero covariance collapses every draw to the mean
    // (up to the factorization jitter).
    let moments = MomentEstimate {
      mean: array![0.1],
      cov: Array2::zeros((1, 1)),
    };
    let config = StressConfig {
      num_sim: 4,
      horizon: 3,
      seed: 42,
    };
    let paths = monte_carlo(&moments, &Scenario::Baseline.parameters(), &config).unwrap();

    for i in 0..4 {
      assert!((paths.paths()[[i, 0, 0]] - 1.1).abs() < 1e-4);
      assert!((paths.paths()[[i, 2, 0]] - 1.1f64.powi(3)).abs() < 1e-3);
    }
  }

  #[test]
  fn zero_mean_median_final_value_is_near_one() {
    let moments = MomentEstimate {
      mean: array![0.0, 0.0],
      cov: array![[1.0e-4, 0.0], [0.0, 1.0e-4]],
    };
    let config = StressConfig {
      num_sim: 2000,
      horizon: 52,
      seed: 42,
    };
    let paths = monte_carlo(&moments, &Scenario::Baseline.parameters(), &config).unwrap();
    let median = paths.value_at_risk(0, 50.0).unwrap();

    assert!((median - 1.0).abs() < 0.02);
  }

  #[test]
  fn var_is_monotone_in_confidence_level() {
    let paths = monte_carlo(
      &sample_moments(),
      &Scenario::HighVolatility.parameters(),
      &StressConfig::default(),
    )
    .unwrap();

    let var_1 = paths.value_at_risk(0, 1.0).unwrap();
    let var_5 = paths.value_at_risk(0, 5.0).unwrap();
    let var_50 = paths.value_at_risk(0, 50.0).unwrap();

    assert!(var_1 <= var_5);
    assert!(var_5 <= var_50);
  }

  #[test]
  fn scenarios_share_randomness() {
    // Zero mean and diagonal covariance: per-step baseline and stressed
    // returns differ exactly by sqrt(scale_cov) on the shared draws.
    let moments = MomentEstimate {
      mean: array![0.0],
      cov: array![[1.0e-4]],
    };
    let config = StressConfig {
      num_sim: 16,
      horizon: 1,
      seed: 42,
    };

    let base = monte_carlo(&moments, &Scenario::Baseline.parameters(), &config).unwrap();
    let stressed = monte_carlo(&moments, &Scenario::HighVolatility.parameters(), &config).unwrap();

    for i in 0..16 {
      let r_base = base.paths()[[i, 0, 0]] - 1.0;
      let r_stressed = stressed.paths()[[i, 0, 0]] - 1.0;
      assert!((r_stressed - 2.0f64.sqrt() * r_base).abs() < 1e-12);
    }
  }

  #[test]
  fn runs_are_reproducible() {
    let config = StressConfig::default();
    let params = Scenario::CombinedStress.parameters();
    let a = monte_carlo(&sample_moments(), &params, &config).unwrap();
    let b = monte_carlo(&sample_moments(), &params, &config).unwrap();

    assert_eq!(a.paths(), b.paths());
  }

  #[test]
  fn asset_paths_subsamples_for_fan_charts() {
    let paths = monte_carlo(
      &sample_moments(),
      &Scenario::Baseline.parameters(),
      &StressConfig::default(),
    )
    .unwrap();
    let fan = paths.asset_paths(0, 50).unwrap();

    assert_eq!(fan.shape(), &[50, 52]);
    assert!(paths.asset_paths(5, 50).is_err());
  }

  #[test]
  fn catalog_matches_reference_scalings() {
    assert_eq!(
      Scenario::CombinedStress.parameters(),
      ScenarioParameters::new(0.5, 2.0)
    );
    assert_eq!(Scenario::ALL.len(), 4);
  }
}
