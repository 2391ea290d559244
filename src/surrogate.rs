//! # Surrogate Sharpe Search
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}\in[0,1]^n}
//!   \frac{\mu^\top \bar{\mathbf{w}}}{\sqrt{\bar{\mathbf{w}}^\top\Sigma\bar{\mathbf{w}}}},
//! \qquad \bar{\mathbf{w}} = \mathbf{w} / \mathbf{1}^\top\mathbf{w}
//! $$
//!
//! Gradient-free Sharpe maximization with a Gaussian-process surrogate and
//! expected-improvement acquisition.
//!
//! Candidates live in the unit box, not on the simplex: the unit-sum
//! constraint is enforced by dividing each candidate by its own sum before
//! the objective is evaluated. This keeps the search space n-dimensional and
//! is an approximation of searching the simplex directly.

use impl_new_derive::ImplNew;
use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use statrs::distribution::Continuous;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;
use tracing::debug;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::frontier::risk_return_sharpe;
use crate::moments::MomentEstimate;

/// Penalty objective value for degenerate candidates (zero sum or zero risk).
const DEGENERATE_PENALTY: f64 = 1e6;

/// Budget and surrogate hyperparameters for [`maximize_sharpe`].
#[derive(Clone, Debug, ImplNew)]
pub struct SurrogateConfig {
  /// Total objective evaluations, including the initial design.
  pub n_calls: usize,
  /// Random space-filling evaluations before the surrogate takes over.
  pub n_initial: usize,
  /// Random candidates scored by the acquisition per iteration.
  pub n_candidates: usize,
  /// Seed of the single serial random stream.
  pub seed: u64,
  /// RBF kernel length scale.
  pub length_scale: f64,
  /// Diagonal jitter added to the kernel matrix.
  pub noise: f64,
}

impl Default for SurrogateConfig {
  fn default() -> Self {
    Self {
      n_calls: 50,
      n_initial: 10,
      n_candidates: 256,
      seed: 42,
      length_scale: 0.5,
      noise: 1e-10,
    }
  }
}

/// Best weight vector found by the surrogate search.
#[derive(Clone, Debug)]
pub struct SharpeSearchResult {
  /// Sum-normalized weights of the best evaluated candidate.
  pub weights: Array1<f64>,
  /// Sharpe ratio realized at those weights.
  pub sharpe: f64,
  /// Objective evaluations actually spent.
  pub evaluations: usize,
}

fn neg_sharpe(moments: &MomentEstimate, x: &[f64]) -> f64 {
  let sum: f64 = x.iter().sum();
  if sum <= 1e-12 {
    return DEGENERATE_PENALTY;
  }

  let w = Array1::from_iter(x.iter().map(|&v| v / sum));
  let (risk, ret, _) = risk_return_sharpe(moments, &w);
  if risk <= 0.0 {
    return DEGENERATE_PENALTY;
  }

  -ret / risk
}

fn rbf(a: &[f64], b: &[f64], length_scale: f64) -> f64 {
  let sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
  (-sq / (2.0 * length_scale * length_scale)).exp()
}

struct GaussianProcess {
  xs: Vec<Vec<f64>>,
  chol: nalgebra::Cholesky<f64, nalgebra::Dyn>,
  alpha: DVector<f64>,
  length_scale: f64,
}

impl GaussianProcess {
  /// Fit a zero-mean unit-variance GP to standardized observations, bumping
  /// the diagonal jitter until the kernel matrix factorizes.
  fn fit(xs: &[Vec<f64>], ys: &[f64], length_scale: f64, noise: f64) -> Option<Self> {
    let m = xs.len();
    let base = DMatrix::from_fn(m, m, |i, j| rbf(&xs[i], &xs[j], length_scale));
    let y = DVector::from_column_slice(ys);

    let mut jitter = noise.max(1e-12);
    for _ in 0..8 {
      let k = &base + DMatrix::identity(m, m) * jitter;
      if let Some(chol) = k.cholesky() {
        let alpha = chol.solve(&y);
        return Some(Self {
          xs: xs.to_vec(),
          chol,
          alpha,
          length_scale,
        });
      }
      jitter *= 10.0;
    }

    None
  }

  /// Posterior mean and standard deviation at a candidate point.
  fn predict(&self, x: &[f64]) -> (f64, f64) {
    let m = self.xs.len();
    let kstar = DVector::from_fn(m, |i, _| rbf(&self.xs[i], x, self.length_scale));
    let mean = kstar.dot(&self.alpha);
    let v = self.chol.solve(&kstar);
    let var = (1.0 - kstar.dot(&v)).max(0.0);
    (mean, var.sqrt())
  }
}

/// Expected improvement of a candidate under a minimization objective.
fn expected_improvement(mean: f64, sd: f64, best: f64, normal: &Normal) -> f64 {
  if sd <= 1e-12 {
    return (best - mean).max(0.0);
  }
  let z = (best - mean) / sd;
  (best - mean) * normal.cdf(z) + sd * normal.pdf(z)
}

fn standardize(ys: &[f64]) -> Vec<f64> {
  let m = ys.len() as f64;
  let mean = ys.iter().sum::<f64>() / m;
  let var = ys.iter().map(|y| (y - mean) * (y - mean)).sum::<f64>() / m;
  let sd = var.sqrt();
  if sd <= 1e-15 {
    ys.iter().map(|y| y - mean).collect()
  } else {
    ys.iter().map(|y| (y - mean) / sd).collect()
  }
}

/// Maximize the Sharpe ratio with a fixed evaluation budget.
///
/// Deterministic for a fixed `(data, seed, budget)`: a single serial
/// [`StdRng`] stream drives both the initial design and the candidate pools,
/// and evaluations are strictly sequential because every acquisition depends
/// on all observations made so far.
pub fn maximize_sharpe(
  moments: &MomentEstimate,
  config: &SurrogateConfig,
) -> Result<SharpeSearchResult> {
  let n = moments.n_assets();
  if n == 0 {
    return Err(PortfolioError::InsufficientData(
      "no assets in moment estimate".to_string(),
    ));
  }
  if config.n_calls == 0 {
    return Err(PortfolioError::OptimizationFailure(
      "evaluation budget must be positive".to_string(),
    ));
  }

  let mut rng = StdRng::seed_from_u64(config.seed);
  let normal =
    Normal::new(0.0, 1.0).map_err(|e| PortfolioError::OptimizationFailure(e.to_string()))?;

  let mut xs: Vec<Vec<f64>> = Vec::with_capacity(config.n_calls);
  let mut ys: Vec<f64> = Vec::with_capacity(config.n_calls);

  let n_initial = config.n_initial.min(config.n_calls).max(1);
  for _ in 0..n_initial {
    let x: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    ys.push(neg_sharpe(moments, &x));
    xs.push(x);
  }

  while xs.len() < config.n_calls {
    let candidates: Vec<Vec<f64>> = (0..config.n_candidates)
      .map(|_| (0..n).map(|_| rng.gen::<f64>()).collect())
      .collect();

    let ys_std = standardize(&ys);
    let best_std = ys_std.iter().cloned().fold(f64::INFINITY, f64::min);

    let next = match GaussianProcess::fit(&xs, &ys_std, config.length_scale, config.noise) {
      Some(gp) => {
        let mut best_ei = f64::NEG_INFINITY;
        let mut best_idx = 0;
        for (idx, c) in candidates.iter().enumerate() {
          let (mean, sd) = gp.predict(c);
          let ei = expected_improvement(mean, sd, best_std, &normal);
          if ei > best_ei {
            best_ei = ei;
            best_idx = idx;
          }
        }
        candidates[best_idx].clone()
      }
      None => {
        debug!("kernel factorization failed, falling back to a random candidate");
        candidates[0].clone()
      }
    };

    ys.push(neg_sharpe(moments, &next));
    xs.push(next);
  }

  let (best_idx, best_y) = ys
    .iter()
    .enumerate()
    .min_by(|a, b| a.1.total_cmp(b.1))
    .map(|(i, &y)| (i, y))
    .ok_or_else(|| PortfolioError::OptimizationFailure("no candidate evaluated".to_string()))?;

  if best_y >= DEGENERATE_PENALTY {
    return Err(PortfolioError::OptimizationFailure(
      "every candidate portfolio was degenerate".to_string(),
    ));
  }

  let sum: f64 = xs[best_idx].iter().sum();
  let weights = Array1::from_iter(xs[best_idx].iter().map(|&v| v / sum));

  Ok(SharpeSearchResult {
    weights,
    sharpe: -best_y,
    evaluations: xs.len(),
  })
}
