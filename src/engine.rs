//! # Portfolio Engine
//!
//! $$
//! \text{prices} \to \text{returns} \to (\hat\mu, \hat\Sigma) \to
//! \{\text{frontier},\ \text{surrogate},\ \text{scenarios}\}
//! $$
//!
//! High-level orchestration over the estimation, optimization and stress
//! modules. Every method is a read-only query from held data and
//! configuration to a freshly allocated result; the engine owns no UI state
//! and never renders or performs I/O.

use ndarray::Array1;

use crate::error::Result;
use crate::frontier::naive_portfolio;
use crate::frontier::trace_frontier;
use crate::frontier::FrontierConfig;
use crate::frontier::FrontierPoint;
use crate::moments::estimate_moments;
use crate::moments::MomentEstimate;
use crate::performance::cumulative_growth;
use crate::performance::summarize;
use crate::performance::PerformanceSummary;
use crate::returns::compute_returns;
use crate::returns::PriceMatrix;
use crate::returns::ReturnMatrix;
use crate::scenario::monte_carlo;
use crate::scenario::Scenario;
use crate::scenario::SimulatedPaths;
use crate::scenario::StressConfig;
use crate::surrogate::maximize_sharpe;
use crate::surrogate::SharpeSearchResult;
use crate::surrogate::SurrogateConfig;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
  /// Observation periods per year (52 for weekly series).
  pub frequency: f64,
  pub frontier: FrontierConfig,
  pub surrogate: SurrogateConfig,
  pub stress: StressConfig,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      frequency: 52.0,
      frontier: FrontierConfig::default(),
      surrogate: SurrogateConfig::default(),
      stress: StressConfig::default(),
    }
  }
}

/// Single entry point for the optimization and stress-testing workflows.
#[derive(Clone, Debug)]
pub struct PortfolioEngine {
  returns: ReturnMatrix,
  moments: MomentEstimate,
  config: EngineConfig,
}

impl PortfolioEngine {
  /// Build an engine from raw prices: computes returns and moments once.
  pub fn from_prices(prices: &PriceMatrix, config: EngineConfig) -> Result<Self> {
    let returns = compute_returns(prices)?;
    Self::from_returns(returns, config)
  }

  /// Build an engine from a precomputed return matrix.
  pub fn from_returns(returns: ReturnMatrix, config: EngineConfig) -> Result<Self> {
    let moments = estimate_moments(&returns)?;
    Ok(Self {
      returns,
      moments,
      config,
    })
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn returns(&self) -> &ReturnMatrix {
    &self.returns
  }

  pub fn moments(&self) -> &MomentEstimate {
    &self.moments
  }

  /// Trace the efficient frontier under the configured bounds and sweep.
  pub fn efficient_frontier(&self) -> Result<Vec<FrontierPoint>> {
    trace_frontier(&self.moments, &self.config.frontier)
  }

  /// Max-Sharpe row of the efficient frontier.
  pub fn naive_portfolio(&self) -> Result<FrontierPoint> {
    let frontier = self.efficient_frontier()?;
    naive_portfolio(&frontier)
  }

  /// Surrogate-model search for the maximum-Sharpe weight vector.
  pub fn surrogate_portfolio(&self) -> Result<SharpeSearchResult> {
    maximize_sharpe(&self.moments, &self.config.surrogate)
  }

  /// Simulated cumulative-growth paths for one stress scenario.
  ///
  /// Pure query: the same scenario always yields the same path set, so a
  /// presentation layer can bind a scenario selector directly to this call.
  pub fn simulate_scenario(&self, scenario: Scenario) -> Result<SimulatedPaths> {
    monte_carlo(&self.moments, &scenario.parameters(), &self.config.stress)
  }

  /// Percentile of the final simulated value for one asset under a scenario.
  pub fn value_at_risk(&self, scenario: Scenario, asset: usize, percentile: f64) -> Result<f64> {
    self
      .simulate_scenario(scenario)?
      .value_at_risk(asset, percentile)
  }

  /// Annualized statistics of a fixed weight vector on the held returns.
  pub fn summary(&self, weights: &Array1<f64>) -> Result<PerformanceSummary> {
    summarize(&self.returns, weights, self.config.frequency)
  }

  /// Cumulative growth curve of a fixed weight vector on the held returns.
  pub fn cumulative_growth(&self, weights: &Array1<f64>) -> Result<Array1<f64>> {
    cumulative_growth(&self.returns, weights)
  }
}
