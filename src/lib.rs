//! # frontier-rs
//!
//! `frontier_rs` estimates an optimal asset allocation from historical price
//! series and evaluates its risk under simulated stress conditions.
//!
//! ## Modules
//!
//! | Module            | Description                                                                  |
//! |-------------------|------------------------------------------------------------------------------|
//! | [`returns`]       | Price matrix container and period-over-period return computation.            |
//! | [`moments`]       | Sample mean vector and covariance matrix of a return series.                 |
//! | [`frontier`]      | Risk-premium sweep tracing the box-constrained efficient frontier.           |
//! | [`surrogate`]     | Gaussian-process surrogate search maximizing the Sharpe ratio.               |
//! | [`scenario`]      | Monte Carlo stress scenarios, correlated growth paths and Value-at-Risk.     |
//! | [`performance`]   | Annualized statistics and cumulative growth for a fixed weight vector.       |
//! | [`engine`]        | Orchestration over estimation, optimization and stress queries.              |
//! | [`visualization`] | Pure plotly figure builders for the presentation layer.                      |
//! | [`error`]         | Shared error taxonomy.                                                       |
//!
//! ## Determinism
//!
//! Every stochastic component takes an explicit seed and owns its random
//! stream; repeated runs with identical inputs produce identical outputs.
//! The Monte Carlo path loop is parallelized with rayon over per-path
//! streams, which keeps the aggregate result order-independent. The
//! surrogate search is strictly sequential because each acquisition depends
//! on all previous evaluations.
//!
//! ## Example Usage
//!
//! ```rust
//! use frontier_rs::engine::{EngineConfig, PortfolioEngine};
//! use frontier_rs::scenario::Scenario;
//!
//! let engine = PortfolioEngine::from_prices(&prices, EngineConfig::default())?;
//! let frontier = engine.efficient_frontier()?;
//! let var = engine.value_at_risk(Scenario::MarketCrash, 0, 5.0)?;
//! ```

pub mod engine;
pub mod error;
pub mod frontier;
pub mod moments;
pub mod performance;
pub mod returns;
pub mod scenario;
pub mod surrogate;
pub mod visualization;

pub use engine::EngineConfig;
pub use engine::PortfolioEngine;
pub use error::PortfolioError;
pub use frontier::FrontierConfig;
pub use frontier::FrontierPoint;
pub use moments::MomentEstimate;
pub use performance::PerformanceSummary;
pub use returns::PriceMatrix;
pub use returns::ReturnMatrix;
pub use scenario::Scenario;
pub use scenario::ScenarioParameters;
pub use scenario::SimulatedPaths;
pub use scenario::StressConfig;
pub use surrogate::SharpeSearchResult;
pub use surrogate::SurrogateConfig;
