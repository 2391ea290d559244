//! # Visualization
//!
//! $$
//! \text{tables and paths} \mapsto \text{figures on shared axes}
//! $$
//!
//! Pure figure builders for the presentation layer. Every function returns a
//! [`Plot`] and nothing here renders, saves or serves anything.

use plotly::common::Line;
use plotly::common::Marker;
use plotly::common::Mode;
use plotly::common::Title;
use plotly::layout::Axis;
use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;

use crate::error::Result;
use crate::frontier::FrontierPoint;
use crate::frontier::RandomPortfolios;
use crate::scenario::SimulatedPaths;

/// Line chart of a cumulative growth curve, one point per period.
pub fn cumulative_returns_plot(curve: &[f64], title: &str) -> Plot {
  let xs: Vec<usize> = (0..curve.len()).collect();
  let trace = Scatter::new(xs, curve.to_vec())
    .mode(Mode::Lines)
    .name("portfolio");

  let mut plot = Plot::new();
  plot.add_trace(trace);
  plot.set_layout(
    Layout::new()
      .title(Title::from(title))
      .x_axis(Axis::new().title("Period"))
      .y_axis(Axis::new().title("Cumulative Return")),
  );
  plot
}

/// Risk/return scatter of the efficient frontier over a random-portfolio
/// cloud.
pub fn frontier_plot(frontier: &[FrontierPoint], cloud: Option<&RandomPortfolios>) -> Plot {
  let mut plot = Plot::new();

  if let Some(cloud) = cloud {
    let cloud_trace = Scatter::new(cloud.risks.clone(), cloud.returns.clone())
      .mode(Mode::Markers)
      .marker(Marker::new().size(4).color("rgba(120,120,120,0.35)"))
      .name("random portfolios");
    plot.add_trace(cloud_trace);
  }

  let risks: Vec<f64> = frontier.iter().map(|p| p.risk).collect();
  let returns: Vec<f64> = frontier.iter().map(|p| p.expected_return).collect();
  let frontier_trace = Scatter::new(risks, returns)
    .mode(Mode::LinesMarkers)
    .marker(Marker::new().size(6))
    .name("efficient frontier");
  plot.add_trace(frontier_trace);

  plot.set_layout(
    Layout::new()
      .title(Title::from("Efficient Frontier"))
      .x_axis(Axis::new().title("Risk (Volatility)"))
      .y_axis(Axis::new().title("Return")),
  );
  plot
}

/// Fan chart of simulated cumulative-growth trajectories for one asset:
/// a subsample of paths drawn as thin translucent gray lines.
pub fn scenario_fan_plot(
  paths: &SimulatedPaths,
  asset: usize,
  max_paths: usize,
  title: &str,
) -> Result<Plot> {
  let fan = paths.asset_paths(asset, max_paths)?;
  let horizon = fan.ncols();
  let xs: Vec<usize> = (0..horizon).collect();

  let mut plot = Plot::new();
  for row in fan.rows() {
    let trace = Scatter::new(xs.clone(), row.to_vec())
      .mode(Mode::Lines)
      .line(Line::new().color("rgba(128,128,128,0.3)").width(1.0))
      .show_legend(false);
    plot.add_trace(trace);
  }

  plot.set_layout(
    Layout::new()
      .title(Title::from(title))
      .x_axis(Axis::new().title("Weeks"))
      .y_axis(Axis::new().title("Cumulative Return")),
  );
  Ok(plot)
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::moments::MomentEstimate;
  use crate::scenario::monte_carlo;
  use crate::scenario::Scenario;
  use crate::scenario::StressConfig;

  fn sample_moments() -> MomentEstimate {
    MomentEstimate {
      mean: array![0.002, 0.001],
      cov: array![[4.0e-4, 1.0e-4], [1.0e-4, 2.5e-4]],
    }
  }

  #[test]
  fn fan_plot_has_one_trace_per_path() {
    let config = StressConfig {
      num_sim: 80,
      horizon: 12,
      seed: 42,
    };
    let paths = monte_carlo(&sample_moments(), &Scenario::Baseline.parameters(), &config).unwrap();
    let plot = scenario_fan_plot(&paths, 0, 50, "Baseline Scenario").unwrap();

    let json = plot.to_json();
    assert_eq!(json.matches("\"type\":\"scatter\"").count(), 50);
  }

  #[test]
  fn fan_plot_rejects_bad_asset_index() {
    let paths = monte_carlo(
      &sample_moments(),
      &Scenario::Baseline.parameters(),
      &StressConfig {
        num_sim: 4,
        horizon: 4,
        seed: 42,
      },
    )
    .unwrap();

    assert!(scenario_fan_plot(&paths, 9, 50, "oops").is_err());
  }
}
