use anyhow::Result;
use chrono::NaiveDate;
use ndarray::Array2;
use prettytable::row;
use prettytable::Table;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use frontier_rs::engine::EngineConfig;
use frontier_rs::engine::PortfolioEngine;
use frontier_rs::returns::PriceMatrix;
use frontier_rs::scenario::Scenario;

/// Synthetic weekly price history: drifting random walks from a fixed seed,
/// standing in for a data-source collaborator.
fn synthetic_prices() -> Result<PriceMatrix> {
  let tickers = ["MSFT", "MMM", "HSY", "GE", "GOOGL", "AMZN", "SHY"];
  let drifts = [0.0025, 0.0010, 0.0012, 0.0008, 0.0022, 0.0028, 0.0003];
  let vols = [0.030, 0.022, 0.018, 0.028, 0.033, 0.040, 0.004];
  let n_weeks = 520;

  let mut rng = StdRng::seed_from_u64(2012);
  let mut values = Array2::zeros((n_weeks, tickers.len()));
  for (a, (&drift, &vol)) in drifts.iter().zip(vols.iter()).enumerate() {
    let mut price = 100.0;
    for t in 0..n_weeks {
      values[[t, a]] = price;
      let shock: f64 = rng.gen::<f64>() - 0.5;
      price *= 1.0 + drift + vol * shock;
    }
  }

  let index: Vec<NaiveDate> = (0..n_weeks)
    .map(|i| NaiveDate::from_ymd_opt(2012, 1, 2).unwrap() + chrono::Duration::weeks(i as i64))
    .collect();

  Ok(PriceMatrix::new(
    index,
    tickers.iter().map(|t| t.to_string()).collect(),
    values,
  )?)
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let prices = synthetic_prices()?;
  let engine = PortfolioEngine::from_prices(&prices, EngineConfig::default())?;

  let frontier = engine.efficient_frontier()?;
  println!("Efficient frontier ({} rows)", frontier.len());

  let mut table = Table::new();
  let mut header = row!["RiskPremium"];
  for ticker in engine.returns().tickers() {
    header.add_cell(prettytable::Cell::new(ticker));
  }
  header.add_cell(prettytable::Cell::new("Std.Dev"));
  header.add_cell(prettytable::Cell::new("Exp.Return"));
  header.add_cell(prettytable::Cell::new("Sharpe"));
  table.add_row(header);

  for point in frontier.iter().step_by(20) {
    let mut r = row![format!("{:.3}", point.risk_premium)];
    for &w in point.weights.iter() {
      r.add_cell(prettytable::Cell::new(&format!("{:.4}", w)));
    }
    r.add_cell(prettytable::Cell::new(&format!("{:.6}", point.risk)));
    r.add_cell(prettytable::Cell::new(&format!("{:.6}", point.expected_return)));
    r.add_cell(prettytable::Cell::new(&format!("{:.4}", point.sharpe)));
    table.add_row(r);
  }
  table.printstd();

  let naive = engine.naive_portfolio()?;
  println!(
    "\nNaive optimal portfolio (max-Sharpe frontier row): sharpe = {:.4}",
    naive.sharpe
  );

  let surrogate = engine.surrogate_portfolio()?;
  println!(
    "Surrogate-search portfolio: sharpe = {:.4} after {} evaluations",
    surrogate.sharpe, surrogate.evaluations
  );
  println!("Weights: {}", surrogate.weights);

  let summary = engine.summary(&surrogate.weights)?;
  println!(
    "Annualized return = {:.4}, risk = {:.4}, sharpe = {:.4}",
    summary.annualized_return, summary.annualized_risk, summary.sharpe
  );

  println!("\nStress scenarios (5% VaR of first asset, final week):");
  let mut stress_table = Table::new();
  stress_table.add_row(row!["Scenario", "5% VaR"]);
  for scenario in Scenario::ALL {
    let var = engine.value_at_risk(scenario, 0, 5.0)?;
    stress_table.add_row(row![scenario.name(), format!("{:.4}", var)]);
  }
  stress_table.printstd();

  Ok(())
}
