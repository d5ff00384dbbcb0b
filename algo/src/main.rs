//! # Numin Algo — prediction-driven backtest
//!
//! Single-symbol, single-threaded run against the Numin projection API.
//!
//! ## Flow
//! ```text
//! 1. Load config (.env / environment)
//! 2. on_init: GET /projection/single-ticker  (once, lenient)
//! 3. for each daily tick:
//!      on_tick → EnterLong  → set_holdings(symbol, 100%)
//!              → ExitIfHeld → liquidate(symbol)
//!              → Hold
//!      confirm_fill(portfolio.is_invested)  → state follows the fill
//! 4. on_finish → summary (stdout JSON) · optional chart JSON
//! ```

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod chart;
mod config;
mod engine;
mod fetch;
mod market;
mod portfolio;

use config::Config;
use engine::{Decision, DecisionEngine, RunSummary};
use fetch::HttpProjectionClient;
use market::MarketTick;
use portfolio::{PaperPortfolio, Portfolio};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("numin_algo=debug".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════╗
  ║   NUMIN ALGO — Prediction Backtest        ║
  ║   projections in · decisions out          ║
  ╚═══════════════════════════════════════════╝"#);

    let config = Config::from_env().context("Failed to load config")?;

    info!(
        symbol    = %config.strategy.symbol,
        variant   = %config.strategy.variant,
        threshold = config.strategy.threshold,
        api       = %config.api_base_url,
        ticks     = %config.ticks_path.display(),
        "Numin algo started"
    );

    let ticks = market::load_ticks(&config.ticks_path)?;
    let client = HttpProjectionClient::new(config.api_base_url.clone(), config.http_timeout)
        .context("Failed to build HTTP client")?;

    let mut engine = DecisionEngine::new(config.strategy.clone());
    engine.on_init(&client, &config.query);
    if engine.projections().is_empty() {
        warn!("No projections loaded — every tick will hold");
    }

    let mut portfolio = PaperPortfolio::new(config.starting_cash);
    let summary = run(&mut engine, &mut portfolio, &ticks, config.starting_cash);

    info!(
        trades = portfolio.trade_count(),
        cash   = portfolio.cash(),
        "Run complete"
    );

    if let Some(path) = &config.chart_out {
        engine.chart().save_json(path)?;
        info!(
            path   = %path.display(),
            points = engine.chart().points(chart::ACTUAL_PRICE).len(),
            "Chart written"
        );
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Feed every tick through the engine and apply its decisions to `portfolio`.
fn run(
    engine: &mut DecisionEngine,
    portfolio: &mut dyn Portfolio,
    ticks: &[MarketTick],
    starting_cash: f64,
) -> RunSummary {
    for tick in ticks {
        portfolio.mark(&tick.symbol, tick.price);

        let decision = engine.on_tick(tick);
        match decision {
            Decision::EnterLong(signal) => {
                if !portfolio.is_invested(&tick.symbol) {
                    portfolio.set_holdings(&tick.symbol, 1.0, signal.current_price);
                }
            }
            Decision::ExitIfHeld(signal) => {
                if portfolio.is_invested(&tick.symbol) {
                    portfolio.liquidate(&tick.symbol, signal.current_price);
                }
            }
            Decision::Hold(_) => continue,
        }
        engine.confirm_fill(&decision, portfolio.is_invested(&tick.symbol));
    }

    engine.on_finish(portfolio, starting_cash)
}
