//! # portfolio — broker abstraction and a paper implementation
//!
//! The engine only decides; the runner turns decisions into orders through
//! [`Portfolio`].  [`PaperPortfolio`] fills instantly at the tick price with
//! whole shares, no fees and no slippage.

use std::collections::HashMap;

use tracing::{debug, info};

/// What the runner needs from a broker.
pub trait Portfolio {
    fn is_invested(&self, symbol: &str) -> bool;

    /// Rebalance `symbol` to `fraction` of total portfolio value.
    fn set_holdings(&mut self, symbol: &str, fraction: f64, price: f64);

    /// Close the whole position in `symbol`.
    fn liquidate(&mut self, symbol: &str, price: f64);

    /// Record the latest price for mark-to-market.
    fn mark(&mut self, symbol: &str, price: f64);

    fn total_value(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Holding {
    shares: u64,
    last_price: f64,
}

/// Cash plus whole-share holdings.
#[derive(Debug, Clone)]
pub struct PaperPortfolio {
    cash: f64,
    holdings: HashMap<String, Holding>,
    trades: u32,
}

impl PaperPortfolio {
    pub fn new(starting_cash: f64) -> Self {
        Self {
            cash: starting_cash,
            holdings: HashMap::new(),
            trades: 0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares(&self, symbol: &str) -> u64 {
        self.holdings.get(symbol).map(|h| h.shares).unwrap_or(0)
    }

    /// Number of fills (buys and sells) so far.
    pub fn trade_count(&self) -> u32 {
        self.trades
    }
}

impl Portfolio for PaperPortfolio {
    fn is_invested(&self, symbol: &str) -> bool {
        self.shares(symbol) > 0
    }

    fn set_holdings(&mut self, symbol: &str, fraction: f64, price: f64) {
        if price <= 0.0 {
            return;
        }

        let target = ((self.total_value() * fraction) / price).floor().max(0.0) as u64;
        let holding = self.holdings.entry(symbol.to_string()).or_default();
        holding.last_price = price;
        let current = holding.shares;

        if target == current {
            debug!(symbol, shares = current, "Holdings already at target");
            return;
        }

        if target > current {
            // Never spend more cash than we have.
            let affordable = (self.cash / price).floor() as u64;
            let bought = (target - current).min(affordable);
            if bought == 0 {
                return;
            }
            holding.shares += bought;
            self.cash -= bought as f64 * price;
            info!(symbol, shares = bought, price, "📥 [PAPER] Bought");
        } else {
            let sold = current - target;
            holding.shares = target;
            self.cash += sold as f64 * price;
            info!(symbol, shares = sold, price, "📤 [PAPER] Sold");
        }
        self.trades += 1;
    }

    fn liquidate(&mut self, symbol: &str, price: f64) {
        let Some(holding) = self.holdings.get_mut(symbol) else {
            return;
        };
        if holding.shares == 0 {
            return;
        }

        let sold = holding.shares;
        holding.shares = 0;
        holding.last_price = price;
        self.cash += sold as f64 * price;
        self.trades += 1;
        info!(symbol, shares = sold, price, "📤 [PAPER] Liquidated");
    }

    fn mark(&mut self, symbol: &str, price: f64) {
        if let Some(holding) = self.holdings.get_mut(symbol) {
            holding.last_price = price;
        }
    }

    fn total_value(&self) -> f64 {
        self.cash
            + self
                .holdings
                .values()
                .map(|h| h.shares as f64 * h.last_price)
                .sum::<f64>()
    }
}
