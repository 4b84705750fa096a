use crate::config::BacktestingConfig;
use crate::ml::labeling::Label;
use crate::types::{ExitReason, Trade};
use chrono::{DateTime, Utc};

/// Long-only position book for one ticker.
///
/// FLAT opens on a buy signal; HOLDING closes on a sell signal or once the
/// position has been held for `holding_period` bars. Sell signals never open
/// a position.
pub struct Portfolio<'a> {
    config: &'a BacktestingConfig,
    ticker: String,
    pub position: Option<Position>,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_bar: usize,
    pub entry_date: DateTime<Utc>,
    /// Includes the entry transaction cost.
    pub entry_price: f64,
    pub confidence: f64,
}

impl<'a> Portfolio<'a> {
    pub fn new(config: &'a BacktestingConfig, ticker: impl Into<String>) -> Self {
        Self {
            config,
            ticker: ticker.into(),
            position: None,
            trades: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn process_bar(
        &mut self,
        bar: usize,
        date: DateTime<Utc>,
        close: f64,
        signal: Label,
        confidence: f64,
    ) {
        match self.position.as_ref().map(|p| p.entry_bar) {
            None if signal == Label::Buy => self.open_position(bar, date, close, confidence),
            None => {}
            Some(entry_bar) => {
                let days_held = bar - entry_bar;
                if signal == Label::Sell {
                    self.close_position(date, close, days_held, ExitReason::Signal);
                } else if days_held >= self.config.holding_period {
                    self.close_position(date, close, days_held, ExitReason::MaxHoldingPeriod);
                }
            }
        }
    }

    pub fn open_position(&mut self, bar: usize, date: DateTime<Utc>, close: f64, confidence: f64) {
        self.position = Some(Position {
            entry_bar: bar,
            entry_date: date,
            entry_price: close * (1.0 + self.config.transaction_cost),
            confidence,
        });
    }

    pub fn close_position(
        &mut self,
        date: DateTime<Utc>,
        close: f64,
        holding_days: usize,
        reason: ExitReason,
    ) {
        if let Some(pos) = self.position.take() {
            let exit_price = close * (1.0 - self.config.transaction_cost);
            self.trades.push(Trade {
                ticker: self.ticker.clone(),
                entry_date: pos.entry_date,
                exit_date: date,
                entry_price: pos.entry_price,
                exit_price,
                return_pct: exit_price / pos.entry_price - 1.0,
                holding_days,
                confidence: pos.confidence,
                exit_reason: reason,
            });
        }
    }

    /// Force-close an open position at the last bar of a series of `len` bars.
    pub fn finish(mut self, len: usize, last_date: DateTime<Utc>, last_close: f64) -> Vec<Trade> {
        if let Some(entry_bar) = self.position.as_ref().map(|p| p.entry_bar) {
            let holding_days = len.saturating_sub(entry_bar + 1);
            self.close_position(last_date, last_close, holding_days, ExitReason::EndOfData);
        }
        self.trades
    }

    pub fn get_trades(&self) -> &[Trade] {
        &self.trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
    }

    fn config(holding_period: usize, transaction_cost: f64) -> BacktestingConfig {
        BacktestingConfig {
            holding_period,
            transaction_cost,
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip_with_costs() {
        let config = config(10, 0.001);
        let mut portfolio = Portfolio::new(&config, "AAA");

        portfolio.process_bar(0, day(0), 100.0, Label::Buy, 0.8);
        assert!(!portfolio.is_flat());
        portfolio.process_bar(1, day(1), 105.0, Label::Hold, 0.5);
        portfolio.process_bar(2, day(2), 110.0, Label::Sell, 0.9);

        let trades = portfolio.get_trades();
        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert!((trade.entry_price - 100.1).abs() < 1e-9);
        assert!((trade.exit_price - 109.89).abs() < 1e-9);
        assert!((trade.return_pct - (109.89 / 100.1 - 1.0)).abs() < 1e-12);
        assert_eq!(trade.holding_days, 2);
        assert_eq!(trade.confidence, 0.8);
        assert_eq!(trade.exit_reason, ExitReason::Signal);
    }

    #[test]
    fn test_sell_signal_never_opens() {
        let config = config(10, 0.0);
        let mut portfolio = Portfolio::new(&config, "AAA");
        portfolio.process_bar(0, day(0), 100.0, Label::Sell, 0.9);
        assert!(portfolio.is_flat());
        assert!(portfolio.finish(1, day(0), 100.0).is_empty());
    }

    #[test]
    fn test_holding_period_cap() {
        let config = config(2, 0.0);
        let mut portfolio = Portfolio::new(&config, "AAA");
        portfolio.process_bar(0, day(0), 100.0, Label::Buy, 0.7);
        portfolio.process_bar(1, day(1), 101.0, Label::Buy, 0.7);
        portfolio.process_bar(2, day(2), 102.0, Label::Hold, 0.7);

        let trades = portfolio.finish(3, day(2), 102.0);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].holding_days, 2);
        assert_eq!(trades[0].exit_reason, ExitReason::MaxHoldingPeriod);
    }

    #[test]
    fn test_end_of_series_flush() {
        let config = config(10, 0.0);
        let mut portfolio = Portfolio::new(&config, "AAA");
        for i in 0..5 {
            let signal = if i == 3 { Label::Buy } else { Label::Hold };
            portfolio.process_bar(i, day(i), 100.0 + i as f64, signal, 0.75);
        }

        let trades = portfolio.finish(5, day(4), 104.0);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].holding_days, 1);
        assert_eq!(trades[0].exit_date, day(4));
        assert_eq!(trades[0].exit_reason, ExitReason::EndOfData);
    }
}
