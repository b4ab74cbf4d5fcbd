use crate::config::{StrategyConfig, StrategyMode};
use crate::position::Position;
use crate::signal::{Signal, SignalKind};
use indicators::{macd, momentum_score, rsi, sma, PriceHistory};
use market_data::{MarketUpdate, UpdateKind};
use order_book::{Order, OrderId, Price, Quantity, Side, TickScale};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub name: String,
    pub signals_generated: u64,
    pub orders_emitted: u64,
    pub symbols_tracked: usize,
    pub open_positions: usize,
}

/// Converts market updates into at most one signal each. Keeps a bounded
/// price history per symbol, an advisory flat/long flag with the entry price,
/// and a session P&L ledger fed by the strategy's own fills. The flag is
/// advisory only: it tracks what this strategy asked for, and fills from
/// other producers never touch it.
pub struct StrategyEngine {
    name: String,
    mode: StrategyMode,
    config: StrategyConfig,
    scale: TickScale,
    histories: HashMap<String, PriceHistory>,
    entries: HashMap<String, f64>,
    ledger: HashMap<String, Position>,
    signals_generated: u64,
    orders_emitted: u64,
}

impl StrategyEngine {
    pub fn new(name: impl Into<String>, mode: StrategyMode, config: StrategyConfig) -> Self {
        Self::with_tick_scale(name, mode, config, TickScale::DEFAULT)
    }

    pub fn with_tick_scale(
        name: impl Into<String>,
        mode: StrategyMode,
        config: StrategyConfig,
        scale: TickScale,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            config,
            scale,
            histories: HashMap::new(),
            entries: HashMap::new(),
            ledger: HashMap::new(),
            signals_generated: 0,
            orders_emitted: 0,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn mode(&self) -> StrategyMode {
        self.mode
    }

    #[inline]
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Digests one update. TRADE updates extend the symbol's history and run
    /// the rule set; quote and book updates carry no reference price for the
    /// indicators and produce no signal.
    pub fn on_update(&mut self, update: &MarketUpdate) -> Option<Signal> {
        if update.kind != UpdateKind::Trade {
            return None;
        }

        let price = self.scale.price_to_f64(update.price);
        self.histories
            .entry(update.symbol.clone())
            .or_insert_with(PriceHistory::new)
            .push(price);
        if let Some(position) = self.ledger.get_mut(&update.symbol) {
            position.mark_to(price);
        }

        let signal = self
            .forced_exit(&update.symbol, update.price, price)
            .or_else(|| match self.mode {
                StrategyMode::Momentum => self.evaluate_momentum(&update.symbol, update.price, price),
                StrategyMode::MeanReversion { threshold_pct } => {
                    self.evaluate_reversion(&update.symbol, update.price, price, threshold_pct)
                }
            })?;

        match signal.kind {
            SignalKind::Buy => {
                self.entries.insert(signal.symbol.clone(), price);
                self.signals_generated += 1;
                info!(
                    strategy = %self.name,
                    symbol = %signal.symbol,
                    confidence = signal.confidence,
                    "BUY signal: {}",
                    signal.reason
                );
            }
            SignalKind::Sell => {
                self.entries.remove(&signal.symbol);
                self.signals_generated += 1;
                info!(
                    strategy = %self.name,
                    symbol = %signal.symbol,
                    confidence = signal.confidence,
                    "SELL signal: {}",
                    signal.reason
                );
            }
            SignalKind::Hold | SignalKind::None => {}
        }

        Some(signal)
    }

    /// Translates an actionable signal into a marketable LIMIT order at the
    /// target price. HOLD and NONE produce nothing.
    pub fn signal_to_order(&mut self, signal: &Signal, id: OrderId) -> Option<Order> {
        let side = match signal.kind {
            SignalKind::Buy => Side::Buy,
            SignalKind::Sell => Side::Sell,
            SignalKind::Hold | SignalKind::None => return None,
        };
        self.orders_emitted += 1;
        Some(Order::limit(id, side, signal.price, signal.quantity))
    }

    /// Attributes a fill of one of this strategy's own orders to the ledger.
    pub fn on_fill(&mut self, symbol: &str, side: Side, price: Price, quantity: Quantity) {
        let position = self
            .ledger
            .entry(symbol.to_string())
            .or_insert_with(|| Position::new(symbol));
        position.apply_fill(
            side,
            self.scale.price_to_f64(price),
            quantity.to_raw() as f64,
        );
    }

    #[inline]
    pub fn is_in_position(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    #[inline]
    pub fn entry_price(&self, symbol: &str) -> Option<f64> {
        self.entries.get(symbol).copied()
    }

    #[inline]
    pub fn history_len(&self, symbol: &str) -> usize {
        self.histories.get(symbol).map_or(0, PriceHistory::len)
    }

    #[inline]
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.ledger.get(symbol)
    }

    /// Drops everything tracked for a symbol, histories included.
    pub fn remove_symbol(&mut self, symbol: &str) {
        self.histories.remove(symbol);
        self.entries.remove(symbol);
        self.ledger.remove(symbol);
    }

    pub fn stats(&self) -> StrategyStats {
        StrategyStats {
            name: self.name.clone(),
            signals_generated: self.signals_generated,
            orders_emitted: self.orders_emitted,
            symbols_tracked: self.histories.len(),
            open_positions: self.entries.len(),
        }
    }

    /// Stop-loss / take-profit preempt the mode's rule set while a position
    /// is open.
    fn forced_exit(&self, symbol: &str, tick_price: Price, price: f64) -> Option<Signal> {
        let entry = self.entries.get(symbol).copied()?;

        let stop = entry * (1.0 - self.config.stop_loss_pct / 100.0);
        if self.config.stop_loss_pct > 0.0 && price <= stop {
            return Some(Signal::new(
                SignalKind::Sell,
                symbol,
                tick_price,
                Quantity::from_raw(self.config.position_size),
                1.0,
                format!("Stop loss: {price:.4} <= {stop:.4} (entry {entry:.4})"),
            ));
        }

        let target = entry * (1.0 + self.config.take_profit_pct / 100.0);
        if self.config.take_profit_pct > 0.0 && price >= target {
            return Some(Signal::new(
                SignalKind::Sell,
                symbol,
                tick_price,
                Quantity::from_raw(self.config.position_size),
                1.0,
                format!("Take profit: {price:.4} >= {target:.4} (entry {entry:.4})"),
            ));
        }

        None
    }

    fn evaluate_momentum(&self, symbol: &str, tick_price: Price, price: f64) -> Option<Signal> {
        let history = self.histories.get(symbol)?;
        if history.len() < self.config.long_period {
            return None;
        }

        let score = momentum_score(history, self.config.short_period, self.config.long_period);
        let rsi_value = rsi(history, self.config.rsi_period);
        let (macd_line, signal_line) = macd(history, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let short_mean = sma(history, self.config.short_period);
        let in_position = self.entries.contains_key(symbol);

        if !in_position {
            let fires = score > self.config.momentum_threshold
                && rsi_value < self.config.rsi_overbought
                && macd_line > signal_line
                && price > short_mean;
            if !fires {
                return None;
            }

            let headroom =
                ((self.config.rsi_overbought - rsi_value) / self.config.rsi_overbought).clamp(0.0, 1.0);
            let confidence = (score.clamp(0.0, 1.0) + headroom) / 2.0;
            return Some(Signal::new(
                SignalKind::Buy,
                symbol,
                tick_price,
                Quantity::from_raw(self.config.position_size),
                confidence,
                format!(
                    "Momentum: {score:.2}, RSI: {rsi_value:.1}, MACD: {}, price {price:.4} > SMA{} {short_mean:.4}",
                    if macd_line > signal_line { "Bullish" } else { "Bearish" },
                    self.config.short_period,
                ),
            ));
        }

        let mut weakening: Vec<String> = Vec::new();
        if score < self.config.momentum_threshold {
            weakening.push(format!("momentum {score:.2} below threshold"));
        }
        if rsi_value > self.config.rsi_overbought {
            weakening.push(format!("RSI {rsi_value:.1} overbought"));
        }
        if rsi_value < self.config.rsi_oversold {
            weakening.push(format!("RSI {rsi_value:.1} oversold"));
        }
        if macd_line < signal_line {
            weakening.push("MACD bearish".to_string());
        }
        if price < short_mean {
            weakening.push(format!("price below SMA{}", self.config.short_period));
        }
        if weakening.is_empty() {
            return None;
        }

        let confidence = (0.25 * weakening.len() as f64).min(1.0);
        Some(Signal::new(
            SignalKind::Sell,
            symbol,
            tick_price,
            Quantity::from_raw(self.config.position_size),
            confidence,
            weakening.join("; "),
        ))
    }

    fn evaluate_reversion(
        &self,
        symbol: &str,
        tick_price: Price,
        price: f64,
        threshold_pct: f64,
    ) -> Option<Signal> {
        let history = self.histories.get(symbol)?;
        if history.len() < self.config.long_period || threshold_pct <= 0.0 {
            return None;
        }

        let mean = sma(history, self.config.long_period);
        if mean == 0.0 {
            return None;
        }

        let deviation_pct = (price - mean) / mean * 100.0;
        let in_position = self.entries.contains_key(symbol);
        let confidence = (deviation_pct.abs() / threshold_pct / 2.0).clamp(0.0, 1.0);

        if deviation_pct <= -threshold_pct && !in_position {
            return Some(Signal::new(
                SignalKind::Buy,
                symbol,
                tick_price,
                Quantity::from_raw(self.config.position_size),
                confidence,
                format!(
                    "Reversion: price {price:.4} is {:.2}% below SMA{} {mean:.4}",
                    -deviation_pct, self.config.long_period,
                ),
            ));
        }

        if deviation_pct >= threshold_pct && in_position {
            return Some(Signal::new(
                SignalKind::Sell,
                symbol,
                tick_price,
                Quantity::from_raw(self.config.position_size),
                confidence,
                format!(
                    "Reversion: price {price:.4} is {deviation_pct:.2}% above SMA{} {mean:.4}",
                    self.config.long_period,
                ),
            ));
        }

        Some(Signal::new(
            SignalKind::Hold,
            symbol,
            tick_price,
            Quantity::ZERO,
            1.0 - confidence,
            format!("Reversion: deviation {deviation_pct:.2}% within {threshold_pct:.1}% band"),
        ))
    }
}
