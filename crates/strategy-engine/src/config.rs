use serde::{Deserialize, Serialize};

/// Which rule set the engine runs. Concrete kinds as a tagged variant; the
/// fan-out only ever sees the subscriber capability, never a hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrategyMode {
    Momentum,
    MeanReversion {
        /// Deviation from the rolling mean, in percent, that arms a signal.
        threshold_pct: f64,
    },
}

impl Default for StrategyMode {
    fn default() -> Self {
        StrategyMode::Momentum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Minimum composite momentum to fire a BUY.
    pub momentum_threshold: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Short moving-average window.
    pub short_period: usize,
    /// Long moving-average window; also the minimum history for a signal.
    pub long_period: usize,
    pub rsi_period: usize,
    /// Fixed quantity per emitted order.
    pub position_size: u64,
    /// Forced exit when price falls this percent below entry.
    pub stop_loss_pct: f64,
    /// Forced exit when price rises this percent above entry.
    pub take_profit_pct: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            momentum_threshold: 0.25,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            short_period: 5,
            long_period: 20,
            rsi_period: 14,
            position_size: 50,
            stop_loss_pct: 2.0,
            take_profit_pct: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows_are_ordered() {
        let config = StrategyConfig::default();
        assert!(config.short_period < config.long_period);
        assert!(config.rsi_oversold < config.rsi_overbought);
        assert!(config.position_size > 0);
    }
}
