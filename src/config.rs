//! Configuration management

use anyhow::Result;
use risk_manager::RiskConfig;
use serde::{Deserialize, Serialize};
use strategy_engine::StrategyConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// One engine, adapter, and strategy set per symbol.
    pub symbols: Vec<String>,
    /// Currency units per tick, applied uniformly.
    pub tick_scale: f64,
    /// Recent trade events retained per engine.
    pub trade_retention: usize,
    /// Worker threads for strategy order dispatch; 0 = one per core.
    pub worker_threads: usize,
    pub feed_queue_capacity: usize,
    pub risk: RiskConfig,
    pub strategy: StrategyConfig,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["ACME".to_string(), "GLOBEX".to_string()],
            tick_scale: 0.0001,
            trade_retention: 10_000,
            worker_threads: 0,
            feed_queue_capacity: 4_096,
            risk: RiskConfig {
                max_order_quantity: 1_000,
                max_notional_per_order: 0,
                max_orders_per_batch: 0,
                max_daily_volume: 10_000_000,
                max_position_pct: 0.0,
            },
            strategy: StrategyConfig::default(),
        }
    }
}

impl TradingConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TradingConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_round_trip_preserves_config() {
        let config = TradingConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: TradingConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.symbols, config.symbols);
        assert_eq!(parsed.risk, config.risk);
        assert_eq!(parsed.strategy, config.strategy);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: TradingConfig = toml::from_str("symbols = [\"ONLY\"]\n").unwrap();
        assert_eq!(parsed.symbols, vec!["ONLY".to_string()]);
        assert_eq!(parsed.tick_scale, TradingConfig::default().tick_scale);
    }
}
