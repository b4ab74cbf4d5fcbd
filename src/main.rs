use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::signal;
use tokio::time::interval;
use tracing::{info, Level};

use latency_profiler::PerformanceMonitor;
use market_data::{FeedPump, MarketDataFeed, MarketUpdate};
use matching_engine::{EngineConfig, MatchingEngine, MemoryAuditLog};
use order_book::{OrderIdAllocator, Price, Quantity, Side, TickScale};
use risk_manager::RiskFilter;
use strategy_engine::{StrategyConfig, StrategyEngine, StrategyMode};
use worker_pool::WorkerPool;

use parking_lot::Mutex;
use tickmatch::config::TradingConfig;
use tickmatch::metrics::SystemMetrics;
use tickmatch::pipeline::{EngineAdapter, OrderGateway, StrategyRunner};
use tickmatch::utils::{format_duration_ns, format_rate};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

struct SymbolPipeline {
    symbol: String,
    gateway: Arc<OrderGateway>,
    strategies: Vec<Arc<Mutex<StrategyEngine>>>,
    audit: Arc<MemoryAuditLog>,
}

struct TradingSystem {
    config: TradingConfig,
    feed: Arc<MarketDataFeed>,
    pipelines: Vec<SymbolPipeline>,
    pool: Arc<WorkerPool>,
    monitor: Arc<PerformanceMonitor>,
    metrics: Arc<SystemMetrics>,
}

impl TradingSystem {
    fn new(config: TradingConfig) -> Self {
        let scale = TickScale::new(config.tick_scale);
        let feed = Arc::new(MarketDataFeed::new());
        let pool = Arc::new(if config.worker_threads == 0 {
            WorkerPool::new()
        } else {
            WorkerPool::with_size(config.worker_threads, 1024)
        });
        let monitor = Arc::new(PerformanceMonitor::new());
        let metrics = Arc::new(SystemMetrics::new());
        let ids = Arc::new(OrderIdAllocator::new());

        let mut pipelines = Vec::with_capacity(config.symbols.len());
        for symbol in &config.symbols {
            let audit = Arc::new(MemoryAuditLog::new(1024));
            let engine = Arc::new(
                MatchingEngine::with_config(
                    symbol.clone(),
                    EngineConfig {
                        tick_scale: scale,
                        trade_retention: config.trade_retention,
                    },
                )
                .audit_sink(audit.clone()),
            );
            let risk = Arc::new(RiskFilter::with_config(config.risk));
            let gateway = Arc::new(OrderGateway::new(
                engine,
                risk,
                monitor.clone(),
                metrics.clone(),
            ));

            feed.subscribe(Arc::new(EngineAdapter::new(
                symbol.clone(),
                gateway.clone(),
                ids.clone(),
            )));

            let momentum = StrategyRunner::new(
                symbol.clone(),
                StrategyEngine::with_tick_scale(
                    "momentum",
                    StrategyMode::Momentum,
                    config.strategy,
                    scale,
                ),
                gateway.clone(),
                ids.clone(),
            )
            .with_pool(pool.clone());

            let reversion = StrategyRunner::new(
                symbol.clone(),
                StrategyEngine::with_tick_scale(
                    "reversion",
                    StrategyMode::MeanReversion { threshold_pct: 0.5 },
                    StrategyConfig {
                        position_size: config.strategy.position_size / 2,
                        ..config.strategy
                    },
                    scale,
                ),
                gateway.clone(),
                ids.clone(),
            )
            .with_pool(pool.clone());

            let strategies = vec![momentum.strategy().clone(), reversion.strategy().clone()];
            feed.subscribe(Arc::new(momentum));
            feed.subscribe(Arc::new(reversion));

            pipelines.push(SymbolPipeline {
                symbol: symbol.clone(),
                gateway,
                strategies,
                audit,
            });
            info!("pipeline ready for {symbol}");
        }

        Self {
            config,
            feed,
            pipelines,
            pool,
            monitor,
            metrics,
        }
    }

    fn log_stats(&self) {
        let scale = TickScale::new(self.config.tick_scale);
        for pipeline in &self.pipelines {
            let engine = pipeline.gateway.engine();
            let stats = engine.stats();
            let (bid, ask) = engine.top_of_book();
            let percentiles = pipeline.gateway.latency_percentiles();

            info!(
                symbol = %pipeline.symbol,
                orders = stats.processed_orders,
                trades = stats.matched_trades,
                avg_latency = %format_duration_ns(stats.average_latency_ns as u64),
                p99 = %format_duration_ns(percentiles.p99),
                best_bid = scale.price_to_f64(bid),
                best_ask = scale.price_to_f64(ask),
                "engine"
            );

            let risk = pipeline.gateway.risk().stats();
            info!(
                symbol = %pipeline.symbol,
                rejected = risk.orders_rejected,
                daily_volume = risk.daily_volume,
                audit_records = pipeline.audit.len(),
                "risk"
            );

            for strategy in &pipeline.strategies {
                let strategy = strategy.lock();
                let stats = strategy.stats();
                info!(
                    strategy = %stats.name,
                    symbol = %pipeline.symbol,
                    signals = stats.signals_generated,
                    orders = stats.orders_emitted,
                    in_position = strategy.is_in_position(&pipeline.symbol),
                    "strategy"
                );
            }
        }

        info!(
            updates = self.metrics.updates_published(),
            submitted = self.metrics.orders_submitted(),
            matched = self.metrics.trades_matched(),
            notional = self.metrics.notional_traded(),
            rejected = self.metrics.orders_rejected(),
            rate = %format_rate(self.monitor.events_per_second()),
            "system"
        );
    }
}

/// Deterministic demo driver: a triangle wave per symbol, quotes on both
/// sides of the wave plus a trade at it. Stands in for the external feed a
/// host would attach.
fn run_demo_feed(
    pump: Arc<FeedPump>,
    symbols: Vec<String>,
    metrics: Arc<SystemMetrics>,
    stop: Arc<AtomicBool>,
) {
    const PERIOD: u64 = 400;
    const BASE_TICKS: u64 = 1_000_000;
    const STEP_TICKS: u64 = 100;
    const SPREAD_TICKS: u64 = 200;

    let mut step: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        for (offset, symbol) in symbols.iter().enumerate() {
            let phase = (step + offset as u64 * PERIOD / 2) % PERIOD;
            let half = PERIOD / 2;
            let climb = if phase < half { phase } else { PERIOD - phase };
            let price = Price::from_raw(BASE_TICKS + climb * STEP_TICKS);

            let bid = Price::from_raw(price.to_raw() - SPREAD_TICKS);
            let ask = Price::from_raw(price.to_raw() + SPREAD_TICKS);
            let pushed = pump.push(MarketUpdate::quote(
                symbol.clone(),
                Side::Buy,
                bid,
                Quantity::from_raw(20),
            )) && pump.push(MarketUpdate::quote(
                symbol.clone(),
                Side::Sell,
                ask,
                Quantity::from_raw(20),
            )) && pump.push(MarketUpdate::trade(
                symbol.clone(),
                price,
                Quantity::from_raw(5),
            ));
            if !pushed {
                return;
            }
            for _ in 0..3 {
                metrics.record_update_published();
            }
        }
        step += 1;
        thread::sleep(Duration::from_millis(2));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = TradingConfig::default();
    info!("starting {} v{}", tickmatch::NAME, tickmatch::VERSION);

    let system = Arc::new(TradingSystem::new(config.clone()));
    let pump = Arc::new(FeedPump::start(
        system.feed.clone(),
        config.feed_queue_capacity,
    ));

    system.monitor.start();

    let stop = Arc::new(AtomicBool::new(false));
    let feeder = {
        let pump = pump.clone();
        let symbols = config.symbols.clone();
        let metrics = system.metrics.clone();
        let stop = stop.clone();
        thread::spawn(move || run_demo_feed(pump, symbols, metrics, stop))
    };

    let stats_system = system.clone();
    let stats_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            stats_system.log_stats();
        }
    });

    info!("system running, press ctrl-c to stop");
    signal::ctrl_c().await?;
    info!("shutting down");

    // Stop producing, drain the feed queue, drain the worker pool, then
    // freeze the monitor so the final numbers are stable.
    stop.store(true, Ordering::Relaxed);
    let _ = feeder.join();
    pump.stop();
    system.pool.shutdown();
    system.monitor.stop();
    stats_task.abort();

    system.log_stats();
    info!("shutdown complete");
    Ok(())
}
