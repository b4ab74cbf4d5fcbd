//! Indicator studies over a bounded price history. Every function is total:
//! with insufficient data it returns its neutral sentinel (50 for RSI, 0
//! elsewhere) rather than failing.

use crate::history::PriceHistory;

/// Arithmetic mean of the last `period` samples. 0 when the history holds
/// fewer than `period` samples or `period` is 0; callers gate on history
/// length before treating the value as meaningful.
pub fn sma(history: &PriceHistory, period: usize) -> f64 {
    if period == 0 || history.len() < period {
        return 0.0;
    }
    history.tail(period).sum::<f64>() / period as f64
}

/// Wilder-style relative strength index over the last `period` intervals.
/// Neutral 50 with insufficient data; 100 when no interval moved down.
pub fn rsi(history: &PriceHistory, period: usize) -> f64 {
    if period == 0 || history.len() < period + 1 {
        return 50.0;
    }

    let window: Vec<f64> = history.tail(period + 1).collect();
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gain_sum += delta;
        } else {
            loss_sum -= delta;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// (macd_line, signal_line) with the usual 12/26/9 defaults supplied by the
/// caller. The MACD line is EMA(fast) - EMA(slow) over the full history; the
/// signal line is approximated as the arithmetic mean of the trailing
/// `signal` MACD values rather than an EMA of the MACD series. (0, 0) with
/// fewer than `slow` samples.
pub fn macd(history: &PriceHistory, fast: usize, slow: usize, signal: usize) -> (f64, f64) {
    if fast == 0 || slow == 0 || fast >= slow || history.len() < slow {
        return (0.0, 0.0);
    }

    let series = macd_series(history, fast, slow);
    let macd_line = *series.last().unwrap_or(&0.0);

    let signal_line = if signal == 0 || series.is_empty() {
        0.0
    } else {
        let take = signal.min(series.len());
        series[series.len() - take..].iter().sum::<f64>() / take as f64
    };

    (macd_line, signal_line)
}

/// Percentage move over the last `period` intervals. 0 when the earlier
/// sample is 0 or the history is too short.
pub fn percent_change(history: &PriceHistory, period: usize) -> f64 {
    if period == 0 || history.len() < period + 1 {
        return 0.0;
    }
    let (Some(last), Some(earlier)) = (history.last(), history.nth_back(period)) else {
        return 0.0;
    };
    if earlier == 0.0 {
        return 0.0;
    }
    (last - earlier) / earlier * 100.0
}

/// Composite momentum in [-1, 1]: the mean of the price-vs-short-mean sign,
/// the short-vs-long-mean sign, and a tanh-squashed short percent change.
/// 0 until `long` samples exist.
pub fn momentum_score(history: &PriceHistory, short: usize, long: usize) -> f64 {
    if short == 0 || long == 0 || history.len() < long.max(short) {
        return 0.0;
    }
    let Some(last) = history.last() else {
        return 0.0;
    };

    let short_mean = sma(history, short);
    let long_mean = sma(history, long);

    let trend = sign(last - short_mean);
    let crossover = sign(short_mean - long_mean);
    let velocity = (percent_change(history, short) / 10.0).tanh();

    (trend + crossover + velocity) / 3.0
}

#[inline]
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn macd_series(history: &PriceHistory, fast: usize, slow: usize) -> Vec<f64> {
    let k_fast = 2.0 / (fast as f64 + 1.0);
    let k_slow = 2.0 / (slow as f64 + 1.0);

    let mut ema_fast = None;
    let mut ema_slow = None;
    let mut series = Vec::with_capacity(history.len());

    for value in history.iter() {
        ema_fast = Some(match ema_fast {
            None => value,
            Some(prev) => value * k_fast + prev * (1.0 - k_fast),
        });
        ema_slow = Some(match ema_slow {
            None => value,
            Some(prev) => value * k_slow + prev * (1.0 - k_slow),
        });
        if let (Some(fast_value), Some(slow_value)) = (ema_fast, ema_slow) {
            series.push(fast_value - slow_value);
        }
    }

    series
}
