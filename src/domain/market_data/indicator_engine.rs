//! Technical indicators over full series.
//!
//! Every function is total: it returns a vector of the input length where
//! `None` marks positions without enough history, an empty vector for empty
//! input, and never panics.

use super::entities::{Bar, Series};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Parallel to a series; `None` where history is insufficient
pub type IndicatorSeries = Vec<Option<f64>>;

/// Floor for the RSI loss denominator
pub const RSI_EPSILON: f64 = 1e-10;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;

/// Rolling mean with a running sum.
pub fn sma(values: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum = 0.0;
    for (i, &value) in values.iter().enumerate() {
        sum += value;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

/// Exponential average seeded with the SMA of the first `period` values.
pub fn ema(values: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut last = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(last);
    for i in period..values.len() {
        last = alpha * values[i] + (1.0 - alpha) * last;
        out[i] = Some(last);
    }
    out
}

/// Rolling population standard deviation via running sum and sum of squares.
pub fn std(values: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let n = period as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for (i, &value) in values.iter().enumerate() {
        sum += value;
        sum_sq += value * value;
        if i >= period {
            let old = values[i - period];
            sum -= old;
            sum_sq -= old * old;
        }
        if i + 1 >= period {
            let mean = sum / n;
            let variance = (sum_sq / n - mean * mean).max(0.0);
            out[i] = Some(variance.sqrt());
        }
    }
    out
}

/// True range per bar; the first bar is its own predecessor.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = if i == 0 { bar.close } else { bars[i - 1].close };
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect()
}

/// Average true range as a rolling mean of [`true_range`].
pub fn atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    sma(&true_range(bars), period)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = avg_gain / avg_loss.max(RSI_EPSILON);
    let value = 100.0 - 100.0 / (1.0 + rs);
    if value.is_nan() { 50.0 } else { value.clamp(0.0, 100.0) }
}

/// Wilder RSI. The first value sits at index `period`.
pub fn rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let p = period as f64;
    let mut gain = 0.0;
    let mut loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gain += change;
        } else {
            loss -= change;
        }
    }
    let mut avg_gain = gain / p;
    let mut avg_loss = loss / p;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self { fast: DEFAULT_MACD_FAST, slow: DEFAULT_MACD_SLOW, signal: DEFAULT_MACD_SIGNAL }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdOutput {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// MACD line, its signal EMA and the histogram `macd - signal`.
pub fn macd(closes: &[f64], params: MacdParams) -> MacdOutput {
    let n = closes.len();
    let fast = ema(closes, params.fast);
    let slow = ema(closes, params.slow);

    let line: IndicatorSeries = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let mut signal = vec![None; n];
    if let Some(first) = line.iter().position(Option::is_some) {
        // Once both EMAs are defined they stay defined, so the tail is dense.
        let tail: Vec<f64> = line[first..].iter().map(|v| v.unwrap_or(0.0)).collect();
        for (offset, value) in ema(&tail, params.signal).into_iter().enumerate() {
            signal[first + offset] = value;
        }
    }

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => Some(m - s),
            _ => None,
        })
        .collect();

    MacdOutput { macd: line, signal, histogram }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bands {
    pub mid: IndicatorSeries,
    pub upper: IndicatorSeries,
    pub lower: IndicatorSeries,
}

/// Mean ± `width` standard deviations.
pub fn bollinger(values: &[f64], period: usize, width: f64) -> Bands {
    let mid = sma(values, period);
    let dev = std(values, period);
    let shifted = |sign: f64| -> IndicatorSeries {
        mid.iter()
            .zip(&dev)
            .map(|(m, d)| match (m, d) {
                (Some(m), Some(d)) => Some(m + sign * width * d),
                _ => None,
            })
            .collect()
    };
    let upper = shifted(1.0);
    let lower = shifted(-1.0);
    Bands { mid, upper, lower }
}

/// Volatility bucket of ATR ÷ close
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum RegimeTier {
    Calm,
    Normal,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    /// Ratios below this are calm
    pub low: f64,
    /// Ratios at or above this are volatile
    pub high: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self { low: 0.01, high: 0.025 }
    }
}

impl RegimeThresholds {
    pub fn classify(&self, ratio: f64) -> RegimeTier {
        if ratio < self.low {
            RegimeTier::Calm
        } else if ratio < self.high {
            RegimeTier::Normal
        } else {
            RegimeTier::Volatile
        }
    }
}

pub fn volatility_regime(bars: &[Bar], atr_period: usize, thresholds: RegimeThresholds) -> Vec<Option<RegimeTier>> {
    atr(bars, atr_period)
        .into_iter()
        .zip(bars)
        .map(|(atr, bar)| match atr {
            Some(atr) if bar.close > 0.0 => Some(thresholds.classify(atr / bar.close)),
            _ => None,
        })
        .collect()
}

/// Comparison closes rescaled so that they start at the primary's price.
///
/// Series are aligned on their most recent bar. The result covers
/// `start..end` of the primary and uses the first aligned bar inside that
/// window as the common base.
pub fn normalized_overlay(primary: &Series, compare: &Series, start: usize, end: usize) -> IndicatorSeries {
    let end = end.min(primary.len());
    let start = start.min(end);
    let shift = compare.len() as i64 - primary.len() as i64;
    let aligned = |i: usize| -> Option<Bar> {
        let j = i as i64 + shift;
        if j < 0 { None } else { compare.get(j as usize).copied() }
    };

    let base = (start..end).find_map(|i| {
        let cmp = aligned(i)?;
        let prim = primary.get(i)?;
        (cmp.close.abs() > f64::EPSILON).then_some((cmp.close, prim.close))
    });

    match base {
        Some((cmp_base, prim_base)) => (start..end)
            .map(|i| aligned(i).map(|bar| bar.close / cmp_base * prim_base))
            .collect(),
        None => vec![None; end - start],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_of_constant_is_constant() {
        let out = ema(&[4.0; 10], 3);
        assert_eq!(out[1], None);
        assert!(out[2..].iter().all(|v| *v == Some(4.0)));
    }

    #[test]
    fn regime_thresholds_split_three_ways() {
        let t = RegimeThresholds::default();
        assert_eq!(t.classify(0.005), RegimeTier::Calm);
        assert_eq!(t.classify(0.01), RegimeTier::Normal);
        assert_eq!(t.classify(0.03), RegimeTier::Volatile);
    }

    fn bars(closes: &[f64]) -> Series {
        use crate::domain::market_data::{Ohlcv, Timestamp};
        Series::from_ohlcv(closes.iter().enumerate().map(|(i, &c)| {
            Ohlcv::new(Timestamp::from_millis(i as u64 + 1), c, c + 1.0, c - 1.0, c, 1.0)
        }))
        .unwrap()
    }

    #[test]
    fn true_range_sees_gaps() {
        let s = bars(&[10.0, 14.0]);
        // 15 - 10 beats the 2 point intrabar range
        assert_eq!(true_range(s.bars()), vec![2.0, 5.0]);
        assert_eq!(atr(s.bars(), 2), vec![None, Some(3.5)]);
    }

    #[test]
    fn overlay_starts_at_primary_price() {
        let primary = bars(&[100.0, 102.0, 104.0, 106.0]);
        let compare = bars(&[7.0, 10.0, 20.0]);
        // right aligned: primary 1..4 pairs with compare 0..3
        let out = normalized_overlay(&primary, &compare, 0, 4);
        assert_eq!(out, vec![None, Some(102.0), Some(10.0 / 7.0 * 102.0), Some(20.0 / 7.0 * 102.0)]);

        let tail = normalized_overlay(&primary, &compare, 2, 4);
        assert_eq!(tail, vec![Some(104.0), Some(208.0)]);
    }

    #[test]
    fn bollinger_is_symmetric_around_mid() {
        let values: Vec<f64> = (0..30).map(|i| (i % 7) as f64).collect();
        let bands = bollinger(&values, 5, 2.0);
        for i in 4..values.len() {
            let (m, u, l) = (bands.mid[i].unwrap(), bands.upper[i].unwrap(), bands.lower[i].unwrap());
            assert!(((u - m) - (m - l)).abs() < 1e-9);
        }
    }
}
