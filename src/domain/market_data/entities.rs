pub use super::value_objects::{Symbol, Timestamp, WindowBars};
use crate::domain::errors::{ChartError, ChartResult};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Raw OHLCV row as delivered by a data source
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Ohlcv {
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv {
    pub fn is_valid(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.volume >= 0.0
    }
}

/// Domain entity - one bar with the derived prices computed at generation time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub typical_price: f64,
    pub vwap: f64,
}

impl Bar {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Percent change from open to close
    pub fn change_pct(&self) -> f64 {
        if self.open.abs() < f64::EPSILON {
            0.0
        } else {
            (self.close - self.open) / self.open * 100.0
        }
    }
}

/// Domain entity - bars of one symbol, strictly increasing by time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate raw rows and derive typical price and running VWAP.
    pub fn from_ohlcv<I>(rows: I) -> ChartResult<Self>
    where
        I: IntoIterator<Item = Ohlcv>,
    {
        let mut bars: Vec<Bar> = Vec::new();
        let mut cum_volume = 0.0;
        let mut cum_pv = 0.0;

        for (index, row) in rows.into_iter().enumerate() {
            if !row.is_valid() {
                return Err(ChartError::InvalidBar { index });
            }
            if let Some(prev) = bars.last() {
                if row.time <= prev.time {
                    return Err(ChartError::NonMonotonicTime { index });
                }
            }

            let typical_price = (row.high + row.low + row.close) / 3.0;
            cum_volume += row.volume;
            cum_pv += typical_price * row.volume;
            let vwap = if cum_volume > 0.0 { cum_pv / cum_volume } else { typical_price };

            bars.push(Bar {
                time: row.time,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
                typical_price,
                vwap,
            });
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Lowest low and highest high inside `range` (clamped to the series)
    pub fn price_range(&self, range: Range<usize>) -> Option<(f64, f64)> {
        let end = range.end.min(self.bars.len());
        let start = range.start.min(end);
        let window = &self.bars[start..end];
        if window.is_empty() {
            return None;
        }
        let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        Some((low, high))
    }

    pub fn max_volume(&self, range: Range<usize>) -> f64 {
        let end = range.end.min(self.bars.len());
        let start = range.start.min(end);
        self.bars[start..end].iter().map(|b| b.volume).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(t: u64, o: f64, h: f64, l: f64, c: f64, v: f64) -> Ohlcv {
        Ohlcv::new(Timestamp::from_millis(t), o, h, l, c, v)
    }

    #[test]
    fn vwap_accumulates_typical_price() {
        let series = Series::from_ohlcv(vec![
            row(1, 10.0, 12.0, 9.0, 12.0, 100.0),
            row(2, 12.0, 15.0, 12.0, 15.0, 300.0),
        ])
        .unwrap();
        let bars = series.bars();
        assert!((bars[0].typical_price - 11.0).abs() < 1e-12);
        assert!((bars[0].vwap - 11.0).abs() < 1e-12);
        // (11*100 + 14*300) / 400
        assert!((bars[1].vwap - 13.25).abs() < 1e-12);
    }

    #[test]
    fn zero_volume_falls_back_to_typical_price() {
        let series = Series::from_ohlcv(vec![row(1, 10.0, 13.0, 7.0, 10.0, 0.0)]).unwrap();
        assert!((series.bars()[0].vwap - 10.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_inconsistent_bars() {
        let err = Series::from_ohlcv(vec![row(1, 10.0, 11.0, 9.0, 10.5, 1.0), row(2, 10.0, 9.5, 9.0, 9.2, 1.0)]);
        assert_eq!(err, Err(ChartError::InvalidBar { index: 1 }));
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = Series::from_ohlcv(vec![row(5, 1.0, 1.0, 1.0, 1.0, 1.0), row(5, 1.0, 1.0, 1.0, 1.0, 1.0)]);
        assert_eq!(err, Err(ChartError::NonMonotonicTime { index: 1 }));
    }

    #[test]
    fn price_range_clamps_to_bounds() {
        let series = Series::from_ohlcv(vec![row(1, 2.0, 3.0, 1.0, 2.5, 1.0), row(2, 2.5, 6.0, 2.0, 5.0, 1.0)]).unwrap();
        assert_eq!(series.price_range(0..10), Some((1.0, 6.0)));
        assert_eq!(series.price_range(1..2), Some((2.0, 6.0)));
        assert_eq!(series.price_range(2..2), None);
    }
}
