use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::domain::errors::ChartResult;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Ohlcv, Series, SeriesSource, Symbol, Timestamp};
use crate::log_debug;

pub const DEFAULT_BARS: usize = 700;
const DAY_MS: u64 = 86_400_000;
/// 2020-01-01T00:00:00Z
const DEFAULT_START_MS: u64 = 1_577_836_800_000;

/// Deterministic daily random walk; the same symbol always yields the same bars.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSeriesSource {
    bars: usize,
    start: Timestamp,
}

impl Default for SyntheticSeriesSource {
    fn default() -> Self {
        Self { bars: DEFAULT_BARS, start: Timestamp::from_millis(DEFAULT_START_MS) }
    }
}

impl SyntheticSeriesSource {
    pub fn new(bars: usize, start: Timestamp) -> Self {
        Self { bars, start }
    }

    pub fn with_bars(bars: usize) -> Self {
        Self { bars, ..Self::default() }
    }
}

/// FNV-1a over the symbol text
fn seed_for(symbol: &Symbol) -> u64 {
    symbol
        .value()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3))
}

impl SeriesSource for SyntheticSeriesSource {
    fn load(&self, symbol: &Symbol) -> ChartResult<Series> {
        let seed = seed_for(symbol);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut close = 20.0 + (seed % 480) as f64;

        let rows = (0..self.bars).map(|day| {
            let open = close;
            let step: f64 = rng.gen_range(-0.025..0.025);
            close = (open * (1.0 + step)).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.015));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.015));
            let volume = rng.gen_range(100_000.0..1_000_000.0);
            let time = Timestamp::from_millis(self.start.value() + day as u64 * DAY_MS);
            Ohlcv::new(time, open, high, low, close, volume)
        });
        let series = Series::from_ohlcv(rows)?;

        log_debug!(
            LogComponent::Infrastructure("SyntheticSource"),
            "Generated {} bars for {} (seed {:#x})",
            series.len(),
            symbol,
            seed
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_symbol_same_bars() {
        let source = SyntheticSeriesSource::default();
        let symbol = Symbol::new("ACME").unwrap();
        let a = source.load(&symbol).unwrap();
        let b = source.load(&symbol).unwrap();
        assert_eq!(a.len(), DEFAULT_BARS);
        assert_eq!(a, b);
    }

    #[test]
    fn different_symbols_diverge() {
        let source = SyntheticSeriesSource::with_bars(50);
        let a = source.load(&Symbol::new("ACME").unwrap()).unwrap();
        let b = source.load(&Symbol::new("GLOBEX").unwrap()).unwrap();
        assert_ne!(a.closes(), b.closes());
    }
}
