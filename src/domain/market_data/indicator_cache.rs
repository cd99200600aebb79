use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::indicator_engine::{Bands, IndicatorSeries, MacdOutput, RegimeTier};
use super::Symbol;

/// Which computation an entry holds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Bands,
    Rsi,
    Macd,
    Regime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Line(IndicatorSeries),
    Bands(Bands),
    Macd(MacdOutput),
    Regime(Vec<Option<RegimeTier>>),
}

impl IndicatorValue {
    pub fn as_line(&self) -> Option<&IndicatorSeries> {
        match self {
            IndicatorValue::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn as_bands(&self) -> Option<&Bands> {
        match self {
            IndicatorValue::Bands(bands) => Some(bands),
            _ => None,
        }
    }

    pub fn as_macd(&self) -> Option<&MacdOutput> {
        match self {
            IndicatorValue::Macd(macd) => Some(macd),
            _ => None,
        }
    }

    pub fn as_regime(&self) -> Option<&[Option<RegimeTier>]> {
        match self {
            IndicatorValue::Regime(tiers) => Some(tiers),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorKey {
    pub symbol: Symbol,
    pub version: u64,
    pub kind: IndicatorKind,
    pub period: usize,
}

/// Memoized indicator results keyed by `(symbol, series version, kind, period)`.
///
/// Asking for a newer version of a symbol drops everything computed from
/// older versions of it. [`IndicatorCache::retain_symbol`] drops every other
/// symbol when the primary changes.
#[derive(Debug, Default)]
pub struct IndicatorCache {
    entries: HashMap<IndicatorKey, Arc<IndicatorValue>>,
    hits: u64,
    misses: u64,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(
        &mut self,
        symbol: &Symbol,
        version: u64,
        kind: IndicatorKind,
        period: usize,
        compute: F,
    ) -> Arc<IndicatorValue>
    where
        F: FnOnce() -> IndicatorValue,
    {
        self.entries.retain(|key, _| key.symbol != *symbol || key.version >= version);

        let key = IndicatorKey { symbol: symbol.clone(), version, kind, period };
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(value);
        }

        self.misses += 1;
        let value = Arc::new(compute());
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Forget everything not computed for `symbol`
    pub fn retain_symbol(&mut self, symbol: &Symbol) {
        self.entries.retain(|key, _| key.symbol == *symbol);
    }
}
