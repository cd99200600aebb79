use std::collections::HashMap;
use std::sync::Arc;

use super::repositories::SeriesSource;
use super::{Series, Symbol};
use crate::domain::errors::ChartResult;
use crate::domain::logging::LogComponent;
use crate::{log_debug, log_info};

#[derive(Debug, Clone)]
struct StoredSeries {
    series: Arc<Series>,
    version: u64,
}

/// Per-symbol cache of bars.
///
/// Entries are only ever inserted or replaced as a whole. Every write takes
/// a fresh value from one store-wide counter, so `(symbol, version)` uniquely
/// identifies the bars an indicator was computed from.
pub struct SeriesStore<S: SeriesSource> {
    source: S,
    entries: HashMap<Symbol, StoredSeries>,
    next_version: u64,
}

impl<S: SeriesSource> SeriesStore<S> {
    pub fn new(source: S) -> Self {
        Self { source, entries: HashMap::new(), next_version: 1 }
    }

    /// Read-or-insert. Loads from the source on first reference and returns
    /// the version of the stored series.
    pub fn ensure(&mut self, symbol: &Symbol) -> ChartResult<u64> {
        if let Some(entry) = self.entries.get(symbol) {
            return Ok(entry.version);
        }

        let series = self.source.load(symbol)?;
        log_info!(
            LogComponent::Domain("SeriesStore"),
            "Loaded {} bars for {}",
            series.len(),
            symbol
        );
        Ok(self.insert(symbol.clone(), series))
    }

    /// Store caller-supplied bars, replacing any previous series.
    pub fn insert(&mut self, symbol: Symbol, series: Series) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        log_debug!(
            LogComponent::Domain("SeriesStore"),
            "{} -> version {} ({} bars)",
            symbol,
            version,
            series.len()
        );
        self.entries.insert(symbol, StoredSeries { series: Arc::new(series), version });
        version
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Arc<Series>> {
        self.entries.get(symbol).map(|entry| Arc::clone(&entry.series))
    }

    pub fn version(&self, symbol: &Symbol) -> Option<u64> {
        self.entries.get(symbol).map(|entry| entry.version)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.entries.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
