use std::cell::Cell;
use std::rc::Rc;

use indicator_chart_wasm::domain::errors::{ChartError, ChartResult};
use indicator_chart_wasm::domain::market_data::{
    IndicatorCache, IndicatorKind, IndicatorValue, Ohlcv, Series, SeriesStore, Symbol, Timestamp, sma,
};

fn series(n: usize) -> Series {
    Series::from_ohlcv((0..n).map(|i| {
        let c = 50.0 + i as f64;
        Ohlcv::new(Timestamp::from_millis(i as u64 + 1), c, c + 1.0, c - 1.0, c, 10.0)
    }))
    .unwrap()
}

fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

#[test]
fn loads_each_symbol_once() {
    let loads = Rc::new(Cell::new(0));
    let counter = Rc::clone(&loads);
    let mut store = SeriesStore::new(move |_: &Symbol| -> ChartResult<Series> {
        counter.set(counter.get() + 1);
        Ok(series(5))
    });

    let first = store.ensure(&sym("aaa")).unwrap();
    let again = store.ensure(&sym("AAA")).unwrap();
    assert_eq!(first, again);
    assert_eq!(loads.get(), 1);
    assert_eq!(store.get(&sym("AAA")).unwrap().len(), 5);
}

#[test]
fn every_write_gets_a_new_version() {
    let mut store = SeriesStore::new(|_: &Symbol| -> ChartResult<Series> { Ok(series(3)) });
    let a = store.ensure(&sym("A")).unwrap();
    let b = store.ensure(&sym("B")).unwrap();
    let a2 = store.insert(sym("A"), series(7));
    assert!(a < b && b < a2);
    assert_eq!(store.version(&sym("A")), Some(a2));
    assert_eq!(store.get(&sym("A")).unwrap().len(), 7);
    assert_eq!(store.symbols(), vec![sym("A"), sym("B")]);
}

#[test]
fn failed_load_stores_nothing() {
    let mut store = SeriesStore::new(|symbol: &Symbol| -> ChartResult<Series> {
        Err(ChartError::DataSource(format!("no data for {}", symbol)))
    });
    assert!(matches!(store.ensure(&sym("NOPE")), Err(ChartError::DataSource(_))));
    assert!(!store.contains(&sym("NOPE")));
    assert!(store.is_empty());
}

#[test]
fn cache_drops_results_of_replaced_series() {
    let mut store = SeriesStore::new(|_: &Symbol| -> ChartResult<Series> { Ok(series(30)) });
    let mut cache = IndicatorCache::new();
    let symbol = sym("ACME");
    let compute = |s: &Series| IndicatorValue::Line(sma(&s.closes(), 5));

    let v1 = store.ensure(&symbol).unwrap();
    let data = store.get(&symbol).unwrap();
    cache.get_or_compute(&symbol, v1, IndicatorKind::Sma, 5, || compute(&data));
    cache.get_or_compute(&symbol, v1, IndicatorKind::Sma, 5, || compute(&data));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    let v2 = store.insert(symbol.clone(), series(40));
    let data = store.get(&symbol).unwrap();
    let value = cache.get_or_compute(&symbol, v2, IndicatorKind::Sma, 5, || compute(&data));
    assert_eq!(value.as_line().unwrap().len(), 40);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.misses(), 2);
}

#[test]
fn empty_symbol_is_rejected() {
    assert_eq!(Symbol::new(" \t"), Err(ChartError::EmptySymbol));
}
