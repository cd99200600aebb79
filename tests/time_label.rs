use indicator_chart_wasm::domain::chart::Tooltip;
use indicator_chart_wasm::domain::market_data::{Ohlcv, Series, Timestamp};
use indicator_chart_wasm::time_utils::{format_bar_time, format_time_label};

// 2024-03-15T14:30:00Z
const TS: u64 = 1_710_513_000_000;

#[test]
fn label_granularity_follows_zoom() {
    assert_eq!(format_time_label(TS, 3.0), "14:30");
    assert_eq!(format_time_label(TS, 2.0), "14:30");
    assert_eq!(format_time_label(TS, 1.0), "15.03");
    assert_eq!(format_time_label(TS, 0.2), "03.2024");
}

#[test]
fn out_of_range_timestamp_is_blank() {
    assert_eq!(format_time_label(u64::MAX, 1.0), "");
    assert_eq!(format_bar_time(u64::MAX), "");
}

#[test]
fn tooltip_lines() {
    let series = Series::from_ohlcv([Ohlcv::new(Timestamp::from_millis(TS), 100.0, 110.0, 95.0, 105.0, 12_345.0)]).unwrap();
    let tip = Tooltip::new(0, 0, &series.bars()[0]);
    assert_eq!(
        tip.lines(),
        vec![
            "2024-03-15".to_string(),
            "O 100.00  H 110.00".to_string(),
            "L 95.00  C 105.00".to_string(),
            "Vol 12345  +5.00%".to_string(),
        ]
    );
}
