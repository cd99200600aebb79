use indicator_chart_wasm::domain::market_data::{
    MacdParams, Ohlcv, Series, Timestamp, atr, bollinger, ema, macd, rsi, sma, std,
};
use quickcheck_macros::quickcheck;

fn prices(raw: Vec<u16>) -> Vec<f64> {
    raw.into_iter().map(|v| 1.0 + v as f64 / 8.0).collect()
}

fn series_of(closes: &[f64]) -> Series {
    Series::from_ohlcv(closes.iter().enumerate().map(|(i, &c)| {
        Ohlcv::new(Timestamp::from_millis(i as u64 * 86_400_000), c, c * 1.01, c * 0.99, c, 500.0)
    }))
    .unwrap()
}

fn close_to(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn sma_of_counting_sequence() {
    let out = sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
    assert_eq!(out, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
}

#[test]
fn ema_starts_from_simple_mean() {
    let out = ema(&[2.0, 4.0, 6.0, 8.0], 2);
    assert_eq!(out[0], None);
    assert_eq!(out[1], Some(3.0));
    assert!(close_to(out[2].unwrap(), 5.0));
    assert!(close_to(out[3].unwrap(), 7.0));
}

#[test]
fn rsi_of_rising_closes_approaches_hundred() {
    let closes: Vec<f64> = (1..=60).map(|v| v as f64).collect();
    let out = rsi(&closes, 14);
    assert!(out[..14].iter().all(Option::is_none));
    let last = out[59].unwrap();
    assert!(last > 99.9 && last <= 100.0, "got {}", last);
}

#[test]
fn rsi_without_gains_is_zero() {
    let closes: Vec<f64> = (0..20).map(|v| 40.0 - v as f64).collect();
    let out = rsi(&closes, 14);
    assert_eq!(out[14], Some(0.0));
    assert_eq!(out[19], Some(0.0));
}

#[test]
fn macd_defaults_leave_warmup_undefined() {
    let closes: Vec<f64> = (0..60).map(|v| 100.0 + (v % 7) as f64).collect();
    let out = macd(&closes, MacdParams::default());
    assert!(out.macd[..25].iter().all(Option::is_none));
    assert!(out.macd[25].is_some());
    // signal needs 9 macd values
    assert!(out.signal[..33].iter().all(Option::is_none));
    assert!(out.signal[33].is_some());
}

#[test]
fn empty_input_gives_empty_output() {
    assert!(sma(&[], 3).is_empty());
    assert!(rsi(&[], 14).is_empty());
    assert!(macd(&[], MacdParams::default()).histogram.is_empty());
}

#[quickcheck]
fn short_history_is_undefined(raw: Vec<u16>, period: u8) -> bool {
    let period = period as usize % 40 + 1;
    let mut values = prices(raw);
    values.truncate(period - 1);
    let bars = series_of(&values);
    let outputs = [
        sma(&values, period),
        std(&values, period),
        ema(&values, period),
        rsi(&values, period),
        atr(bars.bars(), period),
    ];
    outputs.iter().all(|out| out.len() == values.len() && out.iter().all(Option::is_none))
}

#[quickcheck]
fn constant_series_is_flat(c: u16, len: u8, period: u8) -> bool {
    let period = period as usize % 30 + 1;
    let values = vec![c as f64; len as usize];
    let mean = sma(&values, period);
    let dev = std(&values, period);
    mean.iter().zip(&dev).enumerate().all(|(i, (m, d))| {
        if i + 1 < period {
            m.is_none() && d.is_none()
        } else {
            *m == Some(c as f64) && *d == Some(0.0)
        }
    })
}

#[quickcheck]
fn rsi_stays_in_range(raw: Vec<u16>, period: u8) -> bool {
    let period = period as usize % 20 + 1;
    rsi(&prices(raw), period).into_iter().flatten().all(|v| (0.0..=100.0).contains(&v))
}

#[quickcheck]
fn histogram_is_macd_minus_signal(raw: Vec<u16>) -> bool {
    let out = macd(&prices(raw), MacdParams { fast: 3, slow: 6, signal: 4 });
    out.histogram.iter().zip(out.macd.iter().zip(&out.signal)).all(|(h, (m, s))| match (m, s) {
        (Some(m), Some(s)) => *h == Some(m - s),
        (None, Some(_)) => false,
        _ => h.is_none(),
    })
}

#[quickcheck]
fn bands_bracket_the_mean(raw: Vec<u16>) -> bool {
    let bands = bollinger(&prices(raw), 5, 2.0);
    bands.mid.iter().zip(bands.upper.iter().zip(&bands.lower)).all(|(m, (u, l))| match (m, u, l) {
        (Some(m), Some(u), Some(l)) => l <= m && m <= u,
        (None, None, None) => true,
        _ => false,
    })
}
