use indicator_chart_wasm::application::WidgetConfig;
use indicator_chart_wasm::domain::chart::{IndicatorToggles, ThemeKind};
use indicator_chart_wasm::domain::errors::ChartError;
use indicator_chart_wasm::domain::market_data::{Symbol, WindowBars};
use insta::assert_json_snapshot;

#[test]
fn default_config_shape() {
    assert_json_snapshot!(WidgetConfig::default(), @r###"
    {
      "symbol": "DEMO",
      "compareSymbols": [],
      "windowBars": "90",
      "indicatorToggles": {
        "sma": true,
        "bands": true,
        "vwap": true,
        "volume": true,
        "regime": true,
        "rsi": true,
        "macd": true
      },
      "smaPeriods": [
        20,
        50
      ],
      "bandPeriod": 20,
      "bandWidth": 2.0,
      "rsiPeriod": 14,
      "macd": {
        "fast": 12,
        "slow": 26,
        "signal": 9
      },
      "atrPeriod": 14,
      "regime": {
        "low": 0.01,
        "high": 0.025
      },
      "theme": "dark"
    }
    "###);
}

#[test]
fn partial_json_keeps_defaults() {
    let config = WidgetConfig::from_json(
        r#"{"symbol":"spy","compareSymbols":["qqq","spy","QQQ"],"windowBars":"max","indicatorToggles":{"rsi":false},"theme":"light"}"#,
    )
    .unwrap();
    assert_eq!(config.primary_symbol().unwrap().value(), "SPY");
    assert_eq!(config.compare_list(), vec![Symbol::new("QQQ").unwrap(), Symbol::new("SPY").unwrap()]);
    assert_eq!(config.window_bars, WindowBars::Max);
    assert_eq!(config.indicator_toggles, IndicatorToggles { rsi: false, ..IndicatorToggles::default() });
    assert_eq!(config.theme, ThemeKind::Light);
    assert_eq!(config.sma_periods, vec![20, 50]);
}

#[test]
fn invalid_values_are_rejected() {
    for json in [
        r#"{"smaPeriods":[20,0]}"#,
        r#"{"bandWidth":-1.0}"#,
        r#"{"rsiPeriod":0}"#,
        r#"{"regime":{"low":0.03,"high":0.02}}"#,
        r#"{"windowBars":"45"}"#,
    ] {
        assert!(matches!(WidgetConfig::from_json(json), Err(ChartError::InvalidConfig(_))), "{json}");
    }
}

#[test]
fn config_survives_json() {
    let config = WidgetConfig { symbol: "IWM".to_string(), band_width: 2.5, ..WidgetConfig::default() };
    let back = WidgetConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(back, config);
}
