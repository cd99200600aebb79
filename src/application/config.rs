use serde::{Deserialize, Serialize};

use crate::domain::chart::{IndicatorToggles, ThemeKind};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::market_data::{MacdParams, RegimeThresholds, Symbol, WindowBars};

pub const DEFAULT_SYMBOL: &str = "DEMO";

/// Host-supplied widget configuration (camelCase JSON).
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub symbol: String,
    pub compare_symbols: Vec<String>,
    pub window_bars: WindowBars,
    pub indicator_toggles: IndicatorToggles,
    pub sma_periods: Vec<usize>,
    pub band_period: usize,
    pub band_width: f64,
    pub rsi_period: usize,
    pub macd: MacdParams,
    pub atr_period: usize,
    pub regime: RegimeThresholds,
    pub theme: ThemeKind,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            compare_symbols: Vec::new(),
            window_bars: WindowBars::default(),
            indicator_toggles: IndicatorToggles::default(),
            sma_periods: vec![20, 50],
            band_period: 20,
            band_width: 2.0,
            rsi_period: 14,
            macd: MacdParams::default(),
            atr_period: 14,
            regime: RegimeThresholds::default(),
            theme: ThemeKind::default(),
        }
    }
}

impl WidgetConfig {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ChartResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> ChartResult<()> {
        let invalid = |msg: &str| Err(ChartError::InvalidConfig(msg.to_string()));

        self.primary_symbol()?;
        if self.sma_periods.contains(&0) {
            return invalid("smaPeriods must be positive");
        }
        if self.band_period == 0 || self.rsi_period == 0 || self.atr_period == 0 {
            return invalid("periods must be positive");
        }
        if !self.band_width.is_finite() || self.band_width <= 0.0 {
            return invalid("bandWidth must be a positive number");
        }
        let macd = self.macd;
        if macd.fast == 0 || macd.signal == 0 || macd.fast >= macd.slow {
            return invalid("macd needs 0 < fast < slow and signal > 0");
        }
        let regime = self.regime;
        if !(regime.low.is_finite() && regime.high.is_finite()) || regime.low < 0.0 || regime.low >= regime.high {
            return invalid("regime needs 0 <= low < high");
        }
        Ok(())
    }

    pub fn primary_symbol(&self) -> ChartResult<Symbol> {
        Symbol::new(&self.symbol)
    }

    /// Valid comparison symbols in order, without duplicates
    pub fn compare_list(&self) -> Vec<Symbol> {
        Symbol::parse_list(&self.compare_symbols.join(","))
    }
}
