use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

use crate::domain::market_data::{Bar, Timestamp};
use crate::time_utils::format_bar_time;

/// Value Object - one of the three stacked panels
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum PanelKind {
    #[display(fmt = "Price")]
    #[strum(serialize = "price")]
    Price,
    #[display(fmt = "Momentum")]
    #[strum(serialize = "momentum")]
    Momentum,
    #[display(fmt = "Trend")]
    #[strum(serialize = "trend")]
    Trend,
}

/// Value Object - Color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn to_hex(&self) -> u32 {
        let [r, g, b, _] = self.to_rgba8();
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    pub fn with_alpha(&self, alpha: f32) -> Self {
        Self { a: alpha, ..*self }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// CSS `rgba()` string for canvas style setters
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        format!("rgba({},{},{},{:.3})", r, g, b, self.a.clamp(0.0, 1.0))
    }

    /// Rotate the hue by `degrees`, keeping saturation, lightness and alpha.
    pub fn hue_rotate(&self, degrees: f32) -> Self {
        let (h, s, l) = rgb_to_hsl(self.r, self.g, self.b);
        let (r, g, b) = hsl_to_rgb((h + degrees).rem_euclid(360.0), s, l);
        Self::new(r, g, b, self.a)
    }

    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d.abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }
    let s = d / (1.0 - (2.0 * l - 1.0).abs());
    let h = if max == r {
        60.0 * ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / d + 2.0)
    } else {
        60.0 * ((r - g) / d + 4.0)
    };
    (h, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

/// Color scheme selector in the widget configuration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    #[display(fmt = "dark")]
    #[strum(serialize = "dark")]
    Dark,
    #[display(fmt = "light")]
    #[strum(serialize = "light")]
    Light,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartTheme {
    pub background: Color,
    pub grid: Color,
    pub text: Color,
    pub bull: Color,
    pub bear: Color,
    pub wick: Color,
    pub volume: Color,
    pub sma: [Color; 3],
    pub bands: Color,
    pub vwap: Color,
    pub compare_base: Color,
    pub annotation: Color,
    pub crosshair: Color,
    pub regime_calm: Color,
    pub regime_normal: Color,
    pub regime_volatile: Color,
    pub rsi: Color,
    pub macd: Color,
    pub signal: Color,
}

impl ChartTheme {
    pub fn dark() -> Self {
        Self {
            background: Color::from_hex(0x1a1a1a),
            grid: Color::from_hex(0x3a3f44),
            text: Color::from_hex(0xd0d0d0),
            bull: Color::from_hex(0x00c176),
            bear: Color::from_hex(0xff4d4d),
            wick: Color::from_hex(0x888888),
            volume: Color::from_hex(0x4a90e2).with_alpha(0.35),
            sma: [Color::from_hex(0xf5a623), Color::from_hex(0x7ed6df), Color::from_hex(0xe056fd)],
            bands: Color::from_hex(0x9b9b9b),
            vwap: Color::from_hex(0xf8e71c),
            compare_base: Color::from_hex(0x4a90e2),
            annotation: Color::from_hex(0xffffff),
            crosshair: Color::from_hex(0xaaaaaa).with_alpha(0.6),
            regime_calm: Color::from_hex(0x2ecc71).with_alpha(0.08),
            regime_normal: Color::from_hex(0xf1c40f).with_alpha(0.08),
            regime_volatile: Color::from_hex(0xe74c3c).with_alpha(0.12),
            rsi: Color::from_hex(0xb388ff),
            macd: Color::from_hex(0x4a90e2),
            signal: Color::from_hex(0xf5a623),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::from_hex(0xffffff),
            grid: Color::from_hex(0xe0e0e0),
            text: Color::from_hex(0x222222),
            wick: Color::from_hex(0x555555),
            annotation: Color::from_hex(0x111111),
            crosshair: Color::from_hex(0x555555).with_alpha(0.6),
            ..Self::dark()
        }
    }

    pub fn for_kind(kind: ThemeKind) -> Self {
        match kind {
            ThemeKind::Dark => Self::dark(),
            ThemeKind::Light => Self::light(),
        }
    }

    /// Line color of the `index`-th comparison symbol
    pub fn compare_color(&self, index: usize) -> Color {
        self.compare_base.hue_rotate(60.0 * (index as f32 + 1.0))
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Which overlays the widget draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorToggles {
    pub sma: bool,
    pub bands: bool,
    pub vwap: bool,
    pub volume: bool,
    pub regime: bool,
    pub rsi: bool,
    pub macd: bool,
}

impl Default for IndicatorToggles {
    fn default() -> Self {
        Self { sma: true, bands: true, vwap: true, volume: true, regime: true, rsi: true, macd: true }
    }
}

impl IndicatorToggles {
    pub fn none() -> Self {
        Self { sma: false, bands: false, vwap: false, volume: false, regime: false, rsi: false, macd: false }
    }
}

/// Bar details shown under the cross-hair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    /// Index inside the visible slice
    pub index: usize,
    /// Index inside the full series
    pub series_index: usize,
    pub time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub change_pct: f64,
}

impl Tooltip {
    pub fn new(index: usize, series_index: usize, bar: &Bar) -> Self {
        Self {
            index,
            series_index,
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            change_pct: bar.change_pct(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format_bar_time(self.time.value()),
            format!("O {:.2}  H {:.2}", self.open, self.high),
            format!("L {:.2}  C {:.2}", self.low, self.close),
            format!("Vol {:.0}  {:+.2}%", self.volume, self.change_pct),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(Color::from_hex(0x4a90e2).to_hex(), 0x4a90e2);
    }

    #[test]
    fn full_hue_turn_is_identity() {
        let c = Color::from_hex(0x4a90e2);
        let back = c.hue_rotate(360.0);
        assert_eq!(back.to_rgba8(), c.to_rgba8());
    }

    #[test]
    fn compare_colors_differ_per_index() {
        let theme = ChartTheme::dark();
        assert_ne!(theme.compare_color(0).to_rgba8(), theme.compare_color(1).to_rgba8());
    }

    #[test]
    fn css_string_uses_bytes() {
        assert_eq!(Color::from_hex(0xff0000).to_css(), "rgba(255,0,0,1.000)");
    }
}
