use crate::domain::chart::PanelKind;

/// Guard added to every value range so flat data never divides by zero
pub const EPSILON: f64 = 1e-9;
/// Fraction of the price range added above and below the bars
pub const PRICE_PADDING: f64 = 0.08;

/// Share of the total height taken by each panel
pub const PRICE_SHARE: f64 = 0.6;
pub const MOMENTUM_SHARE: f64 = 0.2;
pub const TREND_SHARE: f64 = 0.2;

/// Maps slice indices and values to panel pixels and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelTransform {
    pub width: f64,
    pub height: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub slice_len: usize,
}

impl PanelTransform {
    pub fn new(width: f64, height: f64, slice_len: usize, (y_min, y_max): (f64, f64)) -> Self {
        Self { width, height, y_min, y_max, slice_len }
    }

    fn last_index(&self) -> f64 {
        self.slice_len.saturating_sub(1).max(1) as f64
    }

    pub fn x(&self, index: usize) -> f64 {
        index as f64 * self.width / self.last_index()
    }

    pub fn y(&self, value: f64) -> f64 {
        self.height - (value - self.y_min) / (self.y_max - self.y_min + EPSILON) * self.height
    }

    /// Horizontal distance between neighbouring bars
    pub fn bar_spacing(&self) -> f64 {
        self.width / self.last_index()
    }

    /// Nearest slice index under `x`; `None` for an empty slice.
    pub fn index_at(&self, x: f64) -> Option<usize> {
        if self.slice_len == 0 || !x.is_finite() {
            return None;
        }
        if self.width <= 0.0 {
            return Some(0);
        }
        let last = self.slice_len - 1;
        let raw = (x / self.width * last as f64).round();
        Some(raw.clamp(0.0, last as f64) as usize)
    }

    pub fn value_at(&self, y: f64) -> f64 {
        if self.height <= 0.0 {
            return self.y_min;
        }
        self.y_min + (self.height - y) / self.height * (self.y_max - self.y_min + EPSILON)
    }
}

/// Price axis for bars spanning `low..high`, padded on both sides.
pub fn price_domain(low: f64, high: f64) -> (f64, f64) {
    let range = high - low;
    let pad = if range > EPSILON { range * PRICE_PADDING } else { high.abs().max(1.0) * 0.01 };
    (low - pad, high + pad)
}

/// Panel sizes in logical pixels for a widget of `width × height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    pub width: f64,
    pub price_height: f64,
    pub momentum_height: f64,
    pub trend_height: f64,
}

impl PanelLayout {
    pub fn split(width: f64, height: f64) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        let price_height = (height * PRICE_SHARE).floor();
        let momentum_height = (height * MOMENTUM_SHARE).floor();
        Self {
            width,
            price_height,
            momentum_height,
            trend_height: (height - price_height - momentum_height).max(0.0),
        }
    }

    pub fn height_of(&self, panel: PanelKind) -> f64 {
        match panel {
            PanelKind::Price => self.price_height,
            PanelKind::Momentum => self.momentum_height,
            PanelKind::Trend => self.trend_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trip_on_last_bar() {
        let t = PanelTransform::new(500.0, 300.0, 50, (0.0, 1.0));
        assert_eq!(t.index_at(t.x(49)), Some(49));
        assert_eq!(t.index_at(-30.0), Some(0));
        assert_eq!(t.index_at(10_000.0), Some(49));
    }

    #[test]
    fn empty_slice_has_no_index() {
        let t = PanelTransform::new(500.0, 300.0, 0, (0.0, 1.0));
        assert_eq!(t.index_at(10.0), None);
    }

    #[test]
    fn value_at_inverts_y() {
        let t = PanelTransform::new(400.0, 200.0, 10, (90.0, 110.0));
        let y = t.y(101.5);
        assert!((t.value_at(y) - 101.5).abs() < 1e-6);
    }

    #[test]
    fn flat_prices_get_a_band() {
        let (lo, hi) = price_domain(100.0, 100.0);
        assert!(lo < 100.0 && hi > 100.0);
    }

    #[test]
    fn layout_splits_sixty_twenty_twenty() {
        let layout = PanelLayout::split(800.0, 500.0);
        assert_eq!(layout.price_height, 300.0);
        assert_eq!(layout.momentum_height, 100.0);
        assert_eq!(layout.trend_height, 100.0);
    }
}
