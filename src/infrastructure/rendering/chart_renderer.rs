//! Draws the price, momentum and trend panels onto any [`Painter`].
//!
//! Indicators arrive computed over the full series; every lookup here goes
//! through `slice.start + i` so overlays stay aligned with the visible bars.

use std::sync::Arc;

use super::painter::{Painter, Surface, stroke_polyline, stroke_segment};
use super::transform::{EPSILON, PanelLayout, PanelTransform, price_domain};
use crate::domain::chart::{Annotation, ChartTheme, Color, IndicatorToggles, PanelKind, PendingPoint, Tooltip};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Bar, IndicatorSeries, IndicatorValue, MacdParams, RegimeTier, Series, Symbol};
use crate::log_debug;
use crate::time_utils::format_time_label;
use crate::view_state::SliceRange;

/// Bars above which geometry is computed on the rayon pool
pub const PARALLEL_THRESHOLD: usize = 100;

/// Share of the price panel height used by the volume histogram
const VOLUME_SHARE: f64 = 0.2;
const BODY_SHARE: f64 = 0.6;
const LEGEND_LINE: f64 = 14.0;
/// Rough glyph advance used to size boxes around text
const CHAR_WIDTH: f64 = 7.0;
const GRID_LEVELS: usize = 4;
const TIME_LABELS: usize = 5;

/// Cached indicator results for the current symbol and series version.
#[derive(Debug, Clone, Default)]
pub struct Overlays {
    /// `(period, line)` per enabled moving average
    pub sma: Vec<(usize, Arc<IndicatorValue>)>,
    /// `(period, width, bands)`
    pub bands: Option<(usize, f64, Arc<IndicatorValue>)>,
    pub regime: Option<Arc<IndicatorValue>>,
    pub rsi: Option<(usize, Arc<IndicatorValue>)>,
    pub macd: Option<(MacdParams, Arc<IndicatorValue>)>,
}

/// A comparison symbol normalized onto the primary's price axis.
///
/// `values` already covers the visible slice only.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareLine {
    pub symbol: Symbol,
    pub values: IndicatorSeries,
    pub color: Color,
}

/// Hover state resolved by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct Crosshair {
    pub tooltip: Tooltip,
    /// Horizontal guide in the price panel, when the pointer is over it
    pub price_y: Option<f64>,
}

/// Everything one redraw needs, borrowed from the controller.
pub struct ChartFrame<'a> {
    pub symbol: &'a Symbol,
    pub series: &'a Series,
    pub slice: SliceRange,
    pub zoom: f64,
    pub toggles: IndicatorToggles,
    pub overlays: &'a Overlays,
    pub compares: &'a [CompareLine],
    pub annotations: &'a [Annotation],
    pub pending: Option<PendingPoint>,
    pub crosshair: Option<&'a Crosshair>,
    pub theme: &'a ChartTheme,
}

impl ChartFrame<'_> {
    fn visible_bars(&self) -> &[Bar] {
        self.series.bars().get(self.slice.as_range()).unwrap_or(&[])
    }

    fn at(&self, values: &[Option<f64>], i: usize) -> Option<f64> {
        values.get(self.slice.start + i).copied().flatten()
    }
}

/// The three stacked surfaces of one widget.
#[derive(Debug, Clone, Default)]
pub struct PanelSurfaces<S> {
    pub price: S,
    pub momentum: S,
    pub trend: S,
}

impl<S> PanelSurfaces<S> {
    pub fn new(price: S, momentum: S, trend: S) -> Self {
        Self { price, momentum, trend }
    }

    pub fn get(&self, panel: PanelKind) -> &S {
        match panel {
            PanelKind::Price => &self.price,
            PanelKind::Momentum => &self.momentum,
            PanelKind::Trend => &self.trend,
        }
    }
}

impl<S: Surface> PanelSurfaces<S> {
    pub fn resize(&mut self, layout: &PanelLayout, device_pixel_ratio: f64) {
        self.price.resize(layout.width, layout.price_height, device_pixel_ratio);
        self.momentum.resize(layout.width, layout.momentum_height, device_pixel_ratio);
        self.trend.resize(layout.width, layout.trend_height, device_pixel_ratio);
    }
}

/// Price axis of the visible slice
pub fn price_transform(series: &Series, slice: SliceRange, width: f64, height: f64) -> PanelTransform {
    let (low, high) = series.price_range(slice.as_range()).unwrap_or((0.0, 1.0));
    PanelTransform::new(width, height, slice.len(), price_domain(low, high))
}

pub fn momentum_transform(slice: SliceRange, width: f64, height: f64) -> PanelTransform {
    PanelTransform::new(width, height, slice.len(), (0.0, 100.0))
}

pub fn trend_transform(slice: SliceRange, width: f64, height: f64) -> PanelTransform {
    PanelTransform::new(width, height, slice.len(), (-1.0, 1.0))
}

pub fn render_all<S: Painter>(surfaces: &mut PanelSurfaces<S>, frame: &ChartFrame<'_>) {
    log_debug!(
        LogComponent::Infrastructure("ChartRenderer"),
        "Rendering {} bars of {} (parallel: {})",
        frame.slice.len(),
        frame.symbol,
        cfg!(feature = "parallel") && frame.slice.len() >= PARALLEL_THRESHOLD
    );
    render_price(&mut surfaces.price, frame);
    render_momentum(&mut surfaces.momentum, frame);
    render_trend(&mut surfaces.trend, frame);
}

/// Precomputed pixel geometry of one bar
#[derive(Debug, Clone, Copy, PartialEq)]
struct BarGeometry {
    x: f64,
    high_y: f64,
    low_y: f64,
    open_y: f64,
    close_y: f64,
    bullish: bool,
}

impl BarGeometry {
    fn new(index: usize, bar: &Bar, t: &PanelTransform) -> Self {
        Self {
            x: t.x(index),
            high_y: t.y(bar.high),
            low_y: t.y(bar.low),
            open_y: t.y(bar.open),
            close_y: t.y(bar.close),
            bullish: bar.is_bullish(),
        }
    }
}

fn bar_geometry(bars: &[Bar], t: &PanelTransform) -> Vec<BarGeometry> {
    #[cfg(feature = "parallel")]
    {
        if bars.len() >= PARALLEL_THRESHOLD {
            use rayon::prelude::*;
            return bars.par_iter().enumerate().map(|(i, bar)| BarGeometry::new(i, bar, t)).collect();
        }
    }
    bars.iter().enumerate().map(|(i, bar)| BarGeometry::new(i, bar, t)).collect()
}

fn line_points<'a>(
    frame: &'a ChartFrame<'_>,
    values: &'a [Option<f64>],
    t: &'a PanelTransform,
) -> impl Iterator<Item = Option<(f64, f64)>> + 'a {
    (0..frame.slice.len()).map(move |i| frame.at(values, i).map(|v| (t.x(i), t.y(v))))
}

fn draw_line<P: Painter + ?Sized>(painter: &mut P, color: Color, width: f64, points: impl Iterator<Item = Option<(f64, f64)>>) {
    painter.set_stroke(color);
    painter.set_line_width(width);
    stroke_polyline(painter, points);
}

fn draw_legend<P: Painter + ?Sized>(painter: &mut P, entries: &[(String, Color)]) {
    for (k, (text, color)) in entries.iter().enumerate() {
        painter.set_fill(*color);
        painter.fill_text(text, 8.0, LEGEND_LINE * (k as f64 + 1.0));
    }
}

fn draw_crosshair_column<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>, t: &PanelTransform) {
    if let Some(crosshair) = frame.crosshair {
        let x = t.x(crosshair.tooltip.index);
        painter.set_stroke(frame.theme.crosshair);
        painter.set_line_width(1.0);
        stroke_segment(painter, (x, 0.0), (x, t.height));
    }
}

fn draw_empty<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>, label: &str) {
    painter.set_fill(frame.theme.text);
    painter.fill_text(label, 8.0, LEGEND_LINE);
}

pub fn render_price<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>) {
    let theme = frame.theme;
    painter.clear(theme.background);

    let bars = frame.visible_bars();
    if bars.is_empty() {
        draw_empty(painter, frame, &format!("{}  no data", frame.symbol));
        return;
    }

    let (w, h) = (painter.width(), painter.height());
    let t = price_transform(frame.series, frame.slice, w, h);
    let spacing = t.bar_spacing();

    painter.set_stroke(theme.grid);
    painter.set_line_width(1.0);
    for level in 1..=GRID_LEVELS {
        let y = h * level as f64 / (GRID_LEVELS + 1) as f64;
        stroke_segment(painter, (0.0, y), (w, y));
    }

    if let Some(tiers) = frame.overlays.regime.as_deref().and_then(IndicatorValue::as_regime) {
        draw_regime(painter, frame, tiers, &t);
    }

    if frame.toggles.volume {
        let max_volume = frame.series.max_volume(frame.slice.as_range());
        if max_volume > 0.0 {
            let band = h * VOLUME_SHARE;
            let width = (spacing * BODY_SHARE).max(1.0);
            painter.set_fill(theme.volume);
            for (i, bar) in bars.iter().enumerate() {
                let bar_h = bar.volume / max_volume * band;
                painter.fill_rect(t.x(i) - width / 2.0, h - bar_h, width, bar_h);
            }
        }
    }

    let body_width = (spacing * BODY_SHARE).max(1.0);
    painter.set_line_width(1.0);
    for geometry in bar_geometry(bars, &t) {
        painter.set_stroke(theme.wick);
        stroke_segment(painter, (geometry.x, geometry.high_y), (geometry.x, geometry.low_y));
        painter.set_fill(if geometry.bullish { theme.bull } else { theme.bear });
        let top = geometry.open_y.min(geometry.close_y);
        let body_h = (geometry.open_y - geometry.close_y).abs().max(1.0);
        painter.fill_rect(geometry.x - body_width / 2.0, top, body_width, body_h);
    }

    let mut legend = Vec::new();
    if let Some(last) = bars.last() {
        legend.push((format!("{}  {:.2}", frame.symbol, last.close), theme.text));
    }

    for (k, (period, value)) in frame.overlays.sma.iter().enumerate() {
        if let Some(line) = value.as_line() {
            let color = theme.sma[k % theme.sma.len()];
            draw_line(painter, color, 1.5, line_points(frame, line, &t));
            legend.push((format!("SMA {}", period), color));
        }
    }

    if let Some((period, width, value)) = &frame.overlays.bands {
        if let Some(bands) = value.as_bands() {
            draw_line(painter, theme.bands, 1.0, line_points(frame, &bands.upper, &t));
            draw_line(painter, theme.bands.with_alpha(0.5), 1.0, line_points(frame, &bands.mid, &t));
            draw_line(painter, theme.bands, 1.0, line_points(frame, &bands.lower, &t));
            legend.push((format!("BB {},{}", period, width), theme.bands));
        }
    }

    if frame.toggles.vwap {
        let points = bars.iter().enumerate().map(|(i, bar)| Some((t.x(i), t.y(bar.vwap))));
        draw_line(painter, theme.vwap, 1.5, points);
        legend.push(("VWAP".to_string(), theme.vwap));
    }

    for compare in frame.compares {
        let points = compare.values.iter().enumerate().map(|(i, v)| v.map(|v| (t.x(i), t.y(v))));
        draw_line(painter, compare.color, 1.5, points);
        legend.push((compare.symbol.to_string(), compare.color));
    }

    draw_annotations(painter, frame, &t);

    draw_legend(painter, &legend);
    draw_axes(painter, frame, &t);

    if let Some(crosshair) = frame.crosshair {
        draw_crosshair_column(painter, frame, &t);
        if let Some(y) = crosshair.price_y {
            stroke_segment(painter, (0.0, y), (w, y));
        }
        draw_tooltip(painter, frame.theme, crosshair, &t);
    }
}

fn draw_regime<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>, tiers: &[Option<RegimeTier>], t: &PanelTransform) {
    let len = frame.slice.len();
    let half = t.bar_spacing() / 2.0;
    let tier_at = |i: usize| tiers.get(frame.slice.start + i).copied().flatten();

    let mut i = 0;
    while i < len {
        let Some(tier) = tier_at(i) else {
            i += 1;
            continue;
        };
        let mut j = i;
        while j + 1 < len && tier_at(j + 1) == Some(tier) {
            j += 1;
        }
        let left = (t.x(i) - half).max(0.0);
        let right = (t.x(j) + half).min(t.width);
        painter.set_fill(match tier {
            RegimeTier::Calm => frame.theme.regime_calm,
            RegimeTier::Normal => frame.theme.regime_normal,
            RegimeTier::Volatile => frame.theme.regime_volatile,
        });
        painter.fill_rect(left, 0.0, right - left, t.height);
        i = j + 1;
    }
}

fn draw_annotations<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>, t: &PanelTransform) {
    let len = frame.slice.len();
    painter.set_stroke(frame.theme.annotation);
    painter.set_line_width(1.5);
    for a in frame.annotations {
        // Slice-relative anchors outside the current slice are not drawn.
        if a.i1 >= len || a.i2 >= len {
            continue;
        }
        stroke_segment(painter, (t.x(a.i1), t.y(a.p1)), (t.x(a.i2), t.y(a.p2)));
    }
    if let Some(pending) = frame.pending {
        if pending.index < len {
            painter.set_fill(frame.theme.annotation);
            painter.arc(t.x(pending.index), t.y(pending.price), 3.0);
        }
    }
}

fn draw_axes<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>, t: &PanelTransform) {
    let (w, h) = (t.width, t.height);
    painter.set_fill(frame.theme.text);
    for level in 1..=GRID_LEVELS {
        let y = h * level as f64 / (GRID_LEVELS + 1) as f64;
        let label = format!("{:.2}", t.value_at(y));
        painter.fill_text(&label, w - CHAR_WIDTH * label.len() as f64 - 4.0, y - 2.0);
    }

    let len = frame.slice.len();
    let step = (len / TIME_LABELS).max(1);
    for i in (0..len).step_by(step) {
        if let Some(bar) = frame.series.get(frame.slice.start + i) {
            painter.fill_text(&format_time_label(bar.time.value(), frame.zoom), t.x(i) + 2.0, h - 4.0);
        }
    }
}

fn draw_tooltip<P: Painter + ?Sized>(painter: &mut P, theme: &ChartTheme, crosshair: &Crosshair, t: &PanelTransform) {
    let lines = crosshair.tooltip.lines();
    let box_w = lines.iter().map(|l| l.len()).max().unwrap_or(0) as f64 * CHAR_WIDTH + 12.0;
    let box_h = lines.len() as f64 * LEGEND_LINE + 8.0;
    let x = t.x(crosshair.tooltip.index);
    let left = if x + 12.0 + box_w > t.width { (x - 12.0 - box_w).max(0.0) } else { x + 12.0 };
    let top = 8.0;

    painter.set_fill(theme.background.with_alpha(0.85));
    painter.fill_rect(left, top, box_w, box_h);
    painter.set_fill(theme.text);
    for (k, line) in lines.iter().enumerate() {
        painter.fill_text(line, left + 6.0, top + LEGEND_LINE * (k as f64 + 1.0));
    }
}

pub fn render_momentum<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>) {
    let theme = frame.theme;
    painter.clear(theme.background);
    let t = momentum_transform(frame.slice, painter.width(), painter.height());

    painter.set_stroke(theme.grid);
    painter.set_line_width(1.0);
    for level in [30.0, 50.0, 70.0] {
        let y = t.y(level);
        stroke_segment(painter, (0.0, y), (t.width, y));
    }

    let mut legend = Vec::new();
    if let Some((period, value)) = &frame.overlays.rsi {
        if let Some(line) = value.as_line() {
            draw_line(painter, theme.rsi, 1.5, line_points(frame, line, &t));
            let latest = (0..frame.slice.len()).rev().find_map(|i| frame.at(line, i));
            legend.push(match latest {
                Some(v) => (format!("RSI {}  {:.1}", period, v), theme.rsi),
                None => (format!("RSI {}", period), theme.rsi),
            });
        }
    }

    draw_legend(painter, &legend);
    painter.set_fill(theme.text);
    for level in [30.0, 50.0, 70.0] {
        painter.fill_text(&format!("{}", level), t.width - 3.0 * CHAR_WIDTH, t.y(level) - 2.0);
    }
    draw_crosshair_column(painter, frame, &t);
}

/// Largest histogram magnitude inside the slice, floored at [`EPSILON`]
fn trend_peak(frame: &ChartFrame<'_>, histogram: &[Option<f64>]) -> f64 {
    (0..frame.slice.len())
        .filter_map(|i| frame.at(histogram, i))
        .fold(EPSILON, |peak, v| peak.max(v.abs()))
}

/// Points of a line scaled by `peak` and clipped to the `[-1, 1]` trend domain
fn clipped_trend_points<'a>(
    frame: &'a ChartFrame<'_>,
    values: &'a [Option<f64>],
    t: &'a PanelTransform,
    peak: f64,
) -> impl Iterator<Item = Option<(f64, f64)>> + 'a {
    (0..frame.slice.len()).map(move |i| frame.at(values, i).map(|v| (t.x(i), t.y((v / peak).clamp(-1.0, 1.0)))))
}

pub fn render_trend<P: Painter + ?Sized>(painter: &mut P, frame: &ChartFrame<'_>) {
    let theme = frame.theme;
    painter.clear(theme.background);
    let t = trend_transform(frame.slice, painter.width(), painter.height());
    let zero = t.y(0.0);

    painter.set_stroke(theme.grid);
    painter.set_line_width(1.0);
    stroke_segment(painter, (0.0, zero), (t.width, zero));

    let mut legend = Vec::new();
    if let Some((params, value)) = &frame.overlays.macd {
        if let Some(out) = value.as_macd() {
            let peak = trend_peak(frame, &out.histogram);
            let width = (t.bar_spacing() * BODY_SHARE).max(1.0);
            for i in 0..frame.slice.len() {
                if let Some(v) = frame.at(&out.histogram, i) {
                    let y = t.y(v / peak);
                    painter.set_fill(if v >= 0.0 { theme.bull } else { theme.bear });
                    painter.fill_rect(t.x(i) - width / 2.0, y.min(zero), width, (y - zero).abs());
                }
            }
            draw_line(painter, theme.macd, 1.5, clipped_trend_points(frame, &out.macd, &t, peak));
            draw_line(painter, theme.signal, 1.5, clipped_trend_points(frame, &out.signal, &t, peak));
            legend.push((format!("MACD {},{},{}", params.fast, params.slow, params.signal), theme.macd));
        }
    }

    draw_legend(painter, &legend);
    draw_crosshair_column(painter, frame, &t);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::{MacdOutput, Ohlcv, Timestamp};
    use crate::infrastructure::rendering::painter::{DrawCommand, RecordingPainter};

    fn series(n: usize) -> Series {
        Series::from_ohlcv((0..n).map(|i| {
            let base = 100.0 + i as f64;
            Ohlcv::new(Timestamp::from(i as u64 * 86_400_000), base, base + 2.0, base - 2.0, base + 1.0, 1_000.0)
        }))
        .unwrap()
    }

    #[test]
    fn regime_runs_collapse_into_one_rect_per_tier_change() {
        let s = series(10);
        let symbol = Symbol::new("AAA").unwrap();
        let tiers = vec![
            None,
            Some(RegimeTier::Calm),
            Some(RegimeTier::Calm),
            Some(RegimeTier::Volatile),
            Some(RegimeTier::Volatile),
            Some(RegimeTier::Volatile),
            Some(RegimeTier::Calm),
            Some(RegimeTier::Calm),
            Some(RegimeTier::Calm),
            Some(RegimeTier::Calm),
        ];
        let overlays = Overlays { regime: Some(Arc::new(IndicatorValue::Regime(tiers))), ..Overlays::default() };
        let theme = ChartTheme::dark();
        let frame = ChartFrame {
            symbol: &symbol,
            series: &s,
            slice: SliceRange { start: 0, end: 10 },
            zoom: 1.0,
            toggles: IndicatorToggles::none(),
            overlays: &overlays,
            compares: &[],
            annotations: &[],
            pending: None,
            crosshair: None,
            theme: &theme,
        };
        let mut painter = RecordingPainter::new(90.0, 100.0);
        let transform = price_transform(&s, frame.slice, 90.0, 100.0);
        let tiers = overlays.regime.as_ref().unwrap().as_regime().unwrap();
        draw_regime(&mut painter, &frame, tiers, &transform);
        let rects = painter.commands().iter().filter(|c| matches!(c, DrawCommand::FillRect { .. })).count();
        assert_eq!(rects, 3);
    }

    #[test]
    fn trend_scale_follows_histogram_peak() {
        let s = series(10);
        let symbol = Symbol::new("AAA").unwrap();
        let histogram = (0..10).map(|i| Some(if i == 4 { 0.1 } else { 0.02 })).collect();
        let out = MacdOutput { macd: vec![Some(2.0); 10], signal: vec![Some(-1.9); 10], histogram };
        let overlays = Overlays {
            macd: Some((MacdParams::default(), Arc::new(IndicatorValue::Macd(out)))),
            ..Overlays::default()
        };
        let theme = ChartTheme::dark();
        let frame = ChartFrame {
            symbol: &symbol,
            series: &s,
            slice: SliceRange { start: 0, end: 10 },
            zoom: 1.0,
            toggles: IndicatorToggles::default(),
            overlays: &overlays,
            compares: &[],
            annotations: &[],
            pending: None,
            crosshair: None,
            theme: &theme,
        };
        let mut painter = RecordingPainter::new(90.0, 100.0);
        render_trend(&mut painter, &frame);

        let tallest = painter
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillRect { h, .. } => Some(*h),
                _ => None,
            })
            .fold(0.0, f64::max);
        assert!((tallest - 50.0).abs() < 1e-6, "tallest bar {tallest}");

        for c in painter.commands() {
            if let DrawCommand::MoveTo { y, .. } | DrawCommand::LineTo { y, .. } = c {
                assert!((0.0..=100.0).contains(y), "line leaves panel at y = {y}");
            }
        }
    }
}
