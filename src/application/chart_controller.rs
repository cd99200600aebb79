//! Interaction controller: owns the view state, annotation store and series
//! cache of one widget and turns pointer/keyboard input into state changes.
//!
//! Handlers never draw. They flag the chart dirty and the host pulls a frame
//! with [`ChartController::request_redraw`].

use std::str::FromStr;
use std::sync::Arc;

use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::config::WidgetConfig;
use crate::domain::chart::{
    Annotation, AnnotationStore, ChartTheme, IndicatorToggles, PanelKind, PendingPoint, Tooltip,
};
use crate::domain::errors::ChartResult;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    IndicatorCache, IndicatorKind, IndicatorValue, MacdParams, Series, SeriesSource, SeriesStore, Symbol,
    WindowBars, bollinger, macd, normalized_overlay, rsi, sma, volatility_regime,
};
use crate::infrastructure::rendering::chart_renderer::{
    self, ChartFrame, CompareLine, Crosshair, Overlays, PanelSurfaces,
};
use crate::infrastructure::rendering::export;
use crate::infrastructure::rendering::transform::{PanelLayout, PanelTransform};
use crate::infrastructure::rendering::{PixelSurface, Surface};
use crate::infrastructure::synthetic::SyntheticSeriesSource;
use crate::view_state::{PAN_STEP_BARS, SliceRange, ViewState, slice_window};
use crate::{log_debug, log_info, log_warn};

/// Zoom factor per wheel notch away from the user
pub const WHEEL_ZOOM_OUT: f64 = 1.1;
/// Zoom factor per wheel notch toward the user
pub const WHEEL_ZOOM_IN: f64 = 0.9;
/// Pointer travel (px) below which a press and release is a click
pub const CLICK_SLOP: f64 = 3.0;

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 500.0;

pub type AnnotationCallback = Box<dyn FnMut(&[Annotation])>;
pub type SymbolCallback = Box<dyn FnMut(&Symbol)>;
pub type CompareCallback = Box<dyn FnMut(&[Symbol])>;

/// Keys the chart reacts to, named as in `KeyboardEvent.key`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    origin_x: f64,
    origin_y: f64,
    start_offset: usize,
    moved: bool,
}

/// MACD has three periods; they share the cache's single period slot.
/// Periods below 1000 pack without collisions.
fn macd_cache_period(params: MacdParams) -> usize {
    params
        .fast
        .saturating_mul(1_000_000)
        .saturating_add(params.slow.saturating_mul(1_000))
        .saturating_add(params.signal)
}

pub struct ChartController<S: SeriesSource = SyntheticSeriesSource> {
    config: WidgetConfig,
    theme: ChartTheme,
    symbol: Symbol,
    compare: Vec<Symbol>,
    store: SeriesStore<S>,
    cache: IndicatorCache,
    view: ViewState,
    annotations: AnnotationStore,
    annotate_mode: bool,
    pending: Option<PendingPoint>,
    crosshair: Option<Crosshair>,
    drag: Option<DragState>,
    layout: PanelLayout,
    device_pixel_ratio: f64,
    needs_resize: bool,
    dirty: bool,
    on_annotation_change: Option<AnnotationCallback>,
    on_symbol_change: Option<SymbolCallback>,
    on_compare_change: Option<CompareCallback>,
}

impl ChartController<SyntheticSeriesSource> {
    pub fn new(config: WidgetConfig) -> ChartResult<Self> {
        Self::with_source(config, SyntheticSeriesSource::default())
    }
}

impl<S: SeriesSource> ChartController<S> {
    pub fn with_source(config: WidgetConfig, source: S) -> ChartResult<Self> {
        config.validate()?;
        let symbol = config.primary_symbol()?;
        let mut store = SeriesStore::new(source);
        store.ensure(&symbol)?;

        let mut controller = Self {
            theme: ChartTheme::for_kind(config.theme),
            view: ViewState::new(config.window_bars),
            symbol,
            compare: Vec::new(),
            store,
            cache: IndicatorCache::new(),
            annotations: AnnotationStore::new(),
            annotate_mode: false,
            pending: None,
            crosshair: None,
            drag: None,
            layout: PanelLayout::split(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            device_pixel_ratio: 1.0,
            needs_resize: true,
            dirty: true,
            on_annotation_change: None,
            on_symbol_change: None,
            on_compare_change: None,
            config,
        };
        let compare = controller.config.compare_list();
        controller.compare = controller.ensure_compare(compare);

        log_info!(
            LogComponent::Application("ChartController"),
            "Mounted {} (compare: {}, window: {})",
            controller.symbol,
            controller.compare.len(),
            controller.view.window()
        );
        Ok(controller)
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn theme(&self) -> &ChartTheme {
        &self.theme
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn compare_symbols(&self) -> &[Symbol] {
        &self.compare
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.annotations.items()
    }

    pub fn pending(&self) -> Option<PendingPoint> {
        self.pending
    }

    pub fn annotate_mode(&self) -> bool {
        self.annotate_mode
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.crosshair.as_ref().map(|c| &c.tooltip)
    }

    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn store(&self) -> &SeriesStore<S> {
        &self.store
    }

    pub fn indicator_cache(&self) -> &IndicatorCache {
        &self.cache
    }

    pub fn series(&self) -> Arc<Series> {
        self.store.get(&self.symbol).unwrap_or_default()
    }

    pub fn slice(&self) -> SliceRange {
        slice_window(self.series().len(), &self.view)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn dirty_if(&mut self, changed: bool) -> bool {
        if changed {
            self.mark_dirty();
        }
        changed
    }

    pub fn on_annotation_change(&mut self, callback: impl FnMut(&[Annotation]) + 'static) {
        self.on_annotation_change = Some(Box::new(callback));
    }

    pub fn on_symbol_change(&mut self, callback: impl FnMut(&Symbol) + 'static) {
        self.on_symbol_change = Some(Box::new(callback));
    }

    pub fn on_compare_change(&mut self, callback: impl FnMut(&[Symbol]) + 'static) {
        self.on_compare_change = Some(Box::new(callback));
    }

    fn notify_annotations(&mut self) {
        if let Some(callback) = self.on_annotation_change.as_mut() {
            callback(self.annotations.items());
        }
    }

    fn transform(&self, panel: PanelKind, series: &Series, slice: SliceRange) -> PanelTransform {
        let (width, height) = (self.layout.width, self.layout.height_of(panel));
        match panel {
            PanelKind::Price => chart_renderer::price_transform(series, slice, width, height),
            PanelKind::Momentum => chart_renderer::momentum_transform(slice, width, height),
            PanelKind::Trend => chart_renderer::trend_transform(slice, width, height),
        }
    }

    fn max_offset(&self) -> usize {
        self.view.max_offset(self.series().len())
    }

    /// Resolve the bar under the pointer and show its tooltip.
    pub fn on_hover(&mut self, panel: PanelKind, x: f64, y: f64) -> Option<Tooltip> {
        let series = self.series();
        let slice = self.slice();
        let resolved = self
            .transform(panel, &series, slice)
            .index_at(x)
            .and_then(|index| {
                let series_index = slice.to_series_index(index)?;
                series.get(series_index).map(|bar| Tooltip::new(index, series_index, bar))
            });

        let Some(tooltip) = resolved else {
            self.on_leave();
            return None;
        };
        let next = Crosshair { tooltip: tooltip.clone(), price_y: (panel == PanelKind::Price).then_some(y) };
        let changed = self.crosshair.as_ref() != Some(&next);
        self.crosshair = Some(next);
        self.dirty_if(changed);
        Some(tooltip)
    }

    pub fn on_leave(&mut self) -> bool {
        self.drag = None;
        let had = self.crosshair.take().is_some();
        self.dirty_if(had)
    }

    pub fn on_wheel(&mut self, delta_y: f64) -> bool {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return false;
        }
        let before = self.view.clone();
        self.view.zoom_by(if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN });
        let max_offset = self.max_offset();
        self.view.set_offset(self.view.offset(), max_offset);
        log_debug!(LogComponent::Application("ChartController"), "zoom {:.3}", self.view.zoom());
        let changed = self.view != before;
        self.dirty_if(changed)
    }

    pub fn on_key(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowLeft => self.pan(PAN_STEP_BARS as i64),
            Key::ArrowRight => self.pan(-(PAN_STEP_BARS as i64)),
            Key::Escape => {
                let changed = self.annotate_mode || self.pending.is_some();
                self.annotate_mode = false;
                self.pending = None;
                self.dirty_if(changed)
            }
        }
    }

    /// `KeyboardEvent.key` entry point; unknown keys are ignored.
    pub fn on_key_name(&mut self, name: &str) -> bool {
        Key::from_str(name).map(|key| self.on_key(key)).unwrap_or(false)
    }

    /// Move the window by `delta` bars; positive goes back in time.
    pub fn pan(&mut self, delta: i64) -> bool {
        let before = self.view.offset();
        let max_offset = self.max_offset();
        self.view.pan(delta, max_offset);
        let changed = self.view.offset() != before;
        self.dirty_if(changed)
    }

    pub fn on_pointer_down(&mut self, _panel: PanelKind, x: f64, y: f64) -> bool {
        self.drag = Some(DragState { origin_x: x, origin_y: y, start_offset: self.view.offset(), moved: false });
        false
    }

    pub fn on_pointer_move(&mut self, panel: PanelKind, x: f64, y: f64) -> bool {
        let Some(mut drag) = self.drag else {
            let before = self.crosshair.clone();
            self.on_hover(panel, x, y);
            return self.crosshair != before;
        };

        let dx = x - drag.origin_x;
        if !drag.moved && dx.hypot(y - drag.origin_y) > CLICK_SLOP {
            drag.moved = true;
        }
        self.drag = Some(drag);
        if !drag.moved {
            return false;
        }

        // Dragging right reveals older bars.
        let spacing = self.layout.width / self.slice().len().saturating_sub(1).max(1) as f64;
        let bars = if spacing > 0.0 { (dx / spacing).round() as i64 } else { 0 };
        let target = (drag.start_offset as i64).saturating_add(bars).max(0) as usize;
        let before = self.view.offset();
        let max_offset = self.max_offset();
        self.view.set_offset(target, max_offset);
        let changed = self.view.offset() != before;
        self.dirty_if(changed)
    }

    /// Ends a drag; a release without real movement counts as a click.
    pub fn on_pointer_up(&mut self, panel: PanelKind, x: f64, y: f64) -> bool {
        match self.drag.take() {
            Some(drag) if drag.moved => false,
            Some(_) => self.on_click(panel, x, y),
            None => false,
        }
    }

    /// Place annotation endpoints while annotate mode is on.
    pub fn on_click(&mut self, panel: PanelKind, x: f64, y: f64) -> bool {
        if !self.annotate_mode || panel != PanelKind::Price {
            return false;
        }
        if !(0.0..=self.layout.width).contains(&x) || !(0.0..=self.layout.price_height).contains(&y) {
            return false;
        }
        let series = self.series();
        let slice = self.slice();
        let t = self.transform(PanelKind::Price, &series, slice);
        let Some(index) = t.index_at(x) else {
            return false;
        };
        let price = t.value_at(y);

        match self.pending.take() {
            None => self.pending = Some(PendingPoint { index, price }),
            Some(first) => {
                self.annotations.push(first.complete(index, price));
                self.annotate_mode = false;
                log_debug!(
                    LogComponent::Application("ChartController"),
                    "annotation #{} added",
                    self.annotations.len()
                );
                self.notify_annotations();
            }
        }
        self.dirty_if(true)
    }

    pub fn on_resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        self.layout = PanelLayout::split(width, height);
        self.device_pixel_ratio =
            if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        self.needs_resize = true;
        self.dirty_if(true)
    }

    pub fn set_symbol(&mut self, symbol: Symbol) -> ChartResult<bool> {
        if symbol == self.symbol {
            return Ok(false);
        }
        self.store.ensure(&symbol)?;
        log_info!(LogComponent::Application("ChartController"), "symbol {} -> {}", self.symbol, symbol);
        self.symbol = symbol;
        self.cache.retain_symbol(&self.symbol);
        self.compare.retain(|c| *c != self.symbol);
        self.pending = None;
        self.crosshair = None;
        let max_offset = self.max_offset();
        self.view.set_offset(self.view.offset(), max_offset);
        if let Some(callback) = self.on_symbol_change.as_mut() {
            callback(&self.symbol);
        }
        Ok(self.dirty_if(true))
    }

    /// Text-box entry point; blank input is ignored.
    pub fn load_symbol_input(&mut self, text: &str) -> ChartResult<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.set_symbol(Symbol::new(text)?)
    }

    fn ensure_compare(&mut self, symbols: Vec<Symbol>) -> Vec<Symbol> {
        symbols
            .into_iter()
            .filter(|symbol| *symbol != self.symbol)
            .filter(|symbol| match self.store.ensure(symbol) {
                Ok(_) => true,
                Err(err) => {
                    log_warn!(
                        LogComponent::Application("ChartController"),
                        "dropping compare symbol {}: {}",
                        symbol,
                        err
                    );
                    false
                }
            })
            .collect()
    }

    /// Replace the comparison set. Symbols that fail to load are skipped.
    pub fn set_compare_symbols(&mut self, symbols: Vec<Symbol>) -> bool {
        let next = self.ensure_compare(symbols);
        if next == self.compare {
            return false;
        }
        self.compare = next;
        if let Some(callback) = self.on_compare_change.as_mut() {
            callback(&self.compare);
        }
        self.dirty_if(true)
    }

    /// Comma or whitespace separated list; blank input is ignored.
    pub fn load_compare_input(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.set_compare_symbols(Symbol::parse_list(text))
    }

    pub fn set_window(&mut self, window: WindowBars) -> bool {
        if window == self.view.window() {
            return false;
        }
        self.view.set_window(window);
        let max_offset = self.max_offset();
        self.view.set_offset(self.view.offset(), max_offset);
        self.dirty_if(true)
    }

    pub fn set_toggles(&mut self, toggles: IndicatorToggles) -> bool {
        let changed = toggles != self.config.indicator_toggles;
        self.config.indicator_toggles = toggles;
        self.dirty_if(changed)
    }

    pub fn toggle_annotate_mode(&mut self) -> bool {
        self.annotate_mode = !self.annotate_mode;
        if !self.annotate_mode {
            self.pending = None;
        }
        self.dirty_if(true)
    }

    pub fn clear_annotations(&mut self) -> bool {
        self.annotations.clear();
        self.pending = None;
        self.notify_annotations();
        self.dirty_if(true)
    }

    /// Replace the bars of `symbol` with caller-supplied data.
    pub fn load_series(&mut self, symbol: Symbol, series: Series) -> u64 {
        let affects_view = symbol == self.symbol || self.compare.contains(&symbol);
        let version = self.store.insert(symbol, series);
        if affects_view {
            let max_offset = self.max_offset();
            self.view.set_offset(self.view.offset(), max_offset);
            self.crosshair = None;
            self.mark_dirty();
        }
        version
    }

    fn build_overlays(&mut self, series: &Series) -> Overlays {
        let version = self.store.version(&self.symbol).unwrap_or(0);
        let toggles = self.config.indicator_toggles;
        let config = &self.config;
        let symbol = &self.symbol;
        let cache = &mut self.cache;
        let mut overlays = Overlays::default();

        if toggles.sma {
            for &period in &config.sma_periods {
                let value = cache.get_or_compute(symbol, version, IndicatorKind::Sma, period, || {
                    IndicatorValue::Line(sma(&series.closes(), period))
                });
                overlays.sma.push((period, value));
            }
        }
        if toggles.bands {
            let (period, width) = (config.band_period, config.band_width);
            let value = cache.get_or_compute(symbol, version, IndicatorKind::Bands, period, || {
                IndicatorValue::Bands(bollinger(&series.closes(), period, width))
            });
            overlays.bands = Some((period, width, value));
        }
        if toggles.regime {
            let (period, thresholds) = (config.atr_period, config.regime);
            overlays.regime = Some(cache.get_or_compute(symbol, version, IndicatorKind::Regime, period, || {
                IndicatorValue::Regime(volatility_regime(series.bars(), period, thresholds))
            }));
        }
        if toggles.rsi {
            let period = config.rsi_period;
            let value = cache.get_or_compute(symbol, version, IndicatorKind::Rsi, period, || {
                IndicatorValue::Line(rsi(&series.closes(), period))
            });
            overlays.rsi = Some((period, value));
        }
        if toggles.macd {
            let params = config.macd;
            let value = cache.get_or_compute(symbol, version, IndicatorKind::Macd, macd_cache_period(params), || {
                IndicatorValue::Macd(macd(&series.closes(), params))
            });
            overlays.macd = Some((params, value));
        }
        overlays
    }

    fn compare_lines(&self, primary: &Series, slice: SliceRange) -> Vec<CompareLine> {
        let inputs: Vec<(usize, Symbol, Arc<Series>)> = self
            .compare
            .iter()
            .enumerate()
            .filter_map(|(i, symbol)| self.store.get(symbol).map(|series| (i, symbol.clone(), series)))
            .collect();
        let theme = &self.theme;
        let build = |(i, symbol, series): (usize, Symbol, Arc<Series>)| CompareLine {
            values: normalized_overlay(primary, &series, slice.start, slice.end),
            color: theme.compare_color(i),
            symbol,
        };

        #[cfg(feature = "parallel")]
        let lines: Vec<CompareLine> = {
            use rayon::prelude::*;
            inputs.into_par_iter().map(build).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let lines: Vec<CompareLine> = inputs.into_iter().map(build).collect();
        lines
    }

    /// Render all three panels if anything changed since the last frame.
    pub fn request_redraw<P: Surface>(&mut self, surfaces: &mut PanelSurfaces<P>) -> bool {
        if self.needs_resize {
            surfaces.resize(&self.layout, self.device_pixel_ratio);
            self.needs_resize = false;
        }
        if !self.dirty {
            return false;
        }

        let series = self.series();
        let slice = self.slice();
        let overlays = self.build_overlays(&series);
        let compares = self.compare_lines(&series, slice);
        let frame = ChartFrame {
            symbol: &self.symbol,
            series: &series,
            slice,
            zoom: self.view.zoom(),
            toggles: self.config.indicator_toggles,
            overlays: &overlays,
            compares: &compares,
            annotations: self.annotations.items(),
            pending: self.pending,
            crosshair: self.crosshair.as_ref(),
            theme: &self.theme,
        };
        chart_renderer::render_all(surfaces, &frame);
        self.dirty = false;
        true
    }

    /// Stack already rendered panels into one image.
    pub fn export(&self, surfaces: &PanelSurfaces<PixelSurface>) -> PixelSurface {
        export::composite(surfaces, self.theme.background)
    }
}
