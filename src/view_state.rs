use serde::{Deserialize, Serialize};

use crate::domain::market_data::WindowBars;

pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 3.0;
/// Bars moved by one arrow key press
pub const PAN_STEP_BARS: usize = 5;

/// View parameters controlling zoom and pan.
///
/// `zoom < 1` shows fewer bars (zoomed in); `offset` counts bars back from
/// the most recent one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    zoom: f64,
    offset: usize,
    window: WindowBars,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(WindowBars::default())
    }
}

impl ViewState {
    pub fn new(window: WindowBars) -> Self {
        Self { zoom: 1.0, offset: 0, window }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn window(&self) -> WindowBars {
        self.window
    }

    /// Set zoom clamped to `[MIN_ZOOM, MAX_ZOOM]`; non-finite input is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.zoom * factor);
    }

    pub fn set_window(&mut self, window: WindowBars) {
        self.window = window;
    }

    pub fn set_offset(&mut self, offset: usize, max_offset: usize) {
        self.offset = offset.min(max_offset);
    }

    /// Pan by `delta` bars; positive moves toward older history.
    pub fn pan(&mut self, delta: i64, max_offset: usize) {
        let next = (self.offset as i64).saturating_add(delta).max(0) as usize;
        self.offset = next.min(max_offset);
    }

    /// Number of bars the window asks for over a series of `len` bars
    pub fn requested_bars(&self, len: usize) -> usize {
        let win = self.window.bars().unwrap_or(len);
        (win as f64 * self.zoom).floor() as usize
    }

    /// Largest offset that still moves the window
    pub fn max_offset(&self, len: usize) -> usize {
        len.saturating_sub(self.requested_bars(len))
    }
}

/// Visible half-open index range `start..end` of a series
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
}

impl SliceRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Map a slice index to the full series
    pub fn to_series_index(&self, slice_index: usize) -> Option<usize> {
        (slice_index < self.len()).then_some(self.start + slice_index)
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Visible sub-range of a series of `len` bars.
///
/// Every panel slices with the same view so they stay horizontally aligned.
pub fn slice_window(len: usize, view: &ViewState) -> SliceRange {
    let visible = view.requested_bars(len);
    let start = len.saturating_sub(visible).saturating_sub(view.offset);
    let end = len.min(start + visible);
    SliceRange { start, end }
}
