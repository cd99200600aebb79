use indicator_chart_wasm::domain::market_data::WindowBars;
use indicator_chart_wasm::view_state::{MAX_ZOOM, MIN_ZOOM, SliceRange, ViewState, slice_window};
use quickcheck_macros::quickcheck;

#[test]
fn ninety_of_seven_hundred_is_the_tail() {
    let view = ViewState::new(WindowBars::Ninety);
    let slice = slice_window(700, &view);
    assert_eq!(slice, SliceRange { start: 610, end: 700 });
    assert_eq!(slice.len(), 90);
}

#[test]
fn zoom_is_clamped() {
    let mut view = ViewState::new(WindowBars::Ninety);
    for _ in 0..100 {
        view.zoom_by(1.1);
    }
    assert_eq!(view.zoom(), MAX_ZOOM);
    for _ in 0..100 {
        view.zoom_by(0.9);
    }
    assert_eq!(view.zoom(), MIN_ZOOM);
    // floor(90 * 0.2)
    assert_eq!(slice_window(700, &view).len(), 18);
}

#[test]
fn set_zoom_clamps_any_finite_value() {
    let mut view = ViewState::new(WindowBars::Ninety);
    for (requested, expected) in [(-5.0, MIN_ZOOM), (-0.0, MIN_ZOOM), (1e300, MAX_ZOOM), (-1e300, MIN_ZOOM), (1.5, 1.5)] {
        view.set_zoom(requested);
        assert_eq!(view.zoom(), expected, "set_zoom({requested})");
    }
    view.set_zoom(f64::NAN);
    view.set_zoom(f64::INFINITY);
    assert_eq!(view.zoom(), 1.5);
}

#[quickcheck]
fn set_zoom_stays_in_bounds(zoom: f64) -> bool {
    let mut view = ViewState::new(WindowBars::Ninety);
    view.set_zoom(zoom);
    (MIN_ZOOM..=MAX_ZOOM).contains(&view.zoom())
}

#[test]
fn short_series_shows_everything() {
    let view = ViewState::new(WindowBars::TradingYear);
    assert_eq!(slice_window(40, &view), SliceRange { start: 0, end: 40 });
    assert!(slice_window(0, &view).is_empty());
}

#[test]
fn slice_index_maps_into_series() {
    let slice = SliceRange { start: 610, end: 700 };
    assert_eq!(slice.to_series_index(0), Some(610));
    assert_eq!(slice.to_series_index(89), Some(699));
    assert_eq!(slice.to_series_index(90), None);
}

#[quickcheck]
fn slice_stays_inside_series(len: u16, offset: u16, notches: i8) -> bool {
    let len = len as usize;
    let mut view = ViewState::new(WindowBars::Ninety);
    view.zoom_by(1.1f64.powi(notches as i32 % 40));
    view.pan(offset as i64, view.max_offset(len));
    let slice = slice_window(len, &view);
    slice.start <= slice.end && slice.end <= len && slice.len() <= view.requested_bars(len)
}
