use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::{EventListener, EventListenerOptions};
use gloo::render::{AnimationFrame, request_animation_frame};
use gloo::utils::{document, window};
use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, WheelEvent};

use crate::application::{ChartController, WidgetConfig};
use crate::domain::chart::{IndicatorToggles, PanelKind};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{Ohlcv, Series, Symbol, WindowBars};
use crate::infrastructure::rendering::{CanvasPainter, PanelSurfaces};
use crate::{log_info, log_warn};

const FALLBACK_WIDTH: f64 = 800.0;
const FALLBACK_HEIGHT: f64 = 500.0;

fn to_js(err: ChartError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Serialize `value` and hand it to a JS callback as a plain object.
fn call_json<T: serde::Serialize + ?Sized>(callback: &Function, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(|err| JsValue::from_str(&err.to_string()))
        .and_then(|json| js_sys::JSON::parse(&json))
        .and_then(|arg| callback.call1(&JsValue::NULL, &arg));
    if let Err(err) = result {
        log_warn!(LogComponent::Presentation("ChartWidget"), "callback failed: {:?}", err);
    }
}

struct WidgetInner {
    controller: ChartController,
    surfaces: PanelSurfaces<CanvasPainter>,
    container: HtmlElement,
    redraw_pending: bool,
    frame: Option<AnimationFrame>,
}

impl WidgetInner {
    fn measure(&mut self) {
        let width = match self.container.client_width() {
            w if w > 0 => w as f64,
            _ => FALLBACK_WIDTH,
        };
        let height = match self.container.client_height() {
            h if h > 0 => h as f64,
            _ => FALLBACK_HEIGHT,
        };
        self.controller.on_resize(width, height, window().device_pixel_ratio());
    }
}

/// Coalesce redraws into one animation frame.
fn schedule_redraw(inner: &Rc<RefCell<WidgetInner>>) {
    {
        let mut state = inner.borrow_mut();
        if state.redraw_pending || !state.controller.is_dirty() {
            return;
        }
        state.redraw_pending = true;
    }

    let weak = Rc::downgrade(inner);
    let frame = request_animation_frame(move |_timestamp| {
        if let Some(inner) = weak.upgrade() {
            let mut state = inner.borrow_mut();
            state.redraw_pending = false;
            let WidgetInner { controller, surfaces, .. } = &mut *state;
            controller.request_redraw(surfaces);
        }
    });
    // Replacing the handle drops the previous frame, which has already fired.
    inner.borrow_mut().frame = Some(frame);
}

/// Run `f` against the controller if the widget is still alive, then schedule a frame.
fn with_controller(weak: &Weak<RefCell<WidgetInner>>, f: impl FnOnce(&mut ChartController)) {
    if let Some(inner) = weak.upgrade() {
        f(&mut inner.borrow_mut().controller);
        schedule_redraw(&inner);
    }
}

fn create_canvas(container: &HtmlElement) -> Result<HtmlCanvasElement, JsValue> {
    let canvas: HtmlCanvasElement = document().create_element("canvas")?.dyn_into()?;
    canvas.style().set_property("display", "block")?;
    container.append_child(&canvas)?;
    Ok(canvas)
}

fn panel_listeners(canvas: &HtmlCanvasElement, panel: PanelKind, weak: &Weak<RefCell<WidgetInner>>) -> Vec<EventListener> {
    let mut listeners = Vec::new();

    let w = weak.clone();
    listeners.push(EventListener::new(canvas, "mousemove", move |event| {
        if let Some(event) = event.dyn_ref::<MouseEvent>() {
            let (x, y) = (event.offset_x() as f64, event.offset_y() as f64);
            with_controller(&w, |c| {
                c.on_pointer_move(panel, x, y);
            });
        }
    }));

    let w = weak.clone();
    listeners.push(EventListener::new(canvas, "mousedown", move |event| {
        if let Some(event) = event.dyn_ref::<MouseEvent>() {
            let (x, y) = (event.offset_x() as f64, event.offset_y() as f64);
            with_controller(&w, |c| {
                c.on_pointer_down(panel, x, y);
            });
        }
    }));

    let w = weak.clone();
    listeners.push(EventListener::new(canvas, "mouseup", move |event| {
        if let Some(event) = event.dyn_ref::<MouseEvent>() {
            let (x, y) = (event.offset_x() as f64, event.offset_y() as f64);
            with_controller(&w, |c| {
                c.on_pointer_up(panel, x, y);
            });
        }
    }));

    let w = weak.clone();
    listeners.push(EventListener::new(canvas, "mouseleave", move |_| {
        with_controller(&w, |c| {
            c.on_leave();
        });
    }));

    let w = weak.clone();
    listeners.push(EventListener::new_with_options(
        canvas,
        "wheel",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            if let Some(event) = event.dyn_ref::<WheelEvent>() {
                event.prevent_default();
                let delta = event.delta_y();
                with_controller(&w, |c| {
                    c.on_wheel(delta);
                });
            }
        },
    ));

    listeners
}

impl ChartWidget {
    fn update(&self, f: impl FnOnce(&mut ChartController) -> ChartResult<bool>) -> Result<bool, JsValue> {
        let changed = f(&mut self.inner.borrow_mut().controller).map_err(to_js)?;
        schedule_redraw(&self.inner);
        Ok(changed)
    }
}

/// Browser binding: three stacked canvases inside a host element.
#[wasm_bindgen]
pub struct ChartWidget {
    inner: Rc<RefCell<WidgetInner>>,
    _listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl ChartWidget {
    /// Mount into the element with id `container_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, config_json: &str) -> Result<ChartWidget, JsValue> {
        let config = if config_json.trim().is_empty() {
            WidgetConfig::default()
        } else {
            WidgetConfig::from_json(config_json).map_err(to_js)?
        };
        let controller = ChartController::new(config).map_err(to_js)?;

        let container: HtmlElement = document()
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str(&format!("element #{} not found", container_id)))?
            .dyn_into()?;
        let canvases = [create_canvas(&container)?, create_canvas(&container)?, create_canvas(&container)?];
        let [price, momentum, trend] = canvases.clone().map(CanvasPainter::new);
        let surfaces = PanelSurfaces::new(price.map_err(to_js)?, momentum.map_err(to_js)?, trend.map_err(to_js)?);

        let inner = Rc::new(RefCell::new(WidgetInner {
            controller,
            surfaces,
            container,
            redraw_pending: false,
            frame: None,
        }));
        inner.borrow_mut().measure();

        let weak = Rc::downgrade(&inner);
        let mut listeners = Vec::new();
        for (canvas, panel) in canvases.iter().zip([PanelKind::Price, PanelKind::Momentum, PanelKind::Trend]) {
            listeners.extend(panel_listeners(canvas, panel, &weak));
        }

        let w = weak.clone();
        listeners.push(EventListener::new(&window(), "keydown", move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                let key = event.key();
                with_controller(&w, |c| {
                    c.on_key_name(&key);
                });
            }
        }));

        let w = weak.clone();
        listeners.push(EventListener::new(&window(), "resize", move |_| {
            if let Some(inner) = w.upgrade() {
                inner.borrow_mut().measure();
                schedule_redraw(&inner);
            }
        }));

        schedule_redraw(&inner);
        log_info!(LogComponent::Presentation("ChartWidget"), "Mounted into #{}", container_id);
        Ok(ChartWidget { inner, _listeners: listeners })
    }

    #[wasm_bindgen(js_name = setSymbol)]
    pub fn set_symbol(&self, symbol: &str) -> Result<bool, JsValue> {
        self.update(|c| c.load_symbol_input(symbol))
    }

    #[wasm_bindgen(js_name = setCompareSymbols)]
    pub fn set_compare_symbols(&self, symbols: &str) -> Result<bool, JsValue> {
        self.update(|c| Ok(c.load_compare_input(symbols)))
    }

    #[wasm_bindgen(js_name = setWindow)]
    pub fn set_window(&self, window: &str) -> Result<bool, JsValue> {
        self.update(|c| Ok(c.set_window(WindowBars::parse(window)?)))
    }

    /// `toggles_json` may set any subset of the indicator flags.
    #[wasm_bindgen(js_name = setToggles)]
    pub fn set_toggles(&self, toggles_json: &str) -> Result<bool, JsValue> {
        self.update(|c| {
            let toggles: IndicatorToggles = serde_json::from_str(toggles_json)?;
            Ok(c.set_toggles(toggles))
        })
    }

    #[wasm_bindgen(js_name = toggleAnnotate)]
    pub fn toggle_annotate(&self) -> bool {
        let mode = {
            let mut inner = self.inner.borrow_mut();
            inner.controller.toggle_annotate_mode();
            inner.controller.annotate_mode()
        };
        schedule_redraw(&self.inner);
        mode
    }

    #[wasm_bindgen(js_name = clearAnnotations)]
    pub fn clear_annotations(&self) {
        self.inner.borrow_mut().controller.clear_annotations();
        schedule_redraw(&self.inner);
    }

    /// Current annotations as an array of `{i1, p1, i2, p2}`.
    pub fn annotations(&self) -> Result<JsValue, JsValue> {
        let json = serde_json::to_string(self.inner.borrow().controller.annotations())
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        js_sys::JSON::parse(&json)
    }

    /// Replace the bars of `symbol` with an array of OHLCV rows.
    #[wasm_bindgen(js_name = loadSeriesJson)]
    pub fn load_series_json(&self, symbol: &str, rows_json: &str) -> Result<f64, JsValue> {
        let symbol = Symbol::new(symbol).map_err(to_js)?;
        let rows: Vec<Ohlcv> = serde_json::from_str(rows_json).map_err(|err| to_js(err.into()))?;
        let series = Series::from_ohlcv(rows).map_err(to_js)?;
        let version = self.inner.borrow_mut().controller.load_series(symbol, series);
        schedule_redraw(&self.inner);
        Ok(version as f64)
    }

    pub fn redraw(&self) {
        self.inner.borrow_mut().controller.mark_dirty();
        schedule_redraw(&self.inner);
    }

    /// Re-measure the container, e.g. after the host changed its size.
    pub fn resize(&self) {
        self.inner.borrow_mut().measure();
        schedule_redraw(&self.inner);
    }

    #[wasm_bindgen(js_name = onAnnotationChange)]
    pub fn on_annotation_change(&self, callback: Function) {
        self.inner
            .borrow_mut()
            .controller
            .on_annotation_change(move |items| call_json(&callback, items));
    }

    #[wasm_bindgen(js_name = onSymbolChange)]
    pub fn on_symbol_change(&self, callback: Function) {
        self.inner
            .borrow_mut()
            .controller
            .on_symbol_change(move |symbol| call_json(&callback, symbol));
    }

    #[wasm_bindgen(js_name = onCompareChange)]
    pub fn on_compare_change(&self, callback: Function) {
        self.inner
            .borrow_mut()
            .controller
            .on_compare_change(move |symbols| call_json(&callback, symbols));
    }

    /// PNG of the three panels stacked vertically.
    #[wasm_bindgen(js_name = exportImage)]
    pub fn export_image(&self) -> Result<Promise, JsValue> {
        let image = {
            let inner = self.inner.borrow();
            let surfaces = &inner.surfaces;
            let panels = PanelSurfaces::new(
                surfaces.price.snapshot().map_err(to_js)?,
                surfaces.momentum.snapshot().map_err(to_js)?,
                surfaces.trend.snapshot().map_err(to_js)?,
            );
            inner.controller.export(&panels)
        };

        let canvas: HtmlCanvasElement = document().create_element("canvas")?.dyn_into()?;
        CanvasPainter::new(canvas.clone()).and_then(|mut painter| painter.put_pixels(&image)).map_err(to_js)?;

        Ok(Promise::new(&mut |resolve, reject| {
            let on_blob = Closure::once_into_js(move |blob: JsValue| {
                let _ = resolve.call1(&JsValue::NULL, &blob);
            });
            if let Err(err) = canvas.to_blob(on_blob.unchecked_ref()) {
                let _ = reject.call1(&JsValue::NULL, &err);
            }
        }))
    }
}
