use std::f64::consts::TAU;

use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use super::painter::{Painter, Surface};
use super::raster::PixelSurface;
use crate::domain::chart::Color;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::log_warn;

const FONT: &str = "11px sans-serif";

/// Canvas 2D backend for the browser
pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

fn report(result: Result<(), JsValue>, op: &str) {
    if let Err(err) = result {
        log_warn!(LogComponent::Infrastructure("CanvasPainter"), "{} failed: {:?}", op, err);
    }
}

impl CanvasPainter {
    pub fn new(canvas: HtmlCanvasElement) -> ChartResult<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|_| ChartError::Surface("failed to get 2D context".to_string()))?
            .ok_or_else(|| ChartError::Surface("2D context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| ChartError::Surface("failed to cast to 2D context".to_string()))?;
        context.set_font(FONT);
        let width = canvas.width() as f64;
        let height = canvas.height() as f64;
        Ok(Self { canvas, context, width, height })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Read the backing store back as RGBA pixels.
    pub fn snapshot(&self) -> ChartResult<PixelSurface> {
        let (w, h) = (self.canvas.width(), self.canvas.height());
        let image = self
            .context
            .get_image_data(0.0, 0.0, w as f64, h as f64)
            .map_err(|err| ChartError::Surface(format!("get_image_data failed: {:?}", err)))?;
        PixelSurface::from_rgba(image.width(), image.height(), image.data().0)
    }

    /// Replace the canvas contents with `image`, one canvas pixel per image pixel.
    pub fn put_pixels(&mut self, image: &PixelSurface) -> ChartResult<()> {
        let (w, h) = (image.pixel_width(), image.pixel_height());
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        self.width = w as f64;
        self.height = h as f64;
        let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(image.data()), w, h)
            .map_err(|err| ChartError::Surface(format!("ImageData failed: {:?}", err)))?;
        self.context
            .put_image_data(&data, 0.0, 0.0)
            .map_err(|err| ChartError::Surface(format!("put_image_data failed: {:?}", err)))
    }
}

impl Painter for CanvasPainter {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.context.clear_rect(0.0, 0.0, self.width, self.height);
        self.set_fill(color);
        self.context.fill_rect(0.0, 0.0, self.width, self.height);
    }

    fn set_stroke(&mut self, color: Color) {
        self.context.set_stroke_style(&JsValue::from_str(&color.to_css()));
    }

    fn set_fill(&mut self, color: Color) {
        self.context.set_fill_style(&JsValue::from_str(&color.to_css()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.context.set_line_width(width);
    }

    fn begin_path(&mut self) {
        self.context.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.context.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.context.line_to(x, y);
    }

    fn stroke(&mut self) {
        self.context.stroke();
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.context.fill_rect(x, y, w, h);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64) {
        self.context.begin_path();
        report(self.context.arc(x, y, radius, 0.0, TAU), "arc");
        self.context.fill();
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        report(self.context.fill_text(text, x, y), "fill_text");
    }
}

impl Surface for CanvasPainter {
    fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.canvas.set_width((self.width * dpr).round() as u32);
        self.canvas.set_height((self.height * dpr).round() as u32);

        let style = self.canvas.style();
        report(style.set_property("width", &format!("{}px", self.width)), "style width");
        report(style.set_property("height", &format!("{}px", self.height)), "style height");

        // Resizing resets the context state.
        report(self.context.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0), "set_transform");
        self.context.set_font(FONT);
    }
}
