use super::painter::{Painter, Surface};
use crate::domain::chart::Color;
use crate::domain::errors::{ChartError, ChartResult};

/// Software RGBA surface.
///
/// Backs native rendering and image export. Lines are clipped to the surface
/// and walked with a DDA stamped at the current line width. Discs use a
/// distance test and rectangles are clipped. Text is not rasterized.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSurface {
    logical_width: f64,
    logical_height: f64,
    scale: f64,
    width: u32,
    height: u32,
    data: Vec<u8>,
    stroke: Color,
    fill: Color,
    line_width: f64,
    path: Vec<Vec<(f64, f64)>>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_scale(width as f64, height as f64, 1.0)
    }

    /// Surface of `width × height` logical pixels backed by `dpr`× as many device pixels
    pub fn with_scale(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let scale = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 };
        let logical_width = width.max(0.0);
        let logical_height = height.max(0.0);
        let px_w = (logical_width * scale).round() as u32;
        let px_h = (logical_height * scale).round() as u32;
        Self {
            logical_width,
            logical_height,
            scale,
            width: px_w,
            height: px_h,
            data: vec![0; px_w as usize * px_h as usize * 4],
            stroke: Color::BLACK,
            fill: Color::BLACK,
            line_width: 1.0,
            path: Vec::new(),
        }
    }

    /// Wrap raw RGBA bytes, e.g. read back from a browser canvas.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> ChartResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ChartError::Surface(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        let mut surface = Self::new(width, height);
        surface.data = data;
        Ok(surface)
    }

    pub fn pixel_width(&self) -> u32 {
        self.width
    }

    pub fn pixel_height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Overwrite every pixel of the rows `y0..y1` with `color`.
    pub fn fill_rows(&mut self, y0: u32, y1: u32, color: Color) {
        let rgba = color.to_rgba8();
        let y1 = y1.min(self.height);
        for y in y0.min(y1)..y1 {
            let row = y as usize * self.width as usize * 4;
            for x in 0..self.width as usize {
                self.data[row + x * 4..row + x * 4 + 4].copy_from_slice(&rgba);
            }
        }
    }

    /// Copy `src` verbatim with its top-left corner at device pixel `(dst_x, dst_y)`.
    pub fn blit(&mut self, src: &PixelSurface, dst_x: u32, dst_y: u32) {
        if dst_x >= self.width || dst_y >= self.height {
            return;
        }
        let copy_w = src.width.min(self.width - dst_x) as usize;
        let copy_h = src.height.min(self.height - dst_y) as usize;
        for row in 0..copy_h {
            let s = row * src.width as usize * 4;
            let d = ((dst_y as usize + row) * self.width as usize + dst_x as usize) * 4;
            self.data[d..d + copy_w * 4].copy_from_slice(&src.data[s..s + copy_w * 4]);
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let a = color.a.clamp(0.0, 1.0);
        let src = color.to_rgba8();
        for c in 0..3 {
            let dst = self.data[i + c] as f32;
            self.data[i + c] = (src[c] as f32 * a + dst * (1.0 - a)).round() as u8;
        }
        let dst_a = self.data[i + 3] as f32 / 255.0;
        self.data[i + 3] = ((a + dst_a * (1.0 - a)) * 255.0).round() as u8;
    }

    fn fill_device_rect(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, color: Color) {
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        let px0 = x0.round().max(0.0) as i64;
        let py0 = y0.round().max(0.0) as i64;
        let px1 = (x1.round() as i64).min(self.width as i64);
        let py1 = (y1.round() as i64).min(self.height as i64);
        for y in py0..py1 {
            for x in px0..px1 {
                self.blend(x, y, color);
            }
        }
    }

    fn stamp_line(&mut self, from: (f64, f64), to: (f64, f64)) {
        let thickness = (self.line_width * self.scale).max(1.0);
        let half = thickness / 2.0;
        let bounds = (-thickness, -thickness, self.width as f64 + thickness, self.height as f64 + thickness);
        let Some(((x0, y0), (x1, y1))) =
            clip_segment((from.0 * self.scale, from.1 * self.scale), (to.0 * self.scale, to.1 * self.scale), bounds)
        else {
            return;
        };
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        let color = self.stroke;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            let left = (x - half + 0.5).floor() as i64;
            let top = (y - half + 0.5).floor() as i64;
            let size = thickness.round().max(1.0) as i64;
            for dy in 0..size {
                for dx in 0..size {
                    self.blend(left + dx, top + dy, color);
                }
            }
        }
    }
}

/// Liang-Barsky clip of a segment to `(min_x, min_y, max_x, max_y)`.
///
/// `None` when the segment misses the box or has a non-finite end.
fn clip_segment(
    from: (f64, f64),
    to: (f64, f64),
    (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, from.0 - min_x), (dx, max_x - from.0), (-dy, from.1 - min_y), (dy, max_y - from.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some(((from.0 + dx * t0, from.1 + dy * t0), (from.0 + dx * t1, from.1 + dy * t1)))
}

impl Painter for PixelSurface {
    fn width(&self) -> f64 {
        self.logical_width
    }

    fn height(&self) -> f64 {
        self.logical_height
    }

    fn clear(&mut self, color: Color) {
        self.path.clear();
        self.fill_rows(0, self.height, color);
    }

    fn set_stroke(&mut self, color: Color) {
        self.stroke = color;
    }

    fn set_fill(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(vec![(x, y)]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        match self.path.last_mut() {
            Some(sub) => sub.push((x, y)),
            None => self.path.push(vec![(x, y)]),
        }
    }

    fn stroke(&mut self) {
        let path = std::mem::take(&mut self.path);
        for sub in &path {
            for pair in sub.windows(2) {
                self.stamp_line(pair[0], pair[1]);
            }
        }
        self.path = path;
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let s = self.scale;
        let color = self.fill;
        self.fill_device_rect(x * s, y * s, (x + w) * s, (y + h) * s, color);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64) {
        let s = self.scale;
        let (cx, cy, r) = (x * s, y * s, (radius * s).max(0.5));
        let color = self.fill;
        let (min_x, max_x) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
        let (min_y, max_y) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.blend(px, py, color);
                }
            }
        }
    }

    fn fill_text(&mut self, _text: &str, _x: f64, _y: f64) {}
}

impl Surface for PixelSurface {
    fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        *self = Self::with_scale(width, height, device_pixel_ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_fills_every_pixel() {
        let mut surface = PixelSurface::new(4, 3);
        surface.clear(Color::from_hex(0x102030));
        assert_eq!(surface.pixel(3, 2), Some([0x10, 0x20, 0x30, 255]));
        assert_eq!(surface.pixel(4, 0), None);
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut surface = PixelSurface::new(10, 10);
        surface.clear(Color::BLACK);
        surface.set_fill(Color::WHITE);
        surface.fill_rect(8.0, 8.0, 10.0, 10.0);
        assert_eq!(surface.pixel(9, 9), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(7, 7), Some([0, 0, 0, 255]));
    }

    #[test]
    fn horizontal_stroke_marks_its_row() {
        let mut surface = PixelSurface::new(20, 5);
        surface.clear(Color::BLACK);
        surface.set_stroke(Color::WHITE);
        surface.begin_path();
        surface.move_to(2.0, 2.0);
        surface.line_to(17.0, 2.0);
        surface.stroke();
        for x in 2..=17 {
            assert_eq!(surface.pixel(x, 2), Some([255, 255, 255, 255]), "x = {x}");
        }
        assert_eq!(surface.pixel(10, 4), Some([0, 0, 0, 255]));
    }

    #[test]
    fn device_pixel_ratio_scales_backing_store() {
        let mut surface = PixelSurface::with_scale(10.0, 5.0, 2.0);
        assert_eq!((surface.pixel_width(), surface.pixel_height()), (20, 10));
        surface.clear(Color::BLACK);
        surface.set_fill(Color::WHITE);
        surface.fill_rect(5.0, 0.0, 5.0, 5.0);
        assert_eq!(surface.pixel(10, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(9, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn from_rgba_checks_length() {
        assert!(PixelSurface::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(PixelSurface::from_rgba(2, 2, vec![0; 15]), Err(ChartError::Surface(_))));
    }

    #[test]
    fn far_offscreen_stroke_is_clipped() {
        let mut surface = PixelSurface::new(400, 300);
        surface.clear(Color::BLACK);
        surface.set_stroke(Color::WHITE);
        surface.begin_path();
        surface.move_to(0.0, 150.0);
        surface.line_to(1e9, 150.0);
        surface.move_to(200.0, -1e12);
        surface.line_to(200.0, 1e12);
        let started = std::time::Instant::now();
        surface.stroke();
        assert!(started.elapsed() < std::time::Duration::from_secs(1), "took {:?}", started.elapsed());

        assert_eq!(surface.pixel(399, 150), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(200, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(200, 299), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(10, 10), Some([0, 0, 0, 255]));
    }

    #[test]
    fn segment_outside_the_box_is_dropped() {
        let bounds = (0.0, 0.0, 10.0, 10.0);
        assert_eq!(clip_segment((-5.0, -5.0), (-1.0, 20.0), bounds), None);
        assert_eq!(clip_segment((0.0, f64::NAN), (5.0, 5.0), bounds), None);
        let ((x0, y0), (x1, y1)) = clip_segment((-10.0, 5.0), (20.0, 5.0), bounds).unwrap();
        assert!(x0.abs() < 1e-9 && (x1 - 10.0).abs() < 1e-9);
        assert_eq!((y0, y1), (5.0, 5.0));
    }
}
