use serde::Serialize;

use crate::domain::chart::Color;

/// Minimal 2D drawing capability consumed by the render pipeline.
///
/// Coordinates are logical pixels with the origin at the top-left corner.
pub trait Painter {
    /// Logical width of the surface
    fn width(&self) -> f64;
    /// Logical height of the surface
    fn height(&self) -> f64;

    fn clear(&mut self, color: Color);
    fn set_stroke(&mut self, color: Color);
    fn set_fill(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    /// Filled disc with the current fill color
    fn arc(&mut self, x: f64, y: f64, radius: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
}

/// A painter that can be re-measured by the host.
pub trait Surface: Painter {
    fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64);
}

/// Stroke a polyline, lifting the pen at every `None` point.
pub fn stroke_polyline<P, I>(painter: &mut P, points: I)
where
    P: Painter + ?Sized,
    I: IntoIterator<Item = Option<(f64, f64)>>,
{
    painter.begin_path();
    let mut pen_down = false;
    for point in points {
        match point {
            Some((x, y)) if x.is_finite() && y.is_finite() => {
                if pen_down {
                    painter.line_to(x, y);
                } else {
                    painter.move_to(x, y);
                    pen_down = true;
                }
            }
            _ => pen_down = false,
        }
    }
    painter.stroke();
}

pub fn stroke_segment<P: Painter + ?Sized>(painter: &mut P, from: (f64, f64), to: (f64, f64)) {
    painter.begin_path();
    painter.move_to(from.0, from.1);
    painter.line_to(to.0, to.1);
    painter.stroke();
}

/// One recorded painter call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { color: [u8; 4] },
    SetStroke { color: [u8; 4] },
    SetFill { color: [u8; 4] },
    SetLineWidth { width: f64 },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    Stroke,
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    Arc { x: f64, y: f64, radius: f64 },
    FillText { text: String, x: f64, y: f64 },
}

/// Painter that keeps a list of calls instead of drawing.
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl RecordingPainter {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, commands: Vec::new() }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Every string passed to `fill_text`, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Painter for RecordingPainter {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { color: color.to_rgba8() });
    }

    fn set_stroke(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetStroke { color: color.to_rgba8() });
    }

    fn set_fill(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetFill { color: color.to_rgba8() });
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::SetLineWidth { width });
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::LineTo { x, y });
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::FillRect { x, y, w, h });
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64) {
        self.commands.push(DrawCommand::Arc { x, y, radius });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCommand::FillText { text: text.to_string(), x, y });
    }
}

impl Surface for RecordingPainter {
    fn resize(&mut self, width: f64, height: f64, _device_pixel_ratio: f64) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyline_breaks_on_gaps() {
        let mut painter = RecordingPainter::new(10.0, 10.0);
        stroke_polyline(&mut painter, vec![Some((0.0, 0.0)), Some((1.0, 1.0)), None, Some((3.0, 3.0))]);
        assert_eq!(
            painter.commands(),
            &[
                DrawCommand::BeginPath,
                DrawCommand::MoveTo { x: 0.0, y: 0.0 },
                DrawCommand::LineTo { x: 1.0, y: 1.0 },
                DrawCommand::MoveTo { x: 3.0, y: 3.0 },
                DrawCommand::Stroke,
            ]
        );
    }
}
