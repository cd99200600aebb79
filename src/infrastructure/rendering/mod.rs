//! 2D rendering: the painter seam, its backends and the panel pipeline.

pub mod canvas_painter;
pub mod chart_renderer;
pub mod export;
pub mod painter;
pub mod raster;
pub mod transform;

pub use canvas_painter::CanvasPainter;
pub use chart_renderer::{ChartFrame, CompareLine, Crosshair, Overlays, PanelSurfaces, render_all};
pub use painter::{DrawCommand, Painter, RecordingPainter, Surface};
pub use raster::PixelSurface;
pub use transform::{PanelLayout, PanelTransform};
