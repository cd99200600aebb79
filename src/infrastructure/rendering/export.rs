use super::chart_renderer::PanelSurfaces;
use super::raster::PixelSurface;
use crate::domain::chart::Color;
use crate::domain::logging::LogComponent;
use crate::log_debug;

/// Gap between the price and momentum panels in the exported image
pub const PRICE_GAP: u32 = 4;
/// Gap between the momentum and trend panels in the exported image
pub const MOMENTUM_GAP: u32 = 8;

/// Stack the three panels top to bottom into one image.
///
/// Works on already rendered pixels; nothing is redrawn. The result is as
/// wide as the widest panel and the gaps are filled with `background`.
pub fn composite(panels: &PanelSurfaces<PixelSurface>, background: Color) -> PixelSurface {
    let PanelSurfaces { price, momentum, trend } = panels;
    let width = price.pixel_width().max(momentum.pixel_width()).max(trend.pixel_width());
    let height = price.pixel_height() + PRICE_GAP + momentum.pixel_height() + MOMENTUM_GAP + trend.pixel_height();

    let mut out = PixelSurface::new(width, height);
    out.fill_rows(0, height, background);

    let mut y = 0;
    out.blit(price, 0, y);
    y += price.pixel_height() + PRICE_GAP;
    out.blit(momentum, 0, y);
    y += momentum.pixel_height() + MOMENTUM_GAP;
    out.blit(trend, 0, y);

    log_debug!(LogComponent::Infrastructure("Export"), "Composited {}x{} image", width, height);
    out
}
