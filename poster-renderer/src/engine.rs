//! The poster render engine.
//!
//! ```text
//! background ─► grid* ─► logo ─► brand ─► event ─► badges ─► headline
//!            ─► sub-headline ─► QR ─► CTA ─► selection*      (* preview only)
//! ```

use std::path::PathBuf;

use poster_core::{ElementKind, PosterDocument, Rgba};
use serde::{Deserialize, Serialize};
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, Point, Rect, SpreadMode, Stroke, Transform,
};

use crate::error::{RenderError, RenderResult};
use crate::geometry::CanvasGeometry;
use crate::image::ImageHandle;
use crate::layout::{
    compute_layout, ElementLayout, LabeledBox, LayoutRect, PosterLayout, TextRun,
};
use crate::slot::{ImageRole, ImageSet};
use crate::text::TextEngine;

/// Top stop of the fallback background gradient.
pub const GRADIENT_TOP: Rgba = Rgba::rgb(0x0f, 0x17, 0x2a);
/// Bottom stop of the fallback background gradient.
pub const GRADIENT_BOTTOM: Rgba = Rgba::rgb(0x02, 0x06, 0x17);
/// Preview grid spacing, in percent of each axis.
pub const GRID_STEP: f32 = 2.0;
/// Headline shadow offset as a fraction of the headline font size.
pub const SHADOW_OFFSET: f32 = 0.05;

const SHADOW_COLOR: Rgba = Rgba::rgba(0, 0, 0, 140);
const HIGHLIGHT_MARGIN: f32 = 8.0;
const HIGHLIGHT_STROKE: f32 = 3.0;

/// Preview draws editing affordances; export draws the final composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Grid overlay and selection highlight.
    #[default]
    Preview,
    /// Chrome-free output with headline shadow.
    Export,
}

/// Per-call render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderContext {
    /// Preview or export.
    pub mode: RenderMode,
    /// Element to highlight in preview mode.
    pub selected: Option<ElementKind>,
}

impl RenderContext {
    /// Preview with an optional selection highlight.
    #[must_use]
    pub fn preview(selected: Option<ElementKind>) -> Self {
        Self {
            mode: RenderMode::Preview,
            selected,
        }
    }

    /// Final output.
    #[must_use]
    pub fn export() -> Self {
        Self {
            mode: RenderMode::Export,
            selected: None,
        }
    }
}

/// Configuration for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererConfig {
    /// Font family name; `None` uses the system sans-serif.
    pub font_family: Option<String>,
    /// Extra directories to load fonts from.
    pub font_dirs: Vec<PathBuf>,
    /// Preview grid line color.
    pub grid_color: Rgba,
    /// Preview selection outline color.
    pub highlight_color: Rgba,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            font_family: None,
            font_dirs: Vec::new(),
            grid_color: Rgba::rgba(255, 255, 255, 24),
            highlight_color: Rgba::rgb(0x38, 0xbd, 0xf8),
        }
    }
}

/// A rendered poster.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixmap: Pixmap,
    geometry: CanvasGeometry,
}

impl RasterSurface {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Geometry the poster was laid out on.
    #[must_use]
    pub fn geometry(&self) -> CanvasGeometry {
        self.geometry
    }

    /// Straight-alpha color of one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Rgba::rgba(c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Straight-alpha RGBA bytes, row-major.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// The premultiplied pixmap.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Rasterizes poster documents.
#[derive(Debug)]
pub struct PosterRenderer {
    config: RendererConfig,
    text: TextEngine,
    frame_count: u64,
}

impl PosterRenderer {
    /// Create a renderer, loading fonts per `config`.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        let text = TextEngine::new(config.font_family.clone(), &config.font_dirs);
        Self {
            config,
            text,
            frame_count: 0,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Number of frames rendered so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the text engine found any fonts.
    #[must_use]
    pub fn has_fonts(&self) -> bool {
        self.text.has_fonts()
    }

    /// Resolve `doc` to pixel geometry without painting.
    pub fn layout(&mut self, doc: &PosterDocument, images: &ImageSet) -> PosterLayout {
        let geometry = CanvasGeometry::for_aspect(doc.aspect_ratio);
        compute_layout(doc, geometry, &mut self.text, images.dimensions())
    }

    /// Render `doc` to a fresh surface.
    ///
    /// Every document renders: missing images fall back (gradient background,
    /// omitted logo/QR) and hidden elements are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Surface`] if the surface cannot be allocated.
    pub fn render(
        &mut self,
        doc: &PosterDocument,
        images: &ImageSet,
        ctx: &RenderContext,
    ) -> RenderResult<RasterSurface> {
        let layout = self.layout(doc, images);
        let geometry = layout.geometry;

        let mut pixmap = Pixmap::new(geometry.width(), geometry.height()).ok_or_else(|| {
            RenderError::Surface(format!(
                "Cannot allocate {}x{} surface",
                geometry.width(),
                geometry.height()
            ))
        })?;

        match images.get(ImageRole::Background) {
            Some(background) => {
                let full = LayoutRect::new(0.0, 0.0, geometry.width_f(), geometry.height_f());
                draw_image(&mut pixmap, background, full);
            }
            None => paint_gradient(&mut pixmap, geometry),
        }

        if ctx.mode == RenderMode::Preview {
            paint_grid(&mut pixmap, geometry, self.config.grid_color);
        }

        for element in &layout.elements {
            tracing::trace!("Drawing {}", element.kind);
            self.paint_element(&mut pixmap, element.kind, &element.layout, images, ctx.mode);
        }

        if ctx.mode == RenderMode::Preview {
            if let Some(layout) = ctx.selected.and_then(|kind| layout.get(kind)) {
                let outline = layout.bounds().inflate(HIGHLIGHT_MARGIN);
                stroke_rect(&mut pixmap, outline, self.config.highlight_color);
            }
        }

        self.frame_count += 1;
        tracing::debug!(
            "Rendered {}x{} poster in {:?} mode ({} elements, frame {})",
            geometry.width(),
            geometry.height(),
            ctx.mode,
            layout.elements.len(),
            self.frame_count
        );

        Ok(RasterSurface { pixmap, geometry })
    }

    fn paint_element(
        &mut self,
        pixmap: &mut Pixmap,
        kind: ElementKind,
        layout: &ElementLayout,
        images: &ImageSet,
        mode: RenderMode,
    ) {
        match layout {
            ElementLayout::Image { rect } => {
                if let Some(logo) = images.get(ImageRole::Logo) {
                    draw_image(pixmap, logo, *rect);
                }
            }
            ElementLayout::Text(run) => {
                if kind == ElementKind::Headline && mode == RenderMode::Export {
                    let offset = SHADOW_OFFSET * run.style.size;
                    self.text.draw_centered(
                        pixmap,
                        &run.text,
                        run.style,
                        SHADOW_COLOR,
                        run.center_x + offset,
                        run.center_y + offset,
                    );
                }
                self.draw_run(pixmap, run);
            }
            ElementLayout::Badges { duration, price } => {
                self.draw_box(pixmap, duration);
                self.draw_box(pixmap, price);
            }
            ElementLayout::Lines(lines) => {
                for line in lines {
                    self.draw_run(pixmap, line);
                }
            }
            ElementLayout::Qr { backing, image } => {
                fill_rect(pixmap, *backing, Rgba::WHITE);
                if let Some(qr) = images.get(ImageRole::Qr) {
                    draw_image(pixmap, qr, *image);
                }
            }
            ElementLayout::Pill(pill) => self.draw_box(pixmap, pill),
        }
    }

    fn draw_run(&mut self, pixmap: &mut Pixmap, run: &TextRun) {
        self.text
            .draw_centered(pixmap, &run.text, run.style, run.color, run.center_x, run.center_y);
    }

    fn draw_box(&mut self, pixmap: &mut Pixmap, labeled: &LabeledBox) {
        if let Some(path) = rounded_rect_path(labeled.rect, labeled.radius) {
            pixmap.fill_path(
                &path,
                &solid(labeled.fill),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        self.draw_run(pixmap, &labeled.label);
    }
}

impl Default for PosterRenderer {
    fn default() -> Self {
        Self::new(RendererConfig::default())
    }
}

fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn to_skia_color(color: Rgba) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn paint_gradient(pixmap: &mut Pixmap, geometry: CanvasGeometry) {
    let shader = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(0.0, geometry.height_f()),
        vec![
            GradientStop::new(0.0, to_skia_color(GRADIENT_TOP)),
            GradientStop::new(1.0, to_skia_color(GRADIENT_BOTTOM)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    );

    let Some(shader) = shader else {
        pixmap.fill(to_skia_color(GRADIENT_TOP));
        return;
    };
    let Some(rect) = Rect::from_xywh(0.0, 0.0, geometry.width_f(), geometry.height_f()) else {
        return;
    };

    let paint = Paint {
        shader,
        ..Paint::default()
    };
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn paint_grid(pixmap: &mut Pixmap, geometry: CanvasGeometry, color: Rgba) {
    let paint = solid(color);
    let (w, h) = (geometry.width_f(), geometry.height_f());
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = (100.0 / GRID_STEP).floor() as u32;

    for i in 1..steps {
        #[allow(clippy::cast_precision_loss)]
        let pct = i as f32 * GRID_STEP;
        if let Some(line) = Rect::from_xywh(geometry.px(pct).round(), 0.0, 1.0, h) {
            pixmap.fill_rect(line, &paint, Transform::identity(), None);
        }
        if let Some(line) = Rect::from_xywh(0.0, geometry.py(pct).round(), w, 1.0) {
            pixmap.fill_rect(line, &paint, Transform::identity(), None);
        }
    }
}

fn fill_rect(pixmap: &mut Pixmap, rect: LayoutRect, color: Rgba) {
    if let Some(r) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
        pixmap.fill_rect(r, &solid(color), Transform::identity(), None);
    }
}

fn stroke_rect(pixmap: &mut Pixmap, rect: LayoutRect, color: Rgba) {
    let Some(r) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
        return;
    };
    let path = PathBuilder::from_rect(r);
    let stroke = Stroke {
        width: HIGHLIGHT_STROKE,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
}

#[allow(clippy::cast_precision_loss)]
fn draw_image(pixmap: &mut Pixmap, image: &ImageHandle, dest: LayoutRect) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || dest.width <= 0.0 || dest.height <= 0.0 {
        return;
    }
    let transform = Transform::from_row(
        dest.width / w as f32,
        0.0,
        0.0,
        dest.height / h as f32,
        dest.x,
        dest.y,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, image.pixmap().as_ref(), &paint, transform, None);
}

/// Rounded rectangle with quadratic corners. `None` for degenerate boxes.
fn rounded_rect_path(rect: LayoutRect, radius: f32) -> Option<Path> {
    if !(rect.width > 0.0 && rect.height > 0.0) {
        return None;
    }
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let (x, y, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DecodedImage;
    use poster_core::AspectRatio;

    fn blank(ratio: AspectRatio) -> PosterDocument {
        let mut doc = PosterDocument::new();
        doc.set_aspect_ratio(ratio);
        for kind in ElementKind::ALL {
            doc.set_visible(kind, false);
        }
        doc
    }

    #[test]
    fn test_surface_size_follows_aspect_ratio() {
        let mut renderer = PosterRenderer::default();
        for ratio in AspectRatio::ALL {
            let surface = renderer
                .render(&blank(ratio), &ImageSet::empty(), &RenderContext::export())
                .expect("render");
            let expected = CanvasGeometry::for_aspect(ratio);
            assert_eq!((surface.width(), surface.height()), (1080, expected.height()));
        }
        assert_eq!(renderer.frame_count(), 4);
    }

    #[test]
    fn test_gradient_fallback_runs_top_to_bottom() {
        let mut renderer = PosterRenderer::default();
        let surface = renderer
            .render(
                &blank(AspectRatio::Portrait),
                &ImageSet::empty(),
                &RenderContext::export(),
            )
            .expect("render");

        let top = surface.pixel(540, 0).expect("top");
        let bottom = surface.pixel(540, 1919).expect("bottom");
        assert!(top.r.abs_diff(GRADIENT_TOP.r) <= 2);
        assert!(top.b.abs_diff(GRADIENT_TOP.b) <= 2);
        assert!(bottom.r.abs_diff(GRADIENT_BOTTOM.r) <= 2);
        assert!(bottom.b.abs_diff(GRADIENT_BOTTOM.b) <= 2);
        assert_eq!(top.a, 255);
    }

    #[test]
    fn test_background_image_covers_canvas() {
        let red = DecodedImage::solid(4, 4, Rgba::rgb(255, 0, 0))
            .into_handle()
            .expect("handle");
        let images = ImageSet::empty().with_background(red);
        let mut renderer = PosterRenderer::default();
        let surface = renderer
            .render(&blank(AspectRatio::Square), &images, &RenderContext::export())
            .expect("render");

        for (x, y) in [(0, 0), (540, 540), (1079, 1079)] {
            assert_eq!(surface.pixel(x, y), Some(Rgba::rgb(255, 0, 0)));
        }
    }

    #[test]
    fn test_preview_draws_grid_export_does_not() {
        let doc = blank(AspectRatio::Square);
        let mut renderer = PosterRenderer::default();
        let preview = renderer
            .render(&doc, &ImageSet::empty(), &RenderContext::preview(None))
            .expect("preview");
        let export = renderer
            .render(&doc, &ImageSet::empty(), &RenderContext::export())
            .expect("export");

        // x = 2% of 1080 lies on a grid line; row 10 lies between lines.
        let x = CanvasGeometry::for_aspect(AspectRatio::Square).px(GRID_STEP).round() as u32;
        assert_ne!(preview.pixel(x, 10), export.pixel(x, 10));
        assert_eq!(preview.pixel(x + 5, 10), export.pixel(x + 5, 10));
    }

    #[test]
    fn test_qr_backing_is_white_and_highlight_only_in_preview() {
        let mut doc = blank(AspectRatio::Square);
        doc.set_visible(ElementKind::Qr, true);
        doc.set_position(ElementKind::Qr, 50.0, 50.0);
        let black = DecodedImage::solid(10, 10, Rgba::BLACK)
            .into_handle()
            .expect("handle");
        let images = ImageSet::empty().with_qr(black);

        let mut renderer = PosterRenderer::default();
        let export = renderer
            .render(&doc, &images, &RenderContext::export())
            .expect("export");
        // Image top edge at py(50) = 540; backing pad is 6px above it.
        assert_eq!(export.pixel(540, 537), Some(Rgba::WHITE));
        assert_eq!(export.pixel(540, 600), Some(Rgba::BLACK));

        let preview = renderer
            .render(&doc, &images, &RenderContext::preview(Some(ElementKind::Qr)))
            .expect("preview");
        let layout = renderer.layout(&doc, &images);
        let outline = layout
            .get(ElementKind::Qr)
            .expect("qr")
            .bounds()
            .inflate(HIGHLIGHT_MARGIN);
        let (ox, oy) = (outline.center().0 as u32, outline.y.round() as u32);
        assert_eq!(
            preview.pixel(ox, oy),
            Some(RendererConfig::default().highlight_color)
        );
        assert_ne!(export.pixel(ox, oy), preview.pixel(ox, oy));
    }

    #[test]
    fn test_rounded_rect_rejects_degenerate_boxes() {
        assert!(rounded_rect_path(LayoutRect::new(0.0, 0.0, 0.0, 10.0), 4.0).is_none());
        assert!(rounded_rect_path(LayoutRect::new(0.0, 0.0, 10.0, 10.0), 40.0).is_some());
    }
}
