//! Text shaping, measurement and glyph rasterization on top of cosmic-text.

use std::path::PathBuf;

use cosmic_text::{
    Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight,
};
use poster_core::{ElementPlacement, Rgba};
use tiny_skia::Pixmap;

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Font size and style flags for one run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f32,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
}

impl TextStyle {
    /// Regular style at `size`.
    #[must_use]
    pub fn new(size: f32) -> Self {
        Self {
            size,
            bold: false,
            italic: false,
        }
    }

    /// Take bold/italic from an element placement.
    #[must_use]
    pub fn styled_like(mut self, placement: &ElementPlacement) -> Self {
        self.bold = placement.bold();
        self.italic = placement.italic();
        self
    }

    /// Height of a single line box.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT_FACTOR
    }

    fn is_drawable(&self) -> bool {
        self.size.is_finite() && self.size > 0.0
    }
}

/// Measures single-line text advance widths.
///
/// Layout depends only on this trait, so it can run against a fixed-advance
/// measurer in tests and against real fonts in the renderer.
pub trait TextMeasure {
    /// Advance width of `text` laid out on one line, in pixels.
    fn measure(&mut self, text: &str, style: TextStyle) -> f32;
}

/// cosmic-text backed shaper and rasterizer.
pub struct TextEngine {
    font_system: FontSystem,
    swash_cache: SwashCache,
    family: Option<String>,
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("family", &self.family)
            .field("faces", &self.font_system.db().len())
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    /// Load system fonts plus any extra font directories.
    ///
    /// `family` selects a named family; `None` uses the default sans-serif.
    #[must_use]
    pub fn new(family: Option<String>, font_dirs: &[PathBuf]) -> Self {
        let mut font_system = FontSystem::new();
        for dir in font_dirs {
            font_system.db_mut().load_fonts_dir(dir);
        }
        let faces = font_system.db().len();
        if faces == 0 {
            tracing::warn!("No font faces available, text will not be drawn");
        } else {
            tracing::debug!("Text engine loaded {} font faces", faces);
        }

        Self {
            font_system,
            swash_cache: SwashCache::new(),
            family,
        }
    }

    /// Whether any font face is loaded.
    #[must_use]
    pub fn has_fonts(&self) -> bool {
        !self.font_system.db().is_empty()
    }

    fn shape(&mut self, text: &str, style: TextStyle) -> Buffer {
        let metrics = Metrics::new(style.size, style.line_height());
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, Some(f32::MAX), Some(f32::MAX));

        let family = self.family.as_deref().map_or(Family::SansSerif, Family::Name);
        let attrs = Attrs::new()
            .family(family)
            .weight(if style.bold { Weight::BOLD } else { Weight::NORMAL })
            .style(if style.italic { Style::Italic } else { Style::Normal });

        buffer.set_text(&mut self.font_system, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Draw `text` on one line, centered on `(center_x, center_y)`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn draw_centered(
        &mut self,
        pixmap: &mut Pixmap,
        text: &str,
        style: TextStyle,
        color: Rgba,
        center_x: f32,
        center_y: f32,
    ) {
        if text.is_empty() || !style.is_drawable() {
            return;
        }

        let buffer = self.shape(text, style);
        let width = widest_line(&buffer);
        let origin_x = (center_x - width / 2.0).round() as i32;
        let origin_y = (center_y - style.line_height() / 2.0).round() as i32;

        let (surface_w, surface_h) = (pixmap.width(), pixmap.height());
        let data = pixmap.data_mut();
        let ink = Color::rgba(color.r, color.g, color.b, color.a);

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            ink,
            |x, y, w, h, c| {
                for dy in 0..h {
                    for dx in 0..w {
                        blend_pixel(
                            data,
                            surface_w,
                            surface_h,
                            origin_x + x + dx as i32,
                            origin_y + y + dy as i32,
                            c,
                        );
                    }
                }
            },
        );
    }
}

impl TextMeasure for TextEngine {
    fn measure(&mut self, text: &str, style: TextStyle) -> f32 {
        if text.is_empty() || !style.is_drawable() {
            return 0.0;
        }
        let buffer = self.shape(text, style);
        widest_line(&buffer)
    }
}

fn widest_line(buffer: &Buffer) -> f32 {
    buffer
        .layout_runs()
        .map(|run| run.line_w)
        .fold(0.0_f32, f32::max)
}

/// Source-over blend of a straight-alpha color into premultiplied RGBA bytes.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
fn blend_pixel(data: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: Color) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let alpha = u32::from(color.a());
    if alpha == 0 {
        return;
    }

    let idx = ((y as u32 * width + x as u32) * 4) as usize;
    let inv = 255 - alpha;
    for (offset, channel) in [color.r(), color.g(), color.b()].into_iter().enumerate() {
        let src = u32::from(channel) * alpha / 255;
        let dst = u32::from(data[idx + offset]) * inv / 255;
        data[idx + offset] = (src + dst) as u8;
    }
    data[idx + 3] = (alpha + u32::from(data[idx + 3]) * inv / 255) as u8;
}
