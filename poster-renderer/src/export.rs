//! Encoding rendered posters to PNG, JPEG or data URIs.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use base64::Engine;
use image::ImageEncoder;
use serde::{Deserialize, Serialize};

use crate::engine::RasterSurface;
use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG, flattened onto the configured matte.
    Jpeg,
}

impl ExportFormat {
    /// MIME type.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> RenderResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(RenderError::Export(format!("Unsupported format: {other}"))),
        }
    }
}

/// Configuration for poster export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// JPEG quality 1-100 (default: 90).
    pub jpeg_quality: u8,
    /// RGB matte that translucent pixels are flattened onto for JPEG.
    pub matte: [u8; 3],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            matte: [255, 255, 255],
        }
    }
}

/// Encodes a [`RasterSurface`] to image formats.
#[derive(Debug, Clone, Default)]
pub struct SurfaceExporter {
    config: ExportConfig,
}

impl SurfaceExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Encode to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export(&self, surface: &RasterSurface, format: ExportFormat) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Png => Self::encode_png(surface),
            ExportFormat::Jpeg => self.encode_jpeg(surface),
        }
    }

    /// Encode to PNG bytes at full resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_png(surface: &RasterSurface) -> RenderResult<Vec<u8>> {
        surface
            .pixmap()
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Encode to JPEG bytes at full resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode_jpeg(&self, surface: &RasterSurface) -> RenderResult<Vec<u8>> {
        let (width, height) = (surface.width(), surface.height());
        let matte = self.config.matte;
        let rgba = surface.to_rgba8();

        let mut rgb_data = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for pixel in rgba.chunks_exact(4) {
            let alpha = f32::from(pixel[3]) / 255.0;
            let inv = 1.0 - alpha;
            for (channel, bg) in pixel[..3].iter().zip(matte) {
                rgb_data.push(f32::from(*channel).mul_add(alpha, f32::from(bg) * inv) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }

    /// Encode and wrap in a base64 `data:` URI.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_data_uri(&self, surface: &RasterSurface, format: ExportFormat) -> RenderResult<String> {
        let bytes = self.export(surface, format)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(format!("data:{};base64,{encoded}", format.mime()))
    }

    /// Encode and write to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_file(
        &self,
        surface: &RasterSurface,
        format: ExportFormat,
        path: &Path,
    ) -> RenderResult<()> {
        let bytes = self.export(surface, format)?;
        std::fs::write(path, &bytes)?;
        tracing::info!(
            "Exported {}x{} {} ({} bytes) to {}",
            surface.width(),
            surface.height(),
            format,
            bytes.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{PosterRenderer, RenderContext};
    use crate::slot::ImageSet;
    use poster_core::{AspectRatio, ElementKind, PosterDocument};

    fn surface(ratio: AspectRatio) -> RasterSurface {
        let mut doc = PosterDocument::new();
        doc.set_aspect_ratio(ratio);
        for kind in ElementKind::ALL {
            doc.set_visible(kind, false);
        }
        PosterRenderer::default()
            .render(&doc, &ImageSet::empty(), &RenderContext::export())
            .expect("render")
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let png = SurfaceExporter::encode_png(&surface(AspectRatio::Square)).expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_png_keeps_full_resolution() {
        let png = SurfaceExporter::encode_png(&surface(AspectRatio::Landscape)).expect("png");
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (1080, 607));
    }

    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let exporter = SurfaceExporter::default();
        let jpeg = exporter
            .export(&surface(AspectRatio::Classic), ExportFormat::Jpeg)
            .expect("jpeg");
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_data_uri_prefix() {
        let exporter = SurfaceExporter::default();
        let uri = exporter
            .to_data_uri(&surface(AspectRatio::Square), ExportFormat::Png)
            .expect("uri");
        assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PNG".parse::<ExportFormat>().expect("png"), ExportFormat::Png);
        assert_eq!("jpg".parse::<ExportFormat>().expect("jpg"), ExportFormat::Jpeg);
        assert!("gif".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Jpeg.to_string(), "jpeg");
    }
}
