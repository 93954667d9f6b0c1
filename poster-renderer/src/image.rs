//! Image decoding for poster assets.
//!
//! Logos, QR codes and backgrounds arrive as raw bytes or base64 data URIs.
//! Everything is decoded to straight-alpha RGBA first and then converted
//! into a premultiplied [`ImageHandle`] the renderer can draw.

use std::sync::Arc;

use base64::Engine;
use poster_core::Rgba;
use tiny_skia::Pixmap;

use crate::error::{RenderError, RenderResult};

/// Container format of an encoded asset, as far as the poster cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG, the usual logo and QR format.
    Png,
    /// JPEG, typical for photographic backgrounds.
    Jpeg,
    /// WebP.
    WebP,
    /// Anything else; `image` may still decode it.
    Unknown,
}

/// Leading-byte signatures, checked in order.
const SIGNATURES: [(&[u8], ImageFormat); 2] = [
    (b"\x89PNG".as_slice(), ImageFormat::Png),
    (b"\xFF\xD8\xFF".as_slice(), ImageFormat::Jpeg),
];

impl ImageFormat {
    /// Classify a MIME type, ignoring case and any `;` parameters.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        [Self::Png, Self::Jpeg, Self::WebP]
            .into_iter()
            .find(|format| format.mime().eq_ignore_ascii_case(essence))
            .unwrap_or(if essence.eq_ignore_ascii_case("image/jpg") {
                Self::Jpeg
            } else {
                Self::Unknown
            })
    }

    /// Sniff the format from the first bytes of an encoded image.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if let Some((_, format)) = SIGNATURES.iter().find(|(sig, _)| data.starts_with(sig)) {
            return *format;
        }
        match data.get(..12) {
            Some([b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P']) => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// MIME type for data URIs.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// A decoded image in straight-alpha RGBA.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Original format of the image.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// A solid color image.
    #[must_use]
    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        let data = [color.r, color.g, color.b, color.a].repeat(pixel_count);
        Self {
            width,
            height,
            data,
            format: ImageFormat::Unknown,
        }
    }

    /// Premultiply and upload into a drawable handle.
    ///
    /// # Errors
    ///
    /// Returns an error for zero-sized images or mismatched buffer lengths.
    pub fn into_handle(self) -> RenderResult<ImageHandle> {
        let mut pixmap = Pixmap::new(self.width, self.height).ok_or_else(|| {
            RenderError::Resource(format!(
                "Cannot allocate {}x{} image",
                self.width, self.height
            ))
        })?;
        if pixmap.data().len() != self.data.len() {
            return Err(RenderError::Resource(format!(
                "Pixel buffer holds {} bytes, expected {}",
                self.data.len(),
                pixmap.data().len()
            )));
        }

        let mut rgba = self.data;
        premultiply_rgba_in_place(&mut rgba);
        pixmap.data_mut().copy_from_slice(&rgba);

        Ok(ImageHandle {
            pixmap: Arc::new(pixmap),
        })
    }
}

/// A decoded, premultiplied image ready to draw. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pixmap: Arc<Pixmap>,
}

impl ImageHandle {
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

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// The premultiplied pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

/// Decode an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::trace!("Decoded {:?} image {}x{}", format, width, height);

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}

/// Decode an image from a data URI.
///
/// Supports `data:image/png;base64,iVBORw0KGgo...` as well as
/// percent-encoded payloads.
///
/// # Errors
///
/// Returns an error if the data URI is malformed or the image cannot be decoded.
pub fn load_image_from_data_uri(uri: &str) -> RenderResult<DecodedImage> {
    let bytes = decode_data_uri(uri)?;
    load_image_from_bytes(&bytes)
}

/// Extract the payload bytes of a data URI.
///
/// # Errors
///
/// Returns an error if the URI is not a data URI or its payload is malformed.
pub fn decode_data_uri(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, encoded) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(encoded)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = input
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply_rgba_in_place(bytes: &mut [u8]) {
    for pixel in bytes.chunks_exact_mut(4) {
        let alpha = u16::from(pixel[3]);
        for channel in &mut pixel[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }
}
