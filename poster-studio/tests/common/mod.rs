//! Shared fixtures for poster-studio integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use poster_core::{AspectRatio, PosterDocument, Rgba};
use poster_renderer::DecodedImage;
use poster_studio::{
    BackgroundGenerator, EditorSession, GeneratedImage, GenerationError, SessionOptions,
};

/// Base64-encoded PNG of a solid `width`x`height` image.
pub fn png_base64(width: u32, height: u32, color: Rgba) -> String {
    let handle = DecodedImage::solid(width, height, color)
        .into_handle()
        .expect("solid image");
    let png = handle.pixmap().encode_png().expect("encode png");
    base64::engine::general_purpose::STANDARD.encode(png)
}

/// `data:` URI of a solid PNG.
pub fn png_data_uri(width: u32, height: u32, color: Rgba) -> String {
    format!("data:image/png;base64,{}", png_base64(width, height, color))
}

/// Generator that answers with a solid PNG sized `width`x`height` after
/// `delay`, regardless of theme.
pub struct SolidGenerator {
    pub width: u32,
    pub height: u32,
    pub delay: Duration,
}

impl SolidGenerator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl BackgroundGenerator for SolidGenerator {
    async fn generate(
        &self,
        _theme: &str,
        _aspect: AspectRatio,
    ) -> Result<GeneratedImage, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(GeneratedImage::from_base64(
            "image/png",
            &png_base64(self.width, self.height, Rgba::rgb(200, 40, 40)),
        ))
    }
}

/// Generator whose answers are decided per call, in call order.
pub struct SequenceGenerator {
    steps: std::sync::Mutex<std::collections::VecDeque<SolidGenerator>>,
}

impl SequenceGenerator {
    pub fn new(steps: Vec<SolidGenerator>) -> Self {
        Self {
            steps: std::sync::Mutex::new(steps.into()),
        }
    }
}

#[async_trait]
impl BackgroundGenerator for SequenceGenerator {
    async fn generate(
        &self,
        theme: &str,
        aspect: AspectRatio,
    ) -> Result<GeneratedImage, GenerationError> {
        let step = self
            .steps
            .lock()
            .expect("steps lock")
            .pop_front()
            .ok_or(GenerationError::EmptyResult)?;
        step.generate(theme, aspect).await
    }
}

pub fn session_with(generator: Arc<dyn BackgroundGenerator>) -> EditorSession {
    EditorSession::new(PosterDocument::new(), generator, SessionOptions::default())
        .expect("session")
}
