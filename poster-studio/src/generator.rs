//! AI background generation.
//!
//! The session only sees the [`BackgroundGenerator`] trait.
//! [`HttpBackgroundGenerator`] speaks an Imagen-style `:predict` JSON API:
//!
//! ```text
//! POST <endpoint>
//! { "instances": [{ "prompt": "..." }],
//!   "parameters": { "sampleCount": 1, "aspectRatio": "9:16" } }
//!
//! 200 { "predictions": [{ "bytesBase64Encoded": "...", "mimeType": "image/png" }] }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use poster_core::AspectRatio;
use poster_renderer::ImageFormat;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::GeneratorConfig;

/// Default Imagen `:predict` endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/imagen-3.0-generate-002:predict";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Errors that can occur while generating a background.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key is configured. Raised before any network I/O.
    #[error("no API key configured for background generation")]
    MissingCredential,
    /// The configured endpoint is not a valid URL.
    #[error("invalid generation endpoint: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, malformed body, etc.).
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with an error status.
    #[error("generation service error {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },
    /// The service answered successfully but returned no image.
    #[error("generation service returned no image")]
    EmptyResult,
    /// The returned image payload is unusable.
    #[error("generated image could not be decoded: {0}")]
    Decode(String),
    /// The request did not finish within the session's timeout.
    #[error("background generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// A generated background, ready to load into the background slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// MIME type of the payload.
    pub mime_type: String,
    /// `data:<mime>;base64,<payload>` URI.
    pub data_uri: String,
}

impl GeneratedImage {
    /// Wrap an already base64-encoded payload.
    #[must_use]
    pub fn from_base64(mime_type: impl Into<String>, payload: &str) -> Self {
        let mime_type = mime_type.into();
        let data_uri = format!("data:{mime_type};base64,{payload}");
        Self {
            mime_type,
            data_uri,
        }
    }
}

/// Produces background images from a theme prompt.
#[async_trait]
pub trait BackgroundGenerator: Send + Sync {
    /// Generate one background for `theme` at `aspect`.
    async fn generate(
        &self,
        theme: &str,
        aspect: AspectRatio,
    ) -> Result<GeneratedImage, GenerationError>;
}

/// Text prompt sent for a theme.
#[must_use]
pub fn background_prompt(theme: &str) -> String {
    let theme = theme.trim();
    let subject = if theme.is_empty() {
        "soft abstract gradient"
    } else {
        theme
    };
    format!(
        "Poster background artwork: {subject}. No text, letters or logos. \
         Keep the composition calm so overlaid typography stays readable."
    )
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: AspectRatio,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: ServiceErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    message: String,
}

/// Pull a human-readable message out of an error response body.
fn service_message(body: &str) -> String {
    serde_json::from_str::<ServiceErrorBody>(body).map_or_else(
        |_| body.trim().chars().take(200).collect(),
        |parsed| parsed.error.message,
    )
}

/// [`BackgroundGenerator`] backed by an Imagen-style HTTP endpoint.
#[derive(Clone)]
pub struct HttpBackgroundGenerator {
    inner: Arc<InnerGenerator>,
}

struct InnerGenerator {
    http: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpBackgroundGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackgroundGenerator")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("has_api_key", &self.inner.api_key.is_some())
            .finish()
    }
}

impl HttpBackgroundGenerator {
    /// Create a generator for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidUrl`] if the endpoint is malformed.
    /// Returns [`GenerationError::Http`] if the HTTP client fails to build.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|e| GenerationError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("poster-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            inner: Arc::new(InnerGenerator {
                http,
                endpoint,
                api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            }),
        })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

#[async_trait]
impl BackgroundGenerator for HttpBackgroundGenerator {
    async fn generate(
        &self,
        theme: &str,
        aspect: AspectRatio,
    ) -> Result<GeneratedImage, GenerationError> {
        let Some(api_key) = self.inner.api_key.as_deref() else {
            return Err(GenerationError::MissingCredential);
        };

        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: background_prompt(theme),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect,
            },
        };

        debug!(
            "Requesting {} background from {}",
            aspect, self.inner.endpoint
        );
        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message: service_message(&body),
            });
        }

        let body: PredictResponse = response.json().await?;
        let (payload, mime_type) = body
            .predictions
            .into_iter()
            .find_map(|p| match p.bytes_base64_encoded {
                Some(bytes) if !bytes.trim().is_empty() => Some((bytes, p.mime_type)),
                _ => None,
            })
            .ok_or(GenerationError::EmptyResult)?;

        let payload = payload.trim();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        let format = ImageFormat::from_magic_bytes(&bytes);
        if format == ImageFormat::Unknown {
            return Err(GenerationError::Decode(
                "payload is not a PNG, JPEG or WebP image".to_string(),
            ));
        }
        let mime_type = mime_type
            .filter(|m| ImageFormat::from_mime(m) != ImageFormat::Unknown)
            .unwrap_or_else(|| format.mime().to_string());

        debug!("Generated {} background ({} bytes)", mime_type, bytes.len());
        Ok(GeneratedImage::from_base64(mime_type, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_theme_and_forbids_text() {
        let prompt = background_prompt("  neon city at night ");
        assert!(prompt.contains("neon city at night."));
        assert!(prompt.contains("No text"));
    }

    #[test]
    fn test_blank_theme_gets_a_subject() {
        assert!(background_prompt("").contains("abstract gradient"));
    }

    #[test]
    fn test_request_wire_shape() {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: "p".to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: AspectRatio::Landscape,
            },
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "instances": [{"prompt": "p"}],
                "parameters": {"sampleCount": 1, "aspectRatio": "16:9"}
            })
        );
    }

    #[test]
    fn test_service_message_prefers_structured_error() {
        let body = r#"{"error": {"code": 400, "message": "prompt blocked"}}"#;
        assert_eq!(service_message(body), "prompt blocked");
        assert_eq!(service_message(" upstream down \n"), "upstream down");
    }

    #[test]
    fn test_generated_image_data_uri() {
        let image = GeneratedImage::from_base64("image/png", "AAAA");
        assert_eq!(image.data_uri, "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = GeneratorConfig {
            endpoint: "not a url".to_string(),
            api_key: Some("key".to_string()),
        };
        assert!(matches!(
            HttpBackgroundGenerator::new(&config),
            Err(GenerationError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_fast() {
        let generator = HttpBackgroundGenerator::new(&GeneratorConfig::default()).expect("client");
        let result = generator.generate("beach", AspectRatio::Square).await;
        assert!(matches!(result, Err(GenerationError::MissingCredential)));
    }

    #[test]
    fn test_timeout_message() {
        let err = GenerationError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "background generation timed out after 30s");
    }
}
