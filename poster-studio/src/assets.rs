//! Resolving image sources to decoded, render-ready images.

use std::fmt;
use std::path::PathBuf;

use poster_renderer::image::{decode_data_uri, load_image_from_bytes};
use poster_renderer::{ImageHandle, RenderResult};
use reqwest::Client;
use url::Url;

use crate::error::{StudioError, StudioResult};

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:` URI.
    DataUri(String),
    /// Remote `http(s)://` URL.
    Url(Url),
    /// Local file.
    File(PathBuf),
}

impl ImageSource {
    /// Classify a user-supplied source string.
    ///
    /// Anything that is neither a data URI nor an absolute URL is treated as
    /// a file path, including Windows drive paths such as `C:\logo.png`.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Asset`] for blank input, unsupported URL
    /// schemes, or `file:` URLs that don't map to a path.
    pub fn parse(source: &str) -> StudioResult<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(StudioError::Asset("empty image source".to_string()));
        }
        if source.starts_with("data:") {
            return Ok(Self::DataUri(source.to_string()));
        }

        match Url::parse(source) {
            Ok(url) if url.scheme().len() > 1 => match url.scheme() {
                "http" | "https" => Ok(Self::Url(url)),
                "file" => url.to_file_path().map(Self::File).map_err(|()| {
                    StudioError::Asset(format!("file URL has no local path: {source}"))
                }),
                other => Err(StudioError::Asset(format!(
                    "unsupported image source scheme: {other}"
                ))),
            },
            _ => Ok(Self::File(PathBuf::from(source))),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataUri(uri) => write!(f, "data URI ({} chars)", uri.len()),
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches and decodes images. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    http: Client,
}

impl AssetLoader {
    /// Create a loader with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Asset`] if the HTTP client fails to build.
    pub fn new() -> StudioResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("poster-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StudioError::Asset(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Parse `source` and load it.
    ///
    /// # Errors
    ///
    /// See [`ImageSource::parse`] and [`AssetLoader::load`].
    pub async fn load_str(&self, source: &str) -> StudioResult<ImageHandle> {
        self.load(&ImageSource::parse(source)?).await
    }

    /// Read the bytes behind `source` and decode them off the async runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or is not a decodable
    /// image.
    pub async fn load(&self, source: &ImageSource) -> StudioResult<ImageHandle> {
        let bytes = match source {
            ImageSource::DataUri(uri) => decode_data_uri(uri)?,
            ImageSource::Url(url) => self.fetch(url).await?,
            ImageSource::File(path) => tokio::fs::read(path).await?,
        };
        tracing::debug!("Decoding {} ({} bytes)", source, bytes.len());

        tokio::task::spawn_blocking(move || -> RenderResult<ImageHandle> {
            load_image_from_bytes(&bytes)?.into_handle()
        })
        .await
        .map_err(|e| StudioError::Asset(format!("decode task failed: {e}")))?
        .map_err(StudioError::from)
    }

    async fn fetch(&self, url: &Url) -> StudioResult<Vec<u8>> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| StudioError::Asset(format!("failed to fetch {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::Asset(format!("{url} returned {status}")));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| StudioError::Asset(format!("failed to read {url}: {e}")))?;
        Ok(body.to_vec())
    }
}
