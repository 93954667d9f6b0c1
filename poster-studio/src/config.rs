//! Command-line arguments and the configuration they resolve to.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use poster_core::AspectRatio;
use poster_renderer::{ExportFormat, RendererConfig};

use crate::generator::DEFAULT_ENDPOINT;

/// Default generation timeout in seconds.
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;

/// Command-line arguments for poster-studio.
#[derive(Debug, Clone, Parser)]
#[command(name = "poster-studio")]
#[command(about = "Compose a poster document and export it as an image")]
#[command(version)]
pub struct CliArgs {
    /// Poster document JSON to load (defaults to the built-in sample)
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Output file (defaults to `poster.<format>`)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Export format: png or jpeg
    #[arg(long, default_value = "png")]
    pub format: ExportFormat,

    /// Override the document's aspect ratio (1:1, 9:16, 16:9, 4:3)
    #[arg(long)]
    pub aspect: Option<AspectRatio>,

    /// Override the document's background theme prompt
    #[arg(long)]
    pub theme: Option<String>,

    /// Generate an AI background from the theme before exporting
    #[arg(long)]
    pub generate: bool,

    /// API key for the image generation service
    #[arg(long, env = "POSTER_IMAGE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Image generation endpoint (Imagen-style `:predict` URL)
    #[arg(long, env = "POSTER_IMAGE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Seconds to wait for a generated background (0 waits forever)
    #[arg(long, default_value_t = DEFAULT_GENERATION_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Logo source: data URI, http(s) URL or file path
    #[arg(long)]
    pub logo: Option<String>,

    /// QR code source: data URI, http(s) URL or file path
    #[arg(long)]
    pub qr: Option<String>,

    /// Background image source, used instead of the gradient
    #[arg(long)]
    pub background: Option<String>,

    /// Font family for all text
    #[arg(long)]
    pub font_family: Option<String>,

    /// Extra font directory (repeatable)
    #[arg(long = "font-dir")]
    pub font_dirs: Vec<PathBuf>,
}

/// Connection settings for the background generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// `:predict` endpoint URL.
    pub endpoint: String,
    /// API key; generation fails with a missing-credential error without one.
    pub api_key: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

/// Studio configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// Document to load.
    pub document: Option<PathBuf>,
    /// Explicit output path.
    pub output: Option<PathBuf>,
    /// Export format.
    pub format: ExportFormat,
    /// Aspect ratio override.
    pub aspect: Option<AspectRatio>,
    /// Theme override.
    pub theme: Option<String>,
    /// Whether to generate a background before exporting.
    pub generate: bool,
    /// Generation service settings.
    pub generator: GeneratorConfig,
    /// Upper bound on a single generation request.
    pub generation_timeout: Option<Duration>,
    /// Logo source override.
    pub logo: Option<String>,
    /// QR source override.
    pub qr: Option<String>,
    /// Background image source.
    pub background: Option<String>,
    /// Renderer settings.
    pub renderer: RendererConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StudioConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            document: None,
            output: None,
            format: ExportFormat::Png,
            aspect: None,
            theme: None,
            generate: false,
            generator: GeneratorConfig::default(),
            generation_timeout: Some(Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS)),
            logo: None,
            qr: None,
            background: None,
            renderer: RendererConfig::default(),
        }
    }

    /// Where the export is written.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("poster.{}", self.format.extension())))
    }
}

impl From<CliArgs> for StudioConfig {
    fn from(args: CliArgs) -> Self {
        let renderer = RendererConfig {
            font_family: args.font_family,
            font_dirs: args.font_dirs,
            ..RendererConfig::default()
        };
        Self {
            document: args.document,
            output: args.output,
            format: args.format,
            aspect: args.aspect,
            theme: args.theme,
            generate: args.generate,
            generator: GeneratorConfig {
                endpoint: args.endpoint,
                api_key: args.api_key.filter(|key| !key.trim().is_empty()),
            },
            generation_timeout: (args.timeout_secs > 0)
                .then(|| Duration::from_secs(args.timeout_secs)),
            logo: args.logo,
            qr: args.qr,
            background: args.background,
            renderer,
        }
    }
}
