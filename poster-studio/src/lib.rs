//! # Poster Studio
//!
//! Editing session and command-line host for the poster compositor.
//!
//! ## Usage
//!
//! ```bash
//! poster-studio --document poster.json --output poster.png
//! POSTER_IMAGE_API_KEY=... poster-studio --theme "sunrise over dunes" --generate
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `StudioConfig` - Resolved configuration
//! - `EditorSession` - Owns document, controller, image slots and renderer
//! - `BackgroundGenerator` - Async seam for AI backgrounds
//! - `AssetLoader` - Data URI, URL and file image sources

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod generator;
pub mod session;

pub use app::run;
pub use assets::{AssetLoader, ImageSource};
pub use config::{CliArgs, GeneratorConfig, StudioConfig};
pub use error::{StudioError, StudioResult};
pub use generator::{
    background_prompt, BackgroundGenerator, GeneratedImage, GenerationError,
    HttpBackgroundGenerator,
};
pub use session::{
    EditorSession, GenerationTicket, Notice, NoticeLevel, SessionEvent, SessionOptions,
};
