//! # Poster Renderer
//!
//! Deterministic software render engine for poster documents.
//!
//! ## Pipeline
//!
//! ```text
//! ┌────────────────┐   ┌────────────────┐   ┌────────────────┐
//! │ PosterDocument │──►│ compute_layout │──►│ PosterRenderer │──► RasterSurface
//! │ + ImageSet     │   │ (TextMeasure)  │   │ (tiny-skia)    │        │
//! └────────────────┘   └────────────────┘   └────────────────┘        ▼
//!                                                            SurfaceExporter
//!                                                            PNG / JPEG / data URI
//! ```
//!
//! Layout is pure and measured before anything is painted. Images are read
//! from an [`ImageSet`] snapshot, so rendering never waits on a load.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image;
pub mod layout;
pub mod slot;
pub mod text;

pub use engine::{PosterRenderer, RasterSurface, RenderContext, RenderMode, RendererConfig};
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, SurfaceExporter};
pub use geometry::{CanvasGeometry, CANVAS_WIDTH};
pub use image::{DecodedImage, ImageFormat, ImageHandle};
pub use layout::{compute_layout, wrap_lines, ElementLayout, ImageDimensions, PosterLayout};
pub use slot::{ImageRole, ImageSet, ImageSlot, ImageSlots, LoadTicket};
pub use text::{TextEngine, TextMeasure, TextStyle};
