//! # Poster Core
//!
//! Layout model and pointer interaction for the poster compositor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 poster-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Layout Model        │  Interaction         │
//! │  - PosterDocument    │  - Hit-testing       │
//! │  - ElementPlacement  │  - Drag + snapping   │
//! │  - DocumentEdit      │  - Selection         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! All geometry lives in percentage space (`[0, 100]` on both axes); pixels
//! only appear in the renderer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod document;
pub mod edit;
pub mod element;
pub mod error;
pub mod event;
pub mod interaction;

pub use color::Rgba;
pub use document::{AspectRatio, ColorSlot, Palette, PosterContent, PosterDocument, TextField};
pub use edit::DocumentEdit;
pub use element::{ElementKind, ElementPlacement, Placements};
pub use error::{PosterError, PosterResult};
pub use event::{CanvasRect, PercentPoint, PointerEvent, PointerPhase};
pub use interaction::{
    hit_test, snap_to_grid, DragState, InteractionConfig, InteractionController, PointerOutcome,
};

/// Poster core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
