//! Serializable document edits issued by the UI layer.

use serde::{Deserialize, Serialize};

use crate::{AspectRatio, ColorSlot, ElementKind, PosterDocument, Rgba, TextField};

/// A single mutation of a [`PosterDocument`], one variant per setter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DocumentEdit {
    /// Change the output aspect ratio.
    SetAspectRatio {
        /// New ratio.
        ratio: AspectRatio,
    },
    /// Change the background theme prompt.
    SetTheme {
        /// New theme text.
        theme: String,
    },
    /// Change the logo source.
    SetLogoUrl {
        /// New source, or `None` to remove the logo.
        url: Option<String>,
    },
    /// Change the QR source.
    SetQrUrl {
        /// New source, or `None` to remove the QR code.
        url: Option<String>,
    },
    /// Replace a text field.
    SetText {
        /// Field to replace.
        field: TextField,
        /// New value.
        value: String,
    },
    /// Replace a color.
    SetColor {
        /// Color to replace.
        slot: ColorSlot,
        /// New color.
        color: Rgba,
    },
    /// Move an element.
    SetPosition {
        /// Element to move.
        element: ElementKind,
        /// New x in percent.
        x: f32,
        /// New y in percent.
        y: f32,
    },
    /// Rescale an element.
    SetScale {
        /// Element to rescale.
        element: ElementKind,
        /// New scale multiplier.
        scale: f32,
    },
    /// Show or hide an element.
    SetVisible {
        /// Element to toggle.
        element: ElementKind,
        /// New visibility.
        visible: bool,
    },
    /// Set the bold flag of a text element.
    SetBold {
        /// Element to style.
        element: ElementKind,
        /// New flag.
        bold: bool,
    },
    /// Set the italic flag of a text element.
    SetItalic {
        /// Element to style.
        element: ElementKind,
        /// New flag.
        italic: bool,
    },
}

impl DocumentEdit {
    /// Apply this edit to a document.
    pub fn apply(&self, doc: &mut PosterDocument) {
        match self {
            Self::SetAspectRatio { ratio } => doc.set_aspect_ratio(*ratio),
            Self::SetTheme { theme } => doc.set_theme(theme.clone()),
            Self::SetLogoUrl { url } => doc.set_logo_url(url.clone()),
            Self::SetQrUrl { url } => doc.set_qr_url(url.clone()),
            Self::SetText { field, value } => doc.set_text(*field, value.clone()),
            Self::SetColor { slot, color } => doc.set_color(*slot, *color),
            Self::SetPosition { element, x, y } => doc.set_position(*element, *x, *y),
            Self::SetScale { element, scale } => doc.set_scale(*element, *scale),
            Self::SetVisible { element, visible } => doc.set_visible(*element, *visible),
            Self::SetBold { element, bold } => doc.set_bold(*element, *bold),
            Self::SetItalic { element, italic } => doc.set_italic(*element, *italic),
        }
    }
}
