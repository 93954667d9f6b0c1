//! Poster elements and their percentage-space placements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PosterError, PosterResult};

/// Lower bound of the percentage coordinate space.
pub const MIN_PERCENT: f32 = 0.0;
/// Upper bound of the percentage coordinate space.
pub const MAX_PERCENT: f32 = 100.0;
/// Smallest allowed element scale.
pub const MIN_SCALE: f32 = 0.1;
/// Largest allowed element scale.
pub const MAX_SCALE: f32 = 3.0;

/// The positionable elements of a poster.
///
/// The set is closed: every document carries exactly one placement per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    /// Brand logo image.
    Logo,
    /// Brand name text.
    Brand,
    /// Event name text.
    EventName,
    /// The duration/price badge pair.
    Badges,
    /// Main headline text.
    Headline,
    /// Wrapped sub-headline text.
    SubHeadline,
    /// Call-to-action pill.
    Cta,
    /// QR code image.
    Qr,
}

impl ElementKind {
    /// All element kinds in draw order.
    pub const ALL: [Self; 8] = [
        Self::Logo,
        Self::Brand,
        Self::EventName,
        Self::Badges,
        Self::Headline,
        Self::SubHeadline,
        Self::Qr,
        Self::Cta,
    ];

    /// Whether the element renders text (and therefore honours bold/italic).
    #[must_use]
    pub fn is_text(self) -> bool {
        !matches!(self, Self::Logo | Self::Qr)
    }

    /// Stable kebab-case name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logo => "logo",
            Self::Brand => "brand",
            Self::EventName => "event-name",
            Self::Badges => "badges",
            Self::Headline => "headline",
            Self::SubHeadline => "sub-headline",
            Self::Cta => "cta",
            Self::Qr => "qr",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = PosterError;

    fn from_str(s: &str) -> PosterResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PosterError::InvalidConfiguration(format!("unknown element: {s}")))
    }
}

/// Clamp a percentage coordinate into `[0, 100]`.
///
/// NaN maps to 0; infinities clamp to the nearest bound.
#[must_use]
pub fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        MIN_PERCENT
    } else {
        value.clamp(MIN_PERCENT, MAX_PERCENT)
    }
}

/// Clamp a scale multiplier into `[0.1, 3.0]`.
///
/// NaN maps to the neutral scale 1.0.
#[must_use]
pub fn clamp_scale(value: f32) -> f32 {
    if value.is_nan() {
        1.0
    } else {
        value.clamp(MIN_SCALE, MAX_SCALE)
    }
}

/// Position, scale, visibility and style of one element.
///
/// Fields are private so every write goes through the clamping setters;
/// deserialization clamps as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlacementRepr")]
pub struct ElementPlacement {
    x: f32,
    y: f32,
    scale: f32,
    visible: bool,
    bold: bool,
    italic: bool,
}

#[derive(Deserialize)]
struct PlacementRepr {
    x: f32,
    y: f32,
    #[serde(default = "default_scale")]
    scale: f32,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
}

fn default_scale() -> f32 {
    1.0
}

fn default_visible() -> bool {
    true
}

impl From<PlacementRepr> for ElementPlacement {
    fn from(repr: PlacementRepr) -> Self {
        Self::new(repr.x, repr.y)
            .with_scale(repr.scale)
            .with_visible(repr.visible)
            .with_style(repr.bold, repr.italic)
    }
}

impl ElementPlacement {
    /// Create a visible placement at `(x, y)` with scale 1.0 and no styling.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
            scale: 1.0,
            visible: true,
            bold: false,
            italic: false,
        }
    }

    /// Set the scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.set_scale(scale);
        self
    }

    /// Set visibility.
    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set bold and italic flags.
    #[must_use]
    pub fn with_style(mut self, bold: bool, italic: bool) -> Self {
        self.bold = bold;
        self.italic = italic;
        self
    }

    /// Horizontal anchor in percent.
    #[must_use]
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Vertical anchor in percent.
    #[must_use]
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Uniform scale multiplier.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether the element is drawn and hit-testable.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Bold flag (text elements only).
    #[must_use]
    pub fn bold(&self) -> bool {
        self.bold
    }

    /// Italic flag (text elements only).
    #[must_use]
    pub fn italic(&self) -> bool {
        self.italic
    }

    /// Move the anchor, clamping both axes.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = clamp_percent(x);
        self.y = clamp_percent(y);
    }

    /// Change the scale, clamping into the allowed domain.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = clamp_scale(scale);
    }

    /// Show or hide the element. Position and scale are untouched.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Set the bold flag.
    pub fn set_bold(&mut self, bold: bool) {
        self.bold = bold;
    }

    /// Set the italic flag.
    pub fn set_italic(&mut self, italic: bool) {
        self.italic = italic;
    }
}

/// One placement per [`ElementKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placements {
    logo: ElementPlacement,
    brand: ElementPlacement,
    event_name: ElementPlacement,
    badges: ElementPlacement,
    headline: ElementPlacement,
    sub_headline: ElementPlacement,
    cta: ElementPlacement,
    qr: ElementPlacement,
}

impl Placements {
    /// Placement for the given element.
    #[must_use]
    pub fn get(&self, kind: ElementKind) -> &ElementPlacement {
        match kind {
            ElementKind::Logo => &self.logo,
            ElementKind::Brand => &self.brand,
            ElementKind::EventName => &self.event_name,
            ElementKind::Badges => &self.badges,
            ElementKind::Headline => &self.headline,
            ElementKind::SubHeadline => &self.sub_headline,
            ElementKind::Cta => &self.cta,
            ElementKind::Qr => &self.qr,
        }
    }

    /// Mutable placement for the given element.
    pub fn get_mut(&mut self, kind: ElementKind) -> &mut ElementPlacement {
        match kind {
            ElementKind::Logo => &mut self.logo,
            ElementKind::Brand => &mut self.brand,
            ElementKind::EventName => &mut self.event_name,
            ElementKind::Badges => &mut self.badges,
            ElementKind::Headline => &mut self.headline,
            ElementKind::SubHeadline => &mut self.sub_headline,
            ElementKind::Cta => &mut self.cta,
            ElementKind::Qr => &mut self.qr,
        }
    }

    /// Iterate `(kind, placement)` pairs in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementKind, &ElementPlacement)> {
        ElementKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Iterate visible elements in draw order.
    pub fn visible(&self) -> impl Iterator<Item = (ElementKind, &ElementPlacement)> {
        self.iter().filter(|(_, placement)| placement.visible())
    }
}

impl Default for Placements {
    fn default() -> Self {
        Self {
            logo: ElementPlacement::new(50.0, 4.0),
            brand: ElementPlacement::new(50.0, 20.0).with_style(true, false),
            event_name: ElementPlacement::new(50.0, 26.0),
            badges: ElementPlacement::new(50.0, 31.0).with_style(true, false),
            headline: ElementPlacement::new(50.0, 44.0).with_style(true, false),
            sub_headline: ElementPlacement::new(50.0, 54.0),
            cta: ElementPlacement::new(50.0, 72.0).with_style(true, false),
            qr: ElementPlacement::new(84.0, 84.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_clamps_on_construction() {
        let placement = ElementPlacement::new(-12.0, 140.0).with_scale(9.0);
        assert_eq!(placement.x(), 0.0);
        assert_eq!(placement.y(), 100.0);
        assert_eq!(placement.scale(), MAX_SCALE);
    }

    #[test]
    fn test_non_finite_values_are_clamped() {
        let mut placement = ElementPlacement::new(f32::NAN, f32::INFINITY);
        assert_eq!(placement.x(), 0.0);
        assert_eq!(placement.y(), 100.0);

        placement.set_scale(f32::NAN);
        assert_eq!(placement.scale(), 1.0);
        placement.set_scale(0.0);
        assert_eq!(placement.scale(), MIN_SCALE);
    }

    #[test]
    fn test_hiding_preserves_geometry() {
        let mut placement = ElementPlacement::new(30.0, 40.0).with_scale(1.5);
        placement.set_visible(false);
        placement.set_visible(true);
        assert_eq!(placement, ElementPlacement::new(30.0, 40.0).with_scale(1.5));
    }

    #[test]
    fn test_deserialize_clamps() {
        let placement: ElementPlacement =
            serde_json::from_str(r#"{"x": 250.0, "y": -3.0, "scale": 0.01, "visible": true}"#)
                .expect("placement json");
        assert_eq!(placement.x(), 100.0);
        assert_eq!(placement.y(), 0.0);
        assert_eq!(placement.scale(), MIN_SCALE);
        assert!(!placement.bold());
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ElementKind::ALL {
            let parsed: ElementKind = kind.as_str().parse().expect("known kind");
            assert_eq!(parsed, kind);
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{kind}\""));
        }
        assert!("banner".parse::<ElementKind>().is_err());
    }

    #[test]
    fn test_draw_order_ends_with_qr_then_cta() {
        assert_eq!(ElementKind::ALL[0], ElementKind::Logo);
        assert_eq!(ElementKind::ALL[6], ElementKind::Qr);
        assert_eq!(ElementKind::ALL[7], ElementKind::Cta);
        assert!(!ElementKind::Logo.is_text());
        assert!(!ElementKind::Qr.is_text());
        assert!(ElementKind::Badges.is_text());
    }

    #[test]
    fn test_placements_lookup_is_exhaustive() {
        let mut placements = Placements::default();
        placements.get_mut(ElementKind::Qr).set_position(10.0, 12.0);
        assert_eq!(placements.get(ElementKind::Qr).x(), 10.0);
        assert_eq!(placements.iter().count(), 8);

        placements.get_mut(ElementKind::Brand).set_visible(false);
        assert_eq!(placements.visible().count(), 7);
    }
}
