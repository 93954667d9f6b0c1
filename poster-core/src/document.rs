//! The poster document - aggregate root of the layout model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ElementKind, ElementPlacement, Placements, PosterError, PosterResult, Rgba};

/// Output aspect ratio. Only these four ratios exist on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    /// `1:1`
    Square,
    /// `9:16`
    #[default]
    Portrait,
    /// `16:9`
    Landscape,
    /// `4:3`
    Classic,
}

impl AspectRatio {
    /// All supported ratios.
    pub const ALL: [Self; 4] = [Self::Square, Self::Portrait, Self::Landscape, Self::Classic];

    /// The `(width, height)` terms of the ratio.
    #[must_use]
    pub fn ratio(self) -> (u32, u32) {
        match self {
            Self::Square => (1, 1),
            Self::Portrait => (9, 16),
            Self::Landscape => (16, 9),
            Self::Classic => (4, 3),
        }
    }

    /// Wire literal, e.g. `"9:16"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
            Self::Classic => "4:3",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = PosterError;

    fn from_str(s: &str) -> PosterResult<Self> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| {
                PosterError::InvalidConfiguration(format!("unsupported aspect ratio: {s}"))
            })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = PosterError;

    fn try_from(value: String) -> PosterResult<Self> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(ratio: AspectRatio) -> Self {
        ratio.as_str().to_string()
    }
}

/// Text content of the poster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterContent {
    /// Brand name (drawn upper-cased).
    pub brand_name: String,
    /// Event name (drawn upper-cased).
    pub event_name: String,
    /// Duration label, first badge.
    pub duration: String,
    /// Price label, second badge.
    pub price: String,
    /// Headline.
    pub headline: String,
    /// Sub-headline, wrapped over several lines.
    pub sub_headline: String,
    /// Call-to-action label (drawn upper-cased).
    pub cta_text: String,
}

impl Default for PosterContent {
    fn default() -> Self {
        Self {
            brand_name: "Northwind Academy".to_string(),
            event_name: "Summer Intensive".to_string(),
            duration: "8 Weeks".to_string(),
            price: "$499".to_string(),
            headline: "Level Up Your Craft".to_string(),
            sub_headline: "Hands-on workshops, mentorship from industry experts and a portfolio \
                           project you will be proud of."
                .to_string(),
            cta_text: "Enroll Now".to_string(),
        }
    }
}

/// Colors of the poster: one tint per text element plus the box fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    /// Brand name tint.
    pub brand: Rgba,
    /// Event name tint.
    pub event_name: Rgba,
    /// Badge label tint.
    pub badge_text: Rgba,
    /// Headline tint.
    pub headline: Rgba,
    /// Sub-headline tint.
    pub sub_headline: Rgba,
    /// CTA label tint.
    pub cta_text: Rgba,
    /// Duration badge fill.
    pub duration_badge: Rgba,
    /// Price badge fill.
    pub price_badge: Rgba,
    /// CTA pill fill.
    pub cta_background: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            brand: Rgba::WHITE,
            event_name: Rgba::rgb(0xcb, 0xd5, 0xe1),
            badge_text: Rgba::rgb(0x0f, 0x17, 0x2a),
            headline: Rgba::WHITE,
            sub_headline: Rgba::rgb(0xe2, 0xe8, 0xf0),
            cta_text: Rgba::rgb(0x0f, 0x17, 0x2a),
            duration_badge: Rgba::rgb(0xfa, 0xcc, 0x15),
            price_badge: Rgba::rgb(0x38, 0xbd, 0xf8),
            cta_background: Rgba::rgb(0xfa, 0xcc, 0x15),
        }
    }
}

/// Addressable text fields of [`PosterContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    /// [`PosterContent::brand_name`]
    BrandName,
    /// [`PosterContent::event_name`]
    EventName,
    /// [`PosterContent::duration`]
    Duration,
    /// [`PosterContent::price`]
    Price,
    /// [`PosterContent::headline`]
    Headline,
    /// [`PosterContent::sub_headline`]
    SubHeadline,
    /// [`PosterContent::cta_text`]
    CtaText,
}

/// Addressable colors of [`Palette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorSlot {
    /// [`Palette::brand`]
    Brand,
    /// [`Palette::event_name`]
    EventName,
    /// [`Palette::badge_text`]
    BadgeText,
    /// [`Palette::headline`]
    Headline,
    /// [`Palette::sub_headline`]
    SubHeadline,
    /// [`Palette::cta_text`]
    CtaText,
    /// [`Palette::duration_badge`]
    DurationBadge,
    /// [`Palette::price_badge`]
    PriceBadge,
    /// [`Palette::cta_background`]
    CtaBackground,
}

/// The poster configuration edited during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterDocument {
    /// Output aspect ratio.
    pub aspect_ratio: AspectRatio,
    /// Text content.
    pub content: PosterContent,
    /// Colors.
    pub palette: Palette,
    /// Scene description handed to the background generator.
    pub theme: String,
    /// Logo image source (URL, data URI or path).
    pub logo_url: Option<String>,
    /// QR image source; `None` means no QR is drawn.
    pub qr_url: Option<String>,
    placements: Placements,
}

impl Default for PosterDocument {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            content: PosterContent::default(),
            palette: Palette::default(),
            theme: "Moody studio with soft teal and amber light, abstract shapes".to_string(),
            logo_url: None,
            qr_url: None,
            placements: Placements::default(),
        }
    }
}

impl PosterDocument {
    /// Create a document with the default design.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All placements.
    #[must_use]
    pub fn placements(&self) -> &Placements {
        &self.placements
    }

    /// Placement of one element.
    #[must_use]
    pub fn placement(&self, kind: ElementKind) -> &ElementPlacement {
        self.placements.get(kind)
    }

    /// Text content accessor.
    #[must_use]
    pub fn text(&self, field: TextField) -> &str {
        let c = &self.content;
        match field {
            TextField::BrandName => &c.brand_name,
            TextField::EventName => &c.event_name,
            TextField::Duration => &c.duration,
            TextField::Price => &c.price,
            TextField::Headline => &c.headline,
            TextField::SubHeadline => &c.sub_headline,
            TextField::CtaText => &c.cta_text,
        }
    }

    /// Color accessor.
    #[must_use]
    pub fn color(&self, slot: ColorSlot) -> Rgba {
        let p = &self.palette;
        match slot {
            ColorSlot::Brand => p.brand,
            ColorSlot::EventName => p.event_name,
            ColorSlot::BadgeText => p.badge_text,
            ColorSlot::Headline => p.headline,
            ColorSlot::SubHeadline => p.sub_headline,
            ColorSlot::CtaText => p.cta_text,
            ColorSlot::DurationBadge => p.duration_badge,
            ColorSlot::PriceBadge => p.price_badge,
            ColorSlot::CtaBackground => p.cta_background,
        }
    }

    /// Change the aspect ratio.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.aspect_ratio = ratio;
    }

    /// Change the background theme prompt.
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.theme = theme.into();
    }

    /// Change the logo source.
    pub fn set_logo_url(&mut self, url: Option<String>) {
        self.logo_url = url;
    }

    /// Change the QR source.
    pub fn set_qr_url(&mut self, url: Option<String>) {
        self.qr_url = url;
    }

    /// Replace one text field.
    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) {
        let value = value.into();
        let c = &mut self.content;
        match field {
            TextField::BrandName => c.brand_name = value,
            TextField::EventName => c.event_name = value,
            TextField::Duration => c.duration = value,
            TextField::Price => c.price = value,
            TextField::Headline => c.headline = value,
            TextField::SubHeadline => c.sub_headline = value,
            TextField::CtaText => c.cta_text = value,
        }
    }

    /// Replace one color.
    pub fn set_color(&mut self, slot: ColorSlot, color: Rgba) {
        let p = &mut self.palette;
        match slot {
            ColorSlot::Brand => p.brand = color,
            ColorSlot::EventName => p.event_name = color,
            ColorSlot::BadgeText => p.badge_text = color,
            ColorSlot::Headline => p.headline = color,
            ColorSlot::SubHeadline => p.sub_headline = color,
            ColorSlot::CtaText => p.cta_text = color,
            ColorSlot::DurationBadge => p.duration_badge = color,
            ColorSlot::PriceBadge => p.price_badge = color,
            ColorSlot::CtaBackground => p.cta_background = color,
        }
    }

    /// Move an element's anchor (clamped to `[0, 100]`).
    pub fn set_position(&mut self, kind: ElementKind, x: f32, y: f32) {
        self.placements.get_mut(kind).set_position(x, y);
    }

    /// Rescale an element (clamped to `[0.1, 3.0]`).
    pub fn set_scale(&mut self, kind: ElementKind, scale: f32) {
        self.placements.get_mut(kind).set_scale(scale);
    }

    /// Show or hide an element.
    pub fn set_visible(&mut self, kind: ElementKind, visible: bool) {
        self.placements.get_mut(kind).set_visible(visible);
    }

    /// Set bold on a text element. Ignored for image elements.
    pub fn set_bold(&mut self, kind: ElementKind, bold: bool) {
        if kind.is_text() {
            self.placements.get_mut(kind).set_bold(bold);
        }
    }

    /// Set italic on a text element. Ignored for image elements.
    pub fn set_italic(&mut self, kind: ElementKind, italic: bool) {
        if kind.is_text() {
            self.placements.get_mut(kind).set_italic(italic);
        }
    }

    /// Flip bold on a text element.
    pub fn toggle_bold(&mut self, kind: ElementKind) {
        let bold = self.placement(kind).bold();
        self.set_bold(kind, !bold);
    }

    /// Flip italic on a text element.
    pub fn toggle_italic(&mut self, kind: ElementKind) {
        let italic = self.placement(kind).italic();
        self.set_italic(kind, !italic);
    }

    /// Serialize the document to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> PosterResult<String> {
        serde_json::to_string_pretty(self).map_err(PosterError::Serialization)
    }

    /// Deserialize a document from JSON. Placements are clamped on the way in.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, unknown aspect ratios or bad colors.
    pub fn from_json(json: &str) -> PosterResult<Self> {
        serde_json::from_str(json).map_err(PosterError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_literals() {
        for ratio in AspectRatio::ALL {
            let parsed: AspectRatio = ratio.as_str().parse().expect("literal");
            assert_eq!(parsed, ratio);
        }
        assert_eq!(AspectRatio::Portrait.ratio(), (9, 16));
        assert!("3:2".parse::<AspectRatio>().is_err());
        assert!(serde_json::from_str::<AspectRatio>("\"21:9\"").is_err());
        assert_eq!(
            serde_json::to_string(&AspectRatio::Landscape).expect("serialize"),
            "\"16:9\""
        );
    }

    #[test]
    fn test_setters_clamp() {
        let mut doc = PosterDocument::new();
        doc.set_position(ElementKind::Headline, 120.0, -5.0);
        doc.set_scale(ElementKind::Headline, 0.0);
        let headline = doc.placement(ElementKind::Headline);
        assert_eq!((headline.x(), headline.y()), (100.0, 0.0));
        assert!(headline.scale() > 0.0);
    }

    #[test]
    fn test_style_flags_ignored_for_images() {
        let mut doc = PosterDocument::new();
        doc.toggle_bold(ElementKind::Logo);
        doc.set_italic(ElementKind::Qr, true);
        assert!(!doc.placement(ElementKind::Logo).bold());
        assert!(!doc.placement(ElementKind::Qr).italic());

        let before = doc.placement(ElementKind::Headline).italic();
        doc.toggle_italic(ElementKind::Headline);
        assert_ne!(doc.placement(ElementKind::Headline).italic(), before);
    }

    #[test]
    fn test_text_and_color_accessors() {
        let mut doc = PosterDocument::new();
        doc.set_text(TextField::Price, "Free");
        doc.set_color(ColorSlot::PriceBadge, Rgba::BLACK);
        assert_eq!(doc.text(TextField::Price), "Free");
        assert_eq!(doc.content.price, "Free");
        assert_eq!(doc.color(ColorSlot::PriceBadge), Rgba::BLACK);
    }

    #[test]
    fn test_json_round_trip_keeps_wire_literals() {
        let mut doc = PosterDocument::new();
        doc.set_aspect_ratio(AspectRatio::Classic);
        doc.set_qr_url(Some("data:image/png;base64,AAAA".to_string()));
        let json = doc.to_json().expect("to json");
        assert!(json.contains("\"aspectRatio\": \"4:3\""));

        let back = PosterDocument::from_json(&json).expect("from json");
        assert_eq!(back, doc);
    }

    #[test]
    fn test_from_json_rejects_unknown_ratio() {
        let mut value: serde_json::Value =
            serde_json::from_str(&PosterDocument::new().to_json().expect("json")).expect("value");
        value["aspectRatio"] = serde_json::json!("5:4");
        let err = PosterDocument::from_json(&value.to_string());
        assert!(err.is_err());
    }
}
