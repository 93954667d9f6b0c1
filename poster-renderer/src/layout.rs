//! Pure poster layout: placements plus measured text in, pixel boxes out.
//!
//! Nothing here touches a surface. [`compute_layout`] measures every string
//! through a [`TextMeasure`] and resolves each visible element to pixel
//! geometry, which the engine then paints in draw order.
//!
//! Sizes are fractions of the canvas width multiplied by the element scale;
//! paddings and radii are pixel values multiplied by the element scale.

use poster_core::{ElementKind, ElementPlacement, PosterDocument, Rgba};

use crate::geometry::CanvasGeometry;
use crate::text::{TextMeasure, TextStyle};

/// Logo width as a fraction of canvas width.
pub const LOGO_WIDTH: f32 = 0.18;
/// Brand name font size as a fraction of canvas width.
pub const BRAND_FONT: f32 = 0.04;
/// Event name font size as a fraction of canvas width.
pub const EVENT_NAME_FONT: f32 = 0.03;
/// Badge label font size as a fraction of canvas width.
pub const BADGE_FONT: f32 = 0.026;
/// Horizontal padding added to each badge label, in pixels.
pub const BADGE_PADDING: f32 = 34.0;
/// Badge height as a fraction of canvas width.
pub const BADGE_HEIGHT: f32 = 0.055;
/// Badge corner radius, in pixels.
pub const BADGE_RADIUS: f32 = 10.0;
/// Gap between the two badges, in pixels.
pub const BADGE_GAP: f32 = 15.0;
/// Headline font size as a fraction of canvas width.
pub const HEADLINE_FONT: f32 = 0.08;
/// Sub-headline font size as a fraction of canvas width.
pub const SUB_HEADLINE_FONT: f32 = 0.035;
/// Sub-headline wrap width as a fraction of canvas width.
pub const SUB_HEADLINE_MAX_WIDTH: f32 = 0.85;
/// Sub-headline line advance as a fraction of canvas width.
pub const SUB_HEADLINE_LINE_HEIGHT: f32 = 0.055;
/// QR image edge as a fraction of canvas width.
pub const QR_SIZE: f32 = 0.14;
/// White margin around the QR image, in pixels.
pub const QR_PADDING: f32 = 6.0;
/// CTA label font size as a fraction of canvas width.
pub const CTA_FONT: f32 = 0.04;
/// Width added to the measured CTA label, in pixels. Not scaled.
pub const CTA_PADDING: f32 = 80.0;
/// CTA pill height as a fraction of canvas width.
pub const CTA_HEIGHT: f32 = 0.11;
/// CTA pill corner radius, in pixels.
pub const CTA_RADIUS: f32 = 20.0;

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl LayoutRect {
    /// Create a rectangle.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Grow by `margin` on every side.
    #[must_use]
    pub fn inflate(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// One line of text centered on a point.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Text as drawn (after case transforms).
    pub text: String,
    /// Font size and style.
    pub style: TextStyle,
    /// Tint.
    pub color: Rgba,
    /// Horizontal center.
    pub center_x: f32,
    /// Vertical center.
    pub center_y: f32,
    /// Measured advance width.
    pub width: f32,
}

impl TextRun {
    /// The run's line box.
    #[must_use]
    pub fn bounds(&self) -> LayoutRect {
        let height = self.style.line_height();
        LayoutRect::new(
            self.center_x - self.width / 2.0,
            self.center_y - height / 2.0,
            self.width,
            height,
        )
    }
}

/// A filled rounded box with a centered label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBox {
    /// Box geometry.
    pub rect: LayoutRect,
    /// Corner radius.
    pub radius: f32,
    /// Box fill.
    pub fill: Rgba,
    /// Label centered in the box.
    pub label: TextRun,
}

/// Resolved pixel geometry of one element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementLayout {
    /// Logo image stretched into `rect`.
    Image {
        /// Destination of the image.
        rect: LayoutRect,
    },
    /// Single centered line (brand, event name, headline).
    Text(TextRun),
    /// Duration and price badges, left to right.
    Badges {
        /// Duration badge.
        duration: LabeledBox,
        /// Price badge.
        price: LabeledBox,
    },
    /// Wrapped lines, top to bottom.
    Lines(Vec<TextRun>),
    /// QR image on a white backing square.
    Qr {
        /// White backing.
        backing: LayoutRect,
        /// Destination of the QR image.
        image: LayoutRect,
    },
    /// Call-to-action pill.
    Pill(LabeledBox),
}

impl ElementLayout {
    /// Bounding box of everything the element paints.
    #[must_use]
    pub fn bounds(&self) -> LayoutRect {
        match self {
            Self::Image { rect } => *rect,
            Self::Text(run) => run.bounds(),
            Self::Badges { duration, price } => duration.rect.union(&price.rect),
            Self::Lines(lines) => lines
                .iter()
                .map(TextRun::bounds)
                .reduce(|acc, r| acc.union(&r))
                .unwrap_or_default(),
            Self::Qr { backing, .. } => *backing,
            Self::Pill(pill) => pill.rect,
        }
    }
}

/// An element resolved for painting.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutElement {
    /// Which element.
    pub kind: ElementKind,
    /// Its pixel geometry.
    pub layout: ElementLayout,
}

/// Source image sizes the layout depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageDimensions {
    /// Logo `(width, height)`, if loaded.
    pub logo: Option<(u32, u32)>,
    /// QR `(width, height)`, if loaded.
    pub qr: Option<(u32, u32)>,
}

/// A full poster resolved to pixel geometry, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterLayout {
    /// Surface dimensions.
    pub geometry: CanvasGeometry,
    /// Painted elements in draw order. Hidden or image-less elements are absent.
    pub elements: Vec<LaidOutElement>,
}

impl PosterLayout {
    /// Layout of one element, if it will be painted.
    #[must_use]
    pub fn get(&self, kind: ElementKind) -> Option<&ElementLayout> {
        self.elements
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| &e.layout)
    }
}

/// Greedy word wrap.
///
/// Words are appended to the current line while the line measures no wider
/// than `max_width`. A word that alone exceeds the width gets its own line.
pub fn wrap_lines(
    text: &str,
    max_width: f32,
    mut measure: impl FnMut(&str) -> f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Resolve every visible element of `doc` to pixel geometry.
pub fn compute_layout<M: TextMeasure + ?Sized>(
    doc: &PosterDocument,
    geometry: CanvasGeometry,
    measurer: &mut M,
    images: ImageDimensions,
) -> PosterLayout {
    let mut builder = LayoutBuilder {
        doc,
        geometry,
        measurer,
    };

    let elements = doc
        .placements()
        .visible()
        .filter_map(|(kind, placement)| {
            builder.element(kind, placement, images).map(|layout| {
                tracing::trace!("Laid out {} at {:?}", kind, layout.bounds());
                LaidOutElement { kind, layout }
            })
        })
        .collect();

    PosterLayout { geometry, elements }
}

struct LayoutBuilder<'a, M: TextMeasure + ?Sized> {
    doc: &'a PosterDocument,
    geometry: CanvasGeometry,
    measurer: &'a mut M,
}

impl<M: TextMeasure + ?Sized> LayoutBuilder<'_, M> {
    /// Width fraction times element scale, in pixels.
    fn span(&self, fraction: f32, placement: &ElementPlacement) -> f32 {
        fraction * self.geometry.width_f() * placement.scale()
    }

    fn run(&mut self, text: String, style: TextStyle, color: Rgba, cx: f32, cy: f32) -> TextRun {
        let width = self.measurer.measure(&text, style);
        TextRun {
            text,
            style,
            color,
            center_x: cx,
            center_y: cy,
            width,
        }
    }

    fn element(
        &mut self,
        kind: ElementKind,
        p: &ElementPlacement,
        images: ImageDimensions,
    ) -> Option<ElementLayout> {
        let doc = self.doc;
        let (ax, ay) = (self.geometry.px(p.x()), self.geometry.py(p.y()));
        let styled = |size: f32| TextStyle::new(size).styled_like(p);

        match kind {
            ElementKind::Logo => {
                let (w, h) = images.logo.filter(|&(w, h)| w > 0 && h > 0)?;
                let width = self.span(LOGO_WIDTH, p);
                #[allow(clippy::cast_precision_loss)]
                let height = width * h as f32 / w as f32;
                Some(ElementLayout::Image {
                    rect: LayoutRect::new(ax - width / 2.0, ay, width, height),
                })
            }
            ElementKind::Brand => {
                let style = styled(self.span(BRAND_FONT, p));
                let text = doc.content.brand_name.to_uppercase();
                Some(ElementLayout::Text(self.run(text, style, doc.palette.brand, ax, ay)))
            }
            ElementKind::EventName => {
                let style = styled(self.span(EVENT_NAME_FONT, p));
                let text = doc.content.event_name.to_uppercase();
                let color = doc.palette.event_name;
                Some(ElementLayout::Text(self.run(text, style, color, ax, ay)))
            }
            ElementKind::Badges => Some(self.badges(p, ax, ay)),
            ElementKind::Headline => {
                let style = styled(self.span(HEADLINE_FONT, p));
                let text = doc.content.headline.clone();
                let color = doc.palette.headline;
                Some(ElementLayout::Text(self.run(text, style, color, ax, ay)))
            }
            ElementKind::SubHeadline => {
                let style = styled(self.span(SUB_HEADLINE_FONT, p));
                let max_width = SUB_HEADLINE_MAX_WIDTH * self.geometry.width_f();
                let line_height = self.span(SUB_HEADLINE_LINE_HEIGHT, p);
                let measurer = &mut *self.measurer;
                let lines = wrap_lines(&doc.content.sub_headline, max_width, |s| {
                    measurer.measure(s, style)
                });
                let color = doc.palette.sub_headline;
                #[allow(clippy::cast_precision_loss)]
                let runs = lines
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| {
                        self.run(line, style, color, ax, ay + i as f32 * line_height)
                    })
                    .collect();
                Some(ElementLayout::Lines(runs))
            }
            ElementKind::Qr => {
                images.qr?;
                let size = self.span(QR_SIZE, p);
                let pad = QR_PADDING * p.scale();
                let image = LayoutRect::new(ax - size / 2.0, ay, size, size);
                Some(ElementLayout::Qr {
                    backing: image.inflate(pad),
                    image,
                })
            }
            ElementKind::Cta => {
                let style = styled(self.span(CTA_FONT, p));
                let text = doc.content.cta_text.to_uppercase();
                let label_width = self.measurer.measure(&text, style);
                let width = label_width + CTA_PADDING;
                let rect = LayoutRect::new(ax - width / 2.0, ay, width, self.span(CTA_HEIGHT, p));
                let (cx, cy) = rect.center();
                Some(ElementLayout::Pill(LabeledBox {
                    rect,
                    radius: CTA_RADIUS * p.scale(),
                    fill: doc.palette.cta_background,
                    label: TextRun {
                        text,
                        style,
                        color: doc.palette.cta_text,
                        center_x: cx,
                        center_y: cy,
                        width: label_width,
                    },
                }))
            }
        }
    }

    fn badges(&mut self, p: &ElementPlacement, ax: f32, ay: f32) -> ElementLayout {
        let doc = self.doc;
        let scale = p.scale();
        let style = TextStyle::new(self.span(BADGE_FONT, p)).styled_like(p);
        let height = self.span(BADGE_HEIGHT, p);
        let gap = BADGE_GAP * scale;

        let duration_w = self.measurer.measure(&doc.content.duration, style) + BADGE_PADDING * scale;
        let price_w = self.measurer.measure(&doc.content.price, style) + BADGE_PADDING * scale;

        let left = ax - (duration_w + gap + price_w) / 2.0;
        let duration_rect = LayoutRect::new(left, ay, duration_w, height);
        let price_rect = LayoutRect::new(duration_rect.right() + gap, ay, price_w, height);

        let mut labeled = |rect: LayoutRect, text: &str, fill: Rgba| {
            let (cx, cy) = rect.center();
            LabeledBox {
                rect,
                radius: BADGE_RADIUS * scale,
                fill,
                label: self.run(text.to_string(), style, doc.palette.badge_text, cx, cy),
            }
        };

        ElementLayout::Badges {
            duration: labeled(duration_rect, &doc.content.duration, doc.palette.duration_badge),
            price: labeled(price_rect, &doc.content.price, doc.palette.price_badge),
        }
    }
}
