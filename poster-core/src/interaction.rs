//! Pointer interaction: hit-testing, dragging and grid snapping in percentage space.
//!
//! The controller never sees pixels of the rendered poster. Pointer events
//! arrive in device coordinates, are mapped through the canvas's on-screen
//! bounding box into percentage space, and only percentages are written back
//! into the [`PosterDocument`].

use serde::{Deserialize, Serialize};

use crate::element::{clamp_percent, MAX_PERCENT, MIN_PERCENT};
use crate::{CanvasRect, ElementKind, PercentPoint, PointerEvent, PointerPhase, PosterDocument};

/// Default snap grid, in percentage units.
pub const DEFAULT_GRID_SIZE: f32 = 2.0;

/// Default capture radius for hit-testing, in percentage units.
pub const DEFAULT_CAPTURE_RADIUS: f32 = 10.0;

/// Tunables for the interaction controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Snap interval applied to dragged positions.
    pub grid_size: f32,
    /// An element is hit only if its anchor is strictly closer than this.
    pub capture_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            capture_radius: DEFAULT_CAPTURE_RADIUS,
        }
    }
}

/// Snap a coordinate to the nearest multiple of `grid` inside `[0, 100]`.
///
/// Out-of-range and non-finite inputs land on the nearest grid line inside
/// the canvas. A non-positive grid disables snapping but still clamps.
#[must_use]
pub fn snap_to_grid(value: f32, grid: f32) -> f32 {
    let value = clamp_percent(value);
    if !(grid.is_finite() && grid > 0.0) {
        return value;
    }
    let max = (MAX_PERCENT / grid).floor() * grid;
    ((value / grid).round() * grid).clamp(MIN_PERCENT, max)
}

/// Find the visible element whose anchor is nearest to `point`.
///
/// Only anchors strictly closer than `radius` qualify. On equal distance the
/// element earlier in draw order wins.
#[must_use]
pub fn hit_test(doc: &PosterDocument, point: PercentPoint, radius: f32) -> Option<ElementKind> {
    let mut best: Option<(ElementKind, f32)> = None;
    for (kind, placement) in doc.placements().visible() {
        let anchor = PercentPoint::new(placement.x(), placement.y());
        let distance = point.distance_to(anchor);
        if distance >= radius {
            continue;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((kind, distance));
        }
    }
    best.map(|(kind, _)| kind)
}

/// An in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Element being dragged.
    pub element: ElementKind,
    /// Pointer minus anchor at grab time, so the element doesn't jump.
    pub offset: PercentPoint,
}

/// What a pointer event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing happened (unmounted canvas, no active drag, no change).
    Ignored,
    /// An element was grabbed and selected.
    Selected(ElementKind),
    /// The press missed every element; selection cleared.
    Cleared,
    /// The dragged element moved.
    Moved(ElementKind),
    /// An active drag ended.
    Released(ElementKind),
}

impl PointerOutcome {
    /// Whether the canvas needs a repaint (document or selection changed).
    #[must_use]
    pub fn needs_render(self) -> bool {
        matches!(self, Self::Selected(_) | Self::Cleared | Self::Moved(_))
    }
}

/// Translates pointer events into placement mutations.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    config: InteractionConfig,
    surface: Option<CanvasRect>,
    selected: Option<ElementKind>,
    drag: Option<DragState>,
}

impl InteractionController {
    /// Create a controller with the given configuration. Starts unmounted.
    #[must_use]
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            surface: None,
            selected: None,
            drag: None,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Record the canvas's on-screen bounding box (also used on resize).
    pub fn mount(&mut self, rect: CanvasRect) {
        tracing::debug!(
            "Canvas mounted at ({}, {}) size {}x{}",
            rect.left,
            rect.top,
            rect.width,
            rect.height
        );
        self.surface = Some(rect);
    }

    /// Forget the canvas. Pointer handlers become no-ops and any drag ends.
    pub fn unmount(&mut self) {
        self.surface = None;
        self.drag = None;
    }

    /// Whether a canvas is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Currently selected element.
    #[must_use]
    pub fn selected(&self) -> Option<ElementKind> {
        self.selected
    }

    /// Select an element directly (e.g. from a layer list).
    pub fn select(&mut self, element: Option<ElementKind>) {
        self.selected = element;
    }

    /// Active drag, if any.
    #[must_use]
    pub fn drag(&self) -> Option<DragState> {
        self.drag
    }

    /// Dispatch a pointer event by phase.
    pub fn handle(&mut self, doc: &mut PosterDocument, event: PointerEvent) -> PointerOutcome {
        match event.phase {
            PointerPhase::Down => self.on_pointer_down(doc, event.x, event.y),
            PointerPhase::Move => self.on_pointer_move(doc, event.x, event.y),
            PointerPhase::Up => self.on_pointer_up(),
        }
    }

    fn to_percent(&self, x: f32, y: f32) -> Option<PercentPoint> {
        self.surface.and_then(|rect| rect.to_percent(x, y))
    }

    /// Press at device coordinates `(x, y)`: select the nearest element and start a drag.
    pub fn on_pointer_down(&mut self, doc: &PosterDocument, x: f32, y: f32) -> PointerOutcome {
        let Some(point) = self.to_percent(x, y) else {
            return PointerOutcome::Ignored;
        };

        match hit_test(doc, point, self.config.capture_radius) {
            Some(element) => {
                let placement = doc.placement(element);
                let offset = PercentPoint::new(point.x - placement.x(), point.y - placement.y());
                tracing::debug!("Pointer down on {element} at ({:.2}, {:.2})", point.x, point.y);
                self.selected = Some(element);
                self.drag = Some(DragState { element, offset });
                PointerOutcome::Selected(element)
            }
            None => {
                self.selected = None;
                self.drag = None;
                PointerOutcome::Cleared
            }
        }
    }

    /// Move to device coordinates `(x, y)`: reposition the dragged element, snapped and clamped.
    pub fn on_pointer_move(&mut self, doc: &mut PosterDocument, x: f32, y: f32) -> PointerOutcome {
        let Some(drag) = self.drag else {
            return PointerOutcome::Ignored;
        };
        let Some(point) = self.to_percent(x, y) else {
            return PointerOutcome::Ignored;
        };

        if !doc.placement(drag.element).visible() {
            tracing::debug!("Dragged element {} was hidden, ending drag", drag.element);
            self.drag = None;
            return PointerOutcome::Ignored;
        }

        let grid = self.config.grid_size;
        let new_x = snap_to_grid(point.x - drag.offset.x, grid);
        let new_y = snap_to_grid(point.y - drag.offset.y, grid);

        let placement = doc.placement(drag.element);
        if placement.x() == new_x && placement.y() == new_y {
            return PointerOutcome::Ignored;
        }

        doc.set_position(drag.element, new_x, new_y);
        PointerOutcome::Moved(drag.element)
    }

    /// Release: end the drag. Selection stays.
    pub fn on_pointer_up(&mut self) -> PointerOutcome {
        match self.drag.take() {
            Some(drag) => PointerOutcome::Released(drag.element),
            None => PointerOutcome::Ignored,
        }
    }

    /// Flip bold on the selected element. Returns `true` if something changed.
    pub fn toggle_selected_bold(&self, doc: &mut PosterDocument) -> bool {
        match self.selected {
            Some(element) if element.is_text() => {
                doc.toggle_bold(element);
                true
            }
            _ => false,
        }
    }

    /// Flip italic on the selected element. Returns `true` if something changed.
    pub fn toggle_selected_italic(&self, doc: &mut PosterDocument) -> bool {
        match self.selected {
            Some(element) if element.is_text() => {
                doc.toggle_italic(element);
                true
            }
            _ => false,
        }
    }

    /// Flip visibility of the selected element. Returns `true` if something changed.
    pub fn toggle_selected_visibility(&self, doc: &mut PosterDocument) -> bool {
        match self.selected {
            Some(element) => {
                let visible = doc.placement(element).visible();
                doc.set_visible(element, !visible);
                true
            }
            None => false,
        }
    }

    /// Rescale the selected element. Returns `true` if something changed.
    pub fn set_selected_scale(&self, doc: &mut PosterDocument, scale: f32) -> bool {
        match self.selected {
            Some(element) => {
                doc.set_scale(element, scale);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted() -> InteractionController {
        let mut controller = InteractionController::default();
        // 1 device pixel per percent keeps the arithmetic readable.
        controller.mount(CanvasRect::new(0.0, 0.0, 100.0, 100.0));
        controller
    }

    #[test]
    fn test_snap_rounds_to_grid() {
        assert_eq!(snap_to_grid(3.0, 2.0), 4.0);
        assert_eq!(snap_to_grid(2.9, 2.0), 2.0);
        assert_eq!(snap_to_grid(51.2, 2.0), 52.0);
        assert_eq!(snap_to_grid(-7.0, 2.0), 0.0);
        assert_eq!(snap_to_grid(180.0, 2.0), 100.0);
        assert_eq!(snap_to_grid(f32::NAN, 2.0), 0.0);
    }

    #[test]
    fn test_snap_with_non_dividing_grid_stays_on_grid() {
        assert_eq!(snap_to_grid(99.9, 3.0), 99.0);
        assert_eq!(snap_to_grid(42.0, 0.0), 42.0);
    }

    #[test]
    fn test_unmounted_controller_ignores_pointer() {
        let mut doc = PosterDocument::new();
        let mut controller = InteractionController::default();
        assert_eq!(
            controller.on_pointer_down(&doc, 50.0, 44.0),
            PointerOutcome::Ignored
        );
        assert_eq!(
            controller.on_pointer_move(&mut doc, 10.0, 10.0),
            PointerOutcome::Ignored
        );
        assert!(controller.selected().is_none());
    }

    #[test]
    fn test_press_on_empty_area_clears_selection() {
        let mut doc = PosterDocument::new();
        for kind in ElementKind::ALL {
            doc.set_visible(kind, false);
        }
        doc.set_visible(ElementKind::Headline, true);

        let mut controller = mounted();
        controller.select(Some(ElementKind::Headline));
        assert_eq!(
            controller.on_pointer_down(&doc, 5.0, 95.0),
            PointerOutcome::Cleared
        );
        assert!(controller.selected().is_none());
        assert!(controller.drag().is_none());
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut doc = PosterDocument::new();
        doc.set_position(ElementKind::Qr, 80.0, 80.0);
        let mut controller = mounted();

        assert_eq!(
            controller.on_pointer_down(&doc, 81.0, 80.0),
            PointerOutcome::Selected(ElementKind::Qr)
        );
        // Pointer moves +10 on x; anchor follows with the 1% offset preserved.
        assert_eq!(
            controller.on_pointer_move(&mut doc, 91.0, 80.0),
            PointerOutcome::Moved(ElementKind::Qr)
        );
        assert_eq!(doc.placement(ElementKind::Qr).x(), 90.0);
        assert_eq!(
            controller.on_pointer_up(),
            PointerOutcome::Released(ElementKind::Qr)
        );
        assert_eq!(controller.selected(), Some(ElementKind::Qr));
    }

    #[test]
    fn test_hidden_mid_drag_stops_affecting_document() {
        let mut doc = PosterDocument::new();
        doc.set_position(ElementKind::Qr, 80.0, 80.0);
        let mut controller = mounted();
        controller.on_pointer_down(&doc, 80.0, 80.0);

        doc.set_visible(ElementKind::Qr, false);
        assert_eq!(
            controller.on_pointer_move(&mut doc, 20.0, 20.0),
            PointerOutcome::Ignored
        );
        assert!(controller.drag().is_none());
        assert_eq!(doc.placement(ElementKind::Qr).x(), 80.0);
    }

    #[test]
    fn test_selection_controls() {
        let mut doc = PosterDocument::new();
        let mut controller = mounted();
        assert!(!controller.toggle_selected_bold(&mut doc));

        controller.select(Some(ElementKind::Logo));
        assert!(!controller.toggle_selected_italic(&mut doc));
        assert!(controller.set_selected_scale(&mut doc, 2.0));
        assert_eq!(doc.placement(ElementKind::Logo).scale(), 2.0);
        assert!(controller.toggle_selected_visibility(&mut doc));
        assert!(!doc.placement(ElementKind::Logo).visible());
    }
}
