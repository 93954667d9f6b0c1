//! Canvas dimensions and the percentage-to-pixel mapping.

use poster_core::AspectRatio;
use serde::{Deserialize, Serialize};

/// Fixed output width in pixels. Height follows from the aspect ratio.
pub const CANVAS_WIDTH: u32 = 1080;

/// Pixel dimensions of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    width: u32,
    height: u32,
}

impl CanvasGeometry {
    /// Geometry for an aspect ratio at the fixed output width.
    ///
    /// `H = floor(W / aw * ah)`, so 16:9 yields 607 rather than 607.5.
    #[must_use]
    pub fn for_aspect(ratio: AspectRatio) -> Self {
        let (aw, ah) = ratio.ratio();
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_WIDTH * ah / aw,
        }
    }

    /// Surface width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width as `f32` for layout math.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn width_f(&self) -> f32 {
        self.width as f32
    }

    /// Height as `f32` for layout math.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn height_f(&self) -> f32 {
        self.height as f32
    }

    /// Horizontal percent to pixels.
    #[must_use]
    pub fn px(&self, pct: f32) -> f32 {
        pct / 100.0 * self.width_f()
    }

    /// Vertical percent to pixels.
    #[must_use]
    pub fn py(&self, pct: f32) -> f32 {
        pct / 100.0 * self.height_f()
    }
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self::for_aspect(AspectRatio::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_heights_per_ratio() {
        let heights: Vec<u32> = AspectRatio::ALL
            .into_iter()
            .map(|r| CanvasGeometry::for_aspect(r).height())
            .collect();
        assert_eq!(heights, vec![1080, 1920, 607, 810]);
        assert!(AspectRatio::ALL
            .into_iter()
            .all(|r| CanvasGeometry::for_aspect(r).width() == CANVAS_WIDTH));
    }

    #[test]
    fn test_extremes_map_to_edges() {
        let g = CanvasGeometry::for_aspect(AspectRatio::Portrait);
        assert_eq!(g.px(0.0), 0.0);
        assert_eq!(g.px(100.0), 1080.0);
        assert_eq!(g.py(50.0), 960.0);
    }

    mod proptest_tests {
        use super::*;

        proptest! {
            #[test]
            fn prop_mapping_is_linear(pct in 0.0f32..=100.0f32) {
                for ratio in AspectRatio::ALL {
                    let g = CanvasGeometry::for_aspect(ratio);
                    prop_assert!((g.px(pct) / g.width_f() - pct / 100.0).abs() < 1e-6);
                    prop_assert!((g.py(pct) / g.height_f() - pct / 100.0).abs() < 1e-6);
                }
            }
        }
    }
}
