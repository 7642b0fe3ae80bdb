use geo_types::{coord, Coord, Rect};

use super::{border_alpha, CellCore, GestureCell, FALLOFF_FRACTION};
use crate::errors::PatternError;
use crate::geo_types::{rect_center, VectorOps};

/// Axis aligned target box, spanned by two corner pixels. The UV square is
/// the square of side `max(width, height)` centered on the box, so a wide
/// box fills u entirely and only the middle band of v.
#[derive(Debug, Clone, PartialEq)]
pub struct BBoxCell {
    rect: Rect<f64>,
    core: CellCore,
}

impl BBoxCell {
    pub fn new(corner_a: Coord<f64>, corner_b: Coord<f64>) -> Result<BBoxCell, PatternError> {
        let rect = Rect::new(corner_a, corner_b);
        if !(rect.width() > 0.0 && rect.height() > 0.0) {
            return Err(PatternError::InvalidTargetCell);
        }
        Ok(BBoxCell { rect, core: CellCore::default() })
    }

    pub fn rect(&self) -> Rect<f64> {
        self.rect
    }
}

impl GestureCell for BBoxCell {
    fn core(&self) -> &CellCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CellCore {
        &mut self.core
    }

    fn extent(&self) -> f64 {
        self.rect.width().max(self.rect.height())
    }

    fn uv_to_pixel(&self, uv: Coord<f64>) -> Coord<f64> {
        rect_center(&self.rect) + coord! {x: uv.x - 0.5, y: uv.y - 0.5}.scaled(self.extent())
    }

    fn alpha(&self, uv: Coord<f64>) -> f64 {
        let p = self.uv_to_pixel(uv);
        let depth = (p.x - self.rect.min().x)
            .min(self.rect.max().x - p.x)
            .min(p.y - self.rect.min().y)
            .min(self.rect.max().y - p.y);
        let band = FALLOFF_FRACTION * self.rect.width().min(self.rect.height());
        border_alpha(depth, band)
    }
}
