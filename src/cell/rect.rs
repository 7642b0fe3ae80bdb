use geo_types::Coord;

use super::{along_depth, border_alpha, CellCore, GestureCell, FALLOFF_FRACTION};
use crate::errors::PatternError;
use crate::geo_types::{PointDistance, VectorOps};
use crate::gesture::GestureStroke;

/// Oriented rectangle: u runs from the axis gesture's first point to its
/// last, v runs across it and the region is `thickness` pixels wide.
#[derive(Debug, Clone, PartialEq)]
pub struct RectCell {
    origin: Coord<f64>,
    direction: Coord<f64>,
    length: f64,
    thickness: f64,
    core: CellCore,
}

impl RectCell {
    pub fn new(axis: &GestureStroke, thickness: f64) -> Result<RectCell, PatternError> {
        let length = axis.start().distance(&axis.end());
        if !(length > 0.0 && thickness > 0.0) {
            return Err(PatternError::InvalidTargetCell);
        }
        Ok(RectCell {
            origin: axis.start(),
            direction: axis.endpoint_vec().normalized(),
            length,
            thickness,
            core: CellCore::default(),
        })
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

impl GestureCell for RectCell {
    fn core(&self) -> &CellCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CellCore {
        &mut self.core
    }

    fn extent(&self) -> f64 {
        self.length
    }

    fn uv_to_pixel(&self, uv: Coord<f64>) -> Coord<f64> {
        self.origin
            + self.direction.scaled(uv.x * self.length)
            + self.direction.perpendicular().scaled((uv.y - 0.5) * self.length)
    }

    fn alpha(&self, uv: Coord<f64>) -> f64 {
        let across = self.thickness / 2.0 - (uv.y - 0.5).abs() * self.length;
        let depth = along_depth(uv, self.length).min(across);
        border_alpha(depth, FALLOFF_FRACTION * self.length.min(self.thickness))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    #[test]
    fn test_rect_cell() {
        let axis = GestureStroke::from_points(vec![coord! {x: 0.0, y: 0.0}, coord! {x: 0.0, y: 200.0}]);
        let cell = RectCell::new(&axis, 40.0).unwrap();
        assert_eq!(cell.scale(), 200.0);
        let p = cell.uv_to_pixel(coord! {x: 0.5, y: 0.6});
        // u goes down the axis, v to its left.
        assert!((p.x + 20.0).abs() < 1e-9 && (p.y - 100.0).abs() < 1e-9);
        assert_eq!(cell.alpha(coord! {x: 0.5, y: 0.5}), 1.0);
        assert_eq!(cell.alpha(coord! {x: 0.5, y: 0.7}), 0.0);
    }

    #[test]
    fn test_rect_cell_degenerate() {
        let axis = GestureStroke::from_points(vec![coord! {x: 3.0, y: 3.0}]);
        assert!(RectCell::new(&axis, 10.0).is_err());
    }
}
