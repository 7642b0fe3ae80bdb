use geo_types::Coord;

use super::{along_depth, border_alpha, CellCore, GestureCell, Polyline, FALLOFF_FRACTION};
use crate::errors::PatternError;
use crate::geo_types::VectorOps;
use crate::gesture::GestureStroke;

/// A ribbon `thickness` pixels wide that follows a path gesture. u is the
/// normalized arclength along the path and v offsets along the local normal,
/// so synthesized strokes bend with the path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCell {
    spine: Polyline,
    thickness: f64,
    core: CellCore,
}

impl PathCell {
    pub fn new(path: &GestureStroke, thickness: f64) -> Result<PathCell, PatternError> {
        let spine = Polyline::new(path.points()).ok_or(PatternError::InvalidTargetCell)?;
        if !(thickness > 0.0) {
            return Err(PatternError::InvalidTargetCell);
        }
        Ok(PathCell { spine, thickness, core: CellCore::default() })
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }
}

impl GestureCell for PathCell {
    fn core(&self) -> &CellCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut CellCore {
        &mut self.core
    }

    fn extent(&self) -> f64 {
        self.spine.length()
    }

    fn uv_to_pixel(&self, uv: Coord<f64>) -> Coord<f64> {
        let length = self.spine.length();
        let (p, tangent) = self.spine.at(uv.x * length);
        p + tangent.perpendicular().scaled((uv.y - 0.5) * length)
    }

    fn alpha(&self, uv: Coord<f64>) -> f64 {
        let length = self.spine.length();
        let across = self.thickness / 2.0 - (uv.y - 0.5).abs() * length;
        let depth = along_depth(uv, length).min(across);
        border_alpha(depth, FALLOFF_FRACTION * length.min(self.thickness))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    #[test]
    fn test_path_cell_bends() {
        let path = GestureStroke::from_points(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 100.0, y: 0.0},
            coord! {x: 100.0, y: 100.0},
        ]);
        let cell = PathCell::new(&path, 20.0).unwrap();
        assert_eq!(cell.scale(), 200.0);
        let p = cell.uv_to_pixel(coord! {x: 0.75, y: 0.5});
        assert!((p.x - 100.0).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9);
        // Half a thickness off the spine on the second leg moves along -x.
        let q = cell.uv_to_pixel(coord! {x: 0.75, y: 0.5 + 10.0 / 200.0});
        assert!((q.x - 90.0).abs() < 1e-9 && (q.y - 50.0).abs() < 1e-9);
        assert_eq!(cell.alpha(coord! {x: 0.25, y: 0.5}), 1.0);
        assert_eq!(cell.alpha(coord! {x: 0.25, y: 0.6}), 0.0);
    }

    #[test]
    fn test_path_cell_needs_a_path() {
        let path = GestureStroke::from_points(vec![coord! {x: 1.0, y: 1.0}, coord! {x: 1.0, y: 1.0}]);
        assert_eq!(PathCell::new(&path, 5.0), Err(PatternError::InvalidTargetCell));
    }
}
