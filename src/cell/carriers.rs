use geo_types::Coord;

use super::{along_depth, border_alpha, CellCore, GestureCell, Polyline, FALLOFF_FRACTION};
use crate::errors::PatternError;
use crate::geo_types::{PointDistance, VectorOps};
use crate::gesture::GestureStroke;

const MIN_SAMPLES: usize = 16;

/// The region between two carrier strokes. Both carriers are sampled at the
/// same normalized arclengths; the midpoints form the spine and the local gap
/// between carriers is the local thickness. v grows toward the second carrier.
#[derive(Debug, Clone, PartialEq)]
pub struct CarriersCell {
    spine: Polyline,
    /// Gap between carriers at each spine vertex.
    gaps: Vec<f64>,
    /// +1 or -1 so that increasing v heads toward the second carrier.
    side: f64,
    core: CellCore,
}

impl CarriersCell {
    pub fn new(first: &GestureStroke, second: &GestureStroke) -> Result<CarriersCell, PatternError> {
        let a = Polyline::new(first.points()).ok_or(PatternError::InvalidTargetCell)?;
        let b = Polyline::new(second.points()).ok_or(PatternError::InvalidTargetCell)?;
        let count = MIN_SAMPLES.max(2 * first.len().max(second.len()));
        let (sa, sb) = (a.resample(count), b.resample(count));
        let mids: Vec<Coord<f64>> = sa.iter().zip(sb.iter()).map(|(p, q)| (*p + *q).scaled(0.5)).collect();
        let spine = Polyline::new(&mids).ok_or(PatternError::InvalidTargetCell)?;
        // Polyline drops repeated midpoints, so sample the gap on the kept ones.
        let gaps: Vec<f64> = spine
            .points()
            .iter()
            .map(|m| {
                let i = mids.iter().position(|p| p == m).unwrap_or(0);
                sa[i].distance(&sb[i])
            })
            .collect();
        if gaps.iter().all(|g| *g <= 0.0) {
            return Err(PatternError::InvalidTargetCell);
        }
        let (_, tangent) = spine.at(0.0);
        let side = if (sb[0] - sa[0]).dot(&tangent.perpendicular()) < 0.0 { -1.0 } else { 1.0 };
        Ok(CarriersCell { spine, gaps, side, core: CellCore::default() })
    }

    /// Carrier gap at normalized arclength u, clamped at the ends.
    pub fn gap(&self, u: f64) -> f64 {
        let (seg, frac) = self.spine.locate(u.clamp(0.0, 1.0) * self.spine.length());
        let frac = frac.clamp(0.0, 1.0);
        self.gaps[seg] * (1.0 - frac) + self.gaps[seg + 1] * frac
    }
}

impl GestureCell for CarriersCell {
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
        p + tangent.perpendicular().scaled(self.side * (uv.y - 0.5) * length)
    }

    fn alpha(&self, uv: Coord<f64>) -> f64 {
        let length = self.spine.length();
        let gap = self.gap(uv.x);
        let across = gap / 2.0 - (uv.y - 0.5).abs() * length;
        let depth = along_depth(uv, length).min(across);
        border_alpha(depth, FALLOFF_FRACTION * length.min(gap))
    }
}
