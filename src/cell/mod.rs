use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::geo_types::{PointDistance, VectorOps};

/// Axis aligned box cell.
pub mod bbox;
/// Oriented rectangle along an axis gesture.
pub mod rect;
/// Ribbon following a path gesture.
pub mod path;
/// Region between two carrier gestures.
pub mod carriers;

pub use bbox::BBoxCell;
pub use carriers::CarriersCell;
pub use path::PathCell;
pub use rect::RectCell;

/// Fraction of the smaller region extent over which alpha fades out.
pub const FALLOFF_FRACTION: f64 = 0.1;

/// A stroke the synthesizer wrote into a cell, in output pixels.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SynthesizedStroke {
    pub points: Vec<Coord<f64>>,
    pub pressures: Vec<f64>,
    /// Per point opacity from the cell falloff.
    pub alphas: Vec<f64>,
    /// Pen width, already multiplied by the cell's global scale.
    pub width: f64,
    /// Blend weight of this instance, see `correction_weights`.
    pub weight: f64,
}

impl SynthesizedStroke {
    pub fn mean_alpha(&self) -> f64 {
        if self.alphas.is_empty() {
            return 0.0;
        }
        self.alphas.iter().sum::<f64>() / self.alphas.len() as f64
    }

    pub fn mean_pressure(&self) -> f64 {
        if self.pressures.is_empty() {
            return 0.0;
        }
        self.pressures.iter().sum::<f64>() / self.pressures.len() as f64
    }
}

/// A target region for synthesis.
///
/// Cells expose an isotropic UV frame: the cell's main region spans u in
/// [0, 1], and one UV unit is `scale()` pattern pixels along both axes.
/// The global scale magnifies the pattern, so one UV unit covers
/// `scale() * global_scale()` output pixels.
pub trait GestureCell {
    /// Shared stroke storage and scale.
    fn core(&self) -> &CellCore;
    fn core_mut(&mut self) -> &mut CellCore;

    /// Pixel length of the main axis, before global scaling.
    fn extent(&self) -> f64;

    /// Map a UV coordinate into output pixel space.
    fn uv_to_pixel(&self, uv: Coord<f64>) -> Coord<f64>;

    /// Opacity at a UV coordinate: 1 inside, fading to 0 across the border.
    fn alpha(&self, uv: Coord<f64>) -> f64;

    fn valid(&self) -> bool {
        let e = self.extent();
        e.is_finite() && e > 0.0 && self.global_scale() > 0.0
    }

    /// Pattern pixels per UV unit.
    fn scale(&self) -> f64 {
        self.extent() / self.global_scale()
    }

    fn global_scale(&self) -> f64 {
        self.core().global_scale
    }

    fn set_global_scale(&mut self, scale: f64) {
        self.core_mut().global_scale = scale;
    }

    fn strokes(&self) -> &[SynthesizedStroke] {
        &self.core().strokes
    }

    fn add_stroke(&mut self, stroke: SynthesizedStroke) {
        self.core_mut().strokes.push(stroke);
    }

    fn clear(&mut self) {
        self.core_mut().strokes.clear();
    }

    fn nb_strokes(&self) -> usize {
        self.core().strokes.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellCore {
    pub strokes: Vec<SynthesizedStroke>,
    pub global_scale: f64,
}

impl Default for CellCore {
    fn default() -> Self {
        CellCore {
            strokes: vec![],
            global_scale: 1.0,
        }
    }
}

/// Linear fade from 0 at the border to 1 at `band` pixels inside.
pub fn border_alpha(depth: f64, band: f64) -> f64 {
    if depth <= 0.0 {
        0.0
    } else if band <= 0.0 {
        1.0
    } else {
        (depth / band).min(1.0)
    }
}

/// A polyline parametrized by arclength. Used as the spine of path-like cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
}

impl Polyline {
    /// Drops repeated points. None if fewer than two distinct points remain.
    pub fn new(points: &[Coord<f64>]) -> Option<Polyline> {
        let mut kept: Vec<Coord<f64>> = vec![];
        for p in points {
            if kept.last().map(|l| l.distance(p) > f64::EPSILON).unwrap_or(true) {
                kept.push(*p);
            }
        }
        if kept.len() < 2 {
            return None;
        }
        let mut cumulative = vec![0.0];
        for w in kept.windows(2) {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + w[0].distance(&w[1]));
        }
        Some(Polyline { points: kept, cumulative })
    }

    pub fn length(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    /// Segment index and fraction along it for arclength `s`. Values past
    /// either end land on the end segments with fractions outside [0, 1].
    pub fn locate(&self, s: f64) -> (usize, f64) {
        let last_seg = self.points.len() - 2;
        let seg = match self.cumulative.iter().position(|c| *c > s) {
            Some(0) => 0,
            Some(i) => (i - 1).min(last_seg),
            None => last_seg,
        };
        let len = self.cumulative[seg + 1] - self.cumulative[seg];
        (seg, (s - self.cumulative[seg]) / len)
    }

    /// Position and unit tangent at arclength `s`, extrapolating past the ends.
    pub fn at(&self, s: f64) -> (Coord<f64>, Coord<f64>) {
        let (seg, frac) = self.locate(s);
        let a = self.points[seg];
        let b = self.points[seg + 1];
        (a + (b - a).scaled(frac), (b - a).normalized())
    }

    /// Resample to `count` points evenly spaced by arclength.
    pub fn resample(&self, count: usize) -> Vec<Coord<f64>> {
        let count = count.max(2);
        (0..count)
            .map(|i| self.at(self.length() * i as f64 / (count - 1) as f64).0)
            .collect()
    }
}

/// Distance from the UV point to the unit interval along u, in pixels.
pub(crate) fn along_depth(uv: Coord<f64>, extent: f64) -> f64 {
    uv.x.min(1.0 - uv.x) * extent
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    #[test]
    fn test_polyline_at() {
        let pl = Polyline::new(&[
            coord! {x: 0.0, y: 0.0},
            coord! {x: 0.0, y: 0.0},
            coord! {x: 10.0, y: 0.0},
            coord! {x: 10.0, y: 10.0},
        ])
        .unwrap();
        assert_eq!(pl.length(), 20.0);
        let (p, t) = pl.at(15.0);
        assert_eq!(p, coord! {x: 10.0, y: 5.0});
        assert_eq!(t, coord! {x: 0.0, y: 1.0});
        let (p, _) = pl.at(-5.0);
        assert_eq!(p, coord! {x: -5.0, y: 0.0});
        assert_eq!(pl.resample(5).len(), 5);
        assert!(Polyline::new(&[coord! {x: 1.0, y: 1.0}]).is_none());
    }

    #[test]
    fn test_border_alpha() {
        assert_eq!(border_alpha(-1.0, 5.0), 0.0);
        assert_eq!(border_alpha(2.5, 5.0), 0.5);
        assert_eq!(border_alpha(50.0, 5.0), 1.0);
    }
}
