use geo::BoundingRect;
use geo_types::{coord, Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

use crate::cell::{GestureCell, SynthesizedStroke};
use crate::geo_types::{PointDistance, VectorOps};

/// Spacing, in output pixels, of the points of a synthesized stroke.
pub const RESAMPLE_SPACING: f64 = 2.0;

/// A captured pen stroke: a pixel-space polyline with per-point pressure and
/// the pen it was drawn with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GestureStroke {
    points: Vec<Coord<f64>>,
    pressures: Vec<f64>,
    width: f64,
    press_vary_width: bool,
    /// Bounding box of the pattern this stroke was captured in, if known.
    #[serde(default)]
    bbox: Option<Rect<f64>>,
}

impl GestureStroke {
    /// Build a stroke from its points. Missing pressures default to full.
    pub fn new(points: Vec<Coord<f64>>, pressures: Vec<f64>) -> GestureStroke {
        let mut pressures = pressures;
        pressures.resize(points.len(), 1.0);
        GestureStroke {
            points,
            pressures,
            width: 1.0,
            press_vary_width: true,
            bbox: None,
        }
    }

    pub fn from_points(points: Vec<Coord<f64>>) -> GestureStroke {
        GestureStroke::new(points, vec![])
    }

    pub fn with_width(mut self, width: f64) -> GestureStroke {
        self.width = width;
        self
    }

    pub fn with_press_vary_width(mut self, vary: bool) -> GestureStroke {
        self.press_vary_width = vary;
        self
    }

    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    pub fn pressures(&self) -> &[f64] {
        &self.pressures
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn press_vary_width(&self) -> bool {
        self.press_vary_width
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn start(&self) -> Coord<f64> {
        self.points.first().copied().unwrap_or(coord! {x: 0.0, y: 0.0})
    }

    pub fn end(&self) -> Coord<f64> {
        self.points.last().copied().unwrap_or(coord! {x: 0.0, y: 0.0})
    }

    pub fn endpoint_vec(&self) -> Coord<f64> {
        self.end() - self.start()
    }

    /// Centroid of the stroke's points.
    pub fn center(&self) -> Coord<f64> {
        if self.points.is_empty() {
            return coord! {x: 0.0, y: 0.0};
        }
        let sum = self.points.iter().fold(coord! {x: 0.0, y: 0.0}, |acc, p| acc + *p);
        sum.scaled(1.0 / self.points.len() as f64)
    }

    /// Largest distance of any point from the centroid.
    pub fn spread(&self) -> f64 {
        let center = self.center();
        self.points.iter().map(|p| p.distance(&center)).fold(0.0, f64::max)
    }

    pub fn mean_pressure(&self) -> f64 {
        if self.pressures.is_empty() {
            return 1.0;
        }
        self.pressures.iter().sum::<f64>() / self.pressures.len() as f64
    }

    /// Pen thickness at a given point, honoring pressure if the pen does.
    pub fn thickness_at(&self, idx: usize) -> f64 {
        if self.press_vary_width {
            self.width * self.pressures.get(idx).copied().unwrap_or(1.0)
        } else {
            self.width
        }
    }

    pub fn pix_bbox(&self) -> Option<Rect<f64>> {
        LineString::new(self.points.clone()).bounding_rect()
    }

    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    pub fn set_bbox(&mut self, bbox: Rect<f64>) {
        self.bbox = Some(bbox);
    }

    /// Transplant the stroke unchanged into the cell, placing the pattern
    /// bbox corner at `offset`. With `stretch` the pattern bbox is mapped
    /// onto the unit square instead of keeping its pixel size.
    pub fn copy(&self, cell: &mut dyn GestureCell, offset: Coord<f64>, stretch: bool) {
        let bbox = match self.bbox.or_else(|| self.pix_bbox()) {
            Some(bbox) => bbox,
            None => return,
        };
        let scale = cell.scale();
        let (sx, sy) = if stretch {
            (bbox.width().max(f64::EPSILON), bbox.height().max(f64::EPSILON))
        } else {
            (scale, scale)
        };
        let uvs: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| {
                coord! {
                    x: offset.x + (p.x - bbox.min().x) / sx,
                    y: offset.y + (p.y - bbox.min().y) / sy,
                }
            })
            .collect();
        self.emit(cell, uvs, self.pressures.clone(), 1.0);
    }

    /// Render a transformed copy of this stroke into the cell.
    ///
    /// The stroke is expressed in the frame of the element it belongs to
    /// (origin `ref_pos`, x axis at `ref_angle`), stretched by `scale` along
    /// that frame, turned to `angle` and dropped at `pos` in cell UV space.
    /// `pressure` is the instance weight and scales the stroke pressure.
    #[allow(clippy::too_many_arguments)]
    pub fn synthesize(
        &self,
        cell: &mut dyn GestureCell,
        pressure: f64,
        ref_angle: f64,
        ref_pos: Coord<f64>,
        scale: Coord<f64>,
        angle: f64,
        pos: Coord<f64>,
    ) {
        let cell_scale = cell.scale();
        if cell_scale <= 0.0 {
            return;
        }
        let uvs: Vec<Coord<f64>> = self
            .points
            .iter()
            .map(|p| {
                let local = (*p - ref_pos).rotated(-ref_angle);
                let stretched = coord! {x: local.x * scale.x, y: local.y * scale.y};
                pos + stretched.rotated(angle).scaled(1.0 / cell_scale)
            })
            .collect();
        let pressures = self.pressures.iter().map(|p| p * pressure).collect();
        self.emit(cell, uvs, pressures, pressure);
    }

    fn emit(&self, cell: &mut dyn GestureCell, uvs: Vec<Coord<f64>>, pressures: Vec<f64>, weight: f64) {
        if uvs.is_empty() {
            return;
        }
        let (uvs, pressures) = resample(&uvs, &pressures, RESAMPLE_SPACING / cell.scale());
        let alphas = uvs.iter().map(|uv| cell.alpha(*uv)).collect();
        let points = uvs.iter().map(|uv| cell.uv_to_pixel(*uv)).collect();
        cell.add_stroke(SynthesizedStroke {
            points,
            pressures,
            alphas,
            width: self.width * cell.global_scale(),
            weight,
        });
    }
}

/// Walk the polyline and emit points every `spacing` units of arclength,
/// interpolating pressure as we go. Both ends are always kept.
pub fn resample(points: &[Coord<f64>], pressures: &[f64], spacing: f64) -> (Vec<Coord<f64>>, Vec<f64>) {
    let pressure_at = |i: usize| pressures.get(i).copied().unwrap_or(1.0);
    if points.len() < 2 || !(spacing > 0.0) || !spacing.is_finite() {
        return (points.to_vec(), (0..points.len()).map(pressure_at).collect());
    }
    let mut out_pts = vec![points[0]];
    let mut out_press = vec![pressure_at(0)];
    // Distance travelled since the last emitted point.
    let mut carried = 0.0;
    for i in 1..points.len() {
        let a = points[i - 1];
        let b = points[i];
        let seg = a.distance(&b);
        if seg <= 0.0 {
            continue;
        }
        let mut t = spacing - carried;
        while t < seg {
            let f = t / seg;
            out_pts.push(a + (b - a).scaled(f));
            out_press.push(pressure_at(i - 1) * (1.0 - f) + pressure_at(i) * f);
            t += spacing;
        }
        carried = seg - (t - spacing);
    }
    let last = points[points.len() - 1];
    if out_pts.last().map(|p| p.distance(&last) > f64::EPSILON).unwrap_or(true) {
        out_pts.push(last);
        out_press.push(pressure_at(points.len() - 1));
    }
    (out_pts, out_press)
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::cell::BBoxCell;
    use std::f64::consts::PI;

    pub fn line(from: Coord<f64>, to: Coord<f64>, count: usize) -> GestureStroke {
        GestureStroke::from_points(
            (0..count)
                .map(|i| from + (to - from).scaled(i as f64 / (count - 1) as f64))
                .collect(),
        )
    }

    #[test]
    fn test_stroke_basics() {
        let s = line(coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 0.0}, 11);
        assert_eq!(s.pressures().len(), 11);
        assert!((s.center().x - 5.0).abs() < 1e-9);
        assert!((s.spread() - 5.0).abs() < 1e-9);
        assert_eq!(s.endpoint_vec(), coord! {x: 10.0, y: 0.0});
        let bbox = s.pix_bbox().unwrap();
        assert_eq!(bbox.width(), 10.0);
    }

    #[test]
    fn test_resample_spacing() {
        let pts = vec![coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 0.0}];
        let (out, press) = resample(&pts, &[0.0, 1.0], 2.5);
        println!("Resampled: {:?}", out);
        assert_eq!(out.len(), 5);
        assert_eq!(out.len(), press.len());
        assert!((press[2] - 0.5).abs() < 1e-9);
        assert_eq!(out[4], coord! {x: 10.0, y: 0.0});
    }

    #[test]
    fn test_synthesize_rotates_into_place() {
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 100.0}).unwrap();
        let s = line(coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 0.0}, 3);
        // Element frame centered on the stroke, turned a quarter, dropped in the middle.
        s.synthesize(
            &mut cell,
            1.0,
            0.0,
            coord! {x: 5.0, y: 0.0},
            coord! {x: 1.0, y: 1.0},
            PI / 2.0,
            coord! {x: 0.5, y: 0.5},
        );
        assert_eq!(cell.nb_strokes(), 1);
        let out = &cell.strokes()[0];
        let first = out.points[0];
        let last = out.points[out.points.len() - 1];
        assert!((first.x - 50.0).abs() < 1e-6 && (first.y - 45.0).abs() < 1e-6);
        assert!((last.x - 50.0).abs() < 1e-6 && (last.y - 55.0).abs() < 1e-6);
    }

    #[test]
    fn test_copy_keeps_pixel_size() {
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 100.0}).unwrap();
        let mut s = line(coord! {x: 10.0, y: 10.0}, coord! {x: 30.0, y: 10.0}, 2);
        s.set_bbox(Rect::new(coord! {x: 10.0, y: 0.0}, coord! {x: 30.0, y: 20.0}));
        s.copy(&mut cell, coord! {x: 0.0, y: 0.0}, false);
        let out = &cell.strokes()[0];
        assert!((out.points[0].x - 0.0).abs() < 1e-6 && (out.points[0].y - 10.0).abs() < 1e-6);
        assert!((out.points.last().unwrap().x - 20.0).abs() < 1e-6);
    }
}
