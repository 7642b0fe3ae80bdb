use geo_types::{coord, Coord};
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::cell::GestureCell;
use crate::errors::PatternError;
use crate::geo_types::{InfiniteLine, PointDistance, VectorOps};
use crate::gesture::GestureStroke;
use crate::stats::INFINITY_SENTINEL;

/// Shape an element is fitted to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    #[default]
    Point,
    Line,
    BBox,
    /// The stroke didn't fit the requested shape. Kept around, never synthesized from.
    Invalid,
}

/// A cluster of strokes summarized by an oriented box: `center` plus two
/// perpendicular full-length axes. `axis_a` is the main axis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StrokePaths {
    element_type: ElementType,
    epsilon: f64,
    style_adjust: f64,
    analyze_style: bool,
    center: Coord<f64>,
    axis_a: Coord<f64>,
    axis_b: Coord<f64>,
    /// Sample points backing the BBox fit.
    pts: Vec<Coord<f64>>,
    strokes: Vec<GestureStroke>,
}

/// What a successful merge does to the absorbing path's geometry.
enum Merge {
    Replace { center: Coord<f64>, axis_a: Coord<f64>, axis_b: Coord<f64> },
    Refit,
}

fn x_axis() -> Coord<f64> {
    coord! {x: 1.0, y: 0.0}
}

fn corners(center: Coord<f64>, axis_a: Coord<f64>, axis_b: Coord<f64>) -> [Coord<f64>; 4] {
    let (ha, hb) = (axis_a.scaled(0.5), axis_b.scaled(0.5));
    [center + ha + hb, center - ha + hb, center - ha - hb, center + ha - hb]
}

/// Of the segments joining any two of the four points, the longest.
/// Ties keep the earlier pair.
pub fn longest_pair(
    start1: Coord<f64>,
    end1: Coord<f64>,
    start2: Coord<f64>,
    end2: Coord<f64>,
) -> (Coord<f64>, Coord<f64>) {
    let candidates = [
        (start1, end1),
        (start2, end2),
        (start1, start2),
        (start1, end2),
        (end1, start2),
        (end1, end2),
    ];
    let mut best = candidates[0];
    let mut best_len = best.0.distance(&best.1);
    for pair in candidates.iter().skip(1) {
        let len = pair.0.distance(&pair.1);
        if len > best_len {
            best = *pair;
            best_len = len;
        }
    }
    best
}

impl StrokePaths {
    /// Fit a single stroke to `element_type`. A stroke that doesn't fit
    /// still makes a path, typed `Invalid`.
    pub fn new(
        epsilon: f64,
        style_adjust: f64,
        element_type: ElementType,
        analyze_style: bool,
        stroke: GestureStroke,
    ) -> StrokePaths {
        let mut path = StrokePaths {
            element_type: ElementType::Invalid,
            epsilon,
            style_adjust,
            analyze_style,
            center: stroke.center(),
            axis_a: coord! {x: 0.0, y: 0.0},
            axis_b: coord! {x: 0.0, y: 0.0},
            pts: vec![],
            strokes: vec![],
        };
        let fitted = match element_type {
            ElementType::Point => path.match_point(&stroke),
            ElementType::Line => path.match_line(&stroke),
            ElementType::BBox => path.match_bbox(&stroke),
            ElementType::Invalid => false,
        };
        if fitted {
            path.element_type = element_type;
        }
        path.strokes.push(stroke);
        path
    }

    /// Like `new`, but a failed fit is an error instead of an `Invalid` path.
    pub fn try_fit(
        epsilon: f64,
        style_adjust: f64,
        element_type: ElementType,
        analyze_style: bool,
        stroke: GestureStroke,
    ) -> Result<StrokePaths, PatternError> {
        let path = StrokePaths::new(epsilon, style_adjust, element_type, analyze_style, stroke);
        if path.element_type == ElementType::Invalid {
            Err(PatternError::ShapeFitFailed)
        } else {
            Ok(path)
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn is_valid(&self) -> bool {
        self.element_type != ElementType::Invalid
    }

    pub fn center(&self) -> Coord<f64> {
        self.center
    }

    pub fn axis_a(&self) -> Coord<f64> {
        self.axis_a
    }

    pub fn axis_b(&self) -> Coord<f64> {
        self.axis_b
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn pts(&self) -> &[Coord<f64>] {
        &self.pts
    }

    pub fn strokes(&self) -> &[GestureStroke] {
        &self.strokes
    }

    pub fn into_strokes(self) -> Vec<GestureStroke> {
        self.strokes
    }

    /// Average pen pressure over every stroke in the path.
    pub fn mean_pressure(&self) -> f64 {
        if self.strokes.is_empty() {
            return 1.0;
        }
        self.strokes.iter().map(|s| s.mean_pressure()).sum::<f64>() / self.strokes.len() as f64
    }

    /// Main axis direction, flipped to point up, as an angle in [0, PI].
    pub fn main_angle(&self) -> f64 {
        self.axis_a.upward().angle(&x_axis())
    }

    pub fn set_bbox(&mut self, bbox: geo_types::Rect<f64>) {
        for stroke in self.strokes.iter_mut() {
            stroke.set_bbox(bbox);
        }
    }

    fn match_point(&mut self, stroke: &GestureStroke) -> bool {
        let spread = stroke.spread();
        let dir = if stroke.len() == 1 || stroke.endpoint_vec().length() <= f64::EPSILON {
            x_axis()
        } else {
            stroke.endpoint_vec().normalized()
        };
        self.center = stroke.center();
        self.axis_a = dir.scaled(spread);
        self.axis_b = dir.perpendicular().scaled(spread);
        spread < self.epsilon * 0.5
    }

    fn match_line(&mut self, stroke: &GestureStroke) -> bool {
        let pts = stroke.points();
        let chord = stroke.endpoint_vec();
        if pts.len() < 2 || chord.length() <= f64::EPSILON {
            return false;
        }
        let chord_line = InfiniteLine::new(stroke.start(), chord);
        let (mut start, mut end) = (stroke.start(), stroke.end());
        let (mut proj_min, mut proj_max) = (0.0, 1.0);
        for p in pts.iter().take(pts.len() - 1).skip(1) {
            let proj = chord_line.param(p);
            if proj < proj_min {
                proj_min = proj;
                start = *p;
            } else if proj > proj_max {
                proj_max = proj;
                end = *p;
            }
        }
        self.center = (start + end).scaled(0.5);
        self.axis_a = end - start;

        let normal = self.axis_a.normalized().perpendicular();
        let line_a = InfiniteLine::new(self.center, self.axis_a);
        let (mut pos_dist, mut neg_dist) = (0.0f64, 0.0f64);
        for p in pts {
            let offset = *p - line_a.project(p);
            let signed = if normal.dot(&offset) > 0.0 { offset.length() } else { -offset.length() };
            pos_dist = pos_dist.max(signed);
            neg_dist = neg_dist.min(signed);
            if pos_dist - neg_dist > self.epsilon {
                return false;
            }
        }
        self.axis_b = normal.scaled(pos_dist - neg_dist);
        true
    }

    fn match_bbox(&mut self, stroke: &GestureStroke) -> bool {
        self.pts = self.stroke_pts(stroke);
        self.refit();
        true
    }

    /// Points the BBox fit runs on. With style analysis the pen footprint is
    /// traced on both sides of the stroke, otherwise the raw points get a
    /// little help so single points and straight lines don't collapse.
    fn stroke_pts(&self, stroke: &GestureStroke) -> Vec<Coord<f64>> {
        let pts = stroke.points();
        if self.analyze_style {
            let mut out = vec![];
            for i in 0..pts.len().saturating_sub(1) {
                let dir = pts[i + 1] - pts[i];
                if dir.length() > 0.0 {
                    let side = dir.normalized().perpendicular().scaled(stroke.thickness_at(i) * 0.5);
                    out.push(pts[i] + side);
                    out.push(pts[i] - side);
                }
            }
            if !out.is_empty() {
                return out;
            }
        }
        let mut out = pts.to_vec();
        if out.is_empty() {
            out.push(stroke.center());
        }
        if out.len() == 1 {
            out.push(out[0] + x_axis().scaled(0.5));
        }
        let endpt_vec = out[out.len() - 1] - out[0];
        let normal = if endpt_vec.length() > 0.0 {
            endpt_vec.normalized().perpendicular()
        } else {
            x_axis().perpendicular()
        };
        out.push(out[0] + endpt_vec.scaled(0.5) + normal.scaled(0.5));
        out
    }

    /// Gaussian fit of `pts` followed by the extent adjustment.
    fn refit(&mut self) {
        let (center, axis_a, axis_b) = fit_gaussian(&self.pts);
        self.center = center;
        self.axis_a = axis_a;
        self.axis_b = axis_b;
        self.adjust_bbox();
    }

    /// Turn the eigen axes into a box that just holds every point.
    fn adjust_bbox(&mut self) {
        let dir_a = if self.axis_a.length() > f64::EPSILON { self.axis_a.normalized() } else { x_axis() };
        let dir_b = if self.axis_b.length() > f64::EPSILON {
            self.axis_b.normalized()
        } else {
            dir_a.perpendicular()
        };
        let (mut min_a, mut max_a) = (INFINITY_SENTINEL, -INFINITY_SENTINEL);
        let (mut min_b, mut max_b) = (INFINITY_SENTINEL, -INFINITY_SENTINEL);
        for p in self.pts.iter() {
            let d = *p - self.center;
            min_a = min_a.min(d.dot(&dir_a));
            max_a = max_a.max(d.dot(&dir_a));
            min_b = min_b.min(d.dot(&dir_b));
            max_b = max_b.max(d.dot(&dir_b));
        }
        if self.pts.is_empty() {
            return;
        }
        self.center = self.center + dir_a.scaled(0.5 * (min_a + max_a)) + dir_b.scaled(0.5 * (min_b + max_b));
        self.axis_a = dir_a.scaled(max_a - min_a);
        self.axis_b = dir_b.scaled((max_b - min_b) * self.style_adjust);
    }

    fn stippling_merge(&self, other: &StrokePaths) -> Option<Merge> {
        if self.element_type != ElementType::Point || other.element_type != ElementType::Point {
            return None;
        }
        let max_dist = self.center.distance(&other.center) + self.axis_a.length() * 0.5 + other.axis_a.length() * 0.5;
        if max_dist >= self.epsilon {
            return None;
        }
        let mut dir = (self.axis_a + other.axis_a).normalized();
        if dir.length() == 0.0 {
            dir = x_axis();
        }
        Some(Merge::Replace {
            center: (self.center + other.center).scaled(0.5),
            axis_a: dir.scaled(max_dist),
            axis_b: dir.perpendicular().scaled(max_dist),
        })
    }

    fn hatching_merge(&self, other: &StrokePaths) -> Option<Merge> {
        if self.element_type != ElementType::Line || other.element_type != ElementType::Line {
            return None;
        }
        let eps = self.epsilon;
        // Virtual line both strokes should hug.
        let v_center = (self.center + other.center).scaled(0.5);
        let short_self = self.axis_a.length() < eps;
        let short_other = other.axis_a.length() < eps;
        let mut v_dir = if short_self && short_other {
            (self.center - other.center).normalized()
        } else if short_self {
            other.axis_a.normalized()
        } else if short_other {
            self.axis_a.normalized()
        } else {
            let aligned = if self.axis_a.dot(&other.axis_a) >= 0.0 { other.axis_a } else { other.axis_a.scaled(-1.0) };
            (self.axis_a + aligned).normalized()
        };
        if v_dir.length() == 0.0 {
            v_dir = x_axis();
        }
        let v_line = InfiniteLine::new(v_center, v_dir);
        let normal = v_dir.perpendicular();

        let ends = [
            self.center - self.axis_a.scaled(0.5),
            self.center + self.axis_a.scaled(0.5),
            other.center - other.axis_a.scaled(0.5),
            other.center + other.axis_a.scaled(0.5),
        ];
        let projected: Vec<Coord<f64>> = ends.iter().map(|p| v_line.project(p)).collect();
        let (mut pos_dist, mut neg_dist) = (0.0f64, 0.0f64);
        for (p, proj) in ends.iter().zip(projected.iter()) {
            let dist = proj.distance(p);
            if normal.dot(&(*p - v_center)) >= 0.0 {
                pos_dist = pos_dist.max(dist);
            } else {
                neg_dist = neg_dist.max(dist);
            }
        }
        if pos_dist + neg_dist >= eps {
            return None;
        }

        let (first, second) = longest_pair(projected[0], projected[1], projected[2], projected[3]);
        let span = first - second;
        let len1 = projected[0].distance(&projected[1]);
        let len2 = projected[2].distance(&projected[3]);
        if span.length() - (len1 + len2) >= eps {
            return None;
        }
        Some(Merge::Replace {
            center: (first + second).scaled(0.5),
            axis_a: span,
            axis_b: span.normalized().perpendicular().scaled(pos_dist + neg_dist),
        })
    }

    fn free_merge(&self, other: &StrokePaths) -> Option<Merge> {
        if self.element_type != ElementType::BBox || other.element_type != ElementType::BBox {
            return None;
        }
        if self.match_proximity(other) || self.match_continuation(other) {
            Some(Merge::Refit)
        } else {
            None
        }
    }

    fn merge_plan(&self, other: &StrokePaths) -> Option<Merge> {
        match self.element_type {
            ElementType::Point => self.stippling_merge(other),
            ElementType::Line => self.hatching_merge(other),
            ElementType::BBox => self.free_merge(other),
            ElementType::Invalid => None,
        }
    }

    /// Would `cluster` accept `other`? Doesn't touch either path.
    pub fn mergeable(&self, other: &StrokePaths) -> bool {
        self.merge_plan(other).is_some()
    }

    fn absorb(&mut self, other: StrokePaths, merge: Merge) {
        match merge {
            Merge::Replace { center, axis_a, axis_b } => {
                self.center = center;
                self.axis_a = axis_a;
                self.axis_b = axis_b;
                self.strokes.extend(other.strokes);
            }
            Merge::Refit => {
                self.pts.extend(other.pts);
                self.strokes.extend(other.strokes);
                self.refit();
            }
        }
    }

    /// Try to absorb `other` according to this path's type. On refusal the
    /// candidate is handed back untouched.
    pub fn cluster(&mut self, other: StrokePaths) -> Result<(), StrokePaths> {
        match self.merge_plan(&other) {
            Some(merge) => {
                self.absorb(other, merge);
                Ok(())
            }
            None => Err(other),
        }
    }

    /// Merge two dot clusters whose combined spread stays under epsilon.
    pub fn cluster_stippling(&mut self, other: StrokePaths) -> Result<(), StrokePaths> {
        match self.stippling_merge(&other) {
            Some(merge) => {
                self.absorb(other, merge);
                Ok(())
            }
            None => Err(other),
        }
    }

    /// Merge two line pieces lying along a common virtual line with a small gap.
    pub fn cluster_hatching(&mut self, other: StrokePaths) -> Result<(), StrokePaths> {
        match self.hatching_merge(&other) {
            Some(merge) => {
                self.absorb(other, merge);
                Ok(())
            }
            None => Err(other),
        }
    }

    /// Merge two boxes that are close, or continue each other, and refit.
    pub fn cluster_free(&mut self, other: StrokePaths) -> Result<(), StrokePaths> {
        match self.free_merge(&other) {
            Some(merge) => {
                self.absorb(other, merge);
                Ok(())
            }
            None => Err(other),
        }
    }

    pub fn match_proximity(&self, other: &StrokePaths) -> bool {
        StrokePaths::hausdorff_distance(self.center, self.axis_a, self.axis_b, other.center, other.axis_a, other.axis_b)
            < self.epsilon
            || StrokePaths::hausdorff_distance(
                other.center,
                other.axis_a,
                other.axis_b,
                self.center,
                self.axis_a,
                self.axis_b,
            ) < self.epsilon
    }

    pub fn match_continuation(&self, other: &StrokePaths) -> bool {
        self.collinear_pair(self.center, self.axis_a, self.axis_b, other.center, other.axis_a, other.axis_b)
            || self.collinear_pair(self.center, self.axis_b, self.axis_a, other.center, other.axis_a, other.axis_b)
            || self.collinear_pair(other.center, other.axis_a, other.axis_b, self.center, self.axis_a, self.axis_b)
            || self.collinear_pair(other.center, other.axis_b, other.axis_a, self.center, self.axis_a, self.axis_b)
    }

    /// Box 2 lies within a thin band around box 1's main axis, and either
    /// overlaps it along that axis or leaves a gap under epsilon.
    fn collinear_pair(
        &self,
        center1: Coord<f64>,
        axis_a1: Coord<f64>,
        axis_b1: Coord<f64>,
        center2: Coord<f64>,
        axis_a2: Coord<f64>,
        axis_b2: Coord<f64>,
    ) -> bool {
        if axis_b1.length() >= self.epsilon {
            return false;
        }
        let corners2 = corners(center2, axis_a2, axis_b2);
        let dir_b = axis_b1.normalized();
        if corners2.iter().any(|c| (*c - center1).dot(&dir_b).abs() > 0.5 * self.epsilon) {
            return false;
        }

        let dir_a = axis_a1.normalized();
        let (min1, max1) = (-0.5 * axis_a1.length(), 0.5 * axis_a1.length());
        let (mut min2, mut max2) = (INFINITY_SENTINEL, -INFINITY_SENTINEL);
        for c in corners2.iter() {
            let proj = (*c - center1).dot(&dir_a);
            min2 = min2.min(proj);
            max2 = max2.max(proj);
        }
        if min2 <= max1 && max2 >= min1 {
            return true;
        }
        let gap = if min2 > max1 { min2 - max1 } else { min1 - max2 };
        gap < self.epsilon
    }

    /// One sided Hausdorff distance from box 1 to box 2: the largest distance
    /// from a corner of box 1 lying outside box 2 to the outline of box 2.
    pub fn hausdorff_distance(
        center1: Coord<f64>,
        axis_a1: Coord<f64>,
        axis_b1: Coord<f64>,
        center2: Coord<f64>,
        axis_a2: Coord<f64>,
        axis_b2: Coord<f64>,
    ) -> f64 {
        let corners1 = corners(center1, axis_a1, axis_b1);
        let low = center2 - axis_a2.scaled(0.5) - axis_b2.scaled(0.5);
        let high = center2 + axis_a2.scaled(0.5) + axis_b2.scaled(0.5);
        let edges2 = [
            InfiniteLine::new(low, axis_a2),
            InfiniteLine::new(low, axis_b2),
            InfiniteLine::new(high, axis_a2.scaled(-1.0)),
            InfiniteLine::new(high, axis_b2.scaled(-1.0)),
        ];
        corners1
            .iter()
            .filter(|c| !StrokePaths::inside_box(**c, center2, axis_a2, axis_b2))
            .map(|c| edges2.iter().map(|e| e.dist_to_seg(c)).fold(INFINITY_SENTINEL, f64::min))
            .fold(0.0, f64::max)
    }

    pub fn inside_box(pt: Coord<f64>, center: Coord<f64>, axis_a: Coord<f64>, axis_b: Coord<f64>) -> bool {
        let d = pt - center;
        let proj_a = d.dot(&axis_a.normalized());
        let proj_b = d.dot(&axis_b.normalized());
        proj_a.abs() <= axis_a.length() * 0.5 && proj_b.abs() <= axis_b.length() * 0.5
    }

    /// Rigid copy of every stroke into the cell.
    pub fn copy(&self, cell: &mut dyn GestureCell, offset: Coord<f64>, stretch: bool) {
        for stroke in self.strokes.iter() {
            stroke.copy(cell, offset, stretch);
        }
    }

    /// Render every stroke scaled along this element's own axes by `scale`,
    /// with its main axis turned to `angle` and its center placed at `pos`
    /// (cell UV).
    pub fn synthesize(&self, cell: &mut dyn GestureCell, pressure: f64, scale: Coord<f64>, angle: f64, pos: Coord<f64>) {
        let ref_angle = self.main_angle();
        for stroke in self.strokes.iter() {
            stroke.synthesize(cell, pressure, ref_angle, self.center, scale, angle, pos);
        }
    }
}

/// Mean and principal axes of a point set. Axes are eigenvectors of the
/// covariance scaled by their eigenvalue, largest first.
pub fn fit_gaussian(pts: &[Coord<f64>]) -> (Coord<f64>, Coord<f64>, Coord<f64>) {
    if pts.is_empty() {
        return (coord! {x: 0.0, y: 0.0}, x_axis(), x_axis().perpendicular());
    }
    let inv = 1.0 / pts.len() as f64;
    let center = pts.iter().fold(coord! {x: 0.0, y: 0.0}, |acc, p| acc + *p).scaled(inv);
    let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
    for p in pts {
        let d = *p - center;
        xx += d.x * d.x;
        xy += d.x * d.y;
        yy += d.y * d.y;
    }
    let covariance = Matrix2::new(xx * inv, xy * inv, xy * inv, yy * inv);
    let eigen = covariance.symmetric_eigen();
    let (major, minor) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] { (0, 1) } else { (1, 0) };
    let vec_of = |i: usize| coord! {x: eigen.eigenvectors[(0, i)], y: eigen.eigenvectors[(1, i)]};
    (
        center,
        vec_of(major).scaled(eigen.eigenvalues[major]),
        vec_of(minor).scaled(eigen.eigenvalues[minor]),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gesture::test::line;
    use std::f64::consts::PI;

    fn dot_at(c: Coord<f64>) -> GestureStroke {
        GestureStroke::from_points(vec![c, c + coord! {x: 0.5, y: 0.0}, c + coord! {x: 0.5, y: 0.5}])
    }

    #[test]
    fn test_line_fit_recovers_segment() {
        let angle = 0.3f64;
        let dir = coord! {x: angle.cos(), y: angle.sin()};
        let from = coord! {x: 10.0, y: 20.0};
        let to = from + dir.scaled(50.0);
        let path = StrokePaths::try_fit(5.0, 1.0, ElementType::Line, false, line(from, to, 20)).unwrap();
        let mid = (from + to).scaled(0.5);
        assert!(path.center().distance(&mid) < 1e-6);
        assert!((path.axis_a().length() - 50.0).abs() < 1e-6);
        assert!((path.main_angle() - angle).abs() < 1e-6);
        assert!(path.axis_b().length() < 1e-6);
    }

    #[test]
    fn test_line_fit_rejects_wiggles() {
        let s = GestureStroke::from_points(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 10.0, y: 8.0},
            coord! {x: 20.0, y: -8.0},
            coord! {x: 30.0, y: 0.0},
        ]);
        assert_eq!(
            StrokePaths::try_fit(5.0, 1.0, ElementType::Line, false, s.clone()),
            Err(PatternError::ShapeFitFailed)
        );
        assert_eq!(StrokePaths::new(5.0, 1.0, ElementType::Line, false, s).element_type(), ElementType::Invalid);
    }

    #[test]
    fn test_point_fit() {
        let p = StrokePaths::new(4.0, 1.0, ElementType::Point, false, dot_at(coord! {x: 5.0, y: 5.0}));
        assert_eq!(p.element_type(), ElementType::Point);
        let big = line(coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 0.0}, 5);
        assert!(!StrokePaths::new(4.0, 1.0, ElementType::Point, false, big).is_valid());
    }

    #[test]
    fn test_bbox_fit_holds_points() {
        let s = GestureStroke::from_points(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 20.0, y: 2.0},
            coord! {x: 40.0, y: 0.0},
            coord! {x: 20.0, y: -2.0},
        ]);
        let p = StrokePaths::new(5.0, 1.0, ElementType::BBox, false, s.clone());
        assert_eq!(p.element_type(), ElementType::BBox);
        println!("BBox: {:?} {:?} {:?}", p.center(), p.axis_a(), p.axis_b());
        assert!((p.axis_a().length() - 40.0).abs() < 0.05);
        assert!(p.main_angle() < 0.01 || (p.main_angle() - PI).abs() < 0.01);
        for pt in s.points() {
            assert!(StrokePaths::inside_box(*pt, p.center(), p.axis_a().scaled(1.0001), p.axis_b().scaled(1.0001)));
        }
    }

    #[test]
    fn test_style_points_follow_pen() {
        let s = line(coord! {x: 0.0, y: 0.0}, coord! {x: 30.0, y: 0.0}, 4).with_width(6.0);
        let p = StrokePaths::new(5.0, 1.0, ElementType::BBox, true, s);
        assert!((p.axis_b().length() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_cluster_stippling() {
        let mut a = StrokePaths::new(4.0, 1.0, ElementType::Point, false, dot_at(coord! {x: 0.0, y: 0.0}));
        let b = StrokePaths::new(4.0, 1.0, ElementType::Point, false, dot_at(coord! {x: 1.0, y: 0.0}));
        let far = StrokePaths::new(4.0, 1.0, ElementType::Point, false, dot_at(coord! {x: 30.0, y: 0.0}));
        assert!(a.cluster_stippling(b).is_ok());
        assert_eq!(a.strokes().len(), 2);
        let back = a.cluster_stippling(far).unwrap_err();
        assert_eq!(back.strokes().len(), 1);
    }

    #[test]
    fn test_cluster_hatching_continuation() {
        let mut a = StrokePaths::new(
            5.0,
            1.0,
            ElementType::Line,
            false,
            line(coord! {x: 0.0, y: 0.0}, coord! {x: 20.0, y: 0.0}, 5),
        );
        let b = StrokePaths::new(
            5.0,
            1.0,
            ElementType::Line,
            false,
            line(coord! {x: 22.0, y: 0.5}, coord! {x: 40.0, y: 0.5}, 5),
        );
        let parallel = StrokePaths::new(
            5.0,
            1.0,
            ElementType::Line,
            false,
            line(coord! {x: 0.0, y: 20.0}, coord! {x: 40.0, y: 20.0}, 5),
        );
        assert!(a.mergeable(&b));
        assert!(!a.mergeable(&parallel));
        assert!(a.cluster_hatching(b).is_ok());
        assert!((a.axis_a().length() - 40.0).abs() < 0.1);
        assert!((a.center().x - 20.0).abs() < 0.1);
        assert!(a.cluster_hatching(parallel).is_err());
    }

    #[test]
    fn test_cluster_free_refits() {
        let mut a = StrokePaths::new(
            5.0,
            1.0,
            ElementType::BBox,
            false,
            line(coord! {x: 0.0, y: 0.0}, coord! {x: 20.0, y: 0.0}, 5),
        );
        let b = StrokePaths::new(
            5.0,
            1.0,
            ElementType::BBox,
            false,
            line(coord! {x: 23.0, y: 0.0}, coord! {x: 40.0, y: 0.0}, 5),
        );
        assert!(a.cluster_free(b).is_ok());
        assert!((a.axis_a().length() - 40.0).abs() < 0.6);
    }

    #[test]
    fn test_hausdorff() {
        let x = coord! {x: 10.0, y: 0.0};
        let y = coord! {x: 0.0, y: 10.0};
        let o = coord! {x: 0.0, y: 0.0};
        assert_eq!(StrokePaths::hausdorff_distance(o, x, y, o, x, y), 0.0);
        let d = StrokePaths::hausdorff_distance(coord! {x: 13.0, y: 0.0}, x, y, o, x, y);
        assert!((d - 13.0).abs() < 1e-9);
        // Small box inside the big one.
        assert_eq!(StrokePaths::hausdorff_distance(o, x.scaled(0.1), y.scaled(0.1), o, x, y), 0.0);
    }

    #[test]
    fn test_longest_pair() {
        let (a, b) = longest_pair(
            coord! {x: 0.0, y: 0.0},
            coord! {x: 1.0, y: 0.0},
            coord! {x: 5.0, y: 0.0},
            coord! {x: 6.0, y: 0.0},
        );
        assert_eq!((a, b), (coord! {x: 0.0, y: 0.0}, coord! {x: 6.0, y: 0.0}));
    }
}
