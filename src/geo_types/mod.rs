use geo_types::{coord, Coord, CoordNum, Point, Rect};
use num_traits::real::Real;

/// Delaunay neighbor graphs and Voronoi relaxation, built on voronoice.
pub mod voronoi;

/// Trait to convert synthesized cell output into an SVG document.
pub mod svg;

/// Trait that implements a distance function between two points or coords.
/// Also includes a length function which treats the point as a vector.
pub trait PointDistance<T: CoordNum> {
    /// Return the scalar distance to another point of the same kind.
    fn distance(&self, other: &Self) -> T;

    /// Treat the point as a Vector and return its scalar length.
    fn length(&self) -> T;
}

impl<T> PointDistance<T> for Point<T>
where
    T: CoordNum,
    T: Real,
{
    fn distance(&self, other: &Point<T>) -> T {
        let p = *self - *other;
        p.length()
    }

    fn length(&self) -> T {
        (self.x().powi(2) + self.y().powi(2)).sqrt()
    }
}

impl<T> PointDistance<T> for Coord<T>
where
    T: CoordNum,
    T: Real,
{
    fn distance(&self, other: &Coord<T>) -> T {
        let p = *self - *other;
        p.length()
    }

    fn length(&self) -> T {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }
}

/// The bits of 2D vector algebra geo_types leaves out. Angles are in radians,
/// counter-clockwise positive in a y-up frame.
pub trait VectorOps {
    fn dot(&self, other: &Self) -> f64;

    /// z component of the 3D cross product.
    fn cross(&self, other: &Self) -> f64;

    /// Rotated a quarter turn counter-clockwise.
    fn perpendicular(&self) -> Self;

    /// Unit vector, or the zero vector if there is no direction to keep.
    fn normalized(&self) -> Self;

    fn scaled(&self, factor: f64) -> Self;

    fn rotated(&self, angle: f64) -> Self;

    /// Unsigned angle between the two vectors, in [0, PI].
    fn angle(&self, other: &Self) -> f64;

    /// Angle to rotate self by to line up with other, in (-PI, PI].
    fn signed_angle(&self, other: &Self) -> f64;

    /// The same direction, flipped so it never points down (y >= 0).
    fn upward(&self) -> Self;
}

impl VectorOps for Coord<f64> {
    fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn perpendicular(&self) -> Self {
        coord! {x: -self.y, y: self.x}
    }

    fn normalized(&self) -> Self {
        let len = self.length();
        if len > f64::EPSILON {
            coord! {x: self.x / len, y: self.y / len}
        } else {
            coord! {x: 0.0, y: 0.0}
        }
    }

    fn scaled(&self, factor: f64) -> Self {
        coord! {x: self.x * factor, y: self.y * factor}
    }

    fn rotated(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        coord! {x: self.x * cos - self.y * sin, y: self.x * sin + self.y * cos}
    }

    fn angle(&self, other: &Self) -> f64 {
        self.cross(other).abs().atan2(self.dot(other))
    }

    fn signed_angle(&self, other: &Self) -> f64 {
        self.cross(other).atan2(self.dot(other))
    }

    fn upward(&self) -> Self {
        if self.y < 0.0 || (self.y == 0.0 && self.x < 0.0) {
            coord! {x: -self.x, y: -self.y}
        } else {
            *self
        }
    }
}

/// An infinite line through `point` along `vector`. The segment helpers treat
/// it as running from `point` to `point + vector`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfiniteLine {
    pub point: Coord<f64>,
    pub vector: Coord<f64>,
}

impl InfiniteLine {
    pub fn new(point: Coord<f64>, vector: Coord<f64>) -> InfiniteLine {
        InfiniteLine { point, vector }
    }

    pub fn segment(start: Coord<f64>, end: Coord<f64>) -> InfiniteLine {
        InfiniteLine { point: start, vector: end - start }
    }

    pub fn end(&self) -> Coord<f64> {
        self.point + self.vector
    }

    /// Parameter of the orthogonal projection of `p`, 0 at `point` and 1 at `end()`.
    pub fn param(&self, p: &Coord<f64>) -> f64 {
        let len2 = self.vector.dot(&self.vector);
        if len2 > f64::EPSILON {
            (*p - self.point).dot(&self.vector) / len2
        } else {
            0.0
        }
    }

    pub fn project(&self, p: &Coord<f64>) -> Coord<f64> {
        self.point + self.vector.scaled(self.param(p))
    }

    pub fn project_to_seg(&self, p: &Coord<f64>) -> Coord<f64> {
        self.point + self.vector.scaled(self.param(p).clamp(0.0, 1.0))
    }

    pub fn dist_to_seg(&self, p: &Coord<f64>) -> f64 {
        p.distance(&self.project_to_seg(p))
    }

    /// Crossing point of two infinite lines, None when they are parallel.
    pub fn intersect(&self, other: &InfiniteLine) -> Option<Coord<f64>> {
        let denom = self.vector.cross(&other.vector);
        if denom.abs() < f64::EPSILON {
            return None;
        }
        let t = (other.point - self.point).cross(&other.vector) / denom;
        Some(self.point + self.vector.scaled(t))
    }
}

/// Smallest rect holding both rects.
pub fn rect_union(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! {x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y)},
        coord! {x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y)},
    )
}

pub fn rect_center(rect: &Rect<f64>) -> Coord<f64> {
    (rect.min() + rect.max()).scaled(0.5)
}
