use geo::BoundingRect;
use geo_types::{Coord, MultiPoint, Rect};
use nalgebra::{Affine2, Matrix3, Point2};
use svg::node::element::path::Data;
use svg::node::element::Path;
use svg::Document;

use crate::cell::{GestureCell, SynthesizedStroke};
pub use crate::errors::SvgCreationError;

/// How strokes are placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Arrangement {
    /// Output pixels as they are; the viewbox hugs the strokes.
    AsIs,
    /// Scale and center into the bounds, leaving a margin. With the flag
    /// set, y is flipped so up is up.
    FitCenterMargin(f64, Rect<f64>, bool),
}

impl Arrangement {
    pub fn fit_center(bounds: Rect<f64>) -> Arrangement {
        Arrangement::FitCenterMargin(0.0, bounds, false)
    }

    /// Transform taking geometry bounded by `gbox` to the page, and the
    /// uniform scale it applies.
    fn transform(&self, gbox: &Rect<f64>) -> (Affine2<f64>, f64) {
        match self {
            Arrangement::AsIs => (Affine2::identity(), 1.0),
            Arrangement::FitCenterMargin(margin, bounds, invert) => {
                let sx = (bounds.width() - 2.0 * margin) / gbox.width();
                let sy = (bounds.height() - 2.0 * margin) / gbox.height();
                let scale = match (sx.is_finite() && sx > 0.0, sy.is_finite() && sy > 0.0) {
                    (true, true) => sx.min(sy),
                    (true, false) => sx,
                    (false, true) => sy,
                    (false, false) => 1.0,
                };
                let delta = bounds.center() - gbox.center() * scale;
                let tx = Affine2::from_matrix_unchecked(Matrix3::new(
                    scale, 0.0, delta.x,
                    0.0, scale, delta.y,
                    0.0, 0.0, 1.0,
                ));
                if *invert {
                    let flip = Affine2::from_matrix_unchecked(Matrix3::new(
                        1.0, 0.0, 0.0,
                        0.0, -1.0, bounds.min().y + bounds.max().y,
                        0.0, 0.0, 1.0,
                    ));
                    (flip * tx, scale)
                } else {
                    (tx, scale)
                }
            }
        }
    }

    fn viewbox(&self, gbox: &Rect<f64>) -> Rect<f64> {
        match self {
            Arrangement::AsIs => *gbox,
            Arrangement::FitCenterMargin(_, bounds, _) => *bounds,
        }
    }
}

/// SVG export of whatever a cell has been given to draw.
pub trait ToSvg {
    /// Bounds of every visible stroke point.
    fn viewbox(&self) -> Option<Rect<f64>>;

    /// One path per visible stroke. Instances with no weight are left out.
    fn to_paths(&self, arrangement: &Arrangement) -> Result<Vec<Path>, SvgCreationError>;

    fn to_svg(&self, arrangement: &Arrangement) -> Result<Document, SvgCreationError>;
}

fn visible(stroke: &SynthesizedStroke) -> bool {
    stroke.weight > 0.0 && !stroke.points.is_empty()
}

fn to_path_data(points: &[Coord<f64>], transformation: &Affine2<f64>) -> Data {
    let mut data = Data::new();
    for (i, p) in points.iter().enumerate() {
        let pt = transformation * Point2::new(p.x, p.y);
        data = if i == 0 {
            data.move_to((pt.x, pt.y))
        } else {
            data.line_to((pt.x, pt.y))
        };
    }
    data
}

impl<C: GestureCell + ?Sized> ToSvg for C {
    fn viewbox(&self) -> Option<Rect<f64>> {
        let points: MultiPoint<f64> = self
            .strokes()
            .iter()
            .filter(|s| visible(s))
            .flat_map(|s| s.points.iter().copied())
            .collect::<Vec<Coord<f64>>>()
            .into();
        points.bounding_rect()
    }

    fn to_paths(&self, arrangement: &Arrangement) -> Result<Vec<Path>, SvgCreationError> {
        let gbox = self.viewbox().ok_or(SvgCreationError::UndefinedViewBox)?;
        let (transformation, scale) = arrangement.transform(&gbox);
        Ok(self
            .strokes()
            .iter()
            .filter(|s| visible(s))
            .map(|s| {
                Path::new()
                    .set("fill", "none")
                    .set("stroke", "black")
                    .set("stroke-linecap", "round")
                    .set("stroke-width", s.width * s.mean_pressure() * scale)
                    .set("stroke-opacity", s.weight * s.mean_alpha())
                    .set("d", to_path_data(&s.points, &transformation))
            })
            .collect())
    }

    fn to_svg(&self, arrangement: &Arrangement) -> Result<Document, SvgCreationError> {
        let gbox = self.viewbox().ok_or(SvgCreationError::UndefinedViewBox)?;
        let view = arrangement.viewbox(&gbox);
        let document = Document::new()
            .set("viewBox", (view.min().x, view.min().y, view.width(), view.height()))
            .set("width", view.width())
            .set("height", view.height());
        Ok(self.to_paths(arrangement)?.into_iter().fold(document, |doc, path| doc.add(path)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::BBoxCell;
    use geo_types::coord;

    fn stroke(points: Vec<Coord<f64>>, weight: f64) -> SynthesizedStroke {
        let n = points.len();
        SynthesizedStroke {
            points,
            pressures: vec![0.5; n],
            alphas: vec![1.0; n],
            width: 2.0,
            weight,
        }
    }

    fn cell() -> BBoxCell {
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 100.0}).unwrap();
        cell.add_stroke(stroke(vec![coord! {x: 10.0, y: 10.0}, coord! {x: 30.0, y: 10.0}], 1.0));
        cell.add_stroke(stroke(vec![coord! {x: 10.0, y: 30.0}, coord! {x: 30.0, y: 50.0}], 1.0));
        cell.add_stroke(stroke(vec![coord! {x: 90.0, y: 90.0}, coord! {x: 95.0, y: 95.0}], 0.0));
        cell
    }

    #[test]
    fn test_empty_cell() {
        let cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 100.0}).unwrap();
        assert!(matches!(cell.to_svg(&Arrangement::AsIs), Err(SvgCreationError::UndefinedViewBox)));
    }

    #[test]
    fn test_zero_weight_skipped() {
        let cell = cell();
        let bounds = cell.viewbox().unwrap();
        assert_eq!(bounds.min(), coord! {x: 10.0, y: 10.0});
        assert_eq!(bounds.max(), coord! {x: 30.0, y: 50.0});
        assert_eq!(cell.to_paths(&Arrangement::AsIs).unwrap().len(), 2);
        let doc = cell.to_svg(&Arrangement::AsIs).unwrap().to_string();
        println!("{}", doc);
        assert_eq!(doc.matches("<path").count(), 2);
        assert!(doc.contains("stroke-width=\"1\""));
    }

    #[test]
    fn test_fit_center() {
        let bounds = Rect::new(coord! {x: 0.0, y: 0.0}, coord! {x: 400.0, y: 400.0});
        let (tx, scale) = Arrangement::fit_center(bounds).transform(&cell().viewbox().unwrap());
        assert_eq!(scale, 10.0);
        let mid = tx * Point2::new(20.0, 30.0);
        assert!((mid.x - 200.0).abs() < 1e-9 && (mid.y - 200.0).abs() < 1e-9);

        let flipped = Arrangement::FitCenterMargin(0.0, bounds, true);
        let (tx, _) = flipped.transform(&cell().viewbox().unwrap());
        let top = tx * Point2::new(20.0, 10.0);
        assert!((top.y - 400.0).abs() < 1e-9);
    }
}
