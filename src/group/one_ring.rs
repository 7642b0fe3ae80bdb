use std::f64::consts::PI;

use geo_types::{coord, Coord};
use log::debug;
use rand::Rng;

use super::{relative_ratio, ElementPlacement, StrokeGroup, SynthMethod};
use crate::cell::GestureCell;
use crate::errors::PatternError;
use crate::geo_types::{PointDistance, VectorOps};
use crate::stroke_paths::StrokePaths;

/// Elements shorter than this keep their length.
const MIN_STRETCH_LENGTH: f64 = 2.0;

/// A measure next to `reference` in `sorted`: one step left or right of
/// where it would be inserted, picked at random. Periodic values wrap
/// around at the ends.
pub fn close_value<R: Rng + ?Sized>(rng: &mut R, reference: f64, sorted: &[f64], periodic: bool) -> f64 {
    let n = sorted.len();
    match n {
        0 => return reference,
        1 => return sorted[0],
        _ => {}
    }
    let bound = sorted.partition_point(|v| *v < reference).min(n - 1);
    let right = rng.gen_bool(0.5);
    if bound == 0 {
        if periodic && !right {
            sorted[n - 1]
        } else {
            sorted[1]
        }
    } else if bound == n - 1 {
        if periodic && right {
            sorted[0]
        } else {
            sorted[n - 2]
        }
    } else if right {
        sorted[bound + 1]
    } else {
        sorted[bound - 1]
    }
}

/// Shift `target` by half a turn if that brings it closer to `reference`.
pub fn unwrap_angle(reference: f64, target: f64) -> f64 {
    if (reference - target).abs() > (reference - (target + PI)).abs() {
        target + PI
    } else if (reference - target).abs() > (reference - (target - PI)).abs() {
        target - PI
    } else {
        target
    }
}

/// Mean of the matched neighbors, or `center` when fewer than two matched.
fn one_ring_position(center: Coord<f64>, neighbors: &[Coord<f64>], relevant: &[Option<usize>]) -> Coord<f64> {
    let matched: Vec<Coord<f64>> = neighbors
        .iter()
        .zip(relevant.iter())
        .filter(|(_, r)| r.is_some())
        .map(|(n, _)| *n)
        .collect();
    if matched.len() < 2 {
        return center;
    }
    let sum = matched.iter().fold(coord! {x: 0.0, y: 0.0}, |acc, n| acc + *n);
    sum.scaled(1.0 / matched.len() as f64)
}

/// Closest point of `candidates` for each of `points`.
fn closest_each(points: &[Coord<f64>], candidates: &[Coord<f64>]) -> Vec<Option<usize>> {
    points
        .iter()
        .map(|p| {
            candidates
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.distance(p).total_cmp(&b.1.distance(p)))
                .map(|(j, _)| j)
        })
        .collect()
}

/// How a synthesized neighborhood lines up with a reference one.
struct OneRingMatch {
    score: f64,
    /// For each synthesized neighbor, its mutually closest reference neighbor.
    target_edges: Vec<Option<usize>>,
    /// For each reference neighbor, its mutually closest synthesized neighbor.
    ref_edges: Vec<Option<usize>>,
}

impl StrokeGroup {
    /// Place elements, then correct each against its best matching
    /// reference neighborhood.
    pub fn synthesize_1ring(&mut self, cell: &mut dyn GestureCell) -> Result<(), PatternError> {
        self.ensure_synthesizable(cell)?;
        let scale = cell.scale();
        let positions = self.distribute(scale);
        self.element_synthesis(&positions);
        self.group_synthesis(scale);
        self.render_synthesized_strokes(cell);
        Ok(())
    }

    /// Give every position a random reference element, with its length,
    /// width and angle nudged to a neighboring reference value.
    pub fn element_synthesis(&mut self, positions: &[Coord<f64>]) {
        let sorted_lengths = self.length.sorted();
        let sorted_widths = self.width.sorted();
        let sorted_angles = self.angle.sorted();

        self.targets.clear();
        let mut previous = None;
        for position in positions.iter() {
            let element = self.pick_element(previous);
            previous = Some(element);
            let path = self.element(element);
            let (ref_length, ref_width, ref_angle) = (path.axis_a().length(), path.axis_b().length(), path.main_angle());

            let target_length = close_value(&mut self.rng, ref_length, &sorted_lengths, false);
            let target_width = close_value(&mut self.rng, ref_width, &sorted_widths, false);
            let length_ratio = if target_length < MIN_STRETCH_LENGTH || ref_length < MIN_STRETCH_LENGTH {
                1.0
            } else {
                target_length / ref_length
            };
            let width_ratio = relative_ratio(target_width, ref_width);
            let target_angle = close_value(&mut self.rng, ref_angle, &sorted_angles, true);

            self.targets.push(ElementPlacement {
                element,
                position: *position,
                angle: unwrap_angle(ref_angle, target_angle),
                scale: coord! {x: length_ratio, y: width_ratio},
            });
        }
    }

    /// Correct every placed element from the reference element whose
    /// 1-ring neighborhood looks most like its own.
    pub fn group_synthesis(&mut self, scale: f64) {
        self.corrected = self.targets.clone();
        let positions: Vec<Coord<f64>> = self.targets.iter().map(|t| t.position).collect();
        let neighborhoods = self.synthesized_neighborhoods(&positions);
        let order = self.element_order(&positions, &neighborhoods);

        let mut unmatched = 0;
        for idx in order {
            let best = (0..self.elements.len())
                .filter_map(|r| self.one_ring_match(idx, &neighborhoods[idx], scale, r).map(|m| (r, m)))
                .min_by(|a, b| a.1.score.total_cmp(&b.1.score));
            let (best, matched) = match best {
                Some(best) => best,
                None => {
                    unmatched += 1;
                    continue;
                }
            };

            let ref_center = self.element(best).center();
            let ref_neighbors: Vec<Coord<f64>> =
                self.element_neighbors[best].iter().map(|n| self.element(*n).center()).collect();
            let shift = ref_center - one_ring_position(ref_center, &ref_neighbors, &matched.ref_edges);

            let target_neighbors: Vec<Coord<f64>> =
                neighborhoods[idx].iter().map(|n| self.corrected[*n].position.scaled(scale)).collect();
            let target_center = self.corrected[idx].position.scaled(scale);
            let shifted = one_ring_position(target_center, &target_neighbors, &matched.target_edges) + shift;

            let target = self.targets[idx];
            let path = self.element(target.element);
            let corrected_scale = coord! {
                x: relative_ratio(self.length.measures[best], path.axis_a().length()),
                y: relative_ratio(self.width.measures[best], path.axis_b().length()),
            };
            self.corrected[idx] = ElementPlacement {
                element: target.element,
                position: shifted.scaled(1.0 / scale),
                angle: unwrap_angle(target.angle, self.angle.measures[best]),
                scale: corrected_scale,
            };
        }
        debug!(
            "1-ring correction: {} of {} elements had no matching neighborhood",
            unmatched,
            self.targets.len()
        );
    }

    fn one_ring_match(&self, idx: usize, target_neighbors: &[usize], scale: f64, reference: usize) -> Option<OneRingMatch> {
        let placements = match self.synth_method {
            SynthMethod::Causal => &self.corrected,
            SynthMethod::Parallel => &self.targets,
        };
        let origin = placements[idx].position;
        let target_pos: Vec<Coord<f64>> = target_neighbors
            .iter()
            .map(|t| (placements[*t].position - origin).scaled(scale))
            .collect();
        let ref_origin = self.element(reference).center();
        let ref_neighbors = &self.element_neighbors[reference];
        let ref_pos: Vec<Coord<f64>> = ref_neighbors.iter().map(|r| self.element(*r).center() - ref_origin).collect();

        let target_best = closest_each(&target_pos, &ref_pos);
        let ref_best = closest_each(&ref_pos, &target_pos);
        let target_edges: Vec<Option<usize>> = target_best
            .iter()
            .enumerate()
            .map(|(i, j)| j.filter(|j| ref_best[*j] == Some(i)))
            .collect();
        let ref_edges: Vec<Option<usize>> = ref_best
            .iter()
            .enumerate()
            .map(|(j, i)| i.filter(|i| target_best[*i] == Some(j)))
            .collect();
        let relevant = target_edges.iter().filter(|e| e.is_some()).count();
        if relevant < 2 {
            return None;
        }

        let mut score = self.element_match(placements, idx, origin, reference, ref_origin, scale);
        for (i, best) in target_best.iter().enumerate() {
            if let Some(j) = best {
                score += self.element_match(placements, target_neighbors[i], origin, ref_neighbors[*j], ref_origin, scale);
            }
        }
        score *= (target_neighbors.len() + ref_neighbors.len() + 1) as f64 / (2 * relevant + 1) as f64;
        Some(OneRingMatch { score, target_edges, ref_edges })
    }

    /// Two way Hausdorff distance between the box of a placed element and
    /// the box of a reference element, each relative to its own origin.
    fn element_match(
        &self,
        placements: &[ElementPlacement],
        target: usize,
        target_origin: Coord<f64>,
        reference: usize,
        ref_origin: Coord<f64>,
        scale: f64,
    ) -> f64 {
        let ref_path = self.element(reference);
        let ref_center = ref_path.center() - ref_origin;
        let placement = placements[target];
        let path = self.element(placement.element);
        let turn = placement.angle - path.main_angle();
        let target_center = (placement.position - target_origin).scaled(scale);
        let target_a = path.axis_a().scaled(placement.scale.x).rotated(turn);
        let target_b = path.axis_b().scaled(placement.scale.y).rotated(turn);
        let (ref_a, ref_b) = (ref_path.axis_a(), ref_path.axis_b());
        StrokePaths::hausdorff_distance(ref_center, ref_a, ref_b, target_center, target_a, target_b)
            .max(StrokePaths::hausdorff_distance(target_center, target_a, target_b, ref_center, ref_a, ref_b))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::BBoxCell;
    use crate::group::test::{hatch_group, stipple_group};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_close_value() {
        let mut rng = SmallRng::seed_from_u64(3);
        let sorted = [1.0, 2.0, 3.0, 4.0];
        for _ in 0..20 {
            let v = close_value(&mut rng, 2.0, &sorted, false);
            assert!(v == 1.0 || v == 3.0);
            assert_eq!(close_value(&mut rng, 0.5, &sorted, false), 2.0);
            assert_eq!(close_value(&mut rng, 9.0, &sorted, false), 3.0);
            let wrapped = close_value(&mut rng, 0.5, &sorted, true);
            assert!(wrapped == 2.0 || wrapped == 4.0);
        }
        assert_eq!(close_value(&mut rng, 5.0, &[], false), 5.0);
        assert_eq!(close_value(&mut rng, 5.0, &[7.0], false), 7.0);
    }

    #[test]
    fn test_unwrap_angle() {
        assert!((unwrap_angle(0.1, PI - 0.1) - (-0.1)).abs() < 1e-12);
        assert!((unwrap_angle(PI - 0.1, 0.1) - (PI + 0.1)).abs() < 1e-12);
        assert_eq!(unwrap_angle(1.0, 1.2), 1.2);
    }

    #[test]
    fn test_one_ring_position() {
        let neighbors = [coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 0.0}, coord! {x: 50.0, y: 50.0}];
        let center = coord! {x: 3.0, y: 3.0};
        assert_eq!(one_ring_position(center, &neighbors, &[Some(0), Some(1), None]), coord! {x: 5.0, y: 0.0});
        assert_eq!(one_ring_position(center, &neighbors, &[Some(0), None, None]), center);
    }

    #[test]
    fn test_element_synthesis_stays_in_range() {
        let mut group = stipple_group(4, 20.0);
        let positions: Vec<Coord<f64>> = (0..10).map(|i| coord! {x: i as f64 / 10.0, y: 0.5}).collect();
        group.element_synthesis(&positions);
        assert_eq!(group.targets().len(), 10);
        for (t, p) in group.targets().iter().zip(positions.iter()) {
            assert_eq!(t.position, *p);
            assert!(t.element < group.nb_elements());
        }
        for w in group.targets().windows(2) {
            assert_ne!(w[0].element, w[1].element);
        }
    }

    #[test]
    fn test_hatching_end_to_end() {
        let mut group = hatch_group(3, 20.0, 40.0);
        let bbox = group.strokes_bbox().unwrap();
        group.set_bbox(bbox);
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 2.0 * bbox.width(), y: 40.0}).unwrap();
        group.synthesize_1ring(&mut cell).unwrap();

        println!("Targets: {:?}", group.targets());
        assert_eq!(group.targets().len(), 6);
        assert_eq!(group.corrected().len(), 6);
        let (min_len, max_len) = (group.length().min, group.length().max);
        let (min_w, max_w) = (group.width().min, group.width().max);
        for placement in group.targets().iter().chain(group.corrected().iter()) {
            let path = group.element(placement.element);
            let length = path.axis_a().length() * placement.scale.x;
            let width = path.axis_b().length() * placement.scale.y;
            assert!(length >= min_len - 1e-6 && length <= max_len + 1e-6);
            assert!(width >= min_w - 1e-6 && width <= max_w + 1e-6);
        }
        // Two weighted instances per element.
        assert_eq!(cell.nb_strokes(), 12);
    }

    #[test]
    fn test_empty_group_refuses() {
        let mut group = StrokeGroup::new(crate::group::GroupType::Hatching, crate::group::ReferenceFrame::Axis);
        group.analyze(false);
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 10.0, y: 10.0}).unwrap();
        assert_eq!(group.synthesize_1ring(&mut cell), Err(PatternError::EmptyGroup));
    }
}
