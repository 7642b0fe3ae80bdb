use std::collections::VecDeque;
use std::f64::consts::PI;

use geo_types::{coord, Coord};
use log::{debug, warn};
use rand::{Rng, RngCore};

use super::{
    relative_ratio, virtual_line, Behavior, ElementPlacement, GroupType, PairStatistics, ReferenceFrame,
    StrokeGroup, HISTORY_DEPTH, MAX_COUNT,
};
use crate::cell::GestureCell;
use crate::errors::PatternError;
use crate::geo_types::voronoi::{nearest_neighbors, relax_unit_square};
use crate::geo_types::{InfiniteLine, PointDistance, VectorOps};
use crate::stats::{sample, Property};

use super::distribution::relax_1d;

/// The four nearest neighbor measures of a pair, in pattern pixels for
/// distances and as normalized ratios otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairMeasures {
    pub proximity: f64,
    /// Folded angle difference in [0, 1].
    pub parallelism: f64,
    /// Distance between projected centers over mean projected length.
    pub overlapping: f64,
    pub separation: f64,
}

/// What a synthesized pair gets corrected toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reference {
    /// Element the corrected instance draws.
    pub element: usize,
    pub measures: PairMeasures,
}

/// Picks the reference a synthesized pair is corrected toward, given the
/// pair statistics of the example and the pair's current measures.
pub trait CorrectionStrategy {
    fn reference(
        &self,
        stats: &PairStatistics,
        rng: &mut dyn RngCore,
        current: &PairMeasures,
        element: usize,
    ) -> Reference;
}

/// Take every measure from the example pair whose proximity is closest.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneStrategy;

/// Take the element from the example pair whose proximity is closest, and
/// each measure from whichever example pair is closest on that measure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStrategy;

/// Keep the element and draw every measure from its fitted distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleStrategy;

/// The first (value, index) at or above `value`, or the last one.
fn lower_bound(sorted: &[(f64, usize)], value: f64) -> Option<(f64, usize)> {
    if sorted.is_empty() {
        return None;
    }
    let i = sorted.partition_point(|(v, _)| *v < value).min(sorted.len() - 1);
    Some(sorted[i])
}

fn ordered(property: &Property) -> Vec<(f64, usize)> {
    let mut pairs: Vec<(f64, usize)> = property.measures.iter().copied().zip(0..).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    pairs
}

fn pair_measures(stats: &PairStatistics, pair: usize) -> PairMeasures {
    let at = |p: &Property| p.measures.get(pair).copied().unwrap_or(p.avg);
    PairMeasures {
        proximity: at(&stats.proximity),
        parallelism: at(&stats.parallelism),
        overlapping: at(&stats.overlapping),
        separation: at(&stats.separation),
    }
}

/// Index of the example pair whose proximity is closest to `proximity`.
fn closest_pair(stats: &PairStatistics, proximity: f64) -> Option<usize> {
    lower_bound(&ordered(&stats.proximity), proximity).map(|(_, i)| i)
}

impl CorrectionStrategy for CloneStrategy {
    fn reference(&self, stats: &PairStatistics, _: &mut dyn RngCore, current: &PairMeasures, element: usize) -> Reference {
        match closest_pair(stats, current.proximity) {
            Some(pair) => Reference {
                element: stats.pairs[pair].0,
                measures: pair_measures(stats, pair),
            },
            None => Reference { element, measures: *current },
        }
    }
}

impl CorrectionStrategy for CopyStrategy {
    fn reference(&self, stats: &PairStatistics, _: &mut dyn RngCore, current: &PairMeasures, element: usize) -> Reference {
        let pair = match closest_pair(stats, current.proximity) {
            Some(pair) => pair,
            None => return Reference { element, measures: *current },
        };
        let closest = |p: &Property, value: f64| lower_bound(&ordered(p), value).map(|(v, _)| v).unwrap_or(value);
        Reference {
            element: stats.pairs[pair].0,
            measures: PairMeasures {
                proximity: stats.proximity.measures[pair],
                parallelism: closest(&stats.parallelism, current.parallelism),
                overlapping: closest(&stats.overlapping, current.overlapping),
                separation: closest(&stats.separation, current.separation),
            },
        }
    }
}

impl CorrectionStrategy for SampleStrategy {
    fn reference(&self, stats: &PairStatistics, rng: &mut dyn RngCore, _: &PairMeasures, element: usize) -> Reference {
        Reference {
            element,
            measures: PairMeasures {
                proximity: sample(rng, stats.proximity.avg, stats.proximity.std),
                parallelism: sample(rng, stats.parallelism.avg, stats.parallelism.std),
                overlapping: sample(rng, stats.overlapping.avg, stats.overlapping.std),
                separation: sample(rng, stats.separation.avg, stats.separation.std),
            },
        }
    }
}

impl Behavior {
    pub fn strategy(&self) -> Box<dyn CorrectionStrategy> {
        match self {
            Behavior::Clone => Box::new(CloneStrategy),
            Behavior::Copy => Box::new(CopyStrategy),
            Behavior::Sample => Box::new(SampleStrategy),
        }
    }
}

/// A property value for `element` picked the way `behavior` says, clamped
/// to the observed range.
fn sample_property(behavior: Behavior, rng: &mut dyn RngCore, property: &Property, element: usize) -> f64 {
    if property.is_empty() {
        return property.avg;
    }
    let value = match behavior {
        Behavior::Clone => property.measures.get(element).copied().unwrap_or(property.avg),
        Behavior::Copy => property.measures[rng.gen_range(0..property.measures.len())],
        Behavior::Sample => sample(rng, property.avg, property.std),
    };
    property.clamp(value)
}

/// Angle folded onto [0, PI/2], and whether folding mirrored it.
fn fold_angle(angle: f64) -> (f64, bool) {
    let a = angle.rem_euclid(PI);
    if a > PI / 2.0 {
        (PI - a, true)
    } else {
        (a, false)
    }
}

/// Mean and deviation of nearest neighbor distances, with the pairs.
fn nearest_stats(nodes: &[Coord<f64>]) -> (Property, Vec<(usize, usize)>) {
    let mut distances = Property::new();
    let mut edges = vec![];
    for (i, nearest) in nearest_neighbors(nodes).into_iter().enumerate() {
        if let Some((j, d)) = nearest {
            distances.push(d, 1.0);
            edges.push((i, j));
        }
    }
    distances.finalize();
    (distances, edges)
}

fn spread_ratio(p: &Property) -> f64 {
    if p.avg > 0.0 {
        p.std / p.avg
    } else {
        0.0
    }
}

/// Where a synthesized pair sits along and across its virtual line, in UV.
struct PairGeometry {
    projected_1: f64,
    projected_2: f64,
    /// From the second center's projection to the first's, along the line.
    overlap: Coord<f64>,
    /// From the first center's projection to the second's, across the line.
    separation: Coord<f64>,
}

impl StrokeGroup {
    /// Nearest neighbor synthesis: build a graph whose edge length spread
    /// matches the example's, fill it with elements, then correct each
    /// pair toward the example pair statistics.
    pub fn synthesize_nn(&mut self, cell: &mut dyn GestureCell) -> Result<(), PatternError> {
        self.ensure_synthesizable(cell)?;
        if self.pair_stats.pairs.is_empty() {
            return Err(PatternError::EmptyGroup);
        }
        let scale = cell.scale();
        let (nodes, edges) = match self.reference_frame {
            ReferenceFrame::Axis => self.compute_graph_1d(scale),
            _ => self.compute_graph_2d(scale),
        };

        let mut history = VecDeque::new();
        self.targets.clear();
        for node in nodes.iter() {
            let placement = self.compute_params(scale, *node, &mut history);
            self.targets.push(placement);
        }
        self.corrected = self.targets.clone();

        let mut sorted_edges: Vec<(f64, (usize, usize))> = edges
            .iter()
            .map(|(a, b)| (self.targets[*a].position.distance(&self.targets[*b].position), (*a, *b)))
            .collect();
        sorted_edges.sort_by(|a, b| a.0.total_cmp(&b.0));
        let strategy = self.behavior.strategy();
        let mut processed = vec![false; nodes.len()];
        for (_, (a, b)) in sorted_edges {
            if !processed[a] && !processed[b] {
                self.correct_params(scale, (a, b), strategy.as_ref());
                processed[a] = true;
                processed[b] = true;
            }
        }

        self.render_synthesized_strokes(cell);
        Ok(())
    }

    /// Nodes along the middle of the unit square, relaxed until their
    /// spacing is at least as regular as the example's, then rescaled to the
    /// example spacing.
    pub fn compute_graph_1d(&mut self, scale: f64) -> (Vec<Coord<f64>>, Vec<(usize, usize)>) {
        let proximity = self.pair_stats.proximity.clone();
        if !(proximity.avg > 0.0) {
            return (vec![], vec![]);
        }
        let nb = (scale / proximity.avg) as usize;
        let mut u: Vec<f64> = (0..nb).map(|_| self.rng.gen::<f64>()).collect();
        u.sort_by(|a, b| a.total_cmp(b));
        let on_line = |u: &[f64]| -> Vec<Coord<f64>> { u.iter().map(|x| coord! {x: *x, y: 0.0}).collect() };

        let ref_ratio = spread_ratio(&proximity);
        let (mut stats, _) = nearest_stats(&on_line(&u));
        let mut count = 0;
        while spread_ratio(&stats) > ref_ratio && count < MAX_COUNT {
            relax_1d(&mut u, 1);
            stats = nearest_stats(&on_line(&u)).0;
            count += 1;
        }
        if count == MAX_COUNT {
            warn!("1D graph spacing still irregular after {} relaxations", MAX_COUNT);
        }

        let s = if stats.avg > 0.0 { proximity.avg / (scale * stats.avg) } else { 1.0 };
        let offset = 0.5 * (1.0 - s);
        let nodes: Vec<Coord<f64>> = u.iter().map(|x| coord! {x: x * s + offset, y: 0.5}).collect();
        let (_, edges) = nearest_stats(&nodes);
        debug!("1D graph: {} nodes after {} relaxations", nodes.len(), count);
        (nodes, edges)
    }

    /// Like `compute_graph_1d`, over the unit square.
    pub fn compute_graph_2d(&mut self, scale: f64) -> (Vec<Coord<f64>>, Vec<(usize, usize)>) {
        let proximity = self.pair_stats.proximity.clone();
        if !(proximity.avg > 0.0) {
            return (vec![], vec![]);
        }
        let nb = (scale * scale / (proximity.avg * proximity.avg)) as usize;
        let mut nodes: Vec<Coord<f64>> = (0..nb)
            .map(|_| coord! {x: self.rng.gen::<f64>(), y: self.rng.gen::<f64>()})
            .collect();

        let ref_ratio = spread_ratio(&proximity);
        let (mut stats, _) = nearest_stats(&nodes);
        let mut ratio = spread_ratio(&stats);
        let mut count = 0;
        let mut diverged = false;
        while ratio > ref_ratio && count < MAX_COUNT {
            nodes = relax_unit_square(&nodes);
            stats = nearest_stats(&nodes).0;
            let last = ratio;
            ratio = spread_ratio(&stats);
            diverged |= ratio > last;
            count += 1;
        }
        if diverged {
            warn!("Lloyd relaxation diverged while regularizing a 2D graph");
        }
        if count == MAX_COUNT {
            warn!("2D graph spacing still irregular after {} relaxations", MAX_COUNT);
        }

        let s = if stats.avg > 0.0 { proximity.avg / (scale * stats.avg) } else { 1.0 };
        let offset = 0.5 * (1.0 - s);
        let nodes: Vec<Coord<f64>> = nodes.iter().map(|n| n.scaled(s) + coord! {x: offset, y: offset}).collect();
        let (_, edges) = nearest_stats(&nodes);
        debug!("2D graph: {} nodes after {} relaxations", nodes.len(), count);
        (nodes, edges)
    }

    /// Uniform pick among elements not used recently.
    fn pick_unvisited(&mut self, history: &mut VecDeque<usize>) -> usize {
        let n = self.elements.len();
        let fresh: Vec<usize> = (0..n).filter(|e| !history.contains(e)).collect();
        let element = if fresh.is_empty() {
            self.rng.gen_range(0..n)
        } else {
            fresh[self.rng.gen_range(0..fresh.len())]
        };
        history.push_back(element);
        if history.len() > n / 2 || history.len() > HISTORY_DEPTH {
            history.pop_front();
        }
        element
    }

    /// Element, extents, angle and position of the element at one node.
    fn compute_params(&mut self, scale: f64, node: Coord<f64>, history: &mut VecDeque<usize>) -> ElementPlacement {
        let element = self.pick_unvisited(history);
        let path = self.element(element);
        let (ref_length, ref_width) = (path.axis_a().length(), path.axis_b().length());

        let (length_ratio, width_ratio) = if !self.stretching {
            (1.0, 1.0)
        } else {
            let target_length = sample_property(self.behavior, &mut self.rng, &self.length, element);
            let length_ratio = relative_ratio(target_length, ref_length);
            if self.group_type == GroupType::Hatching {
                let target_width = sample_property(self.behavior, &mut self.rng, &self.width, element);
                (length_ratio, relative_ratio(target_width, ref_width))
            } else {
                (length_ratio, length_ratio)
            }
        };

        let mut angle = 0.0;
        if matches!(self.group_type, GroupType::Hatching | GroupType::Free) {
            let mut orientation = sample_property(self.behavior, &mut self.rng, &self.orientation, element);
            if orientation < 0.0 {
                orientation = -orientation;
            } else if orientation > 1.0 {
                orientation = 2.0 - orientation;
            }
            angle = orientation.acos();
        }
        if self.reference_frame == ReferenceFrame::Angular {
            let radial = node - coord! {x: 0.5, y: 0.5};
            if radial.length() > 0.0 {
                angle += coord! {x: 1.0, y: 0.0}.signed_angle(&radial);
            }
        }

        let mut position = node;
        if self.reference_frame == ReferenceFrame::Axis {
            position.y += sample_property(self.behavior, &mut self.rng, &self.offset, element) / scale;
        }

        ElementPlacement {
            element,
            position,
            angle,
            scale: coord! {x: length_ratio, y: width_ratio},
        }
    }

    fn pair_geometry(&self, scale: f64, (a, b): (usize, usize)) -> PairGeometry {
        let axis = |p: &ElementPlacement| {
            coord! {x: p.angle.cos(), y: p.angle.sin()}
                .scaled(p.scale.x * self.element(p.element).axis_a().length() / scale)
        };
        let (t1, t2) = (&self.targets[a], &self.targets[b]);
        let (c1, c2, axis1, axis2) = (t1.position, t2.position, axis(t1), axis(t2));
        let line = virtual_line(c1, axis1, c2, axis2);
        let across = InfiniteLine::new(line.point, line.vector.perpendicular());
        PairGeometry {
            projected_1: super::projected_length(&line, c1, axis1),
            projected_2: super::projected_length(&line, c2, axis2),
            overlap: line.project(&c1) - line.project(&c2),
            separation: across.project(&c2) - across.project(&c1),
        }
    }

    /// Correct the first element of a synthesized pair toward the reference
    /// the strategy picks.
    fn correct_params(&mut self, scale: f64, edge: (usize, usize), strategy: &dyn CorrectionStrategy) {
        let (a, b) = edge;
        let (t1, t2) = (self.targets[a], self.targets[b]);
        let geometry = self.pair_geometry(scale, edge);
        let projected = geometry.projected_1 + geometry.projected_2;
        let (folded_1, mirrored) = fold_angle(t1.angle);
        let (folded_2, _) = fold_angle(t2.angle);
        let current = PairMeasures {
            proximity: t1.position.distance(&t2.position) * scale,
            parallelism: 2.0 * (folded_1 - folded_2).abs() / PI,
            overlapping: if projected > 0.0 { 2.0 * geometry.overlap.length() / projected } else { 0.0 },
            separation: geometry.separation.length() * scale,
        };
        let reference = strategy.reference(&self.pair_stats, &mut self.rng, &current, t1.element);
        let target = reference.measures;

        let mut corrected = self.corrected[a];
        corrected.element = reference.element;
        match self.group_type {
            GroupType::Stippling => {
                let edge_vec = t1.position - t2.position;
                let shift = target.proximity / scale - edge_vec.length();
                corrected.position = t1.position + edge_vec.normalized().scaled(shift);
            }
            GroupType::Hatching => {
                let mut parallelism = target.parallelism;
                if parallelism < 0.0 {
                    parallelism = -parallelism;
                } else if parallelism > 1.0 {
                    parallelism = 2.0 - parallelism;
                }
                let direction = if folded_1 > folded_2 { 1.0 } else { -1.0 };
                let turn = direction * (parallelism - current.parallelism) * PI * 0.5;
                corrected.angle = if mirrored { t1.angle - turn } else { t1.angle + turn };

                corrected.position = t1.position
                    + geometry
                        .overlap
                        .normalized()
                        .scaled((target.overlapping - current.overlapping) * 0.5 * projected)
                    + geometry
                        .separation
                        .normalized()
                        .scaled((current.separation - target.separation) / scale);
            }
            GroupType::Free => {}
        }
        self.corrected[a] = corrected;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cell::BBoxCell;
    use crate::group::test::{hatch_group, hatch_group_at, radial_group, stipple_group};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn stats() -> PairStatistics {
        let mut stats = PairStatistics {
            pairs: vec![(0, 1), (1, 2), (2, 1)],
            ..Default::default()
        };
        for (prox, par, ov, sep) in [(10.0, 0.0, 0.1, 1.0), (20.0, 0.2, 0.3, 2.0), (30.0, 0.4, 0.5, 3.0)] {
            stats.proximity.push(prox, 1.0);
            stats.parallelism.push(par, 1.0);
            stats.overlapping.push(ov, 1.0);
            stats.separation.push(sep, 1.0);
        }
        stats.proximity.finalize();
        stats.parallelism.finalize();
        stats.overlapping.finalize();
        stats.separation.finalize();
        stats
    }

    #[test]
    fn test_angular_placements_point_outwards() {
        let mut group = radial_group(8, 20.0, 50.0);
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 200.0, y: 200.0}).unwrap();
        group.synthesize_nn(&mut cell).unwrap();
        println!("{} targets", group.targets().len());
        assert!(!group.targets().is_empty());
        let center = coord! {x: 0.5, y: 0.5};
        for t in group.targets() {
            let radial = t.position - center;
            if radial.length() < 1e-9 {
                continue;
            }
            let expected = coord! {x: 1.0, y: 0.0}.signed_angle(&radial);
            assert!((t.angle - expected).abs() < 1e-6, "{:?} vs {}", t, expected);
        }
    }

    #[test]
    fn test_clone_strategy_takes_one_pair() {
        let mut rng = SmallRng::seed_from_u64(1);
        let current = PairMeasures { proximity: 15.0, parallelism: 0.9, overlapping: 0.0, separation: 0.0 };
        let r = CloneStrategy.reference(&stats(), &mut rng, &current, 7);
        assert_eq!(r.element, 1);
        assert_eq!(r.measures, PairMeasures { proximity: 20.0, parallelism: 0.2, overlapping: 0.3, separation: 2.0 });
        let far = PairMeasures { proximity: 99.0, ..current };
        assert_eq!(CloneStrategy.reference(&stats(), &mut rng, &far, 7).element, 2);
    }

    #[test]
    fn test_copy_strategy_mixes_pairs() {
        let mut rng = SmallRng::seed_from_u64(1);
        let current = PairMeasures { proximity: 5.0, parallelism: 0.3, overlapping: 0.45, separation: 9.0 };
        let r = CopyStrategy.reference(&stats(), &mut rng, &current, 7);
        assert_eq!(r.element, 0);
        assert_eq!(r.measures, PairMeasures { proximity: 10.0, parallelism: 0.4, overlapping: 0.5, separation: 3.0 });
    }

    #[test]
    fn test_sample_strategy_keeps_element() {
        let mut rng = SmallRng::seed_from_u64(1);
        let s = stats();
        for _ in 0..100 {
            let r = SampleStrategy.reference(&s, &mut rng, &PairMeasures::default(), 7);
            assert_eq!(r.element, 7);
            let p = &s.proximity;
            assert!(r.measures.proximity >= p.avg - 2.0 * p.std && r.measures.proximity <= p.avg + 2.0 * p.std);
        }
    }

    #[test]
    fn test_fold_angle() {
        assert_eq!(fold_angle(0.25), (0.25, false));
        let (a, mirrored) = fold_angle(PI - 0.25);
        assert!((a - 0.25).abs() < 1e-12 && mirrored);
        let (a, _) = fold_angle(-0.25);
        assert!((a - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_graph_1d_matches_example_spacing() {
        let mut group = hatch_group(4, 20.0, 40.0);
        let (nodes, edges) = group.compute_graph_1d(200.0);
        assert_eq!(nodes.len(), 10);
        assert_eq!(edges.len(), nodes.len());
        let mut xs: Vec<f64> = nodes.iter().map(|n| n.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        for w in xs.windows(2) {
            // 20 px apart in a 200 px cell.
            assert!((w[1] - w[0] - 0.1).abs() < 0.02, "gap {}", w[1] - w[0]);
        }
        for n in nodes.iter() {
            assert_eq!(n.y, 0.5);
        }
    }

    #[test]
    fn test_history_avoids_repeats() {
        let mut group = hatch_group(8, 10.0, 30.0);
        let mut history = VecDeque::new();
        let picks: Vec<usize> = (0..40).map(|_| group.pick_unvisited(&mut history)).collect();
        for w in picks.windows(3) {
            assert_ne!(w[0], w[1]);
            assert_ne!(w[0], w[2]);
            assert_ne!(w[1], w[2]);
        }
        assert!(history.len() <= HISTORY_DEPTH);
    }

    #[test]
    fn test_nn_hatching_all_behaviors() {
        for behavior in [Behavior::Clone, Behavior::Copy, Behavior::Sample] {
            let mut group = hatch_group_at(&[0.0, 18.0, 40.0, 61.0], 40.0);
            group.set_behavior(behavior);
            group.enable_stretching(true);
            let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 200.0, y: 50.0}).unwrap();
            group.synthesize_nn(&mut cell).unwrap();
            let n = group.targets().len();
            println!("{:?}: {} elements", behavior, n);
            assert!(n >= 5);
            assert_eq!(group.corrected().len(), n);
            for c in group.corrected() {
                assert!(c.element < group.nb_elements());
                assert!(c.position.x.is_finite() && c.position.y.is_finite() && c.angle.is_finite());
            }
            assert_eq!(cell.nb_strokes(), 2 * n);
        }
    }

    #[test]
    fn test_nn_stippling_corrects_proximity() {
        let mut group = stipple_group(4, 20.0);
        group.set_behavior(Behavior::Clone);
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 120.0, y: 120.0}).unwrap();
        group.synthesize_nn(&mut cell).unwrap();
        assert!(!group.targets().is_empty());
        let measures = group.pair_statistics().proximity.measures.clone();
        let scale = cell.scale();
        // A corrected element sits at an example proximity from its partner.
        let moved: Vec<&ElementPlacement> = group
            .corrected()
            .iter()
            .enumerate()
            .filter(|(i, c)| c.position != group.targets()[*i].position)
            .map(|(_, c)| c)
            .collect();
        println!("{} of {} elements moved", moved.len(), group.targets().len());
        assert!(!moved.is_empty());
        for c in moved {
            let at_example_distance = group.targets().iter().any(|t| {
                let d = t.position.distance(&c.position) * scale;
                measures.iter().any(|m| (d - m).abs() < 1e-6)
            });
            assert!(at_example_distance);
        }
    }

    #[test]
    fn test_nn_needs_pairs() {
        let mut group = hatch_group(1, 20.0, 40.0);
        let mut cell = BBoxCell::new(coord! {x: 0.0, y: 0.0}, coord! {x: 100.0, y: 50.0}).unwrap();
        assert_eq!(group.synthesize_nn(&mut cell), Err(PatternError::EmptyGroup));
    }
}
