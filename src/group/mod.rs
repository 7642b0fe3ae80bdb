use std::collections::VecDeque;
use std::f64::consts::PI;

use geo_types::{coord, Coord, Rect};
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::cell::GestureCell;
use crate::errors::PatternError;
use crate::geo_types::voronoi::DelaunayGraph;
use crate::geo_types::{rect_center, rect_union, InfiniteLine, PointDistance, VectorOps};
use crate::gesture::GestureStroke;
use crate::stats::Property;
use crate::stroke_paths::{ElementType, StrokePaths};

/// Where synthesized elements go: Lloyd relaxation or a jittered grid.
pub mod distribution;
/// Efros style synthesis, one element at a time by neighborhood matching.
pub mod efros;
/// Nearest neighbor synthesis with per pair correction.
pub mod legacy;
/// Element synthesis followed by 1-ring neighborhood correction.
pub mod one_ring;
/// Blending target and corrected placements into cell strokes.
pub mod render;

pub use legacy::{CloneStrategy, CopyStrategy, CorrectionStrategy, PairMeasures, SampleStrategy};
pub use render::correction_weights;

/// Picks for one element stay out of the last few picks.
pub const HISTORY_DEPTH: usize = 3;
/// Iteration bound of every relaxation loop.
pub const MAX_COUNT: usize = 200;
/// Delaunay triangles with an angle this wide don't make neighborhoods.
pub const MAX_ANGLE: f64 = 2.0 * PI / 3.0;

/// What kind of marks the group holds. Decides which element shape strokes
/// are fitted to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupType {
    #[default]
    Stippling,
    Hatching,
    Free,
}

impl GroupType {
    pub fn element_type(&self) -> ElementType {
        match self {
            GroupType::Stippling => ElementType::Point,
            GroupType::Hatching => ElementType::Line,
            GroupType::Free => ElementType::BBox,
        }
    }
}

/// How element layout is read: along a line, in the plane, or in the plane
/// with orientations taken relative to the radial direction.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceFrame {
    #[default]
    Axis,
    Cartesian,
    Angular,
}

/// How the nearest neighbor synthesis picks its reference values.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// Reuse the measures of one reference pair.
    #[default]
    Clone,
    /// Reuse the closest reference measure of each kind independently.
    Copy,
    /// Draw from the fitted normal distribution.
    Sample,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distribution {
    #[default]
    Lloyd,
    Stratified,
}

/// Order in which synthesized elements get corrected.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthMethod {
    /// Every element sees its neighbors' initial placement.
    Parallel,
    /// Breadth first from the middle of the cell; later elements see their
    /// neighbors' corrected placement.
    #[default]
    Causal,
}

/// One synthesized element: which reference element to draw, and where.
/// `position` is in cell UV, `angle` is the direction of the element's main
/// axis and `scale` stretches it along its own main and minor axes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ElementPlacement {
    pub element: usize,
    pub position: Coord<f64>,
    pub angle: f64,
    pub scale: Coord<f64>,
}

impl ElementPlacement {
    pub fn new(element: usize, position: Coord<f64>) -> ElementPlacement {
        ElementPlacement {
            element,
            position,
            angle: 0.0,
            scale: coord! {x: 1.0, y: 1.0},
        }
    }
}

/// Nearest neighbor pair statistics, kept for the nearest neighbor synthesis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairStatistics {
    /// (element, its nearest neighbor), in element indices.
    pub pairs: Vec<(usize, usize)>,
    pub proximity: Property,
    pub parallelism: Property,
    pub overlapping: Property,
    pub separation: Property,
}

/// A set of elements sharing a type and reference frame, with the
/// statistics learnt from them and the result of the last synthesis.
///
/// `elements` index into the paths; every other per-element vector,
/// neighbor list and placement uses element indices.
#[derive(Debug, Clone)]
pub struct StrokeGroup {
    group_type: GroupType,
    reference_frame: ReferenceFrame,
    stroke_paths: Vec<StrokePaths>,
    elements: Vec<usize>,
    element_neighbors: Vec<Vec<usize>>,
    bbox: Option<Rect<f64>>,
    style_analyzed: bool,

    length: Property,
    width: Property,
    /// Folded |cos| of the main axis against x (or the radial direction).
    orientation: Property,
    /// Main axis direction in [0, PI].
    angle: Property,
    offset: Property,
    relative_position: Vec<Property>,
    relative_length: Vec<Property>,
    relative_width: Vec<Property>,
    relative_orientation: Vec<Property>,
    pair_stats: PairStatistics,

    behavior: Behavior,
    distribution: Distribution,
    synth_method: SynthMethod,
    stretching: bool,
    ring_nb: usize,
    correction_amount: f64,

    targets: Vec<ElementPlacement>,
    corrected: Vec<ElementPlacement>,
    rng: SmallRng,
}

impl StrokeGroup {
    pub fn new(group_type: GroupType, reference_frame: ReferenceFrame) -> StrokeGroup {
        StrokeGroup {
            group_type,
            reference_frame,
            stroke_paths: vec![],
            elements: vec![],
            element_neighbors: vec![],
            bbox: None,
            style_analyzed: false,
            length: Property::new(),
            width: Property::new(),
            orientation: Property::new(),
            angle: Property::new(),
            offset: Property::new(),
            relative_position: vec![],
            relative_length: vec![],
            relative_width: vec![],
            relative_orientation: vec![],
            pair_stats: PairStatistics::default(),
            behavior: Behavior::default(),
            distribution: Distribution::default(),
            synth_method: SynthMethod::default(),
            stretching: false,
            ring_nb: 1,
            correction_amount: 1.0,
            targets: vec![],
            corrected: vec![],
            rng: SmallRng::from_entropy(),
        }
    }

    /// Make every stochastic step of this group reproducible.
    pub fn with_seed(mut self, seed: u64) -> StrokeGroup {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn add_path(&mut self, path: StrokePaths) {
        self.stroke_paths.push(path);
    }

    /// Set the pattern bounding box, on the group and every stroke in it.
    pub fn set_bbox(&mut self, bbox: Rect<f64>) {
        self.bbox = Some(bbox);
        for path in self.stroke_paths.iter_mut() {
            path.set_bbox(bbox);
        }
        self.compute_frame_statistics();
    }

    /// Orientation and offset statistics, measured from the center of the
    /// pattern bbox (the group's own bbox until one is set).
    fn compute_frame_statistics(&mut self) {
        let origin = self.reference_bbox().map(|b| rect_center(&b)).unwrap_or(coord! {x: 0.0, y: 0.0});
        let measures: Vec<(f64, f64)> = (0..self.elements.len())
            .map(|i| {
                let path = self.element(i);
                (self.orientation_of(path, origin), self.offset_of(path, origin))
            })
            .collect();
        self.orientation = Property::new();
        self.offset = Property::new();
        for (orientation, offset) in measures {
            self.orientation.push(orientation, 1.0);
            self.offset.push(offset, 1.0);
        }
        self.orientation.finalize();
        self.offset.finalize();
    }

    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    pub fn reference_frame(&self) -> ReferenceFrame {
        self.reference_frame
    }

    pub fn paths(&self) -> &[StrokePaths] {
        &self.stroke_paths
    }

    pub fn nb_paths(&self) -> usize {
        self.stroke_paths.len()
    }

    /// Indices of the paths that are elements of this group.
    pub fn elements(&self) -> &[usize] {
        &self.elements
    }

    pub fn nb_elements(&self) -> usize {
        self.elements.len()
    }

    /// The path behind an element index.
    pub fn element(&self, idx: usize) -> &StrokePaths {
        &self.stroke_paths[self.elements[idx]]
    }

    pub fn element_neighbors(&self) -> &[Vec<usize>] {
        &self.element_neighbors
    }

    pub fn element_pairs(&self) -> &[(usize, usize)] {
        &self.pair_stats.pairs
    }

    pub fn pair_statistics(&self) -> &PairStatistics {
        &self.pair_stats
    }

    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    pub fn length(&self) -> &Property {
        &self.length
    }

    pub fn width(&self) -> &Property {
        &self.width
    }

    pub fn orientation(&self) -> &Property {
        &self.orientation
    }

    pub fn angle(&self) -> &Property {
        &self.angle
    }

    pub fn offset(&self) -> &Property {
        &self.offset
    }

    pub fn relative_position(&self) -> &[Property] {
        &self.relative_position
    }

    pub fn relative_length(&self) -> &[Property] {
        &self.relative_length
    }

    pub fn relative_width(&self) -> &[Property] {
        &self.relative_width
    }

    pub fn relative_orientation(&self) -> &[Property] {
        &self.relative_orientation
    }

    pub fn style_analyzed(&self) -> bool {
        self.style_analyzed
    }

    /// Placements as first synthesized.
    pub fn targets(&self) -> &[ElementPlacement] {
        &self.targets
    }

    /// Placements after neighborhood correction.
    pub fn corrected(&self) -> &[ElementPlacement] {
        &self.corrected
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn set_behavior(&mut self, behavior: Behavior) {
        self.behavior = behavior;
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn set_distribution(&mut self, distribution: Distribution) {
        self.distribution = distribution;
    }

    pub fn synth_method(&self) -> SynthMethod {
        self.synth_method
    }

    pub fn set_synth_method(&mut self, method: SynthMethod) {
        self.synth_method = method;
    }

    pub fn stretching_enabled(&self) -> bool {
        self.stretching
    }

    pub fn enable_stretching(&mut self, stretch: bool) {
        self.stretching = stretch;
    }

    pub fn ring_nb(&self) -> usize {
        self.ring_nb
    }

    pub fn set_ring_nb(&mut self, ring_nb: usize) {
        self.ring_nb = ring_nb;
    }

    pub fn correction_amount(&self) -> f64 {
        self.correction_amount
    }

    pub fn set_correction_amount(&mut self, amount: f64) {
        self.correction_amount = amount.clamp(0.0, 1.0);
    }

    /// Every raw stroke of the group, in path order.
    pub fn strokes(&self) -> Vec<GestureStroke> {
        self.stroke_paths.iter().flat_map(|p| p.strokes().iter().cloned()).collect()
    }

    pub fn into_strokes(self) -> Vec<GestureStroke> {
        self.stroke_paths.into_iter().flat_map(|p| p.into_strokes()).collect()
    }

    /// Pixel bounds of the group's own strokes.
    pub fn strokes_bbox(&self) -> Option<Rect<f64>> {
        self.stroke_paths
            .iter()
            .flat_map(|p| p.strokes().iter())
            .filter_map(|s| s.pix_bbox())
            .reduce(|a, b| rect_union(&a, &b))
    }

    /// The pattern bbox once it has been set, else the group's own.
    pub(crate) fn reference_bbox(&self) -> Option<Rect<f64>> {
        self.bbox.or_else(|| self.strokes_bbox())
    }

    pub(crate) fn ensure_synthesizable(&self, cell: &dyn GestureCell) -> Result<(), PatternError> {
        if self.elements.is_empty() {
            return Err(PatternError::EmptyGroup);
        }
        if !cell.valid() {
            return Err(PatternError::InvalidTargetCell);
        }
        Ok(())
    }

    /// Recompute elements, statistics and neighbor graph from scratch.
    pub fn analyze(&mut self, analyze_style: bool) {
        self.style_analyzed = analyze_style;
        self.compute_elements();
        let nb_elements = self.elements.len();

        self.length = Property::new();
        self.width = Property::new();
        self.angle = Property::new();
        for i in 0..nb_elements {
            let path = self.element(i);
            let (length, width) = (path.axis_a().length(), path.axis_b().length());
            let angle = self.angle_of(path);
            self.length.push(length, 1.0);
            self.width.push(width, 1.0);
            self.angle.push(angle, 1.0);
        }
        self.length.finalize();
        self.width.finalize();
        self.angle.finalize();
        self.compute_frame_statistics();

        self.pair_stats = PairStatistics::default();
        self.relative_position = vec![Property::new(); nb_elements];
        self.relative_length = vec![Property::new(); nb_elements];
        self.relative_width = vec![Property::new(); nb_elements];
        self.relative_orientation = vec![Property::new(); nb_elements];
        if nb_elements < 2 {
            self.element_neighbors = vec![vec![]; nb_elements];
            for props in [
                &mut self.relative_position,
                &mut self.relative_length,
                &mut self.relative_width,
                &mut self.relative_orientation,
            ] {
                props.iter_mut().for_each(|p| p.finalize());
            }
            self.pair_stats.proximity.finalize();
            self.pair_stats.parallelism.finalize();
            self.pair_stats.overlapping.finalize();
            self.pair_stats.separation.finalize();
            self.log_statistics();
            return;
        }

        self.compute_element_neighbors();
        for i in 0..nb_elements {
            for j in self.element_neighbors[i].clone() {
                let (sp1, sp2) = (self.element(i), self.element(j));
                let position = self.relative_position_of(sp1, sp2);
                let length = relative_ratio(sp1.axis_a().length(), sp2.axis_a().length());
                let width = relative_ratio(sp1.axis_b().length(), sp2.axis_b().length());
                let orientation = relative_orientation_of(sp1, sp2);
                self.relative_position[i].push(position, 1.0);
                self.relative_length[i].push(length, 1.0);
                self.relative_width[i].push(width, 1.0);
                self.relative_orientation[i].push(orientation, 1.0);
            }
            self.relative_position[i].finalize();
            self.relative_length[i].finalize();
            self.relative_width[i].finalize();
            self.relative_orientation[i].finalize();
        }

        for k in 0..self.pair_stats.pairs.len() {
            let (i, j) = self.pair_stats.pairs[k];
            let (sp1, sp2) = (self.element(i), self.element(j));
            let proximity = self.proximity_of(sp1, sp2);
            let parallelism = parallelism_of(sp1, sp2);
            let overlapping = overlapping_of(sp1, sp2);
            let separation = separation_of(sp1, sp2);
            self.pair_stats.proximity.push(proximity, 1.0);
            self.pair_stats.parallelism.push(parallelism, 1.0);
            self.pair_stats.overlapping.push(overlapping, 1.0);
            self.pair_stats.separation.push(separation, 1.0);
        }
        self.pair_stats.proximity.finalize();
        self.pair_stats.parallelism.finalize();
        self.pair_stats.overlapping.finalize();
        self.pair_stats.separation.finalize();

        self.log_statistics();
    }

    fn compute_elements(&mut self) {
        let wanted = self.group_type.element_type();
        self.elements = self
            .stroke_paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.element_type() == wanted)
            .map(|(i, _)| i)
            .collect();
    }

    fn element_centers(&self) -> Vec<Coord<f64>> {
        (0..self.elements.len()).map(|i| self.element(i).center()).collect()
    }

    fn compute_element_neighbors(&mut self) {
        let centers = self.element_centers();
        self.element_neighbors = match self.reference_frame {
            ReferenceFrame::Axis => neighbors_1d(&centers),
            ReferenceFrame::Cartesian | ReferenceFrame::Angular => neighbors_2d(&centers),
        };
        self.pair_stats.pairs = match self.reference_frame {
            ReferenceFrame::Axis => nearest_pairs(&centers, &self.element_neighbors, |a, b| (a.x - b.x).abs()),
            _ => nearest_pairs(&centers, &self.element_neighbors, |a, b| a.distance(b)),
        };
    }

    /// Main axis direction of a path in [0, PI].
    pub fn angle_of(&self, path: &StrokePaths) -> f64 {
        path.main_angle()
    }

    /// How aligned the main axis is with x, or with the direction from
    /// `origin` for angular groups: 1 when parallel, 0 when perpendicular.
    pub fn orientation_of(&self, path: &StrokePaths, origin: Coord<f64>) -> f64 {
        let axis = path.axis_a().normalized();
        match self.reference_frame {
            ReferenceFrame::Angular => axis.dot(&(path.center() - origin).normalized()).abs(),
            _ => axis.dot(&coord! {x: 1.0, y: 0.0}).abs(),
        }
    }

    /// Vertical displacement from `origin`. Only axis groups have one.
    pub fn offset_of(&self, path: &StrokePaths, origin: Coord<f64>) -> f64 {
        match self.reference_frame {
            ReferenceFrame::Axis => path.center().y - origin.y,
            _ => 0.0,
        }
    }

    fn relative_position_of(&self, sp1: &StrokePaths, sp2: &StrokePaths) -> f64 {
        match self.reference_frame {
            ReferenceFrame::Axis => (sp1.center().x - sp2.center().x).abs(),
            _ => sp1.center().distance(&sp2.center()),
        }
    }

    fn proximity_of(&self, sp1: &StrokePaths, sp2: &StrokePaths) -> f64 {
        self.relative_position_of(sp1, sp2)
    }

    fn log_statistics(&self) {
        debug!(
            "{:?} group, {:?} frame: {} elements out of {} paths",
            self.group_type,
            self.reference_frame,
            self.elements.len(),
            self.stroke_paths.len()
        );
        for (name, p) in [
            ("length", &self.length),
            ("width", &self.width),
            ("orientation", &self.orientation),
            ("angle", &self.angle),
        ] {
            debug!("{} = ({}, {}) ; [{}..{}]", name, p.avg, p.std, p.min, p.max);
        }
        if self.reference_frame == ReferenceFrame::Axis {
            let p = &self.offset;
            debug!("offset = ({}, {}) ; [{}..{}]", p.avg, p.std, p.min, p.max);
        }
        for (i, neighbors) in self.element_neighbors.iter().enumerate() {
            let p = &self.relative_position[i];
            debug!(
                "element[{}]: {} neighbors, relative position = ({}, {}) ; [{}..{}]",
                i,
                neighbors.len(),
                p.avg,
                p.std,
                p.min,
                p.max
            );
        }
    }
}

/// a / b, or 1 when b is too small to divide by.
pub(crate) fn relative_ratio(a: f64, b: f64) -> f64 {
    if b.abs() < 1e-9 {
        1.0
    } else {
        a / b
    }
}

/// Angle between two main axes, folded to [0, PI/2] and normalized to [0, 1].
fn relative_orientation_of(sp1: &StrokePaths, sp2: &StrokePaths) -> f64 {
    let angle = sp1.axis_a().angle(&sp2.axis_a());
    if angle > PI * 0.5 {
        (PI - angle) * 2.0 / PI
    } else {
        angle * 2.0 / PI
    }
}

/// Angle of an axis against x, folded to [0, PI/2].
pub(crate) fn folded_angle(axis: Coord<f64>) -> f64 {
    let angle = axis.angle(&coord! {x: 1.0, y: 0.0});
    if angle > PI / 2.0 {
        PI - angle
    } else {
        angle
    }
}

fn parallelism_of(sp1: &StrokePaths, sp2: &StrokePaths) -> f64 {
    2.0 * (folded_angle(sp1.axis_a()) - folded_angle(sp2.axis_a())).abs() / PI
}

/// The line both elements would sit on: through their length weighted
/// center, along their averaged main axis.
pub(crate) fn virtual_line(c1: Coord<f64>, axis1: Coord<f64>, c2: Coord<f64>, axis2: Coord<f64>) -> InfiniteLine {
    let (l1, l2) = (axis1.length(), axis2.length());
    let center = if l1 + l2 > 0.0 {
        (c1.scaled(l1) + c2.scaled(l2)).scaled(1.0 / (l1 + l2))
    } else {
        (c1 + c2).scaled(0.5)
    };
    let aligned = if axis1.dot(&axis2) >= 0.0 { axis2 } else { axis2.scaled(-1.0) };
    let mut dir = (axis1 + aligned).normalized();
    if dir.length() == 0.0 {
        dir = coord! {x: 1.0, y: 0.0};
    }
    InfiniteLine::new(center, dir)
}

/// Projected length of a centered segment onto a line.
pub(crate) fn projected_length(line: &InfiniteLine, center: Coord<f64>, axis: Coord<f64>) -> f64 {
    line.project(&(center + axis.scaled(0.5))).distance(&line.project(&(center - axis.scaled(0.5))))
}

/// Distance between the projected centers, relative to the mean projected length.
fn overlapping_of(sp1: &StrokePaths, sp2: &StrokePaths) -> f64 {
    let (c1, c2) = (sp1.center(), sp2.center());
    let line = virtual_line(c1, sp1.axis_a(), c2, sp2.axis_a());
    let center_vec = line.project(&c1) - line.project(&c2);
    let total = projected_length(&line, c1, sp1.axis_a()) + projected_length(&line, c2, sp2.axis_a());
    if total <= 0.0 {
        return 0.0;
    }
    2.0 * center_vec.length() / total
}

/// Distance between the centers across the virtual line.
fn separation_of(sp1: &StrokePaths, sp2: &StrokePaths) -> f64 {
    let (c1, c2) = (sp1.center(), sp2.center());
    let line = virtual_line(c1, sp1.axis_a(), c2, sp2.axis_a());
    let across = InfiniteLine::new(line.point, line.vector.perpendicular());
    across.project(&c1).distance(&across.project(&c2))
}

/// Closest left and right neighbor along x. Nodes sharing an x see no
/// neighbor on that side.
pub(crate) fn neighbors_1d(nodes: &[Coord<f64>]) -> Vec<Vec<usize>> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, cur)| {
            let mut left: Option<(usize, f64)> = None;
            let mut right: Option<(usize, f64)> = None;
            for (j, cand) in nodes.iter().enumerate() {
                if i == j {
                    continue;
                }
                let d = cand.x - cur.x;
                if d > 0.0 && right.map(|(_, r)| d < r).unwrap_or(true) {
                    right = Some((j, d));
                }
                if d < 0.0 && left.map(|(_, l)| d > l).unwrap_or(true) {
                    left = Some((j, d));
                }
            }
            left.into_iter().chain(right).map(|(j, _)| j).collect()
        })
        .collect()
}

/// Delaunay adjacency, convex hull edges included. Point sets with no
/// triangulation (two nodes, or all collinear) get chained in x then y
/// order instead.
pub(crate) fn neighbors_2d(nodes: &[Coord<f64>]) -> Vec<Vec<usize>> {
    match DelaunayGraph::build(nodes) {
        Some(graph) => (0..nodes.len()).map(|i| graph.neighbors(i)).collect(),
        None => chain_neighbors(nodes),
    }
}

pub(crate) fn chain_neighbors(nodes: &[Coord<f64>]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|a, b| nodes[*a].x.total_cmp(&nodes[*b].x).then(nodes[*a].y.total_cmp(&nodes[*b].y)));
    let mut neighbors = vec![vec![]; nodes.len()];
    for w in order.windows(2) {
        neighbors[w[0]].push(w[1]);
        neighbors[w[1]].push(w[0]);
    }
    for n in neighbors.iter_mut() {
        n.sort_unstable();
    }
    neighbors
}

/// Pair every node with its closest neighbor under `dist`.
fn nearest_pairs<F>(nodes: &[Coord<f64>], neighbors: &[Vec<usize>], dist: F) -> Vec<(usize, usize)>
where
    F: Fn(&Coord<f64>, &Coord<f64>) -> f64,
{
    neighbors
        .iter()
        .enumerate()
        .filter_map(|(i, ns)| {
            ns.iter()
                .map(|j| (*j, dist(&nodes[i], &nodes[*j])))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(j, _)| (i, j))
        })
        .collect()
}

/// Breadth first from `start`, then from each node not reached yet.
pub(crate) fn breadth_first_order(neighborhoods: &[Vec<usize>], start: usize) -> Vec<usize> {
    let n = neighborhoods.len();
    let mut processed = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let seeds = std::iter::once(start).chain(0..n);
    for seed in seeds {
        if seed >= n || processed[seed] {
            continue;
        }
        let mut active = VecDeque::from([seed]);
        processed[seed] = true;
        while let Some(cur) = active.pop_front() {
            order.push(cur);
            for next in neighborhoods[cur].iter() {
                if !processed[*next] {
                    processed[*next] = true;
                    active.push_back(*next);
                }
            }
        }
    }
    order
}

/// Everything within `ring_nb` hops of `idx`, in breadth first order,
/// `idx` itself excluded.
pub(crate) fn n_ring(idx: usize, neighborhoods: &[Vec<usize>], ring_nb: usize) -> Vec<usize> {
    let mut processed = vec![false; neighborhoods.len()];
    let mut ring = vec![];
    if idx >= neighborhoods.len() {
        return ring;
    }
    processed[idx] = true;
    let mut active: VecDeque<(usize, usize)> = VecDeque::new();
    for n in neighborhoods[idx].iter() {
        if !processed[*n] {
            processed[*n] = true;
            active.push_back((*n, 1));
        }
    }
    while let Some((cur, depth)) = active.pop_front() {
        ring.push(cur);
        if depth + 1 > ring_nb {
            continue;
        }
        for n in neighborhoods[cur].iter() {
            if !processed[*n] {
                processed[*n] = true;
                active.push_back((*n, depth + 1));
            }
        }
    }
    ring
}

impl StrokeGroup {
    /// Element placements in the order synthesis should visit them.
    pub(crate) fn element_order(&self, positions: &[Coord<f64>], neighborhoods: &[Vec<usize>]) -> Vec<usize> {
        match self.synth_method {
            SynthMethod::Parallel => (0..positions.len()).collect(),
            SynthMethod::Causal => {
                let middle = coord! {x: 0.5, y: 0.5};
                let start = positions
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.distance(&middle).total_cmp(&b.1.distance(&middle)))
                    .map(|(i, _)| i);
                match start {
                    Some(start) => breadth_first_order(neighborhoods, start),
                    None => vec![],
                }
            }
        }
    }

    /// Uniform pick among elements, avoiding `previous` when there's a choice.
    pub(crate) fn pick_element(&mut self, previous: Option<usize>) -> usize {
        let n = self.elements.len();
        match previous {
            Some(prev) if n > 1 && prev < n => {
                let r = self.rng.gen_range(0..n - 1);
                if r >= prev {
                    r + 1
                } else {
                    r
                }
            }
            _ => self.rng.gen_range(0..n.max(1)),
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::gesture::test::line;

    /// Vertical hatch lines, `count` of them, `spacing` apart.
    pub fn hatch_group(count: usize, spacing: f64, length: f64) -> StrokeGroup {
        let xs: Vec<f64> = (0..count).map(|i| i as f64 * spacing).collect();
        hatch_group_at(&xs, length)
    }

    /// Vertical hatch lines at the given x positions.
    pub fn hatch_group_at(xs: &[f64], length: f64) -> StrokeGroup {
        let mut group = StrokeGroup::new(GroupType::Hatching, ReferenceFrame::Axis).with_seed(7);
        for x in xs.iter().copied() {
            let stroke = line(coord! {x: x, y: 0.0}, coord! {x: x, y: length}, 5);
            group.add_path(StrokePaths::new(10.0, 1.0, ElementType::Line, false, stroke));
        }
        group.analyze(false);
        group
    }

    /// `count` spokes pointing away from (100, 100), running from radius
    /// `inner` to `outer`.
    pub fn radial_group(count: usize, inner: f64, outer: f64) -> StrokeGroup {
        let mut group = StrokeGroup::new(GroupType::Hatching, ReferenceFrame::Angular).with_seed(13);
        let center = coord! {x: 100.0, y: 100.0};
        for i in 0..count {
            let a = 2.0 * PI * i as f64 / count as f64;
            let dir = coord! {x: a.cos(), y: a.sin()};
            let stroke = line(center + dir.scaled(inner), center + dir.scaled(outer), 5);
            group.add_path(StrokePaths::new(10.0, 1.0, ElementType::Line, false, stroke));
        }
        group.analyze(false);
        group
    }

    /// Dots on a jittered grid.
    pub fn stipple_group(side: usize, spacing: f64) -> StrokeGroup {
        let mut group = StrokeGroup::new(GroupType::Stippling, ReferenceFrame::Cartesian).with_seed(11);
        for i in 0..side {
            for j in 0..side {
                let c = coord! {x: i as f64 * spacing + (j % 2) as f64 * 3.0, y: j as f64 * spacing};
                let stroke = GestureStroke::from_points(vec![c, c + coord! {x: 1.0, y: 1.0}]);
                group.add_path(StrokePaths::new(10.0, 1.0, ElementType::Point, false, stroke));
            }
        }
        group.analyze(false);
        group
    }

    #[test]
    fn test_hatch_analysis() {
        let group = hatch_group(3, 20.0, 40.0);
        assert_eq!(group.nb_elements(), 3);
        assert!((group.length().avg - 40.0).abs() < 1e-6);
        assert!(group.orientation().avg < 1e-6);
        assert!((group.angle().avg - PI / 2.0).abs() < 1e-6);
        assert_eq!(group.element_neighbors()[0], vec![1]);
        assert_eq!(group.element_neighbors()[1], vec![0, 2]);
        assert_eq!(group.element_pairs().len(), 3);
        assert!((group.pair_statistics().proximity.avg - 20.0).abs() < 1e-6);
        assert!((group.relative_position()[1].avg - 20.0).abs() < 1e-6);
        assert!((group.relative_length()[1].avg - 1.0).abs() < 1e-9);
        assert!(group.pair_statistics().parallelism.avg.abs() < 1e-9);
    }

    #[test]
    fn test_angular_analysis() {
        let group = radial_group(8, 20.0, 50.0);
        assert_eq!(group.nb_elements(), 8);
        println!("orientation {:?}", group.orientation());
        assert!(group.orientation().min > 1.0 - 1e-6);
        assert!(group.offset().avg.abs() < 1e-9);
        // Delaunay, not the 1-D chain: spoke 0 sits between 1 and 7.
        let around = &group.element_neighbors()[0];
        assert!(around.contains(&1) && around.contains(&7), "{:?}", around);

        // Seen from a center far to the left, the vertical spokes turn across.
        let mut moved = radial_group(8, 20.0, 50.0);
        moved.set_bbox(Rect::new(coord! {x: -900.0, y: 0.0}, coord! {x: -700.0, y: 200.0}));
        assert!(moved.orientation().min < 0.1);
    }

    #[test]
    fn test_offset_follows_pattern_bbox() {
        let mut group = hatch_group(3, 20.0, 40.0);
        assert!(group.offset().avg.abs() < 1.0);
        let own = group.strokes_bbox().unwrap();
        group.set_bbox(Rect::new(own.min(), own.min() + coord! {x: 100.0, y: 200.0}));
        println!("offset {:?}", group.offset());
        // Centers at y = 20, pattern center at y = 100 (give or take the pen width).
        assert!((group.offset().avg + 80.0).abs() < 2.0);
        assert!(group.offset().std < 1e-9);
    }

    #[test]
    fn test_statistics_invariants() {
        let group = stipple_group(4, 20.0);
        for p in [group.length(), group.width(), group.orientation(), group.angle()] {
            assert!(p.min <= p.avg + 1e-12 && p.avg <= p.max + 1e-12);
            assert!(p.std >= 0.0);
        }
        for p in group.relative_position() {
            assert!(p.min <= p.avg + 1e-12 && p.avg <= p.max + 1e-12);
        }
    }

    #[test]
    fn test_single_element_statistics() {
        let group = hatch_group(1, 20.0, 40.0);
        assert_eq!(group.nb_elements(), 1);
        assert_eq!(group.element_neighbors(), &[Vec::<usize>::new()]);
        assert!(group.relative_position()[0].measures.is_empty());
        assert_eq!(group.relative_position()[0].avg, 0.0);
        assert_eq!(group.relative_position()[0].std, 0.0);
        assert!(group.element_pairs().is_empty());
        assert!(!group.pair_statistics().proximity.avg.is_nan());
    }

    #[test]
    fn test_neighbor_graph_symmetry() {
        let group = stipple_group(5, 20.0);
        let neighbors = group.element_neighbors();
        assert_eq!(neighbors.len(), group.nb_elements());
        for (a, ns) in neighbors.iter().enumerate() {
            assert!(!ns.is_empty());
            for b in ns {
                assert_ne!(a, *b);
                assert!(neighbors[*b].contains(&a), "{} lists {} but not the reverse", a, b);
            }
        }
    }

    #[test]
    fn test_two_elements_connect() {
        let nodes = vec![coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 5.0}];
        assert_eq!(neighbors_2d(&nodes), vec![vec![1], vec![0]]);
        let collinear = vec![coord! {x: 10.0, y: 0.0}, coord! {x: 0.0, y: 0.0}, coord! {x: 5.0, y: 0.0}];
        assert_eq!(neighbors_2d(&collinear), vec![vec![2], vec![2], vec![0, 1]]);
    }

    #[test]
    fn test_other_shapes_are_not_elements() {
        let mut group = StrokeGroup::new(GroupType::Hatching, ReferenceFrame::Axis);
        let wiggle = GestureStroke::from_points(vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 10.0, y: 30.0},
            coord! {x: 20.0, y: -30.0},
            coord! {x: 30.0, y: 0.0},
        ]);
        group.add_path(StrokePaths::new(5.0, 1.0, ElementType::Line, false, wiggle));
        group.add_path(StrokePaths::new(
            5.0,
            1.0,
            ElementType::Line,
            false,
            line(coord! {x: 0.0, y: 0.0}, coord! {x: 0.0, y: 30.0}, 4),
        ));
        group.analyze(false);
        assert_eq!(group.nb_paths(), 2);
        assert_eq!(group.elements(), &[1]);
    }

    #[test]
    fn test_breadth_first_reaches_everything() {
        let neighborhoods = vec![vec![1], vec![0, 2], vec![1], vec![4], vec![3]];
        assert_eq!(breadth_first_order(&neighborhoods, 1), vec![1, 0, 2, 3, 4]);
    }

    #[test]
    fn test_n_ring() {
        let chain: Vec<Vec<usize>> = (0..6)
            .map(|i: usize| {
                let mut n = vec![];
                if i > 0 {
                    n.push(i - 1);
                }
                if i < 5 {
                    n.push(i + 1);
                }
                n
            })
            .collect();
        assert_eq!(n_ring(2, &chain, 1), vec![1, 3]);
        assert_eq!(n_ring(2, &chain, 2), vec![1, 3, 0, 4]);
    }

    #[test]
    fn test_pick_element_avoids_previous() {
        let mut group = hatch_group(3, 20.0, 40.0);
        for _ in 0..50 {
            assert_ne!(group.pick_element(Some(1)), 1);
        }
        let mut lone = hatch_group(1, 20.0, 40.0);
        assert_eq!(lone.pick_element(Some(0)), 0);
    }
}
