use std::f64::consts::PI;

use geo_types::{coord, Coord};
use log::debug;
use rand::Rng;

use super::one_ring::{close_value, unwrap_angle};
use super::{folded_angle, n_ring, relative_ratio, ElementPlacement, ReferenceFrame, StrokeGroup};
use crate::cell::GestureCell;
use crate::errors::PatternError;
use crate::geo_types::{rect_center, PointDistance, VectorOps};
use crate::stats::INFINITY_SENTINEL;
use crate::stroke_paths::StrokePaths;

pub const PROX_THRESHOLD_1D: f64 = 0.1;
pub const PAR_THRESHOLD_1D: f64 = 0.1 * PI / 2.0;
pub const OV_THRESHOLD_1D: f64 = 1.5;
pub const PROX_THRESHOLD_2D: f64 = 0.2;
pub const PAR_THRESHOLD_2D: f64 = 0.2 * PI / 2.0;
pub const OV_THRESHOLD_2D: f64 = 2.0;
/// Candidates whose stroke style differs more than this are never used.
pub const COLOR_THRESHOLD: f64 = 7.0;

/// Acceptance thresholds for neighborhood matching. Proximity is relative
/// to the mean element length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub proximity: f64,
    pub parallelism: f64,
    pub overlapping: f64,
}

impl MatchThresholds {
    pub fn for_frame(frame: ReferenceFrame) -> MatchThresholds {
        match frame {
            ReferenceFrame::Axis => MatchThresholds {
                proximity: PROX_THRESHOLD_1D,
                parallelism: PAR_THRESHOLD_1D,
                overlapping: OV_THRESHOLD_1D,
            },
            _ => MatchThresholds {
                proximity: PROX_THRESHOLD_2D,
                parallelism: PAR_THRESHOLD_2D,
                overlapping: OV_THRESHOLD_2D,
            },
        }
    }
}

/// Element differences between a synthesized neighborhood and a reference
/// one, averaged over the matched neighbors. Superimposition stays a sum.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NeighborhoodScore {
    proximity: f64,
    parallelism: f64,
    overlapping: f64,
    superimposition: f64,
    color: f64,
}

impl NeighborhoodScore {
    /// Color gates everything. Then either the shapes line up (parallel,
    /// overlapping, lengths within the raw proximity threshold) or the
    /// neighborhood is close relative to the mean element length.
    fn accepts(&self, thresholds: MatchThresholds, mean_length: f64) -> bool {
        if self.color > COLOR_THRESHOLD {
            return false;
        }
        let close_shapes = self.parallelism <= thresholds.parallelism
            && self.overlapping <= thresholds.overlapping
            && self.superimposition <= thresholds.proximity;
        close_shapes || self.proximity <= thresholds.proximity * mean_length
    }

    fn unmatched() -> NeighborhoodScore {
        NeighborhoodScore {
            proximity: INFINITY_SENTINEL,
            parallelism: INFINITY_SENTINEL,
            overlapping: INFINITY_SENTINEL,
            superimposition: INFINITY_SENTINEL,
            color: INFINITY_SENTINEL,
        }
    }
}

impl StrokeGroup {
    /// Grow the pattern one element at a time, each copying the reference
    /// element whose n-ring neighborhood best matches what's already placed.
    pub fn synthesize_efros(&mut self, cell: &mut dyn GestureCell) -> Result<(), PatternError> {
        self.ensure_synthesizable(cell)?;
        let scale = cell.scale();
        let positions = self.distribute(scale);
        let neighborhoods = self.synthesized_neighborhoods(&positions);
        let order = self.element_order(&positions, &neighborhoods);

        self.targets = positions.iter().map(|p| ElementPlacement::new(0, *p)).collect();
        self.corrected = self.targets.clone();
        let mut assigned: Vec<Option<usize>> = vec![None; positions.len()];
        let thresholds = MatchThresholds::for_frame(self.reference_frame);
        for (step, idx) in order.iter().enumerate() {
            let reference = if step == 0 {
                self.reference_center()
            } else {
                self.find_best_match(*idx, &neighborhoods, &assigned, scale, thresholds)
            };
            self.synthesize_element(reference, *idx, &neighborhoods, scale);
            assigned[*idx] = Some(reference);
        }

        self.render_synthesized_strokes(cell);
        Ok(())
    }

    /// The element closest to the middle of the pattern.
    fn reference_center(&self) -> usize {
        let middle = self.reference_bbox().map(|b| rect_center(&b)).unwrap_or(coord! {x: 0.0, y: 0.0});
        (0..self.elements.len())
            .min_by(|a, b| {
                let da = self.element(*a).center().distance(&middle);
                let db = self.element(*b).center().distance(&middle);
                da.total_cmp(&db)
            })
            .unwrap_or(0)
    }

    /// Place `reference` at position `idx`. The target keeps the reference
    /// as is; the corrected placement sits where the reference sits relative
    /// to its neighbors, with length, width and angle nudged to a
    /// neighboring reference value.
    pub fn synthesize_element(&mut self, reference: usize, idx: usize, neighborhoods: &[Vec<usize>], scale: f64) {
        let path = self.element(reference);
        let (ref_center, ref_length, ref_width, ref_angle) =
            (path.center(), path.axis_a().length(), path.axis_b().length(), path.main_angle());
        let position = self.targets[idx].position;
        self.targets[idx] = ElementPlacement {
            element: reference,
            position,
            angle: ref_angle,
            scale: coord! {x: 1.0, y: 1.0},
        };

        let ref_neighbors = &self.element_neighbors[reference];
        let target_neighbors = &neighborhoods[idx];
        let corrected_position = if ref_neighbors.len() >= 2 && target_neighbors.len() >= 2 {
            let ref_mean = ref_neighbors
                .iter()
                .fold(coord! {x: 0.0, y: 0.0}, |acc, n| acc + self.element(*n).center())
                .scaled(1.0 / ref_neighbors.len() as f64);
            let target_mean = target_neighbors
                .iter()
                .fold(coord! {x: 0.0, y: 0.0}, |acc, n| acc + self.targets[*n].position)
                .scaled(1.0 / target_neighbors.len() as f64);
            target_mean + (ref_center - ref_mean).scaled(1.0 / scale)
        } else {
            position
        };

        let close_length = close_value(&mut self.rng, ref_length, &self.length.sorted(), false);
        let close_width = close_value(&mut self.rng, ref_width, &self.width.sorted(), false);
        let close_angle = close_value(&mut self.rng, ref_angle, &self.angle.sorted(), true);
        let length_ratio = if close_length < 2.0 || ref_length < 2.0 {
            1.0
        } else {
            close_length / ref_length
        };
        self.corrected[idx] = ElementPlacement {
            element: reference,
            position: corrected_position,
            angle: unwrap_angle(ref_angle, close_angle),
            scale: coord! {x: length_ratio, y: relative_ratio(close_width, ref_width)},
        };
    }

    /// Pick the reference element for position `idx` by comparing its
    /// n-ring with every reference element's n-ring. Only neighbors that
    /// already hold an element count.
    pub fn find_best_match(
        &mut self,
        idx: usize,
        neighborhoods: &[Vec<usize>],
        assigned: &[Option<usize>],
        scale: f64,
        thresholds: MatchThresholds,
    ) -> usize {
        let nb_elements = self.elements.len();
        let target_ring = n_ring(idx, neighborhoods, self.ring_nb);
        let origin = self.targets[idx].position;
        let target_pos: Vec<Coord<f64>> = target_ring
            .iter()
            .map(|t| (self.targets[*t].position - origin).scaled(scale))
            .collect();
        let mean_length = (0..nb_elements).map(|i| self.element(i).axis_a().length()).sum::<f64>() / nb_elements as f64;

        let scores: Vec<NeighborhoodScore> = (0..nb_elements)
            .map(|r| {
                let ref_ring = n_ring(r, &self.element_neighbors, self.ring_nb);
                let ref_origin = self.element(r).center();
                let ref_pos: Vec<Coord<f64>> = ref_ring.iter().map(|n| self.element(*n).center() - ref_origin).collect();
                let pairs: Vec<(usize, usize)> = match_neighbors(&ref_pos, &target_pos)
                    .into_iter()
                    .map(|(ri, ti)| (ref_ring[ri], target_ring[ti]))
                    .collect();
                self.neighborhood_score(&pairs, assigned)
            })
            .collect();

        let kept: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.accepts(thresholds, mean_length))
            .map(|(i, _)| i)
            .collect();
        debug!("position {}: {} of {} reference elements match", idx, kept.len(), nb_elements);
        if kept.is_empty() {
            let nearest = scores
                .iter()
                .enumerate()
                .filter(|(_, s)| s.proximity < INFINITY_SENTINEL)
                .min_by(|a, b| a.1.proximity.total_cmp(&b.1.proximity))
                .map(|(i, _)| i);
            return match nearest {
                Some(i) => i,
                None => self.rng.gen_range(0..nb_elements),
            };
        }
        kept[self.rng.gen_range(0..kept.len())]
    }

    fn neighborhood_score(&self, pairs: &[(usize, usize)], assigned: &[Option<usize>]) -> NeighborhoodScore {
        let placed: Vec<(usize, usize)> = pairs.iter().filter_map(|(r, t)| assigned[*t].map(|e| (*r, e))).collect();
        if placed.is_empty() {
            return NeighborhoodScore::unmatched();
        }
        let n = placed.len() as f64;
        let mut score = NeighborhoodScore {
            proximity: 0.0,
            parallelism: 0.0,
            overlapping: 0.0,
            superimposition: 0.0,
            color: 0.0,
        };
        for (r, e) in placed {
            let (ref_path, synth_path) = (self.element(r), self.element(e));
            score.proximity += shape_proximity(ref_path, synth_path);
            // Folded, so strokes drawn in opposite directions count as parallel.
            score.parallelism += (folded_angle(ref_path.axis_a()) - folded_angle(synth_path.axis_a())).abs();
            score.overlapping += length_ratio(ref_path, synth_path);
            score.superimposition += 0.5 * (ref_path.axis_a().length() - synth_path.axis_a().length()).abs();
            if self.style_analyzed {
                score.color += 10.0 * (ref_path.mean_pressure() - synth_path.mean_pressure()).abs();
            }
        }
        NeighborhoodScore {
            proximity: score.proximity / n,
            parallelism: score.parallelism / n,
            overlapping: score.overlapping / n,
            superimposition: score.superimposition,
            color: score.color / n,
        }
    }
}

/// Pair neighbors of two neighborhoods. Each member of the smaller side
/// votes for its closest member of the larger side; each voted member
/// keeps its closest voter. Pairs come out as (reference, target) indices
/// into the two slices.
fn match_neighbors(reference: &[Coord<f64>], target: &[Coord<f64>]) -> Vec<(usize, usize)> {
    let reversed = reference.len() <= target.len();
    let (src, dest) = if reversed { (reference, target) } else { (target, reference) };
    let mut best: Vec<Option<(usize, f64)>> = vec![None; dest.len()];
    for (s, sp) in src.iter().enumerate() {
        let closest = dest
            .iter()
            .enumerate()
            .map(|(d, dp)| (d, sp.distance(dp)))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((d, dist)) = closest {
            if best[d].map(|(_, bd)| dist < bd).unwrap_or(true) {
                best[d] = Some((s, dist));
            }
        }
    }
    best.iter()
        .enumerate()
        .filter_map(|(d, b)| b.map(|(s, _)| if reversed { (s, d) } else { (d, s) }))
        .collect()
}

/// Shape difference of two elements laid over each other at the origin.
fn shape_proximity(a: &StrokePaths, b: &StrokePaths) -> f64 {
    let origin = coord! {x: 0.0, y: 0.0};
    StrokePaths::hausdorff_distance(origin, a.axis_a(), a.axis_b(), origin, b.axis_a(), b.axis_b())
        .max(StrokePaths::hausdorff_distance(origin, b.axis_a(), b.axis_b(), origin, a.axis_a(), a.axis_b()))
}

/// Longer length over shorter length, at least 1.
fn length_ratio(a: &StrokePaths, b: &StrokePaths) -> f64 {
    let (la, lb) = (a.axis_a().length(), b.axis_a().length());
    let (long, short) = if la > lb { (la, lb) } else { (lb, la) };
    if short <= f64::EPSILON {
        if long <= f64::EPSILON {
            1.0
        } else {
            INFINITY_SENTINEL
        }
    } else {
        long / short
    }
}
