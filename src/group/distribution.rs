use geo_types::{coord, Coord};
use rand::Rng;

use super::{chain_neighbors, neighbors_1d, Distribution, ReferenceFrame, StrokeGroup, MAX_ANGLE, MAX_COUNT};
use crate::geo_types::voronoi::{relax_unit_square, DelaunayGraph};
use crate::geo_types::PointDistance;
use crate::stats::{sample, INFINITY_SENTINEL};

/// Movement below which 2D relaxation is considered settled.
const SETTLED: f64 = 1e-9;

impl StrokeGroup {
    /// Initial element positions in cell UV for a cell of `scale` pattern
    /// pixels per UV unit.
    pub fn distribute(&mut self, scale: f64) -> Vec<Coord<f64>> {
        let stratified = self.distribution == Distribution::Stratified
            && self.relative_position.iter().any(|p| !p.is_empty());
        match (self.reference_frame, stratified) {
            (ReferenceFrame::Axis, false) => self.lloyd_1d(scale),
            (ReferenceFrame::Axis, true) => self.stratified_1d(scale),
            (_, false) => self.lloyd_2d(scale),
            (_, true) => self.stratified_2d(scale),
        }
    }

    fn lloyd_1d(&mut self, scale: f64) -> Vec<Coord<f64>> {
        let n = self.elements.len();
        let width = self.reference_bbox().map(|b| b.width()).unwrap_or(0.0);
        let nb = if width > 0.0 { (n as f64 * scale / width) as usize } else { n };
        let offset_std = self.offset.std / scale;

        let mut u: Vec<f64> = (0..nb).map(|_| self.rng.gen::<f64>()).collect();
        let v: Vec<f64> = (0..nb).map(|_| sample(&mut self.rng, 0.5, offset_std)).collect();
        u.sort_by(|a, b| a.total_cmp(b));
        relax_1d(&mut u, MAX_COUNT);
        u.into_iter().zip(v).map(|(x, y)| coord! {x: x, y: y}).collect()
    }

    fn lloyd_2d(&mut self, scale: f64) -> Vec<Coord<f64>> {
        let n = self.elements.len();
        let area = self.reference_bbox().map(|b| b.width() * b.height()).unwrap_or(0.0);
        let nb = if area > 0.0 { (n as f64 * scale * scale / area) as usize } else { n };

        let mut nodes: Vec<Coord<f64>> = (0..nb)
            .map(|_| coord! {x: self.rng.gen::<f64>(), y: self.rng.gen::<f64>()})
            .collect();
        for _ in 0..MAX_COUNT {
            let relaxed = relax_unit_square(&nodes);
            let moved = relaxed.iter().zip(nodes.iter()).map(|(a, b)| a.distance(b)).fold(0.0, f64::max);
            nodes = relaxed;
            if moved < SETTLED {
                break;
            }
        }
        nodes
    }

    /// Smallest, largest and mean neighbor distance over the elements that
    /// have neighbors at all.
    fn proximity_range(&self) -> (f64, f64, f64) {
        let mut min_prox = INFINITY_SENTINEL;
        let mut max_prox = 0.0f64;
        let (mut sum, mut count) = (0.0, 0usize);
        for p in self.relative_position.iter().filter(|p| !p.is_empty()) {
            min_prox = min_prox.min(p.min);
            max_prox = max_prox.max(p.max);
            sum += p.avg;
            count += 1;
        }
        let avg = if count > 0 { sum / count as f64 } else { 0.0 };
        (min_prox, max_prox, avg)
    }

    /// Grid cell size in UV, count of cells along a side and the shift that
    /// centers the grid.
    fn grid(prox_avg: f64, scale: f64) -> Option<(f64, usize, f64)> {
        let size = prox_avg / scale;
        if !(size > 0.0) || !size.is_finite() {
            return None;
        }
        let nb_voxels = 1.0 / size;
        let offset = (nb_voxels.ceil() - nb_voxels) * size;
        Some((size, nb_voxels.ceil() as usize, offset))
    }

    fn stratified_1d(&mut self, scale: f64) -> Vec<Coord<f64>> {
        let (min_prox, max_prox, prox_avg) = self.proximity_range();
        let (size, count, offset) = match StrokeGroup::grid(prox_avg, scale) {
            Some(grid) => grid,
            None => return self.lloyd_1d(scale),
        };
        let voxel_std = (max_prox - prox_avg) * 0.5 / (2.0 * scale);
        let offset_std = self.offset.max.abs() / (2.0 * scale);
        let candidates: Vec<Option<Coord<f64>>> = (0..count)
            .map(|i| {
                let x = sample(&mut self.rng, (i as f64 + 0.5) * size - offset, voxel_std);
                let y = sample(&mut self.rng, 0.5, offset_std);
                Some(coord! {x: x, y: y})
            })
            .collect();
        let neighborhood = |i: usize| -> Vec<usize> {
            (i.saturating_sub(1)..=(i + 1).min(count - 1)).filter(|k| *k != i).collect()
        };
        prune_candidates(candidates, min_prox / scale, neighborhood)
    }

    fn stratified_2d(&mut self, scale: f64) -> Vec<Coord<f64>> {
        let (min_prox, max_prox, prox_avg) = self.proximity_range();
        let (size, count, offset) = match StrokeGroup::grid(prox_avg, scale) {
            Some(grid) => grid,
            None => return self.lloyd_2d(scale),
        };
        let voxel_std = (max_prox - prox_avg) * 0.5 / (2.0 * scale);
        let mut candidates = vec![None; count * count];
        for i in 0..count {
            let x_pos = (i as f64 + 0.5) * size - offset;
            for j in 0..count {
                let y_pos = (j as f64 + 0.5) * size - offset;
                let x = sample(&mut self.rng, x_pos, voxel_std);
                let y = sample(&mut self.rng, y_pos, voxel_std);
                candidates[j * count + i] = Some(coord! {x: x, y: y});
            }
        }
        let neighborhood = |idx: usize| -> Vec<usize> {
            let (i, j) = (idx % count, idx / count);
            let mut out = vec![];
            for k in i.saturating_sub(1)..=(i + 1).min(count - 1) {
                for l in j.saturating_sub(1)..=(j + 1).min(count - 1) {
                    let n = l * count + k;
                    if n != idx {
                        out.push(n);
                    }
                }
            }
            out
        };
        prune_candidates(candidates, min_prox / scale, neighborhood)
    }

    /// Neighbor lists over synthesized positions. Axis groups use left and
    /// right neighbors; planar groups use the Delaunay graph without its
    /// sliver edges.
    pub fn synthesized_neighborhoods(&self, positions: &[Coord<f64>]) -> Vec<Vec<usize>> {
        match self.reference_frame {
            ReferenceFrame::Axis => neighbors_1d(positions),
            _ => match DelaunayGraph::build(positions) {
                Some(graph) => {
                    let mut neighborhoods = vec![vec![]; positions.len()];
                    for edge in graph.edges() {
                        if graph.degenerate_edge(edge, MAX_ANGLE) {
                            continue;
                        }
                        neighborhoods[edge.from].push(edge.to);
                        neighborhoods[edge.to].push(edge.from);
                    }
                    for n in neighborhoods.iter_mut() {
                        n.sort_unstable();
                        n.dedup();
                    }
                    neighborhoods
                }
                None => chain_neighbors(positions),
            },
        }
    }
}

/// Lloyd relaxation on the unit interval: every node moves to the middle of
/// its Voronoi interval. `nodes` must be sorted.
pub fn relax_1d(nodes: &mut [f64], iterations: usize) {
    let n = nodes.len();
    if n == 1 {
        nodes[0] = 0.5;
    }
    if n < 2 {
        return;
    }
    for _ in 0..iterations {
        let bounds: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let low = if i == 0 { 0.0 } else { (nodes[i - 1] + nodes[i]) * 0.5 };
                let high = if i == n - 1 { 1.0 } else { (nodes[i] + nodes[i + 1]) * 0.5 };
                (low, high)
            })
            .collect();
        for (node, (low, high)) in nodes.iter_mut().zip(bounds) {
            *node = (low + high) * 0.5;
        }
    }
}

/// Repeatedly drop the candidate whose close neighbors (within `min_dist`,
/// among its grid neighborhood) pull hardest on it, until no candidate has
/// a neighbor that close.
fn prune_candidates<F>(mut candidates: Vec<Option<Coord<f64>>>, min_dist: f64, neighborhood: F) -> Vec<Coord<f64>>
where
    F: Fn(usize) -> Vec<usize>,
{
    loop {
        let mut removed: Option<(usize, f64)> = None;
        for idx in 0..candidates.len() {
            let cur = match candidates[idx] {
                Some(c) => c,
                None => continue,
            };
            let close: Vec<Coord<f64>> = neighborhood(idx)
                .into_iter()
                .filter_map(|n| candidates[n])
                .filter(|n| n.distance(&cur) <= min_dist)
                .collect();
            if close.is_empty() {
                continue;
            }
            let sum = close.iter().fold(coord! {x: 0.0, y: 0.0}, |acc, c| acc + *c);
            let bary = coord! {x: sum.x / close.len() as f64, y: sum.y / close.len() as f64};
            let pull = bary.distance(&cur);
            if removed.map(|(_, best)| pull > best).unwrap_or(true) {
                removed = Some((idx, pull));
            }
        }
        match removed {
            Some((idx, _)) => candidates[idx] = None,
            None => break,
        }
    }
    candidates.into_iter().flatten().collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::group::test::{hatch_group, hatch_group_at, stipple_group};
    use crate::group::SynthMethod;

    #[test]
    fn test_relax_1d_spreads_evenly() {
        let mut nodes = vec![0.1, 0.12, 0.15, 0.9];
        relax_1d(&mut nodes, MAX_COUNT);
        println!("Relaxed: {:?}", nodes);
        for (i, n) in nodes.iter().enumerate() {
            assert!((n - (i as f64 + 0.5) / 4.0).abs() < 1e-3);
        }
        let mut lone = vec![0.9];
        relax_1d(&mut lone, 10);
        assert_eq!(lone, vec![0.5]);
    }

    #[test]
    fn test_lloyd_1d_count() {
        let mut group = hatch_group(3, 20.0, 40.0);
        let positions = group.distribute(80.0);
        assert_eq!(positions.len(), 6);
        for p in positions.iter() {
            assert!(p.x >= 0.0 && p.x <= 1.0);
            // No vertical spread in the reference, so none here.
            assert!((p.y - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lloyd_2d_inside_unit_square() {
        let mut group = stipple_group(4, 20.0);
        let bbox = group.strokes_bbox().unwrap();
        let scale = bbox.width().max(bbox.height());
        let positions = group.distribute(scale * 1.5);
        assert!(!positions.is_empty());
        for p in positions.iter() {
            assert!(p.x >= 0.0 && p.x <= 1.0 && p.y >= 0.0 && p.y <= 1.0);
        }
    }

    #[test]
    fn test_stratified_respects_min_proximity() {
        let mut group = stipple_group(4, 20.0);
        group.set_distribution(Distribution::Stratified);
        let scale = 200.0;
        let positions = group.distribute(scale);
        let (min_prox, _, _) = group.proximity_range();
        println!("{} stratified positions, min proximity {}", positions.len(), min_prox);
        assert!(positions.len() > 4);
        for (i, a) in positions.iter().enumerate() {
            for b in positions.iter().skip(i + 1) {
                assert!(a.distance(b) > min_prox / scale);
            }
        }
    }

    #[test]
    fn test_stratified_1d_grid() {
        let mut group = hatch_group_at(&[0.0, 20.0, 50.0], 40.0);
        group.set_distribution(Distribution::Stratified);
        let mut positions = group.distribute(100.0);
        // Four grid cells of 0.25, jittered and pruned below 0.2 apart.
        assert!(positions.len() >= 3 && positions.len() <= 4);
        positions.sort_by(|a, b| a.x.total_cmp(&b.x));
        for w in positions.windows(2) {
            assert!(w[1].x - w[0].x > 0.2);
        }
        for p in positions.iter() {
            assert!((p.y - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_synthesized_neighborhoods_and_order() {
        let group = stipple_group(3, 20.0);
        let positions: Vec<Coord<f64>> = (0..3)
            .flat_map(|i| (0..3).map(move |j| coord! {x: 0.2 + 0.3 * i as f64 + 0.01 * j as f64, y: 0.2 + 0.3 * j as f64}))
            .collect();
        let neighborhoods = group.synthesized_neighborhoods(&positions);
        for (a, ns) in neighborhoods.iter().enumerate() {
            for b in ns {
                assert!(neighborhoods[*b].contains(&a));
            }
        }
        let order = group.element_order(&positions, &neighborhoods);
        assert_eq!(order.len(), positions.len());
        // The middle node comes first.
        assert_eq!(order[0], 4);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..9).collect::<Vec<usize>>());

        let mut parallel = group.clone();
        parallel.set_synth_method(SynthMethod::Parallel);
        assert_eq!(parallel.element_order(&positions, &neighborhoods), (0..9).collect::<Vec<usize>>());
    }
}
