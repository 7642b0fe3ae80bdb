use std::collections::BTreeSet;

use geo_types::{coord, Coord};
use voronoice::{BoundingBox, Point, Voronoi, VoronoiBuilder};

use crate::geo_types::{PointDistance, VectorOps};

/// Marker delaunator uses for a halfedge with no twin, ie: on the hull.
const NO_TWIN: usize = usize::MAX;

/// An edge of a Delaunay triangulation between two node indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaunayEdge {
    pub from: usize,
    pub to: usize,
    /// True for edges on the convex hull.
    pub border: bool,
}

/// Node adjacency taken from the Delaunay triangulation of a point set.
/// Node indices are the indices of the input slice.
#[derive(Debug, Clone, Default)]
pub struct DelaunayGraph {
    nodes: Vec<Coord<f64>>,
    edges: Vec<DelaunayEdge>,
    triangles: Vec<[usize; 3]>,
    adjacency: Vec<BTreeSet<usize>>,
}

fn to_site(c: &Coord<f64>) -> Point {
    Point { x: c.x, y: c.y }
}

fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

impl DelaunayGraph {
    /// Triangulate the nodes. Returns None when there is no triangulation to
    /// speak of (fewer than three nodes, or all of them collinear).
    pub fn build(nodes: &[Coord<f64>]) -> Option<DelaunayGraph> {
        if nodes.len() < 3 {
            return None;
        }
        let (mut min, mut max) = (nodes[0], nodes[0]);
        for n in nodes {
            min = coord! {x: min.x.min(n.x), y: min.y.min(n.y)};
            max = coord! {x: max.x.max(n.x), y: max.y.max(n.y)};
        }
        // Keep every site strictly inside the box so none gets dropped.
        let margin = 1.0 + 0.1 * (max.x - min.x).max(max.y - min.y);
        let center = (min + max).scaled(0.5);
        let voronoi = VoronoiBuilder::default()
            .set_sites(nodes.iter().map(to_site).collect())
            .set_bounding_box(BoundingBox::new(
                to_site(&center),
                max.x - min.x + 2.0 * margin,
                max.y - min.y + 2.0 * margin,
            ))
            .set_lloyd_relaxation_iterations(0)
            .build()?;
        let tri = voronoi.triangulation();
        if tri.triangles.is_empty() {
            return None;
        }

        let mut graph = DelaunayGraph {
            nodes: nodes.to_vec(),
            edges: vec![],
            triangles: tri.triangles.chunks(3).map(|t| [t[0], t[1], t[2]]).collect(),
            adjacency: vec![BTreeSet::new(); nodes.len()],
        };
        for e in 0..tri.triangles.len() {
            let twin = tri.halfedges[e];
            if twin == NO_TWIN || e < twin {
                let from = tri.triangles[e];
                let to = tri.triangles[next_halfedge(e)];
                if from >= nodes.len() || to >= nodes.len() || from == to {
                    continue;
                }
                graph.edges.push(DelaunayEdge { from, to, border: twin == NO_TWIN });
                graph.adjacency[from].insert(to);
                graph.adjacency[to].insert(from);
            }
        }
        Some(graph)
    }

    pub fn edges(&self) -> &[DelaunayEdge] {
        &self.edges
    }

    /// Sorted neighbor indices of a node.
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.adjacency
            .get(node)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// An edge is degenerate when every triangle it belongs to has an angle
    /// of at least `max_angle`: those are the long slivers along the hull
    /// that don't reflect any real neighborhood.
    pub fn degenerate_edge(&self, edge: &DelaunayEdge, max_angle: f64) -> bool {
        let mut found = false;
        for t in self.triangles.iter() {
            if !(t.contains(&edge.from) && t.contains(&edge.to)) {
                continue;
            }
            found = true;
            let mut sharp = true;
            for k in 0..3 {
                let a = self.nodes[t[k]];
                let b = self.nodes[t[(k + 1) % 3]];
                let c = self.nodes[t[(k + 2) % 3]];
                if (b - a).angle(&(c - a)) >= max_angle {
                    sharp = false;
                }
            }
            if sharp {
                return false;
            }
        }
        found
    }
}

fn polygon_centroid(vertices: &[Coord<f64>]) -> Option<Coord<f64>> {
    if vertices.len() < 3 {
        return None;
    }
    let mut area = 0.0;
    let mut centroid = coord! {x: 0.0, y: 0.0};
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let cross = a.cross(&b);
        area += cross;
        centroid = centroid + (a + b).scaled(cross);
    }
    if area.abs() < 1e-12 {
        return None;
    }
    Some(centroid.scaled(1.0 / (3.0 * area)))
}

fn unit_square_voronoi(nodes: &[Coord<f64>]) -> Option<Voronoi> {
    VoronoiBuilder::default()
        .set_sites(
            nodes
                .iter()
                .map(|c| Point { x: c.x.clamp(0.0, 1.0), y: c.y.clamp(0.0, 1.0) })
                .collect(),
        )
        .set_bounding_box(BoundingBox::new(Point { x: 0.5, y: 0.5 }, 1.0, 1.0))
        .set_lloyd_relaxation_iterations(0)
        .build()
}

/// One Lloyd step in the unit square: every node moves to the centroid of its
/// Voronoi cell, clipped to [0,1]x[0,1]. Nodes whose cell can't be computed
/// stay where they are.
pub fn relax_unit_square(nodes: &[Coord<f64>]) -> Vec<Coord<f64>> {
    if nodes.len() < 3 {
        return nodes.to_vec();
    }
    let voronoi = match unit_square_voronoi(nodes) {
        Some(v) => v,
        None => return nodes.to_vec(),
    };
    if voronoi.sites().len() != nodes.len() {
        return nodes.to_vec();
    }
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let cell: Vec<Coord<f64>> = voronoi
                .cell(i)
                .iter_vertices()
                .map(|p| coord! {x: p.x, y: p.y})
                .collect();
            match polygon_centroid(&cell) {
                Some(c) => coord! {x: c.x.clamp(0.0, 1.0), y: c.y.clamp(0.0, 1.0)},
                None => *node,
            }
        })
        .collect()
}

/// Distance from each node to its closest other node, None for lone nodes.
pub fn nearest_neighbors(nodes: &[Coord<f64>]) -> Vec<Option<(usize, f64)>> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, a)| {
            nodes
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, b)| (j, a.distance(b)))
                .min_by(|x, y| x.1.total_cmp(&y.1))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::prelude::*;

    fn grid() -> Vec<Coord<f64>> {
        let mut nodes = vec![];
        for i in 0..4 {
            for j in 0..4 {
                nodes.push(coord! {x: i as f64 * 10.0 + (j % 2) as f64, y: j as f64 * 10.0});
            }
        }
        nodes
    }

    #[test]
    fn test_delaunay_symmetric() {
        let graph = DelaunayGraph::build(&grid()).unwrap();
        println!("Edges: {}", graph.edges().len());
        assert!(!graph.edges().is_empty());
        for i in 0..16 {
            for j in graph.neighbors(i) {
                assert_ne!(i, j);
                assert!(graph.neighbors(j).contains(&i));
            }
        }
    }

    #[test]
    fn test_collinear_has_no_triangulation() {
        let nodes: Vec<Coord<f64>> = (0..5).map(|i| coord! {x: i as f64, y: 0.0}).collect();
        assert!(DelaunayGraph::build(&nodes).is_none());
        assert!(DelaunayGraph::build(&nodes[..2]).is_none());
    }

    #[test]
    fn test_degenerate_sliver() {
        // A very flat triangle: every edge sits in a triangle with a ~180 degree angle.
        let nodes = vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 10.0, y: 0.0},
            coord! {x: 5.0, y: 0.2},
        ];
        let graph = DelaunayGraph::build(&nodes).unwrap();
        let long = graph
            .edges()
            .iter()
            .find(|e| (e.from == 0 && e.to == 1) || (e.from == 1 && e.to == 0))
            .unwrap();
        assert!(graph.degenerate_edge(long, 2.0 * std::f64::consts::PI / 3.0));
    }

    #[test]
    fn test_relax_stays_in_unit_square() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut nodes: Vec<Coord<f64>> = (0..30)
            .map(|_| {
                let (x, y) = rng.gen::<(f64, f64)>();
                coord! {x: x, y: y}
            })
            .collect();
        for _ in 0..20 {
            nodes = relax_unit_square(&nodes);
            for n in nodes.iter() {
                assert!(n.x >= 0.0 && n.x <= 1.0 && n.y >= 0.0 && n.y <= 1.0);
            }
        }
        assert_eq!(nodes.len(), 30);
    }

    #[test]
    fn test_polygon_centroid() {
        let square = vec![
            coord! {x: 0.0, y: 0.0},
            coord! {x: 2.0, y: 0.0},
            coord! {x: 2.0, y: 2.0},
            coord! {x: 0.0, y: 2.0},
        ];
        let c = polygon_centroid(&square).unwrap();
        assert!((c.x - 1.0).abs() < 1e-9 && (c.y - 1.0).abs() < 1e-9);
    }
}
