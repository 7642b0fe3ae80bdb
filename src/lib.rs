//! Example based synthesis of hand-drawn stroke patterns
//!
//! Give it a few example strokes (a patch of stippling, some hatching, a
//! handful of free-form marks) and it learns what the elements look like
//! and how they sit relative to each other, then fills a target cell with
//! more of the same. The output is plain polylines with pressure and
//! opacity, ready to go to the pen plotter via SVG.
//!
//! The pipeline, roughly:
//!
//! 1. [`gesture::GestureStroke`]s get fitted to elements ([`stroke_paths::StrokePaths`]):
//!    points, lines or boxes, merging pieces that belong together.
//! 2. A [`group::StrokeGroup`] measures its elements and their neighbor graph.
//! 3. A [`pattern::StrokePattern`] holds the groups and drives synthesis into
//!    any [`cell::GestureCell`].
//!
//! *CAUTION: Still rough around the edges. Seed your patterns if you want to
//! see the same drawing twice.*

/// Extensions/Traits for geo_types geometry, plus Delaunay/Voronoi helpers
/// and SVG export.
pub mod geo_types;

/// Error kinds for pattern building and synthesis.
pub mod errors;

/// Captured pen strokes.
pub mod gesture;

/// Running statistics and normal sampling.
pub mod stats;

/// Strokes fitted to element shapes.
pub mod stroke_paths;

/// Target regions for synthesis.
pub mod cell;

/// Groups of elements: analysis and the synthesis algorithms.
pub mod group;

/// The whole reference pattern, its parameters and persistence.
pub mod pattern;

/// Make your life easy! Just import prelude::* and get going.
pub mod prelude {
    pub use crate::cell::{BBoxCell, CarriersCell, GestureCell, PathCell, RectCell, SynthesizedStroke};
    pub use crate::errors::PatternError;
    pub use crate::geo_types::svg::{Arrangement, ToSvg};
    pub use crate::geo_types::{PointDistance, VectorOps};
    pub use crate::gesture::GestureStroke;
    pub use crate::group::{Behavior, Distribution, GroupType, ReferenceFrame, StrokeGroup, SynthMethod};
    pub use crate::pattern::{PatternParams, StrokePattern, SynthesisMode};
    pub use crate::stroke_paths::{ElementType, StrokePaths};
}
