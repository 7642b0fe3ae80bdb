use std::io::Read;
use std::path::PathBuf;

use geo_types::{Coord, Rect};
use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::cell::GestureCell;
use crate::errors::PatternError;
use crate::geo_types::rect_union;
use crate::gesture::GestureStroke;
use crate::group::{Behavior, Distribution, GroupType, ReferenceFrame, StrokeGroup};
use crate::stroke_paths::StrokePaths;

/// Pattern tuning parameters and their RON files.
pub mod params;

pub use params::PatternParams;

/// Which synthesis a pattern runs on its groups.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisMode {
    /// Nearest neighbor synthesis, cloning reference pairs.
    Clone,
    /// Nearest neighbor synthesis, copying reference measures one by one.
    Copy,
    /// Nearest neighbor synthesis, sampling the fitted distributions.
    Sample,
    /// Element synthesis followed by 1-ring correction.
    #[default]
    Mimic,
    /// Neighborhood matching, one element at a time.
    Efros,
}

impl SynthesisMode {
    pub fn behavior(&self) -> Behavior {
        match self {
            SynthesisMode::Copy => Behavior::Copy,
            SynthesisMode::Sample => Behavior::Sample,
            _ => Behavior::Clone,
        }
    }
}

/// What a saved pattern holds: the parameters and, per group, enough to
/// rebuild it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct PatternFile {
    params: PatternParams,
    groups: Vec<GroupRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct GroupRecord {
    group_type: GroupType,
    reference_frame: ReferenceFrame,
    strokes: Vec<GestureStroke>,
}

/// A reference pattern: groups of example strokes sharing a bounding box,
/// and the entry point for synthesizing more of them.
#[derive(Debug, Clone)]
pub struct StrokePattern {
    params: PatternParams,
    groups: Vec<StrokeGroup>,
    bbox: Option<Rect<f64>>,
    /// Whether every group has been told the pattern bbox.
    complete: bool,
    rng: SmallRng,
}

impl Default for StrokePattern {
    fn default() -> Self {
        StrokePattern::new(PatternParams::default())
    }
}

impl StrokePattern {
    pub fn new(params: PatternParams) -> StrokePattern {
        let rng = match params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        StrokePattern {
            params,
            groups: vec![],
            bbox: None,
            complete: false,
            rng,
        }
    }

    /// Restart the pattern's and every group's generator from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.params.seed = Some(seed);
        self.rng = SmallRng::seed_from_u64(seed);
        for group in self.groups.iter_mut() {
            group.reseed(self.rng.gen());
        }
    }

    pub fn params(&self) -> &PatternParams {
        &self.params
    }

    pub fn groups(&self) -> &[StrokeGroup] {
        &self.groups
    }

    pub fn nb_groups(&self) -> usize {
        self.groups.len()
    }

    /// Pixel bounds of every stroke added so far.
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.bbox
    }

    /// Fit, cluster and analyze a new group of example strokes.
    pub fn add_group(
        &mut self,
        group_type: GroupType,
        reference_frame: ReferenceFrame,
        strokes: Vec<GestureStroke>,
    ) -> Result<&StrokeGroup, PatternError> {
        if strokes.is_empty() {
            return Err(PatternError::EmptyGroup);
        }
        let mut group = StrokeGroup::new(group_type, reference_frame).with_seed(self.rng.gen());
        for path in self.extract_elements(group_type, strokes) {
            group.add_path(path);
        }
        group.analyze(self.params.analyze_style);

        if let Some(group_bbox) = group.strokes_bbox() {
            self.bbox = Some(match self.bbox {
                Some(bbox) => rect_union(&bbox, &group_bbox),
                None => group_bbox,
            });
        }
        self.complete = false;
        self.groups.push(group);
        debug!("Pattern now holds {} groups", self.groups.len());
        Ok(&self.groups[self.groups.len() - 1])
    }

    /// Fit every stroke on its own, then merge paths pairwise until a full
    /// pass merges nothing.
    fn extract_elements(&self, group_type: GroupType, strokes: Vec<GestureStroke>) -> Vec<StrokePaths> {
        let element_type = group_type.element_type();
        let mut paths: Vec<StrokePaths> = strokes
            .into_iter()
            .map(|s| {
                StrokePaths::new(
                    self.params.epsilon,
                    self.params.style_adjust,
                    element_type,
                    self.params.analyze_style,
                    s,
                )
            })
            .collect();

        let mut passes = 0;
        loop {
            let mut merged = false;
            let mut i = 0;
            while i < paths.len() {
                let mut j = i + 1;
                while j < paths.len() {
                    let candidate = paths.remove(j);
                    match merge_either_way(&mut paths[i], candidate) {
                        Ok(()) => merged = true,
                        Err(candidate) => {
                            paths.insert(j, candidate);
                            j += 1;
                        }
                    }
                }
                i += 1;
            }
            passes += 1;
            if !merged {
                break;
            }
        }
        debug!("Extracted {} elements in {} passes", paths.len(), passes);
        paths
    }

    /// Refit the most recently added group with the current parameters.
    fn refit_last(&mut self) {
        let group = match self.groups.pop() {
            Some(group) => group,
            None => return,
        };
        let (group_type, reference_frame) = (group.group_type(), group.reference_frame());
        let strokes = group.into_strokes();
        self.bbox = self
            .groups
            .iter()
            .filter_map(|g| g.strokes_bbox())
            .reduce(|a, b| rect_union(&a, &b));
        if let Err(err) = self.add_group(group_type, reference_frame, strokes) {
            warn!("Could not refit the last group: {}", err);
        }
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.params.epsilon = epsilon;
        self.refit_last();
    }

    pub fn set_style_adjust(&mut self, style_adjust: f64) {
        self.params.style_adjust = style_adjust;
        self.refit_last();
    }

    pub fn set_analyze_style(&mut self, analyze_style: bool) {
        self.params.analyze_style = analyze_style;
        self.refit_last();
    }

    pub fn set_ring_nb(&mut self, ring_nb: usize) {
        self.params.ring_nb = ring_nb;
    }

    pub fn set_correction_amount(&mut self, amount: f64) {
        self.params.correction_amount = amount.clamp(0.0, 1.0);
    }

    /// Fill `cell` with new strokes in the style of every group.
    ///
    /// The cell is cleared first. Groups too small to synthesize from are
    /// skipped.
    pub fn synthesize(
        &mut self,
        mode: SynthesisMode,
        distribution: Distribution,
        stretched: bool,
        cell: &mut dyn GestureCell,
    ) -> Result<(), PatternError> {
        let bbox = self
            .bbox
            .filter(|b| b.width() > 0.0 || b.height() > 0.0)
            .ok_or(PatternError::EmptyPattern)?;
        if !cell.valid() {
            return Err(PatternError::InvalidTargetCell);
        }
        if !self.complete {
            for group in self.groups.iter_mut() {
                group.set_bbox(bbox);
            }
            self.complete = true;
        }

        cell.clear();
        for (i, group) in self.groups.iter_mut().enumerate() {
            group.set_behavior(mode.behavior());
            group.set_distribution(distribution);
            group.enable_stretching(stretched);
            group.set_correction_amount(self.params.correction_amount);
            group.set_ring_nb(self.params.ring_nb);
            let result = match mode {
                SynthesisMode::Clone | SynthesisMode::Copy | SynthesisMode::Sample => group.synthesize_nn(cell),
                SynthesisMode::Mimic => group.synthesize_1ring(cell),
                SynthesisMode::Efros => group.synthesize_efros(cell),
            };
            match result {
                Ok(()) => {}
                Err(PatternError::EmptyGroup) => warn!("Skipping group {}, nothing to synthesize from", i),
                Err(err) => return Err(err),
            }
        }
        debug!("{:?} synthesis wrote {} strokes", mode, cell.nb_strokes());
        Ok(())
    }

    /// Redraw the last synthesis with the current correction amount.
    pub fn render_synthesized_strokes(&mut self, cell: &mut dyn GestureCell) {
        cell.clear();
        for group in self.groups.iter_mut() {
            group.set_correction_amount(self.params.correction_amount);
            group.render_synthesized_strokes(cell);
        }
    }

    /// Copy every example stroke into the cell unchanged.
    pub fn copy(&self, cell: &mut dyn GestureCell, offset: Coord<f64>, stretch: bool) {
        for group in self.groups.iter() {
            group.copy(cell, offset, stretch);
        }
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.bbox = None;
        self.complete = false;
    }

    /// Save parameters and raw strokes. Loading re-runs the analysis.
    pub fn save(&self, path: &PathBuf) -> anyhow::Result<()> {
        let file = PatternFile {
            params: self.params.clone(),
            groups: self
                .groups
                .iter()
                .map(|g| GroupRecord {
                    group_type: g.group_type(),
                    reference_frame: g.reference_frame(),
                    strokes: g.strokes(),
                })
                .collect(),
        };
        write_through_temp(path, |writer| Ok(ron::Options::default().to_io_writer(writer, &file)?))
    }

    pub fn load(path: &PathBuf) -> anyhow::Result<StrokePattern> {
        let mut reader = std::fs::File::open(path)?;
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        let file: PatternFile = ron::from_str(data.as_str()).map_err(PatternError::from)?;
        let mut pattern = StrokePattern::new(file.params);
        for record in file.groups {
            pattern.add_group(record.group_type, record.reference_frame, record.strokes)?;
        }
        Ok(pattern)
    }
}

/// Merge `candidate` into `path`, or `path` into `candidate` (keeping the
/// result in `path`'s slot). Hands the candidate back if neither accepts.
fn merge_either_way(path: &mut StrokePaths, candidate: StrokePaths) -> Result<(), StrokePaths> {
    let candidate = match path.cluster(candidate) {
        Ok(()) => return Ok(()),
        Err(candidate) => candidate,
    };
    if !candidate.mergeable(path) {
        return Err(candidate);
    }
    let original = std::mem::replace(path, candidate);
    match path.cluster(original) {
        Ok(()) => Ok(()),
        Err(original) => Err(std::mem::replace(path, original)),
    }
}

/// Write to a temporary sibling of `path`, then move it into place. The
/// temporary file is removed if anything fails.
pub(crate) fn write_through_temp<F>(path: &PathBuf, write: F) -> anyhow::Result<()>
where
    F: FnOnce(std::fs::File) -> anyhow::Result<()>,
{
    let tmp_path = path.with_extension(format!("tmp-{}", rand::random::<usize>()));
    let result = std::fs::File::create(&tmp_path)
        .map_err(anyhow::Error::from)
        .and_then(write)
        .and_then(|_| Ok(std::fs::rename(&tmp_path, path)?));
    if result.is_err() && tmp_path.exists() {
        if let Err(err) = std::fs::remove_file(&tmp_path) {
            warn!("Could not remove {}: {}", tmp_path.display(), err);
        }
    }
    result
}
