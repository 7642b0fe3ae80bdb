use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use super::write_through_temp;
use crate::errors::PatternError;

/// Tuning knobs of a pattern. Missing fields in a params file take their
/// default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PatternParams {
    /// Shape fitting tolerance, in pattern pixels.
    pub epsilon: f64,
    /// Multiplier on the fitted minor axis of free-form elements.
    pub style_adjust: f64,
    /// Fit elements on the pen footprint rather than the raw polyline.
    pub analyze_style: bool,
    /// Neighborhood depth of the Efros synthesis.
    pub ring_nb: usize,
    /// Blend between the initial (0) and corrected (1) placements.
    pub correction_amount: f64,
    /// Seed for every stochastic step. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for PatternParams {
    fn default() -> Self {
        PatternParams {
            epsilon: 10.0,
            style_adjust: 1.0,
            analyze_style: false,
            ring_nb: 1,
            correction_amount: 1.0,
            seed: None,
        }
    }
}

impl PatternParams {
    pub fn with_seed(mut self, seed: u64) -> PatternParams {
        self.seed = Some(seed);
        self
    }

    pub fn from_str(data: &str) -> Result<PatternParams, PatternError> {
        Ok(ron::from_str(data)?)
    }

    pub fn to_string(&self) -> String {
        ron::ser::to_string_pretty(self, PrettyConfig::default()).unwrap_or_default()
    }

    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        write_through_temp(path, |writer| {
            Ok(ron::Options::default().to_io_writer_pretty(writer, &self, PrettyConfig::default())?)
        })
    }

    pub fn from_file(path: &PathBuf) -> Result<PatternParams> {
        let mut reader = std::fs::File::open(path)?;
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        Ok(PatternParams::from_str(data.as_str())?)
    }
}
