use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fringe_phase::{
    gray_code::{FringeSampling, DEFAULT_GRAY_CODE_BITS, MAX_GRAY_CODE_BITS},
    pattern::PatternConfig,
    wrapped::DegeneratePolicy,
    PhaseError,
};

use crate::pipeline::PipelineError;

/// Everything a scan run needs.
///
/// The defaults reproduce the reference acquisition: six 1280x720 patterns
/// with a 10 px period shifted by 60 degrees, seven gray-code images, all in
/// `./sinusoidal_patterns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// The sinusoidal pattern sequence.
    pub pattern: PatternConfig,
    /// Directory patterns are written to and gray codes are read from.
    pub output_dir: PathBuf,
    /// Number of gray-code images.
    pub gray_code_bits: usize,
    /// A gray-code pixel above this value is a set bit.
    pub bit_threshold: u8,
    /// How fringe orders are sampled.
    pub sampling: FringeSampling,
    /// Handling of zero denominators in the three-step formula.
    pub degenerate_policy: DegeneratePolicy,
    /// Row of the absolute phase to inspect; the middle row when unset.
    pub inspect_row: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: PatternConfig::default(),
            output_dir: PathBuf::from("./sinusoidal_patterns"),
            gray_code_bits: DEFAULT_GRAY_CODE_BITS,
            bit_threshold: 0,
            sampling: FringeSampling::default(),
            degenerate_policy: DegeneratePolicy::default(),
            inspect_row: None,
        }
    }
}

impl ScanConfig {
    /// Load a configuration from a JSON file, missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| PipelineError::ConfigFile {
                path: path.to_path_buf(),
                source,
            })?;

        serde_json::from_str(&contents).map_err(|source| PipelineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.pattern.validate()?;

        if self.gray_code_bits == 0 || self.gray_code_bits > MAX_GRAY_CODE_BITS {
            return Err(PhaseError::InvalidGrayCodeBits(self.gray_code_bits).into());
        }

        self.sampling.validate(self.pattern.width)?;

        let row = self.inspect_row();
        if row >= self.pattern.height {
            return Err(PhaseError::RowOutOfBounds(row, self.pattern.height).into());
        }

        Ok(())
    }

    /// The inspected row.
    pub fn inspect_row(&self) -> usize {
        self.inspect_row.unwrap_or(self.pattern.height / 2)
    }

    /// Path of sinusoidal pattern `k`.
    pub fn pattern_path(&self, k: usize) -> PathBuf {
        self.output_dir.join(format!("pattern_{k}.png"))
    }

    /// Path of gray-code image `i`.
    pub fn gray_code_path(&self, i: usize) -> PathBuf {
        self.output_dir.join(format!("gray_pattern_{i}.png"))
    }

    /// Path of the rendered absolute phase line.
    pub fn line_path(&self) -> PathBuf {
        self.output_dir.join("absolute_phase_line.png")
    }
}
