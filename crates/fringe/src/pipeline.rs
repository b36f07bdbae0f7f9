use std::path::PathBuf;

use fringe_image::{Image, ImageSize};
use fringe_io::{
    png::{read_image_png_mono8, write_image_png_gray8},
    IoError,
};
use fringe_phase::{
    absolute::absolute_phase_row,
    gray_code::{decode_fringe_order, encode_gray_code_patterns},
    pattern::{synthesize_patterns, PatternSet},
    render::render_phase_line,
    wrapped::estimate_phase,
    PhaseError,
};

use crate::config::ScanConfig;

/// Broad classes of pipeline failure, each with its own process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Meaningless parameters or an unreadable configuration file.
    Configuration,
    /// A pattern or output image could not be written.
    PatternWrite,
    /// A gray-code image is missing, unreadable or of the wrong size.
    PatternLoad,
    /// A zero three-step denominator under the failing policy.
    DegenerateTriplet,
    /// Anything else.
    Other,
}

impl FailureKind {
    /// Process exit code reported for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            FailureKind::Other => 1,
            FailureKind::Configuration => 2,
            FailureKind::PatternWrite => 3,
            FailureKind::PatternLoad => 4,
            FailureKind::DegenerateTriplet => 5,
        }
    }
}

/// An error type for the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Invalid scan parameters.
    #[error("Invalid configuration. {0}")]
    Configuration(PhaseError),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}. {source}")]
    ConfigFile {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a scan configuration.
    #[error("Failed to parse configuration file {path}. {source}")]
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// An image could not be written.
    #[error("Failed to write {path}. {source}")]
    PatternWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: IoError,
    },

    /// A gray-code image could not be loaded.
    #[error("Failed to load gray-code image {path}. {source}")]
    PatternLoad {
        /// Source path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: IoError,
    },

    /// A gray-code image does not match the pattern size.
    #[error("Gray-code image {path} is {found}, expected {expected}")]
    PatternSizeMismatch {
        /// Source path.
        path: PathBuf,
        /// Size of the sinusoidal patterns.
        expected: ImageSize,
        /// Size of the loaded image.
        found: ImageSize,
    },

    /// A degenerate intensity triplet under the failing policy.
    #[error("Phase estimation failed. {0}")]
    DegenerateTriplet(PhaseError),

    /// Any other phase recovery error.
    #[error(transparent)]
    Phase(PhaseError),
}

impl From<PhaseError> for PipelineError {
    fn from(err: PhaseError) -> Self {
        match err {
            e if e.is_configuration() => PipelineError::Configuration(e),
            e @ (PhaseError::DegeneratePixel { .. } | PhaseError::DegenerateTriplet { .. }) => {
                PipelineError::DegenerateTriplet(e)
            }
            e => PipelineError::Phase(e),
        }
    }
}

impl PipelineError {
    /// The class of this failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Configuration(_)
            | PipelineError::ConfigFile { .. }
            | PipelineError::ConfigParse { .. } => FailureKind::Configuration,
            PipelineError::PatternWrite { .. } => FailureKind::PatternWrite,
            PipelineError::PatternLoad { .. } | PipelineError::PatternSizeMismatch { .. } => {
                FailureKind::PatternLoad
            }
            PipelineError::DegenerateTriplet(_) => FailureKind::DegenerateTriplet,
            PipelineError::Phase(_) => FailureKind::Other,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }
}

/// Everything a completed scan produces.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// The synthesized sinusoidal patterns.
    pub patterns: PatternSet,
    /// Temporally unwrapped phase over the whole field.
    pub unwrapped_phase: Image<f64, 1>,
    /// Decoded fringe orders.
    pub fringe_orders: Image<u32, 1>,
    /// The inspected row.
    pub inspect_row: usize,
    /// Absolute phase along the inspected row.
    pub absolute_line: Vec<f64>,
    /// The absolute phase line rendered into a black image.
    pub line_image: Image<u8, 1>,
    /// Where `line_image` was saved.
    pub line_path: PathBuf,
}

fn write_gray8(path: PathBuf, image: &Image<u8, 1>) -> Result<PathBuf, PipelineError> {
    match write_image_png_gray8(&path, image) {
        Ok(()) => Ok(path),
        Err(source) => Err(PipelineError::PatternWrite { path, source }),
    }
}

/// Write every pattern as `pattern_{k}.png` into the output directory.
///
/// # Returns
///
/// The written paths, in pattern order.
pub fn write_patterns(
    patterns: &PatternSet,
    config: &ScanConfig,
) -> Result<Vec<PathBuf>, PipelineError> {
    patterns
        .iter()
        .enumerate()
        .map(|(k, pattern)| write_gray8(config.pattern_path(k), pattern))
        .collect()
}

/// Encode the column fringe orders of the configured patterns and write them
/// as `gray_pattern_{i}.png`.
pub fn write_gray_codes(config: &ScanConfig) -> Result<Vec<PathBuf>, PipelineError> {
    let codes = encode_gray_code_patterns(
        config.pattern.size(),
        config.gray_code_bits,
        config.pattern.period,
    )?;

    let paths = codes
        .iter()
        .enumerate()
        .map(|(i, code)| write_gray8(config.gray_code_path(i), code))
        .collect::<Result<Vec<_>, _>>()?;

    log::info!(
        "wrote {} gray-code images to {}",
        paths.len(),
        config.output_dir.display()
    );

    Ok(paths)
}

/// Load the configured number of gray-code images.
///
/// # Errors
///
/// A missing or unreadable image, or an image whose size differs from
/// `expected`.
pub fn load_gray_codes(
    config: &ScanConfig,
    expected: ImageSize,
) -> Result<Vec<Image<u8, 1>>, PipelineError> {
    (0..config.gray_code_bits)
        .map(|i| {
            let path = config.gray_code_path(i);
            let code = match read_image_png_mono8(&path) {
                Ok(code) => code,
                Err(source) => return Err(PipelineError::PatternLoad { path, source }),
            };
            if code.size() != expected {
                return Err(PipelineError::PatternSizeMismatch {
                    path,
                    expected,
                    found: code.size(),
                });
            }
            log::debug!("loaded {}", path.display());
            Ok(code)
        })
        .collect()
}

/// Run a full scan.
///
/// Synthesizes and writes the patterns, estimates the unwrapped phase,
/// decodes the fringe orders from the gray-code images in the output
/// directory and saves the absolute phase of the inspected row as
/// `absolute_phase_line.png`.
pub fn run(config: &ScanConfig) -> Result<ScanOutput, PipelineError> {
    config.validate()?;

    let patterns = synthesize_patterns(&config.pattern)?;
    write_patterns(&patterns, config)?;
    log::info!("patterns generated in {}", config.output_dir.display());

    let unwrapped_phase = estimate_phase(&patterns, config.degenerate_policy)?;
    log::info!("unwrapped phase map calculated");

    let codes = load_gray_codes(config, patterns.size())?;
    let fringe_orders = decode_fringe_order(&codes, config.sampling, config.bit_threshold)?;

    let inspect_row = config.inspect_row();
    let absolute_line = absolute_phase_row(&unwrapped_phase, &fringe_orders, inspect_row)?;
    let line_image = render_phase_line(&absolute_line, patterns.size(), inspect_row)?;
    let line_path = write_gray8(config.line_path(), &line_image)?;

    log::info!(
        "absolute phase of row {} saved to {}",
        inspect_row,
        line_path.display()
    );

    Ok(ScanOutput {
        patterns,
        unwrapped_phase,
        fringe_orders,
        inspect_row,
        absolute_line,
        line_image,
        line_path,
    })
}
