use fringe_image::{ImageError, ImageSize};

/// An error type for the phase recovery operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PhaseError {
    /// Fewer patterns than the three-step formula needs.
    #[error("At least 3 phase-shifted patterns are required, got {0}")]
    TooFewPatterns(usize),

    /// The sinusoid period is not a positive finite number of pixels.
    #[error("The fringe period must be positive and finite, got {0}")]
    InvalidPeriod(f64),

    /// The phase shift between patterns is not finite.
    #[error("The phase shift must be finite, got {0}")]
    InvalidPhaseShift(f64),

    /// An image dimension is zero.
    #[error("Image dimensions must be non-zero, got {0}")]
    EmptyImage(ImageSize),

    /// Two fields that must share a size do not.
    #[error("Size mismatch: expected {expected}, found {found}")]
    SizeMismatch {
        /// The reference size.
        expected: ImageSize,
        /// The offending size.
        found: ImageSize,
    },

    /// The number of gray-code bits is outside 1..=31.
    #[error("The number of gray-code bits must be in 1..=31, got {0}")]
    InvalidGrayCodeBits(usize),

    /// The gray-code bits cannot represent every fringe order of the pattern.
    #[error("{bits} gray-code bits cannot encode fringe order {max_order}")]
    InsufficientGrayCodeBits {
        /// Number of bits available.
        bits: usize,
        /// Largest fringe order to encode.
        max_order: u32,
    },

    /// The fringe-order sampling stride is zero.
    #[error("The fringe-order sampling stride must be non-zero")]
    InvalidStride,

    /// The sampled column lies outside the image.
    #[error("Sample column {0} is out of bounds for width {1}")]
    SampleColumnOutOfBounds(usize, usize),

    /// The inspected row lies outside the image.
    #[error("Row {0} is out of bounds for height {1}")]
    RowOutOfBounds(usize, usize),

    /// A phase line does not span the image width.
    #[error("Phase line has {0} samples but the image is {1} pixels wide")]
    LineLengthMismatch(usize, usize),

    /// The three-step denominator vanished at a pixel.
    #[error("Degenerate intensity triplet at pixel ({x}, {y})")]
    DegeneratePixel {
        /// Column of the pixel.
        x: usize,
        /// Row of the pixel.
        y: usize,
    },

    /// The three-step denominator vanished at a pixel of a given triplet.
    #[error("Degenerate intensity triplet {triplet} at pixel ({x}, {y})")]
    DegenerateTriplet {
        /// Index of the first pattern of the triplet.
        triplet: usize,
        /// Column of the pixel.
        x: usize,
        /// Row of the pixel.
        y: usize,
    },

    /// Error from the underlying image type.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl PhaseError {
    /// Whether the error comes from meaningless parameters rather than data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PhaseError::TooFewPatterns(_)
                | PhaseError::InvalidPeriod(_)
                | PhaseError::InvalidPhaseShift(_)
                | PhaseError::EmptyImage(_)
                | PhaseError::InvalidGrayCodeBits(_)
                | PhaseError::InsufficientGrayCodeBits { .. }
                | PhaseError::InvalidStride
                | PhaseError::SampleColumnOutOfBounds(..)
                | PhaseError::RowOutOfBounds(..)
        )
    }

    pub(crate) fn in_triplet(self, triplet: usize) -> Self {
        match self {
            PhaseError::DegeneratePixel { x, y } => PhaseError::DegenerateTriplet { triplet, x, y },
            e => e,
        }
    }
}

pub(crate) fn ensure_same_size(expected: ImageSize, found: ImageSize) -> Result<(), PhaseError> {
    if expected != found {
        return Err(PhaseError::SizeMismatch { expected, found });
    }
    Ok(())
}

pub(crate) fn ensure_non_empty(size: ImageSize) -> Result<(), PhaseError> {
    if size.width == 0 || size.height == 0 {
        return Err(PhaseError::EmptyImage(size));
    }
    Ok(())
}
