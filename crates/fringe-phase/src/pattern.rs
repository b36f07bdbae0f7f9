use std::f64::consts::PI;

use fringe_image::{Image, ImageSize};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ensure_non_empty, ensure_same_size, PhaseError},
    parallel,
};

/// Parameters of a phase-shifted sinusoidal pattern sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Width of every pattern in pixels.
    pub width: usize,
    /// Height of every pattern in pixels.
    pub height: usize,
    /// Number of phase-shifted patterns.
    pub num_patterns: usize,
    /// Pixels per sinusoidal cycle along the horizontal axis.
    pub period: f64,
    /// Angular step between successive patterns, in degrees.
    pub phase_shift_deg: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            num_patterns: 6,
            period: 10.0,
            phase_shift_deg: 60.0,
        }
    }
}

impl PatternConfig {
    /// Size shared by every pattern of the sequence.
    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Phase offset of pattern `k` in radians.
    pub fn phase_offset(&self, k: usize) -> f64 {
        k as f64 * self.phase_shift_deg * PI / 180.0
    }

    /// Reject parameter combinations that cannot describe a fringe sequence.
    pub fn validate(&self) -> Result<(), PhaseError> {
        ensure_non_empty(self.size())?;

        if self.num_patterns < 3 {
            return Err(PhaseError::TooFewPatterns(self.num_patterns));
        }

        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(PhaseError::InvalidPeriod(self.period));
        }

        if !self.phase_shift_deg.is_finite() {
            return Err(PhaseError::InvalidPhaseShift(self.phase_shift_deg));
        }

        Ok(())
    }
}

/// Intensity of a sinusoidal fringe at column `col`.
///
/// Computes `round(127.5 * (1 + sin(2π·col/period + phase_offset)))` clamped
/// to the 8-bit range.
///
/// # Examples
///
/// ```
/// use fringe_phase::pattern::fringe_intensity;
///
/// assert_eq!(fringe_intensity(0, 4.0, 0.0), 128);
/// assert_eq!(fringe_intensity(1, 4.0, 0.0), 255);
/// assert_eq!(fringe_intensity(3, 4.0, 0.0), 0);
/// ```
pub fn fringe_intensity(col: usize, period: f64, phase_offset: f64) -> u8 {
    let value = 127.5 * (1.0 + (2.0 * PI * col as f64 / period + phase_offset).sin());
    value.round().clamp(0.0, 255.0) as u8
}

/// Synthesize pattern `k` of the sequence.
///
/// The intensity only depends on the column, so one row profile is computed
/// and replicated over every row.
pub fn synthesize_pattern(config: &PatternConfig, k: usize) -> Result<Image<u8, 1>, PhaseError> {
    config.validate()?;

    let phase_offset = config.phase_offset(k);
    let profile = (0..config.width)
        .map(|col| fringe_intensity(col, config.period, phase_offset))
        .collect::<Vec<_>>();

    let mut pattern = Image::from_size_val(config.size(), 0u8)?;
    parallel::par_rows_mut(&mut pattern, |_, row| row.copy_from_slice(&profile));

    Ok(pattern)
}

/// Synthesize the whole phase-shifted sequence.
///
/// # Examples
///
/// ```
/// use fringe_phase::pattern::{synthesize_patterns, PatternConfig};
///
/// let config = PatternConfig {
///     width: 8,
///     height: 2,
///     num_patterns: 4,
///     period: 4.0,
///     phase_shift_deg: 90.0,
/// };
///
/// let patterns = synthesize_patterns(&config).unwrap();
/// assert_eq!(patterns.len(), 4);
/// assert_eq!(patterns.size(), config.size());
/// ```
pub fn synthesize_patterns(config: &PatternConfig) -> Result<PatternSet, PhaseError> {
    let fields = (0..config.num_patterns)
        .map(|k| synthesize_pattern(config, k))
        .collect::<Result<Vec<_>, _>>()?;

    log::info!(
        "synthesized {} fringe patterns of {}x{} (period {} px, shift {} deg)",
        fields.len(),
        config.width,
        config.height,
        config.period,
        config.phase_shift_deg
    );

    PatternSet::new(fields)
}

/// An ordered sequence of intensity fields sharing one size.
///
/// The insertion order is the phase-shift order.
#[derive(Debug, Clone)]
pub struct PatternSet {
    size: ImageSize,
    fields: Vec<Image<u8, 1>>,
}

impl PatternSet {
    /// Build a pattern set, checking that every field has the same size.
    pub fn new(fields: Vec<Image<u8, 1>>) -> Result<Self, PhaseError> {
        let Some(first) = fields.first() else {
            return Err(PhaseError::TooFewPatterns(0));
        };
        let size = first.size();
        ensure_non_empty(size)?;

        for field in &fields[1..] {
            ensure_same_size(size, field.size())?;
        }

        Ok(Self { size, fields })
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false, a pattern set holds at least one field.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Size shared by the fields.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Field `k`, if present.
    pub fn get(&self, k: usize) -> Option<&Image<u8, 1>> {
        self.fields.get(k)
    }

    /// Iterate over the fields in phase-shift order.
    pub fn iter(&self) -> impl Iterator<Item = &Image<u8, 1>> {
        self.fields.iter()
    }

    /// Sliding triplets `(i, [field i, field i+1, field i+2])`.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, [&Image<u8, 1>; 3])> {
        self.fields
            .windows(3)
            .enumerate()
            .map(|(i, w)| (i, [&w[0], &w[1], &w[2]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> PatternConfig {
        PatternConfig {
            width: 4,
            height: 1,
            num_patterns: 3,
            period: 4.0,
            phase_shift_deg: 120.0,
        }
    }

    #[test]
    fn pattern_matches_closed_form() -> Result<(), PhaseError> {
        let config = small_config();
        let patterns = synthesize_patterns(&config)?;

        for (k, pattern) in patterns.iter().enumerate() {
            for col in 0..4 {
                let expected = 127.5
                    * (1.0
                        + (2.0 * PI * col as f64 / 4.0 + k as f64 * 120.0 * PI / 180.0).sin());
                let value = *pattern.get_pixel(col, 0, 0)? as f64;
                assert!(
                    (value - expected).abs() <= 1.0,
                    "pattern {k} col {col}: {value} vs {expected}"
                );
            }
        }

        // pattern 0 is the unshifted sinusoid sampled at quarter periods
        assert_eq!(patterns.get(0).map(|p| p.as_slice()), Some(&[128, 255, 128, 0][..]));

        Ok(())
    }

    #[test]
    fn pattern_count_size_and_row_independence() -> Result<(), PhaseError> {
        let config = PatternConfig {
            width: 37,
            height: 5,
            num_patterns: 7,
            period: 7.5,
            phase_shift_deg: 51.0,
        };
        let patterns = synthesize_patterns(&config)?;
        assert_eq!(patterns.len(), 7);

        for pattern in patterns.iter() {
            assert_eq!(pattern.size(), config.size());
            let first = pattern.row(0)?;
            for y in 1..config.height {
                assert_eq!(pattern.row(y)?, first);
            }
        }

        Ok(())
    }

    #[test]
    fn pattern_saturates_at_extremes() -> Result<(), PhaseError> {
        // the peak and trough of the sinusoid land exactly on 255 and 0
        assert_eq!(fringe_intensity(1, 4.0, 0.0), 255);
        assert_eq!(fringe_intensity(0, 4.0, -PI / 2.0), 0);
        Ok(())
    }

    #[test]
    fn config_validation() {
        let mut config = small_config();
        config.num_patterns = 2;
        assert_eq!(config.validate(), Err(PhaseError::TooFewPatterns(2)));

        let mut config = small_config();
        config.period = 0.0;
        assert_eq!(config.validate(), Err(PhaseError::InvalidPeriod(0.0)));

        let mut config = small_config();
        config.period = -3.0;
        assert_eq!(config.validate(), Err(PhaseError::InvalidPeriod(-3.0)));

        let mut config = small_config();
        config.height = 0;
        assert!(matches!(config.validate(), Err(PhaseError::EmptyImage(_))));

        let mut config = small_config();
        config.phase_shift_deg = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(PhaseError::InvalidPhaseShift(_))
        ));

        assert!(synthesize_patterns(&PatternConfig {
            num_patterns: 1,
            ..small_config()
        })
        .is_err());
    }

    #[test]
    fn pattern_set_rejects_mixed_sizes() -> Result<(), PhaseError> {
        let a = Image::<u8, 1>::from_size_val([4, 2].into(), 0)?;
        let b = Image::<u8, 1>::from_size_val([4, 3].into(), 0)?;
        let res = PatternSet::new(vec![a, b]);
        assert_eq!(
            res.map(|s| s.len()),
            Err(PhaseError::SizeMismatch {
                expected: [4, 2].into(),
                found: [4, 3].into(),
            })
        );
        assert!(PatternSet::new(vec![]).is_err());
        Ok(())
    }

    #[test]
    fn pattern_set_triplets() -> Result<(), PhaseError> {
        let patterns = synthesize_patterns(&PatternConfig {
            num_patterns: 5,
            ..small_config()
        })?;
        let starts = patterns.triplets().map(|(i, _)| i).collect::<Vec<_>>();
        assert_eq!(starts, vec![0, 1, 2]);

        let (_, [a, b, c]) = patterns.triplets().last().ok_or(PhaseError::TooFewPatterns(0))?;
        assert_eq!(Some(a), patterns.get(2));
        assert_eq!(Some(b), patterns.get(3));
        assert_eq!(Some(c), patterns.get(4));
        Ok(())
    }

    #[test]
    fn config_from_json_uses_defaults() -> Result<(), serde_json::Error> {
        let config: PatternConfig = serde_json::from_str(r#"{ "num_patterns": 3 }"#)?;
        assert_eq!(config.num_patterns, 3);
        assert_eq!(config.width, 1280);
        assert_eq!(config.period, 10.0);
        Ok(())
    }
}
