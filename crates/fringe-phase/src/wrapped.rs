use std::f64::consts::{FRAC_PI_2, PI, TAU};

use fringe_image::{Image, ImageSize};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ensure_non_empty, ensure_same_size, PhaseError},
    parallel,
    pattern::PatternSet,
};

/// What to do when the three-step denominator `2·I1 − I2 − I0` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Abort the estimation and report the pixel.
    Fail,
    /// Use the limit of `atan`: `±π/2` following the numerator sign, or `0`
    /// when the numerator vanishes as well.
    #[default]
    Saturate,
    /// Write `NaN` and keep going.
    Nan,
}

/// Three-step phase-shifting formula for one pixel.
///
/// Computes `atan(sqrt(3)·(i2 − i0) / (2·i1 − i2 − i0))`. The result lies in
/// the principal range of `atan`, i.e. `(−π/2, π/2)`; the quadrant is not
/// resolved.
///
/// # Arguments
///
/// * `i0`, `i1`, `i2` - Intensities of three consecutive phase-shifted patterns.
/// * `policy` - Handling of a zero denominator.
///
/// # Returns
///
/// The wrapped phase, or `None` when the denominator is zero and the policy is
/// [`DegeneratePolicy::Fail`].
///
/// # Examples
///
/// ```
/// use fringe_phase::wrapped::{three_step_phase, DegeneratePolicy};
///
/// let phase = three_step_phase(50.0, 200.0, 50.0, DegeneratePolicy::Fail);
/// assert_eq!(phase, Some(0.0));
///
/// let phase = three_step_phase(100.0, 100.0, 100.0, DegeneratePolicy::Fail);
/// assert_eq!(phase, None);
/// ```
pub fn three_step_phase(i0: f64, i1: f64, i2: f64, policy: DegeneratePolicy) -> Option<f64> {
    let numerator = 3f64.sqrt() * (i2 - i0);
    let denominator = 2.0 * i1 - i2 - i0;

    if denominator == 0.0 {
        return match policy {
            DegeneratePolicy::Fail => None,
            DegeneratePolicy::Saturate => Some(if numerator > 0.0 {
                FRAC_PI_2
            } else if numerator < 0.0 {
                -FRAC_PI_2
            } else {
                0.0
            }),
            DegeneratePolicy::Nan => Some(f64::NAN),
        };
    }

    Some((numerator / denominator).atan())
}

/// Continuity correction of a raw phase against the previously accumulated one.
///
/// Removes one 2π jump: subtracts 2π when `raw − previous > π`, adds 2π when it
/// is below `−π`. Larger, multi-cycle ambiguities are left alone.
pub fn unwrap_step(raw: f64, previous: f64) -> f64 {
    let difference = raw - previous;

    if difference > PI {
        raw - TAU
    } else if difference < -PI {
        raw + TAU
    } else {
        raw
    }
}

/// Compute the wrapped phase of one triplet of intensity fields.
///
/// # Arguments
///
/// * `triplet` - Three consecutive phase-shifted intensity fields.
/// * `dst` - The wrapped phase field, overwritten entirely.
/// * `policy` - Handling of zero denominators.
///
/// # Errors
///
/// Sizes must match. With [`DegeneratePolicy::Fail`], a zero denominator
/// returns [`PhaseError::DegeneratePixel`] for the first degenerate pixel in
/// row-major order.
pub fn wrapped_phase(
    triplet: [&Image<u8, 1>; 3],
    dst: &mut Image<f64, 1>,
    policy: DegeneratePolicy,
) -> Result<(), PhaseError> {
    let [a, b, c] = triplet;
    ensure_same_size(dst.size(), a.size())?;
    ensure_same_size(dst.size(), b.size())?;
    ensure_same_size(dst.size(), c.size())?;

    let cols = dst.cols();
    let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_slice());

    parallel::try_par_rows_mut(dst, |y, row| {
        let offset = y * cols;
        for (x, phase) in row.iter_mut().enumerate() {
            let idx = offset + x;
            *phase = three_step_phase(a[idx] as f64, b[idx] as f64, c[idx] as f64, policy)
                .ok_or(PhaseError::DegeneratePixel { x, y })?;
        }
        Ok(())
    })
}

/// The unwrapped phase accumulated across triplets.
///
/// Every step consumes the accumulator and hands back the updated one, so the
/// sequential dependency between triplets is explicit in the types.
#[derive(Debug, Clone)]
pub struct PhaseAccumulator {
    phase: Image<f64, 1>,
    steps: usize,
}

impl PhaseAccumulator {
    /// Start from an all-zero phase field.
    pub fn new(size: ImageSize) -> Result<Self, PhaseError> {
        ensure_non_empty(size)?;
        Ok(Self {
            phase: Image::from_size_val(size, 0.0)?,
            steps: 0,
        })
    }

    /// Start from an existing phase field.
    pub fn from_phase(phase: Image<f64, 1>) -> Self {
        Self { phase, steps: 0 }
    }

    /// Fold one wrapped phase field into the accumulator.
    ///
    /// Each pixel is replaced by [`unwrap_step`] of the wrapped value against
    /// the accumulated one. Rows are updated in parallel; pixels never share
    /// state.
    pub fn accumulate(mut self, wrapped: &Image<f64, 1>) -> Result<Self, PhaseError> {
        ensure_same_size(self.phase.size(), wrapped.size())?;

        parallel::par_iter_rows_val(wrapped, &mut self.phase, |raw, accumulated| {
            *accumulated = unwrap_step(*raw, *accumulated);
        });
        self.steps += 1;

        Ok(self)
    }

    /// The current accumulated phase.
    pub fn phase(&self) -> &Image<f64, 1> {
        &self.phase
    }

    /// Number of wrapped fields folded in so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Consume the accumulator and return the phase field.
    pub fn into_inner(self) -> Image<f64, 1> {
        self.phase
    }
}

/// Estimate the locally unwrapped phase of a pattern set.
///
/// Runs [`wrapped_phase`] on every sliding triplet in order and folds each
/// result into a zero-initialised [`PhaseAccumulator`].
///
/// # Errors
///
/// Fewer than three patterns, or a degenerate pixel under
/// [`DegeneratePolicy::Fail`] (reported as [`PhaseError::DegenerateTriplet`]
/// for the first such pixel of the first failing triplet).
pub fn estimate_phase(
    patterns: &PatternSet,
    policy: DegeneratePolicy,
) -> Result<Image<f64, 1>, PhaseError> {
    if patterns.len() < 3 {
        return Err(PhaseError::TooFewPatterns(patterns.len()));
    }

    let size = patterns.size();
    let mut wrapped = Image::from_size_val(size, 0.0)?;

    let accumulator = patterns.triplets().try_fold(
        PhaseAccumulator::new(size)?,
        |accumulator, (i, triplet)| {
            wrapped_phase(triplet, &mut wrapped, policy).map_err(|e| e.in_triplet(i))?;
            log::debug!("accumulated wrapped phase of triplet {}..={}", i, i + 2);
            accumulator.accumulate(&wrapped)
        },
    )?;

    log::info!(
        "estimated phase from {} triplets ({:?} policy)",
        accumulator.steps(),
        policy
    );

    Ok(accumulator.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{synthesize_patterns, PatternConfig};
    use approx::assert_relative_eq;

    fn reference(i1: f64, i2: f64, i3: f64) -> f64 {
        (3f64.sqrt() * (i3 - i1) / (2.0 * i2 - i1 - i3)).atan()
    }

    #[test]
    fn three_step_matches_reference() {
        for (i1, i2, i3) in [(50.0, 200.0, 50.0), (10.0, 30.0, 200.0), (240.0, 17.0, 99.0)] {
            let phase = three_step_phase(i1, i2, i3, DegeneratePolicy::Fail);
            assert_relative_eq!(
                phase.unwrap_or(f64::NAN),
                reference(i1, i2, i3),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn three_step_is_pure() {
        let first = three_step_phase(12.0, 140.0, 77.0, DegeneratePolicy::Saturate);
        let second = three_step_phase(12.0, 140.0, 77.0, DegeneratePolicy::Saturate);
        assert_eq!(first, second);
    }

    #[test]
    fn three_step_stays_in_principal_range() {
        for i0 in (0..=255).step_by(15) {
            for i1 in (0..=255).step_by(15) {
                for i2 in (0..=255).step_by(15) {
                    let phase = three_step_phase(
                        i0 as f64,
                        i1 as f64,
                        i2 as f64,
                        DegeneratePolicy::Saturate,
                    )
                    .unwrap_or(f64::NAN);
                    assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&phase));
                }
            }
        }
    }

    #[test]
    fn three_step_degenerate_policies() {
        // 2·100 − 150 − 50 = 0
        assert_eq!(
            three_step_phase(50.0, 100.0, 150.0, DegeneratePolicy::Fail),
            None
        );
        assert_eq!(
            three_step_phase(50.0, 100.0, 150.0, DegeneratePolicy::Saturate),
            Some(FRAC_PI_2)
        );
        assert_eq!(
            three_step_phase(150.0, 100.0, 50.0, DegeneratePolicy::Saturate),
            Some(-FRAC_PI_2)
        );
        assert_eq!(
            three_step_phase(80.0, 80.0, 80.0, DegeneratePolicy::Saturate),
            Some(0.0)
        );
        assert!(three_step_phase(80.0, 80.0, 80.0, DegeneratePolicy::Nan)
            .is_some_and(f64::is_nan));
    }

    #[test]
    fn unwrap_step_cases() {
        assert_relative_eq!(unwrap_step(3.0, -1.0), 3.0 - TAU);
        assert_relative_eq!(unwrap_step(-3.0, 1.0), -3.0 + TAU);
        assert_relative_eq!(unwrap_step(0.5, 0.2), 0.5);
        // a difference of exactly π passes through
        assert_relative_eq!(unwrap_step(PI, 0.0), PI);
        assert!(unwrap_step(f64::NAN, 0.0).is_nan());
    }

    #[test]
    fn unwrap_step_properties() {
        let samples = (-30..=30).map(|i| i as f64 * 0.3);
        for previous in samples.clone() {
            for raw in samples.clone() {
                if (raw - previous).abs() > 3.0 * PI {
                    continue;
                }
                let corrected = unwrap_step(raw, previous);
                let cycles = (corrected - raw) / TAU;
                assert_relative_eq!(cycles, cycles.round(), epsilon = 1e-12);
                assert!((corrected - previous).abs() <= PI + 1e-12);
            }
        }
    }

    #[test]
    fn wrapped_phase_per_pixel() -> Result<(), PhaseError> {
        let size = [2, 1].into();
        let a = Image::new(size, vec![50u8, 10])?;
        let b = Image::new(size, vec![200u8, 30])?;
        let c = Image::new(size, vec![50u8, 200])?;
        let mut dst = Image::from_size_val(size, 0.0)?;

        wrapped_phase([&a, &b, &c], &mut dst, DegeneratePolicy::Fail)?;

        assert_relative_eq!(dst.as_slice()[0], reference(50.0, 200.0, 50.0), epsilon = 1e-9);
        assert_relative_eq!(dst.as_slice()[1], reference(10.0, 30.0, 200.0), epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn wrapped_phase_reports_degenerate_pixel() -> Result<(), PhaseError> {
        let size = [3, 2].into();
        let a = Image::new(size, vec![50u8, 10, 10, 10, 10, 10])?;
        let b = Image::new(size, vec![200u8, 30, 30, 30, 100, 30])?;
        let c = Image::new(size, vec![50u8, 200, 200, 200, 190, 200])?;
        let mut dst = Image::from_size_val(size, 0.0)?;

        let res = wrapped_phase([&a, &b, &c], &mut dst, DegeneratePolicy::Fail);
        assert_eq!(res, Err(PhaseError::DegeneratePixel { x: 1, y: 1 }));
        Ok(())
    }

    #[test]
    fn wrapped_phase_reports_first_degenerate_pixel() -> Result<(), PhaseError> {
        let size = ImageSize {
            width: 8,
            height: 128,
        };
        let a = Image::from_size_val(size, 10u8)?;
        let c = Image::from_size_val(size, 200u8)?;
        let mut b = Image::from_size_val(size, 30u8)?;
        // 2·105 − 200 − 10 = 0
        for (x, y) in [(5, 3), (2, 40), (0, 100), (7, 127)] {
            b.set_pixel(x, y, 0, 105)?;
        }

        let mut dst = Image::from_size_val(size, 0.0)?;
        for _ in 0..10 {
            let res = wrapped_phase([&a, &b, &c], &mut dst, DegeneratePolicy::Fail);
            assert_eq!(res, Err(PhaseError::DegeneratePixel { x: 5, y: 3 }));
        }
        Ok(())
    }

    #[test]
    fn wrapped_phase_size_mismatch() -> Result<(), PhaseError> {
        let a = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let b = Image::<u8, 1>::from_size_val([2, 1].into(), 0)?;
        let mut dst = Image::from_size_val([2, 2].into(), 0.0)?;
        let res = wrapped_phase([&a, &b, &a], &mut dst, DegeneratePolicy::Saturate);
        assert!(matches!(res, Err(PhaseError::SizeMismatch { .. })));
        Ok(())
    }

    #[test]
    fn accumulator_is_moved_through_steps() -> Result<(), PhaseError> {
        let size = [3, 1].into();
        let accumulator = PhaseAccumulator::from_phase(Image::new(size, vec![-1.0, 1.0, 0.2])?);

        let wrapped = Image::new(size, vec![3.0, -3.0, 0.5])?;
        let accumulator = accumulator.accumulate(&wrapped)?;

        assert_eq!(accumulator.steps(), 1);
        let phase = accumulator.phase().as_slice();
        assert_relative_eq!(phase[0], 3.0 - TAU);
        assert_relative_eq!(phase[1], -3.0 + TAU);
        assert_relative_eq!(phase[2], 0.5);

        let wrong = Image::from_size_val([1, 1].into(), 0.0)?;
        assert!(accumulator.accumulate(&wrong).is_err());
        Ok(())
    }

    #[test]
    fn accumulator_recovers_after_nan() -> Result<(), PhaseError> {
        let size = [2, 1].into();
        let accumulator = PhaseAccumulator::new(size)?;

        let accumulator = accumulator.accumulate(&Image::new(size, vec![f64::NAN, 0.3])?)?;
        assert!(accumulator.phase().as_slice()[0].is_nan());
        assert_relative_eq!(accumulator.phase().as_slice()[1], 0.3);

        // no continuity reference, the raw value is taken as is
        let accumulator = accumulator.accumulate(&Image::new(size, vec![2.0, 0.4])?)?;
        assert_eq!(accumulator.steps(), 2);
        assert_relative_eq!(accumulator.phase().as_slice()[0], 2.0);
        assert_relative_eq!(accumulator.phase().as_slice()[1], 0.4);
        assert_relative_eq!(unwrap_step(-2.5, f64::NAN), -2.5);
        Ok(())
    }

    #[test]
    fn estimate_single_triplet_equals_wrapped_phase() -> Result<(), PhaseError> {
        let config = PatternConfig {
            width: 20,
            height: 3,
            num_patterns: 3,
            period: 10.0,
            phase_shift_deg: 60.0,
        };
        let patterns = synthesize_patterns(&config)?;
        let phase = estimate_phase(&patterns, DegeneratePolicy::Saturate)?;

        let (a, b, c) = match (patterns.get(0), patterns.get(1), patterns.get(2)) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return Err(PhaseError::TooFewPatterns(patterns.len())),
        };
        for (idx, value) in phase.as_slice().iter().enumerate() {
            let expected = three_step_phase(
                a.as_slice()[idx] as f64,
                b.as_slice()[idx] as f64,
                c.as_slice()[idx] as f64,
                DegeneratePolicy::Saturate,
            )
            .unwrap_or(f64::NAN);
            // starting from zero, a value inside (−π/2, π/2) is never corrected
            assert_relative_eq!(*value, expected);
        }
        Ok(())
    }

    #[test]
    fn estimate_default_sequence_is_row_independent() -> Result<(), PhaseError> {
        let config = PatternConfig {
            width: 40,
            height: 4,
            ..PatternConfig::default()
        };
        let patterns = synthesize_patterns(&config)?;
        let phase = estimate_phase(&patterns, DegeneratePolicy::Saturate)?;

        let first = phase.row(0)?.to_vec();
        for y in 1..config.height {
            assert_eq!(phase.row(y)?, first.as_slice());
        }
        assert!(first.iter().all(|p| p.is_finite() && p.abs() <= 3.0 * PI));
        Ok(())
    }

    #[test]
    fn estimate_fail_policy_reports_triplet() -> Result<(), PhaseError> {
        let flat = Image::<u8, 1>::from_size_val([2, 2].into(), 100)?;
        let patterns = PatternSet::new(vec![flat.clone(), flat.clone(), flat])?;
        let res = estimate_phase(&patterns, DegeneratePolicy::Fail);
        assert!(matches!(
            res,
            Err(PhaseError::DegenerateTriplet { triplet: 0, .. })
        ));
        Ok(())
    }

    #[test]
    fn estimate_requires_three_patterns() -> Result<(), PhaseError> {
        let flat = Image::<u8, 1>::from_size_val([2, 2].into(), 100)?;
        let patterns = PatternSet::new(vec![flat.clone(), flat])?;
        assert_eq!(
            estimate_phase(&patterns, DegeneratePolicy::Saturate).map(|p| p.size()),
            Err(PhaseError::TooFewPatterns(2))
        );
        Ok(())
    }
}
