use std::f64::consts::{PI, TAU};

use fringe_image::{Image, ImageSize};

use crate::error::{ensure_non_empty, PhaseError};

/// Map a phase to an 8-bit intensity.
///
/// `[−π, π]` maps linearly onto `[0, 255]`, truncating towards zero. Values
/// outside the range saturate and `NaN` maps to 0.
///
/// # Examples
///
/// ```
/// use fringe_phase::render::phase_to_intensity;
///
/// assert_eq!(phase_to_intensity(-std::f64::consts::PI), 0);
/// assert_eq!(phase_to_intensity(0.0), 127);
/// assert_eq!(phase_to_intensity(std::f64::consts::PI), 255);
/// ```
pub fn phase_to_intensity(phase: f64) -> u8 {
    if phase.is_nan() {
        return 0;
    }
    ((phase + PI) / TAU * 255.0).trunc().clamp(0.0, 255.0) as u8
}

/// Render a phase line into one row of an otherwise black image.
///
/// # Arguments
///
/// * `line` - One phase per column.
/// * `size` - Size of the rendered image.
/// * `row` - The row receiving the line.
///
/// # Errors
///
/// The line must span the image width and the row must be inside the image.
pub fn render_phase_line(
    line: &[f64],
    size: ImageSize,
    row: usize,
) -> Result<Image<u8, 1>, PhaseError> {
    ensure_non_empty(size)?;
    if line.len() != size.width {
        return Err(PhaseError::LineLengthMismatch(line.len(), size.width));
    }
    if row >= size.height {
        return Err(PhaseError::RowOutOfBounds(row, size.height));
    }

    let mut plot = Image::from_size_val(size, 0u8)?;
    plot.row_mut(row)?
        .iter_mut()
        .zip(line)
        .for_each(|(pixel, &phase)| *pixel = phase_to_intensity(phase));

    Ok(plot)
}
