use std::f64::consts::TAU;

use fringe_image::Image;

use crate::{
    error::{ensure_same_size, PhaseError},
    parallel,
};

/// Absolute phase of one pixel: `wrapped + 2π·order`.
pub fn absolute_phase(wrapped: f64, order: u32) -> f64 {
    wrapped + TAU * order as f64
}

/// Combine wrapped phase and fringe orders along a single row.
///
/// # Arguments
///
/// * `wrapped` - The (locally unwrapped) phase field.
/// * `orders` - The fringe-order field.
/// * `row` - The row to combine.
///
/// # Returns
///
/// One absolute phase per column of `row`.
///
/// # Examples
///
/// ```
/// use fringe_image::Image;
/// use fringe_phase::absolute::absolute_phase_row;
///
/// let wrapped = Image::<f64, 1>::new([2, 1].into(), vec![0.5, -0.5]).unwrap();
/// let orders = Image::<u32, 1>::new([2, 1].into(), vec![1, 0]).unwrap();
///
/// let line = absolute_phase_row(&wrapped, &orders, 0).unwrap();
/// assert_eq!(line, vec![0.5 + std::f64::consts::TAU, -0.5]);
/// ```
pub fn absolute_phase_row(
    wrapped: &Image<f64, 1>,
    orders: &Image<u32, 1>,
    row: usize,
) -> Result<Vec<f64>, PhaseError> {
    ensure_same_size(wrapped.size(), orders.size())?;
    if row >= wrapped.height() {
        return Err(PhaseError::RowOutOfBounds(row, wrapped.height()));
    }

    let line = wrapped
        .row(row)?
        .iter()
        .zip(orders.row(row)?)
        .map(|(&phase, &order)| absolute_phase(phase, order))
        .collect();

    Ok(line)
}

/// Combine wrapped phase and fringe orders over the whole field.
///
/// The pipeline only inspects a single row; this is the full-field
/// counterpart of [`absolute_phase_row`].
pub fn absolute_phase_field(
    wrapped: &Image<f64, 1>,
    orders: &Image<u32, 1>,
    dst: &mut Image<f64, 1>,
) -> Result<(), PhaseError> {
    ensure_same_size(wrapped.size(), orders.size())?;
    ensure_same_size(wrapped.size(), dst.size())?;

    parallel::par_iter_rows_val_two(wrapped, orders, dst, |&phase, &order, out| {
        *out = absolute_phase(phase, order);
    });

    Ok(())
}
