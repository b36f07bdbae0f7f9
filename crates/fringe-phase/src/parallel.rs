use rayon::prelude::*;

use fringe_image::Image;

/// Apply a function to each pixel in the image in parallel.
///
/// Rows are distributed over the global rayon pool; each pixel of `dst` is
/// visited exactly once, paired with the pixel of `src` at the same position.
pub fn par_iter_rows_val<T1, T2, const C: usize>(
    src: &Image<T1, C>,
    dst: &mut Image<T2, C>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let stride = C * src.cols();
    if stride == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(stride)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(stride))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .iter()
                .zip(dst_chunk.iter_mut())
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel in the image in parallel with two values.
pub fn par_iter_rows_val_two<T1, T2, T3, const C: usize>(
    src1: &Image<T1, C>,
    src2: &Image<T2, C>,
    dst: &mut Image<T3, C>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
    T3: Send + Sync,
{
    let stride = C * src1.cols();
    if stride == 0 {
        return;
    }

    src1.as_slice()
        .par_chunks_exact(stride)
        .zip(src2.as_slice().par_chunks_exact(stride))
        .zip(dst.as_slice_mut().par_chunks_exact_mut(stride))
        .for_each(|((src1_chunk, src2_chunk), dst_chunk)| {
            src1_chunk
                .iter()
                .zip(src2_chunk.iter())
                .zip(dst_chunk.iter_mut())
                .for_each(|((src1_pixel, src2_pixel), dst_pixel)| {
                    f(src1_pixel, src2_pixel, dst_pixel);
                });
        });
}

/// Fill the rows of an image in parallel, the closure receives the row index.
pub fn par_rows_mut<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let stride = C * dst.cols();
    if stride == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

/// Fallible version of [`par_rows_mut`].
///
/// Every row is visited. When several rows fail, the error of the lowest
/// row index is returned.
pub fn try_par_rows_mut<T, E, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) -> Result<(), E> + Send + Sync,
) -> Result<(), E>
where
    T: Send + Sync,
    E: Send,
{
    let stride = C * dst.cols();
    if stride == 0 {
        return Ok(());
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .map(|(y, row)| f(y, row))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
