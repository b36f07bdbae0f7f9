//! Gray-coded fringe-order images: encoding and decoding.
//!
//! Image `i` of a sequence carries bit `i` of the gray code, so image 0 holds
//! the least significant bit.

use fringe_image::{Image, ImageSize};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ensure_non_empty, ensure_same_size, PhaseError},
    parallel,
};

/// Number of gray-code images in the default acquisition.
pub const DEFAULT_GRAY_CODE_BITS: usize = 7;

/// Largest number of bits a fringe order can hold.
pub const MAX_GRAY_CODE_BITS: usize = 31;

/// Convert binary value to Gray code.
pub fn binary_to_gray(binary: u32) -> u32 {
    binary ^ (binary >> 1)
}

/// Convert Gray code back to binary.
pub fn gray_to_binary(gray: u32) -> u32 {
    let mut binary = gray;
    let mut shift = 1;
    while shift < 32 {
        binary ^= binary >> shift;
        shift *= 2;
    }
    binary
}

/// Decode a fringe order from its gray-code bits.
///
/// `bits[i]` is bit `i` of the gray code. Bits are shifted in from the most to
/// the least significant one and the resulting gray value is converted to
/// binary.
///
/// # Examples
///
/// ```
/// use fringe_phase::gray_code::{binary_to_gray, decode_bits};
///
/// let gray = binary_to_gray(5);
/// let bits = (0..7).map(|i| (gray >> i) & 1 == 1).collect::<Vec<_>>();
/// assert_eq!(decode_bits(&bits), 5);
/// ```
pub fn decode_bits(bits: &[bool]) -> u32 {
    let gray = bits
        .iter()
        .rev()
        .fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit));
    gray_to_binary(gray)
}

/// How fringe orders are sampled from the gray-code images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FringeSampling {
    /// Decode one pixel per row at `sample_column` and write the order at
    /// columns `0, stride, 2·stride, …`. The other columns stay 0.
    Sparse {
        /// Distance between populated columns.
        stride: usize,
        /// Column the gray-code bits are read from.
        sample_column: usize,
    },
    /// Decode every pixel from its own bits.
    Dense,
}

impl Default for FringeSampling {
    fn default() -> Self {
        FringeSampling::Sparse {
            stride: 10,
            sample_column: 0,
        }
    }
}

impl FringeSampling {
    /// Check the policy against the image width.
    pub fn validate(&self, width: usize) -> Result<(), PhaseError> {
        if let FringeSampling::Sparse {
            stride,
            sample_column,
        } = *self
        {
            if stride == 0 {
                return Err(PhaseError::InvalidStride);
            }
            if sample_column >= width {
                return Err(PhaseError::SampleColumnOutOfBounds(sample_column, width));
            }
        }
        Ok(())
    }
}

fn validate_bits(num_bits: usize) -> Result<(), PhaseError> {
    if num_bits == 0 || num_bits > MAX_GRAY_CODE_BITS {
        return Err(PhaseError::InvalidGrayCodeBits(num_bits));
    }
    Ok(())
}

// gray value at a pixel, bits gathered from the most significant image down
fn decode_pixel(codes: &[&[u8]], idx: usize, bit_threshold: u8) -> u32 {
    let gray = codes
        .iter()
        .rev()
        .fold(0u32, |acc, code| (acc << 1) | u32::from(code[idx] > bit_threshold));
    gray_to_binary(gray)
}

/// Decode a fringe-order field from gray-code images.
///
/// # Arguments
///
/// * `codes` - The gray-code images, image `i` carrying bit `i`.
/// * `sampling` - The sampling policy.
/// * `bit_threshold` - A pixel is a set bit when its value is above this.
///
/// # Returns
///
/// The fringe-order field, same size as the images.
///
/// # Errors
///
/// No images, more than 31 images, mismatched sizes or an invalid sampling
/// policy.
pub fn decode_fringe_order(
    codes: &[Image<u8, 1>],
    sampling: FringeSampling,
    bit_threshold: u8,
) -> Result<Image<u32, 1>, PhaseError> {
    validate_bits(codes.len())?;

    let size = codes[0].size();
    ensure_non_empty(size)?;
    for code in &codes[1..] {
        ensure_same_size(size, code.size())?;
    }
    sampling.validate(size.width)?;

    let planes = codes.iter().map(|c| c.as_slice()).collect::<Vec<_>>();
    let cols = size.width;
    let mut orders = Image::from_size_val(size, 0u32)?;

    match sampling {
        FringeSampling::Sparse {
            stride,
            sample_column,
        } => {
            parallel::par_rows_mut(&mut orders, |y, row| {
                let order = decode_pixel(&planes, y * cols + sample_column, bit_threshold);
                row.iter_mut().step_by(stride).for_each(|v| *v = order);
            });
        }
        FringeSampling::Dense => {
            parallel::par_rows_mut(&mut orders, |y, row| {
                for (x, v) in row.iter_mut().enumerate() {
                    *v = decode_pixel(&planes, y * cols + x, bit_threshold);
                }
            });
        }
    }

    log::info!(
        "decoded fringe orders from {} gray-code images ({:?})",
        codes.len(),
        sampling
    );

    Ok(orders)
}

/// Fringe order of a column for a given sinusoid period.
pub fn column_fringe_order(col: usize, period: f64) -> u32 {
    (col as f64 / period).floor() as u32
}

/// Generate the gray-code images encoding the fringe order of every column.
///
/// Column `col` encodes `floor(col / period)`; pixels are 255 for a set bit
/// and 0 otherwise, identical on every row.
///
/// # Errors
///
/// Invalid size, bit count or period, or too few bits for the largest order.
pub fn encode_gray_code_patterns(
    size: ImageSize,
    num_bits: usize,
    period: f64,
) -> Result<Vec<Image<u8, 1>>, PhaseError> {
    ensure_non_empty(size)?;
    validate_bits(num_bits)?;
    if !period.is_finite() || period <= 0.0 {
        return Err(PhaseError::InvalidPeriod(period));
    }

    let max_order = column_fringe_order(size.width - 1, period);
    if u64::from(max_order) >= 1u64 << num_bits {
        return Err(PhaseError::InsufficientGrayCodeBits {
            bits: num_bits,
            max_order,
        });
    }

    let grays = (0..size.width)
        .map(|col| binary_to_gray(column_fringe_order(col, period)))
        .collect::<Vec<_>>();

    (0..num_bits)
        .map(|bit| -> Result<Image<u8, 1>, PhaseError> {
            let profile = grays
                .iter()
                .map(|gray| if (gray >> bit) & 1 == 1 { 255u8 } else { 0u8 })
                .collect::<Vec<_>>();
            let mut image = Image::from_size_val(size, 0u8)?;
            parallel::par_rows_mut(&mut image, |_, row| row.copy_from_slice(&profile));
            Ok(image)
        })
        .collect()
}
