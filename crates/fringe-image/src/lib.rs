#![deny(missing_docs)]
//! Image types for fringe intensity, phase and fringe-order fields

/// image representation for phase recovery purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
