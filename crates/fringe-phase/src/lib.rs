#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// absolute phase from wrapped phase and fringe orders.
pub mod absolute;

/// Error types for the phase module.
pub mod error;

/// gray-code fringe-order encoding and decoding.
pub mod gray_code;

/// module containing parallization utilities.
pub mod parallel;

/// phase-shifted sinusoidal pattern synthesis.
pub mod pattern;

/// rendering of phase lines for inspection.
pub mod render;

/// three-step wrapped phase estimation and temporal unwrapping.
pub mod wrapped;

pub use crate::error::PhaseError;
