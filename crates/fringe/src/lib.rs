//! Structured-light phase recovery.
//!
//! Synthesizes phase-shifted fringe patterns, estimates their wrapped phase
//! with the three-step formula and lifts it to an absolute phase with
//! gray-coded fringe orders.

#[doc(inline)]
pub use fringe_image as image;

#[doc(inline)]
pub use fringe_io as io;

#[doc(inline)]
pub use fringe_phase as phase;

/// scan configuration.
pub mod config;

/// file-backed phase recovery pipeline.
pub mod pipeline;

pub use crate::config::ScanConfig;
pub use crate::pipeline::{FailureKind, PipelineError, ScanOutput};
