//! Core types and collaborator traits for `beamcal`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Mat2`, `ImageData`),
//! - the captured-image type ([`Frame`]),
//! - calibration state ([`RotationEstimate`], [`TrialVector`], [`ShiftTarget`]),
//! - the error taxonomy ([`CalibrationError`]),
//! - collaborator traits for the instrument seam ([`Microscope`], [`Correlator`]),
//! - a deterministic simulated bench ([`synthetic`]) for tests and examples.
//!
//! Three coordinate systems are kept distinct throughout:
//! image pixel space, beam-shift space (metres), and stage-shift space
//! (metres). The stage and beam rotations are fitted independently and never
//! assumed to share an angle or a scale.

/// Linear algebra type aliases and angle helpers.
pub mod math;

/// Captured images with acquisition metadata.
pub mod frame;

/// Calibration targets, trials, and the accumulated rotation estimate.
pub mod estimate;

/// Error taxonomy shared across the workspace.
pub mod error;

/// Collaborator traits: the instrument and the correlation engine.
pub mod traits;

/// Deterministic synthetic specimen and simulated instrument bench.
pub mod synthetic;

pub use error::CalibrationError;
pub use estimate::{EstimateState, RotationEstimate, ShiftTarget, TrialVector};
pub use frame::Frame;
pub use math::*;
pub use traits::{CorrelationResult, Correlator, Microscope, SearchHint};
