//! Calibration session for stage/beam-shift rotation estimation.
//!
//! [`Calibrator`] drives the external instrument through
//! (move, capture, correlate, estimate, refine) trials and accumulates one
//! [`beamcal_core::RotationEstimate`] per shift target. A trial is atomic
//! from the caller's perspective: either both frames and a correlation
//! result are produced, or an error is reported, in which case the
//! instrument may be left at the post-move position.
//!
//! # Sequencing
//!
//! Everything here is strictly single-threaded. Each trial needs the
//! physical move to finish before the next capture, and the stage and beam
//! share the one physical position, so the two targets must be calibrated
//! in separate, serialized sessions, never interleaved.
//!
//! # Example
//!
//! ```no_run
//! use beamcal_core::synthetic::{simulated_bench, BenchConfig};
//! use beamcal_core::{ShiftTarget, Vec2};
//! use beamcal_pipeline::{Calibrator, RunOptions};
//!
//! # fn main() -> Result<(), beamcal_core::CalibrationError> {
//! let (microscope, correlator, _state) = simulated_bench(BenchConfig::default());
//! let mut calibrator = Calibrator::new(microscope, correlator);
//!
//! let run = RunOptions {
//!     pixel_shift: Vec2::new(19.2, 0.0),
//!     pixel_size_m: 1e-9,
//!     overlap_hint: 0.7,
//!     ..Default::default()
//! };
//! let estimate = calibrator.calibrate(ShiftTarget::Beam, &run)?;
//! println!("beam rotation: {:.2} deg", estimate.angle_rad().unwrap().to_degrees());
//! # Ok(())
//! # }
//! ```

/// The calibration session and its operations.
pub mod calibrator;

/// Option structs for single trials and operator-loop runs.
pub mod options;

/// Serialisable session report.
pub mod report;

pub use calibrator::Calibrator;
pub use options::{CalibratorOptions, RunOptions};
pub use report::CalibrationReport;
