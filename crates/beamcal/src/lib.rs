//! High-level entry crate for the `beamcal` toolbox.
//!
//! `beamcal` calibrates the rotation between image pixel space and the
//! shift-command frames of a scanned-probe microscope, one fit for the
//! mechanical stage and one for the beam deflectors, by commanding trial
//! shifts and cross-correlating the before/after images.
//!
//! The workspace splits into:
//! - [`mod@core`] (`beamcal-core`): types, traits, errors, simulated bench,
//! - [`correlate`] (`beamcal-correlate`): binning, preprocessing, template
//!   matching,
//! - [`pipeline`] (`beamcal-pipeline`): the calibration session.
//!
//! # Example
//!
//! ```no_run
//! use beamcal::core::synthetic::{simulated_bench, BenchConfig};
//! use beamcal::core::{ShiftTarget, Vec2};
//! use beamcal::correlate::TemplateCorrelator;
//! use beamcal::pipeline::{Calibrator, RunOptions};
//!
//! # fn main() -> Result<(), beamcal::core::CalibrationError> {
//! // On the instrument you would implement `Microscope` over the vendor
//! // API; here the simulated bench stands in.
//! let (microscope, _oracle, _state) = simulated_bench(BenchConfig {
//!     image_size: 256,
//!     render_frames: true,
//!     ..Default::default()
//! });
//!
//! let mut calibrator = Calibrator::new(microscope, TemplateCorrelator::default());
//! let estimate = calibrator.calibrate(
//!     ShiftTarget::Beam,
//!     &RunOptions {
//!         pixel_shift: Vec2::new(76.8, 0.0),
//!         pixel_size_m: 1e-9,
//!         overlap_hint: 0.7,
//!         ..Default::default()
//!     },
//! )?;
//! println!("beam rotation: {:?} rad", estimate.angle_rad());
//!
//! // From here on, pixel-space translations convert to beam commands.
//! let command = calibrator.apply(ShiftTarget::Beam, &Vec2::new(10.0, 0.0), 1e-9)?;
//! println!("move beam by ({:.2e}, {:.2e}) m", command.x, command.y);
//! # Ok(())
//! # }
//! ```

/// Core types, collaborator traits, and the simulated bench.
pub use beamcal_core as core;

/// Image-processing primitives and the template correlator.
pub use beamcal_correlate as correlate;

/// The calibration session.
pub use beamcal_pipeline as pipeline;

pub use beamcal_core::{
    CalibrationError, EstimateState, Frame, RotationEstimate, ShiftTarget, TrialVector,
};
pub use beamcal_correlate::TemplateCorrelator;
pub use beamcal_pipeline::{CalibrationReport, Calibrator, CalibratorOptions, RunOptions};
