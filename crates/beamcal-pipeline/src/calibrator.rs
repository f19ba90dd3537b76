//! The calibration session.

use crate::options::{CalibratorOptions, RunOptions};
use crate::report::CalibrationReport;
use beamcal_core::{
    signed_angle, CalibrationError, Correlator, Mat2, Microscope, PhysicalVector, Real,
    RotationEstimate, SearchHint, ShiftTarget, TrialVector, Vec2,
};
use log::{debug, info};

/// Drives trial shifts against the instrument and accumulates a rotation
/// estimate per target.
///
/// The calibrator holds the only handles to the instrument and the
/// correlation engine for the duration of a session, and every operation
/// takes `&mut self`, so trials cannot overlap. Stage and beam estimates
/// are fully independent; the physical position is the only state they
/// share, which is why the two sessions must run one after the other.
#[derive(Debug)]
pub struct Calibrator<M: Microscope, C: Correlator> {
    microscope: M,
    correlator: C,
    options: CalibratorOptions,
    stage: RotationEstimate,
    beam: RotationEstimate,
}

impl<M: Microscope, C: Correlator> Calibrator<M, C> {
    /// New session with default options.
    pub fn new(microscope: M, correlator: C) -> Self {
        Self::with_options(microscope, correlator, CalibratorOptions::default())
    }

    /// New session with explicit options.
    pub fn with_options(microscope: M, correlator: C, options: CalibratorOptions) -> Self {
        Self {
            microscope,
            correlator,
            options,
            stage: RotationEstimate::new(ShiftTarget::Stage),
            beam: RotationEstimate::new(ShiftTarget::Beam),
        }
    }

    /// Current estimate for a target.
    pub fn estimate(&self, target: ShiftTarget) -> &RotationEstimate {
        match target {
            ShiftTarget::Stage => &self.stage,
            ShiftTarget::Beam => &self.beam,
        }
    }

    fn estimate_mut(&mut self, target: ShiftTarget) -> &mut RotationEstimate {
        match target {
            ShiftTarget::Stage => &mut self.stage,
            ShiftTarget::Beam => &mut self.beam,
        }
    }

    /// Run one calibration trial: capture, move, capture, correlate, refine.
    ///
    /// The commanded move goes through the current rotation estimate
    /// (identity before the first success), the realized shift is measured
    /// by cross-correlation between exactly the two frames of this trial,
    /// and the observed angle error rotates the estimate. The magnitude
    /// ratio is recorded but never corrected; ratios above 1 on the stage
    /// are a known, unresolved observation.
    ///
    /// Accuracy notes carried from the instrument: the first trial is
    /// consistently the most accurate (later trials pick up residual
    /// drift, cause unresolved), and binning in the correlator widens the
    /// peak-location uncertainty.
    ///
    /// # Errors
    ///
    /// - [`CalibrationError::InvalidInput`] for a zero pixel shift, a
    ///   nonpositive pixel size, or an overlap hint outside `(0, 1]`;
    ///   raised before anything touches the instrument.
    /// - [`CalibrationError::NoOverlap`] when the correlation peak quality
    ///   falls below the configured minimum, meaning the angle error was too large
    ///   for the overlap hint. Not retried automatically, and the system
    ///   may be left at the post-move position. Reduce the shift or raise
    ///   the hint and try again.
    pub fn estimate_rotation(
        &mut self,
        target: ShiftTarget,
        pixel_shift: Vec2,
        pixel_size_m: Real,
        overlap_hint: Real,
    ) -> Result<RotationEstimate, CalibrationError> {
        validate_trial_inputs(&pixel_shift, pixel_size_m, overlap_hint)?;

        let baseline = self.microscope.capture_frame()?;

        let rotation = self.estimate(target).command_rotation();
        let command = pixel_to_physical(&rotation, &pixel_shift, pixel_size_m, self.options.reflect_y);
        debug!(
            "{target} trial: desired ({:.1}, {:.1}) px -> command ({:.3e}, {:.3e}) m",
            pixel_shift.x, pixel_shift.y, command.x, command.y
        );
        self.microscope.shift(target, &command)?;

        let moved = self.microscope.capture_frame()?;

        let hint = SearchHint {
            desired_shift_px: pixel_shift,
            overlap_hint,
        };
        let correlation = self.correlator.correlate(&baseline, &moved, &hint)?;
        if correlation.quality < self.options.min_quality {
            debug!(
                "{target} trial rejected: quality {:.3} below {:.3}",
                correlation.quality, self.options.min_quality
            );
            return Err(CalibrationError::NoOverlap {
                dx: pixel_shift.x,
                dy: pixel_shift.y,
                overlap_hint,
            });
        }

        let realized = correlation.shift_px;
        let correction = signed_angle(&realized, &pixel_shift);
        let magnitude_ratio = realized.norm() / pixel_shift.norm();
        info!(
            "{target} trial: correction {:.3} deg, magnitude ratio {:.3}, quality {:.3}",
            correction.to_degrees(),
            magnitude_ratio,
            correlation.quality
        );

        let estimate = self.estimate_mut(target);
        estimate.record_trial(TrialVector {
            desired_px: pixel_shift,
            command_m: command,
            realized_px: realized,
            angle_correction_rad: correction,
            magnitude_ratio,
            quality: correlation.quality,
            baseline_frame: baseline.index,
            moved_frame: moved.index,
        });
        Ok(estimate.clone())
    }

    /// Convert a pixel translation into a physical command through the
    /// converged estimate for `target`.
    ///
    /// Pure: no capture, no move. Linear in `pixel_translation`.
    /// Fails with [`CalibrationError::NotConverged`] before the first
    /// successful trial.
    pub fn apply(
        &self,
        target: ShiftTarget,
        pixel_translation: &Vec2,
        pixel_size_m: Real,
    ) -> Result<PhysicalVector, CalibrationError> {
        let estimate = self.estimate(target);
        if !estimate.is_converged() {
            return Err(CalibrationError::NotConverged(target));
        }
        if !(pixel_size_m.is_finite() && pixel_size_m > 0.0) {
            return Err(CalibrationError::InvalidInput(format!(
                "pixel size must be positive, got {pixel_size_m}"
            )));
        }
        Ok(pixel_to_physical(
            &estimate.command_rotation(),
            pixel_translation,
            pixel_size_m,
            self.options.reflect_y,
        ))
    }

    /// Operator-style run: repeat trials, re-homing the target between
    /// them, until a trial's correction settles below the tolerance or the
    /// trial budget is spent.
    ///
    /// Failures are not retried; a `NoOverlap` from any trial aborts the
    /// run, exactly as the manual procedure leaves retry decisions to the
    /// operator.
    pub fn calibrate(
        &mut self,
        target: ShiftTarget,
        run: &RunOptions,
    ) -> Result<RotationEstimate, CalibrationError> {
        if run.max_trials == 0 {
            return Err(CalibrationError::InvalidInput(
                "max_trials must be at least 1".into(),
            ));
        }

        for trial_idx in 0..run.max_trials {
            self.microscope.reset_shift(target)?;
            let estimate = self.estimate_rotation(
                target,
                run.pixel_shift,
                run.pixel_size_m,
                run.overlap_hint,
            )?;
            let correction = estimate
                .last_correction_rad()
                .unwrap_or(0.0);
            if correction.abs() < run.angle_tol_rad {
                info!(
                    "{target} settled after {} trial(s) at {:.2} deg",
                    trial_idx + 1,
                    estimate.angle_rad().unwrap_or(0.0).to_degrees()
                );
                break;
            }
        }
        self.microscope.reset_shift(target)?;
        Ok(self.estimate(target).clone())
    }

    /// Serialisable summary of the session for a target.
    pub fn report(&self, target: ShiftTarget) -> CalibrationReport {
        CalibrationReport::from_estimate(self.estimate(target))
    }

    /// Release the collaborators, consuming the session.
    pub fn into_parts(self) -> (M, C) {
        (self.microscope, self.correlator)
    }
}

fn validate_trial_inputs(
    pixel_shift: &Vec2,
    pixel_size_m: Real,
    overlap_hint: Real,
) -> Result<(), CalibrationError> {
    if !(pixel_shift.x.is_finite() && pixel_shift.y.is_finite()) || pixel_shift.norm() == 0.0 {
        return Err(CalibrationError::InvalidInput(format!(
            "pixel shift must be nonzero and finite, got ({}, {})",
            pixel_shift.x, pixel_shift.y
        )));
    }
    if !(pixel_size_m.is_finite() && pixel_size_m > 0.0) {
        return Err(CalibrationError::InvalidInput(format!(
            "pixel size must be positive, got {pixel_size_m}"
        )));
    }
    if !(overlap_hint > 0.0 && overlap_hint <= 1.0) {
        return Err(CalibrationError::InvalidInput(format!(
            "overlap hint must be in (0, 1], got {overlap_hint}"
        )));
    }
    Ok(())
}

/// `R * px * pixel_size`, with the optional image-to-instrument y flip
/// applied after the rotation.
fn pixel_to_physical(
    rotation: &Mat2,
    pixel_vector: &Vec2,
    pixel_size_m: Real,
    reflect_y: bool,
) -> PhysicalVector {
    let v = rotation * pixel_vector * pixel_size_m;
    if reflect_y {
        Vec2::new(v.x, -v.y)
    } else {
        v
    }
}
