//! Collaborator traits at the instrument seam.
//!
//! The calibrator drives two external capabilities: an instrument that can
//! capture frames and issue physical shifts, and a correlation engine that
//! measures the realized pixel displacement between two frames. Both are
//! traits so tests can substitute the deterministic simulated bench in
//! [`crate::synthetic`].

use crate::{CalibrationError, Frame, PhysicalVector, Real, ShiftTarget, Vec2};
use serde::{Deserialize, Serialize};

/// Caller guidance handed to a [`Correlator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHint {
    /// The pixel translation the trial asked for (full-resolution pixels).
    pub desired_shift_px: Vec2,
    /// Fraction of the image the caller expects to still overlap after the
    /// move, in `(0, 1]`. Bounds the usable search region and therefore the
    /// maximum correctable angle error. Advisory beyond range validation:
    /// the desired shift already fixes the expected-overlap geometry, so
    /// implementations may derive tighter search bounds from the hint or
    /// ignore it.
    pub overlap_hint: Real,
}

/// Result of one correlation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Realized displacement of the field of view, in full-resolution image
    /// pixels (same convention as [`SearchHint::desired_shift_px`]).
    pub shift_px: Vec2,
    /// Peak quality in `[0, 1]`; the calibrator rejects trials below its
    /// configured minimum.
    pub quality: Real,
}

/// The physical instrument: image acquisition plus stage and beam actuation.
///
/// Moves are stateful and not idempotent; every call physically displaces
/// the system. Implementations are driven strictly sequentially; the
/// calibrator never overlaps a capture with a move.
pub trait Microscope {
    /// Acquire an image at the current position.
    fn capture_frame(&mut self) -> Result<Frame, CalibrationError>;

    /// Shift the mechanical stage by a physical vector (metres).
    fn move_stage(&mut self, shift: &PhysicalVector) -> Result<(), CalibrationError>;

    /// Shift the beam deflectors by a physical vector (metres).
    fn move_beam(&mut self, shift: &PhysicalVector) -> Result<(), CalibrationError>;

    /// Return the given subsystem to its session reference position.
    ///
    /// Used between trials of the operator loop, mirroring the procedure of
    /// re-homing before each attempt.
    fn reset_shift(&mut self, target: ShiftTarget) -> Result<(), CalibrationError>;

    /// Dispatch a shift to the requested subsystem.
    fn shift(
        &mut self,
        target: ShiftTarget,
        amount: &PhysicalVector,
    ) -> Result<(), CalibrationError> {
        match target {
            ShiftTarget::Stage => self.move_stage(amount),
            ShiftTarget::Beam => self.move_beam(amount),
        }
    }
}

/// The correlation engine measuring image displacement between two frames.
pub trait Correlator {
    /// Locate the displacement of `moved` relative to `baseline`.
    ///
    /// Returns the best peak found together with its quality; deciding
    /// whether that quality is usable is the caller's job. Fails with
    /// [`CalibrationError::Correlation`] only when the inputs cannot be
    /// correlated at all.
    fn correlate(
        &mut self,
        baseline: &Frame,
        moved: &Frame,
        hint: &SearchHint,
    ) -> Result<CorrelationResult, CalibrationError>;
}
