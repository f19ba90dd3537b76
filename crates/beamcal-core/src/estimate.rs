//! Calibration targets, trial records, and the accumulated rotation estimate.

use crate::{
    normalize_angle, rotation_matrix, CalibrationError, Mat2, PhysicalVector, Real, Vec2,
};
use serde::{Deserialize, Serialize};

/// Which physical subsystem a calibration session is fitting.
///
/// Stage and beam rotations are independent: neither the angle nor the scale
/// of one is assumed to carry over to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftTarget {
    /// Mechanical stage shift (metres).
    Stage,
    /// Beam deflector shift (metres).
    Beam,
}

impl std::fmt::Display for ShiftTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftTarget::Stage => write!(f, "stage"),
            ShiftTarget::Beam => write!(f, "beam"),
        }
    }
}

/// Convergence state of a [`RotationEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimateState {
    /// No successful trial yet; the angle is undefined and commands are
    /// issued through the identity rotation.
    Unconverged,
    /// At least one trial correlated with sufficient quality.
    Converged,
}

/// One completed calibration attempt.
///
/// The realized shift is always derived from the same two frames the trial
/// moved between; the frame indices are recorded so the pairing can be
/// audited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialVector {
    /// Requested translation in image pixel space.
    pub desired_px: Vec2,
    /// Physical command actually issued (metres), through the rotation that
    /// was current when the trial started.
    pub command_m: PhysicalVector,
    /// Realized translation measured by cross-correlation (pixels).
    pub realized_px: Vec2,
    /// Signed correction applied to the estimate by this trial (radians).
    pub angle_correction_rad: Real,
    /// `|realized| / |desired|`. Recorded for diagnostics only: the
    /// procedure corrects the angle, never the magnitude, and ratios above 1
    /// have been observed on the stage where physical reasoning predicts
    /// below 1. That discrepancy is unresolved; do not feed this back into
    /// commands.
    pub magnitude_ratio: Real,
    /// Correlation peak quality for this trial.
    pub quality: Real,
    /// Ordinal index of the pre-move frame.
    pub baseline_frame: u64,
    /// Ordinal index of the post-move frame.
    pub moved_frame: u64,
}

/// Accumulated rotation fit for one [`ShiftTarget`].
///
/// Created per target per session, refined by successive trials, and
/// discarded with the session. Persistence, if wanted, is the caller's
/// concern ([`RotationEstimate`] derives serde for that purpose).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationEstimate {
    target: ShiftTarget,
    state: EstimateState,
    angle_rad: Real,
    history: Vec<TrialVector>,
}

impl RotationEstimate {
    /// Fresh, unconverged estimate for a target.
    pub fn new(target: ShiftTarget) -> Self {
        Self {
            target,
            state: EstimateState::Unconverged,
            angle_rad: 0.0,
            history: Vec::new(),
        }
    }

    /// The target this estimate belongs to.
    pub fn target(&self) -> ShiftTarget {
        self.target
    }

    /// Current convergence state.
    pub fn state(&self) -> EstimateState {
        self.state
    }

    /// Whether at least one trial has succeeded.
    pub fn is_converged(&self) -> bool {
        self.state == EstimateState::Converged
    }

    /// Fitted angle in radians, `(-pi, pi]`. `None` until converged.
    pub fn angle_rad(&self) -> Option<Real> {
        match self.state {
            EstimateState::Unconverged => None,
            EstimateState::Converged => Some(self.angle_rad),
        }
    }

    /// Rotation used for the next command: the fitted rotation when
    /// converged, identity otherwise.
    pub fn command_rotation(&self) -> Mat2 {
        match self.state {
            EstimateState::Unconverged => Mat2::identity(),
            EstimateState::Converged => rotation_matrix(self.angle_rad),
        }
    }

    /// Trial history, oldest first.
    pub fn history(&self) -> &[TrialVector] {
        &self.history
    }

    /// Signed correction applied by the most recent trial, if any.
    pub fn last_correction_rad(&self) -> Option<Real> {
        self.history.last().map(|t| t.angle_correction_rad)
    }

    /// Magnitude ratios of all trials, oldest first (diagnostic).
    pub fn magnitude_ratios(&self) -> Vec<Real> {
        self.history.iter().map(|t| t.magnitude_ratio).collect()
    }

    /// Absorb a successful trial: rotate the estimate by the observed
    /// correction, append to history, and mark the estimate converged.
    pub fn record_trial(&mut self, trial: TrialVector) {
        self.angle_rad = normalize_angle(self.angle_rad + trial.angle_correction_rad);
        self.state = EstimateState::Converged;
        self.history.push(trial);
    }

    /// Map a pixel-space translation into a physical shift command:
    /// `R(angle) * pixel_translation * pixel_size_m`.
    ///
    /// Fails with [`CalibrationError::NotConverged`] before the first
    /// successful trial and [`CalibrationError::InvalidInput`] on a
    /// nonpositive pixel size. Linear in `pixel_translation`.
    pub fn to_physical(
        &self,
        pixel_translation: &Vec2,
        pixel_size_m: Real,
    ) -> Result<PhysicalVector, CalibrationError> {
        if !self.is_converged() {
            return Err(CalibrationError::NotConverged(self.target));
        }
        if !(pixel_size_m.is_finite() && pixel_size_m > 0.0) {
            return Err(CalibrationError::InvalidInput(format!(
                "pixel size must be positive, got {pixel_size_m}"
            )));
        }
        Ok(rotation_matrix(self.angle_rad) * pixel_translation * pixel_size_m)
    }
}
