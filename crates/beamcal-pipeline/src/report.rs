//! Serialisable session summary.

use anyhow::{Context, Result};
use beamcal_core::{Real, RotationEstimate, ShiftTarget, TrialVector};
use serde::{Deserialize, Serialize};

/// Snapshot of one target's calibration session, suitable for archiving by
/// the caller. The calibrator itself never persists anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationReport {
    /// Which subsystem was calibrated.
    pub target: ShiftTarget,
    /// Whether any trial succeeded.
    pub converged: bool,
    /// Fitted angle in radians, when converged.
    pub angle_rad: Option<Real>,
    /// All trials, oldest first.
    pub trials: Vec<TrialVector>,
    /// Mean of the trial magnitude ratios (diagnostic; values above 1 on
    /// the stage are a known, unresolved observation).
    pub mean_magnitude_ratio: Option<Real>,
}

impl CalibrationReport {
    /// Summarise an estimate.
    pub fn from_estimate(estimate: &RotationEstimate) -> Self {
        let ratios = estimate.magnitude_ratios();
        let mean_magnitude_ratio = if ratios.is_empty() {
            None
        } else {
            Some(ratios.iter().sum::<Real>() / ratios.len() as Real)
        };
        Self {
            target: estimate.target(),
            converged: estimate.is_converged(),
            angle_rad: estimate.angle_rad(),
            trials: estimate.history().to_vec(),
            mean_magnitude_ratio,
        }
    }

    /// Pretty-printed JSON for archiving.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialising calibration report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamcal_core::Vec2;

    #[test]
    fn empty_session_report() {
        let report = CalibrationReport::from_estimate(&RotationEstimate::new(ShiftTarget::Stage));
        assert!(!report.converged);
        assert!(report.angle_rad.is_none());
        assert!(report.trials.is_empty());
        assert!(report.mean_magnitude_ratio.is_none());
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut estimate = RotationEstimate::new(ShiftTarget::Beam);
        estimate.record_trial(TrialVector {
            desired_px: Vec2::new(10.0, 0.0),
            command_m: Vec2::new(1e-8, 0.0),
            realized_px: Vec2::new(9.0, 1.0),
            angle_correction_rad: 0.1,
            magnitude_ratio: 0.905,
            quality: 0.8,
            baseline_frame: 0,
            moved_frame: 1,
        });
        let report = CalibrationReport::from_estimate(&estimate);
        let json = report.to_json().unwrap();
        let restored: CalibrationReport = serde_json::from_str(&json).unwrap();
        assert!(restored.converged);
        assert_eq!(restored.trials.len(), 1);
        assert!((restored.mean_magnitude_ratio.unwrap() - 0.905).abs() < 1e-12);
    }
}
