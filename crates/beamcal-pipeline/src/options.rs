//! Options for calibration trials and runs.

use beamcal_core::{Real, Vec2};
use serde::{Deserialize, Serialize};

/// Session-wide calibrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratorOptions {
    /// Minimum acceptable correlation quality. Below this the trial fails
    /// with `NoOverlap`. The default of 0.15 puts the correctable initial
    /// angle error at roughly 130 degrees for an overlap hint of 0.5, which
    /// matches what was observed on the instrument.
    pub min_quality: Real,
    /// Negate the y component when converting pixel vectors to physical
    /// commands. Needed on instruments whose shift frame has its origin at
    /// the bottom-left while image rows count from the top.
    pub reflect_y: bool,
}

impl Default for CalibratorOptions {
    fn default() -> Self {
        Self {
            min_quality: 0.15,
            reflect_y: false,
        }
    }
}

/// Options for the operator-style [`calibrate`](crate::Calibrator::calibrate)
/// loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Trial translation in image pixels. Its magnitude should be chosen
    /// together with `overlap_hint`; a typical choice is
    /// `image_size * (1 - overlap_hint)` along one axis.
    pub pixel_shift: Vec2,
    /// Physical pixel size (metres per pixel) at the current magnification.
    pub pixel_size_m: Real,
    /// Expected remaining image overlap after the shift, in `(0, 1]`.
    pub overlap_hint: Real,
    /// Stop after this many trials even if not settled.
    pub max_trials: usize,
    /// Stop once a trial's correction falls below this angle (radians).
    pub angle_tol_rad: Real,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pixel_shift: Vec2::new(0.0, 0.0),
            pixel_size_m: 0.0,
            overlap_hint: 0.5,
            max_trials: 5,
            angle_tol_rad: 0.5f64.to_radians(),
        }
    }
}
