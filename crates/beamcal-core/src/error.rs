//! Error taxonomy for calibration operations.
//!
//! All failures surface to the caller immediately; there is no internal
//! retry loop. Note that a [`CalibrationError::NoOverlap`] can be reported
//! after the instrument has already moved; the partial displacement is an
//! accepted risk of the procedure, not something this crate hides.

use crate::{Real, ShiftTarget};
use thiserror::Error;

/// Errors that can occur while calibrating or applying an estimate.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Malformed caller-supplied parameters. Raised before any capture or
    /// move, so the instrument is untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Cross-correlation found no usable peak: the commanded angle error was
    /// too large relative to the overlap hint and the frames share no common
    /// region. The instrument may already have moved. Remedy: reduce the
    /// pixel shift magnitude or increase the overlap hint, then try again.
    #[error(
        "no usable correlation peak for desired shift ({dx:.1}, {dy:.1}) px \
         at overlap hint {overlap_hint:.2}; reduce the shift or raise the hint"
    )]
    NoOverlap {
        /// Desired pixel shift of the failed trial (x component).
        dx: Real,
        /// Desired pixel shift of the failed trial (y component).
        dy: Real,
        /// Overlap hint the trial was run with.
        overlap_hint: Real,
    },

    /// `apply` was invoked before any successful trial for this target.
    #[error("rotation estimate for {0} has not converged yet")]
    NotConverged(ShiftTarget),

    /// The instrument collaborator reported a failure.
    #[error("microscope error: {0}")]
    Microscope(String),

    /// The correlation engine could not be run at all (degenerate frames,
    /// bad binning, template outside the image).
    #[error("correlation error: {0}")]
    Correlation(String),
}
