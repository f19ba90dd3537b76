//! Image-processing primitives for shift calibration.
//!
//! The chain implemented here measures how far the field of view moved
//! between two frames:
//!
//! 1. [`binning::bin_image`]: block-average binning to cut correlation cost,
//! 2. [`filter::preprocess`]: Gaussian blur + Yen-threshold binarisation,
//! 3. [`template::overlap_window`]: crop the part of the baseline frame
//!    expected to stay in view after the desired shift,
//! 4. [`xcorr::match_template`]: full 2D normalised cross-correlation peak
//!    search,
//! 5. [`TemplateCorrelator`]: the above wired into the
//!    [`beamcal_core::Correlator`] trait.
//!
//! Binning trades peak-location precision for speed: realized shifts come
//! back quantised to the bin factor, which widens the angle uncertainty
//! accordingly.

pub mod binning;
pub mod filter;
pub mod matcher;
pub mod template;
pub mod xcorr;

pub use matcher::{TemplateCorrelator, TemplateMatchOptions};

use thiserror::Error;

/// Errors from the correlation primitives.
#[derive(Debug, Error)]
pub enum CorrelateError {
    /// An input image had a zero dimension.
    #[error("empty image ({0} x {1})")]
    EmptyImage(usize, usize),
    /// Bin factor of zero, or larger than the image.
    #[error("bin factor {factor} unusable for a {rows} x {cols} image")]
    BadBinFactor {
        /// Requested factor.
        factor: u32,
        /// Image rows.
        rows: usize,
        /// Image columns.
        cols: usize,
    },
    /// The desired shift leaves no overlap window inside the image.
    #[error("desired shift ({0:.1}, {1:.1}) px leaves no overlap window")]
    NoWindow(f64, f64),
    /// No candidate offset satisfied the minimum-overlap requirement.
    #[error("no correlation offset with sufficient overlap")]
    NoPeak,
}

impl From<CorrelateError> for beamcal_core::CalibrationError {
    fn from(err: CorrelateError) -> Self {
        beamcal_core::CalibrationError::Correlation(err.to_string())
    }
}
