//! Template-matching implementation of the `Correlator` trait.

use crate::binning::bin_image;
use crate::filter::{preprocess, PreprocessOptions};
use crate::template::{crop, overlap_window};
use crate::xcorr::match_template;
use beamcal_core::{
    CalibrationError, CorrelationResult, Correlator, Frame, Real, SearchHint, Vec2,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration for [`TemplateCorrelator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMatchOptions {
    /// Binning applied before matching. Higher is faster but quantises the
    /// realized shift (and hence the angle) to the bin factor.
    pub bin_factor: u32,
    /// Blur/binarise chain applied to both frames after binning.
    pub preprocess: PreprocessOptions,
    /// Minimum fraction of the template that must overlap the search image
    /// for a placement to count.
    pub min_overlap_frac: Real,
}

impl Default for TemplateMatchOptions {
    fn default() -> Self {
        Self {
            bin_factor: 4,
            preprocess: PreprocessOptions::default(),
            min_overlap_frac: 0.1,
        }
    }
}

/// Measures the realized field displacement between two frames by matching
/// the expected-overlap template of the baseline frame inside the post-move
/// frame.
///
/// The pipeline is bin, preprocess, crop the expected-overlap window, then
/// full-search normalised cross-correlation. The returned quality is the
/// peak NCC score.
#[derive(Debug, Clone, Default)]
pub struct TemplateCorrelator {
    /// Matching configuration.
    pub options: TemplateMatchOptions,
}

impl TemplateCorrelator {
    /// Correlator with the given options.
    pub fn new(options: TemplateMatchOptions) -> Self {
        Self { options }
    }
}

impl Correlator for TemplateCorrelator {
    fn correlate(
        &mut self,
        baseline: &Frame,
        moved: &Frame,
        hint: &SearchHint,
    ) -> Result<CorrelationResult, CalibrationError> {
        if !(hint.overlap_hint > 0.0 && hint.overlap_hint <= 1.0) {
            return Err(CalibrationError::Correlation(format!(
                "overlap hint must be in (0, 1], got {}",
                hint.overlap_hint
            )));
        }
        if baseline.width() != moved.width() || baseline.height() != moved.height() {
            return Err(CalibrationError::Correlation(format!(
                "frame size mismatch: {}x{} vs {}x{}",
                baseline.width(),
                baseline.height(),
                moved.width(),
                moved.height()
            )));
        }

        let factor = self.options.bin_factor;
        let base_binned = bin_image(&baseline.data, factor)?;
        let moved_binned = bin_image(&moved.data, factor)?;
        let desired_binned = hint.desired_shift_px / factor as Real;

        let base_proc = preprocess(&base_binned, &self.options.preprocess);
        let moved_proc = preprocess(&moved_binned, &self.options.preprocess);

        let window = overlap_window(base_proc.nrows(), base_proc.ncols(), &desired_binned)?;
        let template = crop(&base_proc, &window);
        let peak = match_template(&moved_proc, &template, self.options.min_overlap_frac)?;

        // The template's top-left sits at (x0, y0) in baseline coordinates;
        // finding it at the peak offset in the moved frame means the field
        // travelled by the difference.
        let shift_binned = Vec2::new(
            window.x0 as Real - peak.offset_x as Real,
            window.y0 as Real - peak.offset_y as Real,
        );
        let shift_px = shift_binned * factor as Real;
        debug!(
            "template match: peak at ({}, {}) score {:.3}, realized shift ({:.1}, {:.1}) px",
            peak.offset_x, peak.offset_y, peak.score, shift_px.x, shift_px.y
        );

        Ok(CorrelationResult {
            shift_px,
            quality: peak.score,
        })
    }
}
