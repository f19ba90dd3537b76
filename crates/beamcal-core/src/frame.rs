//! Captured images with acquisition metadata.

use crate::{ImageData, Real};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// A single captured image plus the metadata needed to interpret it.
///
/// `pixel_size_m` is the physical extent of one pixel (metres), which
/// depends on magnification; `bin_factor` records any on-detector binning
/// already applied to `data`. `index` is a session-unique ordinal used to
/// pair the before/after frames of a trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Greyscale intensity data, row-major `(row = y, col = x)`.
    pub data: ImageData,
    /// Physical size of one pixel in metres.
    pub pixel_size_m: Real,
    /// Binning factor already applied at acquisition time.
    pub bin_factor: u32,
    /// Session-unique ordinal index (capture order).
    pub index: u64,
}

impl Frame {
    /// Build a frame, validating the metadata.
    pub fn new(data: ImageData, pixel_size_m: Real, bin_factor: u32, index: u64) -> Result<Self> {
        ensure!(data.nrows() > 0 && data.ncols() > 0, "empty frame data");
        ensure!(
            pixel_size_m.is_finite() && pixel_size_m > 0.0,
            "pixel size must be positive, got {pixel_size_m}"
        );
        ensure!(bin_factor >= 1, "bin factor must be at least 1");
        Ok(Self {
            data,
            pixel_size_m,
            bin_factor,
            index,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_metadata() {
        let data = ImageData::zeros(4, 6);
        let frame = Frame::new(data.clone(), 1e-9, 1, 0).unwrap();
        assert_eq!(frame.width(), 6);
        assert_eq!(frame.height(), 4);

        assert!(Frame::new(ImageData::zeros(0, 0), 1e-9, 1, 0).is_err());
        assert!(Frame::new(data.clone(), 0.0, 1, 0).is_err());
        assert!(Frame::new(data, 1e-9, 0, 0).is_err());
    }
}
