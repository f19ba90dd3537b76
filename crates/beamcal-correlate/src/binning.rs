//! Block-average binning.

use crate::CorrelateError;
use beamcal_core::{ImageData, Real};

/// Bin an image by averaging `factor * factor` blocks.
///
/// Rows and columns that do not fill a whole block are truncated, so any
/// image size works with any factor smaller than the image. Factor 1 is a
/// plain copy.
pub fn bin_image(image: &ImageData, factor: u32) -> Result<ImageData, CorrelateError> {
    let (rows, cols) = (image.nrows(), image.ncols());
    if rows == 0 || cols == 0 {
        return Err(CorrelateError::EmptyImage(rows, cols));
    }
    let k = factor as usize;
    if k == 0 || k > rows || k > cols {
        return Err(CorrelateError::BadBinFactor { factor, rows, cols });
    }
    if k == 1 {
        return Ok(image.clone());
    }

    let out_rows = rows / k;
    let out_cols = cols / k;
    let norm = 1.0 / (k * k) as Real;
    let binned = ImageData::from_fn(out_rows, out_cols, |row, col| {
        let mut sum = 0.0;
        for dy in 0..k {
            for dx in 0..k {
                sum += image[(row * k + dy, col * k + dx)];
            }
        }
        sum * norm
    });
    Ok(binned)
}
