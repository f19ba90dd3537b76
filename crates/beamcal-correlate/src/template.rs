//! Expected-overlap template extraction.
//!
//! The template is the part of the baseline frame that should remain in
//! view after the desired shift: for a pure +x shift this is the right-hand
//! slice of the image, and the general case is the rectangle obtained by
//! intersecting the frame with its desired-shifted copy.

use crate::CorrelateError;
use beamcal_core::{ImageData, Vec2};

/// A rectangular region of an image, `(x0, y0)` top-left inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Left column.
    pub x0: usize,
    /// Top row.
    pub y0: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

/// Compute the expected-overlap window of a `rows x cols` baseline frame
/// for a desired shift (pixels, same resolution as the frame).
///
/// Fails with [`CorrelateError::NoWindow`] when the desired shift moves the
/// entire frame out of view along either axis.
pub fn overlap_window(
    rows: usize,
    cols: usize,
    desired_shift: &Vec2,
) -> Result<Window, CorrelateError> {
    let (x0, width) = axis_window(cols, desired_shift.x)
        .ok_or(CorrelateError::NoWindow(desired_shift.x, desired_shift.y))?;
    let (y0, height) = axis_window(rows, desired_shift.y)
        .ok_or(CorrelateError::NoWindow(desired_shift.x, desired_shift.y))?;
    Ok(Window {
        x0,
        y0,
        width,
        height,
    })
}

fn axis_window(extent: usize, shift: f64) -> Option<(usize, usize)> {
    let extent_i = extent as i64;
    let shift_i = shift.round() as i64;
    let start = shift_i.max(0);
    let end = (extent_i + shift_i).min(extent_i);
    if end <= start {
        return None;
    }
    Some((start as usize, (end - start) as usize))
}

/// Crop a window out of an image.
pub fn crop(image: &ImageData, window: &Window) -> ImageData {
    image
        .view((window.y0, window.x0), (window.height, window.width))
        .into_owned()
}
