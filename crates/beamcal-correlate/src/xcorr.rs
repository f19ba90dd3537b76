//! Full-search 2D cross-correlation peak location.
//!
//! Scores every candidate placement of the template inside (and partially
//! outside) the search image, like `correlate2d` in full mode, but scores
//! with normalised cross-correlation over the overlapping window so that
//! partial placements are comparable and the peak value doubles as a
//! quality measure in `[0, 1]`.

use crate::CorrelateError;
use beamcal_core::{ImageData, Real};

/// Best correlation peak found by [`match_template`].
#[derive(Debug, Clone, Copy)]
pub struct Peak {
    /// Column of the template's top-left corner in the search image
    /// (may be negative for partial placements).
    pub offset_x: i64,
    /// Row of the template's top-left corner in the search image.
    pub offset_y: i64,
    /// Normalised cross-correlation at the peak, in `[0, 1]` for
    /// non-negative images.
    pub score: Real,
}

/// Locate the placement of `template` inside `image` with the highest
/// normalised cross-correlation.
///
/// Placements whose overlap with the image covers less than
/// `min_overlap_frac` of the template area are skipped; if every placement
/// is skipped the search fails with [`CorrelateError::NoPeak`].
pub fn match_template(
    image: &ImageData,
    template: &ImageData,
    min_overlap_frac: Real,
) -> Result<Peak, CorrelateError> {
    let (img_rows, img_cols) = (image.nrows(), image.ncols());
    let (tpl_rows, tpl_cols) = (template.nrows(), template.ncols());
    if img_rows == 0 || img_cols == 0 {
        return Err(CorrelateError::EmptyImage(img_rows, img_cols));
    }
    if tpl_rows == 0 || tpl_cols == 0 {
        return Err(CorrelateError::EmptyImage(tpl_rows, tpl_cols));
    }

    let min_overlap =
        (((tpl_rows * tpl_cols) as Real * min_overlap_frac).ceil() as usize).max(1);
    let mut best: Option<Peak> = None;

    for offset_y in -(tpl_rows as i64 - 1)..img_rows as i64 {
        // Rows of the template visible at this vertical placement.
        let t_row_start = (-offset_y).max(0) as usize;
        let t_row_end = (img_rows as i64 - offset_y).min(tpl_rows as i64) as usize;
        let visible_rows = t_row_end - t_row_start;

        for offset_x in -(tpl_cols as i64 - 1)..img_cols as i64 {
            let t_col_start = (-offset_x).max(0) as usize;
            let t_col_end = (img_cols as i64 - offset_x).min(tpl_cols as i64) as usize;
            let visible_cols = t_col_end - t_col_start;

            if visible_rows * visible_cols < min_overlap {
                continue;
            }

            let mut cross = 0.0;
            let mut tpl_energy = 0.0;
            let mut img_energy = 0.0;
            for t_row in t_row_start..t_row_end {
                let i_row = (t_row as i64 + offset_y) as usize;
                for t_col in t_col_start..t_col_end {
                    let i_col = (t_col as i64 + offset_x) as usize;
                    let t = template[(t_row, t_col)];
                    let p = image[(i_row, i_col)];
                    cross += t * p;
                    tpl_energy += t * t;
                    img_energy += p * p;
                }
            }

            let denom = (tpl_energy * img_energy).sqrt();
            if denom <= 0.0 {
                continue;
            }
            let score = cross / denom;
            if best.map_or(true, |b| score > b.score) {
                best = Some(Peak {
                    offset_x,
                    offset_y,
                    score,
                });
            }
        }
    }

    best.ok_or(CorrelateError::NoPeak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamcal_core::synthetic::SpecimenMap;

    #[test]
    fn finds_an_interior_template_exactly() {
        let map = SpecimenMap::new(11);
        let image = map.window(0, 0, 24);
        let template = image.view((5, 9), (10, 8)).into_owned();
        let peak = match_template(&image, &template, 0.1).unwrap();
        assert_eq!((peak.offset_x, peak.offset_y), (9, 5));
        assert!((peak.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn finds_a_partially_visible_template() {
        let map = SpecimenMap::new(3);
        // Template content sits partly to the left of the image.
        let image = map.window(0, 0, 20);
        let template = map.window(-6, 4, 12);
        let peak = match_template(&image, &template, 0.1).unwrap();
        assert_eq!((peak.offset_x, peak.offset_y), (-6, 4));
        assert!((peak.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_texture_scores_low() {
        let image = SpecimenMap::new(100).window(0, 0, 20);
        let template = SpecimenMap::new(200).window(0, 0, 12);
        let peak = match_template(&image, &template, 0.5).unwrap();
        assert!(peak.score < 0.95);
    }

    #[test]
    fn overlap_floor_can_rule_everything_out() {
        let image = ImageData::zeros(4, 4);
        let template = ImageData::zeros(4, 4);
        // Zero images never produce a positive denominator.
        assert!(matches!(
            match_template(&image, &template, 0.1),
            Err(CorrelateError::NoPeak)
        ));
    }
}
