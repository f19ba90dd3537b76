//! Frame preprocessing: Gaussian blur and Yen-threshold binarisation.
//!
//! Matching is done on lightly blurred, thresholded frames: the blur knocks
//! down shot noise and the binarisation makes the correlation peak depend on
//! specimen structure rather than absolute intensity.

use beamcal_core::{ImageData, Real};
use serde::{Deserialize, Serialize};

/// Preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessOptions {
    /// Gaussian blur sigma in pixels; `None` skips the blur. Small values
    /// (a few tenths of a pixel) are typical at high magnification.
    pub blur_sigma: Option<Real>,
    /// Binarise with Yen's threshold after the blur.
    pub binarize: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            blur_sigma: Some(0.1),
            binarize: true,
        }
    }
}

/// Apply the configured preprocessing chain to an image.
pub fn preprocess(image: &ImageData, opts: &PreprocessOptions) -> ImageData {
    let mut out = match opts.blur_sigma {
        Some(sigma) if sigma > 0.0 => gaussian_blur(image, sigma),
        _ => image.clone(),
    };
    if opts.binarize {
        let thresh = yen_threshold(&out);
        out.apply(|v| *v = if *v >= thresh { 1.0 } else { 0.0 });
    }
    out
}

/// Separable Gaussian blur with edge-clamped padding.
pub fn gaussian_blur(image: &ImageData, sigma: Real) -> ImageData {
    let kernel = gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let (rows, cols) = (image.nrows(), image.ncols());

    // Horizontal pass.
    let horizontal = ImageData::from_fn(rows, cols, |row, col| {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let x = (col as i64 + k as i64 - radius as i64).clamp(0, cols as i64 - 1);
            acc += w * image[(row, x as usize)];
        }
        acc
    });

    // Vertical pass.
    ImageData::from_fn(rows, cols, |row, col| {
        let mut acc = 0.0;
        for (k, w) in kernel.iter().enumerate() {
            let y = (row as i64 + k as i64 - radius as i64).clamp(0, rows as i64 - 1);
            acc += w * horizontal[(y as usize, col)];
        }
        acc
    })
}

fn gaussian_kernel(sigma: Real) -> Vec<Real> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let mut kernel: Vec<Real> = (0..=2 * radius)
        .map(|i| {
            let d = i as Real - radius as Real;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: Real = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

const HIST_BINS: usize = 256;

/// Yen's automatic threshold, computed on a 256-bin histogram.
///
/// Maximises Yen's criterion over the binarisation point; degenerate (flat)
/// images return their single value so binarisation maps everything to 1.
pub fn yen_threshold(image: &ImageData) -> Real {
    let mut lo = Real::INFINITY;
    let mut hi = Real::NEG_INFINITY;
    for &v in image.iter() {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(hi > lo) {
        return lo;
    }

    let width = (hi - lo) / HIST_BINS as Real;
    let mut hist = [0f64; HIST_BINS];
    for &v in image.iter() {
        let bin = (((v - lo) / width) as usize).min(HIST_BINS - 1);
        hist[bin] += 1.0;
    }
    let total = image.len() as Real;

    // Cumulative probability and cumulative squared probability from the
    // left; squared probability from the right.
    let mut p1 = [0f64; HIST_BINS];
    let mut p1_sq = [0f64; HIST_BINS];
    let mut acc = 0.0;
    let mut acc_sq = 0.0;
    for (bin, &count) in hist.iter().enumerate() {
        let p = count / total;
        acc += p;
        acc_sq += p * p;
        p1[bin] = acc;
        p1_sq[bin] = acc_sq;
    }
    let total_sq = acc_sq;

    let mut best_bin = 0;
    let mut best_crit = Real::NEG_INFINITY;
    for t in 0..HIST_BINS - 1 {
        let fg = p1[t];
        let bg = 1.0 - fg;
        let fg_sq = p1_sq[t];
        let bg_sq = total_sq - fg_sq;
        if fg <= 0.0 || bg <= 0.0 || fg_sq <= 0.0 || bg_sq <= 0.0 {
            continue;
        }
        let crit = 2.0 * (fg * bg).ln() - (fg_sq * bg_sq).ln();
        if crit > best_crit {
            best_crit = crit;
            best_bin = t;
        }
    }

    lo + (best_bin as Real + 0.5) * width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_preserves_uniform_images() {
        let image = ImageData::from_element(8, 8, 2.5);
        let blurred = gaussian_blur(&image, 1.0);
        for &v in blurred.iter() {
            assert!((v - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn blur_smooths_an_impulse() {
        let mut image = ImageData::zeros(9, 9);
        image[(4, 4)] = 1.0;
        let blurred = gaussian_blur(&image, 1.0);
        assert!(blurred[(4, 4)] < 1.0);
        assert!(blurred[(4, 5)] > 0.0);
        let sum: Real = blurred.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn yen_separates_a_bimodal_image() {
        let image = ImageData::from_fn(8, 8, |r, _| if r < 4 { 0.0 } else { 1.0 });
        let thresh = yen_threshold(&image);
        assert!(thresh > 0.0 && thresh < 1.0);
    }

    #[test]
    fn yen_on_flat_image_is_harmless() {
        let image = ImageData::from_element(4, 4, 0.7);
        assert_eq!(yen_threshold(&image), 0.7);
        let processed = preprocess(
            &image,
            &PreprocessOptions {
                blur_sigma: None,
                binarize: true,
            },
        );
        assert!(processed.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn preprocess_binarizes() {
        let image = ImageData::from_fn(8, 8, |_, c| if c < 2 { 0.1 } else { 0.9 });
        let processed = preprocess(
            &image,
            &PreprocessOptions {
                blur_sigma: None,
                binarize: true,
            },
        );
        assert_eq!(processed[(0, 0)], 0.0);
        assert_eq!(processed[(0, 5)], 1.0);
    }
}
