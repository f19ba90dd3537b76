//! Integration tests for the full matching chain against synthetic frames.

use beamcal_correlate::filter::PreprocessOptions;
use beamcal_correlate::{TemplateCorrelator, TemplateMatchOptions};
use beamcal_core::synthetic::SpecimenMap;
use beamcal_core::{Correlator, Frame, SearchHint, Vec2};

fn frame_at(map: &SpecimenMap, x: i64, y: i64, size: usize, index: u64) -> Frame {
    Frame::new(map.window(x, y, size), 1e-9, 1, index).unwrap()
}

#[test]
fn binned_matching_recovers_block_aligned_shifts() {
    let map = SpecimenMap::new(5);
    let baseline = frame_at(&map, 0, 0, 48, 0);
    let moved = frame_at(&map, 8, 4, 48, 1);
    let mut correlator = TemplateCorrelator::new(TemplateMatchOptions {
        bin_factor: 2,
        preprocess: PreprocessOptions {
            blur_sigma: None,
            binarize: false,
        },
        min_overlap_frac: 0.1,
    });
    let hint = SearchHint {
        desired_shift_px: Vec2::new(8.0, 4.0),
        overlap_hint: 0.8,
    };
    let result = correlator.correlate(&baseline, &moved, &hint).unwrap();
    // Binned frames are exact shifted copies when the shift is a multiple
    // of the bin factor, so the peak lands exactly.
    assert_eq!(result.shift_px, Vec2::new(8.0, 4.0));
    assert!((result.quality - 1.0).abs() < 1e-9);
}

#[test]
fn binarised_matching_still_locks_on() {
    let map = SpecimenMap::new(17);
    let baseline = frame_at(&map, 0, 0, 40, 0);
    let moved = frame_at(&map, 6, -2, 40, 1);
    let mut correlator = TemplateCorrelator::new(TemplateMatchOptions {
        bin_factor: 1,
        preprocess: PreprocessOptions {
            blur_sigma: None,
            binarize: true,
        },
        min_overlap_frac: 0.1,
    });
    let hint = SearchHint {
        desired_shift_px: Vec2::new(6.0, -2.0),
        overlap_hint: 0.8,
    };
    let result = correlator.correlate(&baseline, &moved, &hint).unwrap();
    // The two frames are thresholded independently, so a handful of pixels
    // near the cut can flip; the peak must still land on the true shift.
    assert_eq!(result.shift_px, Vec2::new(6.0, -2.0));
    assert!(result.quality > 0.9);
}

#[test]
fn realized_shift_differs_from_desired_when_motion_is_skewed() {
    // Command asked for +x, but the instrument also slipped in y; the
    // correlator reports what actually happened.
    let map = SpecimenMap::new(9);
    let baseline = frame_at(&map, 0, 0, 40, 0);
    let moved = frame_at(&map, 10, 5, 40, 1);
    let mut correlator = TemplateCorrelator::new(TemplateMatchOptions {
        bin_factor: 1,
        preprocess: PreprocessOptions {
            blur_sigma: None,
            binarize: false,
        },
        min_overlap_frac: 0.1,
    });
    let hint = SearchHint {
        desired_shift_px: Vec2::new(10.0, 0.0),
        overlap_hint: 0.7,
    };
    let result = correlator.correlate(&baseline, &moved, &hint).unwrap();
    assert_eq!(result.shift_px, Vec2::new(10.0, 5.0));
    assert!((result.quality - 1.0).abs() < 1e-9);
}
