//! Simulated microscope bench with ground-truth geometry.
//!
//! [`SimulatedMicroscope`] and [`ExactCorrelator`] share one [`BenchState`]
//! through `Rc<RefCell<...>>`: the microscope records the true field position
//! at every capture, and the correlator reads those positions back, so it
//! reports the exact realized displacement (plus any configured drift)
//! without doing image processing. Its quality value is the geometric
//! overlap fraction between the expected-overlap window and the post-move
//! frame, which reproduces the empirically observed correctable-angle bound
//! (roughly 130 degrees at an overlap hint of 0.5).
//!
//! The bench can also render real frames from the [`SpecimenMap`] texture
//! (`render_frames = true`) for end-to-end runs against a real correlator.

use super::specimen::SpecimenMap;
use crate::{
    rotation_matrix, CalibrationError, CorrelationResult, Correlator, Frame, ImageData,
    Microscope, PhysicalVector, Real, SearchHint, ShiftTarget, Vec2,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Ground-truth configuration for a simulated bench.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Square frame edge length in pixels.
    pub image_size: usize,
    /// Physical size of one pixel (metres).
    pub pixel_size_m: Real,
    /// True pixel-to-physical rotation of the stage subsystem (radians).
    pub stage_angle_rad: Real,
    /// True pixel-to-physical rotation of the beam subsystem (radians).
    pub beam_angle_rad: Real,
    /// Stage response gain: realized displacement per commanded unit.
    /// Nominal 1.0; set off-nominal to reproduce the magnitude-ratio
    /// anomaly the procedure records but never corrects.
    pub stage_gain: Real,
    /// Beam response gain, nominal 1.0.
    pub beam_gain: Real,
    /// Uncommanded field drift added at every capture (pixels). Nonzero
    /// drift makes trials after the first noisier, as seen on the real
    /// instrument.
    pub drift_px_per_capture: Vec2,
    /// Render frames from the specimen texture instead of zero-filled
    /// buffers. Needed when pairing the bench with a real correlator.
    pub render_frames: bool,
    /// Specimen texture seed.
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            image_size: 64,
            pixel_size_m: 1e-9,
            stage_angle_rad: 0.0,
            beam_angle_rad: 0.0,
            stage_gain: 1.0,
            beam_gain: 1.0,
            drift_px_per_capture: Vec2::zeros(),
            render_frames: false,
            seed: 1,
        }
    }
}

/// Mutable ground-truth state shared by the bench halves.
#[derive(Debug)]
pub struct BenchState {
    cfg: BenchConfig,
    stage_px: Vec2,
    beam_px: Vec2,
    drift_px: Vec2,
    next_frame_index: u64,
    capture_positions: BTreeMap<u64, Vec2>,
    specimen: SpecimenMap,
}

impl BenchState {
    fn new(cfg: BenchConfig) -> Self {
        let specimen = SpecimenMap::new(cfg.seed);
        Self {
            cfg,
            stage_px: Vec2::zeros(),
            beam_px: Vec2::zeros(),
            drift_px: Vec2::zeros(),
            next_frame_index: 0,
            capture_positions: BTreeMap::new(),
            specimen,
        }
    }

    /// True field-of-view position in specimen pixels (stage + beam + drift).
    pub fn field_px(&self) -> Vec2 {
        self.stage_px + self.beam_px + self.drift_px
    }

    /// Number of frames captured so far.
    pub fn capture_count(&self) -> usize {
        self.capture_positions.len()
    }

    /// Field position recorded for a captured frame.
    pub fn position_of(&self, frame_index: u64) -> Option<Vec2> {
        self.capture_positions.get(&frame_index).copied()
    }

    fn true_angle(&self, target: ShiftTarget) -> Real {
        match target {
            ShiftTarget::Stage => self.cfg.stage_angle_rad,
            ShiftTarget::Beam => self.cfg.beam_angle_rad,
        }
    }

    fn gain(&self, target: ShiftTarget) -> Real {
        match target {
            ShiftTarget::Stage => self.cfg.stage_gain,
            ShiftTarget::Beam => self.cfg.beam_gain,
        }
    }

    fn apply_shift(&mut self, target: ShiftTarget, amount: &PhysicalVector) {
        // True pixel->physical map is R(angle) * px * pixel_size, so a
        // physical command lands on the field as the inverse rotation.
        let delta_px = rotation_matrix(-self.true_angle(target)) * amount * self.gain(target)
            / self.cfg.pixel_size_m;
        match target {
            ShiftTarget::Stage => self.stage_px += delta_px,
            ShiftTarget::Beam => self.beam_px += delta_px,
        }
    }

    fn capture(&mut self) -> Result<Frame, CalibrationError> {
        self.drift_px += self.cfg.drift_px_per_capture;
        let field = self.field_px();
        let index = self.next_frame_index;
        self.next_frame_index += 1;
        self.capture_positions.insert(index, field);

        let size = self.cfg.image_size;
        let data = if self.cfg.render_frames {
            self.specimen
                .window(field.x.round() as i64, field.y.round() as i64, size)
        } else {
            ImageData::zeros(size, size)
        };
        Frame::new(data, self.cfg.pixel_size_m, 1, index)
            .map_err(|e| CalibrationError::Microscope(e.to_string()))
    }
}

/// Simulated instrument half of the bench.
#[derive(Debug, Clone)]
pub struct SimulatedMicroscope {
    state: Rc<RefCell<BenchState>>,
}

impl Microscope for SimulatedMicroscope {
    fn capture_frame(&mut self) -> Result<Frame, CalibrationError> {
        self.state.borrow_mut().capture()
    }

    fn move_stage(&mut self, shift: &PhysicalVector) -> Result<(), CalibrationError> {
        self.state
            .borrow_mut()
            .apply_shift(ShiftTarget::Stage, shift);
        Ok(())
    }

    fn move_beam(&mut self, shift: &PhysicalVector) -> Result<(), CalibrationError> {
        self.state.borrow_mut().apply_shift(ShiftTarget::Beam, shift);
        Ok(())
    }

    fn reset_shift(&mut self, target: ShiftTarget) -> Result<(), CalibrationError> {
        let mut state = self.state.borrow_mut();
        match target {
            ShiftTarget::Stage => state.stage_px = Vec2::zeros(),
            ShiftTarget::Beam => state.beam_px = Vec2::zeros(),
        }
        Ok(())
    }
}

/// Oracle correlator half of the bench.
///
/// Reports the exact displacement between two recorded captures, scored by
/// the geometric overlap model. Useful for pipeline tests that need the
/// correlation step to behave as a noise-free rotation.
#[derive(Debug, Clone)]
pub struct ExactCorrelator {
    state: Rc<RefCell<BenchState>>,
}

impl Correlator for ExactCorrelator {
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
        let state = self.state.borrow();
        let pos_a = state.position_of(baseline.index).ok_or_else(|| {
            CalibrationError::Correlation(format!(
                "frame {} was not captured on this bench",
                baseline.index
            ))
        })?;
        let pos_b = state.position_of(moved.index).ok_or_else(|| {
            CalibrationError::Correlation(format!(
                "frame {} was not captured on this bench",
                moved.index
            ))
        })?;

        let shift_px = pos_b - pos_a;
        let quality = overlap_fraction(
            &hint.desired_shift_px,
            &shift_px,
            state.cfg.image_size as Real,
        );
        Ok(CorrelationResult { shift_px, quality })
    }
}

/// Build a bench: microscope, oracle correlator, and a handle on the shared
/// ground-truth state for assertions.
pub fn simulated_bench(
    cfg: BenchConfig,
) -> (SimulatedMicroscope, ExactCorrelator, Rc<RefCell<BenchState>>) {
    let state = Rc::new(RefCell::new(BenchState::new(cfg)));
    (
        SimulatedMicroscope {
            state: Rc::clone(&state),
        },
        ExactCorrelator {
            state: Rc::clone(&state),
        },
        state,
    )
}

/// Fraction of the expected-overlap window still visible after the actual
/// move, for square frames of edge `size`.
///
/// The expected window is the part of the baseline frame that would remain
/// in view if the desired shift were realized exactly; the fraction of it
/// covered by the actually shifted frame is what the correlation peak can
/// lock onto. Zero when the desired shift already exceeds the frame.
pub fn overlap_fraction(desired: &Vec2, actual: &Vec2, size: Real) -> Real {
    let (tx, ix) = axis_overlap(desired.x, actual.x, size);
    let (ty, iy) = axis_overlap(desired.y, actual.y, size);
    if tx <= 0.0 || ty <= 0.0 {
        return 0.0;
    }
    (ix * iy) / (tx * ty)
}

fn axis_overlap(desired: Real, actual: Real, size: Real) -> (Real, Real) {
    let t0 = desired.max(0.0);
    let t1 = (size + desired).min(size);
    let template = t1 - t0;
    if template <= 0.0 {
        return (0.0, 0.0);
    }
    let p0 = actual;
    let p1 = actual + size;
    let inter = (t1.min(p1) - t0.max(p0)).max(0.0);
    (template, inter)
}
