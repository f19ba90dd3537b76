//! Run a full calibration session against the simulated bench and print the
//! session report.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example simulated_calibration
//! ```

use beamcal_core::synthetic::{simulated_bench, BenchConfig};
use beamcal_core::{ShiftTarget, Vec2};
use beamcal_correlate::TemplateCorrelator;
use beamcal_pipeline::{Calibrator, RunOptions};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // A bench whose beam deflectors are rotated -44 degrees from the image
    // axes, about what the real instrument showed before calibration.
    let cfg = BenchConfig {
        beam_angle_rad: (-44.0f64).to_radians(),
        image_size: 256,
        render_frames: true,
        ..Default::default()
    };
    let (microscope, _oracle, _state) = simulated_bench(cfg);

    let mut calibrator = Calibrator::new(microscope, TemplateCorrelator::default());
    let run = RunOptions {
        pixel_shift: Vec2::new(256.0 * 0.3, 0.0),
        pixel_size_m: 1e-9,
        overlap_hint: 0.7,
        ..Default::default()
    };

    let estimate = calibrator.calibrate(ShiftTarget::Beam, &run)?;
    println!(
        "fitted beam rotation: {:.2} deg after {} trial(s)",
        estimate.angle_rad().unwrap_or(0.0).to_degrees(),
        estimate.history().len()
    );
    println!("{}", calibrator.report(ShiftTarget::Beam).to_json()?);
    Ok(())
}
