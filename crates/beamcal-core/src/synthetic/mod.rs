//! Deterministic synthetic instrument bench.
//!
//! Everything here is seeded and RNG-free (splitmix64 hashing), so synthetic
//! calibration runs are stable across platforms and releases:
//! - [`specimen`]: an unbounded pseudo-random specimen texture that frames
//!   are sampled from,
//! - [`bench`]: a [`SimulatedMicroscope`]/[`ExactCorrelator`] pair sharing
//!   ground truth (per-target rotation, response gain, drift), used by the
//!   pipeline tests and examples.

pub mod bench;
pub mod specimen;

pub use bench::{simulated_bench, BenchConfig, BenchState, ExactCorrelator, SimulatedMicroscope};
pub use specimen::SpecimenMap;
