//! Builders shared by the integration tests.

#![allow(dead_code)]

use rodrelax::{point, Beam, Frame, Material, Section, SolverConfig};

/// Handle frames of a straight rod along X from `start` over `length`.
pub fn straight(start: f64, length: f64, handles: usize) -> Vec<Frame> {
    let step = length / (handles - 1) as f64;
    (0..handles)
        .map(|k| Frame::along_x(point(start + k as f64 * step, 0.0, 0.0)))
        .collect()
}

/// Rod without torsional stiffness; unit modulus so the section carries `E·A` and `E·I`.
pub fn bending_rod(start: f64, length: f64, handles: usize, ea: f64, ei: f64) -> Beam {
    let frames = straight(start, length, handles);
    let section = Section::new(ea, ei, ei, 0.0).expect("valid section");
    let material = Material::new(1.0, 0.0).expect("valid material");
    Beam::new(&frames, &frames, &[section], &[material]).expect("valid beam")
}

/// Rod with unit bending stiffness and torsional stiffness `gj`.
pub fn torsion_rod(start: f64, length: f64, handles: usize, gj: f64) -> Beam {
    let frames = straight(start, length, handles);
    let section = Section::new(100.0, 1.0, 1.0, gj).expect("valid section");
    let material = Material::new(1.0, 1.0).expect("valid material");
    Beam::new(&frames, &frames, &[section], &[material]).expect("valid beam")
}

/// Settings tight enough for closed-form comparisons.
pub fn tight_config() -> SolverConfig {
    SolverConfig {
        max_iterations: 200_000,
        x_tolerance: 1.0e-22,
        theta_tolerance: 1.0e-22,
        ..SolverConfig::default()
    }
}
