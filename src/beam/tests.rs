use approx::assert_relative_eq;
use nalgebra::Vector3;

use super::*;
use crate::geometry::point;
use crate::loads::Load;

fn straight(handles: usize, length: f64) -> Vec<Frame> {
    let step = length / (handles - 1) as f64;
    (0..handles)
        .map(|k| Frame::along_x(point(k as f64 * step, 0.0, 0.0)))
        .collect()
}

fn unit_properties() -> (Section, Material) {
    (
        Section::new(1.0, 1.0, 1.0, 1.0).expect("valid section"),
        Material::new(1.0, 1.0).expect("valid material"),
    )
}

fn ring(handles: usize, radius: f64) -> Vec<Frame> {
    (0..handles)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / handles as f64;
            let (s, c) = angle.sin_cos();
            Frame::new(
                point(radius * c, radius * s, 0.0),
                Vector3::z(),
                Vector3::new(c, s, 0.0),
            )
        })
        .collect()
}

#[test]
fn ghosts_sit_at_segment_midpoints() {
    let (section, material) = unit_properties();
    let frames = straight(3, 2.0);
    let beam = Beam::new(&frames, &frames, &[section], &[material]).expect("valid beam");
    assert_eq!(beam.topology().vertex_count(), 5);
    assert_eq!(beam.actual_frames()[1].origin, Vector3::new(0.5, 0.0, 0.0));
    assert_eq!(beam.actual_frames()[3].origin, Vector3::new(1.5, 0.0, 0.0));
    assert_eq!(beam.actual_frames()[3].d1, Vector3::y());
}

#[test]
fn rest_configuration_is_in_equilibrium() {
    let (section, material) = unit_properties();
    let frames = straight(4, 3.0);
    let beam = Beam::new(&frames, &frames, &[section], &[material]).expect("valid beam");
    for i in 0..beam.topology().vertex_count() {
        assert_eq!(beam.resultant_force(i), Some(Vector3::zeros()));
        assert_eq!(beam.resultant_torque(i), Some(0.0));
    }
}

#[test]
fn curved_rest_shape_is_stress_free() {
    let (section, material) = unit_properties();
    let frames = ring(6, 1.5);
    let beam = Beam::closed(&frames, &frames, &[section], &[material]).expect("valid ring");
    assert_eq!(beam.topology().edge_count(), 12);
    for i in 0..beam.topology().vertex_count() {
        let force = beam.resultant_force(i).expect("vertex exists");
        assert_relative_eq!(force.norm(), 0.0, epsilon = 1.0e-12);
        let moment = beam
            .bending_moment(i, CoordinateSystem::Global)
            .expect("vertex exists");
        assert_relative_eq!(moment.left.norm(), 0.0, epsilon = 1.0e-12);
    }
    for e in 0..beam.topology().edge_count() {
        assert_relative_eq!(beam.twist(e).expect("edge exists"), 0.0, epsilon = 1.0e-12);
    }
}

#[test]
fn uniform_stretch_gives_axial_force() {
    let section = Section::new(2.0, 1.0, 1.0, 1.0).expect("valid section");
    let material = Material::new(5.0, 1.0).expect("valid material");
    let rest = straight(3, 1.0);
    let actual = straight(3, 1.1);
    let beam = Beam::new(&rest, &actual, &[section], &[material]).expect("valid beam");
    for e in 0..beam.topology().edge_count() {
        assert_relative_eq!(beam.strain(e).expect("edge exists"), 0.1, epsilon = 1.0e-12);
        assert_relative_eq!(beam.axial_force(e).expect("edge exists"), 1.0, epsilon = 1.0e-12);
    }
    let end = beam.topology().vertex_count() - 1;
    assert_relative_eq!(
        beam.resultant_force(end).expect("vertex exists"),
        Vector3::new(-1.0, 0.0, 0.0),
        epsilon = 1.0e-12
    );
}

#[test]
fn linear_twist_gives_uniform_torque() {
    let section = Section::new(1.0, 1.0, 1.0, 0.5).expect("valid section");
    let material = Material::new(1.0, 4.0).expect("valid material");
    let rest = straight(5, 2.0);
    let angle = 0.2;
    let actual: Vec<Frame> = rest
        .iter()
        .enumerate()
        .map(|(k, frame)| frame.rotated_about_tangent(angle * k as f64 / 4.0))
        .collect();
    let beam = Beam::new(&rest, &actual, &[section], &[material]).expect("valid beam");
    assert!(beam.is_torsion_capable());
    for e in 0..beam.topology().edge_count() {
        assert_relative_eq!(
            beam.twisting_moment(e).expect("edge exists"),
            2.0 * angle / 2.0,
            epsilon = 1.0e-12
        );
    }
    assert_relative_eq!(beam.resultant_torque(0).expect("vertex exists"), 0.2, epsilon = 1.0e-12);
    assert_relative_eq!(beam.resultant_torque(4).expect("vertex exists"), 0.0, epsilon = 1.0e-12);
}

#[test]
fn moves_are_reversible() {
    let (section, material) = unit_properties();
    let rest = straight(3, 1.0);
    let mut beam = Beam::new(&rest, &rest, &[section], &[material]).expect("valid beam");
    let before = beam.actual_frames().to_vec();
    let nv = beam.topology().vertex_count();
    let dx: Vec<Vector3<f64>> = (0..nv)
        .map(|i| Vector3::new(0.0, 0.01 * (i as f64).powi(2), 0.0))
        .collect();
    beam.translate(&dx).expect("one vector per vertex");
    beam.refresh().expect("valid geometry");
    let back: Vec<Vector3<f64>> = dx.iter().map(|v| -v).collect();
    beam.translate(&back).expect("one vector per vertex");
    beam.refresh().expect("valid geometry");
    for (a, b) in before.iter().zip(beam.actual_frames()) {
        assert_relative_eq!(a.origin, b.origin, epsilon = 1.0e-14);
        assert_relative_eq!(a.d1, b.d1, epsilon = 1.0e-12);
    }

    let dtheta = vec![0.3; nv];
    beam.rotate(&dtheta).expect("one angle per vertex");
    beam.rotate(&vec![-0.3; nv]).expect("one angle per vertex");
    for (a, b) in before.iter().zip(beam.actual_frames()) {
        assert_relative_eq!(a.d1, b.d1, epsilon = 1.0e-12);
    }
    assert!(beam.rotate(&[0.0]).is_err());
}

#[test]
fn moves_between_passes_accumulate() {
    let (section, material) = unit_properties();
    let rest = straight(3, 1.0);
    let mut beam = Beam::new(&rest, &rest, &[section], &[material]).expect("valid beam");
    let before = beam.actual_frames().to_vec();
    let nv = beam.topology().vertex_count();
    let up = vec![Vector3::new(0.0, 0.1, 0.0); nv];
    let down = vec![Vector3::new(0.0, -0.1, 0.0); nv];

    beam.translate(&up).expect("one vector per vertex");
    assert_relative_eq!(beam.actual_frames()[1].origin.y, 0.1, epsilon = 1.0e-15);
    beam.translate(&down).expect("one vector per vertex");
    for (a, b) in before.iter().zip(beam.actual_frames()) {
        assert_relative_eq!(a.origin, b.origin, epsilon = 1.0e-15);
    }
    beam.refresh().expect("valid geometry");
    for (a, b) in before.iter().zip(beam.actual_frames()) {
        assert_relative_eq!(a.origin, b.origin, epsilon = 1.0e-15);
        assert_relative_eq!(a.d1, b.d1, epsilon = 1.0e-12);
    }

    beam.translate(&up).expect("one vector per vertex");
    beam.translate(&up).expect("one vector per vertex");
    beam.refresh().expect("valid geometry");
    for (a, b) in before.iter().zip(beam.actual_frames()) {
        assert_relative_eq!(b.origin - a.origin, Vector3::new(0.0, 0.2, 0.0), epsilon = 1.0e-15);
    }
}

#[test]
fn repeated_passes_are_identical() {
    let (section, material) = unit_properties();
    let rest = straight(4, 1.0);
    let actual: Vec<Frame> = rest
        .iter()
        .map(|frame| frame.translated(&Vector3::new(0.0, 0.1 * frame.origin.x.powi(2), 0.0)))
        .collect();
    let mut beam = Beam::new(&rest, &actual, &[section], &[material]).expect("valid beam");
    let first: Vec<_> = (0..beam.topology().vertex_count())
        .map(|i| beam.resultant_force(i))
        .collect();
    beam.refresh().expect("valid geometry");
    let second: Vec<_> = (0..beam.topology().vertex_count())
        .map(|i| beam.resultant_force(i))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn invalid_configurations_are_rejected() {
    let (section, material) = unit_properties();
    let frames = straight(3, 1.0);
    assert_eq!(
        Beam::new(&frames[..1], &frames[..1], &[section], &[material]).err(),
        Some(ConfigurationError::TooFewFrames {
            kind: "open",
            required: 2,
            received: 1
        })
    );
    assert_eq!(
        Beam::new(&frames, &frames, &[section; 3], &[material]).err(),
        Some(ConfigurationError::PropertyCountMismatch {
            what: "sections",
            segments: 2,
            received: 3
        })
    );
    let mut collapsed = frames.clone();
    collapsed[1] = collapsed[0];
    assert_eq!(
        Beam::new(&frames, &collapsed, &[section], &[material]).err(),
        Some(ConfigurationError::ZeroLengthSegment { segment: 0 })
    );
    let mut skewed = frames.clone();
    skewed[2].d1 = Vector3::new(1.0, 1.0, 0.0);
    assert_eq!(
        Beam::new(&skewed, &frames, &[section], &[material]).err(),
        Some(ConfigurationError::DegenerateFrame { index: 2 })
    );
    let weak = Section {
        area: -1.0,
        ..section
    };
    assert!(matches!(
        Beam::new(&frames, &frames, &[weak], &[material]),
        Err(ConfigurationError::InvalidSection { segment: 0, .. })
    ));
    let bare = Section::new(4.0, 0.0, 0.0, 0.0).expect("valid section");
    let overflowing = Material::new(f64::MAX, 0.0).expect("valid material");
    assert!(matches!(
        Beam::new(&frames, &frames, &[bare], &[overflowing]),
        Err(ConfigurationError::InvalidInitialState {
            source: crate::errors::RodError::NonFinite { .. }
        })
    ));
}

#[test]
fn follower_moment_bends_a_free_end() {
    let (section, material) = unit_properties();
    let frames = straight(3, 1.0);
    let mut beam = Beam::new(&frames, &frames, &[section], &[material]).expect("valid beam");
    beam.load(vec![Load::moment(2, Vector3::z())]).expect("valid load");
    beam.refresh().expect("valid geometry");
    let end = beam.topology().vertex_count() - 1;
    let moment = beam
        .bending_moment(end, CoordinateSystem::Global)
        .expect("vertex exists");
    assert_relative_eq!(moment.left, Vector3::z(), epsilon = 1.0e-14);
    assert_eq!(moment.right, Vector3::zeros());
    assert_relative_eq!(beam.dynamics.resultant_moment[end].norm(), 0.0, epsilon = 1.0e-14);
    let shear = beam
        .shear_force(end - 1, CoordinateSystem::Global)
        .expect("edge exists");
    assert_relative_eq!(shear, Vector3::new(0.0, -4.0, 0.0), epsilon = 1.0e-12);
    assert!(beam.load(vec![Load::force(3, Vector3::x())]).is_err());
}
