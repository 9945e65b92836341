#![warn(clippy::pedantic)]

mod common;

use approx::assert_relative_eq;
use common::{tight_config, torsion_rod};
use nalgebra::Vector3;
use rodrelax::{Boundary, Load, Solver, SolverState, Support};

const TORSIONAL_STIFFNESS: f64 = 2.0;
const LENGTH: f64 = 1.5;

fn twisted(angle: f64) -> Solver {
    let beam = torsion_rod(0.0, LENGTH, 5, TORSIONAL_STIFFNESS);
    let end = beam.handle_frame(4).expect("end handle exists");
    let supports = vec![
        Support::clamped(0, Boundary::Start),
        Support::clamped_with_frame(0, Boundary::End, end.rotated_about_tangent(angle)),
    ];
    let mut solver =
        Solver::new(vec![beam], supports, Vec::new(), tight_config()).expect("valid setup");
    assert_eq!(solver.solve().expect("relaxation succeeds"), SolverState::Converged);
    solver
}

#[test]
fn clamp_torque_matches_closed_form_solution() {
    let angle = 0.3;
    let solver = twisted(angle);
    let torque = TORSIONAL_STIFFNESS * angle / LENGTH;

    let near = solver.reaction_moment(0).expect("support exists");
    let far = solver.reaction_moment(1).expect("support exists");
    assert_relative_eq!(near.x, -torque, max_relative = 1.0e-6);
    assert_relative_eq!(far.x, torque, max_relative = 1.0e-6);
    assert!(near.yz().norm() < 1.0e-12);
}

#[test]
fn twist_spreads_uniformly_along_the_rod() {
    let angle = 0.3;
    let solver = twisted(angle);
    let beam = &solver.beams()[0];
    let edges = beam.topology().edge_count();
    for e in 0..edges {
        assert_relative_eq!(
            beam.twist(e).expect("edge exists"),
            angle / edges as f64,
            max_relative = 1.0e-6
        );
        assert_relative_eq!(
            beam.twisting_moment(e).expect("edge exists"),
            TORSIONAL_STIFFNESS * angle / LENGTH,
            max_relative = 1.0e-6
        );
    }
    // Pure torsion leaves the straight centerline untouched.
    for frame in beam.handle_frames() {
        assert_eq!(frame.origin.yz(), nalgebra::Vector2::zeros());
    }
}

#[test]
fn follower_torque_at_a_free_end_twists_the_rod() {
    let torque = 0.05;
    let mut beam = torsion_rod(0.0, LENGTH, 5, TORSIONAL_STIFFNESS);
    beam.load(vec![
        Load::moment(4, Vector3::new(0.0, 0.0, torque)).in_material_frame()
    ])
    .expect("torque assignment succeeds");
    let mut solver = Solver::new(
        vec![beam],
        vec![Support::clamped(0, Boundary::Start)],
        Vec::new(),
        tight_config(),
    )
    .expect("valid setup");
    solver.solve().expect("relaxation succeeds");

    let beam = &solver.beams()[0];
    let total: f64 = (0..beam.topology().edge_count())
        .map(|e| beam.twist(e).expect("edge exists"))
        .sum();
    assert_relative_eq!(total, torque * LENGTH / TORSIONAL_STIFFNESS, max_relative = 1.0e-6);
    assert_relative_eq!(
        solver.reaction_moment(0).expect("support exists").x,
        -torque,
        max_relative = 1.0e-6
    );
}
