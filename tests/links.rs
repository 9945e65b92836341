#![warn(clippy::pedantic)]

mod common;

use approx::assert_relative_eq;
use common::{bending_rod, tight_config, torsion_rod};
use nalgebra::Vector3;
use rodrelax::{
    Boundary, ConfigurationError, Link, LinkEnd, Load, Solver, SolverError, SolverState, Support,
};

#[test]
fn spring_link_shares_an_axial_load() {
    // Two collinear rods clamped at their outer ends, their inner ends joined
    // by a spring. Each rod is an axial spring of stiffness EA / L = 100.
    let stiffness = 50.0;
    let load = 1.0e-2;
    let mut left = bending_rod(0.0, 1.0, 5, 100.0, 1.0);
    left.load(vec![Load::force(4, Vector3::new(load, 0.0, 0.0))])
        .expect("load assignment succeeds");
    let right = bending_rod(1.0, 1.0, 5, 100.0, 1.0);

    let supports = vec![
        Support::clamped(0, Boundary::Start),
        Support::clamped(1, Boundary::End),
    ];
    let links = vec![Link::elastic_pinned(
        LinkEnd::new(0, 4),
        LinkEnd::new(1, 0),
        stiffness,
    )];
    let mut solver =
        Solver::new(vec![left, right], supports, links, tight_config()).expect("valid setup");
    solver.solve().expect("relaxation succeeds");

    // F = 100·u0 + K·g and K·g = 100·u1 with g = u0 − u1 give g = F / 200.
    let gap = load / 200.0;
    let beams = solver.beams();
    let a = beams[0].handle_frame(4).expect("handle exists").origin;
    let b = beams[1].handle_frame(0).expect("handle exists").origin;
    assert_relative_eq!(a.x - b.x, gap, max_relative = 1.0e-4);
    assert_relative_eq!(a.x - 1.0, 1.5 * gap, max_relative = 1.0e-4);

    let (on_a, _) = solver.links()[0].reaction_on_a(beams);
    let (on_b, _) = solver.links()[0].reaction_on_b(beams);
    assert_relative_eq!(on_a, -on_b);
    assert_relative_eq!(on_a.x, -stiffness * gap, max_relative = 1.0e-4);

    let near = solver.reaction_force(0).expect("support exists");
    let far = solver.reaction_force(1).expect("support exists");
    assert_relative_eq!(near.x + far.x, -load, max_relative = 1.0e-6);
}

#[test]
fn spring_link_between_free_rods_stays_closed() {
    for stiffness in [5.0, 500.0] {
        let beams = vec![
            bending_rod(0.0, 1.0, 5, 100.0, 1.0),
            bending_rod(1.0, 1.0, 5, 100.0, 1.0),
        ];
        let links = vec![Link::elastic_pinned(
            LinkEnd::new(0, 4),
            LinkEnd::new(1, 0),
            stiffness,
        )];
        let mut solver =
            Solver::new(beams, Vec::new(), links, tight_config()).expect("valid setup");
        assert_eq!(solver.solve(), Ok(SolverState::Converged));

        let beams = solver.beams();
        let a = beams[0].handle_frame(4).expect("handle exists").origin;
        let b = beams[1].handle_frame(0).expect("handle exists").origin;
        assert_relative_eq!(a, b, epsilon = 1.0e-15);

        let (on_a, _) = solver.links()[0].reaction_on_a(beams);
        let (on_b, _) = solver.links()[0].reaction_on_b(beams);
        assert_relative_eq!(on_a + on_b, Vector3::zeros(), epsilon = 1.0e-15);
        assert_relative_eq!(on_a, Vector3::zeros(), epsilon = 1.0e-15);
    }
}

#[test]
fn rigid_link_behaves_like_a_continuous_rod() {
    let load = 1.0e-4;
    let tip = Vector3::new(0.0, 0.0, -load);

    let mut whole = bending_rod(0.0, 2.0, 9, 100.0, 1.0);
    whole
        .load(vec![Load::force(8, tip)])
        .expect("load assignment succeeds");
    let mut single = Solver::new(
        vec![whole],
        vec![Support::clamped(0, Boundary::Start)],
        Vec::new(),
        tight_config(),
    )
    .expect("valid setup");
    single.solve().expect("relaxation succeeds");

    let first = bending_rod(0.0, 1.0, 5, 100.0, 1.0);
    let mut second = bending_rod(1.0, 1.0, 5, 100.0, 1.0);
    second
        .load(vec![Load::force(4, tip)])
        .expect("load assignment succeeds");
    let mut linked = Solver::new(
        vec![first, second],
        vec![Support::clamped(0, Boundary::Start)],
        vec![Link::clamped(LinkEnd::new(0, 4), LinkEnd::new(1, 0))],
        tight_config(),
    )
    .expect("valid setup");
    linked.solve().expect("relaxation succeeds");

    let deflection = |beam: &rodrelax::Beam, handle: usize| {
        -beam.handle_frame(handle).expect("handle exists").origin.z
    };
    let closed_form = load * 2.0_f64.powi(3) / 3.0;
    let reference = deflection(&single.beams()[0], 8);
    let joined = deflection(&linked.beams()[1], 4);
    assert_relative_eq!(reference, closed_form, max_relative = 1.0e-2);
    assert_relative_eq!(joined, closed_form, max_relative = 2.0e-2);
    assert_relative_eq!(joined, reference, max_relative = 2.0e-2);

    // Both ends of the link stay together.
    let a = linked.beams()[0].handle_frame(4).expect("handle exists");
    let b = linked.beams()[1].handle_frame(0).expect("handle exists");
    assert_relative_eq!(a.origin, b.origin, epsilon = 1.0e-12);
    assert_relative_eq!(a.t, b.t, epsilon = 1.0e-9);
}

#[test]
fn swivel_link_twists_in_series_with_the_rods() {
    let (gj, rotational_stiffness, angle) = (1.0, 2.0, 0.01);
    let first = torsion_rod(0.0, 1.0, 5, gj);
    let second = torsion_rod(1.0, 1.0, 5, gj);
    let end = second.handle_frame(4).expect("handle exists");

    let supports = vec![
        Support::clamped(0, Boundary::Start),
        Support::clamped_with_frame(1, Boundary::End, end.rotated_about_tangent(angle)),
    ];
    let links = vec![Link::elastic_swivel(
        LinkEnd::new(0, 4),
        LinkEnd::new(1, 0),
        1.0e3,
        rotational_stiffness,
    )];
    let mut solver =
        Solver::new(vec![first, second], supports, links, tight_config()).expect("valid setup");
    solver.solve().expect("relaxation succeeds");

    // Rod, spring and rod in series: T = Δθ / (L/GJ + 1/C + L/GJ).
    let torque = angle / (2.0 / gj + 1.0 / rotational_stiffness);
    let near = solver.reaction_moment(0).expect("support exists");
    let far = solver.reaction_moment(1).expect("support exists");
    assert_relative_eq!(near.x, -torque, max_relative = 1.0e-3);
    assert_relative_eq!(far.x, torque, max_relative = 1.0e-3);

    let (_, on_a) = solver.links()[0].reaction_on_a(solver.beams());
    assert_relative_eq!(on_a.x, torque, max_relative = 1.0e-3);
}

#[test]
fn overlapping_constraints_are_rejected() {
    let beams = vec![bending_rod(0.0, 1.0, 3, 1.0, 1.0), bending_rod(1.0, 1.0, 3, 1.0, 1.0)];
    let result = Solver::new(
        beams,
        vec![Support::pinned(0, Boundary::End)],
        vec![Link::clamped(LinkEnd::new(0, 2), LinkEnd::new(1, 0))],
        tight_config(),
    );
    assert_eq!(
        result.err(),
        Some(SolverError::Configuration(
            ConfigurationError::ConflictingReaction { beam: 0, handle: 2 }
        ))
    );
}
