#![warn(clippy::pedantic)]

mod common;

use approx::assert_relative_eq;
use common::{bending_rod, tight_config};
use nalgebra::Vector3;
use rodrelax::{Boundary, CoordinateSystem, Load, Solver, SolverState, Support};

const LENGTH: f64 = 1.0;
const BENDING_STIFFNESS: f64 = 1.0;
const TIP_LOAD: f64 = 1.0e-3;

/// Relax a clamped rod with `handles` handles under a downward tip load.
fn relaxed_cantilever(handles: usize) -> Solver {
    let mut beam = bending_rod(0.0, LENGTH, handles, 100.0, BENDING_STIFFNESS);
    beam.load(vec![Load::force(
        handles - 1,
        Vector3::new(0.0, 0.0, -TIP_LOAD),
    )])
    .expect("tip load assignment succeeds");

    let mut solver = Solver::new(
        vec![beam],
        vec![Support::clamped(0, Boundary::Start)],
        Vec::new(),
        tight_config(),
    )
    .expect("cantilever setup is valid");
    let state = solver.solve().expect("relaxation succeeds");
    assert_ne!(state, SolverState::Aborted);
    solver
}

fn tip_deflection(solver: &Solver) -> f64 {
    let beam = &solver.beams()[0];
    let tip = beam.topology().handle_count() - 1;
    -beam.handle_frame(tip).expect("tip handle exists").origin.z
}

fn closed_form() -> f64 {
    TIP_LOAD * LENGTH.powi(3) / (3.0 * BENDING_STIFFNESS)
}

#[test]
fn tip_deflection_matches_closed_form_solution() {
    let solver = relaxed_cantilever(5);
    let deflection = tip_deflection(&solver);
    assert!(deflection > 0.0);
    assert_relative_eq!(deflection, closed_form(), max_relative = 1.5e-2);
}

#[test]
fn refinement_reduces_the_error() {
    let coarse = (tip_deflection(&relaxed_cantilever(3)) - closed_form()).abs();
    let fine = (tip_deflection(&relaxed_cantilever(5)) - closed_form()).abs();
    assert!(fine < coarse, "coarse error {coarse:e}, fine error {fine:e}");
}

#[test]
fn clamp_reactions_balance_the_tip_load() {
    let solver = relaxed_cantilever(5);
    let force = solver.reaction_force(0).expect("support exists");
    let moment = solver.reaction_moment(0).expect("support exists");

    assert_relative_eq!(force.z, TIP_LOAD, max_relative = 1.0e-3);
    assert!(force.x.abs() < 1.0e-6 && force.y.abs() < 1.0e-9);
    // Reaction moment about +Y is -F·L for a downward load at x = L.
    assert_relative_eq!(moment.y, -TIP_LOAD * LENGTH, max_relative = 1.0e-3);
    assert!(moment.x.abs() < 1.0e-9 && moment.z.abs() < 1.0e-9);
}

#[test]
fn bending_moment_decreases_linearly_towards_the_tip() {
    let solver = relaxed_cantilever(5);
    let beam = &solver.beams()[0];
    let vertices = beam.topology().vertex_count();
    let edge = LENGTH / (vertices - 1) as f64;

    for i in 1..vertices - 1 {
        let moment = beam
            .bending_moment(i, CoordinateSystem::Global)
            .expect("vertex exists");
        let expected = TIP_LOAD * (LENGTH - i as f64 * edge);
        assert_relative_eq!(moment.left.y, expected, max_relative = 1.0e-2);
        assert_relative_eq!(moment.left, moment.right, epsilon = 1.0e-9);
    }
}
