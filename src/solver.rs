//! Kinetic dynamic relaxation of an assembly of beams.
//!
//! Two sub-problems are relaxed in turn every iteration: the positions of
//! every vertex ("x") and the spin of every section about its tangent
//! ("θ"), the latter only on beams with torsional stiffness. Each follows a
//! fictitious undamped motion until its kinetic energy peaks, then steps back
//! to the interpolated peak and restarts from rest.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::assembly::Assembly;
use crate::beam::Beam;
use crate::cluster::{Phase, Schedule};
use crate::config::SolverConfig;
use crate::errors::{ConfigurationError, SolverError};
use crate::link::Link;
use crate::loads::LoadSet;
use crate::support::Support;

/// Lifecycle of a relaxation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverState {
    /// Steps may still be taken.
    Running,
    /// Both kinetic energies dropped below their tolerance.
    Converged,
    /// The iteration budget was spent first.
    Ended,
    /// A numerical failure stopped the run.
    Aborted,
}

/// Sub-problem relaxed by the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Problem {
    /// Vertex positions.
    Translation,
    /// Section spin about the tangent.
    Rotation,
}

impl Problem {
    /// Short label used in logs and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Translation => "x",
            Self::Rotation => "theta",
        }
    }
}

/// Kinetic energy peak detected during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakEvent {
    /// Sub-problem that peaked.
    pub problem: Problem,
    /// Iteration at which the peak was detected.
    pub iteration: usize,
    /// Interpolated peak energy.
    pub energy: f64,
    /// Fraction of a step moved back to reach the peak.
    pub backtrack: f64,
}

/// Summary of a relaxation run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    /// Current state.
    pub state: SolverState,
    /// Iterations performed.
    pub iterations: usize,
    /// Latest translational kinetic energy.
    pub x_energy: f64,
    /// Latest rotational kinetic energy.
    pub theta_energy: f64,
    /// Translational peaks handled.
    pub x_peaks: usize,
    /// Rotational peaks handled.
    pub theta_peaks: usize,
}

/// Read-only hooks called while relaxing.
pub trait Observer {
    /// Called after a kinetic energy peak was detected, before the restart.
    fn on_peak(&mut self, _event: &PeakEvent) {}

    /// Called once when the run converges.
    fn on_converged(&mut self, _report: &SolverReport) {}
}

/// Closure updating the loads of one beam from the fictitious time.
pub type LoadUpdate = Box<dyn FnMut(f64, &mut LoadSet) + Send>;

/// Backtrack fraction and energy of the parabola through three energy samples.
///
/// `e0`, `e1`, `e2` are consecutive samples with `e2 < e1`. The returned
/// fraction `q` is the part of the last step to undo to reach the peak; it is
/// zero when the samples are not concave.
///
/// # Examples
/// ```
/// use rodrelax::interpolate_peak;
///
/// let (q, peak) = interpolate_peak(1.0, 2.0, 1.0);
/// assert_eq!(q, 0.5);
/// assert_eq!(peak, 2.0);
/// ```
#[must_use]
pub fn interpolate_peak(e0: f64, e1: f64, e2: f64) -> (f64, f64) {
    let curvature = e0 - 2.0 * e1 + e2;
    if curvature >= 0.0 || !curvature.is_finite() {
        return (0.0, e0.max(e1).max(e2));
    }
    let q = (e2 - e1) / curvature;
    let peak = e1 - (e2 - e0).powi(2) / (8.0 * curvature);
    (q, peak)
}

/// Last two energy samples of a sub-problem.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct EnergyHistory {
    /// Previous and latest energy.
    samples: [f64; 2],
    /// Peaks handled so far.
    peaks: usize,
}

impl EnergyHistory {
    /// Latest energy.
    fn latest(&self) -> f64 {
        self.samples[1]
    }

    /// Record an accepted step.
    fn push(&mut self, energy: f64) {
        self.samples = [self.samples[1], energy];
    }

    /// Forget the history after a restart from rest.
    fn restart(&mut self, energy: f64) {
        self.samples = [0.0, energy];
    }
}

/// Kinetic dynamic relaxation solver owning beams and their constraints.
pub struct Solver {
    /// Relaxed beams.
    beams: Vec<Beam>,
    /// Attached supports.
    supports: Vec<Support>,
    /// Attached links.
    links: Vec<Link>,
    /// Settings of the run.
    config: SolverConfig,
    /// Element stages per phase.
    schedule: Schedule,
    /// Lifecycle state.
    state: SolverState,
    /// Iterations performed.
    iteration: usize,
    /// Translational energy history.
    x: EnergyHistory,
    /// Rotational energy history.
    theta: EnergyHistory,
    /// Hooks called on peaks and convergence.
    observers: Vec<Box<dyn Observer>>,
    /// Per-beam load updates run before every iteration.
    load_updates: Vec<(usize, LoadUpdate)>,
}

impl Solver {
    /// Attach constraints, snapshot the initial geometry and take the first
    /// half step.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Configuration`] when a setting, support or link
    /// is invalid or two constraints claim the same vertex, and
    /// [`SolverError::NumericalDivergence`] when the initial state is degenerate.
    pub fn new(
        beams: Vec<Beam>,
        mut supports: Vec<Support>,
        mut links: Vec<Link>,
        config: SolverConfig,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        let mut owners = HashSet::new();
        for support in &mut supports {
            let handle = support.attach(&beams)?;
            if support.is_active() && !owners.insert((support.beam(), support.vertex())) {
                return Err(ConfigurationError::ConflictingReaction {
                    beam: support.beam(),
                    handle,
                }
                .into());
            }
        }
        for link in &mut links {
            link.attach(&beams)?;
            for (beam, handle, vertex) in link.slots() {
                if !owners.insert((beam, vertex)) {
                    return Err(ConfigurationError::ConflictingReaction { beam, handle }.into());
                }
            }
        }
        for component in Assembly::new(beams.len(), &supports, &links).unsupported_components() {
            warn!(beams = ?component, "connected beams carry no pinned or clamped support");
        }

        let schedule = Schedule::new(&beams, config.strategy);
        let mut solver = Self {
            beams,
            supports,
            links,
            config,
            schedule,
            state: SolverState::Running,
            iteration: 0,
            x: EnergyHistory::default(),
            theta: EnergyHistory::default(),
            observers: Vec::new(),
            load_updates: Vec::new(),
        };
        solver.initialize()?;
        info!(
            beams = solver.beams.len(),
            supports = solver.supports.len(),
            links = solver.links.len(),
            "solver initialized"
        );
        Ok(solver)
    }

    /// Register an observer.
    pub fn observe<O: Observer + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Register a closure updating the loads of `beam` before every iteration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownBeam`] when `beam` does not exist.
    pub fn on_load_update<F>(&mut self, beam: usize, update: F) -> Result<(), ConfigurationError>
    where
        F: FnMut(f64, &mut LoadSet) + Send + 'static,
    {
        if beam >= self.beams.len() {
            return Err(ConfigurationError::UnknownBeam(beam));
        }
        self.load_updates.push((beam, Box::new(update)));
        Ok(())
    }

    /// Take up to `steps` iterations.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Finished`] when the run already stopped, and the
    /// failure that moved the solver to [`SolverState::Aborted`] otherwise.
    #[instrument(skip(self), fields(start = self.iteration))]
    pub fn run(&mut self, steps: usize) -> Result<SolverState, SolverError> {
        if self.state != SolverState::Running {
            return Err(SolverError::Finished(self.state));
        }
        for _ in 0..steps {
            if self.iteration >= self.config.max_iterations {
                break;
            }
            if let Err(failure) = self.step() {
                self.state = SolverState::Aborted;
                error!(iteration = self.iteration, %failure, "relaxation aborted");
                return Err(failure);
            }
            if self.x.latest() < self.config.x_tolerance
                && self.theta.latest() < self.config.theta_tolerance
            {
                self.state = SolverState::Converged;
                let report = self.report();
                info!(iterations = report.iterations, "relaxation converged");
                for observer in &mut self.observers {
                    observer.on_converged(&report);
                }
                return Ok(self.state);
            }
        }
        if self.iteration >= self.config.max_iterations {
            self.state = SolverState::Ended;
            info!(
                iterations = self.iteration,
                x_energy = self.x.latest(),
                theta_energy = self.theta.latest(),
                "iteration budget spent"
            );
        }
        Ok(self.state)
    }

    /// Iterate until convergence or the end of the budget.
    ///
    /// # Errors
    ///
    /// See [`Solver::run`].
    pub fn solve(&mut self) -> Result<SolverState, SolverError> {
        let remaining = self.config.max_iterations.saturating_sub(self.iteration);
        self.run(remaining.max(1))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Iterations performed.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Settings of the run.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn report(&self) -> SolverReport {
        SolverReport {
            state: self.state,
            iterations: self.iteration,
            x_energy: self.x.latest(),
            theta_energy: self.theta.latest(),
            x_peaks: self.x.peaks,
            theta_peaks: self.theta.peaks,
        }
    }

    /// Beams in the order given at construction.
    #[must_use]
    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    /// Beam `index`.
    #[must_use]
    pub fn beam(&self, index: usize) -> Option<&Beam> {
        self.beams.get(index)
    }

    /// Supports in the order given at construction.
    #[must_use]
    pub fn supports(&self) -> &[Support] {
        &self.supports
    }

    /// Links in the order given at construction.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Reaction force of support `index`.
    #[must_use]
    pub fn reaction_force(&self, index: usize) -> Option<nalgebra::Vector3<f64>> {
        Some(self.supports.get(index)?.reaction_force(&self.beams))
    }

    /// Reaction moment of support `index`.
    #[must_use]
    pub fn reaction_moment(&self, index: usize) -> Option<nalgebra::Vector3<f64>> {
        Some(self.supports.get(index)?.reaction_moment(&self.beams))
    }

    /// Release the beams.
    #[must_use]
    pub fn into_beams(self) -> Vec<Beam> {
        self.beams
    }

    /// Capture constraint references, seed the masses, run a full pass and restart both problems.
    fn initialize(&mut self) -> Result<(), SolverError> {
        self.update(&Phase::GEOMETRY)?;
        for support in &mut self.supports {
            support.init(&mut self.beams);
        }
        for link in &mut self.links {
            link.init(&mut self.beams);
        }
        // Rigid links split their reactions by mass and inertia.
        self.update(&Phase::MASS)?;
        self.update(&Phase::INERTIA)?;
        self.update(&Phase::FULL)?;
        self.restart_translation()?;
        self.restart_rotation()
    }

    /// One iteration: translational step, rotational step.
    fn step(&mut self) -> Result<(), SolverError> {
        if !self.load_updates.is_empty() {
            let time = self.iteration as f64 * self.config.time_step;
            for (beam, update) in &mut self.load_updates {
                self.beams[*beam].update_loads(|loads| update(time, loads))?;
            }
            self.update(&Phase::FULL)?;
        }
        self.step_translation()?;
        self.step_rotation()?;
        self.iteration += 1;
        Ok(())
    }

    /// Leapfrog step of the positions, backtracking to the peak when the energy drops.
    fn step_translation(&mut self) -> Result<(), SolverError> {
        let dt = self.config.time_step;
        let mut energy = 0.0;
        for beam in &mut self.beams {
            let dofs = beam.translation_dofs();
            for ((v, m), r) in dofs.velocity.iter_mut().zip(dofs.mass).zip(dofs.resultant) {
                *v += r * (dt / m);
                energy += 0.5 * m * v.norm_squared();
            }
        }
        self.check_energy(Problem::Translation, energy)?;

        if energy >= self.x.latest() {
            for beam in &mut self.beams {
                beam.advance_positions(dt);
            }
            self.update(&Phase::FULL)?;
            self.x.push(energy);
            return Ok(());
        }

        let [e0, e1] = self.x.samples;
        let q = self.notify_peak(Problem::Translation, e0, e1, energy);
        for beam in &mut self.beams {
            let dofs = beam.translation_dofs();
            for ((v, m), r) in dofs.velocity.iter_mut().zip(dofs.mass).zip(dofs.resultant) {
                *v -= r * (dt / m);
            }
            beam.advance_positions(-q * dt);
        }
        self.update(&Phase::FULL)?;
        self.restart_translation()
    }

    /// Leapfrog step of the spins, backtracking to the peak when the energy drops.
    fn step_rotation(&mut self) -> Result<(), SolverError> {
        let dt = self.config.time_step;
        let mut energy = 0.0;
        for beam in self.beams.iter_mut().filter(|beam| beam.is_torsion_capable()) {
            let dofs = beam.rotation_dofs();
            for ((w, j), r) in dofs.velocity.iter_mut().zip(dofs.inertia).zip(dofs.resultant) {
                *w += r * (dt / j);
                energy += 0.5 * j * *w * *w;
            }
        }
        self.check_energy(Problem::Rotation, energy)?;

        if energy == 0.0 || energy >= self.theta.latest() {
            for beam in self.beams.iter_mut().filter(|beam| beam.is_torsion_capable()) {
                beam.advance_rotations(dt);
            }
            self.update(&Phase::TWIST)?;
            self.theta.push(energy);
            return Ok(());
        }

        let [e0, e1] = self.theta.samples;
        let q = self.notify_peak(Problem::Rotation, e0, e1, energy);
        for beam in self.beams.iter_mut().filter(|beam| beam.is_torsion_capable()) {
            let dofs = beam.rotation_dofs();
            for ((w, j), r) in dofs.velocity.iter_mut().zip(dofs.inertia).zip(dofs.resultant) {
                *w -= r * (dt / j);
            }
            beam.advance_rotations(-q * dt);
        }
        self.update(&Phase::TWIST)?;
        self.restart_rotation()
    }

    /// Recompute masses and restart the positions from rest with a half step.
    fn restart_translation(&mut self) -> Result<(), SolverError> {
        self.update(&Phase::MASS)?;
        let dt = self.config.time_step;
        let mut energy = 0.0;
        for beam in &mut self.beams {
            let dofs = beam.translation_dofs();
            for ((v, m), r) in dofs.velocity.iter_mut().zip(dofs.mass).zip(dofs.resultant) {
                *v = r * (0.5 * dt / m);
                energy += 0.5 * m * v.norm_squared();
            }
            beam.advance_positions(dt);
        }
        self.update(&Phase::FULL)?;
        self.check_energy(Problem::Translation, energy)?;
        self.x.restart(energy);
        debug!(iteration = self.iteration, energy, "translation restarted");
        Ok(())
    }

    /// Recompute inertias and restart the spins from rest with a half step.
    fn restart_rotation(&mut self) -> Result<(), SolverError> {
        self.update(&Phase::INERTIA)?;
        let dt = self.config.time_step;
        let mut energy = 0.0;
        for beam in self.beams.iter_mut().filter(|beam| beam.is_torsion_capable()) {
            let dofs = beam.rotation_dofs();
            for ((w, j), r) in dofs.velocity.iter_mut().zip(dofs.inertia).zip(dofs.resultant) {
                *w = r * (0.5 * dt / j);
                energy += 0.5 * j * *w * *w;
            }
            beam.advance_rotations(dt);
        }
        self.update(&Phase::TWIST)?;
        self.check_energy(Problem::Rotation, energy)?;
        self.theta.restart(energy);
        debug!(iteration = self.iteration, energy, "rotation restarted");
        Ok(())
    }

    /// Count a peak, tell the observers and return the backtrack fraction.
    fn notify_peak(&mut self, problem: Problem, e0: f64, e1: f64, e2: f64) -> f64 {
        let (backtrack, energy) = interpolate_peak(e0, e1, e2);
        let history = match problem {
            Problem::Translation => &mut self.x,
            Problem::Rotation => &mut self.theta,
        };
        history.peaks += 1;
        let event = PeakEvent {
            problem,
            iteration: self.iteration,
            energy,
            backtrack,
        };
        debug!(
            problem = problem.label(),
            iteration = self.iteration,
            energy,
            backtrack,
            "kinetic energy peak"
        );
        for observer in &mut self.observers {
            observer.on_peak(&event);
        }
        backtrack
    }

    /// Reject NaN or infinite kinetic energy.
    fn check_energy(&self, problem: Problem, energy: f64) -> Result<(), SolverError> {
        if energy.is_finite() {
            Ok(())
        } else {
            Err(SolverError::NonFiniteEnergy {
                problem: problem.label(),
                iteration: self.iteration,
            })
        }
    }

    /// Run `phases` in order, element stages through the schedule and
    /// constraint stages sequentially.
    fn update(&mut self, phases: &[Phase]) -> Result<(), SolverError> {
        for &phase in phases {
            if phase.is_constraint() {
                self.enforce(phase);
                continue;
            }
            self.schedule
                .invoke(phase, &mut self.beams)
                .map_err(|failure| SolverError::NumericalDivergence {
                    iteration: self.iteration,
                    phase,
                    beam: failure.beam,
                    source: failure.source,
                })?;
        }
        Ok(())
    }

    /// Let every support and link write its reactions for `phase`.
    fn enforce(&mut self, phase: Phase) {
        let beams = &mut self.beams;
        match phase {
            Phase::EnforceTangent => {
                self.supports.iter().for_each(|s| s.enforce_tangent(beams));
                self.links.iter().for_each(|l| l.enforce_tangent(beams));
            }
            Phase::CoupledMoment => {
                self.links.iter().for_each(|l| l.enforce_coupled_moment(beams));
            }
            Phase::EnforceMoment => {
                self.supports.iter().for_each(|s| s.enforce_moment(beams));
                self.links.iter().for_each(|l| l.enforce_moment(beams));
            }
            Phase::EnforceTorque => {
                self.supports.iter().for_each(|s| s.enforce_torque(beams));
                self.links.iter().for_each(|l| l.enforce_torque(beams));
            }
            Phase::EnforceForce => {
                self.supports.iter().for_each(|s| s.enforce_force(beams));
                self.links.iter().for_each(|l| l.enforce_force(beams));
            }
            _ => {}
        }
    }
}
