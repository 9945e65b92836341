//! Discrete elastic rod with ghost vertices and per-vertex material frames.
//!
//! A [`Beam`] owns every array describing one rod: rest state, committed
//! frames, derived geometry, internal loads, reactions and the relaxation
//! degrees of freedom. The update pipeline lives in [`pipeline`](self) and
//! is driven phase by phase by the solver.

mod pipeline;

use nalgebra::{Vector2, Vector3};

use crate::errors::{ConfigurationError, RodError};
use crate::geometry::{
    curvature_arriving, curvature_leaving, twist_angle, Frame, OsculatingCircle, Sided,
};
use crate::loads::{ExternalLoads, LoadSet};
use crate::section::{Material, Section, Stiffness};
use crate::torsor::{CoordinateSystem, Torsor};
use crate::topology::RodTopology;

/// Tolerance used when validating user frames.
const FRAME_TOLERANCE: f64 = 1.0e-6;

/// Rest configuration, computed once at construction.
#[derive(Clone, Debug)]
struct RestState {
    /// Rest material frame per vertex.
    frames: Vec<Frame>,
    /// Rest length per edge.
    lengths: Vec<f64>,
    /// Rest curvature `(κ1, κ2)` from the three-point fit, per vertex.
    curvature: Vec<Vector2<f64>>,
    /// Rest curvature from one-sided fits against the rest tangent, per vertex.
    sided_curvature: Vec<Sided<Vector2<f64>>>,
    /// Rest twist angle per edge.
    twist: Vec<f64>,
}

/// Geometry recomputed from the committed frames on every pass.
#[derive(Clone, Debug)]
struct DerivedGeometry {
    /// Edge vectors.
    edges: Vec<Vector3<f64>>,
    /// Edge lengths.
    lengths: Vec<f64>,
    /// Unit edge tangents.
    edge_tangents: Vec<Vector3<f64>>,
    /// Axial strain per edge.
    strain: Vec<f64>,
    /// Vertex tangents, possibly overridden by a constraint.
    tangents: Vec<Vector3<f64>>,
    /// Whether a constraint overrode the tangent this pass.
    enforced: Vec<bool>,
    /// Curvature binormal of the three-point fit (zero at open ends).
    fit_curvature: Vec<Vector3<f64>>,
    /// Curvature binormal on each side of a vertex.
    curvature: Vec<Sided<Vector3<f64>>>,
    /// Current material frames.
    material: Vec<Frame>,
    /// Twist angle per edge.
    twist: Vec<f64>,
}

/// Internal and resolved external loads of the current pass.
#[derive(Clone, Debug)]
struct InternalLoads {
    /// Concentrated external force per vertex, global.
    applied_force: Vec<Vector3<f64>>,
    /// Concentrated external moment per vertex, global.
    applied_moment: Vec<Vector3<f64>>,
    /// Distributed external force per edge, global, per unit length.
    distributed_force: Vec<Vector3<f64>>,
    /// Distributed external moment per edge, global, per unit length.
    distributed_moment: Vec<Vector3<f64>>,
    /// Bending moment on each side of a vertex.
    bending: Vec<Sided<Vector3<f64>>>,
    /// Twisting moment per edge.
    torsion: Vec<f64>,
    /// Twisting moment on each side of a vertex.
    nodal_torsion: Vec<Sided<f64>>,
    /// Axial force per edge.
    axial: Vec<f64>,
    /// Shear force per edge.
    shear: Vec<Vector3<f64>>,
    /// Transverse internal nodal moment per vertex.
    moment: Vec<Vector3<f64>>,
    /// Internal nodal torque about the tangent per vertex.
    torque: Vec<f64>,
    /// Internal nodal force per vertex.
    force: Vec<Vector3<f64>>,
}

/// Reaction loads written by constraints.
#[derive(Clone, Debug)]
struct ReactionLoads {
    /// Reaction force per vertex.
    force: Vec<Vector3<f64>>,
    /// Reaction moment per vertex.
    moment: Vec<Vector3<f64>>,
}

/// Relaxation degrees of freedom.
#[derive(Clone, Debug)]
struct Dynamics {
    /// Translational velocity per vertex.
    velocity: Vec<Vector3<f64>>,
    /// Lumped translational mass per vertex.
    mass: Vec<f64>,
    /// Mass added by elastic links.
    extra_mass: Vec<f64>,
    /// Resultant force per vertex.
    resultant_force: Vec<Vector3<f64>>,
    /// Transverse resultant moment per vertex.
    resultant_moment: Vec<Vector3<f64>>,
    /// Angular velocity about the tangent per vertex.
    spin: Vec<f64>,
    /// Lumped rotational inertia per vertex.
    inertia: Vec<f64>,
    /// Inertia added by elastic links.
    extra_inertia: Vec<f64>,
    /// Resultant torque about the tangent per vertex.
    resultant_torque: Vec<f64>,
}

/// Mutable view on the translational degrees of freedom of a beam.
#[derive(Debug)]
pub struct TranslationDofs<'a> {
    /// Velocity per vertex.
    pub velocity: &'a mut [Vector3<f64>],
    /// Lumped mass per vertex.
    pub mass: &'a [f64],
    /// Resultant force per vertex.
    pub resultant: &'a [Vector3<f64>],
}

/// Mutable view on the rotational degrees of freedom of a beam.
#[derive(Debug)]
pub struct RotationDofs<'a> {
    /// Angular velocity about the tangent per vertex.
    pub velocity: &'a mut [f64],
    /// Lumped inertia per vertex.
    pub inertia: &'a [f64],
    /// Resultant torque per vertex.
    pub resultant: &'a [f64],
}

/// Elastic rod discretized into handle and ghost vertices.
#[derive(Clone, Debug)]
pub struct Beam {
    /// Vertex and edge counts.
    topology: RodTopology,
    /// Stiffness per edge.
    stiffness: Vec<Stiffness>,
    /// Whether any edge resists torsion.
    torsion: bool,
    /// Rest configuration.
    rest: RestState,
    /// Committed material frames; only `translate` and `rotate` change them.
    frames: Vec<Frame>,
    /// Whether `geometry.material` holds frames derived since the last commit.
    uncommitted: bool,
    /// Load records as supplied.
    loads: LoadSet,
    /// Load records expanded over vertices and edges.
    external: ExternalLoads,
    /// Geometry of the current pass.
    geometry: DerivedGeometry,
    /// Loads of the current pass.
    internal: InternalLoads,
    /// Constraint reactions.
    reactions: ReactionLoads,
    /// Relaxation state.
    dynamics: Dynamics,
}

impl Beam {
    /// Create an open rod from rest and initial handle frames.
    ///
    /// `sections` and `materials` hold either one value for the whole rod or
    /// one value per segment (`frames − 1`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when fewer than two frames are given, the
    /// lists disagree in length, a frame is not orthonormal, two handles
    /// coincide or a property is invalid.
    pub fn new(
        rest: &[Frame],
        actual: &[Frame],
        sections: &[Section],
        materials: &[Material],
    ) -> Result<Self, ConfigurationError> {
        if rest.len() < 2 {
            return Err(ConfigurationError::TooFewFrames {
                kind: "open",
                required: 2,
                received: rest.len(),
            });
        }
        Self::build(RodTopology::open(rest.len()), rest, actual, sections, materials)
    }

    /// Create a closed rod; the last handle connects back to the first.
    ///
    /// # Errors
    ///
    /// As [`Beam::new`], with at least three frames required.
    pub fn closed(
        rest: &[Frame],
        actual: &[Frame],
        sections: &[Section],
        materials: &[Material],
    ) -> Result<Self, ConfigurationError> {
        if rest.len() < 3 {
            return Err(ConfigurationError::TooFewFrames {
                kind: "closed",
                required: 3,
                received: rest.len(),
            });
        }
        Self::build(RodTopology::closed(rest.len()), rest, actual, sections, materials)
    }

    fn build(
        topology: RodTopology,
        rest: &[Frame],
        actual: &[Frame],
        sections: &[Section],
        materials: &[Material],
    ) -> Result<Self, ConfigurationError> {
        if rest.len() != actual.len() {
            return Err(ConfigurationError::FrameCountMismatch {
                rest: rest.len(),
                actual: actual.len(),
            });
        }
        for (index, frame) in rest.iter().chain(actual.iter()).enumerate() {
            if !frame.is_orthonormal(FRAME_TOLERANCE) {
                return Err(ConfigurationError::DegenerateFrame {
                    index: index % rest.len(),
                });
            }
        }
        let stiffness = expand_stiffness(&topology, sections, materials)?;
        let torsion = stiffness.iter().any(|s| s.gj > 0.0);

        let rest_frames = interpolate_ghosts(&topology, rest)?;
        let frames = interpolate_ghosts(&topology, actual)?;
        let rest = RestState::new(&topology, rest_frames)?;

        let nv = topology.vertex_count();
        let ne = topology.edge_count();
        let mut beam = Self {
            topology,
            stiffness,
            torsion,
            rest,
            frames: frames.clone(),
            uncommitted: false,
            loads: Vec::new(),
            external: ExternalLoads::zeros(&topology),
            geometry: DerivedGeometry {
                edges: vec![Vector3::zeros(); ne],
                lengths: vec![0.0; ne],
                edge_tangents: vec![Vector3::zeros(); ne],
                strain: vec![0.0; ne],
                tangents: frames.iter().map(|f| f.t).collect(),
                enforced: vec![false; nv],
                fit_curvature: vec![Vector3::zeros(); nv],
                curvature: vec![Sided::both(Vector3::zeros()); nv],
                material: frames,
                twist: vec![0.0; ne],
            },
            internal: InternalLoads {
                applied_force: vec![Vector3::zeros(); nv],
                applied_moment: vec![Vector3::zeros(); nv],
                distributed_force: vec![Vector3::zeros(); ne],
                distributed_moment: vec![Vector3::zeros(); ne],
                bending: vec![Sided::both(Vector3::zeros()); nv],
                torsion: vec![0.0; ne],
                nodal_torsion: vec![Sided::default(); nv],
                axial: vec![0.0; ne],
                shear: vec![Vector3::zeros(); ne],
                moment: vec![Vector3::zeros(); nv],
                torque: vec![0.0; nv],
                force: vec![Vector3::zeros(); nv],
            },
            reactions: ReactionLoads {
                force: vec![Vector3::zeros(); nv],
                moment: vec![Vector3::zeros(); nv],
            },
            dynamics: Dynamics {
                velocity: vec![Vector3::zeros(); nv],
                mass: vec![0.0; nv],
                extra_mass: vec![0.0; nv],
                resultant_force: vec![Vector3::zeros(); nv],
                resultant_moment: vec![Vector3::zeros(); nv],
                spin: vec![0.0; nv],
                inertia: vec![0.0; nv],
                extra_inertia: vec![0.0; nv],
                resultant_torque: vec![0.0; nv],
            },
        };
        beam.refresh().map_err(|error| match error {
            RodError::DegenerateEdge { edge, .. } => ConfigurationError::ZeroLengthSegment {
                segment: topology.edge_segment(edge),
            },
            source => ConfigurationError::InvalidInitialState { source },
        })?;
        Ok(beam)
    }

    /// Replace the external loads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when a load targets a missing handle or
    /// segment or provides the wrong number of values.
    pub fn load(&mut self, loads: LoadSet) -> Result<(), ConfigurationError> {
        self.external = ExternalLoads::expand(&self.topology, &loads)?;
        self.loads = loads;
        Ok(())
    }

    /// Load records currently applied.
    #[must_use]
    pub fn loads(&self) -> &LoadSet {
        &self.loads
    }

    /// Edit the load records in place and re-expand them.
    ///
    /// # Errors
    ///
    /// See [`Beam::load`].
    pub fn update_loads<F: FnOnce(&mut LoadSet)>(
        &mut self,
        update: F,
    ) -> Result<(), ConfigurationError> {
        let mut loads = std::mem::take(&mut self.loads);
        update(&mut loads);
        self.load(loads)
    }

    /// Vertex and edge counts.
    #[must_use]
    pub fn topology(&self) -> &RodTopology {
        &self.topology
    }

    /// Whether the rod carries torsional degrees of freedom.
    #[must_use]
    pub fn is_torsion_capable(&self) -> bool {
        self.torsion
    }

    /// Stiffness per edge.
    #[must_use]
    pub fn stiffness(&self) -> &[Stiffness] {
        &self.stiffness
    }

    /// Rest material frame per vertex.
    #[must_use]
    pub fn rest_frames(&self) -> &[Frame] {
        &self.rest.frames
    }

    /// Current material frame per vertex (handles and ghosts).
    #[must_use]
    pub fn actual_frames(&self) -> &[Frame] {
        &self.geometry.material
    }

    /// Current material frame per handle.
    #[must_use]
    pub fn handle_frames(&self) -> Vec<Frame> {
        self.geometry.material.iter().step_by(2).copied().collect()
    }

    /// Current material frame of handle `k`.
    #[must_use]
    pub fn handle_frame(&self, k: usize) -> Option<Frame> {
        if k < self.topology.handle_count() {
            Some(self.geometry.material[self.topology.handle_to_vertex(k)])
        } else {
            None
        }
    }

    /// Axial strain of edge `e`.
    #[must_use]
    pub fn strain(&self, e: usize) -> Option<f64> {
        self.geometry.strain.get(e).copied()
    }

    /// Twist angle of edge `e` measured from the rest twist.
    #[must_use]
    pub fn twist(&self, e: usize) -> Option<f64> {
        Some(self.geometry.twist.get(e)? - self.rest.twist[e])
    }

    /// Curvature binormal on both sides of vertex `i`.
    #[must_use]
    pub fn curvature(&self, i: usize) -> Option<Sided<Vector3<f64>>> {
        self.geometry.curvature.get(i).copied()
    }

    /// Axial force in edge `e`, positive in tension.
    #[must_use]
    pub fn axial_force(&self, e: usize) -> Option<f64> {
        self.internal.axial.get(e).copied()
    }

    /// Twisting moment in edge `e`.
    #[must_use]
    pub fn twisting_moment(&self, e: usize) -> Option<f64> {
        self.internal.torsion.get(e).copied()
    }

    /// Internal force (axial plus shear) carried by edge `e`.
    #[must_use]
    pub fn internal_force(&self, e: usize, system: CoordinateSystem) -> Option<Vector3<f64>> {
        let torsor = self.edge_torsor(e, *self.internal.shear.get(e)?, self.internal.axial[e]);
        Some(torsor.components(system))
    }

    /// Shear force carried by edge `e`.
    #[must_use]
    pub fn shear_force(&self, e: usize, system: CoordinateSystem) -> Option<Vector3<f64>> {
        let torsor = self.edge_torsor(e, *self.internal.shear.get(e)?, 0.0);
        Some(torsor.components(system))
    }

    /// Bending moment on both sides of vertex `i`.
    #[must_use]
    pub fn bending_moment(&self, i: usize, system: CoordinateSystem) -> Option<Sided<Vector3<f64>>> {
        let frame = *self.geometry.material.get(i)?;
        Some(
            self.internal.bending[i]
                .map(|moment| Torsor::new(moment, frame).components(system)),
        )
    }

    /// Resultant force at vertex `i`.
    #[must_use]
    pub fn resultant_force(&self, i: usize) -> Option<Vector3<f64>> {
        self.dynamics.resultant_force.get(i).copied()
    }

    /// Resultant torque about the tangent at vertex `i`.
    #[must_use]
    pub fn resultant_torque(&self, i: usize) -> Option<f64> {
        self.dynamics.resultant_torque.get(i).copied()
    }

    /// Reaction force written by the constraint owning vertex `i`.
    #[must_use]
    pub fn reaction_force(&self, i: usize) -> Option<Vector3<f64>> {
        self.reactions.force.get(i).copied()
    }

    /// Reaction moment written by the constraint owning vertex `i`.
    #[must_use]
    pub fn reaction_moment(&self, i: usize) -> Option<Vector3<f64>> {
        self.reactions.moment.get(i).copied()
    }

    /// Translational kinetic energy of the beam.
    #[must_use]
    pub fn translational_energy(&self) -> f64 {
        self.dynamics
            .velocity
            .iter()
            .zip(&self.dynamics.mass)
            .map(|(v, m)| 0.5 * m * v.norm_squared())
            .sum()
    }

    /// Rotational kinetic energy of the beam.
    #[must_use]
    pub fn rotational_energy(&self) -> f64 {
        self.dynamics
            .spin
            .iter()
            .zip(&self.dynamics.inertia)
            .map(|(w, j)| 0.5 * j * w * w)
            .sum()
    }

    /// Translate every vertex by `dx`.
    ///
    /// The material frames derived by the last pass are committed first, so
    /// the frames follow the centerline by time-parallel transport. Moves made
    /// between two passes accumulate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::LoadCountMismatch`] when `dx` does not
    /// hold one vector per vertex.
    pub fn translate(&mut self, dx: &[Vector3<f64>]) -> Result<(), ConfigurationError> {
        if dx.len() != self.topology.vertex_count() {
            return Err(ConfigurationError::LoadCountMismatch {
                expected: self.topology.vertex_count(),
                received: dx.len(),
            });
        }
        self.commit_frames();
        for ((frame, material), dx) in self
            .frames
            .iter_mut()
            .zip(&mut self.geometry.material)
            .zip(dx)
        {
            frame.origin += dx;
            material.origin += dx;
        }
        Ok(())
    }

    /// Spin every section about its tangent by `dtheta`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::LoadCountMismatch`] when `dtheta` does not
    /// hold one angle per vertex.
    pub fn rotate(&mut self, dtheta: &[f64]) -> Result<(), ConfigurationError> {
        if dtheta.len() != self.topology.vertex_count() {
            return Err(ConfigurationError::LoadCountMismatch {
                expected: self.topology.vertex_count(),
                received: dtheta.len(),
            });
        }
        for (i, angle) in dtheta.iter().enumerate() {
            self.rotate_vertex(i, *angle);
        }
        Ok(())
    }

    /// Translate every vertex by `factor · velocity`.
    pub(crate) fn advance_positions(&mut self, factor: f64) {
        self.commit_frames();
        for ((frame, material), v) in self
            .frames
            .iter_mut()
            .zip(&mut self.geometry.material)
            .zip(&self.dynamics.velocity)
        {
            let dx = v * factor;
            frame.origin += dx;
            material.origin += dx;
        }
    }

    /// Adopt the frames transported by the last pass, once per pass.
    fn commit_frames(&mut self) {
        if self.uncommitted {
            self.frames.clone_from(&self.geometry.material);
            self.uncommitted = false;
        }
    }

    /// Spin every section by `factor · spin`.
    pub(crate) fn advance_rotations(&mut self, factor: f64) {
        for i in 0..self.topology.vertex_count() {
            let angle = self.dynamics.spin[i] * factor;
            self.rotate_vertex(i, angle);
        }
    }

    /// Spin one section about its tangent.
    pub(crate) fn rotate_vertex(&mut self, i: usize, angle: f64) {
        self.frames[i] = self.frames[i].rotated_about_tangent(angle);
        self.geometry.material[i] = self.geometry.material[i].rotated_about_tangent(angle);
    }

    /// View on the translational degrees of freedom.
    pub fn translation_dofs(&mut self) -> TranslationDofs<'_> {
        TranslationDofs {
            velocity: &mut self.dynamics.velocity,
            mass: &self.dynamics.mass,
            resultant: &self.dynamics.resultant_force,
        }
    }

    /// View on the rotational degrees of freedom.
    pub fn rotation_dofs(&mut self) -> RotationDofs<'_> {
        RotationDofs {
            velocity: &mut self.dynamics.spin,
            inertia: &self.dynamics.inertia,
            resultant: &self.dynamics.resultant_torque,
        }
    }

    /// Vertex index of handle `k`.
    pub(crate) fn handle_vertex(&self, k: usize) -> Result<usize, ConfigurationError> {
        if k < self.topology.handle_count() {
            Ok(self.topology.handle_to_vertex(k))
        } else {
            Err(ConfigurationError::HandleOutOfRange {
                index: k,
                count: self.topology.handle_count(),
            })
        }
    }

    /// Position of vertex `i`.
    pub(crate) fn position(&self, i: usize) -> Vector3<f64> {
        self.frames[i].origin
    }

    /// Committed frame of vertex `i`.
    pub(crate) fn committed_frame(&self, i: usize) -> &Frame {
        &self.frames[i]
    }

    /// Current material frame of vertex `i`.
    pub(crate) fn material_frame(&self, i: usize) -> &Frame {
        &self.geometry.material[i]
    }

    /// Current tangent of vertex `i`.
    pub(crate) fn tangent(&self, i: usize) -> Vector3<f64> {
        self.geometry.tangents[i]
    }

    /// Tangent of vertex `i` implied by its neighbours alone, with the bending
    /// stiffness per length that resists turning it.
    pub(crate) fn free_tangent(&self, i: usize) -> (Vector3<f64>, f64) {
        let weight = |e: usize| self.stiffness[e].ei_max() / self.geometry.lengths[e];
        match (self.topology.left_edge(i), self.topology.right_edge(i)) {
            (Some(l), Some(r)) => (self.geometry.tangents[i], weight(l) + weight(r)),
            (Some(l), None) => (self.geometry.edge_tangents[l], weight(l)),
            (None, Some(r)) => (self.geometry.edge_tangents[r], weight(r)),
            (None, None) => (self.geometry.tangents[i], 0.0),
        }
    }

    /// Override the tangent of vertex `i` for this pass.
    pub(crate) fn enforce_tangent(&mut self, i: usize, t: Vector3<f64>) {
        self.geometry.tangents[i] = t;
        self.geometry.enforced[i] = true;
    }

    /// Lumped mass of vertex `i`.
    pub(crate) fn mass(&self, i: usize) -> f64 {
        self.dynamics.mass[i]
    }

    /// Lumped inertia of vertex `i`.
    pub(crate) fn inertia(&self, i: usize) -> f64 {
        self.dynamics.inertia[i]
    }

    /// Add a spring's stiffness to the lumped mass of vertex `i`.
    pub(crate) fn add_extra_mass(&mut self, i: usize, mass: f64) {
        self.dynamics.extra_mass[i] += mass;
    }

    /// Add a rotational spring's stiffness to the lumped inertia of vertex `i`.
    pub(crate) fn add_extra_inertia(&mut self, i: usize, inertia: f64) {
        self.dynamics.extra_inertia[i] += inertia;
    }

    /// Internal plus applied force at vertex `i`, before any reaction.
    pub(crate) fn unbalanced_force(&self, i: usize) -> Vector3<f64> {
        self.internal.force[i] + self.total_applied_force(i)
    }

    /// Transverse internal plus applied moment at vertex `i`, before any reaction.
    pub(crate) fn unbalanced_moment(&self, i: usize) -> Vector3<f64> {
        let t = self.geometry.tangents[i];
        let applied = self.internal.applied_moment[i];
        self.internal.moment[i] + applied - t * t.dot(&applied)
    }

    /// Internal plus applied torque about the tangent at vertex `i`, before any reaction.
    pub(crate) fn unbalanced_torque(&self, i: usize) -> f64 {
        self.internal.torque[i] + self.total_applied_torque(i)
    }

    /// Overwrite the reaction force of vertex `i`.
    pub(crate) fn set_reaction_force(&mut self, i: usize, force: Vector3<f64>) {
        self.reactions.force[i] = force;
    }

    /// Overwrite the reaction moment of vertex `i`.
    pub(crate) fn set_reaction_moment(&mut self, i: usize, moment: Vector3<f64>) {
        self.reactions.moment[i] = moment;
    }

    /// Replace the tangential part of the reaction moment of vertex `i`.
    pub(crate) fn set_reaction_torque(&mut self, i: usize, torque: f64) {
        let t = self.geometry.tangents[i];
        let moment = self.reactions.moment[i];
        self.reactions.moment[i] = moment - t * t.dot(&moment) + t * torque;
    }

    /// Concentrated plus lumped distributed force at vertex `i`.
    fn total_applied_force(&self, i: usize) -> Vector3<f64> {
        let mut force = self.internal.applied_force[i];
        for e in self.adjacent_edges(i).into_iter().flatten() {
            force += self.internal.distributed_force[e] * (0.5 * self.geometry.lengths[e]);
        }
        force
    }

    /// Concentrated plus lumped distributed torque about the tangent at vertex `i`.
    fn total_applied_torque(&self, i: usize) -> f64 {
        let t = self.geometry.tangents[i];
        let mut torque = self.internal.applied_moment[i].dot(&t);
        for e in self.adjacent_edges(i).into_iter().flatten() {
            torque += self.internal.distributed_moment[e].dot(&t) * (0.5 * self.geometry.lengths[e]);
        }
        torque
    }

    /// Edges on the left and right of vertex `i`.
    fn adjacent_edges(&self, i: usize) -> [Option<usize>; 2] {
        [self.topology.left_edge(i), self.topology.right_edge(i)]
    }

    /// Force on edge `e` reported in the frame transported to its midpoint.
    fn edge_torsor(&self, e: usize, shear: Vector3<f64>, axial: f64) -> Torsor {
        let (a, b) = self.topology.edge_vertices(e);
        let u = self.geometry.edge_tangents[e];
        let origin = (self.geometry.material[a].origin + self.geometry.material[b].origin) * 0.5;
        let frame = self.geometry.material[a].transported(&u).with_origin(origin);
        Torsor::new(shear + u * axial, frame)
    }

    /// Run every element stage once without constraints.
    fn refresh(&mut self) -> Result<(), RodError> {
        self.update_centerline()?;
        self.update_curvature_binormal()?;
        self.update_material_frame()?;
        self.update_bending_moment()?;
        self.update_twisting_moment()?;
        self.update_axial_force()?;
        self.update_shear_force()?;
        self.update_internal_nodal_moment()?;
        self.update_internal_nodal_force()?;
        self.update_resultant_nodal_moment()?;
        self.update_resultant_nodal_force()
    }
}

impl RestState {
    fn new(topology: &RodTopology, frames: Vec<Frame>) -> Result<Self, ConfigurationError> {
        let nv = topology.vertex_count();
        let ne = topology.edge_count();
        let mut lengths = vec![0.0; ne];
        for (e, length) in lengths.iter_mut().enumerate() {
            let (a, b) = topology.edge_vertices(e);
            *length = (frames[b].origin - frames[a].origin).norm();
            if !(*length > 0.0) {
                return Err(ConfigurationError::ZeroLengthSegment {
                    segment: topology.edge_segment(e),
                });
            }
        }

        // Free vertices measure curvature and twist in frames carried onto the
        // fitted tangent, exactly as the update pipeline does.
        let mut fitted = Vec::with_capacity(nv);
        let mut curvature = vec![Vector2::zeros(); nv];
        for i in 0..nv {
            let (t, kb) = fit_vertex(topology, &frames, i).ok_or(
                ConfigurationError::ZeroLengthSegment {
                    segment: topology.edge_segment(topology.left_edge(i).unwrap_or(i)),
                },
            )?;
            let frame = frames[i].transported(&t);
            curvature[i] = Vector2::new(kb.dot(&frame.d1), kb.dot(&frame.d2));
            fitted.push(frame);
        }
        let twist = (0..ne)
            .map(|e| {
                let (a, b) = topology.edge_vertices(e);
                twist_angle(&fitted[a], &fitted[b])
            })
            .collect();

        // Vertices holding an imposed tangent measure curvature against the
        // rest frame tangent instead.
        let mut sided_curvature = vec![Sided::both(Vector2::zeros()); nv];
        for (i, sided) in sided_curvature.iter_mut().enumerate() {
            let frame = &frames[i];
            let components = |kb: Vector3<f64>| Vector2::new(kb.dot(&frame.d1), kb.dot(&frame.d2));
            if let Some(e) = topology.left_edge(i) {
                let (a, _) = topology.edge_vertices(e);
                let u = (frame.origin - frames[a].origin) / lengths[e];
                sided.left = components(curvature_arriving(&u, &frame.t, lengths[e]));
            }
            if let Some(e) = topology.right_edge(i) {
                let (_, b) = topology.edge_vertices(e);
                let u = (frames[b].origin - frame.origin) / lengths[e];
                sided.right = components(curvature_leaving(&frame.t, &u, lengths[e]));
            }
        }

        Ok(Self {
            frames,
            lengths,
            curvature,
            sided_curvature,
            twist,
        })
    }
}

/// Expand per-segment sections and materials into per-edge stiffness.
fn expand_stiffness(
    topology: &RodTopology,
    sections: &[Section],
    materials: &[Material],
) -> Result<Vec<Stiffness>, ConfigurationError> {
    let segments = topology.segment_count();
    for (what, received) in [("sections", sections.len()), ("materials", materials.len())] {
        if received != 1 && received != segments {
            return Err(ConfigurationError::PropertyCountMismatch {
                what,
                segments,
                received,
            });
        }
    }
    let mut stiffness = Vec::with_capacity(topology.edge_count());
    for segment in 0..segments {
        let section = &sections[segment.min(sections.len() - 1)];
        let material = &materials[segment.min(materials.len() - 1)];
        Section::new(section.area, section.i1, section.i2, section.j)
            .and_then(|_| Material::new(material.young_modulus, material.shear_modulus))
            .map_err(|source| ConfigurationError::InvalidSection { segment, source })?;
        let value = Stiffness::new(section, material);
        stiffness.extend([value, value]);
    }
    Ok(stiffness)
}

/// Tangent and curvature binormal of vertex `i` from the circle through it and
/// its neighbours.
///
/// Ends of an open rod take the end tangent of the circle through the first or
/// last three vertices and report no curvature.
fn fit_vertex(
    topology: &RodTopology,
    frames: &[Frame],
    i: usize,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let (p0, p1, p2) = match (topology.prev_vertex(i), topology.next_vertex(i)) {
        (Some(p), Some(n)) => (p, i, n),
        (None, Some(n)) => (i, n, topology.next_vertex(n)?),
        (Some(p), None) => (topology.prev_vertex(p)?, p, i),
        (None, None) => return None,
    };
    let circle = OsculatingCircle::fit(&frames[p0].origin, &frames[p1].origin, &frames[p2].origin)?;
    Some(if p1 == i {
        (circle.t1, circle.kb)
    } else if p0 == i {
        (circle.t0, Vector3::zeros())
    } else {
        (circle.t2, Vector3::zeros())
    })
}

/// Insert a ghost frame at the Hermite midpoint of every segment.
fn interpolate_ghosts(
    topology: &RodTopology,
    handles: &[Frame],
) -> Result<Vec<Frame>, ConfigurationError> {
    let mut frames = Vec::with_capacity(topology.vertex_count());
    for segment in 0..topology.segment_count() {
        let a = &handles[segment];
        let b = &handles[(segment + 1) % handles.len()];
        let chord = b.origin - a.origin;
        let l = chord.norm();
        if !(l > 0.0 && l.is_finite()) {
            return Err(ConfigurationError::ZeroLengthSegment { segment });
        }
        let origin = (a.origin + b.origin) * 0.5 + (a.t - b.t) * (l / 8.0);
        let derivative = chord * 1.5 - (a.t + b.t) * (0.25 * l);
        let t = derivative
            .try_normalize(0.0)
            .ok_or(ConfigurationError::ZeroLengthSegment { segment })?;
        let ghost = a
            .transported(&t)
            .with_origin(origin)
            .rotated_about_tangent(0.5 * twist_angle(a, b));
        frames.push(*a);
        frames.push(ghost);
    }
    if !topology.is_closed() {
        frames.push(handles[handles.len() - 1]);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests;
