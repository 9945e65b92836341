//! Phase-by-phase dispatch of element stages across every beam.
//!
//! Each element phase owns a [`Cluster`] holding one callback per beam. A
//! cluster runs its callbacks either one after another or across a rayon
//! thread pool; beams never share mutable state inside a phase, so both
//! strategies produce bit-identical results.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::beam::Beam;
use crate::errors::RodError;

/// Step of the update pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Edges, strains and fitted tangents.
    Centerline,
    /// Constraints override vertex tangents.
    EnforceTangent,
    /// Curvature binormals.
    CurvatureBinormal,
    /// Material frames on the current tangents.
    MaterialFrame,
    /// Elastic links write coupling moments.
    CoupledMoment,
    /// Bending moments.
    BendingMoment,
    /// Twisting moments.
    TwistingMoment,
    /// Axial forces.
    AxialForce,
    /// Shear forces.
    ShearForce,
    /// Internal nodal moments and torques.
    InternalNodalMoment,
    /// Internal nodal forces.
    InternalNodalForce,
    /// Constraints write reaction moments.
    EnforceMoment,
    /// Constraints write reaction torques.
    EnforceTorque,
    /// Constraints write reaction forces.
    EnforceForce,
    /// Resultant moments and torques.
    ResultantNodalMoment,
    /// Resultant forces.
    ResultantNodalForce,
    /// Lumped translational masses.
    LumpedMass,
    /// Lumped rotational inertias.
    LumpedInertia,
}

impl Phase {
    /// Every phase run after the centerline moved.
    pub const FULL: [Self; 16] = [
        Self::Centerline,
        Self::EnforceTangent,
        Self::CurvatureBinormal,
        Self::MaterialFrame,
        Self::CoupledMoment,
        Self::BendingMoment,
        Self::TwistingMoment,
        Self::AxialForce,
        Self::ShearForce,
        Self::InternalNodalMoment,
        Self::InternalNodalForce,
        Self::EnforceMoment,
        Self::EnforceTorque,
        Self::EnforceForce,
        Self::ResultantNodalMoment,
        Self::ResultantNodalForce,
    ];

    /// Phases run after the sections spun about their tangents.
    pub const TWIST: [Self; 12] = [
        Self::CoupledMoment,
        Self::BendingMoment,
        Self::TwistingMoment,
        Self::AxialForce,
        Self::ShearForce,
        Self::InternalNodalMoment,
        Self::InternalNodalForce,
        Self::EnforceMoment,
        Self::EnforceTorque,
        Self::EnforceForce,
        Self::ResultantNodalMoment,
        Self::ResultantNodalForce,
    ];

    /// Phases run on a translational reset.
    pub const MASS: [Self; 1] = [Self::LumpedMass];

    /// Phases run on a rotational reset.
    pub const INERTIA: [Self; 1] = [Self::LumpedInertia];

    /// Phases run once on every beam before constraints snapshot the geometry.
    pub const GEOMETRY: [Self; 3] = [Self::Centerline, Self::CurvatureBinormal, Self::MaterialFrame];

    /// Whether constraints act in this phase instead of beams.
    #[must_use]
    pub const fn is_constraint(self) -> bool {
        matches!(
            self,
            Self::EnforceTangent
                | Self::CoupledMoment
                | Self::EnforceMoment
                | Self::EnforceTorque
                | Self::EnforceForce
        )
    }
}

/// How a cluster runs its callbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One beam after another on the calling thread.
    #[default]
    Sequential,
    /// Beams spread over the rayon thread pool.
    Parallel,
}

/// Stage function run on one beam.
pub type ElementStage = fn(&mut Beam) -> Result<(), RodError>;

/// Failure of a stage on a given beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageFailure {
    /// Index of the beam.
    pub beam: usize,
    /// Reported error.
    pub source: RodError,
}

impl Beam {
    /// Stage this beam runs in `phase`, if any.
    ///
    /// Beams without torsional stiffness skip the twisting and inertia stages.
    #[must_use]
    pub fn stage(&self, phase: Phase) -> Option<ElementStage> {
        let stage: ElementStage = match phase {
            Phase::Centerline => Self::update_centerline,
            Phase::CurvatureBinormal => Self::update_curvature_binormal,
            Phase::MaterialFrame => Self::update_material_frame,
            Phase::BendingMoment => Self::update_bending_moment,
            Phase::TwistingMoment if self.is_torsion_capable() => Self::update_twisting_moment,
            Phase::AxialForce => Self::update_axial_force,
            Phase::ShearForce => Self::update_shear_force,
            Phase::InternalNodalMoment => Self::update_internal_nodal_moment,
            Phase::InternalNodalForce => Self::update_internal_nodal_force,
            Phase::ResultantNodalMoment => Self::update_resultant_nodal_moment,
            Phase::ResultantNodalForce => Self::update_resultant_nodal_force,
            Phase::LumpedMass => Self::update_lumped_mass,
            Phase::LumpedInertia if self.is_torsion_capable() => Self::update_lumped_inertia,
            _ => return None,
        };
        Some(stage)
    }
}

/// Callbacks of every beam for one element phase.
#[derive(Clone, Debug)]
pub struct Cluster {
    /// Phase served.
    phase: Phase,
    /// Stage per beam, `None` where the beam skips the phase.
    stages: Vec<Option<ElementStage>>,
}

impl Cluster {
    /// Register the stage of every beam for `phase`.
    #[must_use]
    pub fn new(phase: Phase, beams: &[Beam]) -> Self {
        Self {
            phase,
            stages: beams.iter().map(|beam| beam.stage(phase)).collect(),
        }
    }

    /// Phase served by the cluster.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of beams with a stage registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.iter().flatten().count()
    }

    /// Whether no beam takes part in the phase.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every registered stage.
    ///
    /// # Errors
    ///
    /// Returns the first [`StageFailure`] reported by a beam. With
    /// [`Strategy::Parallel`] the beam reported is any failing beam.
    pub fn invoke(&self, beams: &mut [Beam], strategy: Strategy) -> Result<(), StageFailure> {
        let run = |(beam, (target, stage)): (usize, (&mut Beam, &Option<ElementStage>))| {
            stage.map_or(Ok(()), |stage| {
                stage(target).map_err(|source| StageFailure { beam, source })
            })
        };
        match strategy {
            Strategy::Sequential => beams.iter_mut().zip(&self.stages).enumerate().try_for_each(run),
            Strategy::Parallel => beams
                .par_iter_mut()
                .zip(self.stages.par_iter())
                .enumerate()
                .try_for_each(run),
        }
    }
}

/// Clusters for every element phase, built once per solver.
#[derive(Clone, Debug)]
pub struct Schedule {
    /// One cluster per element phase.
    clusters: Vec<Cluster>,
    /// How clusters dispatch their stages.
    strategy: Strategy,
}

impl Schedule {
    /// Build one cluster per element phase.
    #[must_use]
    pub fn new(beams: &[Beam], strategy: Strategy) -> Self {
        let phases = Phase::FULL
            .iter()
            .chain(&Phase::MASS)
            .chain(&Phase::INERTIA)
            .filter(|phase| !phase.is_constraint());
        Self {
            clusters: phases.map(|&phase| Cluster::new(phase, beams)).collect(),
            strategy,
        }
    }

    /// Execution strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Cluster serving `phase`, absent for constraint phases.
    #[must_use]
    pub fn cluster(&self, phase: Phase) -> Option<&Cluster> {
        self.clusters.iter().find(|cluster| cluster.phase == phase)
    }

    /// Run the element stages of `phase` on every beam.
    ///
    /// # Errors
    ///
    /// See [`Cluster::invoke`].
    pub fn invoke(&self, phase: Phase, beams: &mut [Beam]) -> Result<(), StageFailure> {
        match self.cluster(phase) {
            Some(cluster) => cluster.invoke(beams, self.strategy),
            None => Ok(()),
        }
    }
}
