//! Boundary conditions attached to a single beam vertex.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::beam::Beam;
use crate::errors::ConfigurationError;
use crate::geometry::{twist_angle, Frame};

/// Vertex a support or link is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    /// First handle of an open rod.
    Start,
    /// Last handle of an open rod.
    End,
    /// Any handle, by index.
    Handle(usize),
}

impl Boundary {
    /// Handle index on `beam`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NoBoundary`] for `Start` or `End` on a
    /// closed rod and [`ConfigurationError::HandleOutOfRange`] for a missing handle.
    pub fn handle(self, beam: &Beam) -> Result<usize, ConfigurationError> {
        let topology = beam.topology();
        let handle = match self {
            Self::Start if topology.is_closed() => return Err(ConfigurationError::NoBoundary("start")),
            Self::End if topology.is_closed() => return Err(ConfigurationError::NoBoundary("end")),
            Self::Start => 0,
            Self::End => topology.handle_count() - 1,
            Self::Handle(k) => k,
        };
        beam.handle_vertex(handle).map(|_| handle)
    }
}

/// Degrees of freedom removed by a support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportKind {
    /// Nothing is fixed.
    Free,
    /// Position is fixed, the section may rotate.
    Pinned,
    /// Position and orientation are fixed.
    Clamped,
}

/// Support attached to one handle of one beam.
#[derive(Clone, Debug, PartialEq)]
pub struct Support {
    /// Index of the supported beam.
    beam: usize,
    /// Supported handle.
    boundary: Boundary,
    /// Fixed degrees of freedom.
    kind: SupportKind,
    /// Orientation imposed on a clamped section at initialization.
    reference: Option<Frame>,
    /// Vertex index, resolved on attachment.
    vertex: usize,
    /// Orientation held by a clamped section.
    frame: Option<Frame>,
}

impl Support {
    /// Support with an unresolved vertex.
    fn new(beam: usize, boundary: Boundary, kind: SupportKind) -> Self {
        Self {
            beam,
            boundary,
            kind,
            reference: None,
            vertex: 0,
            frame: None,
        }
    }

    /// Support that leaves the vertex free; reports zero reactions.
    #[must_use]
    pub fn free(beam: usize, boundary: Boundary) -> Self {
        Self::new(beam, boundary, SupportKind::Free)
    }

    /// Support that fixes the position of a vertex.
    #[must_use]
    pub fn pinned(beam: usize, boundary: Boundary) -> Self {
        Self::new(beam, boundary, SupportKind::Pinned)
    }

    /// Support that fixes the position and orientation of a vertex as found at
    /// initialization.
    #[must_use]
    pub fn clamped(beam: usize, boundary: Boundary) -> Self {
        Self::new(beam, boundary, SupportKind::Clamped)
    }

    /// Clamped support that first spins the section so that `d1` matches
    /// `reference` as closely as the vertex tangent allows.
    ///
    /// The tangent and position found at initialization are kept.
    #[must_use]
    pub fn clamped_with_frame(beam: usize, boundary: Boundary, reference: Frame) -> Self {
        Self {
            reference: Some(reference),
            ..Self::clamped(beam, boundary)
        }
    }

    /// Index of the supported beam.
    #[must_use]
    pub fn beam(&self) -> usize {
        self.beam
    }

    /// Supported boundary.
    #[must_use]
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Kind of support.
    #[must_use]
    pub fn kind(&self) -> SupportKind {
        self.kind
    }

    /// Vertex index on the beam, valid once the solver accepted the support.
    #[must_use]
    pub fn vertex(&self) -> usize {
        self.vertex
    }

    /// Whether the support writes reactions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.kind != SupportKind::Free
    }

    /// Resolve the boundary on `beams` and return the handle index.
    pub(crate) fn attach(&mut self, beams: &[Beam]) -> Result<usize, ConfigurationError> {
        let beam = beams
            .get(self.beam)
            .ok_or(ConfigurationError::UnknownBeam(self.beam))?;
        let handle = self.boundary.handle(beam)?;
        self.vertex = beam.handle_vertex(handle)?;
        Ok(handle)
    }

    /// Snapshot the held orientation.
    pub(crate) fn init(&mut self, beams: &mut [Beam]) {
        if self.kind != SupportKind::Clamped {
            return;
        }
        let beam = &mut beams[self.beam];
        if let Some(reference) = &self.reference {
            let angle = twist_angle(beam.committed_frame(self.vertex), reference);
            beam.rotate_vertex(self.vertex, angle);
        }
        self.frame = Some(*beam.committed_frame(self.vertex));
    }

    /// Hold the tangent of a clamped section.
    pub(crate) fn enforce_tangent(&self, beams: &mut [Beam]) {
        if let Some(frame) = &self.frame {
            beams[self.beam].enforce_tangent(self.vertex, frame.t);
        }
    }

    /// Cancel the transverse unbalanced moment of a clamped section.
    pub(crate) fn enforce_moment(&self, beams: &mut [Beam]) {
        if self.kind == SupportKind::Clamped {
            let beam = &mut beams[self.beam];
            let unbalanced = beam.unbalanced_moment(self.vertex);
            beam.set_reaction_moment(self.vertex, -unbalanced);
        }
    }

    /// Cancel the unbalanced torque of a clamped section.
    pub(crate) fn enforce_torque(&self, beams: &mut [Beam]) {
        if self.kind == SupportKind::Clamped {
            let beam = &mut beams[self.beam];
            let unbalanced = beam.unbalanced_torque(self.vertex);
            beam.set_reaction_torque(self.vertex, -unbalanced);
        }
    }

    /// Cancel the unbalanced force of a pinned or clamped vertex.
    pub(crate) fn enforce_force(&self, beams: &mut [Beam]) {
        if self.is_active() {
            let beam = &mut beams[self.beam];
            let unbalanced = beam.unbalanced_force(self.vertex);
            beam.set_reaction_force(self.vertex, -unbalanced);
        }
    }

    /// Reaction force exerted by the support on the beam.
    #[must_use]
    pub fn reaction_force(&self, beams: &[Beam]) -> Vector3<f64> {
        match self.kind {
            SupportKind::Free => Vector3::zeros(),
            _ => beams[self.beam].reaction_force(self.vertex).unwrap_or_else(Vector3::zeros),
        }
    }

    /// Reaction moment exerted by the support on the beam.
    #[must_use]
    pub fn reaction_moment(&self, beams: &[Beam]) -> Vector3<f64> {
        match self.kind {
            SupportKind::Clamped => beams[self.beam]
                .reaction_moment(self.vertex)
                .unwrap_or_else(Vector3::zeros),
            _ => Vector3::zeros(),
        }
    }
}
