//! Couplings between two vertices, on the same beam or on two beams.
//!
//! A rigid link makes both vertices move and spin together and keeps the
//! angle between their sections. Elastic links join them with springs. Links
//! only write reactions; the beams keep their own degrees of freedom.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::beam::Beam;
use crate::errors::ConfigurationError;

/// Vertex at one end of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEnd {
    /// Beam index.
    pub beam: usize,
    /// Handle index on the beam.
    pub handle: usize,
}

impl LinkEnd {
    /// Handle `handle` of beam `beam`.
    #[must_use]
    pub const fn new(beam: usize, handle: usize) -> Self {
        Self { beam, handle }
    }
}

/// Behaviour of a link.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum LinkKind {
    /// Common position and common orientation.
    Clamped,
    /// Linear spring between the positions.
    ElasticPinned {
        /// Spring stiffness in newtons per metre.
        stiffness: f64,
    },
    /// Linear spring between the positions and rotational spring between the `d1` axes.
    ElasticSwivel {
        /// Spring stiffness in newtons per metre.
        stiffness: f64,
        /// Rotational stiffness in newton metres per radian.
        rotational_stiffness: f64,
    },
}

/// Link between two handles.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    /// First end.
    a: LinkEnd,
    /// Second end.
    b: LinkEnd,
    /// Rigid or elastic behaviour.
    kind: LinkKind,
    /// Vertex indices of both ends.
    vertices: (usize, usize),
    /// `x_b − x_a` at initialization.
    offset: Vector3<f64>,
    /// Orientation of `b` relative to `a` at initialization.
    relative: Matrix3<f64>,
    /// `d1` of `b` in the material coordinates of `a` at initialization.
    swivel: Vector3<f64>,
}

impl Link {
    /// Link with unresolved vertices and an identity placement.
    fn new(a: LinkEnd, b: LinkEnd, kind: LinkKind) -> Self {
        Self {
            a,
            b,
            kind,
            vertices: (0, 0),
            offset: Vector3::zeros(),
            relative: Matrix3::identity(),
            swivel: Vector3::zeros(),
        }
    }

    /// Rigid link: both sections share position increments and rotation.
    #[must_use]
    pub fn clamped(a: LinkEnd, b: LinkEnd) -> Self {
        Self::new(a, b, LinkKind::Clamped)
    }

    /// Linear spring of stiffness `stiffness` between both positions.
    #[must_use]
    pub fn elastic_pinned(a: LinkEnd, b: LinkEnd, stiffness: f64) -> Self {
        Self::new(a, b, LinkKind::ElasticPinned { stiffness })
    }

    /// Linear spring plus a rotational spring about the common axis.
    #[must_use]
    pub fn elastic_swivel(
        a: LinkEnd,
        b: LinkEnd,
        stiffness: f64,
        rotational_stiffness: f64,
    ) -> Self {
        Self::new(
            a,
            b,
            LinkKind::ElasticSwivel {
                stiffness,
                rotational_stiffness,
            },
        )
    }

    /// First end.
    #[must_use]
    pub fn a(&self) -> LinkEnd {
        self.a
    }

    /// Second end.
    #[must_use]
    pub fn b(&self) -> LinkEnd {
        self.b
    }

    /// Behaviour of the link.
    #[must_use]
    pub fn kind(&self) -> LinkKind {
        self.kind
    }

    /// Check both ends and the coefficients, and resolve vertex indices.
    pub(crate) fn attach(&mut self, beams: &[Beam]) -> Result<(), ConfigurationError> {
        if self.a == self.b {
            return Err(ConfigurationError::SelfLink {
                beam: self.a.beam,
                handle: self.a.handle,
            });
        }
        let coefficients = match self.kind {
            LinkKind::Clamped => [None, None],
            LinkKind::ElasticPinned { stiffness } => [Some(("stiffness", stiffness)), None],
            LinkKind::ElasticSwivel {
                stiffness,
                rotational_stiffness,
            } => [
                Some(("stiffness", stiffness)),
                Some(("rotational stiffness", rotational_stiffness)),
            ],
        };
        for (what, value) in coefficients.into_iter().flatten() {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigurationError::InvalidCoefficient { what, value });
            }
        }
        let resolve = |end: LinkEnd| {
            beams
                .get(end.beam)
                .ok_or(ConfigurationError::UnknownBeam(end.beam))?
                .handle_vertex(end.handle)
        };
        self.vertices = (resolve(self.a)?, resolve(self.b)?);
        Ok(())
    }

    /// Snapshot the relative placement and add the spring stiffness to the lumped masses.
    pub(crate) fn init(&mut self, beams: &mut [Beam]) {
        let (va, vb) = self.vertices;
        let fa = *beams[self.a.beam].committed_frame(va);
        let fb = *beams[self.b.beam].committed_frame(vb);
        self.offset = fb.origin - fa.origin;
        self.relative = fa.rotation().matrix().transpose() * fb.rotation().matrix();
        self.swivel = fa.to_local(&fb.d1);

        match self.kind {
            LinkKind::Clamped => {}
            LinkKind::ElasticPinned { stiffness } => {
                beams[self.a.beam].add_extra_mass(va, stiffness);
                beams[self.b.beam].add_extra_mass(vb, stiffness);
            }
            LinkKind::ElasticSwivel {
                stiffness,
                rotational_stiffness,
            } => {
                for (end, vertex) in [(self.a, va), (self.b, vb)] {
                    beams[end.beam].add_extra_mass(vertex, stiffness);
                    beams[end.beam].add_extra_inertia(vertex, rotational_stiffness);
                }
            }
        }
    }

    /// Impose a common tangent on both ends of a rigid link.
    ///
    /// The tangent is the mean of the tangents each side would take alone,
    /// weighted by the bending stiffness resisting them and expressed through
    /// the relative orientation captured at initialization.
    pub(crate) fn enforce_tangent(&self, beams: &mut [Beam]) {
        if self.kind != LinkKind::Clamped {
            return;
        }
        let (va, vb) = self.vertices;
        let frame = beams[self.a.beam].committed_frame(va).rotation();
        let to_b = frame.matrix() * self.relative * frame.matrix().transpose();
        let (ta, wa) = beams[self.a.beam].free_tangent(va);
        let (tb, wb) = beams[self.b.beam].free_tangent(vb);
        let tb = to_b.transpose() * tb;
        let t = (ta * wa + tb * wb).try_normalize(0.0).unwrap_or(ta);
        beams[self.a.beam].enforce_tangent(va, t);
        beams[self.b.beam].enforce_tangent(vb, (to_b * t).normalize());
    }

    /// Write the rotational spring moment of a swivel link.
    pub(crate) fn enforce_coupled_moment(&self, beams: &mut [Beam]) {
        let LinkKind::ElasticSwivel {
            rotational_stiffness,
            ..
        } = self.kind
        else {
            return;
        };
        let (va, vb) = self.vertices;
        let target = beams[self.a.beam].material_frame(va).to_global(&self.swivel);
        let d1 = beams[self.b.beam].material_frame(vb).d1;
        let moment = target.cross(&d1) * rotational_stiffness;
        beams[self.a.beam].set_reaction_moment(va, moment);
        beams[self.b.beam].set_reaction_moment(vb, -moment);
    }

    /// Share the transverse unbalanced moment of a rigid link between both ends.
    pub(crate) fn enforce_moment(&self, beams: &mut [Beam]) {
        if self.kind != LinkKind::Clamped {
            return;
        }
        let (va, vb) = self.vertices;
        let ua = beams[self.a.beam].unbalanced_moment(va);
        let ub = beams[self.b.beam].unbalanced_moment(vb);
        let net = (ua + ub) * 0.5;
        beams[self.a.beam].set_reaction_moment(va, net - ua);
        beams[self.b.beam].set_reaction_moment(vb, net - ub);
    }

    /// Give both ends of a rigid link the same angular acceleration.
    pub(crate) fn enforce_torque(&self, beams: &mut [Beam]) {
        if self.kind != LinkKind::Clamped {
            return;
        }
        let (va, vb) = self.vertices;
        let (a, b) = (&beams[self.a.beam], &beams[self.b.beam]);
        let s = a.tangent(va).dot(&b.tangent(vb));
        let (ua, ub) = (a.unbalanced_torque(va), b.unbalanced_torque(vb));
        let (ia, ib) = (inertia_of(a, va), inertia_of(b, vb));
        let alpha = (ua + s * ub) / (ia + s * s * ib);
        beams[self.a.beam].set_reaction_torque(va, ia * alpha - ua);
        beams[self.b.beam].set_reaction_torque(vb, ib * s * alpha - ub);
    }

    /// Write the reaction forces of the link.
    pub(crate) fn enforce_force(&self, beams: &mut [Beam]) {
        let (va, vb) = self.vertices;
        let (fa, fb) = match self.kind {
            LinkKind::Clamped => {
                let (a, b) = (&beams[self.a.beam], &beams[self.b.beam]);
                let (ua, ub) = (a.unbalanced_force(va), b.unbalanced_force(vb));
                let (ma, mb) = (a.mass(va), b.mass(vb));
                let acceleration = (ua + ub) / (ma + mb);
                (acceleration * ma - ua, acceleration * mb - ub)
            }
            LinkKind::ElasticPinned { stiffness } | LinkKind::ElasticSwivel { stiffness, .. } => {
                let stretch = beams[self.b.beam].position(vb)
                    - beams[self.a.beam].position(va)
                    - self.offset;
                (stretch * stiffness, -stretch * stiffness)
            }
        };
        beams[self.a.beam].set_reaction_force(va, fa);
        beams[self.b.beam].set_reaction_force(vb, fb);
    }

    /// Reaction force and moment exerted on end `a`.
    #[must_use]
    pub fn reaction_on_a(&self, beams: &[Beam]) -> (Vector3<f64>, Vector3<f64>) {
        let beam = &beams[self.a.beam];
        let v = self.vertices.0;
        (
            beam.reaction_force(v).unwrap_or_else(Vector3::zeros),
            beam.reaction_moment(v).unwrap_or_else(Vector3::zeros),
        )
    }

    /// Reaction force and moment exerted on end `b`.
    #[must_use]
    pub fn reaction_on_b(&self, beams: &[Beam]) -> (Vector3<f64>, Vector3<f64>) {
        let beam = &beams[self.b.beam];
        let v = self.vertices.1;
        (
            beam.reaction_force(v).unwrap_or_else(Vector3::zeros),
            beam.reaction_moment(v).unwrap_or_else(Vector3::zeros),
        )
    }

    /// Vertex slots written by the link.
    pub(crate) fn slots(&self) -> [(usize, usize, usize); 2] {
        [
            (self.a.beam, self.a.handle, self.vertices.0),
            (self.b.beam, self.b.handle, self.vertices.1),
        ]
    }
}

/// Inertia of a vertex, or one for beams without torsional stiffness.
fn inertia_of(beam: &Beam, vertex: usize) -> f64 {
    if beam.is_torsion_capable() {
        beam.inertia(vertex)
    } else {
        1.0
    }
}
