//! Element stages of the update pipeline.
//!
//! Each stage reads only what earlier stages of the same pass wrote, so a pass
//! is a pure function of the committed frames, the loads and the reactions.

use nalgebra::{Vector2, Vector3};

use super::{fit_vertex, Beam};
use crate::errors::RodError;
use crate::geometry::{curvature_arriving, curvature_leaving, twist_angle, Frame, Sided};
use crate::section::Stiffness;

/// Safety factor applied to the geometric stiffness estimates.
const GEOMETRIC_FACTOR: f64 = 1.5;

impl Beam {
    /// Edges, lengths, strains, fitted tangents and curvature; clears tangent overrides.
    pub(crate) fn update_centerline(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        let geometry = &mut self.geometry;
        for e in 0..topology.edge_count() {
            let (a, b) = topology.edge_vertices(e);
            let edge = self.frames[b].origin - self.frames[a].origin;
            let length = edge.norm();
            if !(length > 0.0 && length.is_finite()) {
                return Err(RodError::DegenerateEdge { edge: e, length });
            }
            geometry.edges[e] = edge;
            geometry.lengths[e] = length;
            geometry.edge_tangents[e] = edge / length;
            geometry.strain[e] = length / self.rest.lengths[e] - 1.0;
        }

        for i in 0..topology.vertex_count() {
            geometry.enforced[i] = false;
            let (tangent, kb) =
                fit_vertex(&topology, &self.frames, i).ok_or(RodError::DegenerateEdge {
                    edge: topology.left_edge(i).unwrap_or(i),
                    length: 0.0,
                })?;
            geometry.tangents[i] = tangent;
            geometry.fit_curvature[i] = kb;
        }
        Ok(())
    }

    /// Curvature binormal on both sides of every vertex.
    ///
    /// Vertices with an overridden tangent and the ends of an open rod use
    /// one-sided circle fits; the others share the three-point fit.
    pub(crate) fn update_curvature_binormal(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        let geometry = &mut self.geometry;
        for i in 0..topology.vertex_count() {
            geometry.curvature[i] = if geometry.enforced[i] || topology.is_end(i) {
                let t = geometry.tangents[i];
                Sided {
                    left: topology.left_edge(i).map_or_else(Vector3::zeros, |e| {
                        curvature_arriving(&geometry.edge_tangents[e], &t, geometry.lengths[e])
                    }),
                    right: topology.right_edge(i).map_or_else(Vector3::zeros, |e| {
                        curvature_leaving(&t, &geometry.edge_tangents[e], geometry.lengths[e])
                    }),
                }
            } else {
                Sided::both(geometry.fit_curvature[i])
            };
        }
        Ok(())
    }

    /// Material frames: committed frames transported onto the current tangents.
    pub(crate) fn update_material_frame(&mut self) -> Result<(), RodError> {
        for (i, frame) in self.frames.iter().enumerate() {
            self.geometry.material[i] = frame.transported(&self.geometry.tangents[i]);
        }
        self.uncommitted = true;
        Ok(())
    }

    /// Resolved external loads and the bending moment on both sides of every vertex.
    pub(crate) fn update_bending_moment(&mut self) -> Result<(), RodError> {
        self.resolve_external_loads();
        let topology = self.topology;
        for i in 0..topology.vertex_count() {
            let frame = self.geometry.material[i];
            let t = self.geometry.tangents[i];
            let curvature = self.geometry.curvature[i];
            let applied = self.internal.applied_moment[i] + self.reactions.moment[i];
            let jump = applied - t * t.dot(&applied);
            let left = topology.left_edge(i).map(|e| self.stiffness[e]);
            let right = topology.right_edge(i).map(|e| self.stiffness[e]);

            self.internal.bending[i] = if self.geometry.enforced[i] {
                let rest = self.rest.sided_curvature[i];
                Sided {
                    left: left.map_or_else(Vector3::zeros, |s| {
                        elastic_moment(&frame, &curvature.left, &rest.left, &s)
                    }),
                    right: right.map_or_else(Vector3::zeros, |s| {
                        elastic_moment(&frame, &curvature.right, &rest.right, &s)
                    }),
                }
            } else {
                match (left, right) {
                    (Some(l), Some(r)) => {
                        let rest = self.rest.curvature[i];
                        let mean = (elastic_moment(&frame, &curvature.left, &rest, &l)
                            + elastic_moment(&frame, &curvature.right, &rest, &r))
                            * 0.5;
                        Sided {
                            left: mean + jump * 0.5,
                            right: mean - jump * 0.5,
                        }
                    }
                    (None, Some(_)) => Sided {
                        left: Vector3::zeros(),
                        right: -jump,
                    },
                    (Some(_), None) => Sided {
                        left: jump,
                        right: Vector3::zeros(),
                    },
                    (None, None) => Sided::both(Vector3::zeros()),
                }
            };
        }
        Ok(())
    }

    /// Twist angle and twisting moment per edge, then on both sides of every vertex.
    pub(crate) fn update_twisting_moment(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        for e in 0..topology.edge_count() {
            let (a, b) = topology.edge_vertices(e);
            let twist = twist_angle(&self.geometry.material[a], &self.geometry.material[b]);
            self.geometry.twist[e] = twist;
            self.internal.torsion[e] =
                self.stiffness[e].gj * (twist - self.rest.twist[e]) / self.geometry.lengths[e];
        }
        for i in 0..topology.vertex_count() {
            let t = self.geometry.tangents[i];
            let derivative =
                -self.distributed_torque_density(i) - self.curvature_coupling(i).dot(&t);
            let torsion = &self.internal.torsion;
            let lengths = &self.geometry.lengths;
            self.internal.nodal_torsion[i] = Sided {
                left: topology
                    .left_edge(i)
                    .map_or(0.0, |e| torsion[e] + 0.5 * lengths[e] * derivative),
                right: topology
                    .right_edge(i)
                    .map_or(0.0, |e| torsion[e] - 0.5 * lengths[e] * derivative),
            };
        }
        Ok(())
    }

    /// Axial force per edge.
    pub(crate) fn update_axial_force(&mut self) -> Result<(), RodError> {
        for (e, stiffness) in self.stiffness.iter().enumerate() {
            self.internal.axial[e] = stiffness.ea * self.geometry.strain[e];
        }
        Ok(())
    }

    /// Shear force per edge from the moment gradient along it.
    pub(crate) fn update_shear_force(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        for e in 0..topology.edge_count() {
            let (a, b) = topology.edge_vertices(e);
            let u = self.geometry.edge_tangents[e];
            let start = self.internal.bending[a].right
                + self.geometry.tangents[a] * self.internal.nodal_torsion[a].right;
            let end = self.internal.bending[b].left
                + self.geometry.tangents[b] * self.internal.nodal_torsion[b].left;
            let distributed = self.internal.distributed_moment[e];
            let transverse = distributed - u * u.dot(&distributed);
            self.internal.shear[e] =
                u.cross(&((end - start) / self.geometry.lengths[e] + transverse));
        }
        Ok(())
    }

    /// Transverse moment and torque exerted on every vertex by its edges.
    pub(crate) fn update_internal_nodal_moment(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        for i in 0..topology.vertex_count() {
            let t = self.geometry.tangents[i];
            let bending = self.internal.bending[i].right - self.internal.bending[i].left;
            self.internal.moment[i] = bending - t * t.dot(&bending);
            self.internal.torque[i] = if self.torsion {
                let torsion = &self.internal.torsion;
                let right = topology.right_edge(i).map_or(0.0, |e| torsion[e]);
                let left = topology.left_edge(i).map_or(0.0, |e| torsion[e]);
                right - left + self.half_length(i) * self.curvature_coupling(i).dot(&t)
            } else {
                0.0
            };
        }
        Ok(())
    }

    /// Force exerted on every vertex by its edges.
    pub(crate) fn update_internal_nodal_force(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        let edge_force = |e: usize| {
            self.geometry.edge_tangents[e] * self.internal.axial[e] + self.internal.shear[e]
        };
        for i in 0..topology.vertex_count() {
            let right = topology.right_edge(i).map_or_else(Vector3::zeros, edge_force);
            let left = topology.left_edge(i).map_or_else(Vector3::zeros, edge_force);
            self.internal.force[i] = right - left;
        }
        Ok(())
    }

    /// Resultant transverse moment and torque at every vertex.
    pub(crate) fn update_resultant_nodal_moment(&mut self) -> Result<(), RodError> {
        for i in 0..self.topology.vertex_count() {
            let t = self.geometry.tangents[i];
            let reaction = self.reactions.moment[i];
            let applied = self.internal.applied_moment[i] + reaction;
            let moment = self.internal.moment[i] + applied - t * t.dot(&applied);
            self.dynamics.resultant_moment[i] = moment;
            self.dynamics.resultant_torque[i] = if self.torsion {
                self.unbalanced_torque(i) + reaction.dot(&t)
            } else {
                0.0
            };
            if !self.dynamics.resultant_torque[i].is_finite() {
                return Err(RodError::NonFinite {
                    quantity: "resultant torque",
                    vertex: i,
                });
            }
        }
        Ok(())
    }

    /// Resultant force at every vertex.
    pub(crate) fn update_resultant_nodal_force(&mut self) -> Result<(), RodError> {
        for i in 0..self.topology.vertex_count() {
            let force = self.unbalanced_force(i) + self.reactions.force[i];
            if !force.iter().all(|c| c.is_finite()) {
                return Err(RodError::NonFinite {
                    quantity: "resultant force",
                    vertex: i,
                });
            }
            self.dynamics.resultant_force[i] = force;
        }
        Ok(())
    }

    /// Lumped translational mass bounding the local stiffness.
    pub(crate) fn update_lumped_mass(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        for i in 0..topology.vertex_count() {
            let mut mass = self.dynamics.extra_mass[i];
            for e in self.adjacent_edges(i).into_iter().flatten() {
                let stiffness = &self.stiffness[e];
                let l0 = self.rest.lengths[e];
                let l = self.geometry.lengths[e];
                let edge_force = self.geometry.edge_tangents[e] * self.internal.axial[e]
                    + self.internal.shear[e];
                mass += 0.5 * (stiffness.ea / l0 + 8.0 * stiffness.ei_max() / l0.powi(3));
                mass += GEOMETRIC_FACTOR
                    * (edge_force.norm() / l + self.internal.torsion[e].abs() / (l * l));
            }
            if !(mass > 0.0 && mass.is_finite()) {
                return Err(RodError::NonPositiveMass {
                    kind: "mass",
                    vertex: i,
                    value: mass,
                });
            }
            self.dynamics.mass[i] = mass;
        }
        Ok(())
    }

    /// Lumped rotational inertia bounding the local torsional stiffness.
    pub(crate) fn update_lumped_inertia(&mut self) -> Result<(), RodError> {
        let topology = self.topology;
        for i in 0..topology.vertex_count() {
            let curvature = self.geometry.curvature[i];
            let kappa2 = 0.5 * (curvature.left.norm_squared() + curvature.right.norm_squared());
            let mut inertia = self.dynamics.extra_inertia[i];
            for e in self.adjacent_edges(i).into_iter().flatten() {
                let stiffness = &self.stiffness[e];
                let l0 = self.rest.lengths[e];
                inertia += stiffness.gj / l0;
                inertia += 0.5 * (stiffness.ei1 - stiffness.ei2).abs() * kappa2 * l0;
            }
            if !(inertia > 0.0 && inertia.is_finite()) {
                return Err(RodError::NonPositiveMass {
                    kind: "inertia",
                    vertex: i,
                    value: inertia,
                });
            }
            self.dynamics.inertia[i] = inertia;
        }
        Ok(())
    }

    /// Resolve follower loads against the current material frames.
    fn resolve_external_loads(&mut self) {
        let topology = self.topology;
        let material = &self.geometry.material;
        for i in 0..topology.vertex_count() {
            self.internal.applied_force[i] = self.external.force[i].resolve(&material[i]);
            self.internal.applied_moment[i] = self.external.moment[i].resolve(&material[i]);
        }
        for e in 0..topology.edge_count() {
            let (a, b) = topology.edge_vertices(e);
            self.internal.distributed_force[e] =
                self.external.distributed_force[e].resolve_between(&material[a], &material[b]);
            self.internal.distributed_moment[e] =
                self.external.distributed_moment[e].resolve_between(&material[a], &material[b]);
        }
    }

    /// `κb × M` averaged over both sides of vertex `i`.
    fn curvature_coupling(&self, i: usize) -> Vector3<f64> {
        let curvature = &self.geometry.curvature[i];
        let bending = &self.internal.bending[i];
        ((curvature.left + curvature.right) * 0.5).cross(&((bending.left + bending.right) * 0.5))
    }

    /// Distributed torque per unit length at vertex `i`, averaged over its edges.
    fn distributed_torque_density(&self, i: usize) -> f64 {
        let t = self.geometry.tangents[i];
        let (sum, count) = self
            .adjacent_edges(i)
            .into_iter()
            .flatten()
            .fold((0.0, 0_usize), |(sum, count), e| {
                (sum + self.internal.distributed_moment[e].dot(&t), count + 1)
            });
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Half the length of the edges adjacent to vertex `i`.
    fn half_length(&self, i: usize) -> f64 {
        self.adjacent_edges(i)
            .into_iter()
            .flatten()
            .map(|e| 0.5 * self.geometry.lengths[e])
            .sum()
    }
}

/// Bending moment `EI1 (κ1 − κ1⁰) d1 + EI2 (κ2 − κ2⁰) d2` for curvature binormal `kb`.
fn elastic_moment(
    frame: &Frame,
    kb: &Vector3<f64>,
    rest: &Vector2<f64>,
    stiffness: &Stiffness,
) -> Vector3<f64> {
    let k1 = kb.dot(&frame.d1);
    let k2 = kb.dot(&frame.d2);
    frame.d1 * (stiffness.ei1 * (k1 - rest.x)) + frame.d2 * (stiffness.ei2 * (k2 - rest.y))
}
