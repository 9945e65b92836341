//! External load records and their expansion onto the rod's vertices and edges.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;
use crate::geometry::Frame;
use crate::topology::RodTopology;

/// Whether a load is a force or a moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadKind {
    /// Force in newtons (or newtons per metre when distributed).
    Force,
    /// Moment in newton metres (or newton metres per metre when distributed).
    Moment,
}

/// Frame in which load components are given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadFrame {
    /// Global X, Y, Z components; the load keeps its direction.
    Global,
    /// `(d1, d2, t)` components; the load follows the section as it rotates.
    Material,
}

/// Where the load acts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distribution {
    /// Applied at handle vertices.
    Concentrated,
    /// Applied per unit length along segments.
    Distributed,
}

/// Value of a load over its targets.
///
/// Concentrated loads index handles, distributed loads index segments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LoadValue {
    /// One value on a single handle or segment.
    Single {
        /// Handle or segment index.
        index: usize,
        /// Load components.
        value: Vector3<f64>,
    },
    /// The same value on every handle or segment.
    Uniform(Vector3<f64>),
    /// One value per handle or segment.
    PerElement(Vec<Vector3<f64>>),
}

/// External load record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    /// Force or moment.
    pub kind: LoadKind,
    /// Frame of the components.
    pub frame: LoadFrame,
    /// Concentrated or distributed.
    pub distribution: Distribution,
    /// Values over the targets.
    pub value: LoadValue,
}

/// Loads applied to one beam.
pub type LoadSet = Vec<Load>;

impl Load {
    /// Concentrated force at a handle, in global components.
    #[must_use]
    pub fn force(handle: usize, value: Vector3<f64>) -> Self {
        Self {
            kind: LoadKind::Force,
            frame: LoadFrame::Global,
            distribution: Distribution::Concentrated,
            value: LoadValue::Single {
                index: handle,
                value,
            },
        }
    }

    /// Concentrated moment at a handle, in global components.
    #[must_use]
    pub fn moment(handle: usize, value: Vector3<f64>) -> Self {
        Self {
            kind: LoadKind::Moment,
            ..Self::force(handle, value)
        }
    }

    /// Uniform force per unit length along every segment, in global components.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use rodrelax::{Distribution, Load};
    ///
    /// let self_weight = Load::distributed_force(Vector3::new(0.0, 0.0, -9.81));
    /// assert_eq!(self_weight.distribution, Distribution::Distributed);
    /// ```
    #[must_use]
    pub fn distributed_force(value: Vector3<f64>) -> Self {
        Self {
            kind: LoadKind::Force,
            frame: LoadFrame::Global,
            distribution: Distribution::Distributed,
            value: LoadValue::Uniform(value),
        }
    }

    /// Uniform moment per unit length along every segment, in global components.
    #[must_use]
    pub fn distributed_moment(value: Vector3<f64>) -> Self {
        Self {
            kind: LoadKind::Moment,
            ..Self::distributed_force(value)
        }
    }

    /// Same load with components read in the material frame.
    #[must_use]
    pub fn in_material_frame(self) -> Self {
        Self {
            frame: LoadFrame::Material,
            ..self
        }
    }
}

/// Load value split into its fixed global part and its follower part.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Applied {
    /// Global components.
    pub global: Vector3<f64>,
    /// Material components.
    pub local: Vector3<f64>,
}

impl Applied {
    /// Global vector for a section with frame `frame`.
    pub fn resolve(&self, frame: &Frame) -> Vector3<f64> {
        self.global + frame.to_global(&self.local)
    }

    /// Global vector on an edge, averaging the follower part over both end frames.
    pub fn resolve_between(&self, a: &Frame, b: &Frame) -> Vector3<f64> {
        if self.local == Vector3::zeros() {
            return self.global;
        }
        self.global + (a.to_global(&self.local) + b.to_global(&self.local)) * 0.5
    }

    fn add(&mut self, frame: LoadFrame, value: &Vector3<f64>) {
        match frame {
            LoadFrame::Global => self.global += value,
            LoadFrame::Material => self.local += value,
        }
    }
}

/// Loads expanded over the full vertex and edge index space.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExternalLoads {
    /// Concentrated force per vertex.
    pub force: Vec<Applied>,
    /// Concentrated moment per vertex.
    pub moment: Vec<Applied>,
    /// Force per unit length per edge.
    pub distributed_force: Vec<Applied>,
    /// Moment per unit length per edge.
    pub distributed_moment: Vec<Applied>,
}

impl ExternalLoads {
    /// Empty loads for `topology`.
    pub fn zeros(topology: &RodTopology) -> Self {
        Self {
            force: vec![Applied::default(); topology.vertex_count()],
            moment: vec![Applied::default(); topology.vertex_count()],
            distributed_force: vec![Applied::default(); topology.edge_count()],
            distributed_moment: vec![Applied::default(); topology.edge_count()],
        }
    }

    /// Expand `loads` onto `topology`.
    pub fn expand(topology: &RodTopology, loads: &[Load]) -> Result<Self, ConfigurationError> {
        let mut expanded = Self::zeros(topology);
        for load in loads {
            let count = match load.distribution {
                Distribution::Concentrated => topology.handle_count(),
                Distribution::Distributed => topology.segment_count(),
            };
            let out_of_range = |index: usize| match load.distribution {
                Distribution::Concentrated => ConfigurationError::HandleOutOfRange { index, count },
                Distribution::Distributed => ConfigurationError::SegmentOutOfRange { index, count },
            };
            let mut apply = |element: usize, value: &Vector3<f64>| {
                let target = match (load.distribution, load.kind) {
                    (Distribution::Concentrated, LoadKind::Force) => &mut expanded.force,
                    (Distribution::Concentrated, LoadKind::Moment) => &mut expanded.moment,
                    (Distribution::Distributed, LoadKind::Force) => &mut expanded.distributed_force,
                    (Distribution::Distributed, LoadKind::Moment) => {
                        &mut expanded.distributed_moment
                    }
                };
                match load.distribution {
                    Distribution::Concentrated => {
                        target[topology.handle_to_vertex(element)].add(load.frame, value);
                    }
                    Distribution::Distributed => {
                        for edge in topology.segment_edges(element) {
                            target[edge].add(load.frame, value);
                        }
                    }
                }
            };
            match &load.value {
                LoadValue::Single { index, value } => {
                    if *index >= count {
                        return Err(out_of_range(*index));
                    }
                    apply(*index, value);
                }
                LoadValue::Uniform(value) => {
                    for element in 0..count {
                        apply(element, value);
                    }
                }
                LoadValue::PerElement(values) => {
                    if values.len() != count {
                        return Err(ConfigurationError::LoadCountMismatch {
                            expected: count,
                            received: values.len(),
                        });
                    }
                    for (element, value) in values.iter().enumerate() {
                        apply(element, value);
                    }
                }
            }
        }
        Ok(expanded)
    }
}
