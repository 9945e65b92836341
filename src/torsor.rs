//! Force and moment values reported together with the frame they were measured in.

use nalgebra::Vector3;

use crate::geometry::Frame;

/// Coordinate system used when reading back a force or moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// Components along the global X, Y and Z axes.
    Global,
    /// Components along the local `(d1, d2, t)` material axes.
    Material,
}

/// Vector quantity bundled with the local frame of the section it acts on.
///
/// Torsors are plain values: the pipeline produces them on demand and never
/// mutates them in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Torsor {
    /// Global components.
    pub vector: Vector3<f64>,
    /// Material frame of the section.
    pub frame: Frame,
}

impl Torsor {
    /// Bundle a global vector with a frame.
    #[must_use]
    pub const fn new(vector: Vector3<f64>, frame: Frame) -> Self {
        Self { vector, frame }
    }

    /// Build a torsor from `(d1, d2, t)` components.
    #[must_use]
    pub fn from_local(components: Vector3<f64>, frame: Frame) -> Self {
        Self {
            vector: frame.to_global(&components),
            frame,
        }
    }

    /// Components in the requested coordinate system.
    #[must_use]
    pub fn components(&self, system: CoordinateSystem) -> Vector3<f64> {
        match system {
            CoordinateSystem::Global => self.vector,
            CoordinateSystem::Material => self.frame.to_local(&self.vector),
        }
    }

    /// Component along the section tangent (axial force or twisting moment).
    #[must_use]
    pub fn axial(&self) -> f64 {
        self.vector.dot(&self.frame.t)
    }

    /// Part of the vector normal to the tangent (shear force or bending moment).
    #[must_use]
    pub fn transverse(&self) -> Vector3<f64> {
        self.vector - self.frame.t * self.axial()
    }

    /// Magnitude of the vector.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.vector.norm()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    #[test]
    fn local_components_roundtrip() {
        let frame = Frame::along_x(point(0.0, 0.0, 0.0)).rotated_about_tangent(0.4);
        let torsor = Torsor::from_local(Vector3::new(1.0, -2.0, 3.0), frame);
        assert_relative_eq!(
            torsor.components(CoordinateSystem::Material),
            Vector3::new(1.0, -2.0, 3.0),
            epsilon = 1.0e-14
        );
        assert_relative_eq!(torsor.axial(), 3.0, epsilon = 1.0e-14);
        assert_relative_eq!(torsor.transverse().x, 0.0, epsilon = 1.0e-14);
    }
}
