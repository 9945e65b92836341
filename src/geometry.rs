//! Fundamental geometric types for rod modelling.

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Position in three dimensional space measured in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
    /// Distance along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3<f64>> for Point {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point> for Vector3<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use rodrelax::point;
///
/// let origin = point(0.0, 0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// Pair of values held on both sides of a vertex.
///
/// Bending moments and torsion are discontinuous at handle vertices when the
/// stiffness changes or a concentrated moment is applied there.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sided<T> {
    /// Value on the side of the previous edge.
    pub left: T,
    /// Value on the side of the next edge.
    pub right: T,
}

impl<T: Copy> Sided<T> {
    /// Same value on both sides.
    #[must_use]
    pub const fn both(value: T) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Apply `f` to both sides.
    #[must_use]
    pub fn map<U, F: Fn(T) -> U>(self, f: F) -> Sided<U> {
        Sided {
            left: f(self.left),
            right: f(self.right),
        }
    }
}

/// Orthonormal material frame `(d1, d2, t)` attached to a cross-section.
///
/// `t` is the centerline tangent, `d1` and `d2` are the principal axes of the
/// section. The triad is right-handed: `d1 × d2 = t`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Location of the section centroid.
    pub origin: Vector3<f64>,
    /// First principal axis.
    pub d1: Vector3<f64>,
    /// Second principal axis.
    pub d2: Vector3<f64>,
    /// Tangent.
    pub t: Vector3<f64>,
}

impl Frame {
    /// Create a frame from its origin and first two axes; the tangent is `d1 × d2`.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use rodrelax::{point, Frame};
    ///
    /// let frame = Frame::new(point(0.0, 0.0, 0.0), Vector3::y(), Vector3::z());
    /// assert_eq!(frame.t, Vector3::x());
    /// ```
    #[must_use]
    pub fn new(origin: Point, d1: Vector3<f64>, d2: Vector3<f64>) -> Self {
        Self {
            origin: origin.to_vector(),
            d1,
            d2,
            t: d1.cross(&d2),
        }
    }

    /// Create a frame with tangent `t`, orienting `d1` as close as possible to `hint`.
    ///
    /// Returns `None` when `t` vanishes or `hint` is parallel to it.
    #[must_use]
    pub fn from_tangent(origin: Point, t: Vector3<f64>, hint: Vector3<f64>) -> Option<Self> {
        let t = t.try_normalize(f64::EPSILON)?;
        let d1 = (hint - t * t.dot(&hint)).try_normalize(f64::EPSILON)?;
        Some(Self {
            origin: origin.to_vector(),
            d1,
            d2: t.cross(&d1),
            t,
        })
    }

    /// Frame whose tangent is the global X axis, with `d1 = Y` and `d2 = Z`.
    #[must_use]
    pub fn along_x(origin: Point) -> Self {
        Self::new(origin, Vector3::y(), Vector3::z())
    }

    /// Origin as a [`Point`].
    #[must_use]
    pub fn point(&self) -> Point {
        Point::from(self.origin)
    }

    /// Check that the axes are unit length, mutually orthogonal and right-handed.
    #[must_use]
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let finite = self.origin.iter().chain(self.d1.iter()).all(|v| v.is_finite())
            && self.d2.iter().chain(self.t.iter()).all(|v| v.is_finite());
        finite
            && (self.d1.norm() - 1.0).abs() < tolerance
            && (self.d2.norm() - 1.0).abs() < tolerance
            && (self.t.norm() - 1.0).abs() < tolerance
            && self.d1.dot(&self.d2).abs() < tolerance
            && (self.d1.cross(&self.d2) - self.t).norm() < tolerance
    }

    /// Rotation matrix whose columns are `d1`, `d2` and `t`.
    #[must_use]
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[self.d1, self.d2, self.t]))
    }

    /// Express a global vector in the frame's `(d1, d2, t)` components.
    #[must_use]
    pub fn to_local(&self, v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.dot(&self.d1), v.dot(&self.d2), v.dot(&self.t))
    }

    /// Convert `(d1, d2, t)` components into a global vector.
    #[must_use]
    pub fn to_global(&self, c: &Vector3<f64>) -> Vector3<f64> {
        self.d1 * c.x + self.d2 * c.y + self.t * c.z
    }

    /// Same orientation, origin moved by `dx`.
    #[must_use]
    pub fn translated(&self, dx: &Vector3<f64>) -> Self {
        Self {
            origin: self.origin + dx,
            ..*self
        }
    }

    /// Spin the section about its own tangent by `angle` radians.
    #[must_use]
    pub fn rotated_about_tangent(&self, angle: f64) -> Self {
        if angle == 0.0 {
            return *self;
        }
        let (s, c) = angle.sin_cos();
        Self {
            d1: self.d1 * c + self.d2 * s,
            d2: self.d2 * c - self.d1 * s,
            ..*self
        }
    }

    /// Parallel transport the section axes onto a new unit tangent.
    #[must_use]
    pub fn transported(&self, t: &Vector3<f64>) -> Self {
        Self {
            origin: self.origin,
            d1: parallel_transport(&self.d1, &self.t, t),
            d2: parallel_transport(&self.d2, &self.t, t),
            t: *t,
        }
    }

    /// Same axes at another origin.
    #[must_use]
    pub fn with_origin(&self, origin: Vector3<f64>) -> Self {
        Self { origin, ..*self }
    }
}

/// Rotate `v` by the minimal rotation taking unit vector `from` onto unit vector `to`.
///
/// Antiparallel tangents are resolved with a half turn about an axis normal to `from`.
#[must_use]
pub fn parallel_transport(
    v: &Vector3<f64>,
    from: &Vector3<f64>,
    to: &Vector3<f64>,
) -> Vector3<f64> {
    let axis = from.cross(to);
    let c = from.dot(to);
    if axis.norm_squared() == 0.0 && c > 0.0 {
        return *v;
    }
    if c <= -1.0 + 1.0e-12 {
        let p = any_normal(from);
        return p * (2.0 * p.dot(v)) - v;
    }
    v * c + axis.cross(v) + axis * (axis.dot(v) / (1.0 + c))
}

/// Rotate `v` about the unit vector `axis` by `angle` radians (Rodrigues).
#[must_use]
pub fn rotate_about(v: &Vector3<f64>, axis: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    let (s, c) = angle.sin_cos();
    v * c + axis.cross(v) * s + axis * (axis.dot(v) * (1.0 - c))
}

/// Signed angle of the minimal rotation about `b.t` taking `a.d1` (transported) onto `b.d1`.
#[must_use]
pub fn twist_angle(a: &Frame, b: &Frame) -> f64 {
    let p = parallel_transport(&a.d1, &a.t, &b.t);
    let sin = p.cross(&b.d1).dot(&b.t);
    let cos = p.dot(&b.d1);
    sin.atan2(cos)
}

/// Unit vector normal to `v`, built from the least aligned global axis.
fn any_normal(v: &Vector3<f64>) -> Vector3<f64> {
    let e = if v.x.abs() <= v.y.abs() && v.x.abs() <= v.z.abs() {
        Vector3::x()
    } else if v.y.abs() <= v.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&e).normalize()
}

/// Circle through three consecutive centerline points.
///
/// All curvature, tangent and length information needed at a vertex is
/// produced by a single fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OsculatingCircle {
    /// Curvature binormal at the middle point; its norm is the curvature.
    pub kb: Vector3<f64>,
    /// Tangent at the first point.
    pub t0: Vector3<f64>,
    /// Tangent at the middle point.
    pub t1: Vector3<f64>,
    /// Tangent at the last point.
    pub t2: Vector3<f64>,
    /// Length of the first edge.
    pub l1: f64,
    /// Length of the second edge.
    pub l2: f64,
    /// Unit direction of the first edge.
    pub u1: Vector3<f64>,
    /// Unit direction of the second edge.
    pub u2: Vector3<f64>,
}

impl OsculatingCircle {
    /// Fit the circle through `p0`, `p1`, `p2`.
    ///
    /// Collinear points give a zero curvature binormal and tangents equal to
    /// the normalized chord. Returns `None` when two points coincide.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use rodrelax::OsculatingCircle;
    ///
    /// let circle = OsculatingCircle::fit(
    ///     &Vector3::new(0.0, 0.0, 0.0),
    ///     &Vector3::new(1.0, 0.0, 0.0),
    ///     &Vector3::new(2.0, 0.0, 0.0),
    /// )
    /// .expect("distinct points");
    /// assert_eq!(circle.curvature(), 0.0);
    /// assert_eq!(circle.t1, Vector3::x());
    /// ```
    #[must_use]
    pub fn fit(p0: &Vector3<f64>, p1: &Vector3<f64>, p2: &Vector3<f64>) -> Option<Self> {
        let e1 = p1 - p0;
        let e2 = p2 - p1;
        let l1 = e1.norm();
        let l2 = e2.norm();
        let chord = (p2 - p0).norm();
        if !(l1 > 0.0 && l2 > 0.0 && chord > 0.0) || !(l1 + l2 + chord).is_finite() {
            return None;
        }
        let u1 = e1 / l1;
        let u2 = e2 / l2;
        let kb = e1.cross(&e2) * (2.0 / (l1 * l2 * chord));
        let t1 = (e1 * (l2 / l1) + e2 * (l1 / l2)).try_normalize(0.0)?;
        let t0 = u1 * (2.0 * t1.dot(&u1)) - t1;
        let t2 = u2 * (2.0 * t1.dot(&u2)) - t1;
        Some(Self {
            kb,
            t0,
            t1,
            t2,
            l1,
            l2,
            u1,
            u2,
        })
    }

    /// Curvature of the circle.
    #[must_use]
    pub fn curvature(&self) -> f64 {
        self.kb.norm()
    }
}

/// Curvature binormal of the circle leaving a point with tangent `t` along chord `u` of length `l`.
#[must_use]
pub fn curvature_leaving(t: &Vector3<f64>, u: &Vector3<f64>, l: f64) -> Vector3<f64> {
    t.cross(u) * (2.0 / l)
}

/// Curvature binormal of the circle arriving along chord `u` of length `l` with tangent `t`.
#[must_use]
pub fn curvature_arriving(u: &Vector3<f64>, t: &Vector3<f64>, l: f64) -> Vector3<f64> {
    u.cross(t) * (2.0 / l)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let origin = Point::new(1.0, 2.0, 3.0);
        let vector: Vector3<f64> = origin.into();
        assert_eq!(vector, Vector3::new(1.0, 2.0, 3.0));
        let point = Point::from(vector);
        assert_eq!(point, origin);
    }

    #[test]
    fn collinear_points_have_zero_curvature_and_chord_tangent() {
        let p0 = Vector3::new(0.0, 0.0, 0.0);
        let p1 = Vector3::new(0.5, 1.0, 2.0);
        let p2 = Vector3::new(1.5, 3.0, 6.0);
        let circle = OsculatingCircle::fit(&p0, &p1, &p2).expect("distinct points");
        assert_eq!(circle.curvature(), 0.0);
        let chord = (p2 - p0).normalize();
        assert_relative_eq!(circle.t1, chord, epsilon = 1.0e-14);
        assert_relative_eq!(circle.t0, chord, epsilon = 1.0e-14);
        assert_relative_eq!(circle.t2, chord, epsilon = 1.0e-14);
    }

    #[test]
    fn turning_angle_gives_circle_curvature() {
        let l = 0.3;
        for phi in [0.05_f64, 0.4, 1.1, 2.0] {
            let p0 = Vector3::new(-l, 0.0, 0.0);
            let p1 = Vector3::zeros();
            let p2 = Vector3::new(l * phi.cos(), l * phi.sin(), 0.0);
            let circle = OsculatingCircle::fit(&p0, &p1, &p2).expect("distinct points");
            assert_relative_eq!(
                circle.curvature(),
                2.0 * (phi / 2.0).sin() / l,
                epsilon = 1.0e-12
            );
            assert_relative_eq!(circle.kb.normalize(), Vector3::z(), epsilon = 1.0e-12);
            assert_relative_eq!(
                circle.t1,
                Vector3::new((phi / 2.0).cos(), (phi / 2.0).sin(), 0.0),
                epsilon = 1.0e-12
            );
        }
    }

    #[test]
    fn end_tangents_lie_on_the_fitted_circle() {
        let radius = 2.0;
        let angles = [0.1_f64, 0.35, 0.9];
        let on_circle = |a: f64| Vector3::new(radius * a.cos(), radius * a.sin(), 0.0);
        let tangent = |a: f64| Vector3::new(-a.sin(), a.cos(), 0.0);
        let circle = OsculatingCircle::fit(
            &on_circle(angles[0]),
            &on_circle(angles[1]),
            &on_circle(angles[2]),
        )
        .expect("distinct points");
        assert_relative_eq!(circle.curvature(), 1.0 / radius, epsilon = 1.0e-12);
        assert_relative_eq!(circle.t0, tangent(angles[0]), epsilon = 1.0e-12);
        assert_relative_eq!(circle.t1, tangent(angles[1]), epsilon = 1.0e-12);
        assert_relative_eq!(circle.t2, tangent(angles[2]), epsilon = 1.0e-12);

        let one_sided = curvature_leaving(&circle.t0, &circle.u1, circle.l1);
        assert_relative_eq!(one_sided, circle.kb, epsilon = 1.0e-12);
        let arriving = curvature_arriving(&circle.u2, &circle.t2, circle.l2);
        assert_relative_eq!(arriving, circle.kb, epsilon = 1.0e-12);
    }

    #[test]
    fn coincident_points_are_rejected() {
        let p = Vector3::new(1.0, 1.0, 1.0);
        assert!(OsculatingCircle::fit(&p, &p, &Vector3::zeros()).is_none());
    }

    #[test]
    fn transport_follows_the_tangent_and_inverts() {
        let frame = Frame::along_x(point(0.0, 0.0, 0.0));
        let t = Vector3::new(1.0, 1.0, 0.5).normalize();
        let moved = frame.transported(&t);
        assert!(moved.is_orthonormal(1.0e-12));
        assert_relative_eq!(moved.t, t);
        let back = moved.transported(&Vector3::x());
        assert_relative_eq!(back.d1, frame.d1, epsilon = 1.0e-14);
        assert_relative_eq!(back.d2, frame.d2, epsilon = 1.0e-14);
    }

    #[test]
    fn antiparallel_transport_stays_orthonormal() {
        let frame = Frame::along_x(point(0.0, 0.0, 0.0));
        let flipped = frame.transported(&(-Vector3::x()));
        assert!(flipped.is_orthonormal(1.0e-12));
    }

    #[test]
    fn twist_between_spun_frames() {
        let a = Frame::along_x(point(0.0, 0.0, 0.0));
        let b = a.rotated_about_tangent(0.3);
        assert_relative_eq!(twist_angle(&a, &b), 0.3, epsilon = 1.0e-14);
        assert_relative_eq!(twist_angle(&b, &a), -0.3, epsilon = 1.0e-14);
        let back = b.rotated_about_tangent(-0.3);
        assert_relative_eq!(back.d1, a.d1, epsilon = 1.0e-15);
    }

    #[test]
    fn rodrigues_rotation_matches_frame_spin() {
        let a = Frame::along_x(point(0.0, 0.0, 0.0));
        let spun = a.rotated_about_tangent(0.7);
        assert_relative_eq!(rotate_about(&a.d1, &a.t, 0.7), spun.d1, epsilon = 1.0e-15);
    }
}
