//! Error types produced while assembling or relaxing rod structures.

use thiserror::Error;

use crate::cluster::Phase;

/// Error returned when section or material properties are not physically meaningful.
///
/// The variants describe the reason the supplied value is rejected so callers can
/// present actionable feedback to users.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SectionError {
    /// Returned when the cross-sectional area is zero or negative.
    #[error("area must be positive (received {area})")]
    NonPositiveArea {
        /// Rejected cross-sectional area in square metres.
        area: f64,
    },
    /// Returned when a second moment of area is negative or not finite.
    #[error("second moment of area must be non-negative (received {inertia})")]
    InvalidInertia {
        /// Rejected second moment of area in metres to the fourth.
        inertia: f64,
    },
    /// Returned when the elastic modulus is zero or negative.
    #[error("elastic modulus must be positive (received {young_modulus})")]
    NonPositiveYoungModulus {
        /// Rejected elastic modulus in pascals.
        young_modulus: f64,
    },
    /// Returned when the shear modulus is negative or not finite.
    #[error("shear modulus must be non-negative (received {shear_modulus})")]
    InvalidShearModulus {
        /// Rejected shear modulus in pascals.
        shear_modulus: f64,
    },
}

/// Error returned when a beam, load or constraint cannot be set up.
///
/// These are detected at construction or attachment time and never clamped.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    /// Returned when fewer frames are supplied than the topology needs.
    #[error("a {kind} rod needs at least {required} frames (received {received})")]
    TooFewFrames {
        /// `"open"` or `"closed"`.
        kind: &'static str,
        /// Minimum number of handle frames.
        required: usize,
        /// Number of frames supplied.
        received: usize,
    },
    /// Returned when the rest and actual frame lists differ in length.
    #[error("rest configuration has {rest} frames but actual configuration has {actual}")]
    FrameCountMismatch {
        /// Number of rest frames.
        rest: usize,
        /// Number of actual frames.
        actual: usize,
    },
    /// Returned when a per-segment array is neither uniform nor one value per segment.
    #[error("{what} must hold 1 or {segments} values (received {received})")]
    PropertyCountMismatch {
        /// Which array was rejected.
        what: &'static str,
        /// Number of segments of the rod.
        segments: usize,
        /// Number of values supplied.
        received: usize,
    },
    /// Returned when a frame is not orthonormal or has a non-finite component.
    #[error("frame {index} is not an orthonormal basis")]
    DegenerateFrame {
        /// Handle index of the frame.
        index: usize,
    },
    /// Returned when the initial state of a rod cannot be evaluated.
    #[error("initial state cannot be evaluated: {source}")]
    InvalidInitialState {
        /// Failure reported by the beam.
        #[source]
        source: RodError,
    },
    /// Returned when two consecutive handles coincide.
    #[error("segment {segment} has zero length")]
    ZeroLengthSegment {
        /// Segment index.
        segment: usize,
    },
    /// Returned when section or material properties are invalid.
    #[error("segment {segment} has invalid properties: {source}")]
    InvalidSection {
        /// Segment index.
        segment: usize,
        /// Description of the invalid property.
        #[source]
        source: SectionError,
    },
    /// Returned when a handle index does not exist on the rod.
    #[error("handle {index} is out of range for a rod with {count} handles")]
    HandleOutOfRange {
        /// Rejected handle index.
        index: usize,
        /// Number of handles on the rod.
        count: usize,
    },
    /// Returned when a segment index does not exist on the rod.
    #[error("segment {index} is out of range for a rod with {count} segments")]
    SegmentOutOfRange {
        /// Rejected segment index.
        index: usize,
        /// Number of segments on the rod.
        count: usize,
    },
    /// Returned when a per-element load does not provide one value per element.
    #[error("load expects {expected} values (received {received})")]
    LoadCountMismatch {
        /// Number of vertices or segments targeted.
        expected: usize,
        /// Number of values supplied.
        received: usize,
    },
    /// Returned when a boundary is requested on a closed rod.
    #[error("closed rods have no {0} boundary")]
    NoBoundary(&'static str),
    /// Returned when a constraint references a beam that is not part of the solver.
    #[error("beam {0} does not exist in this assembly")]
    UnknownBeam(usize),
    /// Returned when two constraints claim the same reaction slot.
    #[error("vertex {handle} of beam {beam} is already owned by another constraint")]
    ConflictingReaction {
        /// Beam index.
        beam: usize,
        /// Handle index.
        handle: usize,
    },
    /// Returned when a link joins a vertex to itself.
    #[error("a link cannot join vertex {handle} of beam {beam} to itself")]
    SelfLink {
        /// Beam index.
        beam: usize,
        /// Handle index.
        handle: usize,
    },
    /// Returned when a spring coefficient is negative or not finite.
    #[error("{what} must be a finite non-negative value (received {value})")]
    InvalidCoefficient {
        /// Which coefficient was rejected.
        what: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when a solver setting is out of range.
    #[error("solver setting {what} is invalid (received {value})")]
    InvalidSetting {
        /// Name of the setting.
        what: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// Numerical failure detected by a beam while recomputing its state.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum RodError {
    /// An edge collapsed or stopped being finite.
    #[error("edge {edge} degenerated (length {length})")]
    DegenerateEdge {
        /// Edge index in the full vertex space.
        edge: usize,
        /// Offending length.
        length: f64,
    },
    /// A lumped mass or inertia is zero, negative or not finite.
    #[error("vertex {vertex} has a non-positive lumped {kind} ({value})")]
    NonPositiveMass {
        /// `"mass"` or `"inertia"`.
        kind: &'static str,
        /// Vertex index in the full vertex space.
        vertex: usize,
        /// Offending value.
        value: f64,
    },
    /// A resultant or velocity stopped being finite.
    #[error("vertex {vertex} holds a non-finite {quantity}")]
    NonFinite {
        /// Name of the quantity.
        quantity: &'static str,
        /// Vertex index in the full vertex space.
        vertex: usize,
    },
}

/// Error returned by [`Solver`](crate::Solver) construction and relaxation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolverError {
    /// The assembly is inconsistent.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The relaxation produced a degenerate or non-finite state and was aborted.
    #[error("relaxation diverged at iteration {iteration} during {phase:?} on beam {beam}: {source}")]
    NumericalDivergence {
        /// Iteration at which the failure was detected.
        iteration: usize,
        /// Pipeline phase that failed.
        phase: Phase,
        /// Offending beam.
        beam: usize,
        /// Underlying failure.
        #[source]
        source: RodError,
    },
    /// The kinetic energy of a sub-problem became NaN or infinite.
    #[error("kinetic energy of the {problem} problem is not finite at iteration {iteration}")]
    NonFiniteEnergy {
        /// `"x"` or `"theta"`.
        problem: &'static str,
        /// Iteration at which the failure was detected.
        iteration: usize,
    },
    /// `run` was called after the solver reached a terminal state.
    #[error("the solver already finished ({0:?})")]
    Finished(crate::solver::SolverState),
}
