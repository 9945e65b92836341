#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod assembly;
pub mod beam;
pub mod cluster;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod link;
pub mod loads;
pub mod section;
pub mod solver;
pub mod support;
pub mod topology;
pub mod torsor;

pub use assembly::Assembly;
pub use beam::{Beam, RotationDofs, TranslationDofs};
pub use cluster::{Cluster, ElementStage, Phase, Schedule, StageFailure, Strategy};
pub use config::SolverConfig;
pub use errors::{ConfigurationError, RodError, SectionError, SolverError};
pub use geometry::{
    curvature_arriving, curvature_leaving, parallel_transport, point, rotate_about, twist_angle,
    Frame, OsculatingCircle, Point, Sided,
};
pub use link::{Link, LinkEnd, LinkKind};
pub use loads::{Distribution, Load, LoadFrame, LoadKind, LoadSet, LoadValue};
pub use section::{Material, Section, Stiffness};
pub use solver::{
    interpolate_peak, LoadUpdate, Observer, PeakEvent, Problem, Solver, SolverReport, SolverState,
};
pub use support::{Boundary, Support, SupportKind};
pub use topology::RodTopology;
pub use torsor::{CoordinateSystem, Torsor};
