#![forbid(unsafe_code)]

//! Symbolic road scenes: geometry, traffic objects and scenario composition.

pub mod geometry;
pub mod kinematics;
mod objects;
mod scenario;
mod value;

pub use geometry::{Area, Geometry, GeometryKind, Line, Point};
pub use objects::{Lane, Motion, ObjectKind, SceneObject, TRAJECTORY_HORIZON};
pub use scenario::{Capability, Preset, Scenario, ScenarioConfig, ScenarioModel};
pub use value::Value;
