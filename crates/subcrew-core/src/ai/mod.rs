//! Crew AI: hazard scoring, objectives, steering and the shared tick protocol.

pub mod controller;
pub mod crew;
pub mod hazard;
pub mod manager;
pub mod objective;
pub mod steering;
pub mod timer;

pub use controller::CrewAgent;
pub use crew::{report_problems, CrewManager, Discovery, Problem, TickEvents};
pub use hazard::{hull_safety, HazardOverrides, HULL_SAFETY_THRESHOLD};
pub use manager::{ObjectiveManager, ORDER_PRIORITY, RUN_PRIORITY};
pub use objective::{CombatMode, Intent, Objective, ObjectiveKind, ObjectiveTag, TargetSet};
pub use steering::{IndoorSteering, OutdoorSteering, SteeringBackend, SteeringMode, SteeringPath};
pub use timer::StaggeredTimer;
