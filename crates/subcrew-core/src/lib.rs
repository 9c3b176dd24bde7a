//! Subcrew Core - Crew AI for a Simulated Vessel
//!
//! Real-time, priority-driven AI for the crew of a submarine-like vessel:
//! each agent continuously scores compartment hazards, maintains a sorted
//! collection of objectives, reports problems to the rest of the crew and
//! steers its character through the world.
//!
//! # Architecture
//!
//! World state lives in a `hecs` ECS world owned by the host simulation:
//! - **Entities**: Characters, hulls, breaches, devices
//! - **Components**: Pure data (Position, Vitals, Hull, Inventory, ...)
//! - **AI**: Per-agent controllers held in a [`ai::CrewManager`] outside
//!   the world, reading components and writing movement intent back
//!
//! # Example
//!
//! ```rust,no_run
//! use subcrew_core::prelude::*;
//! use rand::thread_rng;
//!
//! let mut world = hecs::World::new();
//! let mut rng = thread_rng();
//!
//! let sailor = world.spawn((
//!     Character::new("deckhand"),
//!     Vitals::new(100.0),
//!     Affiliation::new(Team::Crew, "human"),
//!     Position::new(0.0, 0.0),
//!     Locomotion::default(),
//!     Inventory::default(),
//! ));
//!
//! let mut crew = CrewManager::new();
//! crew.add_agent(sailor, &mut rng);
//!
//! loop {
//!     crew.update(&world, 1.0 / 60.0);
//! }
//! ```

pub mod ai;
pub mod components;
pub mod orders;
pub mod speech;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::ai::{CrewAgent, CrewManager, CombatMode, ObjectiveTag};
    pub use crate::components::*;
    pub use crate::orders::{find_prefab, Order};
    pub use crate::speech::{SpokenLine, Speech};
}
