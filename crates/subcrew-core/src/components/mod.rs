//! Component definitions for the crew simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in the AI modules.

mod character;
mod common;
mod hull;

pub use character::*;
pub use common::*;
pub use hull::*;
