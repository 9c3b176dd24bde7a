//! Steering facade: indoor and outdoor movement backends.
//!
//! Path planning proper is an external collaborator; these backends define
//! the seam the controller talks to. The indoor backend keeps whatever path
//! the planner last produced, plus the stairs/ladder flags the controller
//! reads when deciding how to move.

use hecs::{Entity, World};

use crate::components::{Position, Vec2};

/// Which backend is driving movement this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringMode {
    /// Inside a hull-bearing structure: path-following
    Inside,
    /// Open water: direct seek
    Outside,
}

pub trait SteeringBackend {
    /// Discard internal state, e.g. stale path data after a backend switch
    fn reset(&mut self);

    /// Compute the movement vector toward `destination` at `speed`
    fn update(
        &mut self,
        world: &World,
        me: Entity,
        destination: Option<Vec2>,
        speed: f32,
    ) -> Vec2;
}

/// A sequence of waypoints produced by the host's path planner
#[derive(Debug, Clone, Default)]
pub struct SteeringPath {
    pub nodes: Vec<Vec2>,
    pub current: usize,
}

impl SteeringPath {
    pub fn current_node(&self) -> Option<Vec2> {
        self.nodes.get(self.current).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.nodes.len()
    }
}

/// Path-following steering for hull interiors
#[derive(Debug, Default)]
pub struct IndoorSteering {
    pub current_path: Option<SteeringPath>,
    /// The current path segment runs along stairs
    pub in_stairs: bool,
    destination: Option<Vec2>,
}

impl IndoorSteering {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SteeringBackend for IndoorSteering {
    fn reset(&mut self) {
        self.current_path = None;
        self.in_stairs = false;
        self.destination = None;
    }

    fn update(
        &mut self,
        world: &World,
        me: Entity,
        destination: Option<Vec2>,
        speed: f32,
    ) -> Vec2 {
        let Some(destination) = destination else {
            return Vec2::ZERO;
        };
        let Ok(position) = world.get::<&Position>(me) else {
            return Vec2::ZERO;
        };
        let my_pos = position.pos;

        // A new destination invalidates the old path. The real planner is
        // external; until it fills in waypoints we steer through a
        // single-node path straight at the goal.
        if self.destination != Some(destination) {
            self.destination = Some(destination);
            self.current_path = Some(SteeringPath {
                nodes: vec![destination],
                current: 0,
            });
        }

        let Some(path) = self.current_path.as_mut() else {
            return Vec2::ZERO;
        };
        while let Some(node) = path.current_node() {
            if my_pos.distance_squared(&node) < 0.25 {
                path.current += 1;
            } else {
                break;
            }
        }
        match path.current_node() {
            Some(node) => (node - my_pos).normalize() * speed,
            None => Vec2::ZERO,
        }
    }
}

/// Direct seek steering for open water
#[derive(Debug, Default)]
pub struct OutdoorSteering {
    destination: Option<Vec2>,
}

impl OutdoorSteering {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SteeringBackend for OutdoorSteering {
    fn reset(&mut self) {
        self.destination = None;
    }

    fn update(
        &mut self,
        world: &World,
        me: Entity,
        destination: Option<Vec2>,
        speed: f32,
    ) -> Vec2 {
        self.destination = destination;
        let Some(destination) = destination else {
            return Vec2::ZERO;
        };
        let Ok(position) = world.get::<&Position>(me) else {
            return Vec2::ZERO;
        };
        if position.pos.distance_squared(&destination) < 0.25 {
            return Vec2::ZERO;
        }
        (destination - position.pos).normalize() * speed
    }
}
