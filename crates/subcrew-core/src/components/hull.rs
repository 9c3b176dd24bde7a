//! Vessel structure components: hulls, fire sources, breaches, devices.
//!
//! Hulls are owned by the host simulation and read-only from the AI's
//! perspective. Breaches and repairable devices are separate entities so
//! they can be tracked individually in objective target sets.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use super::common::Position;

/// An active fire inside a hull
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FireSource {
    /// How far the flames reach damage, in meters
    pub damage_range: f32,
}

/// Hull component - a sealed or semi-sealed compartment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hull {
    pub name: String,
    /// Breathable oxygen, 0-100
    pub oxygen_percentage: f32,
    /// Flooding level, 0-100
    pub water_percentage: f32,
    /// Exposed to pressure that kills unprotected characters
    pub lethal_pressure: bool,
    /// Interior width in meters, used to normalize fire intensity
    pub width: f32,
    pub fire_sources: Vec<FireSource>,
    /// Breach entities connected to this hull
    #[serde(skip)]
    pub connected_breaches: Vec<Entity>,
    /// Hulls visible from this one through open doorways
    #[serde(skip)]
    pub linked_hulls: Vec<Entity>,
}

impl Hull {
    pub fn new(name: impl Into<String>, width: f32) -> Self {
        Self {
            name: name.into(),
            oxygen_percentage: 100.0,
            water_percentage: 0.0,
            lethal_pressure: false,
            width,
            fire_sources: Vec::new(),
            connected_breaches: Vec::new(),
            linked_hulls: Vec::new(),
        }
    }

    pub fn with_oxygen(mut self, percentage: f32) -> Self {
        self.oxygen_percentage = percentage;
        self
    }

    pub fn with_water(mut self, percentage: f32) -> Self {
        self.water_percentage = percentage;
        self
    }

    pub fn with_fire(mut self, damage_range: f32) -> Self {
        self.fire_sources.push(FireSource { damage_range });
        self
    }

    pub fn on_fire(&self) -> bool {
        !self.fire_sources.is_empty()
    }
}

/// A breach in or between hulls, letting water and pressure through
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Breach {
    /// 0 = sealed, 1 = fully open
    pub open_amount: f32,
    /// Breaches to the outside flood faster and matter more
    pub leads_outside: bool,
}

impl Breach {
    /// Worth sending someone to weld shut
    pub fn needs_repair(&self) -> bool {
        self.open_amount > 0.0
    }
}

/// A repairable device installed in a hull
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    /// Condition percentage, 0-100
    pub condition: f32,
    /// Below this condition the device counts as broken
    pub repair_threshold: f32,
    #[serde(skip)]
    pub hull: Option<Entity>,
}

impl Device {
    pub fn new(name: impl Into<String>, hull: Entity) -> Self {
        Self {
            name: name.into(),
            condition: 100.0,
            repair_threshold: 80.0,
            hull: Some(hull),
        }
    }

    pub fn with_condition(mut self, condition: f32) -> Self {
        self.condition = condition;
        self
    }

    pub fn is_broken(&self) -> bool {
        self.condition < self.repair_threshold
    }
}

/// The hull cannot be entered without diving gear: vacuum, low oxygen
/// or heavy flooding.
pub fn needs_diving_gear(world: &World, hull: Option<Entity>) -> bool {
    match hull {
        None => true,
        Some(entity) => match world.get::<&Hull>(entity) {
            Ok(hull) => hull.oxygen_percentage < 50.0 || hull.water_percentage > 50.0,
            // Hull destroyed mid-scan - treat as open sea
            Err(_) => true,
        },
    }
}

/// The hull a character is currently inside, if any
pub fn current_hull(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<&Position>(entity).ok().and_then(|p| p.hull)
}

/// Characters currently inside the given hull
pub fn occupants(world: &World, hull: Entity) -> Vec<Entity> {
    world
        .query::<&Position>()
        .with::<&super::character::Character>()
        .iter()
        .filter(|(_, pos)| pos.hull == Some(hull))
        .map(|(entity, _)| entity)
        .collect()
}

/// Hulls visible from the given hull: itself plus directly linked hulls.
/// Line-of-sight is the host's business; linkage is the interface.
pub fn visible_hulls_from(world: &World, hull: Option<Entity>) -> Vec<Entity> {
    let Some(entity) = hull else {
        return Vec::new();
    };
    let Ok(hull) = world.get::<&Hull>(entity) else {
        return Vec::new();
    };
    let mut visible = vec![entity];
    for &linked in &hull.linked_hulls {
        if world.contains(linked) && !visible.contains(&linked) {
            visible.push(linked);
        }
    }
    visible
}
