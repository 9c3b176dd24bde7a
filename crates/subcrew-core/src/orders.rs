//! Order templates and the catalog that maps symbolic tags to them.
//!
//! Orders are ephemeral directives: an operator or a reporting AI names an
//! order template and optionally a target hull, and each receiving agent
//! translates it into one objective insertion.

use hecs::Entity;

use crate::ai::objective::ObjectiveTag;

/// An order template: which objective it installs and what gets said
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderPrefab {
    /// Symbolic tag, stable across the protocol ("report-fire", ...)
    pub tag: &'static str,
    /// Objective kind the order installs on receiving agents
    pub objective: ObjectiveTag,
    /// Line spoken when announcing the order
    pub spoken_text: &'static str,
    /// Line spoken when the order finds nothing to do
    pub no_targets_text: &'static str,
}

/// Every order the crew knows how to issue or announce
pub const ORDER_CATALOG: &[OrderPrefab] = &[
    OrderPrefab {
        tag: "report-fire",
        objective: ObjectiveTag::ExtinguishFires,
        spoken_text: "Fire! Get it under control!",
        no_targets_text: "No fires to put out.",
    },
    OrderPrefab {
        tag: "report-breach",
        objective: ObjectiveTag::FixLeaks,
        spoken_text: "We have a breach! Seal it!",
        no_targets_text: "No leaks to weld.",
    },
    OrderPrefab {
        tag: "report-broken-devices",
        objective: ObjectiveTag::RepairDevices,
        spoken_text: "Equipment's down! Somebody fix it!",
        no_targets_text: "Nothing needs repairs.",
    },
    OrderPrefab {
        tag: "report-intruders",
        objective: ObjectiveTag::FightIntruders,
        spoken_text: "Intruders aboard! Weapons out!",
        no_targets_text: "No enemies in sight.",
    },
    OrderPrefab {
        tag: "request-first-aid",
        objective: ObjectiveTag::RescueInjured,
        spoken_text: "I need a medic over here!",
        no_targets_text: "Nobody needs first aid.",
    },
    OrderPrefab {
        tag: "navigate",
        objective: ObjectiveTag::GoTo,
        spoken_text: "Moving out.",
        no_targets_text: "Nowhere to go.",
    },
];

/// Look up an order template by its symbolic tag
pub fn find_prefab(tag: &str) -> Option<&'static OrderPrefab> {
    ORDER_CATALOG.iter().find(|p| p.tag == tag)
}

/// A concrete, broadcastable order: a template plus an optional target
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub prefab: &'static OrderPrefab,
    pub target_hull: Option<Entity>,
    pub target_device: Option<Entity>,
}

impl Order {
    pub fn new(prefab: &'static OrderPrefab) -> Self {
        Self {
            prefab,
            target_hull: None,
            target_device: None,
        }
    }

    pub fn with_hull(mut self, hull: Entity) -> Self {
        self.target_hull = Some(hull);
        self
    }
}
