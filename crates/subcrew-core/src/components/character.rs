//! Character components: vitals, team affiliation, locomotion state, gear.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::Vec2;

/// Marker component identifying an entity as a controllable character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Health and life-support state - all the numbers the AI reacts to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vitals {
    pub vitality: f32,
    pub max_vitality: f32,
    /// Oxygen available to the character, 0-100
    pub oxygen: f32,
    /// Bleeding severity, 0 = none
    pub bleeding: f32,
    /// Seconds of accumulated exposure to hazardous pressure
    pub pressure_timer: f32,
    /// Pressure protection from equipment or physiology, > 0 means protected
    pub pressure_protection: f32,
    /// Whether this species breathes at all
    pub needs_air: bool,
    pub is_dead: bool,
    pub is_unconscious: bool,
}

impl Vitals {
    /// Below this much oxygen the character starts struggling
    pub const LOW_OXYGEN_THRESHOLD: f32 = 20.0;

    pub fn new(max_vitality: f32) -> Self {
        Self {
            vitality: max_vitality,
            max_vitality,
            oxygen: 100.0,
            bleeding: 0.0,
            pressure_timer: 0.0,
            pressure_protection: 0.0,
            needs_air: true,
            is_dead: false,
            is_unconscious: false,
        }
    }

    /// Critically injured: heavy bleeding or vitality below 10% of max
    pub fn needs_first_aid(&self) -> bool {
        !self.is_dead && (self.bleeding > 1.0 || self.vitality < self.max_vitality * 0.1)
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Which side a character is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Non-combatant NPCs - never counted as hostile and never count others hostile
    Neutral,
    Crew,
    Separatists,
}

/// Team and species identity, used for friend-or-foe checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliation {
    pub team: Team,
    pub species: String,
}

impl Affiliation {
    pub fn new(team: Team, species: impl Into<String>) -> Self {
        Self {
            team,
            species: species.into(),
        }
    }

    /// Friendly: same team and same species
    pub fn is_friendly(&self, other: &Affiliation) -> bool {
        self.team == other.team && self.species == other.species
    }

    /// Hostile: a different team, unless either side is neutral
    pub fn is_hostile(&self, other: &Affiliation) -> bool {
        other.team != self.team && self.team != Team::Neutral && other.team != Team::Neutral
    }
}

/// Marker for characters driven by creature AI - always treated as hostile
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HostileAi;

/// Marker for characters under direct player control
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerControlled;

/// Present while a character is performing resuscitation on another
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Resuscitating {
    #[serde(skip)]
    pub patient: Option<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

/// Movement I/O shared between the AI controller and the host's
/// animation/physics. The controller writes `target_movement`, `facing` and
/// `ignore_platforms` each tick; the host owns the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locomotion {
    /// Desired movement for this tick, written by the controller
    pub target_movement: Vec2,
    pub facing: Facing,
    pub in_water: bool,
    pub climbing: bool,
    /// Climbing a ladder that continues onto the next path node
    pub next_ladder_same_as_current: bool,
    pub crouching: bool,
    pub moving_backwards: bool,
    /// Pass through platforms when descending
    pub ignore_platforms: bool,
    pub walk_speed: f32,
    pub run_speed: f32,
    /// External buff/debuff, re-applied by contributors every tick
    pub speed_multiplier: f32,
    /// Temporary ceiling on movement per axis
    pub speed_limit: f32,
    /// Fall speed the character can land from without injury
    pub impact_tolerance: f32,
    /// Where the character is aiming, if aiming at all
    pub aim_target: Option<Vec2>,
    /// Last thing that damaged this character, if anything has
    #[serde(skip)]
    pub last_damage_source: Option<Entity>,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            target_movement: Vec2::ZERO,
            facing: Facing::Right,
            in_water: false,
            climbing: false,
            next_ladder_same_as_current: false,
            crouching: false,
            moving_backwards: false,
            ignore_platforms: false,
            walk_speed: 1.0,
            run_speed: 2.0,
            speed_multiplier: 1.0,
            speed_limit: f32::MAX,
            impact_tolerance: 8.0,
            aim_target: None,
            last_damage_source: None,
        }
    }
}

impl Locomotion {
    pub fn current_speed(&self, run: bool) -> f32 {
        if run {
            self.run_speed
        } else {
            self.walk_speed
        }
    }

    /// Reset the external multiplier; contributors must re-apply it next tick
    pub fn reset_speed_multiplier(&mut self) {
        self.speed_multiplier = 1.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GearKind {
    PressureSuit,
    BreathingMask,
    FireExtinguisher,
    WeldingTool,
    OneHandedWeapon,
    TwoHandedWeapon,
}

impl GearKind {
    pub fn is_weapon(&self) -> bool {
        matches!(self, GearKind::OneHandedWeapon | GearKind::TwoHandedWeapon)
    }
}

/// A piece of gear carried by a character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gear {
    pub kind: GearKind,
    /// Condition percentage, 0-100; 0 means unusable
    pub condition: f32,
    /// Worn or held, as opposed to stowed in a general slot
    pub equipped: bool,
    /// Whether an air source is loaded (suits and masks)
    pub contains_air: bool,
}

impl Gear {
    pub fn new(kind: GearKind) -> Self {
        Self {
            kind,
            condition: 100.0,
            equipped: false,
            contains_air: false,
        }
    }

    pub fn equipped(mut self) -> Self {
        self.equipped = true;
        self
    }

    pub fn with_air(mut self) -> Self {
        self.contains_air = true;
        self
    }
}

/// What a character is carrying. Storage mechanics live in the host
/// simulation; the AI only needs equip/stow/drop at this granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub gear: Vec<Gear>,
    /// Free general-purpose slots available for stowing
    pub general_slots: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            gear: Vec::new(),
            general_slots: 4,
        }
    }
}

impl Inventory {
    pub fn with_gear(gear: Vec<Gear>) -> Self {
        Self {
            gear,
            general_slots: 4,
        }
    }

    pub fn find(&self, kind: GearKind) -> Option<&Gear> {
        self.gear.iter().find(|g| g.kind == kind)
    }

    /// Equipped, in usable condition, with an air source loaded
    fn has_usable_air_gear(&self, kind: GearKind) -> bool {
        self.gear
            .iter()
            .any(|g| g.kind == kind && g.equipped && g.condition > 0.0 && g.contains_air)
    }

    pub fn has_pressure_suit(&self) -> bool {
        self.has_usable_air_gear(GearKind::PressureSuit)
    }

    pub fn has_breathing_mask(&self) -> bool {
        self.has_usable_air_gear(GearKind::BreathingMask)
    }

    pub fn has_equipped(&self, kind: GearKind) -> bool {
        self.gear.iter().any(|g| g.kind == kind && g.equipped)
    }

    /// Drop every equipped item of the given kind; stowed ones stay put.
    /// Returns true if anything was dropped.
    pub fn drop_equipped(&mut self, kind: GearKind) -> bool {
        let before = self.gear.len();
        self.gear.retain(|g| !(g.kind == kind && g.equipped));
        self.gear.len() != before
    }

    /// Unequip into a general slot, or drop if no slot is free.
    /// This is the designed degraded path, not an error.
    pub fn stow_or_drop(&mut self, kind: GearKind) -> bool {
        let stowed_count = self.gear.iter().filter(|g| !g.equipped).count() as u32;
        if stowed_count < self.general_slots {
            let mut changed = false;
            for g in self.gear.iter_mut().filter(|g| g.kind == kind && g.equipped) {
                g.equipped = false;
                changed = true;
            }
            changed
        } else {
            self.drop_equipped(kind)
        }
    }
}
