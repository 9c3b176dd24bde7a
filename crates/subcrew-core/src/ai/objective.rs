//! Behavioral objectives: the typed units of intent an agent can pursue.
//!
//! Each objective kind owns its priority formula and its movement intent.
//! The manager never interprets priority semantics, it only orders by the
//! number. Target-tracking kinds carry a bounded target set that discoveries
//! merge into; at most one objective of each kind exists per agent.

use std::collections::HashSet;

use hecs::{Entity, World};

use crate::components::{Position, Vec2};

/// Fieldless mirror of [`ObjectiveKind`] used for keyed lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectiveTag {
    Idle,
    GoTo,
    ExtinguishFires,
    FixLeaks,
    RepairDevices,
    FightIntruders,
    RescueInjured,
    Combat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatMode {
    /// Hold ground and fight back
    Defensive,
    /// Break contact and get away
    Retreat,
}

/// Bounded, deduplicated set of discovered targets
#[derive(Debug, Clone)]
pub struct TargetSet {
    targets: HashSet<Entity>,
    capacity: usize,
}

impl Default for TargetSet {
    fn default() -> Self {
        Self {
            targets: HashSet::new(),
            capacity: 32,
        }
    }
}

impl TargetSet {
    /// Add a target if absent and within capacity. Returns whether the set
    /// changed; an already-known target is an expected negative, not an error.
    pub fn add(&mut self, target: Entity) -> bool {
        if self.targets.len() >= self.capacity && !self.targets.contains(&target) {
            return false;
        }
        self.targets.insert(target)
    }

    pub fn remove(&mut self, target: Entity) -> bool {
        self.targets.remove(&target)
    }

    pub fn contains(&self, target: Entity) -> bool {
        self.targets.contains(&target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.targets.iter().copied()
    }

    /// Drop targets whose entities no longer exist
    pub fn prune(&mut self, world: &World) {
        self.targets.retain(|t| world.contains(*t));
    }
}

/// A discrete behavioral goal with its kind-specific state
#[derive(Debug, Clone)]
pub enum ObjectiveKind {
    Idle,
    GoTo {
        target: Option<Entity>,
        point: Option<Vec2>,
    },
    ExtinguishFires { targets: TargetSet },
    FixLeaks { targets: TargetSet },
    RepairDevices { targets: TargetSet },
    FightIntruders { targets: TargetSet },
    RescueInjured { targets: TargetSet },
    Combat {
        enemy: Option<Entity>,
        mode: CombatMode,
    },
}

impl ObjectiveKind {
    pub fn tag(&self) -> ObjectiveTag {
        match self {
            ObjectiveKind::Idle => ObjectiveTag::Idle,
            ObjectiveKind::GoTo { .. } => ObjectiveTag::GoTo,
            ObjectiveKind::ExtinguishFires { .. } => ObjectiveTag::ExtinguishFires,
            ObjectiveKind::FixLeaks { .. } => ObjectiveTag::FixLeaks,
            ObjectiveKind::RepairDevices { .. } => ObjectiveTag::RepairDevices,
            ObjectiveKind::FightIntruders { .. } => ObjectiveTag::FightIntruders,
            ObjectiveKind::RescueInjured { .. } => ObjectiveTag::RescueInjured,
            ObjectiveKind::Combat { .. } => ObjectiveTag::Combat,
        }
    }

    /// An empty target-tracking objective of the given kind, if the kind
    /// tracks targets at all
    pub fn empty_loop(tag: ObjectiveTag) -> Option<Self> {
        match tag {
            ObjectiveTag::ExtinguishFires => Some(ObjectiveKind::ExtinguishFires {
                targets: TargetSet::default(),
            }),
            ObjectiveTag::FixLeaks => Some(ObjectiveKind::FixLeaks {
                targets: TargetSet::default(),
            }),
            ObjectiveTag::RepairDevices => Some(ObjectiveKind::RepairDevices {
                targets: TargetSet::default(),
            }),
            ObjectiveTag::FightIntruders => Some(ObjectiveKind::FightIntruders {
                targets: TargetSet::default(),
            }),
            ObjectiveTag::RescueInjured => Some(ObjectiveKind::RescueInjured {
                targets: TargetSet::default(),
            }),
            _ => None,
        }
    }

    pub fn targets(&self) -> Option<&TargetSet> {
        match self {
            ObjectiveKind::ExtinguishFires { targets }
            | ObjectiveKind::FixLeaks { targets }
            | ObjectiveKind::RepairDevices { targets }
            | ObjectiveKind::FightIntruders { targets }
            | ObjectiveKind::RescueInjured { targets } => Some(targets),
            _ => None,
        }
    }

    pub fn targets_mut(&mut self) -> Option<&mut TargetSet> {
        match self {
            ObjectiveKind::ExtinguishFires { targets }
            | ObjectiveKind::FixLeaks { targets }
            | ObjectiveKind::RepairDevices { targets }
            | ObjectiveKind::FightIntruders { targets }
            | ObjectiveKind::RescueInjured { targets } => Some(targets),
            _ => None,
        }
    }
}

/// Movement request produced by advancing an objective for one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct Intent {
    pub destination: Option<Vec2>,
    pub force_run: bool,
}

/// An objective with its manager-facing bookkeeping
#[derive(Debug, Clone)]
pub struct Objective {
    pub kind: ObjectiveKind,
    priority: f32,
    pub force_run: bool,
}

impl Objective {
    pub fn new(kind: ObjectiveKind) -> Self {
        let force_run = matches!(kind, ObjectiveKind::Combat { .. });
        Self {
            kind,
            priority: 0.0,
            force_run,
        }
    }

    pub fn tag(&self) -> ObjectiveTag {
        self.kind.tag()
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: f32) {
        self.priority = priority;
    }

    /// Recompute this objective's priority from agent and world state.
    /// Called on the manager's sort cadence, not every tick.
    pub fn update_priority(&mut self, world: &World, me: Entity, unsafe_hulls: &HashSet<Entity>) {
        self.priority = self.calculate_priority(world, me, unsafe_hulls);
    }

    fn calculate_priority(&self, world: &World, me: Entity, unsafe_hulls: &HashSet<Entity>) -> f32 {
        let current_hull = world.get::<&Position>(me).ok().and_then(|p| p.hull);
        let in_danger = current_hull.map(|h| unsafe_hulls.contains(&h)).unwrap_or(false);

        match &self.kind {
            // Something is always better than nothing, but barely
            ObjectiveKind::Idle => 1.0,
            ObjectiveKind::GoTo { .. } => 10.0,
            ObjectiveKind::Combat { mode, .. } => match mode {
                CombatMode::Defensive => 95.0,
                CombatMode::Retreat => 90.0,
            },
            ObjectiveKind::ExtinguishFires { targets }
            | ObjectiveKind::FixLeaks { targets }
            | ObjectiveKind::RepairDevices { targets }
            | ObjectiveKind::FightIntruders { targets }
            | ObjectiveKind::RescueInjured { targets } => {
                if targets.is_empty() {
                    return 0.0;
                }
                let tag = self.kind.tag();
                let base = match tag {
                    ObjectiveTag::FightIntruders => 45.0,
                    ObjectiveTag::ExtinguishFires => 40.0,
                    ObjectiveTag::RescueInjured => 35.0,
                    ObjectiveTag::FixLeaks => 30.0,
                    ObjectiveTag::RepairDevices => 20.0,
                    _ => 0.0,
                };
                let urgency = 2.0 * (targets.len().min(10) as f32);
                // Hazards in the agent's own surroundings push hazard-facing
                // work above routine repairs
                let danger_bonus = if in_danger
                    && matches!(
                        tag,
                        ObjectiveTag::ExtinguishFires
                            | ObjectiveTag::FixLeaks
                            | ObjectiveTag::FightIntruders
                    ) {
                    10.0
                } else {
                    0.0
                };
                base + urgency + danger_bonus
            }
        }
    }

    /// Advance the objective's behavior for this tick. Concrete task
    /// execution lives in the host; this core produces the movement intent
    /// that the steering facade turns into motion.
    pub fn act(&mut self, world: &World, me: Entity, _dt: f32) -> Intent {
        let my_pos = match world.get::<&Position>(me) {
            Ok(pos) => pos.pos,
            Err(_) => return Intent::default(),
        };

        match &mut self.kind {
            ObjectiveKind::Idle => Intent::default(),
            ObjectiveKind::GoTo { target, point } => {
                let destination = target
                    .and_then(|t| world.get::<&Position>(t).ok().map(|p| p.pos))
                    .or(*point);
                Intent {
                    destination,
                    force_run: false,
                }
            }
            ObjectiveKind::Combat { enemy, mode } => {
                let enemy_pos = enemy.and_then(|e| world.get::<&Position>(e).ok().map(|p| p.pos));
                let destination = match (mode, enemy_pos) {
                    (CombatMode::Defensive, Some(pos)) => Some(pos),
                    // Put distance between us and the threat
                    (CombatMode::Retreat, Some(pos)) => {
                        Some(my_pos + (my_pos - pos).normalize() * 10.0)
                    }
                    (CombatMode::Retreat, None) => None,
                    (CombatMode::Defensive, None) => None,
                };
                Intent {
                    destination,
                    force_run: true,
                }
            }
            ObjectiveKind::ExtinguishFires { targets }
            | ObjectiveKind::FixLeaks { targets }
            | ObjectiveKind::RepairDevices { targets }
            | ObjectiveKind::FightIntruders { targets }
            | ObjectiveKind::RescueInjured { targets } => {
                targets.prune(world);
                // Head for the nearest known target
                let destination = targets
                    .iter()
                    .filter_map(|t| world.get::<&Position>(t).ok().map(|p| p.pos))
                    .min_by(|a, b| {
                        my_pos
                            .distance_squared(a)
                            .partial_cmp(&my_pos.distance_squared(b))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    });
                Intent {
                    destination,
                    force_run: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Character, Hull};

    #[test]
    fn test_target_set_dedup_and_capacity() {
        let mut world = World::new();
        let a = world.spawn((Character::new("a"),));
        let b = world.spawn((Character::new("b"),));

        let mut set = TargetSet::default();
        assert!(set.add(a));
        assert!(!set.add(a)); // already known
        assert!(set.add(b));
        assert_eq!(set.len(), 2);

        set.capacity = 2;
        let c = world.spawn((Character::new("c"),));
        assert!(!set.add(c)); // full
        assert!(set.contains(b)); // existing entries unaffected
    }

    #[test]
    fn test_loop_priority_zero_without_targets() {
        let mut world = World::new();
        let me = world.spawn((Character::new("me"), Position::default()));

        let mut objective =
            Objective::new(ObjectiveKind::empty_loop(ObjectiveTag::ExtinguishFires).unwrap());
        objective.update_priority(&world, me, &HashSet::new());
        assert_eq!(objective.priority(), 0.0);
    }

    #[test]
    fn test_loop_priority_scales_with_targets() {
        let mut world = World::new();
        let me = world.spawn((Character::new("me"), Position::default()));
        let hull_a = world.spawn((Hull::new("a", 10.0),));
        let hull_b = world.spawn((Hull::new("b", 10.0),));

        let mut objective =
            Objective::new(ObjectiveKind::empty_loop(ObjectiveTag::ExtinguishFires).unwrap());
        objective.kind.targets_mut().unwrap().add(hull_a);
        objective.update_priority(&world, me, &HashSet::new());
        let one = objective.priority();

        objective.kind.targets_mut().unwrap().add(hull_b);
        objective.update_priority(&world, me, &HashSet::new());
        assert!(objective.priority() > one);
    }

    #[test]
    fn test_unsafe_hull_biases_hazard_objectives() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("burning", 10.0),));
        let me = world.spawn((Character::new("me"), Position::default().in_hull(hull)));

        let mut objective =
            Objective::new(ObjectiveKind::empty_loop(ObjectiveTag::ExtinguishFires).unwrap());
        objective.kind.targets_mut().unwrap().add(hull);

        objective.update_priority(&world, me, &HashSet::new());
        let calm = objective.priority();

        let unsafe_hulls: HashSet<_> = [hull].into_iter().collect();
        objective.update_priority(&world, me, &unsafe_hulls);
        assert!(objective.priority() > calm);
    }

    #[test]
    fn test_combat_outranks_loops() {
        let mut world = World::new();
        let me = world.spawn((Character::new("me"), Position::default()));
        let hull = world.spawn((Hull::new("a", 10.0),));

        let mut combat = Objective::new(ObjectiveKind::Combat {
            enemy: None,
            mode: CombatMode::Defensive,
        });
        let mut fires =
            Objective::new(ObjectiveKind::empty_loop(ObjectiveTag::ExtinguishFires).unwrap());
        fires.kind.targets_mut().unwrap().add(hull);

        let empty = HashSet::new();
        combat.update_priority(&world, me, &empty);
        fires.update_priority(&world, me, &empty);
        assert!(combat.priority() > fires.priority());
        assert!(combat.force_run);
    }

    #[test]
    fn test_retreat_intent_moves_away_from_enemy() {
        let mut world = World::new();
        let me = world.spawn((Character::new("me"), Position::new(0.0, 0.0)));
        let enemy = world.spawn((Character::new("enemy"), Position::new(5.0, 0.0)));

        let mut objective = Objective::new(ObjectiveKind::Combat {
            enemy: Some(enemy),
            mode: CombatMode::Retreat,
        });
        let intent = objective.act(&world, me, 0.016);
        let destination = intent.destination.unwrap();
        assert!(destination.x < 0.0); // away from the enemy at +5
    }

    #[test]
    fn test_loop_intent_picks_nearest_target() {
        let mut world = World::new();
        let me = world.spawn((Character::new("me"), Position::new(0.0, 0.0)));
        let near = world.spawn((Hull::new("near", 10.0), Position::new(2.0, 0.0)));
        let far = world.spawn((Hull::new("far", 10.0), Position::new(20.0, 0.0)));

        let mut objective =
            Objective::new(ObjectiveKind::empty_loop(ObjectiveTag::ExtinguishFires).unwrap());
        objective.kind.targets_mut().unwrap().add(far);
        objective.kind.targets_mut().unwrap().add(near);

        let intent = objective.act(&world, me, 0.016);
        assert_eq!(intent.destination.unwrap().x, 2.0);
    }

    #[test]
    fn test_act_prunes_despawned_targets() {
        let mut world = World::new();
        let me = world.spawn((Character::new("me"), Position::new(0.0, 0.0)));
        let hull = world.spawn((Hull::new("gone", 10.0), Position::new(2.0, 0.0)));

        let mut objective =
            Objective::new(ObjectiveKind::empty_loop(ObjectiveTag::ExtinguishFires).unwrap());
        objective.kind.targets_mut().unwrap().add(hull);
        world.despawn(hull).unwrap();

        let intent = objective.act(&world, me, 0.016);
        assert!(intent.destination.is_none());
        assert!(objective.kind.targets().unwrap().is_empty());
    }
}
