//! Per-agent objective collection: prioritization, delayed insertion,
//! order handling and combat replacement.

use std::collections::HashSet;

use hecs::{Entity, World};

use super::objective::{CombatMode, Intent, Objective, ObjectiveKind, ObjectiveTag};
use crate::orders::Order;

/// Above this priority the agent runs instead of walking
pub const RUN_PRIORITY: f32 = 50.0;
/// Priority granted to whatever objective the current order names
pub const ORDER_PRIORITY: f32 = 70.0;

/// The standing objectives every agent carries from construction. Keeping
/// the target-tracking loops always present means cross-agent target
/// dispatch always finds its slot.
const STANDING_OBJECTIVES: &[ObjectiveTag] = &[
    ObjectiveTag::ExtinguishFires,
    ObjectiveTag::FixLeaks,
    ObjectiveTag::RepairDevices,
    ObjectiveTag::FightIntruders,
    ObjectiveTag::RescueInjured,
];

struct PendingObjective {
    objective: Objective,
    remaining: f32,
}

/// Owns one agent's prioritized objective collection and selects the
/// current goal. Priorities are recomputed on the sort cadence, not every
/// tick, to bound cost.
pub struct ObjectiveManager {
    /// Sorted by priority descending after each `sort_objectives`
    objectives: Vec<Objective>,
    pending: Vec<PendingObjective>,
    current_order: Option<(Order, ObjectiveTag)>,
}

impl ObjectiveManager {
    pub fn new() -> Self {
        let mut objectives = vec![Objective::new(ObjectiveKind::Idle)];
        for &tag in STANDING_OBJECTIVES {
            if let Some(kind) = ObjectiveKind::empty_loop(tag) {
                objectives.push(Objective::new(kind));
            }
        }
        Self {
            objectives,
            pending: Vec::new(),
            current_order: None,
        }
    }

    /// Insert an objective, or schedule it to be inserted after `delay`
    /// seconds. Silently no-ops if one of the same kind already exists;
    /// combat replacement goes through [`Self::set_combat`] instead.
    pub fn add_objective(&mut self, objective: Objective, delay: f32) -> bool {
        if delay > 0.0 {
            self.pending.push(PendingObjective {
                objective,
                remaining: delay,
            });
            return true;
        }
        if self.get(objective.tag()).is_some() {
            return false;
        }
        self.objectives.push(objective);
        true
    }

    /// Drain expired pending insertions. Called every tick.
    pub fn update_objectives(&mut self, dt: f32) {
        let mut expired = Vec::new();
        self.pending.retain_mut(|p| {
            p.remaining -= dt;
            if p.remaining <= 0.0 {
                expired.push(std::mem::replace(
                    &mut p.objective,
                    Objective::new(ObjectiveKind::Idle),
                ));
                false
            } else {
                true
            }
        });
        for objective in expired {
            self.add_objective(objective, 0.0);
        }
    }

    /// Install the objective an order names and record the order as current.
    /// Any previous order-derived objective is cleared first.
    pub fn set_order(&mut self, order: Order) {
        if let Some((_, previous_tag)) = self.current_order.take() {
            // Standing loops stay; only order-only kinds are removed
            if previous_tag == ObjectiveTag::GoTo {
                self.remove(ObjectiveTag::GoTo);
            }
        }
        let tag = order.prefab.objective;
        if tag == ObjectiveTag::GoTo {
            self.remove(ObjectiveTag::GoTo);
            self.add_objective(
                Objective::new(ObjectiveKind::GoTo {
                    target: order.target_hull,
                    point: None,
                }),
                0.0,
            );
        }
        self.current_order = Some((order, tag));
    }

    pub fn current_order(&self) -> Option<&Order> {
        self.current_order.as_ref().map(|(order, _)| order)
    }

    pub fn clear_order(&mut self) {
        if let Some((_, tag)) = self.current_order.take() {
            if tag == ObjectiveTag::GoTo {
                self.remove(ObjectiveTag::GoTo);
            }
        }
    }

    pub fn get(&self, tag: ObjectiveTag) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.tag() == tag)
    }

    pub fn get_mut(&mut self, tag: ObjectiveTag) -> Option<&mut Objective> {
        self.objectives.iter_mut().find(|o| o.tag() == tag)
    }

    fn remove(&mut self, tag: ObjectiveTag) {
        self.objectives.retain(|o| o.tag() != tag);
    }

    /// The highest-priority objective as of the last sort
    pub fn current_objective(&self) -> Option<&Objective> {
        self.objectives.first()
    }

    pub fn is_current(&self, tag: ObjectiveTag) -> bool {
        self.current_objective().map(|o| o.tag()) == Some(tag)
    }

    pub fn current_priority(&self) -> f32 {
        self.current_objective().map(|o| o.priority()).unwrap_or(0.0)
    }

    /// Recompute every objective's priority and re-rank the collection.
    /// The sort is stable: equal priorities keep insertion order, so the
    /// current goal does not flap between equally-ranked alternatives.
    pub fn sort_objectives(&mut self, world: &World, me: Entity, unsafe_hulls: &HashSet<Entity>) {
        let order_tag = self.current_order.as_ref().map(|(_, tag)| *tag);
        for objective in &mut self.objectives {
            objective.update_priority(world, me, unsafe_hulls);
            if Some(objective.tag()) == order_tag {
                objective.set_priority(ORDER_PRIORITY);
            }
        }
        self.objectives.sort_by(|a, b| {
            b.priority()
                .partial_cmp(&a.priority())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Advance the current objective's behavior for this tick
    pub fn do_current_objective(&mut self, world: &World, me: Entity, dt: f32) -> Option<Intent> {
        let objective = self.objectives.first_mut()?;
        Some(objective.act(world, me, dt))
    }

    /// Install a combat objective, replacing any stale one. An agent never
    /// holds two live combat objectives: a different enemy removes the old
    /// objective, the same enemy is a no-op. Returns whether anything changed.
    pub fn set_combat(&mut self, enemy: Option<Entity>, mode: CombatMode, delay: f32) -> bool {
        if let Some(existing) = self.get(ObjectiveTag::Combat) {
            if let ObjectiveKind::Combat {
                enemy: current_enemy,
                ..
            } = &existing.kind
            {
                if *current_enemy == enemy {
                    return false;
                }
            }
            self.remove(ObjectiveTag::Combat);
            // Replacement is immediate even when the trigger carried a delay
            self.add_objective(Objective::new(ObjectiveKind::Combat { enemy, mode }), 0.0);
            return true;
        }
        self.pending.retain(|p| p.objective.tag() != ObjectiveTag::Combat);
        self.add_objective(Objective::new(ObjectiveKind::Combat { enemy, mode }), delay)
    }

    pub fn objective_count(&self) -> usize {
        self.objectives.len()
    }
}

impl Default for ObjectiveManager {
    fn default() -> Self {
        Self::new()
    }
}
