//! Crew-wide coordination: problem reporting, target broadcast and attack
//! reactions.
//!
//! Agents tick strictly one after another and never mutate each other
//! directly. Cross-agent effects are collected as events during the tick pass
//! and applied afterwards, so every agent observes the same world state
//! within one frame.

use hecs::{Entity, World};
use rand::Rng;

use super::controller::CrewAgent;
use super::objective::{CombatMode, ObjectiveTag};
use crate::components::{
    current_hull, occupants, Affiliation, Breach, Device, HostileAi, Hull, Locomotion,
    PlayerControlled, Position, Resuscitating, Vitals,
};
use crate::orders::{find_prefab, Order};

/// Cooldown on a reporter repeating the same problem announcement
const REPORT_COOLDOWN: f32 = 60.0;
/// Cooldown on the "nothing to do" reply to an order
const NO_TARGETS_COOLDOWN: f32 = 3.0;

/// A problem category an agent can discover and report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Fire,
    Breach,
    BrokenDevice,
    Intruder,
    Casualty,
}

impl Problem {
    /// The order announced when reporting this problem
    pub fn order_tag(&self) -> &'static str {
        match self {
            Problem::Fire => "report-fire",
            Problem::Breach => "report-breach",
            Problem::BrokenDevice => "report-broken-devices",
            Problem::Intruder => "report-intruders",
            Problem::Casualty => "request-first-aid",
        }
    }

    /// The target-tracking objective this problem feeds
    pub fn objective_tag(&self) -> ObjectiveTag {
        match self {
            Problem::Fire => ObjectiveTag::ExtinguishFires,
            Problem::Breach => ObjectiveTag::FixLeaks,
            Problem::BrokenDevice => ObjectiveTag::RepairDevices,
            Problem::Intruder => ObjectiveTag::FightIntruders,
            Problem::Casualty => ObjectiveTag::RescueInjured,
        }
    }
}

/// One agent noticing one problem on one target entity
#[derive(Debug, Clone, Copy)]
pub struct Discovery {
    pub reporter: Entity,
    pub problem: Problem,
    pub target: Entity,
}

/// Cross-agent effects collected during a tick pass and applied afterwards
#[derive(Debug, Default)]
pub struct TickEvents {
    pub discoveries: Vec<Discovery>,
    /// (agent, hull) pairs whose safety classification should be recomputed
    pub rescore: Vec<(Entity, Entity)>,
}

/// Scan the reporter's current hull for reportable problems, plus the
/// reporter's own condition. Read-only; the crew manager turns the
/// discoveries into target broadcasts.
pub fn report_problems(world: &World, me: Entity) -> Vec<Discovery> {
    let mut found = Vec::new();

    if let Some(hull_entity) = current_hull(world, me) {
        if let Ok(hull) = world.get::<&Hull>(hull_entity) {
            if hull.on_fire() {
                found.push(Discovery {
                    reporter: me,
                    problem: Problem::Fire,
                    target: hull_entity,
                });
            }
            for &breach in &hull.connected_breaches {
                let leaking = world
                    .get::<&Breach>(breach)
                    .map(|b| b.needs_repair())
                    .unwrap_or(false);
                if leaking {
                    found.push(Discovery {
                        reporter: me,
                        problem: Problem::Breach,
                        target: breach,
                    });
                }
            }
        }
        for (entity, device) in world.query::<&Device>().iter() {
            if device.hull == Some(hull_entity) && device.is_broken() {
                found.push(Discovery {
                    reporter: me,
                    problem: Problem::BrokenDevice,
                    target: entity,
                });
            }
        }
        for intruder in hostile_occupants(world, hull_entity, me) {
            found.push(Discovery {
                reporter: me,
                problem: Problem::Intruder,
                target: intruder,
            });
        }
    }

    let hurt = world
        .get::<&Vitals>(me)
        .map(|v| v.needs_first_aid())
        .unwrap_or(false);
    if hurt {
        found.push(Discovery {
            reporter: me,
            problem: Problem::Casualty,
            target: me,
        });
    }

    found
}

/// Living, conscious occupants of the hull that are hostile to the observer
fn hostile_occupants(world: &World, hull: Entity, observer: Entity) -> Vec<Entity> {
    let Ok(my_affiliation) = world.get::<&Affiliation>(observer) else {
        return Vec::new();
    };
    world
        .query::<(&Position, &Vitals, &Affiliation, Option<&HostileAi>)>()
        .iter()
        .filter(|(entity, (pos, vitals, affiliation, hostile_ai))| {
            *entity != observer
                && pos.hull == Some(hull)
                && !vitals.is_dead
                && !vitals.is_unconscious
                && (hostile_ai.is_some() || my_affiliation.is_hostile(affiliation))
        })
        .map(|(entity, _)| entity)
        .collect()
}

/// Owns every AI crew agent and runs the shared tick protocol.
#[derive(Default)]
pub struct CrewManager {
    agents: Vec<CrewAgent>,
}

impl CrewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agent(&mut self, character: Entity, rng: &mut impl Rng) -> &mut CrewAgent {
        self.agents.push(CrewAgent::new(character, rng));
        // Just pushed, so last() is always present
        let index = self.agents.len() - 1;
        &mut self.agents[index]
    }

    pub fn agent(&self, character: Entity) -> Option<&CrewAgent> {
        self.agents.iter().find(|a| a.character == character)
    }

    pub fn agent_mut(&mut self, character: Entity) -> Option<&mut CrewAgent> {
        self.agents.iter_mut().find(|a| a.character == character)
    }

    pub fn agents(&self) -> &[CrewAgent] {
        &self.agents
    }

    /// Tick every agent in sequence, then apply the collected cross-agent
    /// effects: target broadcasts first, safety rescores second.
    pub fn update(&mut self, world: &World, dt: f32) {
        let mut events = TickEvents::default();
        for agent in &mut self.agents {
            agent.update(world, dt, &mut events);
        }
        self.dispatch(world, events.discoveries);
        self.apply_rescore(world, &events.rescore);
    }

    /// Turn discoveries into team-wide target additions, then announce at
    /// most one order per reporter, and only when a discovery told somebody
    /// something new. A scan that turns up fire, flooding and intruders at
    /// once still produces a single callout; the announcement tag's cooldown
    /// keeps later scans from repeating it.
    fn dispatch(&mut self, world: &World, discoveries: Vec<Discovery>) {
        let mut announcements: Vec<(Entity, Problem)> = Vec::new();
        for discovery in discoveries {
            let news = self.add_targets(
                world,
                discovery.reporter,
                discovery.problem.objective_tag(),
                discovery.target,
            );
            if !news {
                continue;
            }
            match announcements
                .iter_mut()
                .find(|(reporter, _)| *reporter == discovery.reporter)
            {
                Some(entry) => entry.1 = discovery.problem,
                None => announcements.push((discovery.reporter, discovery.problem)),
            }
        }
        for (reporter, problem) in announcements {
            if let Some(prefab) = find_prefab(problem.order_tag()) {
                if let Some(agent) = self.agent_mut(reporter) {
                    agent
                        .speech
                        .say(prefab.spoken_text, Some(prefab.tag), REPORT_COOLDOWN);
                }
            }
        }
    }

    /// Merge a target into the matching loop objective of every living agent
    /// friendly to the reporter, the reporter included. Returns whether any
    /// agent's target set changed.
    pub fn add_targets(
        &mut self,
        world: &World,
        reporter: Entity,
        tag: ObjectiveTag,
        target: Entity,
    ) -> bool {
        let reporter_affiliation = world.get::<&Affiliation>(reporter).ok();
        let mut changed = false;
        for agent in &mut self.agents {
            let alive = world
                .get::<&Vitals>(agent.character)
                .map(|v| !v.is_dead)
                .unwrap_or(false);
            if !alive {
                continue;
            }
            let friendly = agent.character == reporter
                || match (&reporter_affiliation, world.get::<&Affiliation>(agent.character).ok()) {
                    (Some(mine), Some(theirs)) => mine.is_friendly(&theirs),
                    _ => false,
                };
            if !friendly {
                continue;
            }
            if let Some(targets) = agent
                .objective_manager
                .get_mut(tag)
                .and_then(|o| o.kind.targets_mut())
            {
                changed |= targets.add(target);
            }
        }
        changed
    }

    /// Retire a resolved target from every agent's matching loop objective
    pub fn remove_targets(&mut self, tag: ObjectiveTag, target: Entity) {
        for agent in &mut self.agents {
            if let Some(targets) = agent
                .objective_manager
                .get_mut(tag)
                .and_then(|o| o.kind.targets_mut())
            {
                targets.remove(target);
            }
        }
    }

    /// Rescan the hull an order names and broadcast whatever the order's
    /// category matches there.
    pub fn refresh_targets(&mut self, world: &World, reporter: Entity, order: &Order) {
        let Some(hull_entity) = order.target_hull else {
            return;
        };
        match order.prefab.tag {
            "report-fire" => {
                let burning = world
                    .get::<&Hull>(hull_entity)
                    .map(|h| h.on_fire())
                    .unwrap_or(false);
                if burning {
                    self.add_targets(world, reporter, ObjectiveTag::ExtinguishFires, hull_entity);
                }
            }
            "report-breach" => {
                let breaches = world
                    .get::<&Hull>(hull_entity)
                    .map(|h| h.connected_breaches.clone())
                    .unwrap_or_default();
                for breach in breaches {
                    let leaking = world
                        .get::<&Breach>(breach)
                        .map(|b| b.needs_repair())
                        .unwrap_or(false);
                    if leaking {
                        self.add_targets(world, reporter, ObjectiveTag::FixLeaks, breach);
                    }
                }
            }
            "report-broken-devices" => {
                let broken: Vec<Entity> = world
                    .query::<&Device>()
                    .iter()
                    .filter(|(_, d)| d.hull == Some(hull_entity) && d.is_broken())
                    .map(|(entity, _)| entity)
                    .collect();
                for device in broken {
                    self.add_targets(world, reporter, ObjectiveTag::RepairDevices, device);
                }
            }
            "report-intruders" => {
                for intruder in hostile_occupants(world, hull_entity, reporter) {
                    self.add_targets(world, reporter, ObjectiveTag::FightIntruders, intruder);
                }
            }
            "request-first-aid" => {
                for occupant in occupants(world, hull_entity) {
                    let hurt = world
                        .get::<&Vitals>(occupant)
                        .map(|v| v.needs_first_aid())
                        .unwrap_or(false);
                    if hurt {
                        self.add_targets(world, reporter, ObjectiveTag::RescueInjured, occupant);
                    }
                }
            }
            _ => {
                #[cfg(debug_assertions)]
                eprintln!("no target refresh for order '{}'", order.prefab.tag);
            }
        }
    }

    /// Issue an order to one agent. The named hull is rescanned first so the
    /// agent can immediately tell the issuer whether there is anything to do.
    pub fn set_order(&mut self, world: &World, character: Entity, order: Order) {
        if order.target_hull.is_some() {
            self.refresh_targets(world, character, &order);
        }
        let Some(agent) = self.agent_mut(character) else {
            return;
        };
        agent.objective_manager.set_order(order);
        let no_work = agent
            .objective_manager
            .get(order.prefab.objective)
            .and_then(|o| o.kind.targets())
            .map(|targets| targets.is_empty())
            .unwrap_or(false);
        if no_work {
            agent.speech.say(
                order.prefab.no_targets_text,
                Some(order.prefab.tag),
                NO_TARGETS_COOLDOWN,
            );
        } else {
            agent.speech.say("Aye.", None, 0.0);
        }
    }

    /// React to the victim taking damage. Friendly fire is tolerated or
    /// answered with retreat; a real enemy triggers an immediate defensive
    /// fight. Reactions to ambiguous hits are delayed a beat so they read as
    /// a decision, not a reflex.
    pub fn on_attacked(
        &mut self,
        world: &World,
        victim: Entity,
        attacker: Option<Entity>,
        damage: f32,
        rng: &mut impl Rng,
    ) {
        if damage <= 0.0 {
            return;
        }
        let Some(agent) = self.agent_mut(victim) else {
            return;
        };
        // Already hunting intruders: stay on task
        if agent.objective_manager.is_current(ObjectiveTag::FightIntruders) {
            return;
        }
        let delay = rng.gen_range(0.5..1.0);

        let live_attacker = attacker.filter(|a| {
            world
                .get::<&Vitals>(*a)
                .map(|v| !v.is_dead)
                .unwrap_or(false)
        });
        let Some(attacker) = live_attacker else {
            // Hit by something unseen: flee the last known damage source
            let remembered = world
                .get::<&Locomotion>(victim)
                .ok()
                .and_then(|l| l.last_damage_source);
            if let Some(source) = remembered {
                agent
                    .objective_manager
                    .set_combat(Some(source), CombatMode::Retreat, delay);
            }
            return;
        };

        let friendly = match (
            world.get::<&Affiliation>(victim),
            world.get::<&Affiliation>(attacker),
        ) {
            (Ok(mine), Ok(theirs)) => mine.is_friendly(&theirs),
            _ => false,
        };

        if friendly {
            // Resuscitation hurts; never treat it as an attack
            let giving_cpr = world
                .get::<&Resuscitating>(attacker)
                .map(|r| r.patient == Some(victim))
                .unwrap_or(false);
            if giving_cpr {
                return;
            }
            if world.get::<&PlayerControlled>(attacker).is_err() {
                // An AI teammate lashing out is a malfunction to escape,
                // not an enemy to fight
                agent
                    .objective_manager
                    .set_combat(Some(attacker), CombatMode::Retreat, delay);
                return;
            }
            let vitality = world
                .get::<&Vitals>(victim)
                .map(|v| v.vitality)
                .unwrap_or(100.0);
            // The weaker the victim already is, the less it takes to count
            // as a real attack
            let relative_damage = damage / vitality * 100.0;
            let mode = if relative_damage < vitality / 10.0 {
                CombatMode::Retreat
            } else {
                CombatMode::Defensive
            };
            agent.objective_manager.set_combat(Some(attacker), mode, delay);
        } else {
            agent.perceived_target = Some(attacker);
            agent
                .objective_manager
                .set_combat(Some(attacker), CombatMode::Defensive, 0.0);
        }
    }

    /// A hull one agent can see gets re-scored by the whole team, each agent
    /// with its own equipment and objective overrides.
    fn apply_rescore(&mut self, world: &World, rescore: &[(Entity, Entity)]) {
        for &(observer, hull) in rescore {
            let observer_affiliation = world.get::<&Affiliation>(observer).ok();
            for agent in &mut self.agents {
                let alive = world
                    .get::<&Vitals>(agent.character)
                    .map(|v| !v.is_dead)
                    .unwrap_or(false);
                if !alive {
                    continue;
                }
                let friendly = agent.character == observer
                    || match (
                        &observer_affiliation,
                        world.get::<&Affiliation>(agent.character).ok(),
                    ) {
                        (Some(mine), Some(theirs)) => mine.is_friendly(&theirs),
                        _ => false,
                    };
                if friendly {
                    agent.refresh_hull_safety(world, hull);
                }
            }
        }
    }
}
