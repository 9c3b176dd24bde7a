//! Per-agent controller: the tick driver that turns world state into
//! objectives, movement, gear decisions and speech.
//!
//! One [`CrewAgent`] exists per AI-driven character. It owns the agent's
//! objective collection, its steering backends and its private view of which
//! hulls are unsafe. Everything cross-agent (target dispatch, attack
//! reactions) lives in the crew module; the controller only emits events.

use std::collections::HashSet;

use hecs::{Entity, World};
use rand::Rng;

use super::crew::{report_problems, TickEvents};
use super::hazard::{hull_safety, HazardOverrides, HULL_SAFETY_THRESHOLD};
use super::manager::{ObjectiveManager, RUN_PRIORITY};
use super::objective::{Intent, ObjectiveTag};
use super::steering::{IndoorSteering, OutdoorSteering, SteeringBackend, SteeringMode};
use super::timer::StaggeredTimer;
use crate::components::{
    current_hull, needs_diving_gear, visible_hulls_from, Facing, GearKind, Hull, Inventory,
    Locomotion, Position, Vec2, Vitals,
};
use crate::speech::Speech;

/// Cadence of the visibility, sort and report rescans, in seconds
const REFRESH_INTERVAL: f32 = 1.0;
/// Cooldown applied to each distress line's tag
const DISTRESS_COOLDOWN: f32 = 30.0;
/// Ordered moves further than this are worth running, in meters
const GOTO_RUN_DISTANCE: f32 = 3.0;
/// Horizontal aim offset below which the character does not turn
const AIM_FACE_THRESHOLD: f32 = 10.0;

/// Inputs to the equipment policy, sampled once per evaluation
struct GearContext {
    oxygen_low: bool,
    high_pressure: bool,
    /// The current objective wants gear kept on (anything but idling)
    keep_gear_on: bool,
    water_percentage: f32,
    climbing: bool,
    indoors: bool,
    in_stairs: bool,
    firefighting: bool,
    idling: bool,
}

enum GearAction {
    Drop(GearKind),
    StowOrDrop(GearKind),
}

struct GearRule {
    applies: fn(&GearContext) -> bool,
    action: GearAction,
}

/// Equipment policy for breathable rooms, checked top to bottom.
const GEAR_RULES: &[GearRule] = &[
    // A suit slows you down: shed it when suffocating (unless pressure would
    // kill faster), or once safely indoors with nothing urgent going on
    GearRule {
        applies: |ctx| {
            (ctx.oxygen_low && !ctx.high_pressure)
                || (!ctx.keep_gear_on
                    && ctx.water_percentage < 1.0
                    && !ctx.climbing
                    && ctx.indoors
                    && !ctx.in_stairs)
        },
        action: GearAction::Drop(GearKind::PressureSuit),
    },
    GearRule {
        applies: |ctx| ctx.oxygen_low || (!ctx.keep_gear_on && ctx.water_percentage < 20.0),
        action: GearAction::StowOrDrop(GearKind::BreathingMask),
    },
    GearRule {
        applies: |ctx| !ctx.firefighting,
        action: GearAction::Drop(GearKind::FireExtinguisher),
    },
    GearRule {
        applies: |ctx| ctx.idling,
        action: GearAction::StowOrDrop(GearKind::TwoHandedWeapon),
    },
];

/// AI controller state for one crew character.
pub struct CrewAgent {
    pub character: Entity,
    pub objective_manager: ObjectiveManager,
    /// Hulls this agent currently classifies as unsafe
    pub unsafe_hulls: HashSet<Entity>,
    pub speech: Speech,
    /// Enemy the agent is tracking; influences steering backend selection
    pub perceived_target: Option<Entity>,
    visible_hulls: Vec<Entity>,
    visibility_timer: StaggeredTimer,
    sort_timer: StaggeredTimer,
    report_timer: StaggeredTimer,
    indoor: IndoorSteering,
    outdoor: OutdoorSteering,
    mode: SteeringMode,
}

impl CrewAgent {
    /// Timers start at a random phase so a full crew does not rescan on the
    /// same frame.
    pub fn new(character: Entity, rng: &mut impl Rng) -> Self {
        Self {
            character,
            objective_manager: ObjectiveManager::new(),
            unsafe_hulls: HashSet::new(),
            speech: Speech::new(),
            perceived_target: None,
            visible_hulls: Vec::new(),
            visibility_timer: StaggeredTimer::jittered(REFRESH_INTERVAL, rng),
            sort_timer: StaggeredTimer::jittered(REFRESH_INTERVAL, rng),
            report_timer: StaggeredTimer::jittered(REFRESH_INTERVAL, rng),
            indoor: IndoorSteering::new(),
            outdoor: OutdoorSteering::new(),
            mode: SteeringMode::Inside,
        }
    }

    pub fn visible_hulls(&self) -> &[Entity] {
        &self.visible_hulls
    }

    pub fn mode(&self) -> SteeringMode {
        self.mode
    }

    /// Advance this agent by one tick. Dead and unconscious characters are
    /// inert. Cross-agent effects are pushed into `events` and applied by the
    /// crew manager after every agent has ticked.
    pub fn update(&mut self, world: &World, dt: f32, events: &mut TickEvents) {
        let me = self.character;
        {
            let Ok(vitals) = world.get::<&Vitals>(me) else {
                return;
            };
            if vitals.is_dead || vitals.is_unconscious {
                return;
            }
        }

        self.select_backend(world);

        // Last tick's inputs are stale, not sticky
        if let Ok(mut locomotion) = world.get::<&mut Locomotion>(me) {
            locomotion.target_movement = Vec2::ZERO;
            locomotion.ignore_platforms = false;
        }

        if self.visibility_timer.tick(dt) {
            self.visible_hulls = visible_hulls_from(world, current_hull(world, me));
        }

        self.objective_manager.update_objectives(dt);
        if self.sort_timer.tick(dt) {
            self.objective_manager
                .sort_objectives(world, me, &self.unsafe_hulls);
        }

        self.speech.update(dt);
        if self.report_timer.tick(dt) {
            events.discoveries.extend(report_problems(world, me));
            self.update_speaking(world);
        }

        if self.objective_manager.objective_count() == 0 {
            return;
        }
        let Some(intent) = self.objective_manager.do_current_objective(world, me, dt) else {
            return;
        };

        let run = self.should_run(world, &intent);
        self.steer(world, &intent, run);
        self.update_gear(world);
        self.update_facing(world);

        if current_hull(world, me).is_some() {
            for &hull in &self.visible_hulls {
                events.rescore.push((me, hull));
            }
        }
    }

    /// Hazard classes this agent may disregard, from equipment or because
    /// the current objective sends it toward the hazard on purpose.
    pub fn hazard_overrides(&self, world: &World) -> HazardOverrides {
        let (has_suit, has_mask) = world
            .get::<&Inventory>(self.character)
            .map(|inv| (inv.has_pressure_suit(), inv.has_breathing_mask()))
            .unwrap_or((false, false));
        HazardOverrides {
            ignore_oxygen: has_suit || has_mask,
            ignore_water: has_suit,
            ignore_fire: self
                .objective_manager
                .is_current(ObjectiveTag::ExtinguishFires),
            ignore_enemies: self
                .objective_manager
                .is_current(ObjectiveTag::FightIntruders),
        }
    }

    /// Re-score one hull and update this agent's unsafe set.
    pub fn refresh_hull_safety(&mut self, world: &World, hull: Entity) {
        let overrides = self.hazard_overrides(world);
        if hull_safety(world, hull, self.character, overrides) < HULL_SAFETY_THRESHOLD {
            self.unsafe_hulls.insert(hull);
        } else {
            self.unsafe_hulls.remove(&hull);
        }
    }

    /// Indoors whenever the agent or its perceived target stands in a hull.
    /// Switching resets the incoming backend so it never steers on stale
    /// path data from the previous stretch.
    fn select_backend(&mut self, world: &World) {
        let inside = current_hull(world, self.character).is_some()
            || self
                .perceived_target
                .map(|target| current_hull(world, target).is_some())
                .unwrap_or(false);
        let mode = if inside {
            SteeringMode::Inside
        } else {
            SteeringMode::Outside
        };
        if mode != self.mode {
            match mode {
                SteeringMode::Inside => self.indoor.reset(),
                SteeringMode::Outside => self.outdoor.reset(),
            }
            self.mode = mode;
        }
    }

    fn should_run(&self, world: &World, intent: &Intent) -> bool {
        let me = self.character;
        let mut run = intent.force_run || self.objective_manager.current_priority() > RUN_PRIORITY;
        // Ordered moves pace themselves by distance instead of priority
        if self.objective_manager.is_current(ObjectiveTag::GoTo) {
            if let (Some(destination), Ok(position)) =
                (intent.destination, world.get::<&Position>(me))
            {
                run = position.pos.distance_squared(&destination)
                    > GOTO_RUN_DISTANCE * GOTO_RUN_DISTANCE;
            }
        }
        if let Ok(locomotion) = world.get::<&Locomotion>(me) {
            if locomotion.crouching || locomotion.moving_backwards {
                run = false;
            }
        }
        run
    }

    fn steer(&mut self, world: &World, intent: &Intent, run: bool) {
        let me = self.character;
        let my_pos = match world.get::<&Position>(me) {
            Ok(position) => position.pos,
            Err(_) => return,
        };
        let speed = match world.get::<&Locomotion>(me) {
            Ok(locomotion) => locomotion.current_speed(run),
            Err(_) => return,
        };

        let mut movement = match self.mode {
            SteeringMode::Inside => self.indoor.update(world, me, intent.destination, speed),
            SteeringMode::Outside => self.outdoor.update(world, me, intent.destination, speed),
        };

        let Ok(mut locomotion) = world.get::<&mut Locomotion>(me) else {
            return;
        };

        // Drop through platforms when the path leads mostly downward
        let mut ignore_platforms = movement.y < -0.5 && -movement.y > movement.x.abs();
        if self.mode == SteeringMode::Inside {
            if let Some(node) = self
                .indoor
                .current_path
                .as_ref()
                .and_then(|path| path.current_node())
            {
                if node.y < my_pos.y {
                    // Only drop when the fall stays within a safe landing
                    let allowed_drop = locomotion.impact_tolerance / 2.0;
                    ignore_platforms = my_pos.y - node.y < allowed_drop;
                }
            }
            if locomotion.climbing && locomotion.next_ladder_same_as_current {
                // Lock to the ladder: vertical movement only
                let vertical = if movement.y > 0.0 {
                    1.0
                } else if movement.y < 0.0 {
                    -1.0
                } else {
                    0.0
                };
                movement = Vec2::new(0.0, vertical);
            }
        }

        locomotion.ignore_platforms = ignore_platforms;
        if !locomotion.in_water {
            movement.y = movement.y.clamp(-1.0, 1.0);
        }
        let max_speed = speed.min(locomotion.speed_limit);
        movement.x = movement.x.clamp(-max_speed, max_speed);
        movement.y = movement.y.clamp(-max_speed, max_speed);
        if run || locomotion.speed_multiplier <= 0.0 {
            movement = movement * locomotion.speed_multiplier;
        }
        // Contributors re-apply the multiplier every tick
        locomotion.reset_speed_multiplier();
        locomotion.target_movement = movement;
    }

    /// Apply the equipment policy when the current room is breathable
    /// without special gear.
    fn update_gear(&mut self, world: &World) {
        let me = self.character;
        let Some(hull_entity) = current_hull(world, me) else {
            return;
        };
        if needs_diving_gear(world, Some(hull_entity)) {
            return;
        }
        let (water_percentage, high_pressure) = match world.get::<&Hull>(hull_entity) {
            Ok(hull) => (hull.water_percentage, hull.lethal_pressure),
            Err(_) => return,
        };
        let oxygen_low = world
            .get::<&Vitals>(me)
            .map(|vitals| vitals.oxygen < Vitals::LOW_OXYGEN_THRESHOLD)
            .unwrap_or(false);
        let climbing = world
            .get::<&Locomotion>(me)
            .map(|locomotion| locomotion.climbing)
            .unwrap_or(false);

        let idling = self.objective_manager.is_current(ObjectiveTag::Idle);
        let context = GearContext {
            oxygen_low,
            high_pressure,
            keep_gear_on: !idling,
            water_percentage,
            climbing,
            indoors: self.mode == SteeringMode::Inside,
            in_stairs: self.indoor.in_stairs,
            firefighting: self
                .objective_manager
                .is_current(ObjectiveTag::ExtinguishFires),
            idling,
        };

        let Ok(mut inventory) = world.get::<&mut Inventory>(me) else {
            return;
        };
        for rule in GEAR_RULES {
            if (rule.applies)(&context) {
                match rule.action {
                    GearAction::Drop(kind) => {
                        inventory.drop_equipped(kind);
                    }
                    GearAction::StowOrDrop(kind) => {
                        inventory.stow_or_drop(kind);
                    }
                }
            }
        }
    }

    fn update_facing(&mut self, world: &World) {
        let me = self.character;
        let my_pos = match world.get::<&Position>(me) {
            Ok(position) => position.pos,
            Err(_) => return,
        };
        let Ok(mut locomotion) = world.get::<&mut Locomotion>(me) else {
            return;
        };
        if let Some(aim) = locomotion.aim_target {
            let dx = aim.x - my_pos.x;
            if dx.abs() > AIM_FACE_THRESHOLD {
                locomotion.facing = if dx > 0.0 { Facing::Right } else { Facing::Left };
            }
        } else if !locomotion.in_water && locomotion.target_movement.x.abs() > 0.1 {
            locomotion.facing = if locomotion.target_movement.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            };
        }
    }

    /// Complain about the agent's own condition, rate-limited per symptom.
    fn update_speaking(&mut self, world: &World) {
        let me = self.character;
        let Ok(vitals) = world.get::<&Vitals>(me) else {
            return;
        };
        if vitals.oxygen < Vitals::LOW_OXYGEN_THRESHOLD {
            self.speech
                .say("I can't breathe!", Some("low-oxygen"), DISTRESS_COOLDOWN);
        }
        if vitals.bleeding > 2.0 {
            self.speech
                .say("I'm bleeding badly!", Some("bleeding"), DISTRESS_COOLDOWN);
        }
        if vitals.pressure_timer > 50.0 {
            let hull_name = current_hull(world, me)
                .and_then(|hull| world.get::<&Hull>(hull).ok().map(|h| h.name.clone()));
            if let Some(name) = hull_name {
                self.speech.say(
                    format!("The pressure is rising in {name}!"),
                    Some("pressure"),
                    DISTRESS_COOLDOWN,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::objective::{CombatMode, Objective, ObjectiveKind};
    use crate::components::{Affiliation, Character, Gear, Team};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn_crew_member(world: &mut World) -> (Entity, CrewAgent) {
        let me = world.spawn((
            Character::new("deckhand"),
            Vitals::new(100.0),
            Affiliation::new(Team::Crew, "human"),
            Position::new(0.0, 0.0),
            Locomotion::default(),
            Inventory::default(),
        ));
        let mut rng = StdRng::seed_from_u64(1);
        (me, CrewAgent::new(me, &mut rng))
    }

    // Jittered timers fire within two one-second ticks
    fn settle(world: &World, agent: &mut CrewAgent, events: &mut TickEvents) {
        agent.update(world, 1.0, events);
        agent.update(world, 1.0, events);
    }

    #[test]
    fn test_dead_agent_is_inert() {
        let mut world = World::new();
        let (me, mut agent) = spawn_crew_member(&mut world);
        world.get::<&mut Vitals>(me).unwrap().is_dead = true;
        world.get::<&mut Locomotion>(me).unwrap().target_movement = Vec2::new(1.0, 0.0);

        let mut events = TickEvents::default();
        agent.update(&world, 1.0, &mut events);

        let locomotion = world.get::<&Locomotion>(me).unwrap();
        assert_eq!(locomotion.target_movement, Vec2::new(1.0, 0.0));
        assert!(events.discoveries.is_empty());
    }

    #[test]
    fn test_idle_gear_policy_sheds_tools() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("mess hall", 10.0),));
        let (me, mut agent) = spawn_crew_member(&mut world);
        world.get::<&mut Position>(me).unwrap().hull = Some(hull);
        world.get::<&mut Inventory>(me).unwrap().gear = vec![
            Gear::new(GearKind::FireExtinguisher).equipped(),
            Gear::new(GearKind::TwoHandedWeapon).equipped(),
        ];

        let mut events = TickEvents::default();
        agent.update(&world, 0.016, &mut events);

        let inventory = world.get::<&Inventory>(me).unwrap();
        assert!(inventory.find(GearKind::FireExtinguisher).is_none()); // dropped
        let weapon = inventory.find(GearKind::TwoHandedWeapon).unwrap();
        assert!(!weapon.equipped); // stowed
    }

    #[test]
    fn test_combat_objective_makes_agent_run() {
        let mut world = World::new();
        let (me, mut agent) = spawn_crew_member(&mut world);
        let enemy = world.spawn((Character::new("crawler"), Position::new(10.0, 0.0)));

        agent
            .objective_manager
            .set_combat(Some(enemy), CombatMode::Defensive, 0.0);
        agent
            .objective_manager
            .sort_objectives(&world, me, &agent.unsafe_hulls);

        let mut events = TickEvents::default();
        agent.update(&world, 0.016, &mut events);

        let locomotion = world.get::<&Locomotion>(me).unwrap();
        // Run speed toward the enemy at +x
        assert!((locomotion.target_movement.x - locomotion.run_speed).abs() < 0.001);
    }

    #[test]
    fn test_short_ordered_move_walks() {
        let mut world = World::new();
        let (me, mut agent) = spawn_crew_member(&mut world);

        agent.objective_manager.add_objective(
            Objective::new(ObjectiveKind::GoTo {
                target: None,
                point: Some(Vec2::new(2.0, 0.0)),
            }),
            0.0,
        );
        agent
            .objective_manager
            .sort_objectives(&world, me, &agent.unsafe_hulls);
        assert!(agent.objective_manager.is_current(ObjectiveTag::GoTo));

        let mut events = TickEvents::default();
        agent.update(&world, 0.016, &mut events);

        let locomotion = world.get::<&Locomotion>(me).unwrap();
        assert!((locomotion.target_movement.x - locomotion.walk_speed).abs() < 0.001);
    }

    #[test]
    fn test_speed_multiplier_applied_once_and_reset() {
        let mut world = World::new();
        let (me, mut agent) = spawn_crew_member(&mut world);
        let enemy = world.spawn((Character::new("crawler"), Position::new(10.0, 0.0)));

        agent
            .objective_manager
            .set_combat(Some(enemy), CombatMode::Defensive, 0.0);
        agent
            .objective_manager
            .sort_objectives(&world, me, &agent.unsafe_hulls);
        world.get::<&mut Locomotion>(me).unwrap().speed_multiplier = 0.5;

        let mut events = TickEvents::default();
        agent.update(&world, 0.016, &mut events);

        let locomotion = world.get::<&Locomotion>(me).unwrap();
        assert!((locomotion.target_movement.x - locomotion.run_speed * 0.5).abs() < 0.001);
        assert_eq!(locomotion.speed_multiplier, 1.0);
    }

    #[test]
    fn test_ladder_lock_forces_vertical_movement() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("shaft", 4.0),));
        let (me, mut agent) = spawn_crew_member(&mut world);
        world.get::<&mut Position>(me).unwrap().hull = Some(hull);
        {
            let mut locomotion = world.get::<&mut Locomotion>(me).unwrap();
            locomotion.climbing = true;
            locomotion.next_ladder_same_as_current = true;
        }

        agent.objective_manager.add_objective(
            Objective::new(ObjectiveKind::GoTo {
                target: None,
                point: Some(Vec2::new(0.0, 10.0)),
            }),
            0.0,
        );
        agent
            .objective_manager
            .sort_objectives(&world, me, &agent.unsafe_hulls);

        let mut events = TickEvents::default();
        agent.update(&world, 0.016, &mut events);

        let locomotion = world.get::<&Locomotion>(me).unwrap();
        assert_eq!(locomotion.target_movement, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_distress_speech_on_low_oxygen() {
        let mut world = World::new();
        let (me, mut agent) = spawn_crew_member(&mut world);
        world.get::<&mut Vitals>(me).unwrap().oxygen = 5.0;

        let mut events = TickEvents::default();
        settle(&world, &mut agent, &mut events);

        assert!(agent
            .speech
            .pending()
            .iter()
            .any(|line| line.text.contains("breathe")));

        // The tag suppresses a repeat on the next report cycle
        let count = agent.speech.pending().len();
        agent.update(&world, 1.0, &mut events);
        assert_eq!(agent.speech.pending().len(), count);
    }

    #[test]
    fn test_rescore_events_cover_visible_hulls() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("bridge", 10.0),));
        let (me, mut agent) = spawn_crew_member(&mut world);
        world.get::<&mut Position>(me).unwrap().hull = Some(hull);

        let mut events = TickEvents::default();
        settle(&world, &mut agent, &mut events);

        assert!(events.rescore.contains(&(me, hull)));
    }

    #[test]
    fn test_refresh_hull_safety_tracks_threshold() {
        let mut world = World::new();
        let burning = world.spawn((Hull::new("reactor room", 10.0).with_fire(10.0),));
        let calm = world.spawn((Hull::new("mess hall", 10.0),));
        let (_, mut agent) = spawn_crew_member(&mut world);

        agent.refresh_hull_safety(&world, burning);
        agent.refresh_hull_safety(&world, calm);
        assert!(agent.unsafe_hulls.contains(&burning));
        assert!(!agent.unsafe_hulls.contains(&calm));

        // Fire out: the next rescore clears the classification
        world.get::<&mut Hull>(burning).unwrap().fire_sources.clear();
        agent.refresh_hull_safety(&world, burning);
        assert!(!agent.unsafe_hulls.contains(&burning));
    }

    #[test]
    fn test_hazard_overrides_follow_equipment() {
        let mut world = World::new();
        let (me, agent) = spawn_crew_member(&mut world);

        let bare = agent.hazard_overrides(&world);
        assert!(!bare.ignore_oxygen && !bare.ignore_water);

        world
            .get::<&mut Inventory>(me)
            .unwrap()
            .gear
            .push(Gear::new(GearKind::PressureSuit).equipped().with_air());
        let suited = agent.hazard_overrides(&world);
        assert!(suited.ignore_oxygen);
        assert!(suited.ignore_water);
    }

    #[test]
    fn test_backend_switches_with_hull_presence() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("airlock", 5.0),));
        let (me, mut agent) = spawn_crew_member(&mut world);
        let mut events = TickEvents::default();

        // No hull anywhere: open water
        agent.update(&world, 0.016, &mut events);
        assert_eq!(agent.mode(), SteeringMode::Outside);

        world.get::<&mut Position>(me).unwrap().hull = Some(hull);
        agent.update(&world, 0.016, &mut events);
        assert_eq!(agent.mode(), SteeringMode::Inside);
    }
}
