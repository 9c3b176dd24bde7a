//! Hull hazard scoring - how safe is a compartment for a given character.

use hecs::{Entity, World};

use crate::components::{lerp, Affiliation, HostileAi, Hull, Inventory, Position, Vitals};

/// Hulls scoring below this are classified as unsafe
pub const HULL_SAFETY_THRESHOLD: f32 = 50.0;

/// Hazard classes the observer can be told to disregard, typically because
/// equipment or the current objective makes the hazard irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardOverrides {
    pub ignore_oxygen: bool,
    pub ignore_water: bool,
    pub ignore_fire: bool,
    pub ignore_enemies: bool,
}

impl HazardOverrides {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Safety score for a hull in [0, 100], relative to one observer.
///
/// Deterministic and side-effect free. Lethal pressure without protection is
/// an absolute veto; otherwise four independent factors multiply, so hazards
/// compound rather than the worst one alone dominating.
pub fn hull_safety(
    world: &World,
    hull: Entity,
    observer: Entity,
    overrides: HazardOverrides,
) -> f32 {
    let Ok(hull_data) = world.get::<&Hull>(hull) else {
        return 0.0;
    };
    let Ok(vitals) = world.get::<&Vitals>(observer) else {
        return 0.0;
    };

    let pressure_protected = vitals.pressure_protection > 0.0
        || world
            .get::<&Inventory>(observer)
            .map(|inv| inv.has_pressure_suit())
            .unwrap_or(false);
    if hull_data.lethal_pressure && !pressure_protected {
        return 0.0;
    }

    let mut oxygen_factor = if overrides.ignore_oxygen {
        1.0
    } else {
        lerp(0.25, 1.0, hull_data.oxygen_percentage / 100.0)
    };
    let mut water_factor = if overrides.ignore_water {
        1.0
    } else {
        lerp(1.0, 0.25, hull_data.water_percentage / 100.0)
    };
    if !vitals.needs_air {
        oxygen_factor = 1.0;
        water_factor = 1.0;
    }

    // Even the smallest fire halves the safety
    let fire = hull_data.fire_sources.len() as f32 * 0.5
        + hull_data
            .fire_sources
            .iter()
            .map(|fs| fs.damage_range)
            .sum::<f32>()
            / hull_data.width;
    let fire_factor = if overrides.ignore_fire {
        1.0
    } else {
        lerp(1.0, 0.0, fire.clamp(0.0, 1.0))
    };

    // Safety drops 90% per enemy, bottoming out at two
    let enemy_factor = if overrides.ignore_enemies {
        1.0
    } else {
        let enemy_count = count_hostiles(world, hull, observer) as f32;
        lerp(1.0, 0.0, (enemy_count * 0.9).clamp(0.0, 1.0))
    };

    let safety = oxygen_factor * water_factor * fire_factor * enemy_factor;
    (safety * 100.0).clamp(0.0, 100.0)
}

/// Living, conscious occupants of the hull that are hostile to the observer:
/// creature-AI characters, or characters on a different non-neutral team.
fn count_hostiles(world: &World, hull: Entity, observer: Entity) -> usize {
    let Ok(my_affiliation) = world.get::<&Affiliation>(observer) else {
        return 0;
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
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Character, Gear, GearKind, Team};

    fn spawn_observer(world: &mut World, hull: Entity) -> Entity {
        world.spawn((
            Character::new("observer"),
            Vitals::new(100.0),
            Affiliation::new(Team::Crew, "human"),
            Position::default().in_hull(hull),
            Inventory::default(),
        ))
    }

    fn spawn_occupant(world: &mut World, hull: Entity, team: Team) -> Entity {
        world.spawn((
            Character::new("occupant"),
            Vitals::new(100.0),
            Affiliation::new(team, "human"),
            Position::default().in_hull(hull),
        ))
    }

    #[test]
    fn test_pristine_hull_scores_100() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("mess hall", 10.0),));
        let observer = spawn_observer(&mut world, hull);

        let score = hull_safety(&world, hull, observer, HazardOverrides::none());
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_pressure_veto() {
        let mut world = World::new();
        let mut hull_data = Hull::new("breached bow", 10.0);
        hull_data.lethal_pressure = true;
        let hull = world.spawn((hull_data,));
        let observer = spawn_observer(&mut world, hull);

        assert_eq!(
            hull_safety(&world, hull, observer, HazardOverrides::none()),
            0.0
        );

        // A pressure suit lifts the veto
        world
            .get::<&mut Inventory>(observer)
            .unwrap()
            .gear
            .push(Gear::new(GearKind::PressureSuit).equipped().with_air());
        assert!(hull_safety(&world, hull, observer, HazardOverrides::none()) > 0.0);
    }

    #[test]
    fn test_room_width_fire_zeroes_score() {
        let mut world = World::new();
        // One fire with damage range equal to the hull width:
        // intensity = 0.5 + 1.0, clamped to 1 -> fire factor 0
        let hull = world.spawn((Hull::new("reactor room", 10.0).with_fire(10.0),));
        let observer = spawn_observer(&mut world, hull);

        assert_eq!(
            hull_safety(&world, hull, observer, HazardOverrides::none()),
            0.0
        );
    }

    #[test]
    fn test_small_fire_halves_safety() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("galley", 100.0).with_fire(0.0),));
        let observer = spawn_observer(&mut world, hull);

        let score = hull_safety(&world, hull, observer, HazardOverrides::none());
        assert!((score - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_enemy_factor_monotonic_and_caps() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("armory", 10.0),));
        let observer = spawn_observer(&mut world, hull);

        let empty = hull_safety(&world, hull, observer, HazardOverrides::none());

        spawn_occupant(&mut world, hull, Team::Separatists);
        let one_enemy = hull_safety(&world, hull, observer, HazardOverrides::none());
        assert!(one_enemy < empty);

        spawn_occupant(&mut world, hull, Team::Separatists);
        let two_enemies = hull_safety(&world, hull, observer, HazardOverrides::none());
        assert!(two_enemies < one_enemy);
        // Two hostiles fully zero the enemy factor: 2 * 0.9 >= 1
        assert_eq!(two_enemies, 0.0);
    }

    #[test]
    fn test_friendlies_and_neutrals_are_not_hostiles() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("corridor", 10.0),));
        let observer = spawn_observer(&mut world, hull);

        spawn_occupant(&mut world, hull, Team::Crew);
        spawn_occupant(&mut world, hull, Team::Neutral);

        assert_eq!(
            hull_safety(&world, hull, observer, HazardOverrides::none()),
            100.0
        );
    }

    #[test]
    fn test_dead_hostiles_do_not_count() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("corridor", 10.0),));
        let observer = spawn_observer(&mut world, hull);
        let enemy = spawn_occupant(&mut world, hull, Team::Separatists);
        world.get::<&mut Vitals>(enemy).unwrap().is_dead = true;

        assert_eq!(
            hull_safety(&world, hull, observer, HazardOverrides::none()),
            100.0
        );
    }

    #[test]
    fn test_immunities_collapse_factors() {
        let mut world = World::new();
        let hull = world.spawn((
            Hull::new("flooded lab", 10.0)
                .with_oxygen(0.0)
                .with_water(100.0)
                .with_fire(10.0),
        ));
        let observer = spawn_observer(&mut world, hull);
        spawn_occupant(&mut world, hull, Team::Separatists);
        spawn_occupant(&mut world, hull, Team::Separatists);

        let all_ignored = HazardOverrides {
            ignore_oxygen: true,
            ignore_water: true,
            ignore_fire: true,
            ignore_enemies: true,
        };
        assert_eq!(hull_safety(&world, hull, observer, all_ignored), 100.0);
    }

    #[test]
    fn test_airless_species_ignores_atmosphere() {
        let mut world = World::new();
        let hull = world.spawn((Hull::new("flooded hold", 10.0).with_oxygen(0.0).with_water(100.0),));
        let observer = spawn_observer(&mut world, hull);
        world.get::<&mut Vitals>(observer).unwrap().needs_air = false;

        assert_eq!(
            hull_safety(&world, hull, observer, HazardOverrides::none()),
            100.0
        );
    }

    #[test]
    fn test_score_always_clamped() {
        let mut world = World::new();
        let hull = world.spawn((
            Hull::new("worst case", 1.0)
                .with_oxygen(0.0)
                .with_water(100.0)
                .with_fire(50.0)
                .with_fire(50.0),
        ));
        let observer = spawn_observer(&mut world, hull);

        let score = hull_safety(&world, hull, observer, HazardOverrides::none());
        assert!((0.0..=100.0).contains(&score));
    }
}
