use std::{path::Path, time::Duration};

use glam::DVec2;
use river_crossing_core::{Command, Event, Image, Intent, LossCondition};
use river_crossing_world::{self as world, query, Entity, Kind, Level, Phase, World};

const LEVEL: &str = r#"<level>
  <types>
    <decor id="g001" image="grass.png"/>
    <decor id="r001" image="river.png"/>
  </types>
  <background>
    <decor id="g001" x="0" y="14" repeat-x="16" repeat-y="2"/>
    <decor id="r001" x="0" y="2" repeat-x="16" repeat-y="11"/>
    <decor id="g001" x="0" y="0" repeat-x="16" repeat-y="2"/>
  </background>
  <hero image="hero.png" hit-image="hit.png" mask="mask.png" name="Sparty"/>
  <cargo id="goose" name="Goose" image="goose.png" carried-image="goose-carried.png" x="7.5"/>
</level>"#;

const STEP: Duration = Duration::from_millis(50);

fn stub_loader(path: &Path) -> anyhow::Result<Image> {
    Ok(Image::new(path.display().to_string(), 64, 64))
}

fn session() -> (World, Vec<Event>) {
    let mut world = World::new();
    for _ in 0..2 {
        let level = Level::from_str_with_loader(LEVEL, "images", stub_loader)
            .expect("level should parse");
        let _ = world.add_level(level);
    }
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadLevel { level: 0 }, &mut events);
    (world, events)
}

fn tick(world: &mut World, dt: Duration, events: &mut Vec<Event>) {
    world::apply(world, Command::Tick { dt }, events);
}

fn wait_for_play(world: &mut World, events: &mut Vec<Event>) {
    tick(world, Duration::from_millis(3050), events);
    assert_eq!(query::phase(world), Phase::Playing);
}

fn hero_position(world: &World) -> DVec2 {
    query::hero(world).map(Entity::position).expect("hero")
}

#[test]
fn delivering_the_cargo_advances_to_the_next_level() {
    let (mut world, mut events) = session();
    assert!(events.contains(&Event::LevelLoaded { level: 0 }));
    wait_for_play(&mut world, &mut events);
    assert!(events.contains(&Event::GetReadyEnded));

    world::apply(
        &mut world,
        Command::SetRiverCheat { enabled: true },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::Click {
            position: DVec2::new(480.0, 992.0),
        },
        &mut events,
    );
    let cargo = query::carried_cargo(&world).expect("cargo picked up");

    for _ in 0..13 {
        world::apply(
            &mut world,
            Command::MoveHero {
                intent: Intent::Forward,
            },
            &mut events,
        );
        tick(&mut world, STEP, &mut events);
    }
    assert_eq!(hero_position(&world), DVec2::new(480.0, 96.0));
    assert_eq!(query::loss_condition(&world), None);

    world::apply(
        &mut world,
        Command::Click {
            position: DVec2::new(480.0, 96.0),
        },
        &mut events,
    );
    assert!(events.contains(&Event::CargoReleased { cargo }));
    assert_eq!(
        query::entity(&world, cargo).map(Entity::position),
        Some(DVec2::new(480.0, 32.0))
    );
    assert_eq!(query::phase(&world), Phase::Won);
    assert_eq!(
        query::control_panel(&world).message(Phase::Won).as_deref(),
        Some("Level Complete!")
    );

    events.clear();
    tick(&mut world, Duration::from_secs(3), &mut events);
    assert!(events.contains(&Event::LevelLoaded { level: 1 }));
    assert_eq!(query::control_panel(&world).level(), 1);
    assert_eq!(query::count(&world, Kind::Cargo), 1);
    assert!(query::river_cheat(&world));
}

#[test]
fn walking_into_the_river_reloads_the_level() {
    let (mut world, mut events) = session();
    wait_for_play(&mut world, &mut events);

    for _ in 0..3 {
        world::apply(
            &mut world,
            Command::MoveHero {
                intent: Intent::Forward,
            },
            &mut events,
        );
    }
    tick(&mut world, STEP, &mut events);

    assert_eq!(
        query::phase(&world),
        Phase::Lost(LossCondition::FellInRiver)
    );
    assert!(!world.move_hero(Intent::Backward, &mut events));

    events.clear();
    tick(&mut world, Duration::from_secs(3), &mut events);
    assert_eq!(events.last(), Some(&Event::LevelLoaded { level: 0 }));
    assert_eq!(query::loss_condition(&world), None);
    assert_eq!(hero_position(&world), DVec2::new(480.0, 928.0));
}

#[test]
fn moves_before_the_banner_clears_are_ignored() {
    let (mut world, mut events) = session();
    tick(&mut world, Duration::from_secs(1), &mut events);

    world::apply(
        &mut world,
        Command::MoveHero {
            intent: Intent::Forward,
        },
        &mut events,
    );

    assert_eq!(query::phase(&world), Phase::GetReady);
    assert_eq!(hero_position(&world), DVec2::new(480.0, 928.0));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::HeroMoved { .. })));
}

#[test]
fn unknown_levels_are_rejected_without_side_effects() {
    let (mut world, mut events) = session();
    let before = query::entities(&world).count();

    world::apply(&mut world, Command::LoadLevel { level: 9 }, &mut events);

    assert_eq!(query::entities(&world).count(), before);
    assert_eq!(query::level_count(&world), 2);
}
