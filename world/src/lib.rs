#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for River Crossing.
//!
//! The [`World`] owns the live entity list of the level being played, runs
//! the per-frame pipeline (bounds, movement, collisions, cargo-eaten check,
//! level switching) and hosts the hero intents and pointer clicks routed in
//! by adapters. Levels are registered once as immutable [`Level`] templates
//! and every load clones fresh entities out of them.

mod cargo;
mod control_panel;
mod decor;
mod document;
mod entity;
mod hero;
mod level;
mod scan;
mod vehicle;

use std::{io, path::PathBuf, time::Duration};

use glam::DVec2;
use river_crossing_core::{
    Command, EntityId, Event, Intent, LossCondition, CARGO_DELIVERED_ROW, HERO_SPAWN,
    LEVEL_SWITCH_DELAY, MAX_FRAME_STEP, MAX_LEVEL, PLAYFIELD_WIDTH, RIVER_TILE_ID,
    WELCOME_BANNER,
};
use river_crossing_rendering::{Frame, Viewport};
use thiserror::Error;
use tracing::{debug, info, warn};

use entity::UpdateContext;
use level::LevelInstance;

pub use cargo::Cargo;
pub use control_panel::ControlPanel;
pub use decor::{Decor, RectFill};
pub use entity::{DrawContext, Entity, EntityKind, Kind};
pub use hero::{Hero, DEFAULT_HERO_NAME};
pub use level::{load_image, Level, LevelError};
pub use scan::CargoEaten;
pub use vehicle::{Car, SketchyBoat, Vehicle, VehicleRole};

/// Errors raised by session level operations.
#[derive(Debug, Error)]
pub enum WorldError {
    /// No level was registered under the requested index.
    #[error("level {index} is not registered")]
    UnknownLevel {
        /// Requested level index.
        index: usize,
    },
    /// The level file could not be loaded.
    #[error(transparent)]
    Level(#[from] LevelError),
    /// The save document could not be written.
    #[error("failed to write save document {}", path.display())]
    Save {
        /// Destination of the save document.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The save document could not be serialised.
    #[error("failed to serialise save document")]
    Document(#[from] xmltree::Error),
}

/// Stage of the level being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Banner shown before the level timer starts.
    GetReady,
    /// The hero may move and handle cargo.
    Playing,
    /// The level was lost; the same level reloads after the switch delay.
    Lost(LossCondition),
    /// Every cargo was delivered; the next level loads after the switch delay.
    Won,
}

/// Live entity paired with its stable identifier.
#[derive(Clone, Debug)]
pub(crate) struct Slot {
    pub(crate) id: EntityId,
    pub(crate) entity: Entity,
}

/// Represents the authoritative River Crossing session.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    entities: Vec<Slot>,
    next_id: u32,
    hero: Option<EntityId>,
    levels: Vec<Level>,
    loss: Option<LossCondition>,
    won: bool,
    get_ready: bool,
    level_switch: Duration,
    road_cheat: bool,
    river_cheat: bool,
    panel: ControlPanel,
    viewport: Viewport,
}

impl World {
    /// Creates an empty session with no registered levels.
    #[must_use]
    pub fn new() -> Self {
        Self {
            banner: WELCOME_BANNER,
            entities: Vec::new(),
            next_id: 0,
            hero: None,
            levels: Vec::new(),
            loss: None,
            won: false,
            get_ready: true,
            level_switch: LEVEL_SWITCH_DELAY,
            road_cheat: false,
            river_cheat: false,
            panel: ControlPanel::default(),
            viewport: Viewport::IDENTITY,
        }
    }

    /// Registers a level template and returns its index.
    pub fn add_level(&mut self, level: Level) -> usize {
        self.levels.push(level);
        self.levels.len() - 1
    }

    /// Appends an entity on top of the live list.
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entities.push(Slot { id, entity });
        id
    }

    /// Appends the hero, replacing any hero already in the live list.
    pub fn add_hero(&mut self, hero: Entity) -> EntityId {
        if let Some(previous) = self.hero.take() {
            self.entities.retain(|slot| slot.id != previous);
        }
        let id = self.add(hero);
        self.hero = Some(id);
        id
    }

    pub(crate) fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.entity)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(|slot| &mut slot.entity)
    }

    pub(crate) fn hero_entity(&self) -> Option<&Entity> {
        self.hero.and_then(|id| self.entity(id))
    }

    fn hero_entity_mut(&mut self) -> Option<&mut Entity> {
        let id = self.hero?;
        self.entity_mut(id)
    }

    fn hero_state(&self) -> Option<&Hero> {
        self.hero_entity().and_then(Entity::as_hero)
    }

    pub(crate) fn hero_mut(&mut self) -> Option<&mut Hero> {
        self.hero_entity_mut().and_then(Entity::as_hero_mut)
    }

    /// Drops every live entity and resets the session flags.
    ///
    /// Identifiers handed out before the clear are never reused.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.hero = None;
        self.loss = None;
        self.won = false;
        self.get_ready = true;
        self.level_switch = LEVEL_SWITCH_DELAY;
        self.panel.clear();
    }

    /// Replaces the live list with fresh clones of a registered level.
    ///
    /// Unknown indices are rejected before anything is cleared.
    pub fn load_level(
        &mut self,
        index: usize,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let instance = self
            .levels
            .get(index)
            .map(Level::instantiate)
            .ok_or(WorldError::UnknownLevel { index })?;
        self.clear();
        self.instance(index, instance, out_events);
        Ok(())
    }

    pub(crate) fn instance(
        &mut self,
        level: usize,
        instance: LevelInstance,
        out_events: &mut Vec<Event>,
    ) {
        for item in instance.items {
            let _ = self.add(item);
        }
        if let Some(hero) = instance.hero {
            let _ = self.add_hero(hero);
        }
        for cargo in instance.cargo {
            let _ = self.add(cargo);
        }

        for cargo in self
            .entities
            .iter()
            .rev()
            .filter_map(|slot| slot.entity.as_cargo())
            .take(3)
        {
            self.panel.push_cargo_name(cargo.name());
        }
        if let Some(name) = self.hero_state().map(|hero| hero.name().to_owned()) {
            self.panel.set_hero_name(&name);
        }
        if let Some(hero) = self.hero_entity_mut() {
            hero.set_position(HERO_SPAWN);
        }
        self.panel.set_level(level);
        self.won = false;

        info!(level, entities = self.entities.len(), "level_loaded");
        out_events.push(Event::LevelLoaded { level });
    }

    /// Advances the session by `elapsed`, split into steps of at most
    /// [`MAX_FRAME_STEP`] so fast entities cannot tunnel through the hero.
    pub fn tick(&mut self, elapsed: Duration, out_events: &mut Vec<Event>) {
        let mut remaining = elapsed;
        while remaining > MAX_FRAME_STEP {
            self.update(MAX_FRAME_STEP, out_events);
            remaining -= MAX_FRAME_STEP;
        }
        self.update(remaining, out_events);
    }

    /// Runs one step of the frame pipeline.
    pub fn update(&mut self, elapsed: Duration, out_events: &mut Vec<Event>) {
        if elapsed.is_zero() {
            return;
        }
        self.panel.update(elapsed);

        let out_of_bounds = self.hero_entity().is_some_and(|hero| {
            let x = hero.position().x;
            x > PLAYFIELD_WIDTH - hero.size().x || x < 0.0
        });
        if out_of_bounds {
            self.lose(LossCondition::OutOfBounds, out_events);
        }

        let hero_id = self.hero;
        let riding = self.hero_state().and_then(Hero::riding);
        let hero_position = self.hero_entity().map(Entity::position);
        for slot in self
            .entities
            .iter_mut()
            .filter(|slot| Some(slot.id) != hero_id)
        {
            let context = UpdateContext {
                hero_position,
                ridden: riding == Some(slot.id),
            };
            slot.entity.update(elapsed, &context);
        }
        if let Some(hero) = self.hero_entity_mut() {
            hero.update(elapsed, &UpdateContext::default());
        }

        if let Some(hero) = self.hero_entity() {
            let position = hero.position();
            let (on_boat, on_sketchy) = hero
                .as_hero()
                .map_or((false, false), |hero| (hero.is_on_boat(), hero.is_on_sketchy()));
            if !on_boat {
                self.collision_test(position, out_events);
            } else if on_sketchy {
                self.sink_test(riding, out_events);
            }
            self.eaten_test(position.y, out_events);
        }

        if self.get_ready && !self.panel.timer().is_zero() {
            self.get_ready = false;
            debug!(level = self.panel.level(), "get_ready_ended");
            out_events.push(Event::GetReadyEnded);
        }

        if self.is_over() {
            self.level_switch = self.level_switch.saturating_sub(elapsed);
            if self.level_switch.is_zero() {
                self.switch_level(out_events);
            }
        }
    }

    fn sink_test(&mut self, riding: Option<EntityId>, out_events: &mut Vec<Event>) {
        let sunk = riding.filter(|boat| {
            self.entity(*boat)
                .and_then(Entity::as_vehicle)
                .and_then(Vehicle::as_sketchy)
                .is_some_and(SketchyBoat::has_sunk)
        });
        if let Some(boat) = sunk {
            if !self.is_over() {
                out_events.push(Event::SketchyBoatSank { boat });
                self.lose(LossCondition::FellInRiver, out_events);
            }
        }
    }

    fn eaten_test(&mut self, hero_y: f64, out_events: &mut Vec<Event>) {
        let eaten = scan::cargo_eaten(&self.entities, hero_y);
        if !eaten.any() || self.is_over() {
            return;
        }

        let (eater, victim) = if eaten.small_eaten {
            (eaten.medium, eaten.small)
        } else {
            (eaten.large, eaten.medium)
        };
        let name = |id: Option<EntityId>| {
            id.and_then(|id| self.entity(id))
                .and_then(Entity::as_cargo)
                .map_or_else(String::new, |cargo| cargo.name().to_owned())
        };
        let (eater, victim) = (name(eater), name(victim));
        self.panel.set_eaten(&eater, &victim);
        self.lose(LossCondition::CargoEaten, out_events);
    }

    fn switch_level(&mut self, out_events: &mut Vec<Event>) {
        let Some(last) = self.levels.len().checked_sub(1) else {
            self.level_switch = LEVEL_SWITCH_DELAY;
            return;
        };
        let current = self.panel.level();
        let next = if self.won {
            (current + 1).min(MAX_LEVEL)
        } else {
            current
        }
        .min(last);

        if let Err(error) = self.load_level(next, out_events) {
            warn!(level = next, error = %error, "level_switch_failed");
        }
    }

    const fn is_over(&self) -> bool {
        self.loss.is_some() || self.won
    }

    fn lose(&mut self, condition: LossCondition, out_events: &mut Vec<Event>) {
        if self.is_over() {
            return;
        }
        self.loss = Some(condition);
        info!(condition = ?condition, level = self.panel.level(), "game_lost");
        out_events.push(Event::GameLost { condition });
    }

    /// Moves the hero one tile in the direction of `intent`.
    ///
    /// Intents are ignored until the level timer has started and after the
    /// level is lost or won. Returns whether the move was accepted.
    pub fn move_hero(&mut self, intent: Intent, out_events: &mut Vec<Event>) -> bool {
        if self.is_over() || self.panel.timer().is_zero() {
            return false;
        }
        let Some(hero) = self.hero_entity_mut() else {
            return false;
        };
        let on_boat = hero.as_hero().is_some_and(Hero::is_on_boat);
        let mut position = hero.position();
        if !hero::step(&mut position, intent, on_boat) {
            return false;
        }
        hero.set_position(position);

        let mut boarding = Vec::new();
        self.boat_test(&mut boarding);
        let position = self.hero_entity().map_or(position, Entity::position);
        out_events.push(Event::HeroMoved { intent, position });
        out_events.extend(boarding);
        true
    }

    /// Puts the hero aboard the first boat under it, or back on foot.
    ///
    /// Boarding snaps the hero onto the boat and makes it drift at the boat's
    /// speed. The river cheat keeps the hero on foot.
    pub fn boat_test(&mut self, out_events: &mut Vec<Event>) {
        let Some(hero_position) = self.hero_entity().map(Entity::position) else {
            return;
        };
        let previous = self.hero_state().and_then(Hero::riding);
        let boat = if self.river_cheat {
            None
        } else {
            self.entities.iter().find_map(|slot| {
                let vehicle = slot.entity.as_vehicle()?;
                (slot.entity.is(Kind::Boat) && slot.entity.hit_test(hero_position)).then(|| {
                    (
                        slot.id,
                        vehicle.speed(),
                        slot.entity.position(),
                        slot.entity.is(Kind::SketchyBoat),
                    )
                })
            })
        };

        let Some(hero) = self.hero_entity_mut() else {
            return;
        };
        match boat {
            Some((id, speed, position, sketchy)) => {
                hero.set_position(position);
                if let Some(state) = hero.as_hero_mut() {
                    state.board(id, speed, sketchy);
                }
                if previous != Some(id) {
                    debug!(boat = id.get(), sketchy, "hero_boarded");
                    out_events.push(Event::HeroBoarded { boat: id });
                }
            }
            None => {
                if let Some(state) = hero.as_hero_mut() {
                    state.disembark();
                }
                if previous.is_some() {
                    debug!("hero_disembarked");
                    out_events.push(Event::HeroDisembarked);
                }
            }
        }
    }

    /// Loses the level when `point` lies on a car or on open river.
    ///
    /// Entities are tested from the top of the list down and the first hit
    /// decides the outcome. The road and river cheats disable their hazards.
    pub fn collision_test(&mut self, point: DVec2, out_events: &mut Vec<Event>) {
        let mut culprit = None;
        for slot in self.entities.iter().rev() {
            let entity = &slot.entity;
            if !entity.hit_test(point) {
                continue;
            }
            if !self.road_cheat && entity.is(Kind::Car) {
                let car = entity.as_vehicle().map(|car| car.id().to_owned());
                culprit = Some((LossCondition::HitByCar, car));
                break;
            }
            if !self.river_cheat && entity.decor_id() == Some(RIVER_TILE_ID) {
                culprit = Some((LossCondition::FellInRiver, None));
                break;
            }
        }

        let Some((condition, car)) = culprit else {
            return;
        };
        if self.is_over() {
            return;
        }
        if let Some(car) = car {
            self.panel.set_hit_by(&car);
        }
        self.lose(condition, out_events);
    }

    /// Topmost cargo under `point`.
    #[must_use]
    pub fn hit_test(&self, point: DVec2) -> Option<EntityId> {
        self.entities
            .iter()
            .rev()
            .find(|slot| slot.entity.is(Kind::Cargo) && slot.entity.hit_test(point))
            .map(|slot| slot.id)
    }

    /// Marks the level won once every cargo sits on the far bank.
    pub fn check_win_state(&mut self, out_events: &mut Vec<Event>) {
        let delivered = self
            .entities
            .iter()
            .filter(|slot| slot.entity.is(Kind::Cargo))
            .all(|slot| slot.entity.position().y <= CARGO_DELIVERED_ROW);
        if delivered && !self.is_over() {
            self.won = true;
            info!(level = self.panel.level(), timer = %self.panel.timer_display(), "level_won");
            out_events.push(Event::GameWon);
        }
    }

    /// Routes a pointer press in virtual pixels to the cargo under it.
    ///
    /// A carried cargo is released, any other cargo is picked up. Clicks are
    /// ignored while the get-ready banner is up.
    pub fn click(&mut self, point: DVec2, out_events: &mut Vec<Event>) {
        if self.get_ready {
            return;
        }
        let Some(cargo) = self.hit_test(point) else {
            return;
        };
        let carried = self
            .entity(cargo)
            .and_then(Entity::as_cargo)
            .is_some_and(Cargo::is_carried);
        if carried {
            self.release(cargo, out_events);
        } else {
            self.pick_up(cargo, out_events);
        }
    }

    /// Makes cars harmless while enabled.
    pub fn set_road_cheat(&mut self, enabled: bool) {
        self.road_cheat = enabled;
    }

    /// Makes the river harmless while enabled. Disabling it re-evaluates
    /// whether the hero stands on a boat.
    pub fn set_river_cheat(&mut self, enabled: bool, out_events: &mut Vec<Event>) {
        self.river_cheat = enabled;
        if !enabled {
            self.boat_test(out_events);
        }
    }

    /// Overrides the level timer.
    pub fn set_timer(&mut self, elapsed: Duration) {
        self.panel.set_timer(elapsed);
    }

    /// Current stage of the level.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match (self.loss, self.won, self.get_ready) {
            (Some(condition), _, _) => Phase::Lost(condition),
            (None, true, _) => Phase::Won,
            (None, false, true) => Phase::GetReady,
            (None, false, false) => Phase::Playing,
        }
    }

    /// Records the draw list for a surface of `width` by `height` pixels.
    ///
    /// The computed viewport is kept for later calls to
    /// [`World::scale_coords`].
    pub fn draw(&mut self, width: f64, height: f64) -> Frame {
        self.viewport = Viewport::fit(width, height);
        let mut frame = Frame::new(self.viewport);
        let context = DrawContext {
            hero_position: self.hero_entity().map(Entity::position),
            loss: self.loss,
        };
        for slot in &self.entities {
            slot.entity.draw(&context, &mut frame);
        }
        self.panel.draw(self.phase(), &mut frame);
        frame
    }

    /// Maps a surface position into virtual pixels using the last drawn
    /// viewport.
    #[must_use]
    pub fn scale_coords(&self, surface: DVec2) -> DVec2 {
        self.viewport.to_virtual(surface)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.tick(dt, out_events);
        }
        Command::MoveHero { intent } => {
            let _ = world.move_hero(intent, out_events);
        }
        Command::Click { position } => world.click(position, out_events),
        Command::LoadLevel { level } => {
            if let Err(error) = world.load_level(level, out_events) {
                warn!(level, error = %error, "level_load_rejected");
            }
        }
        Command::SetRoadCheat { enabled } => world.set_road_cheat(enabled),
        Command::SetRiverCheat { enabled } => world.set_river_cheat(enabled, out_events),
        Command::SetTimer { elapsed } => world.set_timer(elapsed),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use river_crossing_core::{EntityId, LossCondition};

    use super::{scan, CargoEaten, ControlPanel, Entity, Kind, Phase, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current stage of the level.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase()
    }

    /// Reason the level was lost, if it was.
    #[must_use]
    pub fn loss_condition(world: &World) -> Option<LossCondition> {
        world.loss
    }

    /// Whether every cargo has been delivered.
    #[must_use]
    pub fn is_won(world: &World) -> bool {
        world.won
    }

    /// Whether the get-ready banner is still up.
    #[must_use]
    pub fn is_get_ready(world: &World) -> bool {
        world.get_ready
    }

    /// Identifier of the live hero.
    #[must_use]
    pub fn hero_id(world: &World) -> Option<EntityId> {
        world.hero
    }

    /// The live hero entity.
    #[must_use]
    pub fn hero(world: &World) -> Option<&Entity> {
        world.hero_entity()
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<&Entity> {
        world.entity(id)
    }

    /// Live entities in draw order, bottom first.
    pub fn entities(world: &World) -> impl Iterator<Item = (EntityId, &Entity)> {
        world.entities.iter().map(|slot| (slot.id, &slot.entity))
    }

    /// Number of live entities answering to `kind`.
    #[must_use]
    pub fn count(world: &World, kind: Kind) -> usize {
        scan::count(&world.entities, kind)
    }

    /// Cargo currently flagged as carried.
    #[must_use]
    pub fn carried_cargo(world: &World) -> Option<EntityId> {
        scan::carried_cargo(&world.entities)
    }

    /// Outcome of the cargo-eaten check against the live hero.
    #[must_use]
    pub fn cargo_eaten(world: &World) -> CargoEaten {
        let hero_y = world.hero_entity().map_or(0.0, |hero| hero.position().y);
        scan::cargo_eaten(&world.entities, hero_y)
    }

    /// Control panel state.
    #[must_use]
    pub fn control_panel(world: &World) -> &ControlPanel {
        &world.panel
    }

    /// Number of registered level templates.
    #[must_use]
    pub fn level_count(world: &World) -> usize {
        world.levels.len()
    }

    /// Whether cars are harmless.
    #[must_use]
    pub fn road_cheat(world: &World) -> bool {
        world.road_cheat
    }

    /// Whether the river is harmless.
    #[must_use]
    pub fn river_cheat(world: &World) -> bool {
        world.river_cheat
    }

    /// Time left before the next level loads once the level is over.
    #[must_use]
    pub fn level_switch_remaining(world: &World) -> Duration {
        world.level_switch
    }
}
