//! Cargo pieces and the pickup/release protocol.

use glam::DVec2;
use river_crossing_core::{
    EntityId, Event, ImageHandle, CARGO_BOTTOM_ROW, CARGO_TOP_ROW, HERO_BOTTOM_BORDER,
    HERO_TOP_BORDER, TILE_LENGTH,
};
use river_crossing_rendering::Frame;
use tracing::debug;

use crate::{entity::DrawContext, scan, World};

/// Cargo payload: identity, carried flag and the column it returns to.
#[derive(Clone, Debug, PartialEq)]
pub struct Cargo {
    name: String,
    id: String,
    carried: bool,
    home_x: f64,
    carried_image: ImageHandle,
}

impl Cargo {
    /// Creates a resting cargo whose releases snap back to column `home_x`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        home_x: f64,
        carried_image: ImageHandle,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            carried: false,
            home_x,
            carried_image,
        }
    }

    /// Display name, e.g. "Goose".
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier the cargo was declared with.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the hero carries the cargo.
    #[must_use]
    pub const fn is_carried(&self) -> bool {
        self.carried
    }

    /// Column the cargo snaps to when released.
    #[must_use]
    pub const fn home_x(&self) -> f64 {
        self.home_x
    }

    pub(crate) fn set_carried(&mut self, carried: bool) {
        self.carried = carried;
    }

    pub(crate) fn draw(
        &self,
        center: DVec2,
        image: Option<&ImageHandle>,
        context: &DrawContext,
        frame: &mut Frame,
    ) {
        if self.carried {
            if let (None, Some(hero)) = (context.loss, context.hero_position) {
                frame.image_centered(&self.carried_image, hero);
            }
        } else if let Some(image) = image {
            frame.image_centered(image, center);
        }
    }
}

impl World {
    /// Hands `cargo` to the hero when the hero stands within one tile of its
    /// row.
    ///
    /// A cargo already being carried is released first under the same
    /// proximity rule. The release only succeeds on a bank, so picking up in
    /// mid-river leaves both pieces flagged as carried.
    pub fn pick_up(&mut self, cargo: EntityId, out_events: &mut Vec<Event>) {
        let Some(hero) = self.hero_entity() else {
            return;
        };
        let hero_y = hero.position().y;
        let carrying = hero.as_hero().is_some_and(|hero| hero.is_carrying());
        let Some(cargo_y) = self
            .entity(cargo)
            .filter(|entity| entity.as_cargo().is_some())
            .map(|entity| entity.position().y)
        else {
            return;
        };

        let within_reach = (hero_y - cargo_y).abs() <= TILE_LENGTH;
        if carrying && within_reach {
            if let Some(carried) = scan::carried_cargo(&self.entities) {
                self.release(carried, out_events);
            }
        }

        if !within_reach {
            return;
        }
        if let Some(payload) = self.entity_mut(cargo).and_then(|entity| entity.as_cargo_mut()) {
            payload.set_carried(true);
        }
        if let Some(hero) = self.hero_mut() {
            hero.set_carrying(true);
        }
        debug!(cargo = cargo.get(), "cargo_picked_up");
        out_events.push(Event::CargoPickedUp { cargo });
    }

    /// Drops `cargo` onto the bank the hero stands on and re-evaluates the
    /// win state.
    ///
    /// Nothing is dropped while the hero is between the banks.
    pub fn release(&mut self, cargo: EntityId, out_events: &mut Vec<Event>) {
        let Some(hero_y) = self.hero_entity().map(|hero| hero.position().y) else {
            return;
        };

        let row = if hero_y <= HERO_TOP_BORDER {
            Some(CARGO_TOP_ROW)
        } else if hero_y >= HERO_BOTTOM_BORDER {
            Some(CARGO_BOTTOM_ROW)
        } else {
            None
        };

        if let Some(row) = row {
            if let Some(entity) = self.entity_mut(cargo) {
                if let Some(payload) = entity.as_cargo_mut() {
                    payload.set_carried(false);
                    let home = DVec2::new(payload.home_x(), row);
                    entity.set_position(home);
                    out_events.push(Event::CargoReleased { cargo });
                }
            }
            if let Some(hero) = self.hero_mut() {
                hero.set_carrying(false);
            }
        }

        self.check_win_state(out_events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::Hero;
    use crate::Entity;
    use river_crossing_core::Image;
    use std::{rc::Rc, time::Duration};

    fn image() -> ImageHandle {
        Rc::new(Image::new("test.png", 64, 64))
    }

    fn world_with_hero_at(position: DVec2) -> (World, EntityId) {
        let mut world = World::new();
        let hero = world.add_hero(Entity::hero(
            position,
            image(),
            Hero::new("Sparty", image(), image()),
        ));
        world.set_timer(Duration::from_secs(1));
        (world, hero)
    }

    fn add_cargo(world: &mut World, name: &str, position: DVec2) -> EntityId {
        world.add(Entity::cargo(
            position,
            image(),
            Cargo::new(name, name, position.x, image()),
        ))
    }

    fn is_carried(world: &World, cargo: EntityId) -> bool {
        world
            .entity(cargo)
            .and_then(Entity::as_cargo)
            .is_some_and(Cargo::is_carried)
    }

    #[test]
    fn picks_up_cargo_within_a_tile() {
        let (mut world, _) = world_with_hero_at(DVec2::new(480.0, 928.0));
        let goose = add_cargo(&mut world, "Goose", DVec2::new(320.0, 992.0));
        let mut events = Vec::new();

        world.pick_up(goose, &mut events);

        assert!(is_carried(&world, goose));
        assert_eq!(events, vec![Event::CargoPickedUp { cargo: goose }]);
    }

    #[test]
    fn ignores_cargo_out_of_reach() {
        let (mut world, _) = world_with_hero_at(DVec2::new(480.0, 800.0));
        let goose = add_cargo(&mut world, "Goose", DVec2::new(320.0, 992.0));
        let mut events = Vec::new();

        world.pick_up(goose, &mut events);

        assert!(!is_carried(&world, goose));
        assert!(events.is_empty());
    }

    #[test]
    fn release_on_far_bank_snaps_to_top_row() {
        let (mut world, hero) = world_with_hero_at(DVec2::new(480.0, 928.0));
        let goose = add_cargo(&mut world, "Goose", DVec2::new(320.0, 992.0));
        let mut events = Vec::new();
        world.pick_up(goose, &mut events);

        world
            .entity_mut(hero)
            .expect("hero")
            .set_position(DVec2::new(480.0, 96.0));
        world.release(goose, &mut events);

        let goose_entity = world.entity(goose).expect("goose");
        assert_eq!(goose_entity.position(), DVec2::new(320.0, 32.0));
        assert!(!is_carried(&world, goose));
        assert!(!world.hero_entity().and_then(Entity::as_hero).expect("hero").is_carrying());
    }

    #[test]
    fn release_mid_river_keeps_carrying() {
        let (mut world, hero) = world_with_hero_at(DVec2::new(480.0, 928.0));
        let goose = add_cargo(&mut world, "Goose", DVec2::new(320.0, 992.0));
        let mut events = Vec::new();
        world.pick_up(goose, &mut events);

        world
            .entity_mut(hero)
            .expect("hero")
            .set_position(DVec2::new(480.0, 480.0));
        world.release(goose, &mut events);

        assert!(is_carried(&world, goose));
    }

    #[test]
    fn picking_up_on_a_bank_swaps_cargo() {
        let (mut world, _) = world_with_hero_at(DVec2::new(480.0, 928.0));
        let goose = add_cargo(&mut world, "Goose", DVec2::new(320.0, 992.0));
        let fox = add_cargo(&mut world, "Fox", DVec2::new(640.0, 992.0));
        let mut events = Vec::new();

        world.pick_up(goose, &mut events);
        world.pick_up(fox, &mut events);

        assert!(!is_carried(&world, goose));
        assert!(is_carried(&world, fox));
        assert_eq!(
            world.entity(goose).expect("goose").position(),
            DVec2::new(320.0, 992.0)
        );
    }

    #[test]
    fn picking_up_mid_river_leaves_two_pieces_carried() {
        let (mut world, hero) = world_with_hero_at(DVec2::new(480.0, 928.0));
        let goose = add_cargo(&mut world, "Goose", DVec2::new(320.0, 992.0));
        let mut events = Vec::new();
        world.pick_up(goose, &mut events);

        world
            .entity_mut(hero)
            .expect("hero")
            .set_position(DVec2::new(480.0, 480.0));
        let fox = add_cargo(&mut world, "Fox", DVec2::new(640.0, 480.0));
        world.pick_up(fox, &mut events);

        assert!(is_carried(&world, goose));
        assert!(is_carried(&world, fox));
    }
}
