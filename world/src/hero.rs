//! The player-controlled hero.

use glam::DVec2;
use river_crossing_core::{
    EntityId, ImageHandle, Intent, LossCondition, HERO_BOTTOM_BORDER, HERO_TOP_BORDER, TILE_LENGTH,
};
use river_crossing_rendering::Frame;

use crate::entity::mask_offscreen;

/// Name given to heroes whose level omits one.
pub const DEFAULT_HERO_NAME: &str = "Sparty";

/// Hero payload: riding and carrying state plus the alternate images used
/// when a level is lost.
#[derive(Clone, Debug, PartialEq)]
pub struct Hero {
    name: String,
    speed: f64,
    on_boat: bool,
    on_sketchy: bool,
    carrying: bool,
    riding: Option<EntityId>,
    hit_image: ImageHandle,
    mask_image: ImageHandle,
}

impl Hero {
    /// Creates a hero standing still on solid ground.
    #[must_use]
    pub fn new(name: impl Into<String>, hit_image: ImageHandle, mask_image: ImageHandle) -> Self {
        Self {
            name: name.into(),
            speed: 0.0,
            on_boat: false,
            on_sketchy: false,
            carrying: false,
            riding: None,
            hit_image,
            mask_image,
        }
    }

    /// Display name of the hero.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Horizontal drift speed inherited from the boat being ridden.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether the hero rides a boat.
    #[must_use]
    pub const fn is_on_boat(&self) -> bool {
        self.on_boat
    }

    /// Whether the boat being ridden is sketchy.
    #[must_use]
    pub const fn is_on_sketchy(&self) -> bool {
        self.on_sketchy
    }

    /// Whether the hero carries a cargo.
    #[must_use]
    pub const fn is_carrying(&self) -> bool {
        self.carrying
    }

    /// Image shown when the hero is hit by a car.
    #[must_use]
    pub const fn hit_image(&self) -> &ImageHandle {
        &self.hit_image
    }

    /// Image shown when the hero falls in the river.
    #[must_use]
    pub const fn mask_image(&self) -> &ImageHandle {
        &self.mask_image
    }

    /// Boat the hero boarded last, while still aboard.
    #[must_use]
    pub const fn riding(&self) -> Option<EntityId> {
        self.riding
    }

    pub(crate) fn board(&mut self, boat: EntityId, speed: f64, sketchy: bool) {
        self.speed = speed;
        self.on_boat = true;
        self.on_sketchy = sketchy;
        self.riding = Some(boat);
    }

    pub(crate) fn disembark(&mut self) {
        self.speed = 0.0;
        self.on_boat = false;
        self.on_sketchy = false;
        self.riding = None;
    }

    pub(crate) fn set_carrying(&mut self, carrying: bool) {
        self.carrying = carrying;
    }

    pub(crate) fn draw(
        &self,
        center: DVec2,
        image: &ImageHandle,
        loss: Option<LossCondition>,
        frame: &mut Frame,
    ) {
        match loss {
            Some(LossCondition::HitByCar) => frame.image_centered(&self.hit_image, center),
            Some(LossCondition::FellInRiver) => {
                frame.image_centered(image, center);
                frame.image_centered(&self.mask_image, center);
                mask_offscreen(frame, center, self.mask_image.size());
            }
            Some(LossCondition::OutOfBounds) => {}
            Some(LossCondition::CargoEaten) | None => frame.image_centered(image, center),
        }
    }
}

/// Applies a single tile move to the hero location.
///
/// Returns whether the intent was accepted; sideways moves are refused while
/// riding a boat and vertical moves stop at the bank borders.
pub(crate) fn step(position: &mut DVec2, intent: Intent, on_boat: bool) -> bool {
    match intent {
        Intent::Forward => {
            if position.y > HERO_TOP_BORDER {
                position.y -= TILE_LENGTH;
            }
            true
        }
        Intent::Backward => {
            if position.y < HERO_BOTTOM_BORDER {
                position.y += TILE_LENGTH;
            }
            true
        }
        Intent::Left if !on_boat => {
            position.x -= TILE_LENGTH;
            true
        }
        Intent::Right if !on_boat => {
            position.x += TILE_LENGTH;
            true
        }
        Intent::Left | Intent::Right => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use river_crossing_core::Image;
    use river_crossing_rendering::{DrawOp, Viewport};
    use std::rc::Rc;

    #[test]
    fn forward_stops_at_the_top_border() {
        let mut position = DVec2::new(192.0, 192.0);
        assert!(step(&mut position, Intent::Forward, false));
        assert_eq!(position.y, 128.0);
        assert!(step(&mut position, Intent::Forward, false));
        assert_eq!(position.y, 128.0);
    }

    #[test]
    fn backward_stops_at_the_bottom_border() {
        let mut position = DVec2::ZERO;
        assert!(step(&mut position, Intent::Backward, false));
        assert_eq!(position.y, 64.0);

        let mut position = DVec2::new(0.0, 896.0);
        assert!(step(&mut position, Intent::Backward, false));
        assert_eq!(position.y, 896.0);
    }

    #[test]
    fn sideways_moves_are_unbounded() {
        let mut position = DVec2::ZERO;
        assert!(step(&mut position, Intent::Right, false));
        assert_eq!(position.x, 64.0);

        let mut position = DVec2::ZERO;
        assert!(step(&mut position, Intent::Left, false));
        assert_eq!(position.x, -64.0);
    }

    #[test]
    fn sideways_moves_are_refused_on_boats() {
        let mut position = DVec2::new(320.0, 288.0);
        assert!(!step(&mut position, Intent::Left, true));
        assert!(!step(&mut position, Intent::Right, true));
        assert_eq!(position, DVec2::new(320.0, 288.0));
    }

    #[test]
    fn draw_follows_the_loss_condition() {
        let image = Rc::new(Image::new("hero.png", 64, 64));
        let hit = Rc::new(Image::new("hit.png", 64, 64));
        let mask = Rc::new(Image::new("mask.png", 64, 64));
        let hero = Hero::new(DEFAULT_HERO_NAME, Rc::clone(&hit), mask);
        let center = DVec2::new(480.0, 928.0);

        let mut frame = Frame::new(Viewport::IDENTITY);
        hero.draw(center, &image, Some(LossCondition::HitByCar), &mut frame);
        match &frame.ops()[0] {
            DrawOp::Image { image, .. } => assert!(Rc::ptr_eq(image, &hit)),
            other => panic!("unexpected op {other:?}"),
        }

        let mut frame = Frame::new(Viewport::IDENTITY);
        hero.draw(center, &image, Some(LossCondition::FellInRiver), &mut frame);
        assert_eq!(frame.summary().images, 2);

        let mut frame = Frame::new(Viewport::IDENTITY);
        hero.draw(center, &image, Some(LossCondition::OutOfBounds), &mut frame);
        assert!(frame.is_empty());

        let mut frame = Frame::new(Viewport::IDENTITY);
        hero.draw(center, &image, None, &mut frame);
        assert_eq!(frame.len(), 1);
    }
}
