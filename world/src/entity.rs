//! Entity record shared by every game object and the kind chain used to
//! classify it.

use std::time::Duration;

use glam::DVec2;
use river_crossing_core::{Color, ImageHandle, LossCondition, PLAYFIELD_WIDTH};
use river_crossing_rendering::Frame;
use xmltree::Element;

use crate::{
    cargo::Cargo,
    decor::Decor,
    hero::Hero,
    vehicle::{Vehicle, VehicleRole},
};

/// Runtime kinds an entity can be queried for.
///
/// An entity answers to its own kind and to every kind it specialises, so a
/// sketchy boat is also a boat and a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Static tiled background piece.
    Decor,
    /// Solid colored decor.
    Rectangle,
    /// Any lane-bound moving hazard.
    Vehicle,
    /// Vehicle that runs the hero over.
    Car,
    /// Vehicle the hero can ride.
    Boat,
    /// Boat that sinks when ridden for too long.
    SketchyBoat,
    /// Item the hero ferries across.
    Cargo,
    /// Player-controlled entity.
    Hero,
}

/// Variant payload carried by an [`Entity`].
#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    /// Background piece, optionally filled as a rectangle.
    Decor(Decor),
    /// Car, boat or sketchy boat.
    Vehicle(Vehicle),
    /// Cargo piece.
    Cargo(Cargo),
    /// The hero.
    Hero(Hero),
}

/// Positioned, imaged game object.
///
/// Cloning an entity yields an independent copy that shares image handles
/// with the original.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    position: DVec2,
    image: Option<ImageHandle>,
    kind: EntityKind,
}

impl Entity {
    /// Creates a decor tiled from its upper-left corner.
    #[must_use]
    pub fn decor(position: DVec2, image: ImageHandle, decor: Decor) -> Self {
        Self {
            position,
            image: Some(image),
            kind: EntityKind::Decor(decor),
        }
    }

    /// Creates an image-less decor that draws its solid fill.
    #[must_use]
    pub fn rectangle(position: DVec2, decor: Decor) -> Self {
        Self {
            position,
            image: None,
            kind: EntityKind::Decor(decor),
        }
    }

    /// Creates a vehicle centred on `position`.
    #[must_use]
    pub fn vehicle(position: DVec2, image: ImageHandle, vehicle: Vehicle) -> Self {
        Self {
            position,
            image: Some(image),
            kind: EntityKind::Vehicle(vehicle),
        }
    }

    /// Creates a cargo piece centred on `position` using its resting image.
    #[must_use]
    pub fn cargo(position: DVec2, image: ImageHandle, cargo: Cargo) -> Self {
        Self {
            position,
            image: Some(image),
            kind: EntityKind::Cargo(cargo),
        }
    }

    /// Creates the hero centred on `position` using its default image.
    #[must_use]
    pub fn hero(position: DVec2, image: ImageHandle, hero: Hero) -> Self {
        Self {
            position,
            image: Some(image),
            kind: EntityKind::Hero(hero),
        }
    }

    /// Current location of the entity.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.position
    }

    /// Moves the entity to a new location.
    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    /// Currently assigned image, absent for rectangles.
    #[must_use]
    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    /// Size of a single tile of the entity in virtual pixels.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        if let EntityKind::Decor(decor) = &self.kind {
            if let Some(fill) = decor.fill() {
                return fill.size();
            }
        }
        self.image
            .as_ref()
            .map_or(DVec2::ZERO, |image| image.size())
    }

    /// Variant payload.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Kinds the entity answers to, most specific first.
    #[must_use]
    pub fn kinds(&self) -> &'static [Kind] {
        match &self.kind {
            EntityKind::Decor(decor) if decor.fill().is_some() => &[Kind::Rectangle, Kind::Decor],
            EntityKind::Decor(_) => &[Kind::Decor],
            EntityKind::Vehicle(vehicle) => match vehicle.role() {
                VehicleRole::Plain => &[Kind::Vehicle],
                VehicleRole::Car(_) => &[Kind::Car, Kind::Vehicle],
                VehicleRole::Boat => &[Kind::Boat, Kind::Vehicle],
                VehicleRole::SketchyBoat(_) => &[Kind::SketchyBoat, Kind::Boat, Kind::Vehicle],
            },
            EntityKind::Cargo(_) => &[Kind::Cargo],
            EntityKind::Hero(_) => &[Kind::Hero],
        }
    }

    /// Reports whether the entity answers to `kind`.
    #[must_use]
    pub fn is(&self, kind: Kind) -> bool {
        self.kinds().contains(&kind)
    }

    /// Decor payload, including rectangles.
    #[must_use]
    pub fn as_decor(&self) -> Option<&Decor> {
        match &self.kind {
            EntityKind::Decor(decor) => Some(decor),
            _ => None,
        }
    }

    /// Identifier of a decor or rectangle.
    #[must_use]
    pub fn decor_id(&self) -> Option<&str> {
        self.as_decor().map(Decor::id)
    }

    /// Vehicle payload of cars, boats and sketchy boats.
    #[must_use]
    pub fn as_vehicle(&self) -> Option<&Vehicle> {
        match &self.kind {
            EntityKind::Vehicle(vehicle) => Some(vehicle),
            _ => None,
        }
    }

    /// Cargo payload.
    #[must_use]
    pub fn as_cargo(&self) -> Option<&Cargo> {
        match &self.kind {
            EntityKind::Cargo(cargo) => Some(cargo),
            _ => None,
        }
    }

    /// Hero payload.
    #[must_use]
    pub fn as_hero(&self) -> Option<&Hero> {
        match &self.kind {
            EntityKind::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    pub(crate) fn as_cargo_mut(&mut self) -> Option<&mut Cargo> {
        match &mut self.kind {
            EntityKind::Cargo(cargo) => Some(cargo),
            _ => None,
        }
    }

    pub(crate) fn as_hero_mut(&mut self) -> Option<&mut Hero> {
        match &mut self.kind {
            EntityKind::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    /// Euclidean distance between the locations of two entities.
    #[must_use]
    pub fn distance(&self, other: &Entity) -> f64 {
        self.position.distance(other.position)
    }

    /// Reports whether `point` lies on the entity.
    ///
    /// Decor covers its whole tiled extent from the upper-left corner; every
    /// other entity covers its image centred on its location.
    #[must_use]
    pub fn hit_test(&self, point: DVec2) -> bool {
        match &self.kind {
            EntityKind::Decor(decor) => decor.contains(self.position, self.size(), point),
            _ => centered_contains(self.position, self.size(), point),
        }
    }

    pub(crate) fn update(&mut self, dt: Duration, context: &UpdateContext) {
        let width = self.size().x;
        match &mut self.kind {
            EntityKind::Vehicle(vehicle) => {
                vehicle.advance(&mut self.position, width, dt, context.ridden);
            }
            EntityKind::Cargo(cargo) => {
                if let (true, Some(hero)) = (cargo.is_carried(), context.hero_position) {
                    self.position = hero;
                }
            }
            EntityKind::Hero(hero) => {
                self.position.x += hero.speed() * dt.as_secs_f64();
            }
            EntityKind::Decor(_) => {}
        }
    }

    pub(crate) fn save_node(&self) -> Option<Element> {
        match &self.kind {
            EntityKind::Hero(_) => Some(Element::new("hero")),
            _ => None,
        }
    }

    /// Appends the draw operations for this entity to `frame`.
    pub fn draw(&self, context: &DrawContext, frame: &mut Frame) {
        match &self.kind {
            EntityKind::Decor(decor) => decor.draw(self.position, self.image.as_ref(), frame),
            EntityKind::Vehicle(vehicle) => {
                vehicle.draw(self.position, self.image.as_ref(), frame);
            }
            EntityKind::Cargo(cargo) => {
                cargo.draw(self.position, self.image.as_ref(), context, frame);
            }
            EntityKind::Hero(hero) => {
                if let Some(image) = &self.image {
                    hero.draw(self.position, image, context.loss, frame);
                }
            }
        }
    }
}

/// Session state an entity needs while drawing itself.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DrawContext {
    /// Location of the live hero, if one exists.
    pub hero_position: Option<DVec2>,
    /// Reason the level was lost, if it was.
    pub loss: Option<LossCondition>,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct UpdateContext {
    pub(crate) hero_position: Option<DVec2>,
    pub(crate) ridden: bool,
}

pub(crate) fn centered_contains(center: DVec2, size: DVec2, point: DVec2) -> bool {
    let test = point - center + size / 2.0;
    test.x >= 0.0 && test.x < size.x && test.y >= 0.0 && test.y < size.y
}

/// Blacks out whatever part of a sprite hangs past a playfield edge.
pub(crate) fn mask_offscreen(frame: &mut Frame, center: DVec2, size: DVec2) {
    let top = center.y - size.y / 2.0;
    if center.x - size.x / 2.0 < 0.0 {
        frame.fill(
            Color::BLACK,
            DVec2::new(-600.0, top),
            DVec2::new(600.0, 800.0),
        );
    } else if center.x + size.x / 2.0 > PLAYFIELD_WIDTH {
        frame.fill(
            Color::BLACK,
            DVec2::new(PLAYFIELD_WIDTH, top),
            DVec2::new(800.0, 800.0),
        );
    }
}
