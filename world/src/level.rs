//! Level templates parsed from XML level files.
//!
//! A [`Level`] is built once and never mutated afterwards; every load of the
//! level clones its prototypes into the live list. Image files are resolved
//! relative to an image directory and decoded through a caller supplied
//! loader so tests can run without assets.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
    rc::Rc,
    time::Duration,
};

use anyhow::Context;
use glam::DVec2;
use river_crossing_core::{Color, Image, ImageHandle, TILE_LENGTH};
use thiserror::Error;
use tracing::{debug, warn};
use xmltree::{Element, XMLNode};

use crate::{
    cargo::Cargo,
    decor::{Decor, RectFill},
    hero::{Hero, DEFAULT_HERO_NAME},
    vehicle::{Car, SketchyBoat, Vehicle, VehicleRole},
    Entity,
};

const ROOT_ELEMENT: &str = "level";
const DEFAULT_ITEM_Y: f64 = 15.5;

/// Errors raised while reading a level file.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level file could not be opened.
    #[error("failed to open level file {}", path.display())]
    Read {
        /// Location of the level file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The document is not well-formed XML.
    #[error("malformed level document")]
    Parse(#[from] xmltree::ParseError),
    /// The document root is not a `<level>` element.
    #[error("expected a <level> root element, found <{found}>")]
    UnexpectedRoot {
        /// Name of the root element that was found.
        found: String,
    },
    /// An item references a type id missing from the `<types>` section.
    #[error("<{element}> references undeclared type id `{id}`")]
    UnknownTypeId {
        /// Element that made the reference.
        element: String,
        /// Identifier that could not be resolved.
        id: String,
    },
    /// A type id lacks the image slot an item requires.
    #[error("type id `{id}` has no image in slot {slot}")]
    MissingImageSlot {
        /// Identifier of the declared type.
        id: String,
        /// Zero-based slot index that was requested.
        slot: usize,
    },
    /// An attribute could not be parsed.
    #[error("<{element}> has invalid {attribute}=\"{value}\"")]
    InvalidAttribute {
        /// Element carrying the attribute.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Raw attribute value.
        value: String,
    },
}

/// Immutable level template.
#[derive(Clone, Debug, Default)]
pub struct Level {
    images: HashMap<String, Vec<ImageHandle>>,
    items: Vec<Entity>,
    hero: Option<Entity>,
    cargo: Vec<Entity>,
    warnings: Vec<String>,
}

impl Level {
    /// Parses the level file at `path`, decoding images from `images_dir`.
    pub fn from_path(
        path: impl AsRef<Path>,
        images_dir: impl AsRef<Path>,
    ) -> Result<Self, LevelError> {
        Self::from_path_with_loader(path, images_dir, load_image)
    }

    /// Parses the level file at `path` using `loader` to decode images.
    pub fn from_path_with_loader(
        path: impl AsRef<Path>,
        images_dir: impl AsRef<Path>,
        loader: impl FnMut(&Path) -> anyhow::Result<Image>,
    ) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LevelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = Element::parse(BufReader::new(file))?;
        let level = Self::from_element(&root, images_dir.as_ref(), loader)?;
        debug!(
            path = %path.display(),
            items = level.items.len(),
            cargo = level.cargo.len(),
            "level_parsed"
        );
        Ok(level)
    }

    /// Parses a level document held in memory.
    pub fn from_str_with_loader(
        document: &str,
        images_dir: impl AsRef<Path>,
        loader: impl FnMut(&Path) -> anyhow::Result<Image>,
    ) -> Result<Self, LevelError> {
        let root = Element::parse(document.as_bytes())?;
        Self::from_element(&root, images_dir.as_ref(), loader)
    }

    fn from_element(
        root: &Element,
        images_dir: &Path,
        mut loader: impl FnMut(&Path) -> anyhow::Result<Image>,
    ) -> Result<Self, LevelError> {
        if root.name != ROOT_ELEMENT {
            return Err(LevelError::UnexpectedRoot {
                found: root.name.clone(),
            });
        }

        let mut builder = LevelBuilder {
            images_dir,
            loader: &mut loader,
            level: Self::default(),
        };
        for section in elements(root) {
            builder.section(section)?;
        }
        Ok(builder.level)
    }

    /// Background and vehicle prototypes in document order.
    #[must_use]
    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    /// Hero prototype.
    #[must_use]
    pub fn hero(&self) -> Option<&Entity> {
        self.hero.as_ref()
    }

    /// Cargo prototypes in document order.
    #[must_use]
    pub fn cargo(&self) -> &[Entity] {
        &self.cargo
    }

    /// Images declared for a type id, in slot order.
    #[must_use]
    pub fn images(&self, id: &str) -> Option<&[ImageHandle]> {
        self.images.get(id).map(Vec::as_slice)
    }

    /// Problems that did not stop the level from loading.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn instantiate(&self) -> LevelInstance {
        LevelInstance {
            items: self.items.clone(),
            hero: self.hero.clone(),
            cargo: self.cargo.clone(),
        }
    }
}

/// Fresh clones of a level's prototypes.
pub(crate) struct LevelInstance {
    pub(crate) items: Vec<Entity>,
    pub(crate) hero: Option<Entity>,
    pub(crate) cargo: Vec<Entity>,
}

/// Reads the dimensions of the image file at `path`.
pub fn load_image(path: &Path) -> anyhow::Result<Image> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(Image::new(path.display().to_string(), width, height))
}

struct LevelBuilder<'a, L> {
    images_dir: &'a Path,
    loader: &'a mut L,
    level: Level,
}

impl<L> LevelBuilder<'_, L>
where
    L: FnMut(&Path) -> anyhow::Result<Image>,
{
    fn section(&mut self, section: &Element) -> Result<(), LevelError> {
        match section.name.as_str() {
            "types" => {
                for node in elements(section) {
                    self.declare_type(node);
                }
            }
            "background" => {
                for node in elements(section) {
                    match node.name.as_str() {
                        "decor" => {
                            let decor = self.decor(node)?;
                            self.level.items.push(decor);
                        }
                        "rect" => {
                            let rectangle = rectangle(node)?;
                            self.level.items.push(rectangle);
                        }
                        _ => {}
                    }
                }
            }
            "hero" => self.level.hero = Some(self.hero(section)),
            "cargo" => {
                let cargo = self.cargo(section)?;
                self.level.cargo.push(cargo);
            }
            "road" | "river" => {
                let lane = Lane::from_element(section)?;
                for node in elements(section) {
                    if let Some(vehicle) = self.vehicle(node, &lane)? {
                        self.level.items.push(vehicle);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn declare_type(&mut self, node: &Element) {
        let files: &[&str] = match node.name.as_str() {
            "decor" | "boat" => &["image"],
            "car" | "sketchy" => &["image1", "image2"],
            _ => return,
        };
        let id = text_attribute(node, "id").to_owned();
        for file in files {
            let image = self.load(text_attribute(node, file));
            self.level.images.entry(id.clone()).or_default().push(image);
        }
    }

    fn load(&mut self, file: &str) -> ImageHandle {
        let path = self.images_dir.join(file);
        match (self.loader)(&path) {
            Ok(image) => Rc::new(image),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "image_load_failed");
                self.level
                    .warnings
                    .push(format!("failed to open {}", path.display()));
                Rc::new(Image::placeholder(path.display().to_string()))
            }
        }
    }

    fn slot(&self, node: &Element, id: &str, slot: usize) -> Result<ImageHandle, LevelError> {
        let images = self
            .level
            .images
            .get(id)
            .ok_or_else(|| LevelError::UnknownTypeId {
                element: node.name.clone(),
                id: id.to_owned(),
            })?;
        images
            .get(slot)
            .cloned()
            .ok_or_else(|| LevelError::MissingImageSlot {
                id: id.to_owned(),
                slot,
            })
    }

    fn decor(&self, node: &Element) -> Result<Entity, LevelError> {
        let decor = decor_payload(node)?;
        let image = self.slot(node, decor.id(), 0)?;
        Ok(Entity::decor(base_position(node)?, image, decor))
    }

    fn hero(&mut self, node: &Element) -> Entity {
        let image = self.load(text_attribute(node, "image"));
        let hit_image = self.load(text_attribute(node, "hit-image"));
        let mask_image = match text_attribute(node, "mask") {
            "" => Rc::clone(&image),
            mask => self.load(mask),
        };
        let name = match text_attribute(node, "name") {
            "" => DEFAULT_HERO_NAME,
            name => name,
        };
        Entity::hero(DVec2::ZERO, image, Hero::new(name, hit_image, mask_image))
    }

    fn cargo(&mut self, node: &Element) -> Result<Entity, LevelError> {
        let image = self.load(text_attribute(node, "image"));
        let carried_image = self.load(text_attribute(node, "carried-image"));
        let position = base_position(node)?;
        let cargo = Cargo::new(
            text_attribute(node, "name"),
            text_attribute(node, "id"),
            position.x,
            carried_image,
        );
        Ok(Entity::cargo(position, image, cargo))
    }

    fn vehicle(&self, node: &Element, lane: &Lane) -> Result<Option<Entity>, LevelError> {
        let id = text_attribute(node, "id");
        let role = match node.name.as_str() {
            "car" => {
                let swap_time = number_attribute(node, "swap-time", 0.0)?.max(0.0);
                let swap_time = Duration::try_from_secs_f64(swap_time).map_err(|_| {
                    invalid_attribute(node, "swap-time")
                })?;
                VehicleRole::Car(Car::new(self.slot(node, id, 1)?, swap_time))
            }
            "boat" => VehicleRole::Boat,
            "sketchy" => VehicleRole::SketchyBoat(SketchyBoat::new(self.slot(node, id, 1)?)),
            _ => return Ok(None),
        };

        let column = number_attribute(node, "x", 0.0)?;
        let position = DVec2::new(column * TILE_LENGTH, TILE_LENGTH / 2.0 + lane.row * TILE_LENGTH);
        let vehicle = Vehicle::new(id, lane.speed * TILE_LENGTH, lane.width, role);
        Ok(Some(Entity::vehicle(
            position,
            self.slot(node, id, 0)?,
            vehicle,
        )))
    }
}

/// Shared attributes of a `<road>` or `<river>` section.
struct Lane {
    speed: f64,
    width: u32,
    row: f64,
}

impl Lane {
    fn from_element(node: &Element) -> Result<Self, LevelError> {
        Ok(Self {
            speed: number_attribute(node, "speed", 1.0)?,
            width: count_attribute(node, "width", 1)?,
            row: number_attribute(node, "y", 0.0)?,
        })
    }
}

fn rectangle(node: &Element) -> Result<Entity, LevelError> {
    let color = text_attribute(node, "color")
        .parse::<Color>()
        .map_err(|_| invalid_attribute(node, "color"))?;
    let fill = RectFill::new(
        color,
        number_attribute(node, "width", 0.0)?,
        number_attribute(node, "height", 0.0)?,
    );
    Ok(Entity::rectangle(
        base_position(node)?,
        decor_payload(node)?.with_fill(fill),
    ))
}

fn decor_payload(node: &Element) -> Result<Decor, LevelError> {
    Ok(Decor::new(
        text_attribute(node, "id"),
        count_attribute(node, "repeat-x", 1)?,
        count_attribute(node, "repeat-y", 1)?,
    ))
}

fn base_position(node: &Element) -> Result<DVec2, LevelError> {
    Ok(DVec2::new(
        number_attribute(node, "x", 0.0)?,
        number_attribute(node, "y", DEFAULT_ITEM_Y)?,
    ) * TILE_LENGTH)
}

fn elements(parent: &Element) -> impl Iterator<Item = &Element> {
    parent.children.iter().filter_map(XMLNode::as_element)
}

fn text_attribute<'a>(node: &'a Element, name: &str) -> &'a str {
    node.attributes.get(name).map_or("", String::as_str)
}

fn number_attribute(node: &Element, name: &str, default: f64) -> Result<f64, LevelError> {
    match node.attributes.get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| invalid_attribute(node, name)),
    }
}

fn count_attribute(node: &Element, name: &str, default: u32) -> Result<u32, LevelError> {
    match node.attributes.get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| invalid_attribute(node, name)),
    }
}

fn invalid_attribute(node: &Element, name: &str) -> LevelError {
    LevelError::InvalidAttribute {
        element: node.name.clone(),
        attribute: name.to_owned(),
        value: text_attribute(node, name).to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Kind;
    use std::cell::RefCell;

    const DOCUMENT: &str = r#"
        <level>
          <types>
            <decor id="g001" image="grass.png"/>
            <decor id="r001" image="river.png"/>
            <boat id="b001" image="boat.png"/>
            <car id="c001" image1="car1.png" image2="car2.png"/>
            <sketchy id="s001" image1="raft.png" image2="raft-broken.png"/>
          </types>
          <background>
            <decor id="g001" x="0" y="15" repeat-x="16"/>
            <decor id="r001" x="0" y="2" repeat-x="16" repeat-y="6"/>
            <rect x="0" y="8" width="16" height="0.25" color="255,255,0"/>
          </background>
          <hero image="sparty.png" hit-image="sparty-hit.png" name="Sparty"/>
          <cargo id="goose" name="Goose" image="goose.png" carried-image="goose-carried.png" x="5"/>
          <cargo id="fox" name="Fox" image="fox.png" carried-image="fox-carried.png" x="7" y="15.5"/>
          <road speed="2" width="16" y="12">
            <car id="c001" x="3" swap-time="0.25"/>
          </road>
          <river speed="-1" width="20" y="4">
            <boat id="b001" x="0"/>
            <sketchy id="s001" x="6"/>
          </river>
        </level>
    "#;

    fn stub_loader(path: &Path) -> anyhow::Result<Image> {
        Ok(Image::new(path.display().to_string(), 64, 64))
    }

    fn parse(document: &str) -> Result<Level, LevelError> {
        Level::from_str_with_loader(document, "images", stub_loader)
    }

    #[test]
    fn parses_every_section() {
        let level = parse(DOCUMENT).expect("level should parse");

        assert_eq!(level.items().len(), 6);
        assert_eq!(level.cargo().len(), 2);
        assert!(level.hero().is_some());
        assert!(level.warnings().is_empty());
        assert_eq!(level.images("c001").map(<[_]>::len), Some(2));
    }

    #[test]
    fn items_keep_document_order() {
        let level = parse(DOCUMENT).expect("level should parse");
        let kinds: Vec<Kind> = level.items().iter().map(|item| item.kinds()[0]).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::Decor,
                Kind::Decor,
                Kind::Rectangle,
                Kind::Car,
                Kind::Boat,
                Kind::SketchyBoat,
            ]
        );
    }

    #[test]
    fn vehicles_take_their_lane_geometry() {
        let level = parse(DOCUMENT).expect("level should parse");
        let car = &level.items()[3];
        assert_eq!(car.position(), DVec2::new(192.0, 800.0));
        let vehicle = car.as_vehicle().expect("vehicle");
        assert_eq!(vehicle.speed(), 128.0);
        assert_eq!(vehicle.lane_width(), 16);
        assert_eq!(
            vehicle.as_car().expect("car").swap_time(),
            Duration::from_millis(250)
        );

        let sketchy = &level.items()[5];
        assert_eq!(sketchy.position(), DVec2::new(384.0, 288.0));
        assert_eq!(sketchy.as_vehicle().expect("vehicle").speed(), -64.0);
    }

    #[test]
    fn cargo_defaults_to_the_near_bank() {
        let level = parse(DOCUMENT).expect("level should parse");
        let goose = &level.cargo()[0];
        assert_eq!(goose.position(), DVec2::new(320.0, 992.0));
        let payload = goose.as_cargo().expect("cargo");
        assert_eq!(payload.name(), "Goose");
        assert_eq!(payload.home_x(), 320.0);
    }

    #[test]
    fn hero_mask_falls_back_to_default_image() {
        let level = parse(DOCUMENT).expect("level should parse");
        let hero = level.hero().expect("hero");
        let payload = hero.as_hero().expect("hero");
        assert_eq!(payload.name(), "Sparty");
        let image = hero.image().expect("image");
        assert!(Rc::ptr_eq(payload.mask_image(), image));
        assert!(!Rc::ptr_eq(payload.hit_image(), image));

        let masked = parse(r#"<level><hero image="h.png" mask="m.png"/></level>"#)
            .expect("level should parse");
        let hero = masked.hero().and_then(Entity::as_hero).expect("hero");
        assert_eq!(hero.mask_image().source(), "images/m.png");
    }

    #[test]
    fn non_positive_swap_times_use_the_default() {
        for swap_time in ["-1", "0"] {
            let document = DOCUMENT.replace(
                r#"swap-time="0.25""#,
                &format!(r#"swap-time="{swap_time}""#),
            );
            let level = parse(&document).expect("level should parse");
            let car = level.items()[3].as_vehicle().and_then(Vehicle::as_car).expect("car");
            assert_eq!(car.swap_time(), Duration::from_millis(500));
        }
    }

    #[test]
    fn hero_name_defaults_when_absent() {
        let level = parse(r#"<level><hero image="h.png"/></level>"#).expect("level");
        let hero = level.hero().and_then(Entity::as_hero).expect("hero");
        assert_eq!(hero.name(), DEFAULT_HERO_NAME);
    }

    #[test]
    fn missing_images_are_reported_without_failing() {
        let failing = |path: &Path| -> anyhow::Result<Image> {
            if path.ends_with("river.png") {
                anyhow::bail!("no such file");
            }
            stub_loader(path)
        };
        let level =
            Level::from_str_with_loader(DOCUMENT, "images", failing).expect("level should load");

        assert_eq!(level.warnings().len(), 1);
        let river = level.images("r001").expect("river images");
        assert!(river[0].is_missing());
    }

    #[test]
    fn images_resolve_under_the_image_directory() {
        let loaded = RefCell::new(Vec::new());
        let _ = Level::from_str_with_loader(
            r#"<level><types><decor id="g001" image="grass.png"/></types></level>"#,
            "assets/images",
            |path: &Path| {
                loaded.borrow_mut().push(path.to_path_buf());
                stub_loader(path)
            },
        )
        .expect("level should parse");

        assert_eq!(
            loaded.borrow().as_slice(),
            &[PathBuf::from("assets/images/grass.png")]
        );
    }

    #[test]
    fn undeclared_type_ids_fail_fast() {
        let error = parse(r#"<level><background><decor id="zzz"/></background></level>"#)
            .expect_err("unknown id must fail");
        assert!(matches!(
            error,
            LevelError::UnknownTypeId { ref id, .. } if id == "zzz"
        ));
    }

    #[test]
    fn cars_need_two_images() {
        let error = parse(
            r#"<level>
                 <types><boat id="b001" image="boat.png"/></types>
                 <road><car id="b001"/></road>
               </level>"#,
        )
        .expect_err("car declared with one image must fail");
        assert!(matches!(error, LevelError::MissingImageSlot { slot: 1, .. }));
    }

    #[test]
    fn rejects_foreign_roots_and_bad_attributes() {
        assert!(matches!(
            parse("<save/>"),
            Err(LevelError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            parse(r#"<level><road speed="fast"/></level>"#),
            Err(LevelError::InvalidAttribute { .. })
        ));
        assert!(matches!(parse("<level>"), Err(LevelError::Parse(_))));
    }

    #[test]
    fn empty_documents_produce_empty_levels() {
        let level = parse("<level/>").expect("empty level");
        assert!(level.items().is_empty());
        assert!(level.hero().is_none());
    }
}
