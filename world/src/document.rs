//! Save documents and direct loading of level files into the live session.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use river_crossing_core::{Event, Image};
use tracing::info;
use xmltree::{Element, XMLNode};

use crate::{level::load_image, Level, World, WorldError};

const ROOT_ELEMENT: &str = "level";

impl World {
    /// Builds the save document for the live session.
    ///
    /// Only the hero contributes a node; everything else is rebuilt from the
    /// level files.
    #[must_use]
    pub fn save_document(&self) -> Element {
        let mut root = Element::new(ROOT_ELEMENT);
        root.children.extend(
            self.entities
                .iter()
                .filter_map(|slot| slot.entity.save_node())
                .map(XMLNode::Element),
        );
        root
    }

    /// Writes the save document to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        let path = path.as_ref();
        let save_error = |source| WorldError::Save {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(path).map_err(save_error)?);
        self.save_document().write(&mut writer)?;
        writer.flush().map_err(save_error)?;
        info!(path = %path.display(), "session_saved");
        Ok(())
    }

    /// Replaces the live list with the contents of a level file.
    ///
    /// The control panel keeps its level number. A file that fails to load
    /// leaves the session untouched.
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        images_dir: impl AsRef<Path>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        self.load_file_with_loader(path, images_dir, load_image, out_events)
    }

    /// Same as [`World::load_file`] with a custom image loader.
    pub fn load_file_with_loader(
        &mut self,
        path: impl AsRef<Path>,
        images_dir: impl AsRef<Path>,
        loader: impl FnMut(&Path) -> anyhow::Result<Image>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let level = Level::from_path_with_loader(path, images_dir, loader)?;
        self.clear();
        let current = self.panel.level();
        self.instance(current, level.instantiate(), out_events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query, Entity, Hero, Kind, DEFAULT_HERO_NAME};
    use glam::DVec2;
    use std::{fs, rc::Rc};

    const LEVEL: &str = r#"<level>
      <types><decor id="g001" image="grass.png"/></types>
      <background><decor id="g001" x="0" y="15" repeat-x="16"/></background>
      <hero image="hero.png" name="Sparty"/>
      <cargo id="goose" name="Goose" image="g.png" carried-image="gc.png" x="3"/>
    </level>"#;

    fn stub_loader(path: &Path) -> anyhow::Result<Image> {
        Ok(Image::new(path.display().to_string(), 64, 64))
    }

    fn hero() -> Entity {
        let image = Rc::new(Image::new("hero.png", 64, 64));
        Entity::hero(
            DVec2::new(480.0, 928.0),
            Rc::clone(&image),
            Hero::new(DEFAULT_HERO_NAME, Rc::clone(&image), image),
        )
    }

    #[test]
    fn empty_session_saves_a_bare_root() {
        let document = World::new().save_document();
        assert_eq!(document.name, "level");
        assert!(document.children.is_empty());
    }

    #[test]
    fn empty_sessions_survive_a_round_trip() {
        let directory = tempfile::tempdir().expect("temp dir");
        let first = directory.path().join("first.xml");
        let second = directory.path().join("second.xml");
        World::new().save(&first).expect("save should succeed");

        let mut reloaded = World::new();
        let mut events = Vec::new();
        reloaded
            .load_file_with_loader(&first, "images", stub_loader, &mut events)
            .expect("empty document should load");
        assert_eq!(query::entities(&reloaded).count(), 0);
        assert_eq!(query::hero_id(&reloaded), None);
        reloaded.save(&second).expect("save should succeed");

        assert_eq!(
            fs::read_to_string(&first).expect("read save"),
            fs::read_to_string(&second).expect("read second save")
        );
    }

    #[test]
    fn only_the_hero_is_saved() {
        let directory = write_level(LEVEL);
        let mut world = World::new();
        world
            .load_file_with_loader(
                directory.path().join("level.xml"),
                "images",
                stub_loader,
                &mut Vec::new(),
            )
            .expect("level should load");

        let document = world.save_document();
        let names: Vec<&str> = document
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, vec!["hero"]);
    }

    #[test]
    fn load_file_keeps_the_panel_level() {
        let directory = write_level(LEVEL);
        let mut world = World::new();
        world.panel.set_level(2);
        let mut events = Vec::new();

        world
            .load_file_with_loader(
                directory.path().join("level.xml"),
                "images",
                stub_loader,
                &mut events,
            )
            .expect("level should load");

        assert_eq!(events, vec![Event::LevelLoaded { level: 2 }]);
        assert_eq!(query::count(&world, Kind::Decor), 1);
        assert_eq!(query::count(&world, Kind::Cargo), 1);
        assert!(query::hero(&world).is_some());
    }

    #[test]
    fn failed_loads_leave_the_session_alone() {
        let directory = write_level("<level><background>");
        let mut world = World::new();
        let hero = world.add_hero(hero());

        let error = world
            .load_file_with_loader(
                directory.path().join("level.xml"),
                "images",
                stub_loader,
                &mut Vec::new(),
            )
            .expect_err("malformed document");

        assert!(matches!(error, WorldError::Level(_)));
        assert_eq!(query::hero_id(&world), Some(hero));

        let missing = world.load_file_with_loader(
            directory.path().join("absent.xml"),
            "images",
            stub_loader,
            &mut Vec::new(),
        );
        assert!(missing.is_err());
        assert_eq!(query::hero_id(&world), Some(hero));
    }

    #[test]
    fn saved_sessions_load_back() {
        let directory = tempfile::tempdir().expect("temp dir");
        let first = directory.path().join("first.xml");
        let second = directory.path().join("second.xml");

        let mut world = World::new();
        let _ = world.add_hero(hero());
        world.save(&first).expect("save should succeed");

        let mut reloaded = World::new();
        reloaded
            .load_file_with_loader(&first, "images", stub_loader, &mut Vec::new())
            .expect("saved document should load");
        reloaded.save(&second).expect("save should succeed");

        let text = fs::read_to_string(&first).expect("read save");
        assert!(text.contains("<level"));
        assert!(text.contains("<hero"));
        assert_eq!(
            text,
            fs::read_to_string(&second).expect("read second save")
        );
    }

    #[test]
    fn saving_into_a_missing_directory_fails() {
        let directory = tempfile::tempdir().expect("temp dir");
        let error = World::new()
            .save(directory.path().join("missing").join("save.xml"))
            .expect_err("directory does not exist");
        assert!(matches!(error, WorldError::Save { .. }));
    }

    fn write_level(document: &str) -> tempfile::TempDir {
        let directory = tempfile::tempdir().expect("temp dir");
        fs::write(directory.path().join("level.xml"), document).expect("write level");
        directory
    }
}
