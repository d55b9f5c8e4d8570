//! Level timer, roster and status messages shown beside the playfield.

use std::time::Duration;

use glam::DVec2;
use river_crossing_core::{
    Color, LossCondition, GET_READY_DURATION, MAX_LEVEL, PLAYFIELD_WIDTH,
};
use river_crossing_rendering::Frame;

use crate::Phase;

const PANEL_LEFT: f64 = PLAYFIELD_WIDTH + 10.0;
const BANNER_POSITION: DVec2 = DVec2::new(352.0, 420.0);
const HEADING_HEIGHT: f64 = 40.0;
const BODY_HEIGHT: f64 = 24.0;
const TEXT_COLOR: Color = Color::from_rgb(255, 255, 255);
const BANNER_COLOR: Color = Color::from_rgb(255, 255, 0);

/// Time, level and roster information presented next to the playfield.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlPanel {
    level: usize,
    time: Duration,
    timer: Duration,
    cargo_names: Vec<String>,
    hero_name: String,
    hit_by: Option<String>,
    eaten: Option<(String, String)>,
}

impl ControlPanel {
    /// Index of the level being played.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Time since the level was loaded.
    #[must_use]
    pub const fn time(&self) -> Duration {
        self.time
    }

    /// Time since the get-ready banner cleared.
    #[must_use]
    pub const fn timer(&self) -> Duration {
        self.timer
    }

    /// Level timer formatted as `M:SS`.
    #[must_use]
    pub fn timer_display(&self) -> String {
        let seconds = self.timer.as_secs();
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }

    /// Names of up to three cargo pieces of the level.
    #[must_use]
    pub fn cargo_names(&self) -> &[String] {
        &self.cargo_names
    }

    /// Name of the hero.
    #[must_use]
    pub fn hero_name(&self) -> &str {
        &self.hero_name
    }

    /// Identifier of the car that ran the hero over.
    #[must_use]
    pub fn hit_by(&self) -> Option<&str> {
        self.hit_by.as_deref()
    }

    pub(crate) fn clear(&mut self) {
        self.time = Duration::ZERO;
        self.timer = Duration::ZERO;
        self.cargo_names.clear();
        self.hit_by = None;
        self.eaten = None;
    }

    pub(crate) fn update(&mut self, dt: Duration) {
        self.time += dt;
        if self.time > GET_READY_DURATION {
            self.timer += dt;
        }
    }

    pub(crate) fn set_level(&mut self, level: usize) {
        self.level = level;
    }

    pub(crate) fn set_timer(&mut self, timer: Duration) {
        self.timer = timer;
    }

    pub(crate) fn push_cargo_name(&mut self, name: &str) {
        self.cargo_names.push(name.to_owned());
    }

    pub(crate) fn set_hero_name(&mut self, name: &str) {
        name.clone_into(&mut self.hero_name);
    }

    pub(crate) fn set_hit_by(&mut self, car: &str) {
        self.hit_by = Some(car.to_owned());
    }

    pub(crate) fn set_eaten(&mut self, eater: &str, eaten: &str) {
        self.eaten = Some((eater.to_owned(), eaten.to_owned()));
    }

    /// Status message for the current phase, if any.
    #[must_use]
    pub fn message(&self, phase: Phase) -> Option<String> {
        let hero = &self.hero_name;
        match phase {
            Phase::GetReady => Some(format!("Get Ready! Level {} Begin", self.level)),
            Phase::Playing => None,
            Phase::Won if self.level >= MAX_LEVEL => Some("Winner!".to_owned()),
            Phase::Won => Some("Level Complete!".to_owned()),
            Phase::Lost(LossCondition::HitByCar) => Some(format!(
                "{hero} was hit by {}",
                car_display_name(self.hit_by.as_deref().unwrap_or_default())
            )),
            Phase::Lost(LossCondition::FellInRiver) => {
                Some(format!("{hero} has fallen into the river"))
            }
            Phase::Lost(LossCondition::CargoEaten) => Some(match &self.eaten {
                Some((eater, eaten)) => format!("The {eater} has eaten the {eaten}"),
                None => "The cargo has been eaten".to_owned(),
            }),
            Phase::Lost(LossCondition::OutOfBounds) => {
                Some(format!("{hero} has drifted out of bounds"))
            }
        }
    }

    pub(crate) fn draw(&self, phase: Phase, frame: &mut Frame) {
        frame.text(
            format!("Level {}", self.level),
            DVec2::new(PANEL_LEFT, 40.0),
            HEADING_HEIGHT,
            TEXT_COLOR,
        );
        if phase != Phase::GetReady {
            frame.text(
                self.timer_display(),
                DVec2::new(PANEL_LEFT, 100.0),
                HEADING_HEIGHT,
                TEXT_COLOR,
            );
        }
        for (row, name) in self.cargo_names.iter().enumerate() {
            frame.text(
                name.as_str(),
                DVec2::new(PANEL_LEFT, 200.0 + row as f64 * 2.0 * BODY_HEIGHT),
                BODY_HEIGHT,
                TEXT_COLOR,
            );
        }
        if let Some(message) = self.message(phase) {
            frame.text(message, BANNER_POSITION, HEADING_HEIGHT, BANNER_COLOR);
        }
    }
}

fn car_display_name(id: &str) -> String {
    match id {
        "wisc" => "Wisconsin".to_owned(),
        _ => {
            let mut chars = id.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        }
    }
}
