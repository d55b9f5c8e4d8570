#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Input system translating raw key codes and pointer presses into world
//! commands.

use glam::DVec2;
use river_crossing_core::{Command, Intent};
use river_crossing_rendering::Viewport;

/// Raw input reported by a windowing adapter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    /// A key went down; carries the platform virtual-key code.
    KeyDown(u32),
    /// The primary pointer button went down at a surface position.
    PointerDown(DVec2),
}

/// Key bindings recognised by the controls system.
#[derive(Clone, Debug)]
pub struct Config {
    bindings: Vec<(u32, Intent)>,
}

impl Config {
    /// Creates a configuration from explicit `(key code, intent)` pairs.
    #[must_use]
    pub fn new(bindings: Vec<(u32, Intent)>) -> Self {
        Self { bindings }
    }
}

impl Default for Config {
    /// Letter keys E/D/S/F plus the arrow keys.
    fn default() -> Self {
        Self::new(vec![
            (69, Intent::Forward),
            (38, Intent::Forward),
            (68, Intent::Backward),
            (40, Intent::Backward),
            (83, Intent::Left),
            (37, Intent::Left),
            (70, Intent::Right),
            (39, Intent::Right),
        ])
    }
}

/// Pure system emitting hero and pointer commands for raw input.
#[derive(Debug)]
pub struct Controls {
    bindings: Vec<(u32, Intent)>,
}

impl Controls {
    /// Creates a new controls system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            bindings: config.bindings,
        }
    }

    /// Intent bound to `code`, if any.
    #[must_use]
    pub fn intent(&self, code: u32) -> Option<Intent> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == code)
            .map(|(_, intent)| *intent)
    }

    /// Consumes raw input and emits commands.
    ///
    /// Pointer positions are mapped into virtual pixels through `viewport`,
    /// which must be the one used to draw the current frame.
    pub fn handle(&self, inputs: &[Input], viewport: Viewport, out: &mut Vec<Command>) {
        for input in inputs {
            match *input {
                Input::KeyDown(code) => {
                    if let Some(intent) = self.intent(code) {
                        out.push(Command::MoveHero { intent });
                    }
                }
                Input::PointerDown(surface) => out.push(Command::Click {
                    position: viewport.to_virtual(surface),
                }),
            }
        }
    }
}
