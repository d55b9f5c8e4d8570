#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the River Crossing engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Geometry is expressed in virtual pixels where a
//! single tile spans [`TILE_LENGTH`] pixels.

use std::{error::Error, fmt, rc::Rc, str::FromStr, time::Duration};

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to River Crossing.";

/// Number of virtual pixels spanned by a single tile edge.
pub const TILE_LENGTH: f64 = 64.0;

/// Width of the playfield in virtual pixels.
pub const PLAYFIELD_WIDTH: f64 = 1024.0;

/// Height of the playfield in virtual pixels.
pub const PLAYFIELD_HEIGHT: f64 = 1024.0;

/// Width of the control panel strip drawn to the right of the playfield.
pub const CONTROL_PANEL_WIDTH: f64 = 200.0;

/// Total width of the virtual drawing area.
pub const VIRTUAL_WIDTH: f64 = PLAYFIELD_WIDTH + CONTROL_PANEL_WIDTH;

/// Total height of the virtual drawing area.
pub const VIRTUAL_HEIGHT: f64 = PLAYFIELD_HEIGHT;

/// Highest level index reachable by winning.
pub const MAX_LEVEL: usize = 3;

/// Hero may only move forward while strictly below this row.
pub const HERO_TOP_BORDER: f64 = 128.0;

/// Hero may only move backward while strictly above this row.
pub const HERO_BOTTOM_BORDER: f64 = 896.0;

/// Location the hero is placed at whenever a level is loaded.
pub const HERO_SPAWN: DVec2 = DVec2::new(480.0, 928.0);

/// Row that released cargo snaps to on the far bank.
pub const CARGO_TOP_ROW: f64 = 32.0;

/// Row that released cargo snaps to on the near bank.
pub const CARGO_BOTTOM_ROW: f64 = 992.0;

/// Cargo resting at or above this row counts as delivered.
pub const CARGO_DELIVERED_ROW: f64 = 64.0;

/// Identifier of the decor tile that drowns the hero.
pub const RIVER_TILE_ID: &str = "r001";

/// Time between a win or loss and the automatic level switch.
pub const LEVEL_SWITCH_DELAY: Duration = Duration::from_secs(3);

/// Length of the get-ready banner before the level timer starts.
pub const GET_READY_DURATION: Duration = Duration::from_secs(3);

/// Largest simulation step the world should be advanced by at once.
pub const MAX_FRAME_STEP: Duration = Duration::from_millis(50);

/// Time a sketchy boat tolerates a rider before it sinks.
pub const SKETCHY_SINK_DELAY: Duration = Duration::from_secs(2);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the hero perform a single tile move.
    MoveHero {
        /// Direction the player asked the hero to move in.
        intent: Intent,
    },
    /// Reports a pointer press expressed in virtual pixels.
    Click {
        /// Location of the press after inverse viewport mapping.
        position: DVec2,
    },
    /// Requests that the world replace its live state with a registered level.
    LoadLevel {
        /// Index of the registered level to instance.
        level: usize,
    },
    /// Toggles immunity against cars.
    SetRoadCheat {
        /// Whether the cheat should be active.
        enabled: bool,
    },
    /// Toggles immunity against the river.
    SetRiverCheat {
        /// Whether the cheat should be active.
        enabled: bool,
    },
    /// Overrides the level timer.
    SetTimer {
        /// Time the level timer should report.
        elapsed: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a level replaced the live state.
    LevelLoaded {
        /// Index of the level that was instanced.
        level: usize,
    },
    /// Confirms that the hero accepted a move.
    HeroMoved {
        /// Intent that caused the move.
        intent: Intent,
        /// Hero location after the move and the boat test.
        position: DVec2,
    },
    /// Announces that the hero started riding a boat.
    HeroBoarded {
        /// Identifier of the boat being ridden.
        boat: EntityId,
    },
    /// Announces that the hero stepped off a boat.
    HeroDisembarked,
    /// Confirms that the hero picked up a cargo.
    CargoPickedUp {
        /// Identifier of the cargo now carried.
        cargo: EntityId,
    },
    /// Confirms that a cargo was dropped on a bank.
    CargoReleased {
        /// Identifier of the released cargo.
        cargo: EntityId,
    },
    /// Announces that the current level was lost.
    GameLost {
        /// Reason the level was lost.
        condition: LossCondition,
    },
    /// Announces that every cargo reached the far bank.
    GameWon,
    /// Announces that a sketchy boat sank under the hero.
    SketchyBoatSank {
        /// Identifier of the boat that sank.
        boat: EntityId,
    },
    /// Announces that the get-ready banner finished and play began.
    GetReadyEnded,
}

/// Movement intents the player can issue to the hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Move one tile toward the far bank.
    Forward,
    /// Move one tile toward the near bank.
    Backward,
    /// Move one tile to the left.
    Left,
    /// Move one tile to the right.
    Right,
}

/// Reasons a level can be lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossCondition {
    /// A car ran the hero over.
    HitByCar,
    /// The hero stepped into the river or rode a sinking boat.
    FellInRiver,
    /// Two cargo pieces were left together without the hero.
    CargoEaten,
    /// The hero drifted past the playfield edge.
    OutOfBounds,
}

impl LossCondition {
    /// Numeric code reported by the classic game for this condition.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::HitByCar => 1,
            Self::FellInRiver => 2,
            Self::CargoEaten => 3,
            Self::OutOfBounds => 4,
        }
    }
}

/// Unique identifier assigned to an entity in the live list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Opaque RGB color used for solid fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Pure black, used to mask sprites hanging off the playfield.
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);

    /// Creates a new color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Parses a comma separated `r,g,b` triplet. Missing trailing channels
    /// default to zero.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut channels = [0_u8; 3];
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::BLACK);
        }

        for (index, part) in trimmed.split(',').enumerate() {
            let slot = channels
                .get_mut(index)
                .ok_or(ColorParseError::TooManyChannels)?;
            *slot = part
                .trim()
                .parse()
                .map_err(|_| ColorParseError::InvalidChannel(part.trim().to_owned()))?;
        }

        let [red, green, blue] = channels;
        Ok(Self::from_rgb(red, green, blue))
    }
}

/// Errors raised while parsing a color triplet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColorParseError {
    /// More than three channels were supplied.
    TooManyChannels,
    /// A channel was not an integer in `0..=255`.
    InvalidChannel(String),
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyChannels => write!(f, "color has more than three channels"),
            Self::InvalidChannel(channel) => write!(f, "invalid color channel `{channel}`"),
        }
    }
}

impl Error for ColorParseError {}

/// Decoded image metadata shared between entity clones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    source: String,
    width: u32,
    height: u32,
    missing: bool,
}

/// Shared handle to an [`Image`]; clones of an entity point at the same image.
pub type ImageHandle = Rc<Image>;

impl Image {
    /// Creates image metadata for a successfully decoded asset.
    #[must_use]
    pub fn new(source: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            missing: false,
        }
    }

    /// Creates a zero-sized stand-in for an asset that failed to load.
    #[must_use]
    pub fn placeholder(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            width: 0,
            height: 0,
            missing: true,
        }
    }

    /// Location the image was loaded from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Width of the image in virtual pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the image in virtual pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Image dimensions in virtual pixels.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        DVec2::new(f64::from(self.width), f64::from(self.height))
    }

    /// Reports whether the image stands in for an asset that failed to load.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.missing
    }
}
