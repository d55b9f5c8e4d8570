//! Lane-bound hazards: cars, boats and sketchy boats.

use std::time::Duration;

use glam::DVec2;
use river_crossing_core::{ImageHandle, SKETCHY_SINK_DELAY, TILE_LENGTH};
use river_crossing_rendering::Frame;

use crate::entity::mask_offscreen;

/// Widest vehicle sprite a lane is expected to carry.
const MAX_VEHICLE_WIDTH: f64 = 256.0;

const DEFAULT_SWAP_TIME: Duration = Duration::from_millis(500);

/// Behaviour layered on top of the shared vehicle movement.
#[derive(Clone, Debug, PartialEq)]
pub enum VehicleRole {
    /// Moves and wraps, nothing more.
    Plain,
    /// Runs the hero over and animates between two images.
    Car(Car),
    /// Carries the hero across the river.
    Boat,
    /// Carries the hero until it sinks.
    SketchyBoat(SketchyBoat),
}

/// Vehicle travelling along a lane that wraps around at its ends.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    id: String,
    speed: f64,
    lane_width: u32,
    role: VehicleRole,
}

impl Vehicle {
    /// Creates a vehicle moving at `speed` virtual pixels per second along a
    /// lane `lane_width` tiles wide.
    #[must_use]
    pub fn new(id: impl Into<String>, speed: f64, lane_width: u32, role: VehicleRole) -> Self {
        Self {
            id: id.into(),
            speed,
            lane_width,
            role,
        }
    }

    /// Type identifier the vehicle was declared with.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Signed horizontal speed in virtual pixels per second.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Width of the lane in tiles.
    #[must_use]
    pub const fn lane_width(&self) -> u32 {
        self.lane_width
    }

    /// Role specific state.
    #[must_use]
    pub const fn role(&self) -> &VehicleRole {
        &self.role
    }

    /// Sketchy boat state, if the vehicle is one.
    #[must_use]
    pub fn as_sketchy(&self) -> Option<&SketchyBoat> {
        match &self.role {
            VehicleRole::SketchyBoat(sketchy) => Some(sketchy),
            _ => None,
        }
    }

    /// Car state, if the vehicle is one.
    #[must_use]
    pub fn as_car(&self) -> Option<&Car> {
        match &self.role {
            VehicleRole::Car(car) => Some(car),
            _ => None,
        }
    }

    pub(crate) fn advance(&mut self, position: &mut DVec2, width: f64, dt: Duration, ridden: bool) {
        match &mut self.role {
            VehicleRole::Car(car) => car.animate(dt),
            VehicleRole::SketchyBoat(sketchy) => sketchy.ride(dt, ridden),
            VehicleRole::Plain | VehicleRole::Boat => {}
        }

        let lane = f64::from(self.lane_width) * TILE_LENGTH;
        if position.x + width / 2.0 <= 0.0 && self.speed < 0.0 {
            position.x += lane;
        }
        if position.x + MAX_VEHICLE_WIDTH >= lane + width && self.speed > 0.0 {
            position.x -= lane + MAX_VEHICLE_WIDTH;
        }
        position.x += self.speed * dt.as_secs_f64();
    }

    pub(crate) fn draw(&self, center: DVec2, image: Option<&ImageHandle>, frame: &mut Frame) {
        let image = match &self.role {
            VehicleRole::SketchyBoat(sketchy) if sketchy.has_sunk() => {
                frame.image_centered(&sketchy.broken_image, center);
                return;
            }
            VehicleRole::Car(car) if car.is_swapped() => Some(&car.swapped_image),
            _ => image,
        };

        if let Some(image) = image {
            frame.image_centered(image, center);
            mask_offscreen(frame, center, image.size());
        }
    }
}

/// Two-frame animation state of a car.
#[derive(Clone, Debug, PartialEq)]
pub struct Car {
    swapped_image: ImageHandle,
    swap_time: Duration,
    elapsed: Duration,
}

impl Car {
    /// Creates a car alternating with `swapped_image` every `swap_time`.
    ///
    /// A zero swap time falls back to half a second.
    #[must_use]
    pub fn new(swapped_image: ImageHandle, swap_time: Duration) -> Self {
        let swap_time = if swap_time.is_zero() {
            DEFAULT_SWAP_TIME
        } else {
            swap_time
        };
        Self {
            swapped_image,
            swap_time,
            elapsed: Duration::ZERO,
        }
    }

    /// Time each image stays on screen.
    #[must_use]
    pub const fn swap_time(&self) -> Duration {
        self.swap_time
    }

    /// Reports whether the second image is showing.
    #[must_use]
    pub fn is_swapped(&self) -> bool {
        self.elapsed > self.swap_time
    }

    fn animate(&mut self, dt: Duration) {
        let cycle = self.swap_time * 2;
        self.elapsed += dt;
        while self.elapsed > cycle {
            self.elapsed -= cycle;
        }
    }
}

/// Boat that breaks after carrying the hero for too long.
#[derive(Clone, Debug, PartialEq)]
pub struct SketchyBoat {
    broken_image: ImageHandle,
    time_ridden: Duration,
}

impl SketchyBoat {
    /// Creates an intact sketchy boat.
    #[must_use]
    pub fn new(broken_image: ImageHandle) -> Self {
        Self {
            broken_image,
            time_ridden: Duration::ZERO,
        }
    }

    /// Uninterrupted time the hero has ridden the boat.
    #[must_use]
    pub const fn time_ridden(&self) -> Duration {
        self.time_ridden
    }

    /// Reports whether the boat gave way under the hero.
    #[must_use]
    pub fn has_sunk(&self) -> bool {
        self.time_ridden > SKETCHY_SINK_DELAY
    }

    fn ride(&mut self, dt: Duration, ridden: bool) {
        self.time_ridden = if ridden {
            self.time_ridden + dt
        } else {
            Duration::ZERO
        };
    }
}
