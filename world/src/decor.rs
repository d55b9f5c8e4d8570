//! Tiled background decor and solid rectangles.

use glam::DVec2;
use river_crossing_core::{Color, ImageHandle, TILE_LENGTH};
use river_crossing_rendering::Frame;

/// Solid fill that turns a decor into a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectFill {
    color: Color,
    width: f64,
    height: f64,
}

impl RectFill {
    /// Creates a fill spanning `width` by `height` tiles.
    #[must_use]
    pub const fn new(color: Color, width: f64, height: f64) -> Self {
        Self {
            color,
            width,
            height,
        }
    }

    /// Fill color.
    #[must_use]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Size of one fill tile in virtual pixels.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height) * TILE_LENGTH
    }
}

/// Background piece repeated across a grid of tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Decor {
    id: String,
    repeat_x: u32,
    repeat_y: u32,
    fill: Option<RectFill>,
}

impl Decor {
    /// Creates an image decor repeated `repeat_x` by `repeat_y` times.
    #[must_use]
    pub fn new(id: impl Into<String>, repeat_x: u32, repeat_y: u32) -> Self {
        Self {
            id: id.into(),
            repeat_x,
            repeat_y,
            fill: None,
        }
    }

    /// Turns the decor into a solid rectangle.
    #[must_use]
    pub fn with_fill(mut self, fill: RectFill) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Type identifier the decor was declared with.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of horizontal repetitions.
    #[must_use]
    pub const fn repeat_x(&self) -> u32 {
        self.repeat_x
    }

    /// Number of vertical repetitions.
    #[must_use]
    pub const fn repeat_y(&self) -> u32 {
        self.repeat_y
    }

    /// Solid fill of a rectangle.
    #[must_use]
    pub fn fill(&self) -> Option<&RectFill> {
        self.fill.as_ref()
    }

    fn tile_offsets(&self) -> impl Iterator<Item = DVec2> + '_ {
        (0..self.repeat_x).flat_map(move |column| {
            (0..self.repeat_y).map(move |row| {
                DVec2::new(f64::from(column), f64::from(row)) * TILE_LENGTH
            })
        })
    }

    pub(crate) fn contains(&self, top_left: DVec2, tile: DVec2, point: DVec2) -> bool {
        if self.repeat_x == 0 || self.repeat_y == 0 {
            return false;
        }
        let extent = DVec2::new(
            f64::from(self.repeat_x - 1) * TILE_LENGTH + tile.x,
            f64::from(self.repeat_y - 1) * TILE_LENGTH + tile.y,
        );
        let test = point - top_left;
        test.x >= 0.0 && test.x < extent.x && test.y >= 0.0 && test.y < extent.y
    }

    // Tiles overlap by a pixel to hide seams.
    pub(crate) fn draw(&self, top_left: DVec2, image: Option<&ImageHandle>, frame: &mut Frame) {
        match (&self.fill, image) {
            (Some(fill), _) => {
                let size = fill.size() + DVec2::ONE;
                for offset in self.tile_offsets() {
                    frame.fill(fill.color(), top_left + offset, size);
                }
            }
            (None, Some(image)) => {
                let size = image.size() + DVec2::ONE;
                for offset in self.tile_offsets() {
                    frame.image(image, top_left + offset, size);
                }
            }
            (None, None) => {}
        }
    }
}
