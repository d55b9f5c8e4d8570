#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for River Crossing adapters.
//!
//! The world records what it wants drawn as a flat list of [`DrawOp`] values
//! expressed in virtual pixels. Backends replay the list after applying the
//! [`Viewport`] that maps the virtual area onto their surface.

use glam::DVec2;
use river_crossing_core::{Color, ImageHandle, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};

/// Uniform scale and centring offset mapping virtual pixels onto a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset: DVec2,
}

impl Viewport {
    /// Viewport that leaves virtual coordinates untouched.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: DVec2::ZERO,
    };

    /// Fits the virtual area into a surface of the given size, preserving the
    /// aspect ratio and centring the result.
    ///
    /// Degenerate surfaces fall back to [`Viewport::IDENTITY`].
    #[must_use]
    pub fn fit(width: f64, height: f64) -> Self {
        if width <= 0.0 || height <= 0.0 {
            return Self::IDENTITY;
        }

        let scale = (width / VIRTUAL_WIDTH).min(height / VIRTUAL_HEIGHT);
        let offset = DVec2::new(
            (width - VIRTUAL_WIDTH * scale) / 2.0,
            (height - VIRTUAL_HEIGHT * scale) / 2.0,
        );
        Self { scale, offset }
    }

    /// Scale factor applied to virtual coordinates.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Surface offset of the virtual origin.
    #[must_use]
    pub const fn offset(&self) -> DVec2 {
        self.offset
    }

    /// Maps a surface position back into virtual pixels.
    #[must_use]
    pub fn to_virtual(&self, surface: DVec2) -> DVec2 {
        (surface - self.offset) / self.scale
    }

    /// Maps a virtual position onto the surface.
    #[must_use]
    pub fn to_surface(&self, virtual_position: DVec2) -> DVec2 {
        virtual_position * self.scale + self.offset
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Single drawing instruction expressed in virtual pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Blits an image stretched into the provided rectangle.
    Image {
        /// Image to draw.
        image: ImageHandle,
        /// Upper-left corner of the destination rectangle.
        top_left: DVec2,
        /// Size of the destination rectangle.
        size: DVec2,
    },
    /// Fills a rectangle with a solid color.
    Fill {
        /// Fill color.
        color: Color,
        /// Upper-left corner of the rectangle.
        top_left: DVec2,
        /// Size of the rectangle.
        size: DVec2,
    },
    /// Draws a line of text.
    Text {
        /// Text to draw.
        text: String,
        /// Upper-left corner of the text block.
        position: DVec2,
        /// Font height in virtual pixels.
        height: f64,
        /// Text color.
        color: Color,
    },
}

/// Ordered draw list produced for a single frame.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    viewport: Viewport,
    ops: Vec<DrawOp>,
}

impl Frame {
    /// Creates an empty frame that will be presented through the viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ops: Vec::new(),
        }
    }

    /// Viewport the frame is presented through.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Draw operations in submission order.
    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Number of recorded operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Reports whether nothing was drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Draws an image at its natural size centred on `center`.
    pub fn image_centered(&mut self, image: &ImageHandle, center: DVec2) {
        let size = image.size();
        self.image(image, center - size / 2.0, size);
    }

    /// Draws an image stretched into the provided rectangle.
    pub fn image(&mut self, image: &ImageHandle, top_left: DVec2, size: DVec2) {
        self.ops.push(DrawOp::Image {
            image: ImageHandle::clone(image),
            top_left,
            size,
        });
    }

    /// Fills a rectangle with a solid color.
    pub fn fill(&mut self, color: Color, top_left: DVec2, size: DVec2) {
        self.ops.push(DrawOp::Fill {
            color,
            top_left,
            size,
        });
    }

    /// Draws a line of text.
    pub fn text(&mut self, text: impl Into<String>, position: DVec2, height: f64, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.into(),
            position,
            height,
            color,
        });
    }

    /// Lines of text drawn so far, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Counts the operations of each variant.
    #[must_use]
    pub fn summary(&self) -> FrameSummary {
        let mut summary = FrameSummary::default();
        for op in &self.ops {
            match op {
                DrawOp::Image { .. } => summary.images += 1,
                DrawOp::Fill { .. } => summary.fills += 1,
                DrawOp::Text { .. } => summary.texts += 1,
            }
        }
        summary
    }
}

/// Per-variant operation counts of a [`Frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSummary {
    /// Number of image blits.
    pub images: usize,
    /// Number of solid fills.
    pub fills: usize,
    /// Number of text lines.
    pub texts: usize,
}
