//! Screen-space geometry: boxes and the arena they live in
//!
//! Coordinates follow the canvas convention: origin at the top-left corner,
//! x grows right, y grows down.

use glam::Vec2;

use crate::consts::{BASE_CANVAS_WIDTH, CANVAS_ASPECT_H, CANVAS_ASPECT_W};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Top-left corner
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrink by `margin` on all four sides. Never produces negative extents;
    /// an over-inset box collapses onto its centre.
    pub fn inset(&self, margin: f32) -> Self {
        let dx = margin.min(self.width / 2.0);
        let dy = margin.min(self.height / 2.0);
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width - 2.0 * dx,
            height: self.height - 2.0 * dy,
        }
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.right() <= other.left()
            || self.left() >= other.right()
            || self.bottom() <= other.top()
            || self.top() >= other.bottom())
    }
}

/// Drawing surface dimensions and the global scale derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    /// Multiplier applied to every base-pixel distance
    pub scale: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(
            BASE_CANVAS_WIDTH,
            BASE_CANVAS_WIDTH * CANVAS_ASPECT_H / CANVAS_ASPECT_W,
        )
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale: width / BASE_CANVAS_WIDTH,
        }
    }

    /// Largest 4:3 canvas that fits inside a container
    pub fn fit(container_width: f32, container_height: f32) -> Self {
        let width = container_width
            .min(container_height * CANVAS_ASPECT_W / CANVAS_ASPECT_H)
            .max(1.0);
        Self::new(width, width * CANVAS_ASPECT_H / CANVAS_ASPECT_W)
    }

    /// Clamp a box's left edge so the box stays inside the horizontal bounds
    #[inline]
    pub fn clamp_x(&self, x: f32, box_width: f32) -> f32 {
        x.clamp(0.0, (self.width - box_width).max(0.0))
    }
}
