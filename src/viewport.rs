//! World ↔ screen transform. Screen positions are local to the drawing surface.

use eframe::egui::{Pos2, Vec2};

use crate::geometry::bounds_of;

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 5.0;
pub const FIT_MAX_SCALE: f32 = 1.5;
pub const FIT_PADDING: f32 = 60.0;
pub const ZOOM_TO_NODE_SCALE: f32 = 1.6;
pub const ZOOM_STEP: f32 = 1.2;
pub const MIN_NODE_PIXELS: f32 = 2.0;
pub const MAX_NODE_PIXELS: f32 = 60.0;

/// On-screen radius of a node circle. Drawing and hit-testing both go through this.
pub fn screen_radius(radius: f32, scale: f32) -> f32 {
    (radius * scale).clamp(MIN_NODE_PIXELS, MAX_NODE_PIXELS)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f32,
    offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new(scale: f32, offset: Vec2) -> Self {
        Self {
            scale: clamp_scale(scale),
            offset,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.offset).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset) / self.scale).to_pos2()
    }

    pub fn pan(&mut self, delta: Vec2) {
        if delta.x.is_finite() && delta.y.is_finite() {
            self.offset += delta;
        }
    }

    /// Sets the scale while keeping the world point under `cursor` fixed on screen.
    pub fn zoom_at(&mut self, cursor: Pos2, new_scale: f32) {
        if !new_scale.is_finite() {
            return;
        }
        let world = self.screen_to_world(cursor);
        self.scale = clamp_scale(new_scale);
        self.offset = cursor.to_vec2() - world.to_vec2() * self.scale;
    }

    pub fn zoom_by(&mut self, cursor: Pos2, factor: f32) {
        self.zoom_at(cursor, self.scale * factor);
    }

    pub fn wheel_zoom(&mut self, cursor: Pos2, scroll: f32) {
        if scroll.abs() <= f32::EPSILON {
            return;
        }
        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom_by(cursor, factor);
    }

    /// Frames all `points` inside `screen_size`, never zooming in past [`FIT_MAX_SCALE`].
    pub fn fit(&mut self, points: impl IntoIterator<Item = Pos2>, screen_size: Vec2) {
        let Some(bounds) = bounds_of(points) else {
            self.reset();
            return;
        };
        let bounds = bounds.expand(FIT_PADDING);
        let scale_x = screen_size.x / bounds.width().max(1.0);
        let scale_y = screen_size.y / bounds.height().max(1.0);
        self.scale = clamp_scale(scale_x.min(scale_y).min(FIT_MAX_SCALE));
        self.offset = screen_size * 0.5 - bounds.center().to_vec2() * self.scale;
    }

    pub fn zoom_to(&mut self, world: Pos2, screen_size: Vec2) {
        self.scale = ZOOM_TO_NODE_SCALE;
        self.offset = screen_size * 0.5 - world.to_vec2() * self.scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn world_center(&self, screen_size: Vec2) -> Pos2 {
        self.screen_to_world((screen_size * 0.5).to_pos2())
    }
}

fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}
