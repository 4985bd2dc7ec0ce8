// src/core/camera.rs

use serde::{Deserialize, Serialize};

use crate::core::layout::Vec2;

pub const MIN_SCALE: f32 = 8.0;
pub const MAX_SCALE: f32 = 400.0;

/// Affine world->screen transform: uniform scale (pixels per world unit)
/// around a world-space center. Screen y grows downward, world y upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub center: Vec2,
    pub scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            scale: 90.0,
        }
    }
}

impl Camera {
    pub fn new(center: Vec2, scale: f32) -> Self {
        Self {
            center,
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
        }
    }

    pub fn world_to_screen(&self, world: Vec2, viewport: Vec2) -> Vec2 {
        Vec2::new(
            (world.x - self.center.x) * self.scale + viewport.x * 0.5,
            -(world.y - self.center.y) * self.scale + viewport.y * 0.5,
        )
    }

    pub fn screen_to_world(&self, screen: Vec2, viewport: Vec2) -> Vec2 {
        Vec2::new(
            self.center.x + (screen.x - viewport.x * 0.5) / self.scale,
            self.center.y - (screen.y - viewport.y * 0.5) / self.scale,
        )
    }

    /// Pan by a screen-space delta (drag direction).
    pub fn pan(&mut self, delta_px: Vec2) {
        self.center.x -= delta_px.x / self.scale;
        self.center.y += delta_px.y / self.scale;
    }

    /// Zoom by `factor`, keeping the world point under `screen_pt` fixed.
    pub fn zoom_about(&mut self, factor: f32, screen_pt: Vec2, viewport: Vec2) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.screen_to_world(screen_pt, viewport);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.center.x = anchor.x - (screen_pt.x - viewport.x * 0.5) / self.scale;
        self.center.y = anchor.y + (screen_pt.y - viewport.y * 0.5) / self.scale;
    }

    /// Normalized zoom position in [0, 1] across the allowed scale range
    /// (0 = fully zoomed out).
    pub fn zoom_norm(&self) -> f32 {
        let t = (self.scale.ln() - MIN_SCALE.ln()) / (MAX_SCALE.ln() - MIN_SCALE.ln());
        t.clamp(0.0, 1.0)
    }

    /// Re-center on a world point at the given scale.
    pub fn reset(&mut self, center: Vec2, scale: f32) {
        self.center = center;
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }
}
