// src/engine/hit.rs
//
// Turns a screen point into a lattice identity. Plane nodes win whenever
// one is inside the tap radius; overlay nodes are considered only after
// that, gated by the same existence-strength function the draw pass
// uses.

use std::collections::BTreeSet;

use crate::core::camera::Camera;
use crate::core::coord::{GhostMonzo, LatticeCoord, SelectionKey};
use crate::core::layout::{Vec2, ghost_position, plane_position};
use crate::engine::anim::{PhaseMap, ink_strength, jitter01};

/// Nodes below this existence strength cannot be tapped.
pub const STRENGTH_FLOOR: f32 = 0.15;

const MAX_PLANE_RADIUS: i32 = 24;
const GHOST_SPAN_MIN: i32 = 4;
const GHOST_SPAN_MAX: i32 = 8;

#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub camera: &'a Camera,
    pub pivot: LatticeCoord,
    pub visible_primes: &'a BTreeSet<u32>,
    pub anim: &'a PhaseMap,
    pub tap_radius_px: f32,
    pub now: f64,
}

impl<'a> HitContext<'a> {
    /// Nearest addressable node under `screen`, or `None`.
    pub fn resolve(&self, screen: Vec2, viewport: Vec2) -> Option<SelectionKey> {
        if let Some(coord) = self.resolve_plane(screen, viewport) {
            return Some(SelectionKey::Plane(coord));
        }
        self.resolve_ghost(screen, viewport)
            .map(SelectionKey::Ghost)
    }

    /// Lattice steps to scan outward from the pivot: enough to cover the
    /// viewport at the current zoom, capped for sanity.
    fn plane_radius(&self, viewport: Vec2) -> i32 {
        let half_extent = viewport.x.max(viewport.y) * 0.5 / self.camera.scale;
        (half_extent.ceil() as i32 + 1).min(MAX_PLANE_RADIUS)
    }

    fn resolve_plane(&self, screen: Vec2, viewport: Vec2) -> Option<LatticeCoord> {
        let r = self.plane_radius(viewport);
        let mut best: Option<(f32, LatticeCoord)> = None;
        for e3 in (self.pivot.e3 - r)..=(self.pivot.e3 + r) {
            for e5 in (self.pivot.e5 - r)..=(self.pivot.e5 + r) {
                let coord = LatticeCoord::new(e3, e5);
                let pos = self.camera.world_to_screen(plane_position(coord), viewport);
                let d = pos.dist(screen);
                if d <= self.tap_radius_px && best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, coord));
                }
            }
        }
        best.map(|(_, c)| c)
    }

    /// Exponent span along a prime's chain, wider when zoomed in.
    fn ghost_span(&self) -> i32 {
        let z = self.camera.zoom_norm();
        GHOST_SPAN_MIN + ((GHOST_SPAN_MAX - GHOST_SPAN_MIN) as f32 * z).round() as i32
    }

    /// Existence strength of an overlay node right now: 1.0 when its
    /// prime is settled visible, a wavefront sample mid-animation, and
    /// nothing when hidden.
    pub fn ghost_strength(&self, ghost: GhostMonzo, span: i32) -> Option<f32> {
        let visible = self.visible_primes.contains(&ghost.prime);
        match self.anim.ink_entry(ghost.prime, self.now) {
            Some(entry) => {
                let dist_norm = ghost.exponent.unsigned_abs() as f32 / span.max(1) as f32;
                Some(ink_strength(
                    entry.progress(self.now),
                    dist_norm,
                    jitter01(ghost.jitter_seed()),
                    entry.target_on,
                ))
            }
            None if visible => Some(1.0),
            None => None,
        }
    }

    fn resolve_ghost(&self, screen: Vec2, viewport: Vec2) -> Option<GhostMonzo> {
        let span = self.ghost_span();
        let mut best: Option<(f32, GhostMonzo)> = None;

        let mut primes: BTreeSet<u32> = self.visible_primes.clone();
        primes.extend(self.anim.animating_primes(self.now));

        for &prime in &primes {
            for exp in -span..=span {
                if exp == 0 {
                    continue;
                }
                let ghost = GhostMonzo::new(prime, self.pivot.e3, self.pivot.e5, exp);
                let Some(strength) = self.ghost_strength(ghost, span) else {
                    continue;
                };
                if strength < STRENGTH_FLOOR {
                    continue;
                }
                let pos = self.camera.world_to_screen(ghost_position(ghost), viewport);
                let d = pos.dist(screen);
                // barely-present nodes get a proportionally smaller target
                if d <= self.tap_radius_px * strength && best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, ghost));
                }
            }
        }
        best.map(|(_, g)| g)
    }
}
