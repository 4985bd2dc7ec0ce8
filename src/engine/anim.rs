// src/engine/anim.rs
//
// Phase timing for the two toggle-animation families: per-node selection
// rings and per-prime overlay ink. Entries only record when a toggle
// started; progress is re-derived from the sampled clock on every query,
// so there is no timer to drift and any draw pass can ask safely.

use std::collections::BTreeMap;

use crate::core::coord::SelectionKey;

/// Entries stay queryable for this long past their duration, then the
/// deferred sweep deletes them.
pub const EXPIRY_SLACK: f64 = 0.05;

// Ink wavefront shaping: width of the traveling edge and how far the
// per-node jitter can displace a node within it, both in normalized
// distance units.
const FRONT_WIDTH: f32 = 0.35;
const JITTER_SPAN: f32 = 0.16;

pub const INK_ON_MIN_S: f32 = 0.45;
pub const INK_ON_MAX_S: f32 = 0.85;
const INK_OFF_SCALE: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationEntry {
    pub start: f64,
    pub target_on: bool,
    pub duration: f32,
    pub seed: u64,
}

impl AnimationEntry {
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (((now - self.start) / self.duration as f64) as f32).clamp(0.0, 1.0)
    }

    pub fn expired(&self, now: f64) -> bool {
        now - self.start > self.duration as f64 + EXPIRY_SLACK
    }
}

/// A sampled ring phase, handed to the draw pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub progress: f32,
    pub target_on: bool,
    pub seed: u64,
}

#[derive(Debug, Default)]
pub struct PhaseMap {
    rings: BTreeMap<SelectionKey, AnimationEntry>,
    inks: BTreeMap<u32, AnimationEntry>,
}

impl PhaseMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a selection ring. Re-toggling before expiry
    /// replaces the entry outright, so stale phases never stack.
    pub fn start_ring(&mut self, key: SelectionKey, now: f64, target_on: bool, duration: f32) {
        self.rings.insert(
            key,
            AnimationEntry {
                start: now,
                target_on,
                duration: duration.max(0.0),
                seed: key.jitter_seed(),
            },
        );
    }

    /// Start (or restart) a prime's ink reveal/evaporate.
    pub fn start_ink(&mut self, prime: u32, now: f64, target_on: bool, duration: f32) {
        self.inks.insert(
            prime,
            AnimationEntry {
                start: now,
                target_on,
                duration: duration.max(0.0),
                seed: (prime as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15),
            },
        );
    }

    /// Sampled phase for a node's ring, `None` once expired even if the
    /// sweep has not deleted the entry yet.
    pub fn ring_phase(&self, key: SelectionKey, now: f64) -> Option<Phase> {
        let e = self.rings.get(&key)?;
        if e.expired(now) {
            return None;
        }
        Some(Phase {
            progress: e.progress(now),
            target_on: e.target_on,
            seed: e.seed,
        })
    }

    pub fn ink_entry(&self, prime: u32, now: f64) -> Option<AnimationEntry> {
        let e = self.inks.get(&prime)?;
        if e.expired(now) { None } else { Some(*e) }
    }

    /// Drop expired entries. Returns the next expiry time among the
    /// survivors so the caller can reschedule the sweep, if any remain.
    pub fn sweep(&mut self, now: f64) -> Option<f64> {
        self.rings.retain(|_, e| !e.expired(now));
        self.inks.retain(|_, e| !e.expired(now));
        self.rings
            .values()
            .chain(self.inks.values())
            .map(|e| e.start + e.duration as f64 + EXPIRY_SLACK)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Primes whose ink is still mid-animation.
    pub fn animating_primes(&self, now: f64) -> Vec<u32> {
        self.inks
            .iter()
            .filter(|(_, e)| !e.expired(now))
            .map(|(p, _)| *p)
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.rings.len() + self.inks.len()
    }
}

/// Ink duration as a function of zoom: quick when zoomed far out, slower
/// close in, and evaporation runs a little faster than reveal.
pub fn ink_duration(zoom_norm: f32, target_on: bool) -> f32 {
    let z = zoom_norm.clamp(0.0, 1.0);
    let on = INK_ON_MIN_S + (INK_ON_MAX_S - INK_ON_MIN_S) * z;
    if target_on { on } else { on * INK_OFF_SCALE }
}

/// Map a seed to a unit-interval jitter value.
pub fn jitter01(seed: u64) -> f32 {
    (seed >> 40) as f32 / (1u64 << 24) as f32
}

/// Existence strength of an overlay node mid-ink: a reveal/evaporate
/// wavefront traveling outward from the chain origin, displaced per node
/// by its jitter. Shared verbatim by the draw pass and the hit-test
/// resolver; if these diverge, taps and visuals desync.
pub fn ink_strength(progress: f32, dist_norm: f32, jitter: f32, target_on: bool) -> f32 {
    let front = progress * (1.0 + FRONT_WIDTH + JITTER_SPAN);
    let d = dist_norm + (jitter - 0.5) * JITTER_SPAN;
    let reveal = ((front - d) / FRONT_WIDTH).clamp(0.0, 1.0);
    if target_on { reveal } else { 1.0 - reveal }
}
