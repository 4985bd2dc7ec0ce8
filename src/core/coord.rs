// src/core/coord.rs

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Primes addressable by axis shifts and overlays. 3 and 5 span the plane;
/// the rest are overlay-only.
pub const LATTICE_PRIMES: [u32; 10] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31];

const SEED_PLANE: u64 = 0x746f_6e6e_6574_7a01;
const SEED_GHOST: u64 = 0x746f_6e6e_6574_7a02;

/// A point on the 3x5 exponent plane, relative to the movable pivot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LatticeCoord {
    pub e3: i32,
    pub e5: i32,
}

impl LatticeCoord {
    pub const ORIGIN: Self = Self { e3: 0, e5: 0 };

    pub fn new(e3: i32, e5: i32) -> Self {
        Self { e3, e5 }
    }

    /// Stable per-node seed for visual jitter. Hash of the integer
    /// coordinates so the same node jitters identically across runs.
    pub fn jitter_seed(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&self.e3.to_le_bytes());
        bytes[4..].copy_from_slice(&self.e5.to_le_bytes());
        xxh64(&bytes, SEED_PLANE)
    }

    pub fn owner_key(&self) -> String {
        format!("plane:{}:{}", self.e3, self.e5)
    }
}

/// Absolute identity of a higher-prime overlay node. Unlike `LatticeCoord`
/// this is not pivot-relative: the monzo names the ratio outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GhostMonzo {
    pub e3: i32,
    pub e5: i32,
    pub prime: u32,
    pub exponent: i32,
}

impl GhostMonzo {
    pub fn new(prime: u32, e3: i32, e5: i32, exponent: i32) -> Self {
        Self {
            e3,
            e5,
            prime,
            exponent,
        }
    }

    pub fn jitter_seed(&self) -> u64 {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&self.e3.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.e5.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.prime.to_le_bytes());
        bytes[12..].copy_from_slice(&self.exponent.to_le_bytes());
        xxh64(&bytes, SEED_GHOST)
    }

    pub fn owner_key(&self) -> String {
        format!(
            "ghost:{}:{}:{}:{}",
            self.prime, self.e3, self.e5, self.exponent
        )
    }
}

/// One addressable node of either family. Animation and audio key off this
/// so plane and overlay selections share a single reconciliation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SelectionKey {
    Plane(LatticeCoord),
    Ghost(GhostMonzo),
}

impl SelectionKey {
    pub fn jitter_seed(&self) -> u64 {
        match self {
            Self::Plane(c) => c.jitter_seed(),
            Self::Ghost(g) => g.jitter_seed(),
        }
    }

    pub fn owner_key(&self) -> String {
        match self {
            Self::Plane(c) => c.owner_key(),
            Self::Ghost(g) => g.owner_key(),
        }
    }
}

impl From<LatticeCoord> for SelectionKey {
    fn from(c: LatticeCoord) -> Self {
        Self::Plane(c)
    }
}

impl From<GhostMonzo> for SelectionKey {
    fn from(g: GhostMonzo) -> Self {
        Self::Ghost(g)
    }
}
