// src/core/layout.rs
//
// Pure mapping from lattice exponents to world positions. The 3- and
// 5-axes span a fixed triangular basis; higher primes each get a basis
// vector at a deterministic per-prime angle so overlay chains fan out
// around the plane without colliding.

use serde::{Deserialize, Serialize};

use crate::core::coord::{GhostMonzo, LatticeCoord};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dist(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// 3-axis basis vector (one step of a fifth).
pub const AXIS_3: Vec2 = Vec2 { x: 1.0, y: 0.0 };

/// 5-axis basis vector, 60 degrees up from the 3-axis. Together with
/// `AXIS_3` this makes plane neighbors triangular, not square.
pub const AXIS_5: Vec2 = Vec2 {
    x: 0.5,
    y: 0.866_025_4,
};

// Golden angle in radians. Successive primes land far apart.
const PRIME_FAN_STEP: f32 = 2.399_963_2;

/// Basis vector for a higher prime's overlay chain. Deterministic in the
/// prime alone, so the fan is identical across runs and machines.
pub fn prime_axis(prime: u32) -> Vec2 {
    let theta = prime as f32 * PRIME_FAN_STEP;
    Vec2::new(theta.cos(), theta.sin())
}

/// World position of a plane coordinate.
pub fn plane_position(coord: LatticeCoord) -> Vec2 {
    AXIS_3 * coord.e3 as f32 + AXIS_5 * coord.e5 as f32
}

/// World position of an overlay node: its plane anchor plus steps along
/// the prime's own axis.
pub fn ghost_position(ghost: GhostMonzo) -> Vec2 {
    let anchor = plane_position(LatticeCoord::new(ghost.e3, ghost.e5));
    anchor + prime_axis(ghost.prime) * ghost.exponent as f32
}
