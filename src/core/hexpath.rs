// src/core/hexpath.rs
//
// Shortest path between two plane coordinates along the triangular
// adjacency the layout implies. Axial coords (e3, e5) map to cube coords
// with the q + r + s = 0 constraint; the path is a cube-space lerp with
// largest-error rounding.

/// Paths longer than this are not worth drawing; the caller falls back
/// to a direct segment.
pub const MAX_PATH_STEPS: i32 = 320;

use crate::core::coord::LatticeCoord;

fn to_cube(c: LatticeCoord) -> (i32, i32, i32) {
    let q = c.e3;
    let r = c.e5;
    (q, -q - r, r)
}

/// Hex distance between two cells (in lattice steps).
pub fn hex_distance(a: LatticeCoord, b: LatticeCoord) -> i32 {
    let (ax, ay, az) = to_cube(a);
    let (bx, by, bz) = to_cube(b);
    ((ax - bx).abs() + (ay - by).abs() + (az - bz).abs()) / 2
}

/// Round fractional cube coords to the nearest cell, fixing the component
/// with the largest rounding error so x + y + z stays zero.
fn cube_round(x: f64, y: f64, z: f64) -> (i32, i32, i32) {
    let mut rx = x.round();
    let mut ry = y.round();
    let mut rz = z.round();

    let dx = (rx - x).abs();
    let dy = (ry - y).abs();
    let dz = (rz - z).abs();

    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy > dz {
        ry = -rx - rz;
    } else {
        rz = -rx - ry;
    }
    (rx as i32, ry as i32, rz as i32)
}

/// Shortest coordinate sequence from `start` to `goal`, endpoints
/// included, consecutive duplicates removed. `None` when the distance
/// exceeds `MAX_PATH_STEPS`.
pub fn shortest_grid_path(start: LatticeCoord, goal: LatticeCoord) -> Option<Vec<LatticeCoord>> {
    if start == goal {
        return Some(vec![start]);
    }
    let n = hex_distance(start, goal);
    if n > MAX_PATH_STEPS {
        return None;
    }

    let (ax, ay, az) = to_cube(start);
    let (bx, by, bz) = to_cube(goal);

    let mut path = Vec::with_capacity(n as usize + 1);
    for i in 0..=n {
        let t = i as f64 / n as f64;
        let x = ax as f64 + (bx - ax) as f64 * t;
        let y = ay as f64 + (by - ay) as f64 * t;
        let z = az as f64 + (bz - az) as f64 * t;
        let (cx, _cy, cz) = cube_round(x, y, z);
        let coord = LatticeCoord::new(cx, cz);
        if path.last() != Some(&coord) {
            path.push(coord);
        }
    }

    // lerp rounding can only merge steps, never drop endpoints; keep them
    // pinned regardless.
    if path.first() != Some(&start) {
        path.insert(0, start);
    }
    if path.last() != Some(&goal) {
        path.push(goal);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_path_is_single_cell() {
        let a = LatticeCoord::new(2, -3);
        assert_eq!(shortest_grid_path(a, a), Some(vec![a]));
    }

    #[test]
    fn adjacent_cells_need_no_intermediate() {
        let a = LatticeCoord::new(0, 0);
        let b = LatticeCoord::new(1, 0);
        assert_eq!(shortest_grid_path(a, b), Some(vec![a, b]));
    }

    #[test]
    fn endpoints_always_present() {
        let a = LatticeCoord::new(-3, 2);
        let b = LatticeCoord::new(4, -5);
        let path = shortest_grid_path(a, b).expect("path");
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        assert_eq!(path.len() as i32, hex_distance(a, b) + 1);
    }

    #[test]
    fn steps_are_adjacent() {
        let a = LatticeCoord::new(0, 0);
        let b = LatticeCoord::new(5, -2);
        let path = shortest_grid_path(a, b).expect("path");
        for pair in path.windows(2) {
            assert_eq!(hex_distance(pair[0], pair[1]), 1, "{pair:?} not adjacent");
        }
    }

    #[test]
    fn distance_cap_returns_none() {
        let a = LatticeCoord::new(0, 0);
        let b = LatticeCoord::new(MAX_PATH_STEPS + 1, 0);
        assert_eq!(shortest_grid_path(a, b), None);
    }

    #[test]
    fn diagonal_neighbor_is_distance_one() {
        // (1,-1) shares an edge in the triangular adjacency
        assert_eq!(
            hex_distance(LatticeCoord::new(0, 0), LatticeCoord::new(1, -1)),
            1
        );
    }
}
