//! Flat per-cell export arrays for the rendering boundary.
//!
//! The rendering collaborator only ever receives these copied arrays, never a
//! live lattice reference. Both arrays use the lattice's fixed iteration
//! order (i outer, j middle, k inner), three floats per cell.

use super::{CellState, Lattice};

/// Copied render-facing view of a committed lattice state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Per-cell (r, g, b) triples.
    pub colors: Vec<f32>,
    /// Step count the colors were captured at.
    pub step: u64,
}

impl Snapshot {
    /// Capture the colors of the current committed state.
    pub fn capture(lattice: &Lattice, step: u64) -> Self {
        Self {
            colors: colors_of(lattice),
            step,
        }
    }
}

/// Per-cell (x, y, z) triples.
///
/// Positions depend only on the lattice dimensions, so the array is invariant
/// for the lattice's lifetime and worth computing once.
pub fn positions_of(lattice: &Lattice) -> Vec<f32> {
    let (width, height, depth) = lattice.dims();
    let mut out = Vec::with_capacity(lattice.volume() * 3);
    for i in 0..width {
        for j in 0..height {
            for k in 0..depth {
                out.push(i as f32);
                out.push(j as f32);
                out.push(k as f32);
            }
        }
    }
    out
}

/// Per-cell (r, g, b) triples: red while active, blue while relaxing, black
/// while idle.
pub fn colors_of(lattice: &Lattice) -> Vec<f32> {
    let mut out = Vec::with_capacity(lattice.volume() * 3);
    for cell in lattice.cells() {
        let rgb = match cell.state {
            CellState::Active => [1.0, 0.0, 0.0],
            CellState::Relaxing => [0.0, 0.0, 1.0],
            CellState::Idle => [0.0, 0.0, 0.0],
        };
        out.extend_from_slice(&rgb);
    }
    out
}
