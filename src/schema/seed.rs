//! Seed types for initializing lattice activity.

use serde::{Deserialize, Serialize};

/// One stochastic activation region.
///
/// Every cell within `radius` per axis of `center` (clamped to the lattice
/// bounds) is activated independently with the given probability. Applied via
/// [`Simulator::seed_region`](crate::compute::Simulator::seed_region) before
/// the first step or between steps; seeding never runs a step itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSpec {
    /// Region center as lattice coordinates (i, j, k).
    pub center: (usize, usize, usize),
    /// Region half-width per axis, in cells.
    pub radius: usize,
    /// Per-cell activation probability in [0, 1].
    pub probability: f32,
}

/// Complete seed specification: regions applied in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seed {
    pub regions: Vec<SeedSpec>,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            regions: vec![SeedSpec {
                center: (25, 25, 25),
                radius: 6,
                probability: 0.1,
            }],
        }
    }
}
