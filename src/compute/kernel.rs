//! Spatial influence kernel.
//!
//! A single kernel is built once per simulation and shared read-only by all
//! cells; weights are a pure function of the configuration, so identical
//! configurations always produce identical kernels.

use std::f32::consts::PI;

use crate::schema::SimulationConfig;

/// Precomputed neighbor-influence weights over the `(2r+1)^3` neighborhood.
///
/// Stored as a flat array indexed by `(a * diameter + b) * diameter + c`
/// where `(a, b, c)` is the offset from the neighborhood corner. The weight
/// is a 2D Gaussian of the in-plane offset `(a - r, b - r)`, independent of
/// the out-of-plane offset `c - r`. The self offset `(r, r, r)` carries zero
/// weight: a cell never influences itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
    radius: usize,
    diameter: usize,
}

impl Kernel {
    /// Build the kernel from configuration.
    pub fn build(config: &SimulationConfig) -> Self {
        let radius = config.sens_radius;
        let diameter = config.kernel_diameter();
        let sigma_sq = config.kernel_sigma * config.kernel_sigma;
        let norm = 1.0 / (2.0 * PI * sigma_sq);

        let mut weights = vec![0.0f32; diameter * diameter * diameter];
        for a in 0..diameter {
            for b in 0..diameter {
                let dx = a as f32 - radius as f32;
                let dy = b as f32 - radius as f32;
                let w = norm * (-(dx * dx + dy * dy) / (2.0 * sigma_sq)).exp();
                for c in 0..diameter {
                    weights[(a * diameter + b) * diameter + c] = w;
                }
            }
        }

        // Self weight is always zero.
        weights[(radius * diameter + radius) * diameter + radius] = 0.0;

        Self {
            weights,
            radius,
            diameter,
        }
    }

    /// Weight at offset `(a, b, c)` from the neighborhood corner.
    #[inline]
    pub fn weight(&self, a: usize, b: usize, c: usize) -> f32 {
        self.weights[(a * self.diameter + b) * self.diameter + c]
    }

    /// Neighbor reach per axis.
    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Edge length of the neighborhood cube.
    #[inline]
    pub fn diameter(&self) -> usize {
        self.diameter
    }
}
