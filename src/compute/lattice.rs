//! The 3D lattice of cells, bounded neighbor iteration, and region seeding.

use rand::Rng;

use crate::schema::ConfigError;

/// Activity state of a single cell. Exactly one at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Idle,
    Active,
    Relaxing,
}

/// One lattice site: a state and an activation value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cell {
    pub state: CellState,
    pub value: f32,
}

impl Cell {
    /// Force the cell into the active state with the given value.
    pub fn activate(&mut self, value: f32) {
        self.state = CellState::Active;
        self.value = value;
    }
}

/// Coordinate access errors.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("coordinate ({i}, {j}, {k}) outside lattice extents {width}x{height}x{depth}")]
    OutOfBounds {
        i: usize,
        j: usize,
        k: usize,
        width: usize,
        height: usize,
        depth: usize,
    },
}

/// Fixed-size 3D grid of cells.
///
/// Cells are stored in a single flat buffer with stride indexing
/// `idx = (i * height + j) * depth + k` (i outer, j middle, k inner); every
/// export and iteration uses this order. Dimensions never change after
/// creation. Coordinates outside the extents have no neighbors: neighbor
/// iteration clamps to the bounds instead of wrapping around.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
    depth: usize,
}

impl Lattice {
    /// Allocate a lattice with all cells idle at value zero.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            cells: vec![Cell::default(); width * height * depth],
            width,
            height,
            depth,
        }
    }

    /// Lattice extents as (width, height, depth).
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    /// Total cell count.
    #[inline]
    pub fn volume(&self) -> usize {
        self.cells.len()
    }

    /// Convert (i, j, k) coordinates to a flat index.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.height + j) * self.depth + k
    }

    /// Convert a flat index back to (i, j, k) coordinates.
    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let plane = self.height * self.depth;
        (idx / plane, (idx % plane) / self.depth, idx % self.depth)
    }

    /// All cells in fixed iteration order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Bounds-checked cell access.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Result<&Cell, LatticeError> {
        self.check_bounds(i, j, k)?;
        Ok(&self.cells[(i * self.height + j) * self.depth + k])
    }

    /// Bounds-checked mutable cell access.
    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> Result<&mut Cell, LatticeError> {
        self.check_bounds(i, j, k)?;
        Ok(&mut self.cells[(i * self.height + j) * self.depth + k])
    }

    fn check_bounds(&self, i: usize, j: usize, k: usize) -> Result<(), LatticeError> {
        if i >= self.width || j >= self.height || k >= self.depth {
            return Err(LatticeError::OutOfBounds {
                i,
                j,
                k,
                width: self.width,
                height: self.height,
                depth: self.depth,
            });
        }
        Ok(())
    }

    /// Invoke `f` for every in-bounds coordinate within `radius` per axis of
    /// `(i, j, k)`, including the center itself.
    ///
    /// `f` receives the neighbor coordinates and the offset `(a, b, c)` into
    /// the `(2 * radius + 1)^3` neighborhood cube (the center maps to
    /// `(radius, radius, radius)`). Out-of-range coordinates are skipped by
    /// pre-clamping the ranges, never visited and never an error.
    pub fn for_each_neighbor<F>(&self, i: usize, j: usize, k: usize, radius: usize, mut f: F)
    where
        F: FnMut(usize, usize, usize, (usize, usize, usize)),
    {
        let (lo_i, hi_i) = clamped_range(i, radius, self.width);
        let (lo_j, hi_j) = clamped_range(j, radius, self.height);
        let (lo_k, hi_k) = clamped_range(k, radius, self.depth);

        for ni in lo_i..hi_i {
            let a = ni + radius - i;
            for nj in lo_j..hi_j {
                let b = nj + radius - j;
                for nk in lo_k..hi_k {
                    f(ni, nj, nk, (a, b, nk + radius - k));
                }
            }
        }
    }

    /// Stochastically activate a region.
    ///
    /// For every in-bounds coordinate within `radius` per axis of `center`,
    /// draws an independent Bernoulli trial at `probability` and applies
    /// `activate` to the cell on success. Fails if `probability` lies outside
    /// `[0, 1]`; a window clamped down to nothing is not an error.
    pub fn seed_region<R, F>(
        &mut self,
        center: (usize, usize, usize),
        radius: usize,
        probability: f32,
        rng: &mut R,
        mut activate: F,
    ) -> Result<(), ConfigError>
    where
        R: Rng,
        F: FnMut(&mut Cell),
    {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::InvalidProbability(probability));
        }

        let (ci, cj, ck) = center;
        let (lo_i, hi_i) = clamped_range(ci, radius, self.width);
        let (lo_j, hi_j) = clamped_range(cj, radius, self.height);
        let (lo_k, hi_k) = clamped_range(ck, radius, self.depth);

        for i in lo_i..hi_i {
            for j in lo_j..hi_j {
                for k in lo_k..hi_k {
                    if rng.gen_bool(f64::from(probability)) {
                        let idx = (i * self.height + j) * self.depth + k;
                        activate(&mut self.cells[idx]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Swap the committed cells with a fully computed staging buffer.
    pub(crate) fn commit(&mut self, staging: &mut Vec<Cell>) {
        debug_assert_eq!(staging.len(), self.cells.len());
        std::mem::swap(&mut self.cells, staging);
    }
}

/// Half-open index range covering the inclusive window
/// `[center - radius, center + radius]` clamped to `[0, extent)`. Empty when
/// the window misses the lattice entirely.
#[inline]
fn clamped_range(center: usize, radius: usize, extent: usize) -> (usize, usize) {
    let lo = center.saturating_sub(radius);
    let hi = (center.saturating_add(radius).saturating_add(1)).min(extent);
    (lo.min(hi), hi)
}
