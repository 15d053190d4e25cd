//! Two-phase lattice update.
//!
//! Each step reads the committed state of every cell, computes every next
//! state into a staging buffer, then swaps the buffer in. No cell ever
//! observes another cell's in-progress update, so the result is independent
//! of traversal order and the read phase is safe to parallelize.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Cell, CellState, Kernel, Lattice};
use crate::schema::{ConfigError, SeedSpec, SimulationConfig};

/// Drives discrete steps over a lattice.
///
/// Owns the kernel, the staging buffer, and the run's RNG. The lattice is
/// passed in per call, so one simulator can drive any lattice whose cells it
/// should evolve; dimensions are read from the lattice itself.
pub struct Simulator {
    config: SimulationConfig,
    kernel: Kernel,
    staging: Vec<Cell>,
    rng: StdRng,
    step: u64,
}

impl Simulator {
    /// Create a simulator from configuration.
    ///
    /// Validates the configuration and builds the kernel once; both are
    /// immutable afterwards.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let kernel = Kernel::build(&config);
        let seed = config.random_seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            kernel,
            staging: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            step: 0,
        })
    }

    /// Perform one synchronous step.
    ///
    /// Read phase: every cell's next state is computed from the committed
    /// lattice only, in parallel across cells. Commit phase: the staging
    /// buffer is swapped in whole. Stepping a zero-volume lattice is a no-op.
    pub fn step(&mut self, lattice: &mut Lattice) {
        if lattice.volume() == 0 {
            return;
        }

        let step_seed = self.rng.next_u64();
        self.staging.resize(lattice.volume(), Cell::default());

        {
            let current: &Lattice = lattice;
            let kernel = &self.kernel;
            let config = &self.config;
            self.staging
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, out)| {
                    *out = next_cell(current, kernel, config, idx, step_seed);
                });
        }

        lattice.commit(&mut self.staging);
        self.step += 1;
    }

    /// Run for the specified number of steps.
    pub fn run(&mut self, lattice: &mut Lattice, steps: u64) {
        for _ in 0..steps {
            self.step(lattice);
        }
    }

    /// Stochastically activate a region, setting fired cells spiking at the
    /// configured threshold value. Never runs a step.
    pub fn seed_region(
        &mut self,
        lattice: &mut Lattice,
        spec: &SeedSpec,
    ) -> Result<(), ConfigError> {
        let threshold = self.config.threshold;
        lattice.seed_region(
            spec.center,
            spec.radius,
            spec.probability,
            &mut self.rng,
            |cell| cell.activate(threshold),
        )
    }

    /// Number of completed steps.
    #[inline]
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Configuration reference.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

/// Compute the next state of the cell at `idx` from the committed lattice.
///
/// Pure in the lattice: the outcome depends only on committed cell values,
/// the kernel, and the per-step seed, never on evaluation order. Transition
/// rules, in priority order:
///
/// 1. Idle: sum kernel weights of active neighbors (`activity`) and relaxing
///    neighbors (`relax`) over the in-bounds neighborhood. The cell fires
///    (active at the threshold value) iff `activity` exceeds the activity
///    floor, `relax < activity`, and a Bernoulli draw at the trigger
///    probability succeeds; otherwise it stays idle with its value unchanged.
/// 2. Active: decays by the spiking speed and starts relaxing. Activity lasts
///    exactly one step.
/// 3. Relaxing: decays by the relaxation speed; returns to idle once the new
///    value reaches the relaxation threshold.
fn next_cell(
    lattice: &Lattice,
    kernel: &Kernel,
    config: &SimulationConfig,
    idx: usize,
    step_seed: u64,
) -> Cell {
    let cell = lattice.cells()[idx];
    match cell.state {
        CellState::Idle => {
            let (i, j, k) = lattice.coords(idx);
            let mut activity = 0.0f32;
            let mut relax = 0.0f32;
            let cells = lattice.cells();

            lattice.for_each_neighbor(i, j, k, kernel.radius(), |ni, nj, nk, (a, b, c)| {
                match cells[lattice.idx(ni, nj, nk)].state {
                    CellState::Active => activity += kernel.weight(a, b, c),
                    CellState::Relaxing => relax += kernel.weight(a, b, c),
                    CellState::Idle => {}
                }
            });

            let fires = activity > config.activity_floor
                && relax < activity
                && unit_uniform(step_seed, idx as u64) < config.trigger_probability;

            if fires {
                Cell {
                    state: CellState::Active,
                    value: config.threshold,
                }
            } else {
                cell
            }
        }
        CellState::Active => Cell {
            state: CellState::Relaxing,
            value: cell.value - config.spiking_speed,
        },
        CellState::Relaxing => {
            let value = cell.value - config.relaxation_speed;
            let state = if value <= config.relaxation_threshold {
                CellState::Idle
            } else {
                CellState::Relaxing
            };
            Cell { state, value }
        }
    }
}

/// Map (per-step seed, cell index) to a uniform draw in [0, 1).
///
/// splitmix64 finalizer over the mixed counter; each cell's draw is fixed by
/// the step seed and its own index, independent of visit order.
fn unit_uniform(seed: u64, index: u64) -> f32 {
    let mut z = seed.wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32
}

/// Lattice statistics for monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStats {
    pub idle: usize,
    pub active: usize,
    pub relaxing: usize,
    pub min_value: f32,
    pub max_value: f32,
}

impl SimulationStats {
    /// Compute statistics from a lattice.
    pub fn from_lattice(lattice: &Lattice) -> Self {
        let mut stats = Self {
            idle: 0,
            active: 0,
            relaxing: 0,
            min_value: 0.0,
            max_value: 0.0,
        };
        let mut first = true;

        for cell in lattice.cells() {
            match cell.state {
                CellState::Idle => stats.idle += 1,
                CellState::Active => stats.active += 1,
                CellState::Relaxing => stats.relaxing += 1,
            }
            if first {
                stats.min_value = cell.value;
                stats.max_value = cell.value;
                first = false;
            } else {
                stats.min_value = stats.min_value.min(cell.value);
                stats.max_value = stats.max_value.max(cell.value);
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_config() -> SimulationConfig {
        SimulationConfig {
            width: 5,
            height: 5,
            depth: 5,
            sens_radius: 1,
            threshold: 1.0,
            spiking_speed: 0.25,
            relaxation_speed: 0.25,
            relaxation_threshold: 0.25,
            random_seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    fn lattice_for(config: &SimulationConfig) -> Lattice {
        Lattice::new(config.width, config.height, config.depth)
    }

    #[test]
    fn test_idle_lattice_is_fixed_point() {
        let config = test_config();
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        let initial = lattice.clone();

        simulator.run(&mut lattice, 20);
        assert_eq!(lattice, initial);
    }

    #[test]
    fn test_spike_decay_cycle() {
        let config = test_config();
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(2, 2, 2).unwrap().activate(1.0);

        // Active for exactly one step, then relaxing with one spike decay.
        simulator.step(&mut lattice);
        let cell = *lattice.get(2, 2, 2).unwrap();
        assert_eq!(cell.state, CellState::Relaxing);
        assert_eq!(cell.value, 0.75);

        // Relaxation decay until the relaxation threshold sends it idle.
        simulator.step(&mut lattice);
        let cell = *lattice.get(2, 2, 2).unwrap();
        assert_eq!(cell.state, CellState::Relaxing);
        assert_eq!(cell.value, 0.5);

        simulator.step(&mut lattice);
        let cell = *lattice.get(2, 2, 2).unwrap();
        assert_eq!(cell.state, CellState::Idle);
        assert_eq!(cell.value, 0.25);
    }

    #[test]
    fn test_active_relaxes_even_above_threshold() {
        let config = SimulationConfig {
            spiking_speed: 0.0,
            relaxation_threshold: 0.0,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(2, 2, 2).unwrap().activate(1.0);

        simulator.step(&mut lattice);
        let cell = *lattice.get(2, 2, 2).unwrap();
        assert_eq!(cell.state, CellState::Relaxing);
        assert_eq!(cell.value, 1.0);
    }

    #[test]
    fn test_single_cell_cannot_trigger_itself() {
        // A lone active cell has no in-bounds neighbors; the zero self weight
        // means it decays to idle and the lattice goes quiet.
        let config = SimulationConfig {
            width: 1,
            height: 1,
            depth: 1,
            trigger_probability: 1.0,
            activity_floor: 0.0,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(0, 0, 0).unwrap().activate(1.0);

        simulator.run(&mut lattice, 10);
        assert_eq!(lattice.get(0, 0, 0).unwrap().state, CellState::Idle);
    }

    #[test]
    fn test_gate_fires_all_neighbors_when_certain() {
        let config = SimulationConfig {
            width: 3,
            height: 3,
            depth: 3,
            sens_radius: 1,
            activity_floor: 0.001,
            trigger_probability: 1.0,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(1, 1, 1).unwrap().activate(1.0);

        simulator.step(&mut lattice);

        let stats = SimulationStats::from_lattice(&lattice);
        assert_eq!(stats.active, 26);
        assert_eq!(stats.relaxing, 1);
        assert_eq!(lattice.get(1, 1, 1).unwrap().state, CellState::Relaxing);
        for idx in 0..lattice.volume() {
            let (i, j, k) = lattice.coords(idx);
            if (i, j, k) != (1, 1, 1) {
                let cell = lattice.cells()[idx];
                assert_eq!(cell.state, CellState::Active);
                assert_eq!(cell.value, config.threshold);
            }
        }
    }

    #[test]
    fn test_relax_influence_blocks_activation() {
        // One active and one relaxing neighbor at equal distance contribute
        // equal weight, so relax < activity fails and the cell stays idle.
        let config = SimulationConfig {
            width: 3,
            height: 1,
            depth: 1,
            sens_radius: 1,
            activity_floor: 0.001,
            trigger_probability: 1.0,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(0, 0, 0).unwrap().activate(1.0);
        let relaxing = lattice.get_mut(2, 0, 0).unwrap();
        relaxing.state = CellState::Relaxing;
        relaxing.value = 1.0;

        simulator.step(&mut lattice);
        assert_eq!(lattice.get(1, 0, 0).unwrap().state, CellState::Idle);
    }

    #[test]
    fn test_below_activity_floor_stays_idle() {
        // Default floor 0.008 exceeds a single neighbor's peak weight
        // (1 / (2 pi 25) ~ 0.0064), so one spike cannot propagate.
        let config = SimulationConfig {
            trigger_probability: 1.0,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(2, 2, 2).unwrap().activate(1.0);

        simulator.step(&mut lattice);
        let stats = SimulationStats::from_lattice(&lattice);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.relaxing, 1);
    }

    #[test]
    fn test_idle_value_not_decayed() {
        let config = test_config();
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        lattice.get_mut(0, 0, 0).unwrap().value = 0.5;

        simulator.run(&mut lattice, 5);
        let cell = *lattice.get(0, 0, 0).unwrap();
        assert_eq!(cell.state, CellState::Idle);
        assert_eq!(cell.value, 0.5);
    }

    #[test]
    fn test_zero_volume_step_is_noop() {
        let config = SimulationConfig {
            width: 0,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        simulator.step(&mut lattice);
        assert_eq!(lattice.volume(), 0);
        assert_eq!(simulator.step_count(), 0);
    }

    #[test]
    fn test_read_phase_is_order_independent() {
        let config = SimulationConfig {
            activity_floor: 0.001,
            trigger_probability: 0.5,
            ..test_config()
        };
        let mut simulator = Simulator::new(config.clone()).unwrap();
        let mut lattice = lattice_for(&config);
        simulator
            .seed_region(
                &mut lattice,
                &SeedSpec {
                    center: (2, 2, 2),
                    radius: 2,
                    probability: 0.4,
                },
            )
            .unwrap();
        simulator.step(&mut lattice);

        let kernel = Kernel::build(&config);
        let step_seed = 0xDEAD_BEEF;

        let forward: Vec<Cell> = (0..lattice.volume())
            .map(|idx| next_cell(&lattice, &kernel, &config, idx, step_seed))
            .collect();
        let mut reversed: Vec<Cell> = (0..lattice.volume())
            .rev()
            .map(|idx| next_cell(&lattice, &kernel, &config, idx, step_seed))
            .collect();
        reversed.reverse();

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let config = SimulationConfig {
            activity_floor: 0.001,
            ..test_config()
        };
        let spec = SeedSpec {
            center: (2, 2, 2),
            radius: 2,
            probability: 0.5,
        };

        let run = |config: &SimulationConfig| {
            let mut simulator = Simulator::new(config.clone()).unwrap();
            let mut lattice = lattice_for(config);
            simulator.seed_region(&mut lattice, &spec).unwrap();
            simulator.run(&mut lattice, 10);
            lattice
        };

        assert_eq!(run(&config), run(&config));
    }

    #[test]
    fn test_stats_counts() {
        let mut lattice = Lattice::new(3, 1, 1);
        lattice.get_mut(0, 0, 0).unwrap().activate(1.0);
        let relaxing = lattice.get_mut(1, 0, 0).unwrap();
        relaxing.state = CellState::Relaxing;
        relaxing.value = -0.5;

        let stats = SimulationStats::from_lattice(&lattice);
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.relaxing, 1);
        assert_eq!(stats.min_value, -0.5);
        assert_eq!(stats.max_value, 1.0);
    }

    proptest! {
        #[test]
        fn prop_same_seed_runs_agree(
            width in 1usize..5,
            height in 1usize..5,
            depth in 1usize..5,
            sens_radius in 0usize..3,
            seed in any::<u64>(),
            probability in 0.0f32..=1.0,
        ) {
            let config = SimulationConfig {
                width,
                height,
                depth,
                sens_radius,
                activity_floor: 0.001,
                trigger_probability: 0.5,
                random_seed: Some(seed),
                ..test_config()
            };
            let spec = SeedSpec {
                center: (width / 2, height / 2, depth / 2),
                radius: 1,
                probability,
            };

            let run = || {
                let mut simulator = Simulator::new(config.clone()).unwrap();
                let mut lattice = Lattice::new(width, height, depth);
                simulator.seed_region(&mut lattice, &spec).unwrap();
                simulator.run(&mut lattice, 3);
                lattice
            };

            prop_assert_eq!(run(), run());
        }

        #[test]
        fn prop_read_phase_traversal_order_irrelevant(
            step_seed in any::<u64>(),
            active_idx in 0usize..27,
        ) {
            let config = SimulationConfig {
                width: 3,
                height: 3,
                depth: 3,
                sens_radius: 1,
                activity_floor: 0.001,
                trigger_probability: 0.5,
                ..test_config()
            };
            let kernel = Kernel::build(&config);
            let mut lattice = Lattice::new(3, 3, 3);
            let (i, j, k) = lattice.coords(active_idx);
            lattice.get_mut(i, j, k).unwrap().activate(1.0);

            let forward: Vec<Cell> = (0..27)
                .map(|idx| next_cell(&lattice, &kernel, &config, idx, step_seed))
                .collect();
            let mut reversed: Vec<Cell> = (0..27)
                .rev()
                .map(|idx| next_cell(&lattice, &kernel, &config, idx, step_seed))
                .collect();
            reversed.reverse();

            prop_assert_eq!(forward, reversed);
        }
    }
}
