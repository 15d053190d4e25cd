//! Grid-based spiking cellular automaton on a 3D neuron lattice.
//!
//! Cells occupy a fixed lattice and cycle through three states. An idle cell
//! can be excited by spiking neighbors; once active it spikes for exactly one
//! step and then relaxes, decaying until it returns to idle. Neighbor
//! influence is weighted by a precomputed spatial kernel, and every step
//! commits through a staging buffer, so the update is independent of cell
//! traversal order.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration and seeding types for simulations
//! - `compute`: The lattice, kernel, stepper, and threaded driver
//!
//! Rendering is an external collaborator: the core only exports flat
//! per-cell position and color arrays (see [`compute::Driver`]) and accepts
//! step/seed/run/stop commands.
//!
//! # Example
//!
//! ```rust
//! use spike_lattice::{
//!     compute::{Lattice, SimulationStats, Simulator},
//!     schema::{SeedSpec, SimulationConfig},
//! };
//!
//! let config = SimulationConfig {
//!     width: 16,
//!     height: 16,
//!     depth: 16,
//!     random_seed: Some(7),
//!     ..SimulationConfig::default()
//! };
//!
//! let mut lattice = Lattice::new(config.width, config.height, config.depth);
//! let mut simulator = Simulator::new(config).expect("valid configuration");
//!
//! simulator
//!     .seed_region(
//!         &mut lattice,
//!         &SeedSpec {
//!             center: (8, 8, 8),
//!             radius: 3,
//!             probability: 0.1,
//!         },
//!     )
//!     .expect("valid probability");
//!
//! simulator.run(&mut lattice, 20);
//!
//! let stats = SimulationStats::from_lattice(&lattice);
//! println!("idle={} active={} relaxing={}", stats.idle, stats.active, stats.relaxing);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Driver, Kernel, Lattice, SimulationStats, Simulator, Snapshot};
pub use schema::{Seed, SeedSpec, SimulationConfig};
