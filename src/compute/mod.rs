//! Compute module - lattice state, the influence kernel, and the step
//! machinery.

mod driver;
mod kernel;
mod lattice;
mod simulator;
mod snapshot;

pub use driver::*;
pub use kernel::*;
pub use lattice::*;
pub use simulator::*;
pub use snapshot::*;
