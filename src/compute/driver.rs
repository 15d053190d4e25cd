//! Threaded control surface over the simulation.
//!
//! A dedicated worker thread exclusively owns the lattice and simulator;
//! the handle side exchanges commands over a channel and polls the latest
//! completed snapshot from a single shared slot. Steps are strictly
//! sequential: the worker commits one step fully before starting the next,
//! so a consumer never observes a partially committed lattice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info};

use super::{Lattice, Simulator, Snapshot, snapshot};
use crate::schema::{ConfigError, SeedSpec, SimulationConfig};

enum Command {
    /// Run one step and acknowledge completion.
    Step(Sender<()>),
    /// Apply a seed region between steps and acknowledge the result.
    Seed(SeedSpec, Sender<Result<(), ConfigError>>),
    /// Wake the worker after the running flag was raised.
    Run,
    Shutdown,
}

/// Handle to a simulation running on its own worker thread.
///
/// `run` and `stop` toggle continuous stepping; the flag is checked between
/// steps only, so `stop` never interrupts an in-flight step. Dropping the
/// handle shuts the worker down and joins it.
pub struct Driver {
    commands: Sender<Command>,
    running: Arc<AtomicBool>,
    latest: Arc<Mutex<Snapshot>>,
    positions: Vec<f32>,
    worker: Option<JoinHandle<()>>,
}

impl Driver {
    /// Validate the configuration, create the lattice, and spawn the worker.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let simulator = Simulator::new(config.clone())?;
        let lattice = Lattice::new(config.width, config.height, config.depth);

        let positions = snapshot::positions_of(&lattice);
        let latest = Arc::new(Mutex::new(Snapshot::capture(&lattice, 0)));
        let running = Arc::new(AtomicBool::new(false));
        let (commands, receiver) = mpsc::channel();

        let worker = Worker {
            simulator,
            lattice,
            running: Arc::clone(&running),
            latest: Arc::clone(&latest),
            commands: receiver,
        };
        let handle = thread::spawn(move || worker.run());

        Ok(Self {
            commands,
            running,
            latest,
            positions,
            worker: Some(handle),
        })
    }

    /// Run exactly one step synchronously.
    pub fn step(&self) {
        let (ack, done) = mpsc::channel();
        if self.commands.send(Command::Step(ack)).is_ok() {
            let _ = done.recv();
        }
    }

    /// Apply a seed region between steps, synchronously.
    ///
    /// The refreshed snapshot is published before this returns, so the
    /// activation is visible without running a step.
    pub fn seed_region(&self, spec: &SeedSpec) -> Result<(), ConfigError> {
        let (ack, done) = mpsc::channel();
        if self.commands.send(Command::Seed(spec.clone(), ack)).is_err() {
            debug!("seed_region: worker disconnected");
            return Ok(());
        }
        done.recv().unwrap_or(Ok(()))
    }

    /// Begin continuous stepping until `stop`.
    pub fn run(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            let _ = self.commands.send(Command::Run);
            info!("continuous stepping started");
        }
    }

    /// Stop continuous stepping. An in-flight step always completes; only
    /// the next step is prevented.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("continuous stepping stopped");
        }
    }

    /// Whether continuous stepping is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Per-cell (x, y, z) triples in fixed iteration order. Invariant for the
    /// simulation's lifetime; computed once at construction.
    pub fn positions(&self) -> Vec<f32> {
        self.positions.clone()
    }

    /// Per-cell (r, g, b) triples of the latest completed step.
    pub fn colors(&self) -> Vec<f32> {
        self.latest_snapshot().colors
    }

    /// The latest completed snapshot. Non-blocking; if no step has completed
    /// since the last poll, the previous snapshot is returned again.
    pub fn latest_snapshot(&self) -> Snapshot {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker-thread side: exclusive owner of the lattice and simulator.
struct Worker {
    simulator: Simulator,
    lattice: Lattice,
    running: Arc<AtomicBool>,
    latest: Arc<Mutex<Snapshot>>,
    commands: Receiver<Command>,
}

impl Worker {
    fn run(mut self) {
        loop {
            // While free-running, poll for commands between steps; otherwise
            // block until one arrives.
            let command = if self.running.load(Ordering::Acquire) {
                match self.commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match self.commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            };

            match command {
                Some(Command::Step(ack)) => {
                    self.advance();
                    let _ = ack.send(());
                }
                Some(Command::Seed(spec, ack)) => {
                    let result = self.simulator.seed_region(&mut self.lattice, &spec);
                    self.publish();
                    let _ = ack.send(result);
                }
                Some(Command::Run) => {}
                Some(Command::Shutdown) => break,
                None => self.advance(),
            }
        }
        debug!("worker shut down after {} steps", self.simulator.step_count());
    }

    fn advance(&mut self) {
        self.simulator.step(&mut self.lattice);
        self.publish();
    }

    fn publish(&self) {
        let snapshot = Snapshot::capture(&self.lattice, self.simulator.step_count());
        *self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}
