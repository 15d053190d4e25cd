//! Spiking lattice CLI - run simulations from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use spike_lattice::{
    compute::{Lattice, SimulationStats, Simulator},
    schema::{Seed, SimulationConfig},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [steps]", args[0]);
        eprintln!();
        eprintln!("Run a spiking lattice simulation from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  steps        Number of simulation steps (default: 100)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let steps: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: SimulationConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    // Load or create seed
    let seed_path = config_path.with_extension("seed.json");
    let seed: Seed = if seed_path.exists() {
        let seed_str = fs::read_to_string(&seed_path).unwrap_or_else(|e| {
            eprintln!("Error reading seed file: {}", e);
            std::process::exit(1);
        });
        serde_json::from_str(&seed_str).unwrap_or_else(|e| {
            eprintln!("Error parsing seed: {}", e);
            std::process::exit(1);
        })
    } else {
        Seed::default()
    };

    println!("Spiking Lattice Simulation");
    println!("==========================");
    println!(
        "Lattice: {}x{}x{} ({} cells)",
        config.width,
        config.height,
        config.depth,
        config.volume()
    );
    println!("Sensing radius: {}", config.sens_radius);
    println!("Seed regions: {}", seed.regions.len());
    println!("Steps: {}", steps);
    println!();

    // Initialize
    let mut simulator = Simulator::new(config.clone()).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    let mut lattice = Lattice::new(config.width, config.height, config.depth);

    for region in &seed.regions {
        simulator
            .seed_region(&mut lattice, region)
            .unwrap_or_else(|e| {
                eprintln!("Invalid seed region: {}", e);
                std::process::exit(1);
            });
    }

    let initial = SimulationStats::from_lattice(&lattice);
    println!("Initial state:");
    println!(
        "  idle={} active={} relaxing={}",
        initial.idle, initial.active, initial.relaxing
    );
    println!();

    // Run simulation
    println!("Running simulation...");
    let start = Instant::now();

    for i in 0..steps {
        simulator.step(&mut lattice);

        // Print progress every 10%
        if (i + 1) % (steps / 10).max(1) == 0 {
            let stats = SimulationStats::from_lattice(&lattice);
            let elapsed = start.elapsed().as_secs_f32();
            let steps_per_sec = (i + 1) as f32 / elapsed;
            println!(
                "  Step {}/{}: active={}, relaxing={}, {:.1} steps/s",
                i + 1,
                steps,
                stats.active,
                stats.relaxing,
                steps_per_sec
            );
        }
    }

    let elapsed = start.elapsed();
    let final_stats = SimulationStats::from_lattice(&lattice);

    println!();
    println!("Final state:");
    println!(
        "  idle={} active={} relaxing={}",
        final_stats.idle, final_stats.active, final_stats.relaxing
    );
    println!(
        "  Value range: [{:.6}, {:.6}]",
        final_stats.min_value, final_stats.max_value
    );
    println!();
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        steps as f32 / elapsed.as_secs_f32()
    );
}

fn print_example_config() {
    let config = SimulationConfig::default();
    let seed = Seed::default();

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config).unwrap());
    println!();
    println!("Example seed (config.seed.json):");
    println!("{}", serde_json::to_string_pretty(&seed).unwrap());
}
