/*
 * 3D Boid Flocking Simulation - Headless Host
 *
 * This binary plays the part of the host application: it builds the model
 * from parameters, calls the tick entry point once per frame with a fixed
 * delta time, and logs flock statistics as the simulation runs.
 *
 * Parameters come from an optional JSON file, then command line overrides.
 * Log verbosity follows RUST_LOG (e.g. RUST_LOG=boids3d=debug).
 */

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use boids3d::{Model, SimulationParams};

#[derive(Parser, Debug)]
#[command(name = "boids3d", about = "Run a headless 3D boid flocking simulation")]
struct Args {
    /// JSON file with simulation parameters; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of boids to spawn
    #[arg(long)]
    boids: Option<usize>,

    /// Seed for the spawn generator
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Delta time per tick in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Update boids on a single thread
    #[arg(long)]
    sequential: bool,

    /// Log flock statistics every N ticks
    #[arg(long, default_value_t = 60)]
    report_every: u64,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

fn load_params(args: &Args) -> Result<SimulationParams> {
    let mut params = match &args.config {
        Some(path) => SimulationParams::from_json_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => SimulationParams::default(),
    };

    if let Some(boids) = args.boids {
        params.num_boids = boids;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if args.sequential {
        params.enable_parallel = false;
    }
    Ok(params)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let params = load_params(&args)?;
    let mut model = Model::new(params).context("building the flock")?;

    let report_every = args.report_every.max(1);
    let started = Instant::now();

    for _ in 0..args.ticks {
        model.tick(args.dt);

        let stats = &model.debug_info;
        if stats.tick % report_every == 0 {
            info!(
                tick = stats.tick,
                occupied_cells = stats.occupied_cells,
                max_cell_occupancy = stats.max_cell_occupancy,
                mean_neighbors = stats.mean_neighbors,
                mean_speed = stats.mean_speed,
                outside_edge_buffer = stats.outside_edge_buffer,
                "flock statistics"
            );
        }
    }

    let elapsed = started.elapsed();
    info!(
        ticks = args.ticks,
        boids = model.boids.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "simulation finished"
    );
    Ok(())
}
