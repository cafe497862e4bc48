use std::process;
use std::time::Duration;

use clap::Parser;

use juice_plant_simulator::logging::{init_logging, level_from_verbosity, LoggingConfig};
use juice_plant_simulator::{config, Pace, Result, Simulation, SimulationConfig};

/// Simula plantas de jugo que convierten naranjas en botellas.
#[derive(Parser, Debug)]
#[command(name = "juice-plant-simulator", version, about)]
struct Cli {
    /// Número de plantas independientes
    #[arg(long, default_value_t = config::NUM_PLANTS)]
    plants: usize,

    /// Trabajadores (hilos) por planta
    #[arg(long, default_value_t = config::PLANT_THREADS)]
    workers: usize,

    /// Tiempo que trabajan las plantas, en milisegundos
    #[arg(long, default_value_t = config::processing_time().as_millis() as u64)]
    duration_ms: u64,

    /// Más detalle en el log (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Solo errores en el log
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn run(cli: Cli) -> Result<()> {
    init_logging(LoggingConfig {
        level: level_from_verbosity(cli.quiet, cli.verbose),
        ..LoggingConfig::default()
    })?;

    let simulation = Simulation::new(SimulationConfig {
        plant_count: cli.plants,
        workers_per_plant: cli.workers,
        processing_time: Duration::from_millis(cli.duration_ms),
        pace: Pace::Realtime,
    })?;

    let summary = simulation.run()?;
    print!("{}", summary.report());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        tracing::error!(error = %error, "la simulación falló");
        eprintln!("Error: {}", error);

        let code = match error.category() {
            "config" => 78,
            "lifecycle" | "transition" => 70,
            _ => 1,
        };
        process::exit(code);
    }
}
