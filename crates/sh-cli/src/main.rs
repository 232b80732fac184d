//! CLI driver for the Sternhafen economic simulation.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "sternhafen",
    about = "Sternhafen: deterministic planetary economy simulation",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the economy over a world snapshot and print a report
    Simulate {
        /// World snapshot (JSON) to simulate
        #[arg(short, long)]
        world: PathBuf,

        /// Economy config (JSON); defaults are used for missing fields
        #[arg(short, long, conflicts_with = "load_state")]
        config: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10")]
        ticks: u64,

        /// RNG seed for deterministic simulation
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// In-world hours per tick (overrides the config)
        #[arg(long, conflicts_with = "load_state")]
        hours: Option<f64>,

        /// Show the full event log, not just notable events
        #[arg(short, long)]
        verbose: bool,

        /// Write the engine state (tables and routes) here after the run
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Restore engine state (tables, routes and tick length) from this
        /// file before the run
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Write the world snapshot here after the run
        #[arg(long)]
        save_world: Option<PathBuf>,
    },

    /// Write a small sample world snapshot
    DemoWorld {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the default economy config
    DefaultConfig {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Simulate {
            world,
            config,
            ticks,
            seed,
            hours,
            verbose,
            save_state,
            load_state,
            save_world,
        } => commands::simulate::run(&commands::simulate::SimulateArgs {
            world,
            config,
            ticks,
            seed,
            hours,
            verbose,
            save_state,
            load_state,
            save_world,
        }),
        Commands::DemoWorld { output } => commands::demo_world::run(output.as_deref()),
        Commands::DefaultConfig { output } => commands::default_config::run(output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
