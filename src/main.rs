mod analysis;
mod conditions;
mod report;

use analysis::{run_cantilever, run_twist};
use clap::{Parser, Subcommand};
use conditions::{CantileverProperties, TwistProperties};
use report::render_summary;
use rodrelax::SolverConfig;
use std::{error::Error, fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rodrelax", version, about = "Relax elastic rods towards equilibrium")]
struct Cli {
    /// Solver settings as JSON (defaults are used for missing keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    demo: DemoCommand,
}

#[derive(Subcommand, Debug)]
enum DemoCommand {
    /// Rod clamped at one end with a transverse load at the other
    Cantilever {
        /// Transverse tip load in newtons
        #[arg(long, default_value_t = 1.0e-3)]
        load: f64,
        /// Number of handle sections
        #[arg(long, default_value_t = 5)]
        handles: usize,
    },
    /// Rod clamped at both ends with the far end turned about its axis
    Twist {
        /// End rotation in radians
        #[arg(long, default_value_t = 0.5)]
        angle: f64,
        /// Number of handle sections
        #[arg(long, default_value_t = 5)]
        handles: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG selects the verbosity, e.g. `RUST_LOG=rodrelax=debug` to follow
    // every kinetic energy peak.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SolverConfig::from_json(&fs::read_to_string(path)?)?,
        None => SolverConfig::default(),
    };

    // Dynamic relaxation follows a fictitious motion until the kinetic energy
    // vanishes, which is the static equilibrium we are after.
    // See: https://en.wikipedia.org/wiki/Dynamic_relaxation
    let summary = match cli.demo {
        DemoCommand::Cantilever { load, handles } => run_cantilever(
            CantileverProperties {
                tip_load: load,
                handles,
                ..CantileverProperties::default()
            },
            config,
        )?,
        DemoCommand::Twist { angle, handles } => run_twist(
            TwistProperties {
                angle,
                handles,
                ..TwistProperties::default()
            },
            config,
        )?,
    };

    println!("{}", render_summary(&summary));
    Ok(())
}
