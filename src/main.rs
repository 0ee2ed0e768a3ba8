use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use ecogrid::cli::commands::{self, RunOptions, StopReason};
use ecogrid::config::simulation::SimulationConfig;

#[derive(Parser)]
#[command(name = "ecogrid")]
#[command(about = "A grid-based multi-species ecosystem simulator")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to ecogrid.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a field and step it until the step budget runs out or it is no longer viable
    Run {
        /// Number of steps to run (overrides config)
        #[arg(short, long)]
        steps: Option<u64>,

        /// Random seed, 0 for a random one (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Delay between steps in milliseconds (overrides config)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Write per-step statistics as JSON lines to this file
        #[arg(long)]
        stats_out: Option<PathBuf>,
    },

    /// Validate the configuration file and exit
    CheckConfig,

    /// Print the effective species table
    Species,
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config_or_exit(path: Option<&Path>) -> SimulationConfig {
    match commands::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let mut config = load_config_or_exit(cli.config.as_deref());
    init_logging(&config.log_level, cli.log_json);

    match cli.command {
        Commands::Run {
            steps,
            seed,
            delay_ms,
            stats_out,
        } => {
            if let Some(seed) = seed {
                config.seed = seed;
            }
            let mut options = RunOptions::from_config(&config);
            if let Some(steps) = steps {
                options.steps = steps;
            }
            if let Some(delay_ms) = delay_ms {
                options.delay = Duration::from_millis(delay_ms);
            }
            options.stats_out = stats_out;

            let stdout = std::io::stdout();
            match commands::run_simulation(&config, &options, &mut stdout.lock()) {
                Ok(summary) => {
                    let reason = match summary.stop_reason {
                        StopReason::StepsCompleted => "step budget reached",
                        StopReason::NotViable => "no longer viable",
                    };
                    println!(
                        "\nStopped after {} step(s) ({}), seed {}",
                        summary.steps_run, reason, summary.seed
                    );
                }
                Err(e) => {
                    eprintln!("Simulation error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::CheckConfig => {
            println!(
                "Configuration OK: {}x{} field, {} step(s), viability pair {} + {}",
                config.depth, config.width, config.steps, config.viability[0], config.viability[1]
            );
        }

        Commands::Species => {
            let stdout = std::io::stdout();
            if let Err(e) = commands::print_species(&config.species, &mut stdout.lock()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
