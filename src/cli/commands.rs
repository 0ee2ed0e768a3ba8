use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::simulation::SimulationConfig;
use crate::config::species::SpeciesTable;
use crate::config::ConfigError;
use crate::simulation::statistics::{summary_line, StepStatistics};
use crate::simulation::Simulation;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "ecogrid.toml";

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Cannot write statistics to {}: {source}", path.display())]
    StatsOutput { path: PathBuf, source: io::Error },

    #[error("Cannot write report: {0}")]
    Report(#[from] io::Error),

    #[error("Cannot encode statistics: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Driver settings resolved from config and command-line overrides.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub steps: u64,
    pub delay: Duration,
    pub report_interval: u64,
    pub stats_out: Option<PathBuf>,
}

impl RunOptions {
    pub fn from_config(config: &SimulationConfig) -> Self {
        RunOptions {
            steps: config.steps,
            delay: Duration::from_millis(config.delay_ms),
            report_interval: config.report_interval,
            stats_out: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StepsCompleted,
    /// One of the two designated species died out.
    NotViable,
}

#[derive(Debug)]
pub struct RunSummary {
    pub seed: u64,
    pub steps_run: u64,
    pub stop_reason: StopReason,
    pub final_statistics: StepStatistics,
}

/// Load `path`, or fall back to built-in defaults when no path was given
/// and the default file does not exist.
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig, ConfigError> {
    match path {
        Some(path) => SimulationConfig::from_file(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                SimulationConfig::from_file(default_path)
            } else {
                info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                Ok(SimulationConfig::default())
            }
        }
    }
}

/// Run the simulation for up to `options.steps` steps, stopping early once it
/// is no longer viable. Viability is only checked between steps.
///
/// A text line is written to `report` for the initial state and every
/// `report_interval` steps; with `stats_out` set, every step is also
/// appended there as one JSON object per line.
pub fn run_simulation(
    config: &SimulationConfig,
    options: &RunOptions,
    report: &mut impl Write,
) -> Result<RunSummary, RunError> {
    let mut sim = Simulation::new(config);
    info!(
        seed = sim.seed(),
        steps = options.steps,
        depth = config.depth,
        width = config.width,
        "Simulation starting"
    );

    let mut stats_writer = match &options.stats_out {
        Some(path) => {
            let file = File::create(path).map_err(|source| RunError::StatsOutput {
                path: path.clone(),
                source,
            })?;
            Some(BufWriter::new(file))
        }
        None => None,
    };

    let mut latest = sim.statistics();
    writeln!(report, "{}", summary_line(&latest))?;
    if let Some(writer) = stats_writer.as_mut() {
        write_stats_line(writer, &latest)?;
    }

    let interval = options.report_interval.max(1);
    let mut stop_reason = StopReason::StepsCompleted;

    for n in 1..=options.steps {
        if !sim.is_viable() {
            stop_reason = StopReason::NotViable;
            break;
        }
        let step_start = Instant::now();

        latest = sim.step().statistics;

        if n % interval == 0 || n == options.steps {
            writeln!(report, "{}", summary_line(&latest))?;
        }
        if let Some(writer) = stats_writer.as_mut() {
            write_stats_line(writer, &latest)?;
        }

        // Rate limiting: sleep what is left of the step delay
        let elapsed = step_start.elapsed();
        if elapsed < options.delay {
            std::thread::sleep(options.delay - elapsed);
        }
    }

    if let Some(mut writer) = stats_writer {
        writer.flush().map_err(|source| RunError::StatsOutput {
            path: options.stats_out.clone().unwrap_or_default(),
            source,
        })?;
    }

    match stop_reason {
        StopReason::StepsCompleted => info!(steps = sim.step_count(), "Simulation finished"),
        StopReason::NotViable => warn!(
            steps = sim.step_count(),
            pair = ?config.viability,
            "Simulation no longer viable"
        ),
    }

    Ok(RunSummary {
        seed: sim.seed(),
        steps_run: sim.step_count(),
        stop_reason,
        final_statistics: latest,
    })
}

fn write_stats_line(writer: &mut impl Write, stats: &StepStatistics) -> Result<(), RunError> {
    serde_json::to_writer(&mut *writer, stats)?;
    writeln!(writer)?;
    Ok(())
}

/// Print the effective species table as JSON.
pub fn print_species(table: &SpeciesTable, out: &mut impl Write) -> Result<(), RunError> {
    serde_json::to_writer_pretty(&mut *out, table)?;
    writeln!(out)?;
    Ok(())
}
