use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::species::SpeciesTable;
use crate::config::ConfigError;
use crate::world::Species;

/// One link in the seeding chain: the chance that a cell not yet claimed by
/// an earlier entry receives a member of `species`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub species: Species,
    pub probability: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_steps")]
    pub steps: u64,
    /// 0 picks a random seed at startup.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// The simulation stops once either species has no living member.
    #[serde(default = "default_viability")]
    pub viability: [Species; 2],
    #[serde(default = "default_population")]
    pub population: Vec<PopulationEntry>,
    #[serde(default)]
    pub species: SpeciesTable,
}

fn default_depth() -> usize {
    80
}
fn default_width() -> usize {
    120
}
fn default_steps() -> u64 {
    700
}
fn default_delay_ms() -> u64 {
    50
}
fn default_report_interval() -> u64 {
    1
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_viability() -> [Species; 2] {
    [Species::Hare, Species::Wolf]
}
fn default_population() -> Vec<PopulationEntry> {
    [
        (Species::Wolf, 0.03),
        (Species::Hare, 0.08),
        (Species::Deer, 0.02),
        (Species::Bear, 0.01),
        (Species::Owl, 0.06),
        (Species::Berry, 0.08),
        (Species::Acorn, 0.04),
    ]
    .into_iter()
    .map(|(species, probability)| PopulationEntry {
        species,
        probability,
    })
    .collect()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            depth: default_depth(),
            width: default_width(),
            steps: default_steps(),
            seed: 0,
            delay_ms: default_delay_ms(),
            report_interval: default_report_interval(),
            log_level: default_log_level(),
            viability: default_viability(),
            population: default_population(),
            species: SpeciesTable::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, ConfigError> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                path: source_path.to_path_buf(),
                source,
            })?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.depth == 0 {
            errors.push("depth must be > 0, got 0. Example: depth = 80".to_string());
        }

        if self.width == 0 {
            errors.push("width must be > 0, got 0. Example: width = 120".to_string());
        }

        if self.report_interval == 0 {
            errors.push(
                "report_interval must be > 0, got 0. Example: report_interval = 10".to_string(),
            );
        }

        for entry in &self.population {
            if !(0.0..=1.0).contains(&entry.probability) {
                errors.push(format!(
                    "population probability for {} must be 0.0-1.0, got {}. Example: probability = 0.05",
                    entry.species, entry.probability
                ));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if let Err(species_errors) = self.species.validate() {
            errors.push(species_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
