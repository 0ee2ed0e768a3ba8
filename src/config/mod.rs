pub mod simulation;
pub mod species;

use std::path::PathBuf;

/// Failure to load a simulation config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// One line per problem found.
    #[error("invalid configuration:\n{0}")]
    Invalid(String),
}
