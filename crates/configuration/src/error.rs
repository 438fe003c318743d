use thiserror::Error;

/// Why a seedbed configuration could not be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file or an environment override could not be read or deserialized,
    /// including an unknown generator `kind`.
    #[error("Could not read the seedbed configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// The configuration parsed but describes tables seedbed cannot generate.
    #[error("Invalid table configuration: {0}")]
    ValidationError(String),
}
