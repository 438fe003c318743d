use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, DatabaseSettings, FieldSettings, GeneratorSettings, LoggingSettings, TableSettings,
};

/// Environment variables with this prefix override file values, using `__`
/// between path segments (e.g. `SEEDBED__DATABASE__URL`).
pub const ENV_PREFIX: &str = "SEEDBED";

/// Loads and validates the configuration at `path`.
///
/// This function is the primary entry point for this crate. It reads the file,
/// layers environment overrides on top, deserializes the result into our
/// strongly-typed `Config` struct and checks it before returning it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), tables = config.tables.len(), "Configuration loaded.");
    Ok(config)
}

/// Parses and validates a configuration held in memory. No environment overrides apply.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}
