use crate::error::ConfigError;
use chrono::NaiveDateTime;
use core_types::Value;
use serde::Deserialize;
use std::collections::HashSet;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Tables are created and populated in the order they appear.
    #[serde(default)]
    pub tables: Vec<TableSettings>,
}

/// Where the generated data goes.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// A `sqlite:` URL or a plain file path (e.g. "sqlite://seed.db").
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset (e.g. "info", "seedbed::sql=debug").
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// One table to create and fill.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub name: String,
    /// Number of example rows to insert.
    #[serde(default)]
    pub rows: usize,
    #[serde(default)]
    pub fields: Vec<FieldSettings>,
}

/// One column, or a bare clause when `name` is omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sql_type: String,
    #[serde(default)]
    pub generator: Option<GeneratorSettings>,
}

/// How values for a field are produced, selected by the `kind` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSettings {
    /// The same literal for every row.
    Constant { value: Value },
    /// `start`, `start + step`, ...
    Sequence {
        #[serde(default = "default_one")]
        start: i64,
        #[serde(default = "default_one")]
        step: i64,
    },
    /// A uniformly random pick from `values`.
    OneOf { values: Vec<Value> },
    /// A uniformly random integer in `min..=max`.
    IntRange { min: i64, max: i64 },
    /// A uniformly random float in `min..=max`.
    FloatRange { min: f64, max: f64 },
    /// A random timestamp in `start..=end`, stored as ISO-8601 text.
    Timestamp {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// A random v4 UUID as text.
    Uuid,
    /// The id of a random row of an earlier table, optionally filtered.
    Reference {
        table: String,
        #[serde(default)]
        filter: String,
    },
}

fn default_one() -> i64 {
    1
}

impl Config {
    /// Checks everything that would otherwise only fail halfway through a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(invalid("database.url must not be empty".to_string()));
        }

        let mut declared: HashSet<&str> = HashSet::new();
        for table in &self.tables {
            if table.name.trim().is_empty() {
                return Err(invalid("every table needs a name".to_string()));
            }
            if table.fields.is_empty() {
                return Err(invalid(format!("table '{}' has no fields", table.name)));
            }
            for field in &table.fields {
                validate_field(table, field, &declared)?;
            }
            if !declared.insert(table.name.as_str()) {
                return Err(invalid(format!("table '{}' is declared twice", table.name)));
            }
        }
        Ok(())
    }
}

fn validate_field(
    table: &TableSettings,
    field: &FieldSettings,
    earlier_tables: &HashSet<&str>,
) -> Result<(), ConfigError> {
    let label = field.name.as_deref().unwrap_or("<clause>");
    if field.sql_type.trim().is_empty() {
        return Err(invalid(format!(
            "field '{}' in table '{}' has an empty type",
            label, table.name
        )));
    }

    let Some(generator) = &field.generator else {
        return Ok(());
    };
    if field.name.as_deref().is_none_or(str::is_empty) {
        return Err(invalid(format!(
            "a clause in table '{}' has a generator but no name to insert into",
            table.name
        )));
    }

    let problem = match generator {
        GeneratorSettings::Sequence { step: 0, .. } => Some("sequence step must not be zero".to_string()),
        GeneratorSettings::OneOf { values } if values.is_empty() => {
            Some("one_of needs at least one value".to_string())
        }
        GeneratorSettings::IntRange { min, max } if min > max => {
            Some(format!("int_range min {} is greater than max {}", min, max))
        }
        GeneratorSettings::FloatRange { min, max } if !min.is_finite() || !max.is_finite() => {
            Some(format!("float_range bounds must be finite, got {} and {}", min, max))
        }
        GeneratorSettings::FloatRange { min, max } if min > max => {
            Some(format!("float_range min {} is greater than max {}", min, max))
        }
        // Sampling needs `max - min` to be representable.
        GeneratorSettings::FloatRange { min, max } if !(max - min).is_finite() => {
            Some(format!("float_range from {} to {} is too wide to sample", min, max))
        }
        GeneratorSettings::Timestamp { start, end } if start > end => {
            Some(format!("timestamp start {} is after end {}", start, end))
        }
        GeneratorSettings::Reference { table: target, .. } if !earlier_tables.contains(target.as_str()) => {
            Some(format!(
                "reference to '{}' must point at a table declared earlier",
                target
            ))
        }
        _ => None,
    };

    match problem {
        Some(problem) => Err(invalid(format!(
            "field '{}' in table '{}': {}",
            label, table.name, problem
        ))),
        None => Ok(()),
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}
