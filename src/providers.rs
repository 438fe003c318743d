//! Turns the declarative `[[tables]]` configuration into table definitions
//! whose fields carry ready-to-run value providers.

use chrono::{NaiveDateTime, TimeDelta};
use configuration::{FieldSettings, GeneratorSettings, TableSettings};
use core_types::{FieldDefinition, TableDefinition, Value, ValueProvider, deferred, immediate, try_immediate};
use database::DataGenerator;
use rand::Rng;
use rand::distr::Uniform;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// SQLite's own `datetime()` text format.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `reference` generators capture a clone of `generator` to look up ids at run time.
pub fn build_tables(tables: &[TableSettings], generator: &DataGenerator) -> Vec<TableDefinition> {
    tables
        .iter()
        .map(|table| TableDefinition {
            name: table.name.clone(),
            fields: table
                .fields
                .iter()
                .map(|field| build_field(field, generator))
                .collect(),
            num_rows: table.rows,
        })
        .collect()
}

fn build_field(field: &FieldSettings, generator: &DataGenerator) -> FieldDefinition {
    let definition = match &field.name {
        Some(name) => FieldDefinition::new(name.clone(), field.sql_type.clone()),
        None => FieldDefinition::clause(field.sql_type.clone()),
    };

    match &field.generator {
        Some(settings) => definition.with_shared_generator(build_provider(settings, generator)),
        None => definition,
    }
}

pub fn build_provider(settings: &GeneratorSettings, generator: &DataGenerator) -> Arc<dyn ValueProvider> {
    match settings.clone() {
        GeneratorSettings::Constant { value } => Arc::new(value),
        GeneratorSettings::Sequence { start, step } => {
            let next = AtomicI64::new(start);
            Arc::new(immediate(move || next.fetch_add(step, Ordering::Relaxed)))
        }
        GeneratorSettings::OneOf { values } => Arc::new(immediate(move || {
            let index = rand::rng().random_range(0..values.len());
            values[index].clone()
        })),
        GeneratorSettings::IntRange { min, max } => {
            Arc::new(immediate(move || rand::rng().random_range(min..=max)))
        }
        GeneratorSettings::FloatRange { min, max } => {
            let range = Uniform::new_inclusive(min, max)
                .map_err(|e| format!("float_range {}..={} cannot be sampled: {}", min, max, e));
            Arc::new(try_immediate(move || {
                range
                    .as_ref()
                    .map(|range| rand::rng().sample::<f64, _>(range))
                    .map_err(Clone::clone)
            }))
        }
        GeneratorSettings::Timestamp { start, end } => {
            Arc::new(immediate(move || random_timestamp(start, end)))
        }
        GeneratorSettings::Uuid => Arc::new(immediate(|| uuid::Uuid::new_v4().to_string())),
        GeneratorSettings::Reference { table, filter } => {
            let generator = generator.clone();
            Arc::new(deferred(move || {
                let generator = generator.clone();
                let table = table.clone();
                let filter = filter.clone();
                async move {
                    let id = generator.get_random_id_from_table(&table, &filter).await?;
                    Ok::<Value, database::DbError>(id.into())
                }
            }))
        }
    }
}

fn random_timestamp(start: NaiveDateTime, end: NaiveDateTime) -> String {
    let span = (end - start).num_seconds();
    let offset = rand::rng().random_range(0..=span);
    (start + TimeDelta::seconds(offset))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
