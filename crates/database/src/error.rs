use core_types::GeneratorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("The database connection is not open; call connect() first.")]
    NotConnected,

    #[error("The database connection has been closed and cannot be reopened.")]
    ConnectionClosed,

    #[error("Error creating table {table}: {source}")]
    SchemaError { table: String, source: sqlx::Error },

    #[error("Error generating data for field {field} in table {table}: {source}")]
    DataGenerationError {
        field: String,
        table: String,
        source: GeneratorError,
    },

    #[error("Error inserting data into table {table}: {source}")]
    InsertError { table: String, source: sqlx::Error },

    #[error("Error querying table {table}: {source}")]
    QueryError { table: String, source: sqlx::Error },
}
