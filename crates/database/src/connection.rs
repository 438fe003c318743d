use crate::error::DbError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;

/// Builds connection options for the SQLite database at `url`.
///
/// Accepts either a `sqlite:` URL (`sqlite://seed.db`, `sqlite::memory:`) or a
/// bare file path. The database file is created if it does not exist yet.
pub fn connect_options(url: &str) -> Result<SqliteConnectOptions, DbError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DbError::ConnectionConfigError(
            "database url must not be empty".to_string(),
        ));
    }

    let options = if url.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::ConnectionConfigError(format!("{}: {}", url, e)))?
    } else {
        SqliteConnectOptions::new().filename(url)
    };

    Ok(options.create_if_missing(true))
}

/// Options for a private in-memory database, gone once the connection closes.
pub fn in_memory_options() -> SqliteConnectOptions {
    SqliteConnectOptions::new().in_memory(true)
}

/// Opens a single connection.
///
/// sqlx's own statement logging is disabled; statements are reported through
/// the generator's `DiagnosticSink` instead.
pub async fn connect(options: &SqliteConnectOptions) -> Result<SqliteConnection, DbError> {
    let connection = options
        .clone()
        .disable_statement_logging()
        .connect()
        .await?;
    Ok(connection)
}

/// Closes a connection, reporting any error the driver raises while doing so.
pub async fn disconnect(connection: SqliteConnection) -> Result<(), DbError> {
    connection.close().await?;
    Ok(())
}
