use crate::connection;
use crate::error::DbError;
use crate::sink::{DiagnosticSink, StatementKind};
use crate::statement;
use core_types::{TableDefinition, Value};
use futures::future::try_join_all;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Row, TypeInfo, ValueRef};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lifecycle of the generator's single connection. `Closed` is terminal.
enum ConnectionState {
    Disconnected,
    Connected(SqliteConnection),
    Closed,
}

impl ConnectionState {
    fn connection(&mut self) -> Result<&mut SqliteConnection, DbError> {
        match self {
            ConnectionState::Connected(connection) => Ok(connection),
            ConnectionState::Disconnected => Err(DbError::NotConnected),
            ConnectionState::Closed => Err(DbError::ConnectionClosed),
        }
    }
}

/// Creates tables and fills them with generated rows over one SQLite connection.
///
/// Cloning is cheap and every clone shares the same connection, so a value
/// provider can capture a clone and call `get_random_id_from_table` to point a
/// foreign key at a table populated earlier in the same `generate` run.
#[derive(Clone)]
pub struct DataGenerator {
    options: SqliteConnectOptions,
    state: Arc<Mutex<ConnectionState>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
}

impl fmt::Debug for DataGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGenerator")
            .field("options", &self.options)
            .field("sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl DataGenerator {
    /// Creates a disconnected generator. Nothing is opened until `connect`.
    pub fn new(options: SqliteConnectOptions, sink: Option<Arc<dyn DiagnosticSink>>) -> Self {
        Self {
            options,
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            sink,
        }
    }

    /// Opens the connection. Calling it again while connected is a no-op.
    pub async fn connect(&self) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        match &*state {
            ConnectionState::Connected(_) => return Ok(()),
            ConnectionState::Closed => return Err(DbError::ConnectionClosed),
            ConnectionState::Disconnected => {}
        }

        let connection = connection::connect(&self.options).await?;
        *state = ConnectionState::Connected(connection);
        tracing::info!(
            database = %self.options.get_filename().display(),
            "Database connection established."
        );
        Ok(())
    }

    /// Closes the connection for good.
    ///
    /// The generator is unusable afterwards, even if closing reported an error.
    pub async fn disconnect(&self) -> Result<(), DbError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ConnectionState::Closed) {
            ConnectionState::Connected(connection) => {
                connection::disconnect(connection).await?;
                tracing::info!("Database connection closed.");
                Ok(())
            }
            ConnectionState::Disconnected | ConnectionState::Closed => Ok(()),
        }
    }

    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.lock().await, ConnectionState::Connected(_))
    }

    /// Creates the table if it does not exist yet.
    pub async fn create_table(&self, table: &TableDefinition) -> Result<(), DbError> {
        let sql = statement::create_table(table);
        self.report(StatementKind::Create, &sql);

        let mut state = self.state.lock().await;
        let connection = state.connection()?;
        sqlx::query(&sql)
            .execute(&mut *connection)
            .await
            .map_err(|source| DbError::SchemaError {
                table: table.name.clone(),
                source,
            })?;

        tracing::debug!(table = %table.name, "Table is ready.");
        Ok(())
    }

    /// Generates `table.num_rows` rows and inserts them with one statement.
    ///
    /// Every provider of every row is awaited before the statement runs, and
    /// the connection is only locked after that, so providers may query the
    /// database themselves. Values are bound as parameters unless the table
    /// needs more than `MAX_BOUND_PARAMETERS` of them, in which case they are
    /// written into the statement as literals. Returns the number of rows
    /// inserted.
    pub async fn insert_example_data(&self, table: &TableDefinition) -> Result<u64, DbError> {
        let Some(placeholders) = statement::insert_rows(table) else {
            tracing::debug!(table = %table.name, "Nothing to insert.");
            return Ok(0);
        };

        self.ensure_connected().await?;
        let values = self.generate_values(table).await?;

        let parameters = statement::insert_parameter_count(table);
        let (sql, bound) = if parameters > statement::MAX_BOUND_PARAMETERS {
            tracing::debug!(
                table = %table.name,
                parameters,
                "Too many values to bind, writing them as literals."
            );
            let inline = statement::insert_rows_inline(table, &values).unwrap_or(placeholders);
            (inline, &[][..])
        } else {
            (placeholders, values.as_slice())
        };
        self.report(StatementKind::Insert, &sql);

        let mut query = sqlx::query(&sql);
        for value in bound {
            query = match value {
                Value::Null => query.bind(None::<i64>),
                Value::Bool(v) => query.bind(*v),
                Value::Integer(v) => query.bind(*v),
                Value::Real(v) => query.bind(*v),
                Value::Text(v) => query.bind(v.as_str()),
                Value::Blob(v) => query.bind(v.as_slice()),
            };
        }

        let mut state = self.state.lock().await;
        let connection = state.connection()?;
        let result = query
            .execute(&mut *connection)
            .await
            .map_err(|source| DbError::InsertError {
                table: table.name.clone(),
                source,
            })?;

        tracing::info!(
            table = %table.name,
            rows = result.rows_affected(),
            "Inserted example data."
        );
        Ok(result.rows_affected())
    }

    /// Returns the `id` of a random row of `table_name`, or `None` if no row
    /// matches.
    ///
    /// `filter` is used verbatim as the WHERE clause. An empty or
    /// whitespace-only filter selects from the whole table.
    pub async fn get_random_id_from_table(
        &self,
        table_name: &str,
        filter: &str,
    ) -> Result<Option<Value>, DbError> {
        let sql = statement::random_id(table_name, filter);
        self.report(StatementKind::Select, &sql);

        let query_error = |source| DbError::QueryError {
            table: table_name.to_string(),
            source,
        };

        let mut state = self.state.lock().await;
        let connection = state.connection()?;
        let row = sqlx::query(&sql)
            .fetch_optional(&mut *connection)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(decode_id(&row).map_err(query_error)?),
            None => Ok(None),
        }
    }

    pub async fn count_rows(&self, table_name: &str) -> Result<i64, DbError> {
        let sql = statement::count_rows(table_name);
        self.report(StatementKind::Select, &sql);

        let mut state = self.state.lock().await;
        let connection = state.connection()?;
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut *connection)
            .await
            .map_err(|source| DbError::QueryError {
                table: table_name.to_string(),
                source,
            })?;
        Ok(count)
    }

    /// Creates and populates each table in order, one after the other.
    ///
    /// Stops at the first failure; tables handled before it stay as they are.
    /// Returns the rows inserted per table.
    pub async fn generate(&self, tables: &[TableDefinition]) -> Result<Vec<u64>, DbError> {
        let mut inserted = Vec::with_capacity(tables.len());
        for table in tables {
            self.create_table(table).await?;
            inserted.push(self.insert_example_data(table).await?);
        }
        tracing::info!(tables = tables.len(), "Example data generation complete.");
        Ok(inserted)
    }

    /// Resolves every generated value of the table, row by row in field order.
    async fn generate_values(&self, table: &TableDefinition) -> Result<Vec<Value>, DbError> {
        let table_name = table.name.as_str();
        let pending = (0..table.num_rows)
            .flat_map(move |_| table.named_fields())
            .filter_map(|(name, field)| field.generator.as_ref().map(|provider| (name, provider)))
            .map(move |(field_name, provider)| async move {
                provider
                    .provide()
                    .await
                    .map_err(|source| DbError::DataGenerationError {
                        field: field_name.to_string(),
                        table: table_name.to_string(),
                        source,
                    })
            });

        try_join_all(pending).await
    }

    async fn ensure_connected(&self) -> Result<(), DbError> {
        self.state.lock().await.connection().map(|_| ())
    }

    fn report(&self, kind: StatementKind, sql: &str) {
        if let Some(sink) = &self.sink {
            sink.statement(kind, sql);
        }
    }
}

/// Reads the `id` column with whatever storage class SQLite reports for it.
fn decode_id(row: &SqliteRow) -> Result<Option<Value>, sqlx::Error> {
    let raw = row.try_get_raw("id")?;
    if raw.is_null() {
        return Ok(None);
    }

    let value = match raw.type_info().name() {
        "INTEGER" => Value::Integer(row.try_get_unchecked("id")?),
        "REAL" => Value::Real(row.try_get_unchecked("id")?),
        "BLOB" => Value::Blob(row.try_get_unchecked("id")?),
        _ => Value::Text(row.try_get_unchecked("id")?),
    };
    Ok(Some(value))
}
