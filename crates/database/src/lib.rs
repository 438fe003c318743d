//! # Seedbed Database Crate
//!
//! This crate turns abstract table definitions into a populated SQLite
//! database. It is the only place in the workspace that talks SQL.
//!
//! ## Architectural Principles
//!
//! - **One connection, serialized:** every `DataGenerator` owns exactly one
//!   SQLite connection behind an async mutex, so statements run one at a time
//!   in issued order.
//! - **Parameterized values:** generated values are bound as `?` parameters.
//!   Only table names, column names, types and filters are rendered into SQL.
//! - **Injected collaborators:** the connection options and the optional
//!   diagnostic sink are passed in at construction; nothing is global.
//!
//! ## Public API
//!
//! - `DataGenerator`: connect/disconnect, `create_table`, `insert_example_data`,
//!   `get_random_id_from_table`, `generate`.
//! - `connect_options`: builds `SqliteConnectOptions` from a URL or a path.
//! - `DiagnosticSink` / `TracingSink`: receive each statement before it runs.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod generator;
pub mod sink;
pub mod statement;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect_options, in_memory_options};
pub use error::DbError;
pub use generator::DataGenerator;
pub use sink::{DiagnosticSink, StatementKind, TracingSink};
