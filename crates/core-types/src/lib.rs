//! # Core Types
//!
//! The data model shared by every other crate: table and field definitions,
//! the `Value` bound into generated rows, and the `ValueProvider` abstraction
//! that produces one value per field per row.

pub mod enums;
pub mod error;
pub mod provider;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::Value;
pub use error::{BoxError, GeneratorError};
pub use provider::{Deferred, Immediate, TryImmediate, ValueProvider, deferred, immediate, try_immediate};
pub use structs::{FieldDefinition, TableDefinition};
