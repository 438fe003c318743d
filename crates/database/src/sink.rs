use std::fmt;

/// What kind of statement is about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Create,
    Insert,
    Select,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatementKind::Create => "create",
            StatementKind::Insert => "insert",
            StatementKind::Select => "select",
        };
        f.write_str(label)
    }
}

/// Receives the exact text of every statement right before it is executed.
///
/// Bound values are not part of the text; INSERT rows show `?` placeholders.
pub trait DiagnosticSink: Send + Sync {
    fn statement(&self, kind: StatementKind, sql: &str);
}

/// Forwards statements to `tracing` at debug level under the `seedbed::sql` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn statement(&self, kind: StatementKind, sql: &str) {
        tracing::debug!(target: "seedbed::sql", %kind, "Executing {} query: {}", kind, sql);
    }
}
