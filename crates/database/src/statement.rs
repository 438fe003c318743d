//! SQL text rendering.
//!
//! Identifiers, types and filters are placed verbatim. Rows in an INSERT use a
//! `?` placeholder for every field with a generator and a literal `NULL` for
//! every field without one. Statements that would need more placeholders than
//! SQLite accepts carry the generated values as escaped literals instead.

use core_types::{TableDefinition, Value};

/// Highest `?` count SQLite accepts in one statement (`SQLITE_MAX_VARIABLE_NUMBER`).
pub const MAX_BOUND_PARAMETERS: usize = 32766;

/// `CREATE TABLE IF NOT EXISTS <name> (<clauses>)`.
pub fn create_table(table: &TableDefinition) -> String {
    let clauses = table
        .fields
        .iter()
        .map(|field| match field.column_name() {
            Some(name) => format!("{} {}", name, field.sql_type),
            None => field.sql_type.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE IF NOT EXISTS {} ({})", table.name, clauses)
}

/// One multi-row INSERT covering `table.num_rows` rows, with `?` placeholders.
///
/// Returns `None` when there is nothing to insert: zero rows, or no named
/// fields to insert into.
pub fn insert_rows(table: &TableDefinition) -> Option<String> {
    render_insert(table, || "?".to_string())
}

/// Same statement as `insert_rows`, with `values` written in as literals.
///
/// `values` are taken row by row in field order, one per generated field, the
/// order in which `insert_rows` expects them bound.
pub fn insert_rows_inline(table: &TableDefinition, values: &[Value]) -> Option<String> {
    let mut values = values.iter();
    render_insert(table, || values.next().map_or_else(|| "NULL".to_string(), literal))
}

fn render_insert(table: &TableDefinition, mut generated: impl FnMut() -> String) -> Option<String> {
    if table.num_rows == 0 {
        return None;
    }

    let columns: Vec<&str> = table.named_fields().map(|(name, _)| name).collect();
    if columns.is_empty() {
        return None;
    }

    let mut sql = format!("INSERT INTO {} ({}) VALUES ", table.name, columns.join(", "));
    for row in 0..table.num_rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for (index, (_, field)) in table.named_fields().enumerate() {
            if index > 0 {
                sql.push_str(", ");
            }
            match field.generator {
                Some(_) => sql.push_str(&generated()),
                None => sql.push_str("NULL"),
            }
        }
        sql.push(')');
    }
    Some(sql)
}

/// Renders a value as a SQLite literal with the storage class binding would give it.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => i64::from(*v).to_string(),
        Value::Integer(v) => v.to_string(),
        // SQLite stores NaN as NULL and reads out-of-range reals as infinity.
        Value::Real(v) if v.is_nan() => "NULL".to_string(),
        Value::Real(v) if v.is_infinite() => {
            if v.is_sign_positive() { "9e999" } else { "-9e999" }.to_string()
        }
        // Debug keeps the fraction on whole numbers so the literal stays REAL.
        Value::Real(v) => format!("{:?}", v),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Blob(v) => format!("X'{}'", hex::encode_upper(v)),
    }
}

/// Number of `?` placeholders `insert_rows` renders for the table.
pub fn insert_parameter_count(table: &TableDefinition) -> usize {
    let per_row = table
        .named_fields()
        .filter(|(_, field)| field.generator.is_some())
        .count();
    per_row * table.num_rows
}

/// `SELECT id FROM <table> [WHERE <filter>] ORDER BY RANDOM() LIMIT 1`.
///
/// A blank or whitespace-only filter leaves the WHERE clause out.
pub fn random_id(table_name: &str, filter: &str) -> String {
    let filter = filter.trim();
    if filter.is_empty() {
        format!("SELECT id FROM {} ORDER BY RANDOM() LIMIT 1", table_name)
    } else {
        format!(
            "SELECT id FROM {} WHERE {} ORDER BY RANDOM() LIMIT 1",
            table_name, filter
        )
    }
}

pub fn count_rows(table_name: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", table_name)
}
