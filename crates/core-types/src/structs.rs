use crate::provider::ValueProvider;
use std::fmt;
use std::sync::Arc;

/// One column of a table, or a bare DDL clause when `name` is absent.
#[derive(Clone)]
pub struct FieldDefinition {
    /// Column name. `None` means the field only contributes `sql_type` to the DDL
    /// (e.g. a `PRIMARY KEY (...)` or `FOREIGN KEY` clause) and is never inserted.
    pub name: Option<String>,
    /// SQL type and constraints, placed verbatim in the DDL.
    pub sql_type: String,
    /// Produces one value per generated row. Without one the column is `NULL`.
    pub generator: Option<Arc<dyn ValueProvider>>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            sql_type: sql_type.into(),
            generator: None,
        }
    }

    /// A nameless field rendered as a bare clause.
    pub fn clause(sql_type: impl Into<String>) -> Self {
        Self {
            name: None,
            sql_type: sql_type.into(),
            generator: None,
        }
    }

    pub fn with_generator(self, provider: impl ValueProvider + 'static) -> Self {
        self.with_shared_generator(Arc::new(provider))
    }

    pub fn with_shared_generator(mut self, provider: Arc<dyn ValueProvider>) -> Self {
        self.generator = Some(provider);
        self
    }

    /// Returns the column name, treating an empty name like an absent one.
    pub fn column_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

impl fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("sql_type", &self.sql_type)
            .field("generator", &self.generator.as_ref().map(|_| "<provider>"))
            .finish()
    }
}

/// A table to create and fill with `num_rows` generated rows.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub num_rows: usize,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, num_rows: usize) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            num_rows,
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// The fields that take part in the INSERT column list, in declared order.
    pub fn named_fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> + '_ {
        self.fields
            .iter()
            .filter_map(|field| field.column_name().map(|name| (name, field)))
    }
}
