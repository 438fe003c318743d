use core_types::{BoxError, FieldDefinition, TableDefinition, Value, deferred, immediate, try_immediate};
use database::{DataGenerator, DbError, DiagnosticSink, StatementKind, connect_options, in_memory_options};
use sqlx::sqlite::SqliteConnection;
use sqlx::{ConnectOptions, Connection, Row};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingSink {
    statements: Mutex<Vec<(StatementKind, String)>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<(StatementKind, String)> {
        std::mem::take(&mut *self.statements.lock().unwrap())
    }
}

impl DiagnosticSink for RecordingSink {
    fn statement(&self, kind: StatementKind, sql: &str) {
        self.statements.lock().unwrap().push((kind, sql.to_string()));
    }
}

async fn connected_in_memory() -> DataGenerator {
    let generator = DataGenerator::new(in_memory_options(), None);
    generator.connect().await.unwrap();
    generator
}

/// An on-disk database so rows can be read back after the generator disconnects.
fn temp_database() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.db").display().to_string();
    (dir, path)
}

async fn open_for_reading(path: &str) -> SqliteConnection {
    connect_options(path).unwrap().connect().await.unwrap()
}

fn users_table(num_rows: usize) -> TableDefinition {
    TableDefinition::new("users", num_rows)
        .with_field(FieldDefinition::clause("id INTEGER PRIMARY KEY"))
        .with_field(FieldDefinition::new("email", "TEXT").with_generator(immediate(|| "a@example.com")))
}

#[tokio::test]
async fn users_scenario_renders_expected_ddl_and_inserts_rows() {
    let sink = Arc::new(RecordingSink::default());
    let generator = DataGenerator::new(in_memory_options(), Some(sink.clone()));
    generator.connect().await.unwrap();

    let table = TableDefinition::new("users", 2)
        .with_field(FieldDefinition::clause("INTEGER PRIMARY KEY"))
        .with_field(FieldDefinition::new("email", "TEXT").with_generator(immediate(|| "a@example.com")));

    let inserted = generator.generate(&[table]).await.unwrap();
    assert_eq!(inserted, vec![2]);

    let statements = sink.take();
    assert_eq!(
        statements[0],
        (
            StatementKind::Create,
            "CREATE TABLE IF NOT EXISTS users (INTEGER PRIMARY KEY, email TEXT)".to_string()
        )
    );
    assert_eq!(
        statements[1],
        (
            StatementKind::Insert,
            "INSERT INTO users (email) VALUES (?), (?)".to_string()
        )
    );

    assert_eq!(generator.count_rows("users").await.unwrap(), 2);
    let matching = generator
        .get_random_id_from_table("users", "email = 'a@example.com'")
        .await;
    // The bare clause declares a column named INTEGER, not `id`.
    assert!(matches!(matching, Err(DbError::QueryError { .. })));
}

#[tokio::test]
async fn fields_without_generators_are_all_null() {
    let (_dir, path) = temp_database();
    let generator = DataGenerator::new(connect_options(&path).unwrap(), None);
    generator.connect().await.unwrap();

    let table = TableDefinition::new("empty_rows", 4)
        .with_field(FieldDefinition::new("a", "TEXT"))
        .with_field(FieldDefinition::new("b", "INTEGER"));
    generator.generate(&[table]).await.unwrap();
    generator.disconnect().await.unwrap();

    let mut reader = open_for_reading(&path).await;
    let rows = sqlx::query("SELECT a, b FROM empty_rows")
        .fetch_all(&mut reader)
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    for row in rows {
        assert_eq!(row.get::<Option<String>, _>("a"), None);
        assert_eq!(row.get::<Option<i64>, _>("b"), None);
    }
}

#[tokio::test]
async fn deterministic_generators_produce_successive_values_in_field_order() {
    let (_dir, path) = temp_database();
    let generator = DataGenerator::new(connect_options(&path).unwrap(), None);
    generator.connect().await.unwrap();

    let counter = Arc::new(AtomicI64::new(0));
    let labels = Arc::new(AtomicI64::new(100));
    let table = TableDefinition::new("items", 3)
        .with_field(FieldDefinition::clause("id INTEGER PRIMARY KEY"))
        .with_field(
            FieldDefinition::new("seq", "INTEGER")
                .with_generator(immediate(move || counter.fetch_add(1, Ordering::SeqCst))),
        )
        .with_field(FieldDefinition::new("label", "TEXT").with_generator(immediate(move || {
            format!("item-{}", labels.fetch_add(1, Ordering::SeqCst))
        })));

    generator.generate(&[table]).await.unwrap();
    generator.disconnect().await.unwrap();

    let mut reader = open_for_reading(&path).await;
    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT seq, label FROM items ORDER BY id")
        .fetch_all(&mut reader)
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            (0, "item-100".to_string()),
            (1, "item-101".to_string()),
            (2, "item-102".to_string()),
        ]
    );
}

#[tokio::test]
async fn quotes_in_generated_values_are_stored_verbatim() {
    let (_dir, path) = temp_database();
    let generator = DataGenerator::new(connect_options(&path).unwrap(), None);
    generator.connect().await.unwrap();

    let tricky = r#"O'Brien said "hi"); DROP TABLE people; --"#;
    let table = TableDefinition::new("people", 1)
        .with_field(FieldDefinition::new("name", "TEXT").with_generator(Value::from(tricky)));
    generator.generate(&[table]).await.unwrap();
    generator.disconnect().await.unwrap();

    let mut reader = open_for_reading(&path).await;
    let stored: String = sqlx::query_scalar("SELECT name FROM people")
        .fetch_one(&mut reader)
        .await
        .unwrap();
    assert_eq!(stored, tricky);
}

#[tokio::test]
async fn tables_beyond_the_bound_parameter_limit_insert_in_one_statement() {
    let sink = Arc::new(RecordingSink::default());
    let generator = DataGenerator::new(in_memory_options(), Some(sink.clone()));
    generator.connect().await.unwrap();

    let counter = Arc::new(AtomicI64::new(0));
    let table = TableDefinition::new("bulk", 50_000)
        .with_field(FieldDefinition::clause("id INTEGER PRIMARY KEY"))
        .with_field(FieldDefinition::new("label", "TEXT").with_generator(immediate(|| "it's")))
        .with_field(
            FieldDefinition::new("seq", "INTEGER")
                .with_generator(immediate(move || counter.fetch_add(1, Ordering::SeqCst))),
        )
        .with_field(FieldDefinition::new("payload", "BLOB").with_generator(Value::Blob(vec![0xde, 0xad])))
        .with_field(FieldDefinition::new("weight", "REAL").with_generator(Value::Real(1.0)))
        .with_field(FieldDefinition::new("note", "TEXT"));

    assert_eq!(generator.generate(&[table]).await.unwrap(), vec![50_000]);
    assert_eq!(generator.count_rows("bulk").await.unwrap(), 50_000);

    let insert = sink
        .take()
        .into_iter()
        .find(|(kind, _)| *kind == StatementKind::Insert)
        .map(|(_, sql)| sql)
        .unwrap();
    assert!(insert.starts_with(
        "INSERT INTO bulk (label, seq, payload, weight, note) VALUES ('it''s', 0, X'DEAD', 1.0, NULL), ('it''s', 1, "
    ));
    assert!(!insert.contains('?'));

    // Every row kept its values, their storage classes and its position.
    let mismatched = generator
        .get_random_id_from_table(
            "bulk",
            "label <> 'it''s' OR seq <> id - 1 OR payload <> X'DEAD' \
             OR typeof(weight) <> 'real' OR note IS NOT NULL",
        )
        .await
        .unwrap();
    assert_eq!(mismatched, None);
}

#[tokio::test]
async fn create_table_is_idempotent() {
    let generator = connected_in_memory().await;
    let table = users_table(2);

    generator.create_table(&table).await.unwrap();
    generator.insert_example_data(&table).await.unwrap();
    generator.create_table(&table).await.unwrap();

    assert_eq!(generator.count_rows("users").await.unwrap(), 2);
}

#[tokio::test]
async fn random_id_on_empty_table_is_none() {
    let generator = connected_in_memory().await;
    generator.create_table(&users_table(0)).await.unwrap();

    let id = generator.get_random_id_from_table("users", "").await.unwrap();
    assert_eq!(id, None);
}

#[tokio::test]
async fn random_id_respects_the_filter() {
    let generator = connected_in_memory().await;
    let flags = Arc::new(AtomicI64::new(0));
    let table = TableDefinition::new("accounts", 10)
        .with_field(FieldDefinition::clause("id INTEGER PRIMARY KEY"))
        .with_field(
            FieldDefinition::new("active", "INTEGER")
                .with_generator(immediate(move || flags.fetch_add(1, Ordering::SeqCst) % 2)),
        );
    generator.generate(&[table]).await.unwrap();

    for _ in 0..20 {
        let id = generator
            .get_random_id_from_table("accounts", "active = 1")
            .await
            .unwrap()
            .and_then(|v| v.as_integer())
            .unwrap();
        // Rows 2, 4, 6, 8, 10 carry active = 1.
        assert_eq!(id % 2, 0);
    }

    let none = generator
        .get_random_id_from_table("accounts", "active = 5")
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn blank_filter_selects_from_the_whole_table() {
    let generator = connected_in_memory().await;
    generator.generate(&[users_table(3)]).await.unwrap();

    for filter in ["", "   ", "\n\t"] {
        let id = generator
            .get_random_id_from_table("users", filter)
            .await
            .unwrap()
            .and_then(|v| v.as_integer())
            .unwrap();
        assert!((1..=3).contains(&id));
    }
}

#[tokio::test]
async fn generate_populates_earlier_tables_before_later_ones_reference_them() {
    let generator = connected_in_memory().await;
    let lookups = generator.clone();

    let authors = TableDefinition::new("authors", 3)
        .with_field(FieldDefinition::clause("id INTEGER PRIMARY KEY"))
        .with_field(FieldDefinition::new("name", "TEXT").with_generator(immediate(|| "someone")));
    let posts = TableDefinition::new("posts", 5)
        .with_field(FieldDefinition::new("id", "INTEGER PRIMARY KEY"))
        .with_field(FieldDefinition::new("author_id", "INTEGER NOT NULL").with_generator(deferred(
            move || {
                let lookups = lookups.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    let id = lookups.get_random_id_from_table("authors", "").await?;
                    id.ok_or_else(|| BoxError::from("authors is empty"))
                }
            },
        )))
        .with_field(FieldDefinition::clause("FOREIGN KEY (author_id) REFERENCES authors(id)"));

    let inserted = generator.generate(&[authors, posts]).await.unwrap();
    assert_eq!(inserted, vec![3, 5]);

    let dangling = generator
        .get_random_id_from_table("posts", "author_id NOT IN (SELECT id FROM authors)")
        .await
        .unwrap();
    assert_eq!(dangling, None);
}

#[tokio::test]
async fn generator_failure_names_field_and_table_and_stops_generate() {
    let generator = connected_in_memory().await;

    let broken = TableDefinition::new("broken", 2)
        .with_field(FieldDefinition::new("value", "TEXT").with_generator(try_immediate(|| {
            Err::<String, _>("generator exploded")
        })));
    let after = users_table(1);

    let err = generator.generate(&[broken, after]).await.unwrap_err();
    match &err {
        DbError::DataGenerationError { field, table, .. } => {
            assert_eq!(field, "value");
            assert_eq!(table, "broken");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Error generating data for field value in table broken: generator exploded"
    );

    // The first table was created before its rows failed; the second never was.
    assert_eq!(generator.count_rows("broken").await.unwrap(), 0);
    assert!(matches!(
        generator.count_rows("users").await,
        Err(DbError::QueryError { .. })
    ));
}

#[tokio::test]
async fn deferred_values_are_stored_in_call_order_not_completion_order() {
    let (_dir, path) = temp_database();
    let generator = DataGenerator::new(connect_options(&path).unwrap(), None);
    generator.connect().await.unwrap();

    // Later calls finish sooner, so completion order is the reverse of call order.
    let calls = Arc::new(AtomicI64::new(0));
    let table = TableDefinition::new("slow", 10)
        .with_field(FieldDefinition::clause("id INTEGER PRIMARY KEY"))
        .with_field(FieldDefinition::new("n", "INTEGER").with_generator(deferred(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis((10 - n) as u64)).await;
                Ok::<_, BoxError>(n)
            }
        })));

    assert_eq!(generator.generate(&[table]).await.unwrap(), vec![10]);
    generator.disconnect().await.unwrap();

    let mut reader = open_for_reading(&path).await;
    let stored: Vec<i64> = sqlx::query_scalar("SELECT n FROM slow ORDER BY id")
        .fetch_all(&mut reader)
        .await
        .unwrap();
    assert_eq!(stored, (0..10).collect::<Vec<i64>>());
}

#[tokio::test]
async fn deferred_failure_names_field_and_table() {
    let generator = connected_in_memory().await;

    let table = TableDefinition::new("orders", 3)
        .with_field(FieldDefinition::new("sku", "TEXT").with_generator(immediate(|| "A-1")))
        .with_field(FieldDefinition::new("customer_id", "INTEGER").with_generator(deferred(|| async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Err::<i64, _>(BoxError::from("customer lookup failed"))
        })));

    let err = generator.generate(&[table]).await.unwrap_err();
    match &err {
        DbError::DataGenerationError { field, table, .. } => {
            assert_eq!(field, "customer_id");
            assert_eq!(table, "orders");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Error generating data for field customer_id in table orders: customer lookup failed"
    );
    assert_eq!(generator.count_rows("orders").await.unwrap(), 0);
}

#[tokio::test]
async fn constraint_violation_is_an_insert_error() {
    let generator = connected_in_memory().await;
    let table = TableDefinition::new("strict", 2)
        .with_field(FieldDefinition::new("code", "TEXT NOT NULL"));

    generator.create_table(&table).await.unwrap();
    let err = generator.insert_example_data(&table).await.unwrap_err();
    assert!(matches!(err, DbError::InsertError { ref table, .. } if table == "strict"));
}

#[tokio::test]
async fn malformed_ddl_is_a_schema_error() {
    let generator = connected_in_memory().await;
    let table = TableDefinition::new("bad", 0).with_field(FieldDefinition::clause("PRIMARY KEY ("));

    let err = generator.create_table(&table).await.unwrap_err();
    assert!(matches!(err, DbError::SchemaError { ref table, .. } if table == "bad"));
    assert!(err.to_string().starts_with("Error creating table bad: "));
}

#[tokio::test]
async fn zero_rows_is_a_successful_no_op() {
    let sink = Arc::new(RecordingSink::default());
    let generator = DataGenerator::new(in_memory_options(), Some(sink.clone()));
    generator.connect().await.unwrap();

    let inserted = generator.generate(&[users_table(0)]).await.unwrap();
    assert_eq!(inserted, vec![0]);

    let kinds: Vec<StatementKind> = sink.take().into_iter().map(|(kind, _)| kind).collect();
    assert_eq!(kinds, vec![StatementKind::Create]);
}

#[tokio::test]
async fn operations_require_an_open_connection() {
    let generator = DataGenerator::new(in_memory_options(), None);
    assert!(!generator.is_connected().await);

    let err = generator.create_table(&users_table(1)).await.unwrap_err();
    assert!(matches!(err, DbError::NotConnected));

    generator.connect().await.unwrap();
    assert!(generator.is_connected().await);
    generator.disconnect().await.unwrap();

    assert!(matches!(
        generator.get_random_id_from_table("users", "").await,
        Err(DbError::ConnectionClosed)
    ));
    assert!(matches!(generator.connect().await, Err(DbError::ConnectionClosed)));
    // Closing twice is harmless.
    generator.disconnect().await.unwrap();
}

#[tokio::test]
async fn data_survives_reconnecting_with_a_new_generator() {
    let (_dir, path) = temp_database();

    let first = DataGenerator::new(connect_options(&path).unwrap(), None);
    first.connect().await.unwrap();
    first.generate(&[users_table(3)]).await.unwrap();
    first.disconnect().await.unwrap();

    let second = DataGenerator::new(connect_options(&path).unwrap(), None);
    second.connect().await.unwrap();
    second.generate(&[users_table(2)]).await.unwrap();
    assert_eq!(second.count_rows("users").await.unwrap(), 5);
    second.disconnect().await.unwrap();

    let mut reader = open_for_reading(&path).await;
    let emails: Vec<String> = sqlx::query_scalar("SELECT DISTINCT email FROM users")
        .fetch_all(&mut reader)
        .await
        .unwrap();
    assert_eq!(emails, vec!["a@example.com".to_string()]);
    reader.close().await.unwrap();
}
