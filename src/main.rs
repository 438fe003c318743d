use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, load_config};
use core_types::TableDefinition;
use database::{DataGenerator, TracingSink, connect_options, in_memory_options, statement};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod providers;

/// The main entry point for the Seedbed example-data generator.
#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is optional; DATABASE_URL may also come from the shell.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Generate(args) => handle_generate(args).await,
        Commands::Plan(args) => handle_plan(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Populates a SQLite database with synthetic example data.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every configured table and fill it with generated rows.
    Generate(GenerateArgs),
    /// Print the statements `generate` would run, without touching a database.
    Plan(PlanArgs),
}

#[derive(Parser)]
struct GenerateArgs {
    /// Path to the TOML file describing the tables.
    #[arg(long, short, default_value = "seedbed.toml")]
    config: PathBuf,

    /// Overrides `database.url` from the configuration file.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Parser)]
struct PlanArgs {
    /// Path to the TOML file describing the tables.
    #[arg(long, short, default_value = "seedbed.toml")]
    config: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Handles the orchestration of a generation run.
async fn handle_generate(args: GenerateArgs) -> Result<()> {
    let config = read_config(&args.config)?;
    init_tracing(&config.logging.level)?;

    let url = args.database_url.as_deref().unwrap_or(&config.database.url);
    let options = connect_options(url)?;
    let generator = DataGenerator::new(options, Some(Arc::new(TracingSink)));
    generator
        .connect()
        .await
        .with_context(|| format!("Failed to open the database at {}", url))?;

    let tables = providers::build_tables(&config.tables, &generator);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(format!("Generating example data for {} tables...", tables.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    // Always close the connection, even when generation failed part way.
    let outcome = populate(&generator, &tables).await;
    spinner.finish_and_clear();
    let closed = generator.disconnect().await;

    let summary = outcome?;
    closed.context("Failed to close the database connection")?;

    let mut report = Table::new();
    report.set_header(vec!["Table", "Rows inserted", "Rows in table"]);
    for (name, inserted, total) in summary {
        report.add_row(vec![name, inserted.to_string(), total.to_string()]);
    }
    println!("{report}");

    Ok(())
}

/// Runs the pipeline and reads back the row count of every table.
async fn populate(
    generator: &DataGenerator,
    tables: &[TableDefinition],
) -> Result<Vec<(String, u64, i64)>> {
    let inserted = generator.generate(tables).await?;

    let mut summary = Vec::with_capacity(tables.len());
    for (table, rows) in tables.iter().zip(inserted) {
        let total = generator.count_rows(&table.name).await?;
        summary.push((table.name.clone(), rows, total));
    }
    Ok(summary)
}

/// Prints the DDL and INSERT shape for each configured table.
fn handle_plan(args: PlanArgs) -> Result<()> {
    let config = read_config(&args.config)?;

    // Providers are never invoked while planning, so no connection is opened.
    let generator = DataGenerator::new(in_memory_options(), None);
    let tables = providers::build_tables(&config.tables, &generator);

    for table in &tables {
        println!("-- {} ({} rows)", table.name, table.num_rows);
        println!("{};", statement::create_table(table));
        match statement::insert_rows(table) {
            Some(insert) if table.num_rows <= 3 => println!("{};", insert),
            Some(_) => {
                let values = statement::insert_parameter_count(table);
                let how = if values > statement::MAX_BOUND_PARAMETERS { "literal" } else { "bound" };
                println!(
                    "-- one INSERT with {} rows, {} {} values",
                    table.num_rows, values, how
                );
            }
            None => println!("-- nothing to insert"),
        }
        println!();
    }

    Ok(())
}

fn read_config(path: &Path) -> Result<Config> {
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("Invalid logging.level '{}'", default_filter))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
