use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use table_browser_core::{BatchRequest, BatchResponse, PageWindow, TableList};
use table_browser_server::ServerConfig;
use table_browser_sqlite::{Database, StoreOptions};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "table-browser")]
#[command(version, about = "Browse and edit the tables of a SQLite database")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, table_browser_sqlite=debug).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the JSON/HTTP API.
    Serve(ServeArgs),
    /// Print the user tables as JSON.
    Tables(TablesArgs),
    /// Print one page of a table as JSON.
    Show(ShowArgs),
    /// Apply a JSON batch of edits to a table.
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// SQLite database file (overrides the configuration).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Address to listen on (overrides the configuration).
    #[arg(long)]
    bind: Option<String>,
}

#[derive(Debug, Args)]
struct TablesArgs {
    /// SQLite database file.
    #[arg(long)]
    db: PathBuf,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// SQLite database file.
    #[arg(long)]
    db: PathBuf,
    /// Table to read.
    #[arg(long)]
    table: String,
    /// Rows per page, clamped to 1-500.
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,
    /// Rows to skip, clamped to 0 or more.
    #[arg(long, allow_negative_numbers = true)]
    offset: Option<i64>,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// SQLite database file.
    #[arg(long)]
    db: PathBuf,
    /// Table to edit.
    #[arg(long)]
    table: String,
    /// JSON file of the form {"updates": [...]}; `-` reads stdin.
    #[arg(long)]
    input: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Tables(args) => run_tables(args),
        Command::Show(args) => run_show(args),
        Command::Apply(args) => run_apply(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_serve(args: ServeArgs) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .map_err(|e| format!("failed to load config '{}': {e}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(db) = args.db {
        config.database = db;
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    config.validate().map_err(|e| e.to_string())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    runtime
        .block_on(table_browser_server::run(config))
        .map_err(|e| e.to_string())
}

fn run_tables(args: TablesArgs) -> Result<(), String> {
    let db = open_database(&args.db)?;
    let tables = db.list_tables().map_err(|e| e.to_string())?;
    print_json(&TableList { tables })?;
    close_database(db)
}

fn run_show(args: ShowArgs) -> Result<(), String> {
    let db = open_database(&args.db)?;
    let window = PageWindow::clamped(args.limit, args.offset);
    let page = db.read_page(&args.table, window).map_err(|e| e.to_string())?;
    print_json(&page)?;
    close_database(db)
}

fn run_apply(args: ApplyArgs) -> Result<(), String> {
    let raw = read_input(&args.input)?;
    let request: BatchRequest = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid batch in '{}': {e}", args.input.display()))?;

    let db = open_database(&args.db)?;
    let updated = db
        .apply_edits(&args.table, &request.updates)
        .map_err(|e| e.to_string())?;
    print_json(&BatchResponse { updated })?;
    close_database(db)
}

fn open_database(path: &Path) -> Result<Database, String> {
    Database::open(path, &StoreOptions::default())
        .map_err(|e| format!("failed to open '{}': {e}", path.display()))
}

fn close_database(db: Database) -> Result<(), String> {
    db.close().map_err(|e| format!("failed to close database: {e}"))
}

fn read_input(path: &Path) -> Result<String, String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        return Ok(raw);
    }
    fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("JSON serialization failed: {e}"))?;
    println!("{json}");
    Ok(())
}
