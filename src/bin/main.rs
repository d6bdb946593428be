//! ssql CLI - Run sampling SQL against a database
//!
//! Usage:
//!   ssql explain (-f <file.sql> | -e <sql>) [--db <url>] [--level <n>] [--output sql|json]
//!   ssql run (-f <file.sql> | -e <sql>) [--db <url>] [--output sql|json]
//!   ssql check (-f <file.sql> | -e <sql>) [--dialect <dialect>]
//!
//! Examples:
//!   ssql explain -e "CREATE TABLE sales (id INT, amount INT, SAMPLEKEY(id))" --dialect postgres
//!   ssql run -f estimate.sql --db sample:sqlite:sales.db
//!   ssql check -f estimate.sql

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use ssql::config::{ConnectionConfig, ConnectionError, Settings};
use ssql::db::{Rows, SqliteDatabase, Value};
use ssql::engine::{Engine, Outcome, StatementKind};
use ssql::rewrite::SamplingCompiler;
use ssql::sql::Dialect;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "ssql=info,warn";

/// Database used when neither `--db`, a configured connection nor
/// `SSQL_DB_URL` is given.
const IN_MEMORY_DB: &str = ":memory:";

#[derive(Parser)]
#[command(name = "ssql")]
#[command(about = "ssql - Sampling SQL compiler with adaptive level search")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL a statement compiles to, without running it
    Explain {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        target: Target,

        /// Target level for sampling queries (defaults to the configured explain level)
        #[arg(short, long)]
        level: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Run a statement, sampling it when it uses SAMPLE/UNTIL
    Run {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        target: Target,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// Validate a statement without a database
    Check {
        #[command(flatten)]
        input: Input,

        /// SQL dialect to check against
        #[arg(short, long, default_value = "generic")]
        dialect: DialectArg,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "sql"])))]
struct Input {
    /// Path to a file holding one statement
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Statement text
    #[arg(short = 'e', long = "sql")]
    sql: Option<String>,
}

impl Input {
    fn read(&self) -> Result<String, String> {
        match (&self.sql, &self.file) {
            (Some(sql), _) => Ok(sql.clone()),
            (None, Some(file)) => fs::read_to_string(file)
                .map_err(|e| format!("Error reading file '{}': {}", file.display(), e)),
            (None, None) => Err("No statement given".to_string()),
        }
    }
}

#[derive(Args)]
struct Target {
    /// Connection URL or SQLite path (defaults to the configured connection)
    #[arg(long)]
    db: Option<String>,

    /// SQL dialect (detected from the connection URL when omitted). Only
    /// `explain` without a database accepts a dialect other than sqlite.
    #[arg(short, long)]
    dialect: Option<DialectArg>,

    /// Number of levels to search
    #[arg(long)]
    num_levels: Option<u32>,

    /// Expose sampled tables as inline views instead of CTEs
    #[arg(long)]
    inline_view: Option<bool>,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Redshift,
    Sqlite,
    Generic,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Redshift => Dialect::Redshift,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Generic => Dialect::Generic,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Plain SQL or tab-separated rows
    Sql,
    /// JSON document
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Explain {
            input,
            target,
            level,
            output,
        } => cmd_explain(input, target, level, output),
        Commands::Run {
            input,
            target,
            output,
        } => cmd_run(input, target, output),
        Commands::Check { input, dialect } => cmd_check(input, dialect),
    }
}

/// Open the target database and build an engine for it.
///
/// Statements only ever run over the bundled SQLite adapter, so a
/// configured connection must be SQLite. Without one, `explain` may still
/// compile for another dialect against an empty in-memory database.
fn connect(target: Target, executes: bool) -> Result<(Engine, SqliteDatabase), String> {
    let settings = Settings::load().map_err(|e| format!("Configuration error: {}", e))?;

    let configured = match target.db {
        Some(url) => Some(ConnectionConfig::from_url(url)),
        None => match settings.default_connection() {
            Some((_, conn)) => Some(
                conn.to_config()
                    .map_err(|e| format!("Configuration error: {}", e))?,
            ),
            None => match ConnectionConfig::from_env() {
                Ok(conn) => Some(conn),
                Err(ConnectionError::MissingEnvVar(_)) => None,
                Err(e) => return Err(format!("Configuration error: {}", e)),
            },
        },
    };
    let has_database = configured.is_some();
    let mut connection = configured.unwrap_or_else(|| ConnectionConfig::from_url(IN_MEMORY_DB));
    if let Some(dialect) = target.dialect {
        connection.dialect = dialect.into();
    }
    if executes || has_database {
        connection
            .ensure_executable()
            .map_err(|e| format!("Connection error: {}", e))?;
    }

    let mut sampling = settings.sampling;
    if let Some(num_levels) = target.num_levels {
        sampling.num_levels = num_levels;
    }
    if target.inline_view.is_some() {
        sampling.inline_view = target.inline_view;
    }
    sampling
        .validate()
        .map_err(|e| format!("Configuration error: {}", e))?;

    let db = SqliteDatabase::open(connection.sqlite_path())
        .map_err(|e| format!("Error opening database '{}': {}", connection.url, e))?;
    Ok((Engine::with_settings(connection.dialect, sampling), db))
}

fn cmd_explain(input: Input, target: Target, level: Option<u32>, output: OutputFormat) -> ExitCode {
    let result = input.read().and_then(|sql| {
        let (mut engine, mut db) = connect(target, false)?;
        let statements = match level {
            Some(level) => engine.rewrite_at(&mut db, &sql, level).map(|pair| {
                pair.map(|p| {
                    p.condition_query
                        .into_iter()
                        .chain([p.aggregate_query])
                        .collect::<Vec<_>>()
                })
            }),
            None => engine.explain(&mut db, &sql),
        };
        statements.map_err(|e| format!("Compilation error: {}", e))
    });

    match result {
        Ok(Some(statements)) => {
            match output {
                OutputFormat::Sql => {
                    for statement in &statements {
                        println!("{};", statement);
                        println!();
                    }
                }
                OutputFormat::Json => match serde_json::to_string_pretty(&statements) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error encoding output: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("-- statement passes through unchanged");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(input: Input, target: Target, output: OutputFormat) -> ExitCode {
    let result = input.read().and_then(|sql| {
        let (mut engine, mut db) = connect(target, true)?;
        engine
            .execute(&mut db, &sql)
            .map_err(|e| format!("Execution error: {}", e))
    });

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match (outcome, output) {
        (Outcome::Rows(rows), OutputFormat::Sql) => print_rows(&rows),
        (Outcome::Rows(rows), OutputFormat::Json) => match serde_json::to_string_pretty(&rows) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error encoding output: {}", e);
                return ExitCode::FAILURE;
            }
        },
        (Outcome::Converted { statements }, _) => {
            println!("Converted with {} statements", statements.len());
        }
        (Outcome::Executed { affected }, _) => {
            println!("OK: {} rows affected", affected);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_check(input: Input, dialect: DialectArg) -> ExitCode {
    let dialect: Dialect = dialect.into();
    let result = input.read().and_then(|sql| {
        let engine = Engine::new(dialect);
        let kind = engine
            .classify(&sql)
            .map_err(|e| format!("Validation error: {}", e))?;
        let checked = match kind {
            StatementKind::Conversion => ssql::convert::TableConverter::new(&sql, dialect)
                .and_then(|c| c.plan())
                .map(|plan| format!("converts {}", plan.table_name)),
            StatementKind::Query => {
                let settings = engine.settings();
                SamplingCompiler::new(
                    &sql,
                    dialect,
                    settings.num_levels,
                    settings.inline_view_for(dialect),
                )
                .map(|c| {
                    if c.has_sample_clause() {
                        "samples".to_string()
                    } else {
                        "passes through".to_string()
                    }
                })
            }
            StatementKind::Passthrough => Ok("passes through".to_string()),
        };
        checked.map_err(|e| format!("Validation error: {}", e))
    });

    match result {
        Ok(summary) => {
            println!("OK: statement {}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_rows(rows: &Rows) {
    println!("{}", rows.columns.join("\t"));
    for row in &rows.rows {
        let cells: Vec<String> = row.iter().map(cell).collect();
        println!("{}", cells.join("\t"));
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
