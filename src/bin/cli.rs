use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use athledb::output::render;
use athledb::queries::{self, NamedQuery, QueryOutcome};
use athledb::{OutputFormat, RecordStore, StoreConfig};

const HISTORY_FILE: &str = ".athledb_history";

#[derive(Parser)]
#[command(author, version, about = "AthleDB CLI - analytical queries over athletics results")]
struct Cli {
    /// Events file (JSON array or JSON Lines)
    #[arg(long)]
    events: Option<PathBuf>,

    /// Results file (JSON array or JSON Lines)
    #[arg(long)]
    results: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog queries
    List,

    /// Run catalog queries by id or name
    Run {
        /// Query ids (Q6, 6) or names (top_medallists)
        #[arg(required = true)]
        keys: Vec<String>,

        /// Argument for parameterized queries, e.g. a country code
        #[arg(short, long)]
        arg: Option<String>,
    },

    /// Run the whole catalog
    All {
        /// Run the queries on parallel threads
        #[arg(long)]
        parallel: bool,
    },

    /// Start an interactive shell
    Shell,
}

/// Route the library's `log` records to a stderr subscriber. `RUST_LOG`
/// overrides the level picked with `-v`.
fn init_logging(verbose: u8) -> Result<()> {
    let level = log_level(verbose);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn store_config(cli: &Cli) -> StoreConfig {
    let defaults = StoreConfig::default();
    StoreConfig::new(
        cli.events.clone().unwrap_or(defaults.events_path),
        cli.results.clone().unwrap_or(defaults.results_path),
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Some(Commands::List) = cli.command {
        list_queries();
        return Ok(());
    }

    let config = store_config(&cli);
    let store = RecordStore::load(&config).with_context(|| {
        format!(
            "Failed to load dataset from {} and {}",
            config.events_path.display(),
            config.results_path.display()
        )
    })?;

    match cli.command {
        Some(Commands::Run { keys, arg }) => {
            for key in &keys {
                let query = queries::find(key).with_context(|| format!("Unknown query '{}'", key))?;
                // Only queries that take an argument receive it
                let argument = query.parameter().and(arg.as_deref());
                let result = queries::execute_with(&store, query, argument)
                    .with_context(|| format!("{} failed", query.id))?;
                print_header(query);
                print!("{}", render(&result, cli.format)?);
            }
        }
        Some(Commands::All { parallel }) => {
            let outcomes = if parallel {
                queries::run_all_parallel(&store)?
            } else {
                queries::run_all(&store)
            };
            print_outcomes(outcomes, cli.format)?;
        }
        Some(Commands::Shell) | None => run_shell(&store, cli.format)?,
        Some(Commands::List) => list_queries(),
    }

    Ok(())
}

fn list_queries() {
    for query in queries::catalog() {
        let parameter = match query.parameter() {
            Some(p) => format!(" [{}, default {}]", p.name, p.default),
            None => String::new(),
        };
        println!("{:<4} {:<26} {}{}", query.id.to_string(), query.name, query.description, parameter);
    }
}

fn print_header(query: &NamedQuery) {
    println!("{}: {}", query.id, query.description);
}

fn print_outcomes(outcomes: Vec<QueryOutcome>, format: OutputFormat) -> Result<()> {
    let mut failures = 0;
    for (query, outcome) in outcomes {
        print_header(query);
        match outcome {
            Ok(result) => print!("{}", render(&result, format)?),
            Err(err) => {
                failures += 1;
                println!("Error: {}", err);
            }
        }
        println!();
    }
    if failures > 0 {
        bail!("{} queries failed", failures);
    }
    Ok(())
}

fn run_shell(store: &RecordStore, mut format: OutputFormat) -> Result<()> {
    println!("Welcome to AthleDB CLI. Type 'help' for assistance or 'exit' to quit.");

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    if let Err(err) = rl.load_history(HISTORY_FILE) {
        if !err.to_string().contains("No such file or directory") {
            println!("Error loading history: {}", err);
        }
    }

    loop {
        let readline = rl.readline("athledb> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match line.to_lowercase().as_str() {
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    "help" => print_help(),
                    "list" => list_queries(),
                    "tables" => {
                        for table in store.table_names() {
                            println!("{} ({} rows)", table, store.row_count(table)?);
                        }
                    }
                    "table" => format = OutputFormat::Table,
                    "json" => format = OutputFormat::Json,
                    _ => {
                        // `<query> [argument]`, the argument may contain spaces
                        let (key, argument) = match line.split_once(char::is_whitespace) {
                            Some((key, rest)) => (key, Some(rest.trim())),
                            None => (line, None),
                        };
                        match queries::find(key) {
                            Some(query) => {
                                print_header(query);
                                match query.pipeline(argument) {
                                    Ok(pipeline) => println!("  {}", pipeline),
                                    Err(err) => {
                                        println!("Error: {}", err);
                                        continue;
                                    }
                                }
                                match queries::execute_with(store, query, argument) {
                                    Ok(result) => print!("{}", render(&result, format)?),
                                    Err(err) => println!("Error: {}", err),
                                }
                            }
                            None => println!("Unknown query '{}'. Type 'list' to see the catalog.", key),
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(HISTORY_FILE) {
        println!("Error saving history: {}", err);
    }

    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!("  <id> | <name>     - Run a catalog query, e.g. Q6 or top_medallists");
    println!("  <id> <argument>   - Run a parameterized query, e.g. Q15 FRA");
    println!("  list              - List the catalog queries");
    println!("  tables            - Show the loaded tables");
    println!("  table | json      - Switch the output format");
    println!("  help              - Display this help message");
    println!("  exit              - Exit the CLI");
}
