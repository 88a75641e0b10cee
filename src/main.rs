//! akh-memory CLI: persistent knowledge graph memory.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use akh_memory::config::MemoryConfig;
use akh_memory::dispatch::{self, OPERATION_NAMES, Operation};
use akh_memory::engine::MemoryEngine;

#[derive(Parser)]
#[command(name = "akh-memory", version, about = "Persistent knowledge graph memory")]
struct Cli {
    /// JSON Lines file holding the graph. Overrides MEMORY_FILE_PATH.
    #[arg(long, global = true)]
    memory_file: Option<PathBuf>,

    /// TOML config file (default: $XDG_CONFIG_HOME/akh-memory/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one named operation with a JSON argument object.
    Call {
        /// Operation name, e.g. createEntities or searchNodes.
        operation: String,

        /// Arguments as JSON. Read from stdin when omitted or "-".
        arguments: Option<String>,
    },

    /// Print the whole graph.
    Read,

    /// Search names, types and observations (case-insensitive).
    Search {
        query: String,
    },

    /// Print the named entities and the relations among them.
    Open {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show store location and counts.
    Info,

    /// Print the resolved memory file path.
    Path,

    /// List the operation names accepted by `call`.
    Operations,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = MemoryConfig::resolve(cli.memory_file, cli.config.as_deref())?;

    match cli.command {
        Commands::Call {
            operation,
            arguments,
        } => {
            let raw = match arguments.as_deref() {
                None | Some("-") => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
                    buf
                }
                Some(inline) => inline.to_string(),
            };
            let arguments = if raw.trim().is_empty() {
                None
            } else {
                Some(serde_json::from_str(&raw).into_diagnostic()?)
            };

            let op = Operation::from_parts(&operation, arguments)?;
            let mutation = op.is_mutation();
            let engine = MemoryEngine::open(&config)?;
            let result = dispatch::execute(&engine, op)?;
            print_json(&result)?;
            if mutation {
                engine.close()?;
            } else {
                report_skipped(&engine);
            }
        }

        Commands::Read => {
            let engine = MemoryEngine::open(&config)?;
            print_json(&engine.read_graph()?)?;
            report_skipped(&engine);
        }

        Commands::Search { query } => {
            let engine = MemoryEngine::open(&config)?;
            print_json(&engine.search_nodes(&query)?)?;
            report_skipped(&engine);
        }

        Commands::Open { names } => {
            let engine = MemoryEngine::open(&config)?;
            print_json(&engine.open_nodes(&names)?)?;
            report_skipped(&engine);
        }

        Commands::Info => {
            let engine = MemoryEngine::open(&config)?;
            println!("{}", engine.info()?);
        }

        Commands::Path => match &config.memory_file {
            Some(path) => println!("{}", path.display()),
            None => println!("<memory>"),
        },

        Commands::Operations => {
            for name in OPERATION_NAMES {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn report_skipped(engine: &MemoryEngine) {
    let skipped = engine.load_diagnostics();
    if !skipped.is_empty() {
        eprintln!(
            "warning: skipped {} malformed record(s) in {}",
            skipped.len(),
            engine.location()
        );
    }
}
