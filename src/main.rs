//! Fireflow CLI Entry Point
//!
//! This is the generic invocation surface a workflow host (or an operator)
//! uses to run one operation. It provides two subcommands:
//! - `run` - execute a job document (operation + input items)
//! - `connections` - connection profile management
//!
//! All output to stdout is JSON-only. Logs go to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use fireflow::{
    list_connections, resolve_connection, save_connection, ConfigLocation, ConnectionParams,
    ErrorEnvelope, FireflowError, InputRecord, Metadata, RunOptions, SqlOperation, StoredConnection,
    SuccessEnvelope,
};

/// Fireflow - Firebird SQL operation runner
#[derive(Parser)]
#[command(name = "fireflow")]
#[command(about = "Firebird SQL operation runner for workflow-automation hosts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a job document
    Run {
        /// Path to the job JSON file, or '-' for stdin
        #[arg(long)]
        job: PathBuf,

        /// Connection profile name (overrides the job document)
        #[arg(long)]
        connection: Option<String>,

        /// Capture a failure as an error record instead of aborting
        #[arg(long)]
        continue_on_fail: bool,
    },

    /// Manage connection profiles
    Connections {
        #[command(subcommand)]
        action: ConnectionsCmd,
    },
}

#[derive(Subcommand)]
enum ConnectionsCmd {
    /// List profile names from local and global config files
    List,

    /// Save a profile from a JSON file
    Save {
        /// Profile name
        #[arg(long)]
        name: String,

        /// Path to a JSON file holding the connection parameters
        #[arg(long)]
        file: PathBuf,

        /// Save to the global config instead of the local one
        #[arg(long)]
        global: bool,
    },
}

/// One job: where to connect, what to run, and the input items
#[derive(Debug, Deserialize)]
struct JobDocument {
    /// Inline credentials (highest precedence)
    #[serde(default)]
    credentials: Option<ConnectionParams>,

    /// Named connection profile to resolve when no inline credentials
    #[serde(default)]
    connection: Option<String>,

    /// Operation description, tagged by `operation`
    operation: serde_json::Value,

    /// Input items
    #[serde(default)]
    items: Vec<InputRecord>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run { job, connection, continue_on_fail } => {
            run_job(&job, connection.as_deref(), continue_on_fail).await
        }
        Commands::Connections { action } => connections_cmd(action),
    };

    std::process::exit(exit_code);
}

/// Execute one job document and print the result envelope
async fn run_job(job_path: &Path, connection: Option<&str>, continue_on_fail: bool) -> i32 {
    match execute_job(job_path, connection, continue_on_fail).await {
        Ok(envelope) => {
            print_json(&envelope);
            0
        }
        Err((operation, err)) => {
            print_json(&ErrorEnvelope::from_error(operation, &err));
            1
        }
    }
}

/// Load, resolve, and run a job; errors carry the operation kind when known
async fn execute_job(
    job_path: &Path,
    connection: Option<&str>,
    continue_on_fail: bool,
) -> Result<SuccessEnvelope<Vec<fireflow::OutputRecord>>, (String, FireflowError)> {
    let job = load_job(job_path).map_err(|e| (String::new(), e))?;

    let operation =
        SqlOperation::from_value(&job.operation).map_err(|e| (String::new(), e))?;
    let kind = operation.kind().to_string();

    let credentials = match job.credentials {
        Some(credentials) => credentials,
        None => resolve_connection(connection.or(job.connection.as_deref()))
            .map_err(|e| (kind.clone(), e))?,
    };

    let started = Instant::now();
    let records = dispatch(&credentials, &operation, &job.items, continue_on_fail)
        .await
        .map_err(|e| (kind.clone(), e))?;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let rows = records.len();
    Ok(SuccessEnvelope::new(kind, records, Metadata::with_rows(elapsed_ms, rows)))
}

#[cfg(feature = "firebird")]
async fn dispatch(
    credentials: &ConnectionParams,
    operation: &SqlOperation,
    items: &[InputRecord],
    continue_on_fail: bool,
) -> fireflow::Result<Vec<fireflow::OutputRecord>> {
    fireflow::run(
        &fireflow::Firebird,
        credentials,
        operation,
        items,
        RunOptions { continue_on_fail },
    )
    .await
}

#[cfg(not(feature = "firebird"))]
async fn dispatch(
    _credentials: &ConnectionParams,
    _operation: &SqlOperation,
    _items: &[InputRecord],
    _continue_on_fail: bool,
) -> fireflow::Result<Vec<fireflow::OutputRecord>> {
    Err(FireflowError::invalid_input(
        "this binary was built without the 'firebird' driver feature",
    ))
}

/// Read and parse the job document (`-` reads stdin)
fn load_job(path: &Path) -> fireflow::Result<JobDocument> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| FireflowError::invalid_input(format!("Could not read stdin: {e}")))?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            FireflowError::invalid_input(format!("Could not read job file: {e}"))
        })?
    };

    serde_json::from_str(&contents)
        .map_err(|e| FireflowError::invalid_input(format!("Invalid job document: {e}")))
}

/// Connection profile maintenance
fn connections_cmd(action: ConnectionsCmd) -> i32 {
    match action {
        ConnectionsCmd::List => match list_connections() {
            Ok(names) => {
                let listing: Vec<serde_json::Value> = names
                    .into_iter()
                    .map(|(name, location)| {
                        serde_json::json!({
                            "name": name,
                            "location": match location {
                                ConfigLocation::Local => "local",
                                ConfigLocation::Global => "global",
                            },
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({"ok": true, "connections": listing}));
                0
            }
            Err(err) => {
                print_json(&ErrorEnvelope::from_error("", &err));
                1
            }
        },
        ConnectionsCmd::Save { name, file, global } => {
            let result = std::fs::read_to_string(&file)
                .map_err(|e| {
                    FireflowError::invalid_input(format!("Could not read connection file: {e}"))
                })
                .and_then(|contents| {
                    serde_json::from_str::<StoredConnection>(&contents).map_err(|e| {
                        FireflowError::invalid_input(format!("Invalid connection file: {e}"))
                    })
                })
                .and_then(|connection| {
                    let location =
                        if global { ConfigLocation::Global } else { ConfigLocation::Local };
                    save_connection(&name, connection, location)
                });

            match result {
                Ok(()) => {
                    print_json(&serde_json::json!({"ok": true, "saved": name}));
                    0
                }
                Err(err) => {
                    print_json(&ErrorEnvelope::from_error("", &err));
                    1
                }
            }
        }
    }
}

/// Print a value as one JSON document on stdout
fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            // Serialization of our own output types should never fail.
            eprintln!("failed to serialize output: {e}");
        }
    }
}
