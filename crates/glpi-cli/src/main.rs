//! GLPI Assist CLI
//!
//! - `seed incidents`: insert synthetic cloud incidents into `glpi_tickets`
//! - `seed changes`: insert changes correlated with existing incidents
//! - `serve`: run the chat-assistant HTTP backend

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod chat_server;
mod seed;

#[derive(Parser)]
#[command(name = "glpi-assist")]
#[command(author, version, about = "GLPI Assist: database seeding and chat backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a GLPI database with synthetic records.
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },

    /// Serve the chat assistant over HTTP (`POST /chat`, `GET /health`).
    ///
    /// Requires `GLPI_URL`, `GLPI_APP_TOKEN` and `GLPI_USER_TOKEN`.
    Serve(ServeArgs),
}

#[derive(Subcommand)]
enum SeedCommands {
    /// Generate incidents and insert them in a single transaction.
    Incidents {
        #[arg(long, default_value_t = glpi_seed::pipeline::DEFAULT_INCIDENT_COUNT)]
        count: usize,

        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Generate changes linked to existing incidents, one transaction per batch.
    Changes(SeedChangesArgs),
}

#[derive(Args, Debug, Clone)]
struct DatabaseArgs {
    /// Database URL (`mysql://...` or `sqlite://...`).
    ///
    /// Defaults to a MySQL URL built from `DB_HOST`, `DB_PORT`, `DB_USER`,
    /// `DB_PASSWORD` and `DB_NAME`.
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct SeedChangesArgs {
    /// Number of changes to generate.
    #[arg(long, default_value_t = glpi_seed::pipeline::DEFAULT_TOTAL_CHANGES)]
    total: usize,

    /// Changes per transaction.
    #[arg(long, default_value_t = glpi_seed::pipeline::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Maximum incidents sampled for correlation.
    #[arg(long, default_value_t = glpi_seed::pipeline::DEFAULT_FETCH_LIMIT)]
    fetch_limit: u32,

    /// Draw a fresh incident sample for every batch instead of once per run.
    #[arg(long)]
    resample_each_batch: bool,

    #[command(flatten)]
    db: DatabaseArgs,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Listen address (use `127.0.0.1:0` to auto-pick a free port).
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: SocketAddr,

    /// Answer from GLPI context only, without calling an LLM.
    #[arg(long)]
    llm_mock: bool,

    /// Ollama host (default `http://127.0.0.1:11434`).
    #[arg(long, env = "OLLAMA_HOST")]
    llm_ollama_host: Option<String>,

    /// Ollama model name.
    #[arg(long, env = "OLLAMA_MODEL", default_value = glpi_chat::llm::DEFAULT_MODEL)]
    llm_model: String,

    /// Sampling temperature passed to the model.
    #[arg(long, default_value_t = glpi_chat::llm::DEFAULT_TEMPERATURE)]
    llm_temperature: f32,

    /// LLM request timeout in seconds. `0` disables the timeout.
    #[arg(
        long,
        env = "GLPI_ASSIST_LLM_TIMEOUT_SECS",
        default_value_t = glpi_chat::llm::DEFAULT_TIMEOUT_SECS
    )]
    llm_timeout_secs: u64,

    /// If set, write a small JSON file once the server is listening.
    ///
    /// Useful for scripts/tests to learn the chosen port when `--listen ...:0`.
    #[arg(long)]
    ready_file: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Seed { command } => match command {
            SeedCommands::Incidents { count, db } => seed::cmd_seed_incidents(count, &db),
            SeedCommands::Changes(args) => seed::cmd_seed_changes(&args),
        },
        Commands::Serve(args) => chat_server::cmd_serve(args),
    }
}
