//! # Kernel Planckster CLI (`kp`)
//!
//! ## Usage
//!
//! ```bash
//! kp --config ./config/kp.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kp init` | Create the SQLite database and run schema migrations |
//! | `kp serve` | Start the HTTP server |
//! | `kp lfn <path>` | Print the canonical storage path for `path` |
//! | `kp context <id>` | Print a research context envelope |
//! | `kp sources <message-id>` | Print the sources cited by a message |
//!
//! Logs go to stderr. `RUST_LOG` overrides `[logging].level`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kernel_planckster::config::{self, LoggingConfig};
use kernel_planckster::{inspect, logging, migrate, server};

/// Kernel Planckster CLI: research contexts, conversations and their sources.
#[derive(Parser)]
#[command(name = "kp", version, about = "Kernel Planckster backend")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Print the canonical storage path for a proposed file path.
    ///
    /// Does not read the config file.
    Lfn {
        /// Proposed path, e.g. `/tmp/reports/final.pdf`.
        path: String,
    },

    /// Print the research context with the given id.
    Context {
        /// Research context id.
        id: i64,
    },

    /// Print the source data cited by a message.
    Sources {
        /// Message id.
        message_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Lfn { path } = &cli.command {
        logging::init_tracing(&LoggingConfig::default())?;
        inspect::run_lfn(path);
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init_tracing(&cfg.logging)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Context { id } => {
            inspect::run_context(&cfg, id).await?;
        }
        Commands::Sources { message_id } => {
            inspect::run_sources(&cfg, message_id).await?;
        }
        Commands::Lfn { .. } => {}
    }

    Ok(())
}
