//! Read-only lookups from the command line.
//!
//! Runs a repository operation against the configured database and prints
//! its envelope as pretty JSON on stdout. An error envelope is still
//! printed, and the process then exits with status 1.

use anyhow::Result;
use serde::Serialize;

use kernel_planckster_core::envelope::Envelope;
use kernel_planckster_core::lfn;
use kernel_planckster_core::log::TracingLog;
use kernel_planckster_core::models::{ResearchContext, SourceData};
use kernel_planckster_core::Repository;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Looks up a research context by id.
pub async fn get_context(config: &Config, id: i64) -> Result<Envelope<ResearchContext>> {
    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool.clone());
    let log = TracingLog::new("cli");

    let envelope = Repository::new(&store, &log)
        .get_research_context(Some(id))
        .await;
    pool.close().await;
    envelope
}

/// Lists the source data cited by a message.
pub async fn get_sources(config: &Config, message_id: i64) -> Result<Envelope<Vec<SourceData>>> {
    let pool = db::connect(&config.db).await?;
    let store = SqliteStore::new(pool.clone());
    let log = TracingLog::new("cli");

    let envelope = Repository::new(&store, &log)
        .list_message_sources(Some(message_id))
        .await;
    pool.close().await;
    envelope
}

pub async fn run_context(config: &Config, id: i64) -> Result<()> {
    print_envelope(&get_context(config, id).await?)
}

pub async fn run_sources(config: &Config, message_id: i64) -> Result<()> {
    print_envelope(&get_sources(config, message_id).await?)
}

/// Prints the canonical form of `path`.
pub fn run_lfn(path: &str) {
    println!("{}", lfn::canonicalize(path));
}

fn print_envelope<T: Serialize>(envelope: &Envelope<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    if !envelope.status() {
        std::process::exit(1);
    }
    Ok(())
}
