//! # Kernel Planckster
//!
//! Backend for research contexts: users ask questions inside a research
//! context, agents answer with messages that cite stored source data, and
//! every stored artifact is addressed by a Logical File Name.
//!
//! The storage-agnostic logic (envelopes, LFN codec, repository
//! operations) lives in `kernel-planckster-core`. This crate adds the SQLite
//! backend, the HTTP server, and the `kp` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐
//! │   CLI    │   │   HTTP   │
//! │   (kp)   │   │  (axum)  │
//! └────┬─────┘   └────┬─────┘
//!      └──────┬───────┘
//!             ▼
//!      ┌─────────────┐   ┌──────────────┐
//!      │ Repository  │──▶│ SqliteStore  │
//!      │  (core)     │   │ (lookup)     │
//!      └─────────────┘   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite `PersistenceLookup` |
//! | [`server`] | HTTP server |
//! | [`inspect`] | CLI lookups |

pub mod config;
pub mod db;
pub mod inspect;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
