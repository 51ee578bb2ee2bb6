//! # Kernel Planckster Core
//!
//! Storage-agnostic logic for Kernel Planckster: domain models, the
//! result/error envelope protocol, the Logical File Name codec, the
//! persistence lookup abstraction, and the repository operations built on
//! top of them.
//!
//! This crate contains no tokio, sqlx, or HTTP dependencies. Backends plug
//! in through [`store::PersistenceLookup`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Domain entities and their enums |
//! | [`envelope`] | `Envelope<T>`, error taxonomy, error-envelope factory |
//! | [`lfn`] | Logical File Name value type and canonicalization |
//! | [`log`] | Operation log collaborator (`tracing` and in-memory) |
//! | [`store`] | `PersistenceLookup` trait, rows, relations, in-memory store |
//! | [`repository`] | Lookup operations returning envelopes |

pub mod envelope;
pub mod lfn;
pub mod log;
pub mod models;
pub mod repository;
pub mod store;

pub use envelope::{Attribute, ContractViolation, Envelope, ErrorCode, ErrorEnvelope, ErrorKind};
pub use lfn::Lfn;
pub use repository::Repository;
