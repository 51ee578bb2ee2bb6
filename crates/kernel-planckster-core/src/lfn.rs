//! Logical File Names.
//!
//! An [`Lfn`] addresses a stored artifact independently of the backend
//! holding it (object store, NAS, local disk). Its `relative_path` is always
//! canonical: a flat, whitelisted file name carrying a random 128-bit id and
//! the [`MARKER`] token.
//!
//! # Canonicalization
//!
//! 1. A path that is already canonical is returned unchanged.
//! 2. Only the final `/`-separated segment is kept.
//! 3. Characters outside `[a-zA-Z0-9_./-]` are dropped, then every
//!    [`MARKER`] left in the segment is removed.
//! 4. `name` is the text before the first `.`, `ext` the text after the
//!    last `.`. Without a dot both are the whole segment.
//! 5. The result is `{name}-{32 hex digits}-sdamarker.{ext}`.
//!
//! Step 4 truncates names with inner dots: `final.report.pdf` becomes
//! `final-…-sdamarker.pdf`.
//!
//! Decoding is strict: a stored `relativePath` that is not canonical is an
//! error, so reading the same row twice yields the same `Lfn`.
//!
//! ```rust
//! use kernel_planckster_core::lfn::{canonicalize, MARKER};
//!
//! let path = canonicalize("/tmp/reports/final.report.pdf");
//! assert!(path.starts_with("final-"));
//! assert!(path.ends_with(&format!("-{MARKER}.pdf")));
//! assert_eq!(canonicalize(&path), path);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Protocol, SourceKind};

/// Token identifying canonical paths.
pub const MARKER: &str = "sdamarker";

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-')
}

/// True if `path` carries the marker and only whitelisted characters.
pub fn is_canonical(path: &str) -> bool {
    path.contains(MARKER) && path.chars().all(is_allowed)
}

/// Rewrites a proposed storage path into canonical form.
///
/// Total over all strings and idempotent. Each call draws a fresh random id,
/// so two calls on the same non-canonical input differ.
pub fn canonicalize(path: &str) -> String {
    if is_canonical(path) {
        return path.to_string();
    }

    let base = path.rsplit('/').next().unwrap_or(path);
    let mut cleaned: String = base.chars().filter(|c| is_allowed(*c)).collect();
    while cleaned.contains(MARKER) {
        cleaned = cleaned.replace(MARKER, "");
    }

    let name = cleaned.split('.').next().unwrap_or_default();
    let ext = cleaned.rsplit('.').next().unwrap_or_default();
    let seed = Uuid::new_v4().simple();

    format!("{name}-{seed}-{MARKER}.{ext}")
}

/// Backend-agnostic address of a stored artifact.
///
/// Immutable once built; an artifact that moves gets a new `Lfn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LfnWire")]
pub struct Lfn {
    protocol: Protocol,
    tracer_id: String,
    job_id: i64,
    source: SourceKind,
    relative_path: String,
}

/// Accepts both the camelCase wire keys and the snake_case keys written by
/// older rows.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LfnWire {
    protocol: Protocol,
    #[serde(alias = "tracer_id")]
    tracer_id: String,
    #[serde(alias = "job_id")]
    job_id: i64,
    source: SourceKind,
    #[serde(alias = "relative_path")]
    relative_path: String,
}

impl TryFrom<LfnWire> for Lfn {
    type Error = String;

    fn try_from(w: LfnWire) -> Result<Self, Self::Error> {
        if !is_canonical(&w.relative_path) {
            return Err(format!("relativePath '{}' is not canonical", w.relative_path));
        }
        Ok(Self {
            protocol: w.protocol,
            tracer_id: w.tracer_id,
            job_id: w.job_id,
            source: w.source,
            relative_path: w.relative_path,
        })
    }
}

impl Lfn {
    /// Builds an `Lfn`, canonicalizing `relative_path`.
    pub fn new(
        protocol: Protocol,
        tracer_id: impl Into<String>,
        job_id: i64,
        source: SourceKind,
        relative_path: impl AsRef<str>,
    ) -> Self {
        Self {
            protocol,
            tracer_id: tracer_id.into(),
            job_id,
            source,
            relative_path: canonicalize(relative_path.as_ref()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Id of the uploader/tenant that produced the artifact.
    pub fn tracer_id(&self) -> &str {
        &self.tracer_id
    }

    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }
}

/// Serializes to `{protocol, tracerId, jobId, source, relativePath}`.
pub fn serialize(lfn: &Lfn) -> Result<String, serde_json::Error> {
    serde_json::to_string(lfn)
}

/// Inverse of [`serialize`]. Fails if `relativePath` is not canonical.
pub fn deserialize(json: &str) -> Result<Lfn, serde_json::Error> {
    serde_json::from_str(json)
}

impl fmt::Display for Lfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serialize(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromStr for Lfn {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        deserialize(s)
    }
}
