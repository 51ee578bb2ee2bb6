//! JSON HTTP server.
//!
//! Every repository operation is exposed as a `GET` route. Response bodies
//! are the operation's envelope in its wire shape; the HTTP status mirrors
//! the envelope's error code.
//!
//! # Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | `GET` | `/ping` | Health check (returns version) |
//! | `GET` | `/research-contexts/{id}` | `get_research_context` |
//! | `GET` | `/research-contexts/{id}/user` | `get_research_context_user` |
//! | `GET` | `/research-contexts/{id}/conversations` | `list_conversations` |
//! | `GET` | `/conversations/{id}/messages` | `list_conversation_messages` |
//! | `GET` | `/messages/{id}/sources` | `list_message_sources` |
//! | `GET` | `/knowledge-sources/{id}/source-data` | `list_source_data` |
//! | `GET` | `/source-data/{id}` | `get_source_data` |
//!
//! # Status mapping
//!
//! | Envelope | Status |
//! |----------|--------|
//! | `status: true` | 200 |
//! | code `-1` (missing attribute) | 400 |
//! | code `-2` (not found) | 404 |
//! | code `-3` (missing dependent data) | 422 |
//!
//! Failures that are not envelopes (a malformed id in the path, a database
//! error) use the error body
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid id: 'abc'" } }
//! ```
//!
//! with codes `bad_request` (400) and `internal` (500).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};

use kernel_planckster_core::envelope::{Envelope, ErrorCode};
use kernel_planckster_core::log::TracingLog;
use kernel_planckster_core::Repository;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: SqliteStore,
    log: TracingLog,
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(&config.db).await?;
    let app = router(pool);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Builds the application router over an open pool.
pub fn router(pool: SqlitePool) -> Router {
    let state = AppState {
        store: SqliteStore::new(pool),
        log: TracingLog::new("server"),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ping", get(handle_ping))
        .route("/research-contexts/{id}", get(handle_research_context))
        .route("/research-contexts/{id}/user", get(handle_research_context_user))
        .route(
            "/research-contexts/{id}/conversations",
            get(handle_list_conversations),
        )
        .route("/conversations/{id}/messages", get(handle_list_messages))
        .route("/messages/{id}/sources", get(handle_list_message_sources))
        .route(
            "/knowledge-sources/{id}/source-data",
            get(handle_list_source_data),
        )
        .route("/source-data/{id}", get(handle_source_data))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Non-envelope failure that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal".to_string(),
            message: err.to_string(),
        }
    }
}

// ============ Envelope response ============

fn status_for<T>(envelope: &Envelope<T>) -> StatusCode {
    match envelope.error_envelope().map(|err| err.code) {
        None => StatusCode::OK,
        Some(ErrorCode::MissingAttribute) => StatusCode::BAD_REQUEST,
        Some(ErrorCode::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorCode::MissingDependentData) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn respond<T: Serialize>(envelope: anyhow::Result<Envelope<T>>) -> Result<Response, AppError> {
    let envelope = envelope?;
    Ok((status_for(&envelope), Json(envelope)).into_response())
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| bad_request(format!("invalid id: '{raw}'")))
}

impl AppState {
    fn repository(&self) -> Repository<'_> {
        Repository::new(&self.store, &self.log)
    }
}

// ============ GET /ping ============

#[derive(Serialize)]
struct PingResponse {
    status: String,
    version: String,
}

async fn handle_ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Research contexts ============

async fn handle_research_context(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().get_research_context(Some(id)).await)
}

async fn handle_research_context_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().get_research_context_user(Some(id)).await)
}

async fn handle_list_conversations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().list_conversations(Some(id)).await)
}

// ============ Conversations and messages ============

async fn handle_list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().list_conversation_messages(Some(id)).await)
}

async fn handle_list_message_sources(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().list_message_sources(Some(id)).await)
}

// ============ Source data ============

async fn handle_list_source_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().list_source_data(Some(id)).await)
}

async fn handle_source_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    respond(state.repository().get_source_data(Some(id)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_planckster_core::envelope::{Attribute, ErrorKind};
    use kernel_planckster_core::models::EntityKind;

    #[test]
    fn test_status_mapping() {
        let ok: Envelope<()> = Envelope::Ok(());
        assert_eq!(status_for(&ok), StatusCode::OK);

        let missing: Envelope<()> = Envelope::error(
            EntityKind::Message,
            ErrorKind::missing_attribute(Attribute::Id),
        );
        assert_eq!(status_for(&missing), StatusCode::BAD_REQUEST);

        let not_found: Envelope<()> =
            Envelope::error(EntityKind::User, ErrorKind::not_found(Attribute::Id, 3));
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);

        let dependent: Envelope<()> = Envelope::error(
            EntityKind::ResearchContext,
            ErrorKind::missing_dependent_data(Attribute::Id, 3, "user"),
        );
        assert_eq!(status_for(&dependent), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 7 ").unwrap(), 7);
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "bad_request");
    }
}
