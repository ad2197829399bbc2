//! HTTP API server for integration with other systems.
//!
//! Provides REST endpoints for ingestion, retrieval and question answering.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::error::HarkError;
use crate::orchestrator::{IngestReport, Orchestrator};
use crate::rag::{AnswerEngine, Hit};
use crate::vector_store::IndexedSource;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    engine: AnswerEngine,
    default_top_k: usize,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let engine = AnswerEngine::from_settings(&settings.generation, prompts)?;
    let default_top_k = settings.retrieval.top_k;
    let orchestrator = Orchestrator::new(settings).await?;

    let state = Arc::new(AppState {
        orchestrator,
        engine,
        default_top_k,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Hark API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Ingest", "POST   /ingest");
    Output::kv("Search", "POST   /search");
    Output::kv("Ask", "POST   /ask");
    Output::kv("List Sources", "GET    /sources");
    Output::kv("Remove Source", "DELETE /sources/:source_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/search", post(search))
        .route("/ask", post(ask))
        .route("/sources", get(list_sources))
        .route("/sources/{source_id}", delete(remove_source))
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct IngestRequest {
    /// Local audio file, or transcript JSON when `transcript` is set
    path: String,
    /// Re-process even if already indexed
    #[serde(default)]
    force: bool,
    #[serde(default)]
    transcript: bool,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    hits: Vec<Hit>,
}

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<IndexedSource>,
    total: usize,
}

#[derive(Serialize)]
struct RemoveResponse {
    source_id: String,
    passages_removed: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(e: HarkError) -> Response {
    let status = match &e {
        HarkError::SourceNotFound(_) => StatusCode::NOT_FOUND,
        HarkError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Request failed: {}", e);
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ingest(State(state): State<Arc<AppState>>, Json(req): Json<IngestRequest>) -> Response {
    let path = std::path::Path::new(&req.path);
    let result: crate::error::Result<IngestReport> = if req.transcript {
        state.orchestrator.ingest_transcript(path, req.force).await
    } else {
        state.orchestrator.ingest_file(path, req.force).await
    };

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    let top_k = req.top_k.unwrap_or(state.default_top_k);
    match state.orchestrator.retrieve(&req.query, top_k).await {
        Ok(hits) => Json(SearchResponse { hits }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let top_k = req.top_k.unwrap_or(state.default_top_k);
    let hits = match state.orchestrator.retrieve(&req.question, top_k).await {
        Ok(hits) => hits,
        Err(e) => return error_response(e),
    };

    let answer = state.engine.answer(&req.question, &hits).await;
    Json(AskResponse {
        answer: answer.text,
        provider: answer.provider,
        hits,
    })
    .into_response()
}

async fn list_sources(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.list_sources().await {
        Ok(sources) => Json(SourcesResponse {
            total: sources.len(),
            sources,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn remove_source(State(state): State<Arc<AppState>>, Path(source_id): Path<String>) -> Response {
    match state.orchestrator.remove_source(&source_id).await {
        Ok(passages_removed) => Json(RemoveResponse {
            source_id,
            passages_removed,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let resp = error_response(HarkError::SourceNotFound("ep".to_string()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = error_response(HarkError::InvalidInput("bad".to_string()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = error_response(HarkError::VectorStore("down".to_string()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_defaults() {
        let req: IngestRequest = serde_json::from_str(r#"{"path": "ep.mp3"}"#).unwrap();
        assert!(!req.force);
        assert!(!req.transcript);

        let req: SearchRequest = serde_json::from_str(r#"{"query": "rust"}"#).unwrap();
        assert_eq!(req.top_k, None);
    }
}
