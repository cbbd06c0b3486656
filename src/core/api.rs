//! HTTP + WebSocket API for the confidence tracker
//!
//! Endpoints:
//! - POST /transcriptions - Ingest one model response (or a failed call)
//! - GET /dataset - Consolidated dataset
//! - GET /dates/:date - One date bucket; free-text dates are normalized
//! - GET /analysis - Analysis report
//! - WS /ws - Live ingest updates
//! - GET /health - Health check
//!
//! Parsing runs under the read lock; merging takes the write lock, which
//! makes it the only place the dataset is mutated.

use std::path::PathBuf;
use std::sync::Arc;
use axum::{
    extract::{Path, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};

use crate::core::{save_dataset, Analyzer, Ingestor};
use crate::types::{AnalysisReport, ConsolidatedDataset, DateBucket, IngestSummary, MergeStats, SourceOutcome};

/// Live update sent to WebSocket subscribers after every ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestUpdate {
    pub source: String,
    pub success: bool,
    pub entries_added: usize,
    pub dates_touched: Vec<String>,
    pub total_dates: usize,
    pub total_entries: usize,
}

/// App state
pub struct AppState {
    pub ingestor: RwLock<Ingestor>,
    /// Where the dataset is rewritten after each ingest, if anywhere
    pub data_path: Option<PathBuf>,
    /// Held from the merge until its snapshot is written, so files land in merge order
    pub persist_lock: Mutex<()>,
    pub update_tx: broadcast::Sender<IngestUpdate>,
}

/// Ingest request: the model's text, or the error its call failed with
#[derive(Debug, Deserialize)]
pub struct TranscriptionRequest {
    pub source: String,
    pub text: Option<String>,
    pub error: Option<String>,
}

/// Ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    pub outcome: SourceOutcome,
    pub merge: MergeStats,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dates_tracked: usize,
    pub total_entries: usize,
    pub summary: IngestSummary,
}

/// Create the API router
pub fn create_router(ingestor: Ingestor, data_path: Option<PathBuf>) -> Router {
    let (update_tx, _) = broadcast::channel(100);
    let state = Arc::new(AppState {
        ingestor: RwLock::new(ingestor),
        data_path,
        persist_lock: Mutex::new(()),
        update_tx,
    });

    Router::new()
        .route("/health", get(health))
        .route("/transcriptions", post(add_transcription))
        .route("/dataset", get(get_dataset))
        .route("/dates/:date", get(get_date))
        .route("/analysis", get(get_analysis))
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ingestor = state.ingestor.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        dates_tracked: ingestor.dataset().len(),
        total_entries: ingestor.dataset().total_entries(),
        summary: ingestor.summary().clone(),
    })
}

/// Parse one response and merge it
async fn add_transcription(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscriptionRequest>,
) -> Result<Json<TranscriptionResponse>, StatusCode> {
    let response = match (req.text, req.error) {
        (Some(text), _) => Ok(text),
        (None, Some(error)) => Err(error),
        (None, None) => return Err(StatusCode::BAD_REQUEST),
    };

    let outcome = state.ingestor.read().await.transcribe(&req.source, response);

    let mut ingestor = state.ingestor.write().await;
    let merge = ingestor.absorb(&outcome);
    let snapshot = match &state.data_path {
        Some(path) => Some((path.clone(), ingestor.dataset().clone(), state.persist_lock.lock().await)),
        None => None,
    };

    let update = IngestUpdate {
        source: outcome.source.clone(),
        success: outcome.success,
        entries_added: merge.entries_added,
        dates_touched: merge.dates_touched.clone(),
        total_dates: ingestor.dataset().len(),
        total_entries: ingestor.dataset().total_entries(),
    };
    drop(ingestor);

    if let Some((path, dataset, _turn)) = snapshot {
        persist(dataset, path).await;
    }
    let _ = state.update_tx.send(update);

    Ok(Json(TranscriptionResponse { outcome, merge }))
}

/// Write a dataset snapshot off the async runtime
async fn persist(dataset: ConsolidatedDataset, path: PathBuf) {
    match tokio::task::spawn_blocking(move || save_dataset(&dataset, &path)).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(%error, "failed to persist dataset"),
        Err(error) => warn!(%error, "dataset writer panicked"),
    }
}

/// Whole dataset in its persisted shape
async fn get_dataset(State(state): State<Arc<AppState>>) -> Json<ConsolidatedDataset> {
    Json(state.ingestor.read().await.dataset().clone())
}

/// One date bucket
async fn get_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<DateBucket>, StatusCode> {
    let ingestor = state.ingestor.read().await;
    let key = ingestor.extractor().normalizer().normalize(&date);
    let bucket = ingestor.dataset().get(&key).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(bucket.clone()))
}

/// Analysis of the current dataset
async fn get_analysis(State(state): State<Arc<AppState>>) -> Result<Json<AnalysisReport>, StatusCode> {
    let ingestor = state.ingestor.read().await;
    let analyzer = Analyzer::new(ingestor.dataset()).map_err(|error| {
        warn!(%error, "analysis unavailable");
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    Ok(Json(analyzer.report()))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.update_tx.subscribe();
    ws.on_upgrade(move |socket| handle_websocket(socket, rx))
}

/// Forward updates until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<IngestUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let json = serde_json::to_string(&update).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    });

    let mut drain = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut forward => drain.abort(),
        _ = &mut drain => forward.abort(),
    }
}

/// Run the API server
pub async fn run_server(
    addr: &str,
    ingestor: Ingestor,
    data_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(ingestor, data_path);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "confidence tracker API listening");
    info!("  POST /transcriptions - Ingest a response");
    info!("  GET  /dataset        - Consolidated dataset");
    info!("  GET  /dates/:date    - One date");
    info!("  GET  /analysis       - Analysis report");
    info!("  WS   /ws             - Live updates");
    info!("  GET  /health         - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
