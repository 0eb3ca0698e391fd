//! # REST API
//!
//! Builds the axum router that exposes the ledger over HTTP. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                 | Description                          |
//! |--------|----------------------|--------------------------------------|
//! | GET    | `/health`            | Liveness probe                       |
//! | GET    | `/status`            | Length, tail hash, digest            |
//! | GET    | `/chain`             | Every block plus the chain length    |
//! | GET    | `/blocks/:index`     | Block by index                       |
//! | GET    | `/blocks/hash/:hash` | Block by hex-encoded hash            |
//! | POST   | `/blocks`            | Append a block                       |
//! | GET    | `/verify`            | Full verification report             |

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mhchain::config::{DIGEST_ALGORITHM, MAX_API_PAYLOAD_BYTES};
use mhchain::storage::{Block, BlockHash, ChainDB, SharedChain, VerifyOptions};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// In-memory chain; the write lock orders concurrent appends.
    pub chain: SharedChain,
    /// On-disk copy of the chain.
    pub db: Arc<ChainDB>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Payload Encoding
// ---------------------------------------------------------------------------

/// How a textual payload maps to bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// The UTF-8 bytes of the string.
    #[default]
    Utf8,
    /// Hex digits, two per byte.
    Hex,
}

impl PayloadEncoding {
    pub fn decode(self, text: &str) -> Result<Vec<u8>, hex::FromHexError> {
        match self {
            PayloadEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            PayloadEncoding::Hex => hex::decode(text),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /blocks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppendRequest {
    pub payload: String,
    #[serde(default)]
    pub encoding: PayloadEncoding,
}

/// Query string of `GET /verify`.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub lenient_genesis: bool,
}

/// One block as rendered by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    /// Position in the chain (genesis = 0).
    pub index: u64,
    /// Hex-encoded block hash.
    pub hash: String,
    /// Hex-encoded predecessor hash (empty for genesis).
    pub predecessor_hash: String,
    /// Hex-encoded payload bytes.
    pub payload_hex: String,
    /// The payload as text, when it is valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_utf8: Option<String>,
}

impl BlockResponse {
    pub fn from_block(index: u64, block: &Block) -> Self {
        Self {
            index,
            hash: block.hash_hex(),
            predecessor_hash: block.predecessor_hash_hex(),
            payload_hex: hex::encode(block.payload()),
            payload_utf8: std::str::from_utf8(block.payload())
                .ok()
                .map(str::to_string),
        }
    }
}

/// Response payload for `GET /chain`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<BlockResponse>,
    pub length: usize,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Number of blocks, genesis included.
    pub length: usize,
    /// Hex-encoded hash of the tail block.
    pub tail_hash: String,
    /// Digest used for block hashes.
    pub digest_algorithm: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // Hex doubles the payload size; leave room for the JSON envelope.
    let body_limit = MAX_API_PAYLOAD_BYTES * 2 + 4096;

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/chain", get(chain_handler))
        .route("/blocks", post(append_handler))
        .route("/blocks/:index", get(block_by_index_handler))
        .route("/blocks/hash/:hash", get(block_by_hash_handler))
        .route("/verify", get(verify_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — chain length and tail.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (length, tail_hash) = state.chain.read(|chain| {
        (
            chain.len(),
            chain.tail().map(|b| b.hash_hex()).unwrap_or_default(),
        )
    });

    Json(StatusResponse {
        version: state.version.clone(),
        length,
        tail_hash,
        digest_algorithm: DIGEST_ALGORITHM.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /chain` — every block in order, with the chain length.
async fn chain_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = state.chain.read(|chain| ChainResponse {
        chain: chain
            .iter()
            .enumerate()
            .map(|(index, block)| BlockResponse::from_block(index as u64, block))
            .collect(),
        length: chain.len(),
    });
    Json(response)
}

/// `GET /blocks/:index` — returns 404 past the tail.
async fn block_by_index_handler(
    Path(index): Path<u64>,
    State(state): State<AppState>,
) -> Response {
    let block = usize::try_from(index)
        .ok()
        .and_then(|i| state.chain.block_at(i));

    match block {
        Some(block) => Json(BlockResponse::from_block(index, &block)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Block not found at index {}", index),
        ),
    }
}

/// `GET /blocks/hash/:hash` — lookup by hex-encoded block hash.
async fn block_by_hash_handler(
    Path(hash_hex): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let hash: BlockHash = match hex::decode(&hash_hex)
        .ok()
        .and_then(|bytes| BlockHash::try_from(bytes).ok())
    {
        Some(hash) => hash,
        None => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid block hash: {}", hash_hex),
            )
        }
    };

    let found = state.chain.read(|chain| {
        chain
            .position_of(&hash)
            .and_then(|index| chain.block_at(index).map(|b| (index, b.clone())))
    });

    match found {
        Some((index, block)) => {
            Json(BlockResponse::from_block(index as u64, &block)).into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Block not found: {}", hash_hex),
        ),
    }
}

/// `POST /blocks` — append a payload and persist the new block.
///
/// Returns 201 with the new block, 400 for undecodable payloads, 413 for
/// payloads above [`MAX_API_PAYLOAD_BYTES`], and 500 if the block cannot be
/// persisted. A block that fails to persist is not added to the chain.
async fn append_handler(
    State(state): State<AppState>,
    Json(request): Json<AppendRequest>,
) -> Response {
    let payload = match request.encoding.decode(&request.payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid payload: {}", e))
        }
    };
    if payload.len() > MAX_API_PAYLOAD_BYTES {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "Payload of {} bytes exceeds the {} byte limit",
                payload.len(),
                MAX_API_PAYLOAD_BYTES
            ),
        );
    }

    let started = Instant::now();
    let db = &state.db;
    let metrics = &state.metrics;
    // Persist and publish the new length under the write lock.
    let appended = state
        .chain
        .append_with(payload, |index, block| -> anyhow::Result<()> {
            db.put_block(index as u64, block).context("Database error")?;
            metrics.chain_length.set(index as i64 + 1);
            Ok(())
        });
    let (index, block) = match appended {
        Ok(appended) => appended,
        Err(e) => {
            tracing::error!("append failed: {:#}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e));
        }
    };

    state
        .metrics
        .append_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    state.metrics.blocks_appended_total.inc();
    tracing::info!(index, hash = %block.hash_hex(), "block appended");

    (
        StatusCode::CREATED,
        Json(BlockResponse::from_block(index as u64, &block)),
    )
        .into_response()
}

/// `GET /verify` — run a full verification pass.
///
/// Always 200 when the walk completes; validity is in the body.
async fn verify_handler(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let options = VerifyOptions {
        strict_genesis: !query.lenient_genesis,
    };

    match state.chain.verify_with(options) {
        Ok(report) => {
            state.metrics.verifications_total.inc();
            state
                .metrics
                .integrity_violations_total
                .inc_by(report.violations.len() as u64);
            Json(report).into_response()
        }
        Err(e) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
