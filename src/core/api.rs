//! HTTP API for Rapport
//!
//! Stateless: every request carries the data it needs and mutating calls hand the
//! updated `RelationshipState` back to the caller.
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /stages - Stage table
//! - POST /analyze - Score one exchange
//! - POST /progress - Progress increase for given metrics
//! - POST /milestones - Milestones for given metrics
//! - POST /readiness - Stage readiness over a caller-supplied milestone window
//! - POST /turn - Full pipeline for one turn
//! - POST /advance - Advancement request

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::EngineConfig;
use crate::core::RelationshipEngine;
use crate::types::{
    Advancement, BehaviorHistory, ConversationMetrics, EngineError, HistoryMessage,
    MilestoneEvent, RelationshipContext, RelationshipState, StageConfig, StageReadiness,
    TurnInput, TurnOutcome, ValidationError,
};

/// App state
pub struct AppState {
    pub engine: RelationshipEngine,
}

/// Analyze request
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub bot_response: String,
}

/// Progress request
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub metrics: ConversationMetrics,
    #[serde(default)]
    pub context: RelationshipContext,
    #[serde(default)]
    pub behavior: Option<BehaviorHistory>,
}

/// Progress response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress_increase: u32,
}

/// Milestones request
#[derive(Debug, Deserialize)]
pub struct MilestonesRequest {
    pub metrics: ConversationMetrics,
    #[serde(default)]
    pub context: RelationshipContext,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    /// User's side of the exchange, for text rules such as "Making Plans"
    #[serde(default)]
    pub user_message: String,
    /// Existing log; one-time milestones already in it are not emitted again
    #[serde(default)]
    pub log: Vec<MilestoneEvent>,
}

/// Milestones response
#[derive(Debug, Serialize, Deserialize)]
pub struct MilestonesResponse {
    pub milestones: Vec<MilestoneEvent>,
}

/// Readiness request
#[derive(Debug, Deserialize)]
pub struct ReadinessRequest {
    pub current_progress: u32,
    #[serde(default)]
    pub context: RelationshipContext,
    #[serde(default)]
    pub recent_milestones: Vec<MilestoneEvent>,
}

/// Turn request
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub state: RelationshipState,
    pub turn: TurnInput,
}

/// Turn response
#[derive(Debug, Serialize, Deserialize)]
pub struct TurnResponse {
    pub state: RelationshipState,
    pub outcome: TurnOutcome,
}

/// Advance request
#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub state: RelationshipState,
}

/// Advance response
#[derive(Debug, Serialize, Deserialize)]
pub struct AdvanceResponse {
    pub state: RelationshipState,
    pub advancement: Advancement,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Engine errors as HTTP responses
#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(EngineError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse { error: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

/// Create the API router
pub fn create_router(config: &EngineConfig) -> Router {
    let state = Arc::new(AppState {
        engine: RelationshipEngine::from_config(config),
    });

    Router::new()
        .route("/health", get(health))
        .route("/stages", get(stages))
        .route("/analyze", post(analyze))
        .route("/progress", post(progress))
        .route("/milestones", post(milestones))
        .route("/readiness", post(readiness))
        .route("/turn", post(turn))
        .route("/advance", post(advance))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Stage table
async fn stages() -> Json<Vec<StageConfig>> {
    Json(StageConfig::table())
}

/// Score one exchange
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Json<ConversationMetrics> {
    Json(state.engine.analyzer().analyze(&req.user_message, &req.bot_response))
}

/// Progress increase for the given metrics and context
async fn progress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress_increase = state
        .engine
        .calculator()
        .calculate_progress_increase(&req.metrics, &req.context, req.behavior.as_ref())?;
    Ok(Json(ProgressResponse { progress_increase }))
}

/// Milestones satisfied by the given metrics
async fn milestones(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MilestonesRequest>,
) -> Json<MilestonesResponse> {
    let milestones = state.engine.detector().check_for_new_milestones(
        &req.metrics,
        &req.context,
        &req.history,
        &req.user_message,
        &req.log,
        Utc::now(),
    );
    Json(MilestonesResponse { milestones })
}

/// Readiness over the caller-supplied window
async fn readiness(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadinessRequest>,
) -> Json<StageReadiness> {
    Json(state.engine.gate().calculate_stage_readiness(
        req.current_progress,
        &req.context,
        &req.recent_milestones,
    ))
}

/// Full pipeline for one turn
async fn turn(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let mut relationship = req.state;
    let outcome = state.engine.process_turn(&mut relationship, &req.turn)?;
    Ok(Json(TurnResponse { state: relationship, outcome }))
}

/// Advancement request
async fn advance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdvanceRequest>,
) -> Json<AdvanceResponse> {
    let mut relationship = req.state;
    let advancement = state.engine.request_advancement(&mut relationship);
    Json(AdvanceResponse { state: relationship, advancement })
}

/// Run the API server
pub async fn run_server(addr: &str, config: &EngineConfig) -> Result<(), EngineError> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "Rapport API listening");
    println!("Rapport API running on {}", addr);
    println!("  GET  /health     - Health check");
    println!("  GET  /stages     - Stage table");
    println!("  POST /analyze    - Score one exchange");
    println!("  POST /progress   - Progress increase");
    println!("  POST /milestones - Milestone detection");
    println!("  POST /readiness  - Stage readiness");
    println!("  POST /turn       - Full turn pipeline");
    println!("  POST /advance    - Advancement request");
    axum::serve(listener, router).await?;
    Ok(())
}
