//! REST API Server for the coach
//!
//! Hosts one `CoachSession` per chat id and exposes the saved-plan store.
//! Sessions idle longer than the configured timeout are evicted whenever a
//! new chat opens; clients may also close a chat explicitly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agent::{CoachServices, CoachSession};
use crate::error::CoachError;
use crate::models::{GeneratedPlan, PlanCategory, PlanRequest};

pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const GENERATION_FAILED: &str = "We couldn't generate a plan right now. Please try again.";

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub chat_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SavePlanRequest {
    pub turn_id: Uuid,
    pub category: Option<PlanCategory>,
}

/// A plan produced outside a chat, e.g. by the preferences form
#[derive(Debug, Deserialize)]
pub struct StorePlanRequest {
    pub plan: GeneratedPlan,
    pub category: Option<PlanCategory>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn fail(error: CoachError) -> ApiResult {
    let status = match &error {
        CoachError::SessionBusy => StatusCode::CONFLICT,
        CoachError::TurnNotFound(_) => StatusCode::NOT_FOUND,
        CoachError::NoPlanAttached(_) | CoachError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ApiResponse::error(error.to_string())))
}

fn not_found(what: &str) -> ApiResult {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("{} not found", what))),
    )
}

/// =============================
/// API State
/// =============================

struct SessionEntry {
    session: Arc<CoachSession>,
    last_used: Instant,
}

#[derive(Clone)]
pub struct ApiState {
    services: CoachServices,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
}

impl ApiState {
    pub fn new(services: CoachServices) -> Self {
        Self::with_idle_timeout(services, DEFAULT_SESSION_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(services: CoachServices, idle_timeout: Duration) -> Self {
        Self {
            services,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    async fn session(&self, chat_id: Uuid) -> Option<Arc<CoachSession>> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(&chat_id).map(|entry| {
            entry.last_used = Instant::now();
            entry.session.clone()
        })
    }

    async fn get_or_create_session(&self, chat_id: Uuid) -> Arc<CoachSession> {
        let mut sessions = self.sessions.write().await;

        if let Some(entry) = sessions.get_mut(&chat_id) {
            entry.last_used = Instant::now();
            return entry.session.clone();
        }

        self.evict_idle(&mut sessions);

        info!(%chat_id, open = sessions.len() + 1, "Opening coach session");
        let session = Arc::new(CoachSession::with_id(chat_id, self.services.clone()));
        sessions.insert(
            chat_id,
            SessionEntry {
                session: session.clone(),
                last_used: Instant::now(),
            },
        );
        session
    }

    async fn close_session(&self, chat_id: Uuid) -> bool {
        self.sessions.write().await.remove(&chat_id).is_some()
    }

    /// Drop sessions unused for longer than the idle timeout; a session that
    /// is still answering is kept
    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.session.is_awaiting_response() || entry.last_used.elapsed() < self.idle_timeout
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "Evicted idle coach sessions");
        }
    }
}

/// =============================
/// Helpers — Chat Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Chat ids may be UUIDs or arbitrary client strings
fn chat_uuid(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap_or_else(|_| stable_uuid_from_string(value))
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoints
/// =============================

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> ApiResult {
    let chat_id = match req.chat_id.as_deref() {
        Some(value) if !value.trim().is_empty() => chat_uuid(value),
        _ => Uuid::new_v4(),
    };

    let session = state.get_or_create_session(chat_id).await;

    match session.send(&req.message).await {
        Ok(outcome) => ok(serde_json::json!({
            "chat_id": chat_id,
            "turns": outcome.turns,
            "generation": outcome.generation,
            "collection_state": session.collection_state().await,
        })),
        Err(e) => fail(e),
    }
}

async fn get_chat(State(state): State<ApiState>, Path(chat_id): Path<String>) -> ApiResult {
    match state.session(chat_uuid(&chat_id)).await {
        Some(session) => ok(session.view()),
        None => not_found("Chat"),
    }
}

async fn reset_chat(State(state): State<ApiState>, Path(chat_id): Path<String>) -> ApiResult {
    match state.session(chat_uuid(&chat_id)).await {
        Some(session) => {
            session.abandon().await;
            ok(session.view())
        }
        None => not_found("Chat"),
    }
}

async fn close_chat(State(state): State<ApiState>, Path(chat_id): Path<String>) -> ApiResult {
    let chat_id = chat_uuid(&chat_id);
    if state.close_session(chat_id).await {
        info!(%chat_id, "Chat closed");
        ok(serde_json::json!({ "deleted": chat_id }))
    } else {
        not_found("Chat")
    }
}

async fn save_chat_plan(
    State(state): State<ApiState>,
    Path(chat_id): Path<String>,
    Json(req): Json<SavePlanRequest>,
) -> ApiResult {
    let Some(session) = state.session(chat_uuid(&chat_id)).await else {
        return not_found("Chat");
    };

    match session.save_plan(req.turn_id, req.category).await {
        Ok(saved) => ok(saved),
        Err(e) => fail(e),
    }
}

/// =============================
/// Saved Plan Endpoints
/// =============================

async fn list_plans(State(state): State<ApiState>) -> ApiResult {
    match state.services.plan_store.list_plans().await {
        Ok(plans) => ok(plans),
        Err(e) => fail(e),
    }
}

/// Generate straight from preferences; failures are reported, not replaced
async fn generate_plan(
    State(state): State<ApiState>,
    Json(request): Json<PlanRequest>,
) -> ApiResult {
    match state.services.planner.try_generate(&request).await {
        Ok(plan) => ok(plan),
        Err(e) => {
            warn!(goal = %request.goal, error = %e, "Plan generation from preferences failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(GENERATION_FAILED.to_string())),
            )
        }
    }
}

/// Save a plan that did not come from a chat turn
async fn store_plan(State(state): State<ApiState>, Json(req): Json<StorePlanRequest>) -> ApiResult {
    if !req.plan.is_valid() {
        return fail(CoachError::InvalidPlan("planName is missing or empty".to_string()));
    }

    let category = req.category.unwrap_or(PlanCategory::Comprehensive);
    match state.services.plan_store.save_plan(&req.plan, category).await {
        Ok(saved) => {
            info!(plan_id = %saved.id, %category, "Plan saved");
            ok(saved)
        }
        Err(e) => fail(e),
    }
}

async fn get_plan(State(state): State<ApiState>, Path(plan_id): Path<Uuid>) -> ApiResult {
    match state.services.plan_store.load_plan(plan_id).await {
        Ok(Some(plan)) => ok(plan),
        Ok(None) => not_found("Plan"),
        Err(e) => fail(e),
    }
}

async fn delete_plan(State(state): State<ApiState>, Path(plan_id): Path<Uuid>) -> ApiResult {
    match state.services.plan_store.delete_plan(plan_id).await {
        Ok(true) => ok(serde_json::json!({ "deleted": plan_id })),
        Ok(false) => not_found("Plan"),
        Err(e) => fail(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(services: CoachServices) -> Router {
    router(ApiState::new(services))
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/:chat_id", get(get_chat).delete(close_chat))
        .route("/api/chat/:chat_id/reset", post(reset_chat))
        .route("/api/chat/:chat_id/plans", post(save_chat_plan))
        .route("/api/plans", get(list_plans).post(store_plan))
        .route("/api/plans/generate", post(generate_plan))
        .route("/api/plans/:plan_id", get(get_plan).delete(delete_plan))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
