use super::{ApiResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use brief_core::{Brief, BriefError, GenerateRequest, HealthReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Recent briefs returned when no `limit` is given.
pub const DEFAULT_LIST_LIMIT: usize = 5;
pub const MAX_LIST_LIMIT: usize = 100;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/briefs", get(get_briefs).put(save_brief))
        .route("/api/status", get(status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct GenerateResponse {
    id: Uuid,
    brief: Brief,
}

async fn generate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    let Json(body) = body.map_err(|e| {
        BriefError::invalid_request(format!(
            "urls must be an array of valid URLs: {}",
            e.body_text()
        ))
    })?;
    let req = GenerateRequest::from_json(&body)?;

    let brief = state.generator.generate(&req.urls).await?;
    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            id: brief.id,
            brief,
        }),
    ))
}

#[derive(Deserialize)]
struct BriefsQuery {
    id: Option<String>,
    saved: Option<String>,
    limit: Option<usize>,
}

async fn get_briefs(
    State(state): State<AppState>,
    query: Result<Query<BriefsQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|e| BriefError::invalid_request(e.body_text()))?;

    // An empty `?id=` is treated as absent.
    if let Some(raw_id) = query.id.filter(|id| !id.is_empty()) {
        let brief = parse_id(&raw_id)
            .and_then(|id| state.store.get(id).transpose())
            .transpose()?
            .ok_or_else(|| BriefError::NotFound(raw_id))?;
        return Ok(Json(brief).into_response());
    }

    let briefs = if query.saved.as_deref() == Some("true") {
        state.store.list_saved()?
    } else {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
        state.store.list_recent(limit)?
    };
    Ok(Json(briefs).into_response())
}

#[derive(Serialize)]
struct SaveResponse {
    success: bool,
    brief: Brief,
}

async fn save_brief(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<SaveResponse>> {
    let raw_id = body
        .ok()
        .and_then(|Json(body)| body.get("id").and_then(Value::as_str).map(str::to_string))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BriefError::invalid_request("Brief ID is required"))?;

    // Ids that are not UUIDs cannot name a stored brief.
    let id = parse_id(&raw_id).ok_or_else(|| BriefError::NotFound(raw_id))?;
    let brief = state.store.mark_saved(id)?;

    Ok(Json(SaveResponse {
        success: true,
        brief,
    }))
}

async fn status(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.check())
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
