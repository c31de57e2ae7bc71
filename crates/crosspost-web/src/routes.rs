//! API routes.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crosspost_content::Platform;
use crosspost_scheduler::{ContentPipeline, Job, JobId, Scheduler, SourceRef};

use crate::ApiError;

/// Shared state for the API server.
pub struct AppState {
    pub scheduler: Scheduler,
    pub pipeline: Arc<ContentPipeline>,
}

/// Create the API router.
pub fn create_router(scheduler: Scheduler, pipeline: Arc<ContentPipeline>) -> Router {
    let state = Arc::new(AppState {
        scheduler,
        pipeline,
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/publish", post(publish))
        .route("/api/jobs", get(list_jobs).post(schedule_job))
        .route("/api/jobs/{id}", get(get_job).delete(delete_job))
        .route("/api/jobs/{id}/cancel", post(cancel_job))
        .route("/api/platforms", get(list_platforms))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PublishRequest {
    source_id: String,
    #[serde(default)]
    access_token: String,
    platforms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    source_id: String,
    #[serde(default)]
    access_token: String,
    platforms: Vec<String>,
    scheduled_at: String,
}

#[derive(Debug, Serialize)]
struct PlatformInfo {
    platform: Platform,
    name: Option<String>,
    enabled: bool,
}

fn parse_platforms(names: &[String]) -> Result<Vec<Platform>, ApiError> {
    names
        .iter()
        .map(|name| {
            name.parse::<Platform>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .collect()
}

fn parse_job_id(id: &str) -> Result<JobId, ApiError> {
    id.parse::<JobId>()
        .map_err(|_| ApiError::BadRequest(format!("invalid job id: {}", id)))
}

fn parse_scheduled_at(value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ApiError::BadRequest(format!("invalid scheduled_at {:?}: {}", value, e)))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn publish(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let platforms = parse_platforms(&request.platforms)?;
    let source = SourceRef::new(request.source_id, request.access_token);

    info!(source_id = %source.source_id, platforms = ?platforms, "publishing now");
    let results = state.pipeline.run(&source, &platforms).await?;

    Ok(Json(json!({
        "source_id": source.source_id,
        "results": results,
    })))
}

async fn schedule_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScheduleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let platforms = parse_platforms(&request.platforms)?;
    let scheduled_at = parse_scheduled_at(&request.scheduled_at)?;
    let source = SourceRef::new(request.source_id, request.access_token);

    let id = state
        .scheduler
        .schedule_job(source, &platforms, scheduled_at)
        .await?;
    let job = state.scheduler.get_job(id).await?;

    info!(job_id = %id, %scheduled_at, "job scheduled");
    Ok((StatusCode::CREATED, Json(job)))
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<Job>> {
    Json(state.scheduler.list_jobs().await)
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let id = parse_job_id(&id)?;
    Ok(Json(state.scheduler.get_job(id).await?))
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, ApiError> {
    let id = parse_job_id(&id)?;
    state.scheduler.cancel_job(id).await?;
    info!(job_id = %id, "job cancelled");
    Ok(Json(state.scheduler.get_job(id).await?))
}

async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_job_id(&id)?;
    state.scheduler.delete_job(id).await?;
    info!(job_id = %id, "job deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_platforms(State(state): State<Arc<AppState>>) -> Json<Vec<PlatformInfo>> {
    let registry = state.pipeline.dispatcher().registry();
    let platforms = Platform::ALL
        .into_iter()
        .map(|platform| {
            let publisher = registry.get(platform);
            PlatformInfo {
                platform,
                name: publisher.as_ref().map(|p| p.name().to_string()),
                enabled: publisher.is_some_and(|p| p.is_enabled()),
            }
        })
        .collect();
    Json(platforms)
}
