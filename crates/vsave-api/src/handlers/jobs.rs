//! Job submission and admin handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use vsave_models::{Job, JobId, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Response for an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub job_id: JobId,
}

/// One job as seen by API clients.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: JobId,
    /// Submitted payload, verbatim
    pub data: Value,
    pub status: JobStatus,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            data: job.payload,
            status: job.status,
            message: job.message,
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Serialize)]
pub struct ClearJobsResponse {
    pub message: String,
    pub deleted: u64,
}

/// Welcome banner.
pub async fn root() -> Json<MessageResponse> {
    MessageResponse::new("Welcome to the Video Scraper API")
}

/// Queue a new job. Served at both `/save-to-s3` and `/jobs`.
pub async fn submit_job(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let job_id = state.jobs.submit(payload).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            message: "Job successfully queued".to_string(),
            job_id,
        }),
    ))
}

pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<JobListResponse>> {
    let jobs = state.jobs.list_jobs().await?;

    Ok(Json(JobListResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    job_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<JobResponse>> {
    let Path(job_id) = job_id.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let job = state.jobs.get_job(JobId(job_id)).await?;
    Ok(Json(job.into()))
}

pub async fn delete_job(
    State(state): State<AppState>,
    job_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(job_id) = job_id.map_err(|e| ApiError::bad_request(e.body_text()))?;

    state.jobs.delete_job(JobId(job_id)).await?;
    Ok(MessageResponse::new("Job deleted successfully"))
}

/// Remove every job from the ledger. Jobs already queued still run.
pub async fn clear_jobs(State(state): State<AppState>) -> ApiResult<Json<ClearJobsResponse>> {
    let deleted = state.jobs.clear_jobs().await?;
    tracing::info!(deleted, "Cleared all jobs");

    Ok(Json(ClearJobsResponse {
        message: "All jobs cleared successfully".to_string(),
        deleted,
    }))
}
