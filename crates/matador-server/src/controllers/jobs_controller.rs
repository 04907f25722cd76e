//! Job listing and lookup controller.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use matador_monitor::{Job, JobFilter, JobStatus};
use serde::Deserialize;

use crate::responses::{ApiResult, AppError};
use crate::state::AppState;

/// Create the jobs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:queue/:id", get(get_job))
}

/// Query parameters for job listing. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct JobsParams {
    pub queue: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl JobsParams {
    /// Converts the parameters into a filter, rejecting unknown statuses.
    pub fn into_filter(self) -> Result<JobFilter, AppError> {
        let mut filter = JobFilter::new();

        if let Some(queue) = non_empty(self.queue) {
            filter = filter.queue(queue);
        }
        if let Some(status) = non_empty(self.status) {
            let status: JobStatus = status
                .parse()
                .map_err(|e: matador_monitor::ParseStatusError| AppError::BadRequest(e.to_string()))?;
            filter = filter.status(status);
        }
        if let Some(search) = non_empty(self.search) {
            filter = filter.search(search);
        }

        Ok(filter)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Lists jobs, optionally narrowed by queue, status and search term.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobsParams>,
) -> ApiResult<Vec<Job>> {
    let filter = params.into_filter()?;
    Ok(Json(state.monitor.get_jobs(&filter).await))
}

/// Looks up one job by queue and id.
pub async fn get_job(
    State(state): State<AppState>,
    Path((queue, id)): Path<(String, String)>,
) -> ApiResult<Job> {
    state
        .monitor
        .get_job_by_id(&queue, &id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}
