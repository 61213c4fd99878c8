use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::records::{
    DisposalRecord, HistoryRecord, Outcome, PendingApplicationRecord, PendingStatus, StatsDelta,
    SubmissionMethod,
};
use crate::state::AppState;
use crate::workflow::ManualApplyRequest;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

fn require_job_id(job_id: &str) -> Result<String, AppError> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return Err(AppError::Validation("jobId is required".to_string()));
    }
    Ok(job_id.to_string())
}

/// GET /api/config
pub async fn handle_get_config(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let config = state
        .store
        .get_config()
        .await?
        .ok_or_else(|| AppError::NotFound("Config not found".to_string()))?;
    Ok(Json(json!({ "success": true, "config": config })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePendingRequest {
    pub job_id: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub cover_letter: String,
}

/// POST /api/bot/pending
pub async fn handle_save_pending(
    State(state): State<AppState>,
    Json(req): Json<SavePendingRequest>,
) -> Result<Json<Value>, AppError> {
    let job_id = require_job_id(&req.job_id)?;
    let record = PendingApplicationRecord {
        job_id: job_id.clone(),
        job_description: req.job_description,
        job_title: req.job_title,
        company_name: req.company_name,
        matched_keywords: req.matched_keywords,
        cover_letter: req.cover_letter,
        status: PendingStatus::Pending,
        timestamp: Utc::now(),
    };
    state.store.put_pending(&record).await?;
    info!(job_id = %job_id, "Saved to pending applications");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/bot/pending
pub async fn handle_list_pending(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let mut pending = state.store.list_pending().await?;
    pending.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(json!({ "success": true, "pending": pending })))
}

/// POST /api/bot/manual-apply
/// 200 with the result when the job board accepted the application, 400 otherwise.
pub async fn handle_manual_apply(
    State(state): State<AppState>,
    Json(req): Json<ManualApplyRequest>,
) -> Result<Response, AppError> {
    require_job_id(&req.job_id)?;
    let result = state.workflow.manual_apply(&req).await;

    let response = if result.success {
        (StatusCode::OK, Json(json!({ "success": true, "result": result })))
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": result.error,
                "errorKind": result.error_kind,
            })),
        )
    };
    Ok(response.into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscardRequest {
    pub job_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /api/bot/discard
pub async fn handle_discard(
    State(state): State<AppState>,
    Json(req): Json<DiscardRequest>,
) -> Result<Json<Value>, AppError> {
    let job_id = require_job_id(&req.job_id)?;
    let pending = state
        .store
        .get_pending(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No pending application for job {job_id}")))?;

    let disposal = DisposalRecord {
        id: Uuid::new_v4(),
        job_id: job_id.clone(),
        job_title: pending.job_title,
        company_name: pending.company_name,
        reason: req.reason,
        timestamp: Utc::now(),
    };
    state.store.put_disposal(&disposal).await?;
    if state.store.delete_pending(&job_id).await? {
        if let Err(e) = state.store.record_stats(StatsDelta::Dequeued).await {
            warn!("Failed to update stats: {e}");
        }
    }

    info!(job_id = %job_id, "Pending application discarded");
    Ok(Json(json!({ "success": true, "disposalId": disposal.id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogApplicationRequest {
    pub job_id: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// POST /api/bot/log-application
pub async fn handle_log_application(
    State(state): State<AppState>,
    Json(req): Json<LogApplicationRequest>,
) -> Result<Json<Value>, AppError> {
    let job_id = require_job_id(&req.job_id)?;
    let record = HistoryRecord {
        job_id,
        job_title: req.job_title,
        company_name: req.company_name,
        status: Outcome::from_success(req.success),
        error: req.error,
        timestamp: Utc::now(),
        method: SubmissionMethod::Auto,
    };
    state.store.put_history(&record).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelNameRequest {
    pub channel_name: String,
}

/// POST /api/bot/update-channel-name
pub async fn handle_update_channel_name(
    State(state): State<AppState>,
    Json(req): Json<UpdateChannelNameRequest>,
) -> Result<Json<Value>, AppError> {
    let name = req.channel_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("channelName is required".to_string()));
    }
    state.store.set_channel_name(name).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /api/bot/history
pub async fn handle_list_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let history = state.store.list_history(limit).await?;
    let stats = state.store.get_stats().await?;
    Ok(Json(json!({ "success": true, "history": history, "stats": stats })))
}
