// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::job_dto::{
    ClaimRequest, CompleteRequest, FailRequest, JobListQuery, JobResponse, PopulateRequest,
    PopulateResponse, ReleaseRequest, StartRequest,
};
use crate::config::settings::Settings;
use crate::domain::models::job::JobStatus;
use crate::domain::services::job_service::JobService;
use crate::domain::services::CoordinatorError;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 默认单页条数
const DEFAULT_LIST_LIMIT: u64 = 100;

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::from(CoordinatorError::BadRequest(format!(
        "Validation error: {errors}"
    )))
}

/// 批量生成任务（管理端点）
pub async fn populate_jobs(
    Extension(job_service): Extension<Arc<JobService>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<PopulateRequest>,
) -> Result<Json<PopulateResponse>, AppError> {
    request.validate().map_err(validation_error)?;

    let batch_size = request.batch_size.unwrap_or(settings.populator.batch_size);
    let outcome = job_service
        .populate(batch_size, request.operation.as_deref())
        .await?;

    Ok(Json(PopulateResponse {
        created: outcome.created,
    }))
}

/// 任务列表
///
/// 无状态过滤时按状态优先级键排序，再按创建时间倒序
pub async fn list_jobs(
    Extension(job_service): Extension<Arc<JobService>>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Vec<JobResponse>>, AppError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(JobStatus::from_str(raw).map_err(|_| {
            AppError::from(CoordinatorError::BadRequest(format!(
                "Unknown status filter: {raw}"
            )))
        })?),
        None => None,
    };

    let jobs = job_service
        .list_jobs(
            status,
            query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            query.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

/// 查询单个任务
pub async fn get_job(
    Extension(job_service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobResponse>, AppError> {
    let details = job_service.get_job(id).await?;
    Ok(Json(details.into()))
}

/// 认领任务
///
/// 没有匹配任务时返回 `null`，机器人按自己的节奏轮询
pub async fn claim_job(
    Extension(job_service): Extension<Arc<JobService>>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<Option<JobResponse>>, AppError> {
    request.validate().map_err(validation_error)?;

    let claimed = job_service.claim(&request.bot_id).await?;
    Ok(Json(claimed.map(JobResponse::from)))
}

/// 标记任务开始执行
pub async fn start_job(
    Extension(job_service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
    Json(request): Json<StartRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    request.validate().map_err(validation_error)?;

    job_service.start(id, &request.bot_id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// 上报任务成功
pub async fn complete_job(
    Extension(job_service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    request.validate().map_err(validation_error)?;

    job_service
        .complete(id, &request.bot_id, request.result, request.duration_ms)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// 上报任务失败
pub async fn fail_job(
    Extension(job_service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
    Json(request): Json<FailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    request.validate().map_err(validation_error)?;

    job_service
        .fail(id, &request.bot_id, &request.error, request.duration_ms)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// 释放任务回队列（管理端点）
pub async fn release_job(
    Extension(job_service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
    request: Option<Json<ReleaseRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let reason = request.as_ref().and_then(|r| r.reason.as_deref());
    job_service.release(id, reason).await?;
    Ok(Json(json!({ "ok": true })))
}
