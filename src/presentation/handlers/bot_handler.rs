// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::bot_dto::{
    AssignOperationRequest, BotListQuery, BotResponse, HeartbeatRequest, RegisterRequest,
};
use crate::config::settings::Settings;
use crate::domain::services::bot_service::BotService;
use crate::domain::services::CoordinatorError;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

fn validation_error(errors: validator::ValidationErrors) -> AppError {
    AppError::from(CoordinatorError::BadRequest(format!(
        "Validation error: {errors}"
    )))
}

fn down_threshold(settings: &Settings) -> Duration {
    Duration::seconds(settings.bots.down_threshold_seconds)
}

/// 注册机器人
pub async fn register_bot(
    Extension(bot_service): Extension<Arc<BotService>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<BotResponse>, AppError> {
    request.validate().map_err(validation_error)?;

    let bot = bot_service
        .register(&request.id, request.assigned_operation.as_deref())
        .await?;

    Ok(Json(BotResponse::from_bot(
        bot,
        Utc::now(),
        down_threshold(&settings),
    )))
}

/// 更新心跳
pub async fn bot_heartbeat(
    Extension(bot_service): Extension<Arc<BotService>>,
    Json(request): Json<HeartbeatRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    request.validate().map_err(validation_error)?;

    bot_service.heartbeat(&request.id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// 设置或清除钉定的操作（管理端点）
pub async fn assign_operation(
    Extension(bot_service): Extension<Arc<BotService>>,
    Extension(settings): Extension<Arc<Settings>>,
    Path(id): Path<String>,
    request: Option<Json<AssignOperationRequest>>,
) -> Result<Json<BotResponse>, AppError> {
    let operation = request.as_ref().and_then(|r| r.operation.as_deref());
    let bot = bot_service.assign_operation(&id, operation).await?;

    Ok(Json(BotResponse::from_bot(
        bot,
        Utc::now(),
        down_threshold(&settings),
    )))
}

/// 软删除机器人（管理端点）
pub async fn delete_bot(
    Extension(bot_service): Extension<Arc<BotService>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    bot_service.soft_delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// 复位机器人状态（管理端点）
pub async fn reset_bot(
    Extension(bot_service): Extension<Arc<BotService>>,
    Extension(settings): Extension<Arc<Settings>>,
    Path(id): Path<String>,
) -> Result<Json<BotResponse>, AppError> {
    let bot = bot_service.reset(&id).await?;

    Ok(Json(BotResponse::from_bot(
        bot,
        Utc::now(),
        down_threshold(&settings),
    )))
}

/// 机器人列表，带派生状态
pub async fn list_bots(
    Extension(bot_service): Extension<Arc<BotService>>,
    Extension(settings): Extension<Arc<Settings>>,
    Query(query): Query<BotListQuery>,
) -> Result<Json<Vec<BotResponse>>, AppError> {
    let bots = bot_service
        .list(query.include_deleted.unwrap_or(false))
        .await?;

    let now = Utc::now();
    let threshold = down_threshold(&settings);
    Ok(Json(
        bots.into_iter()
            .map(|bot| BotResponse::from_bot(bot, now, threshold))
            .collect(),
    ))
}
