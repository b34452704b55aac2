// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::metrics_service::{MetricsService, MetricsSummary};
use crate::presentation::errors::AppError;
use axum::{extract::Extension, Json};
use std::sync::Arc;

/// 按状态统计任务与机器人数量
pub async fn metrics_summary(
    Extension(metrics_service): Extension<Arc<MetricsService>>,
) -> Result<Json<MetricsSummary>, AppError> {
    let summary = metrics_service.summary().await?;
    Ok(Json(summary))
}
