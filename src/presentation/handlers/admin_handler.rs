// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::CoordinatorError;
use crate::infrastructure::datalake::DatalakeSink;
use crate::monitors::retention_cleaner::{CleanupReport, RetentionCleaner};
use crate::presentation::errors::AppError;
use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// 清理触发参数
#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub dry_run: Option<bool>,
}

/// 手动触发一次保留期清理
///
/// dry_run 只返回将被删除的行数，不动数据
pub async fn trigger_cleanup(
    Extension(cleaner): Extension<Arc<RetentionCleaner>>,
    Query(query): Query<CleanupQuery>,
) -> Json<CleanupReport> {
    let report = cleaner.run_cleanup(query.dry_run.unwrap_or(false)).await;
    Json(report)
}

/// 清理服务的历史与下次运行时间
pub async fn cleanup_status(
    Extension(cleaner): Extension<Arc<RetentionCleaner>>,
) -> Json<serde_json::Value> {
    Json(json!({
        "history": cleaner.history(),
        "next_run": cleaner.next_run(),
    }))
}

/// 数据湖归档统计
pub async fn datalake_stats(
    Extension(datalake): Extension<Arc<DatalakeSink>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let stats = datalake.stats().await.map_err(|e| {
        AppError::from(CoordinatorError::Internal(format!(
            "Failed to read datalake: {e}"
        )))
    })?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}
