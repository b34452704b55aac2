// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::CoordinatorError;
use crate::infrastructure::metrics::INVARIANT_VIOLATIONS;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use tracing::error;

/// 应用错误类型
///
/// 把服务层错误映射为带稳定 `code` 的HTTP响应。`code` 集合是对外
/// 契约的一部分。
#[derive(Debug)]
pub struct AppError(CoordinatorError);

impl From<CoordinatorError> for AppError {
    fn from(err: CoordinatorError) -> Self {
        Self(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        Self(CoordinatorError::Storage(err))
    }
}

/// 数据库错误的状态码与错误码
///
/// 编码业务规则的约束冲突映射为带专用错误码的 409；破坏一致性
/// 检查约束意味着代码缺陷，计数并按 500 返回；连接类故障可重试。
fn classify_db_error(err: &DbErr) -> (StatusCode, &'static str) {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        if message.contains("idx_bots_current_job") {
            return (StatusCode::CONFLICT, "unique_bot_current_job");
        }
    }

    let message = err.to_string();
    if message.contains("job_state_consistency") {
        counter!(INVARIANT_VIOLATIONS).increment(1);
        error!(error = %err, "Job state consistency constraint violated");
        return (StatusCode::INTERNAL_SERVER_ERROR, "job_state_consistency");
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "transient")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            CoordinatorError::NotFound(_) | CoordinatorError::UnknownBot => {
                (StatusCode::NOT_FOUND, self.0.code())
            }
            CoordinatorError::BusyBot
            | CoordinatorError::AlreadyTerminal
            | CoordinatorError::NotClaimHolder
            | CoordinatorError::InvalidState(_) => (StatusCode::CONFLICT, self.0.code()),
            CoordinatorError::UnknownOperation(_) | CoordinatorError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.0.code())
            }
            CoordinatorError::Unauthorized => (StatusCode::UNAUTHORIZED, self.0.code()),
            CoordinatorError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.0.code()),
            CoordinatorError::Storage(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            CoordinatorError::Storage(RepositoryError::Database(db_err)) => {
                classify_db_error(db_err)
            }
        };

        if status.is_server_error() {
            error!(error = %self.0, code, "Request failed");
        }

        let body = Json(json!({
            "code": code,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod tests;
