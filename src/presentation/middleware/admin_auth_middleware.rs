// Copyright 2025 jobrs contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::services::CoordinatorError;
use crate::presentation::errors::AppError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

/// 管理认证状态
#[derive(Clone)]
pub struct AdminAuthState {
    /// 共享管理令牌
    pub token: Arc<String>,
}

/// 管理认证中间件
///
/// 校验 `Authorization: Bearer <token>`；失败返回带 `unauthorized`
/// 错误码的401
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
pub async fn admin_auth_middleware(
    State(state): State<AdminAuthState>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == state.token.as_str() => next.run(req).await,
        _ => {
            warn!(path = %req.uri().path(), "Rejected admin request with invalid token");
            AppError::from(CoordinatorError::Unauthorized).into_response()
        }
    }
}
