// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::operations::registry::OperationRegistry;
use crate::presentation::handlers::{admin_handler, bot_handler, job_handler, metrics_handler};
use crate::presentation::middleware::admin_auth_middleware::{
    admin_auth_middleware, AdminAuthState,
};
use axum::{
    extract::Extension,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// 创建应用路由
///
/// 管理端点挂在独立的子路由上，由令牌中间件把守；其余端点在默认
/// 配置下不鉴权
///
/// # 参数
///
/// * `admin_token` - 共享管理令牌
///
/// # 返回值
///
/// 返回配置好的路由；各服务通过 `Extension` 层注入
pub fn routes(admin_token: String) -> Router {
    let public_routes = Router::new()
        .route("/healthz", get(health_check))
        .route("/operations", get(operations))
        .route("/jobs", get(job_handler::list_jobs))
        .route("/jobs/claim", post(job_handler::claim_job))
        .route("/jobs/{id}", get(job_handler::get_job))
        .route("/jobs/{id}/start", post(job_handler::start_job))
        .route("/jobs/{id}/complete", post(job_handler::complete_job))
        .route("/jobs/{id}/fail", post(job_handler::fail_job))
        .route("/bots/register", post(bot_handler::register_bot))
        .route("/bots/heartbeat", post(bot_handler::bot_heartbeat))
        .route("/bots", get(bot_handler::list_bots))
        .route("/metrics/summary", get(metrics_handler::metrics_summary));

    let auth_state = AdminAuthState {
        token: Arc::new(admin_token),
    };
    let admin_routes = Router::new()
        .route("/jobs/populate", post(job_handler::populate_jobs))
        .route("/jobs/{id}/release", post(job_handler::release_job))
        .route(
            "/bots/{id}/assign-operation",
            post(bot_handler::assign_operation),
        )
        .route("/bots/{id}", delete(bot_handler::delete_bot))
        .route("/bots/{id}/reset", post(bot_handler::reset_bot))
        .route("/admin/cleanup", post(admin_handler::trigger_cleanup))
        .route("/admin/cleanup/status", get(admin_handler::cleanup_status))
        .route("/admin/datalake/stats", get(admin_handler::datalake_stats))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            admin_auth_middleware,
        ));

    Router::new().merge(public_routes).merge(admin_routes)
}

/// 健康检查端点
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 已注册操作名列表
pub async fn operations(
    Extension(registry): Extension<Arc<OperationRegistry>>,
) -> Json<serde_json::Value> {
    Json(json!({ "names": registry.names() }))
}
