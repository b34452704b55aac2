// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 路由层测试：公开端点与管理令牌门禁

use axum::body::Body;
use axum::extract::Extension;
use axum::http::{header, Request, StatusCode};
use chrono::Duration;
use jobrs::infrastructure::repositories::bot_repo_impl::BotRepositoryImpl;
use jobrs::infrastructure::repositories::result_repo_impl::ResultRepositoryImpl;
use jobrs::monitors::retention_cleaner::RetentionCleaner;
use jobrs::operations::registry::OperationRegistry;
use jobrs::presentation::routes;
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";

fn app() -> axum::Router {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let cleaner = Arc::new(RetentionCleaner::new(
        Arc::new(BotRepositoryImpl::new(db.clone())),
        Arc::new(ResultRepositoryImpl::new(db)),
        StdDuration::from_secs(6 * 3600),
        Duration::days(7),
    ));

    routes::routes(ADMIN_TOKEN.to_string())
        .layer(Extension(Arc::new(OperationRegistry::load())))
        .layer(Extension(cleaner))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_healthz_is_public() {
    let response = app()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_operations_lists_registry_names() {
    let response = app()
        .oneshot(Request::get("/operations").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["names"],
        serde_json::json!(["divide", "multiply", "subtract", "sum"])
    );
}

#[tokio::test]
async fn test_admin_endpoint_without_token_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::get("/admin/cleanup/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "unauthorized");
}

#[tokio::test]
async fn test_admin_endpoint_with_wrong_token_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::get("/admin/cleanup/status")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_endpoint_with_valid_token_passes_the_gate() {
    let response = app()
        .oneshot(
            Request::get("/admin/cleanup/status")
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["history"], serde_json::json!([]));
    assert!(body["next_run"].is_null());
}
