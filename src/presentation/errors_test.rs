// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::AppError;
use crate::domain::models::job::JobStatus;
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::services::CoordinatorError;
use axum::http::StatusCode;
use axum::response::IntoResponse;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_not_found_maps_to_404() {
    let response = AppError::from(CoordinatorError::NotFound("Job")).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["code"], "not_found");
    assert_eq!(body["message"], "Job not found");
}

#[tokio::test]
async fn test_unknown_bot_maps_to_404() {
    let response = AppError::from(CoordinatorError::UnknownBot).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "unknown_bot");
}

#[tokio::test]
async fn test_conflicts_map_to_409() {
    for err in [
        CoordinatorError::BusyBot,
        CoordinatorError::AlreadyTerminal,
        CoordinatorError::NotClaimHolder,
        CoordinatorError::InvalidState(JobStatus::Claimed),
    ] {
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn test_bad_request_maps_to_400() {
    let response =
        AppError::from(CoordinatorError::UnknownOperation("modulo".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "unknown_operation");
}

#[tokio::test]
async fn test_unauthorized_maps_to_401() {
    let response = AppError::from(CoordinatorError::Unauthorized).into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "unauthorized");
}

#[tokio::test]
async fn test_storage_not_found_maps_to_404() {
    let response = AppError::from(RepositoryError::NotFound).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "not_found");
}

#[tokio::test]
async fn test_connection_errors_are_transient() {
    let err = RepositoryError::Database(sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal(
        "pool exhausted".to_string(),
    )));
    let response = AppError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "transient");
}
