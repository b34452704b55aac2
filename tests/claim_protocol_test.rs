// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 认领协议与状态机前置条件的单元测试
//!
//! 用 MockDatabase 驱动仓库层的拒绝路径：这些路径只读不写，
//! mock 的行为与真实后端一致。成功路径的并发语义见
//! `live_postgres_test.rs`。

use chrono::{Duration, Utc};
use jobrs::domain::models::job::JobStatus;
use jobrs::domain::repositories::bot_repository::BotRepository;
use jobrs::domain::repositories::job_repository::{
    ClaimError, JobRepository, ReleaseError, TransitionError,
};
use jobrs::infrastructure::database::entities::{bot, job, job_result};
use jobrs::infrastructure::repositories::bot_repo_impl::BotRepositoryImpl;
use jobrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use jobrs::monitors::claimed_job_monitor::ClaimedJobMonitor;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

fn job_model(status: JobStatus, claimed_by: Option<&str>) -> job::Model {
    let now = Utc::now();
    job::Model {
        id: Uuid::new_v4(),
        a: 2,
        b: 3,
        operation: "sum".to_string(),
        status: status.to_string(),
        claimed_by: claimed_by.map(str::to_string),
        created_at: now.into(),
        claimed_at: match status {
            JobStatus::Pending => None,
            _ => Some((now - Duration::minutes(10)).into()),
        },
        started_at: match status {
            JobStatus::Pending | JobStatus::Claimed => None,
            _ => Some((now - Duration::minutes(9)).into()),
        },
        finished_at: match status {
            JobStatus::Succeeded | JobStatus::Failed => Some(now.into()),
            _ => None,
        },
        attempts: 0,
        error: None,
        version: 1,
    }
}

fn bot_model(id: &str, current_job_id: Option<Uuid>) -> bot::Model {
    let now = Utc::now();
    bot::Model {
        id: id.to_string(),
        status: "idle".to_string(),
        current_job_id,
        assigned_operation: None,
        last_heartbeat_at: now.into(),
        created_at: now.into(),
        deleted_at: None,
        health_status: "normal".to_string(),
        stuck_job_id: None,
        health_checked_at: None,
    }
}

fn result_model(job: &job::Model, result: Option<i64>, error: Option<&str>) -> job_result::Model {
    job_result::Model {
        id: Uuid::new_v4(),
        job_id: job.id,
        a: job.a,
        b: job.b,
        operation: job.operation.clone(),
        result,
        processed_by: job.claimed_by.clone().unwrap_or_default(),
        processed_at: Utc::now().into(),
        duration_ms: 100,
        status: if result.is_some() { "succeeded" } else { "failed" }.to_string(),
        error: error.map(str::to_string),
    }
}

fn repo(db: DatabaseConnection) -> JobRepositoryImpl {
    JobRepositoryImpl::new(Arc::new(db))
}

#[tokio::test]
async fn test_claim_unknown_bot_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<bot::Model>::new()])
        .into_connection();

    let err = repo(db).claim_for_bot("ghost").await.unwrap_err();
    assert!(matches!(err, ClaimError::UnknownBot));
}

#[tokio::test]
async fn test_claim_busy_bot_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bot_model("b1", Some(Uuid::new_v4()))]])
        .into_connection();

    let err = repo(db).claim_for_bot("b1").await.unwrap_err();
    assert!(matches!(err, ClaimError::BusyBot));
}

#[tokio::test]
async fn test_claim_with_empty_queue_returns_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![bot_model("b1", None)]])
        .append_query_results([Vec::<job::Model>::new()])
        .into_connection();

    let claimed = repo(db).claim_for_bot("b1").await.unwrap();
    assert!(claimed.is_none());
}

#[tokio::test]
async fn test_start_unknown_job_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<job::Model>::new()])
        .into_connection();

    let err = repo(db).start(Uuid::new_v4(), "b1").await.unwrap_err();
    assert!(matches!(err, TransitionError::JobNotFound));
}

#[tokio::test]
async fn test_start_by_wrong_bot_is_rejected() {
    let model = job_model(JobStatus::Claimed, Some("b1"));
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let err = repo(db).start(id, "intruder").await.unwrap_err();
    assert!(matches!(err, TransitionError::NotClaimHolder));
}

#[tokio::test]
async fn test_start_is_idempotent_when_already_processing() {
    let model = job_model(JobStatus::Processing, Some("b1"));
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let job = repo(db).start(id, "b1").await.unwrap();
    assert_eq!(job.id, id);
    assert_eq!(job.status, JobStatus::Processing);
}

#[tokio::test]
async fn test_complete_requires_processing_state() {
    let model = job_model(JobStatus::Claimed, Some("b1"));
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let err = repo(db).complete(id, "b1", 5, 100).await.unwrap_err();
    assert!(matches!(
        err,
        TransitionError::InvalidState(JobStatus::Claimed)
    ));
}

#[tokio::test]
async fn test_complete_by_wrong_bot_is_rejected() {
    let model = job_model(JobStatus::Processing, Some("b1"));
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let err = repo(db).complete(id, "intruder", 5, 100).await.unwrap_err();
    assert!(matches!(err, TransitionError::NotClaimHolder));
}

#[tokio::test]
async fn test_complete_replay_with_same_result_succeeds() {
    let model = job_model(JobStatus::Succeeded, Some("b1"));
    let id = model.id;
    let existing = result_model(&model, Some(5), None);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .append_query_results([vec![existing]])
        .into_connection();

    let row = repo(db).complete(id, "b1", 5, 100).await.unwrap();
    assert_eq!(row.result, Some(5));
    assert_eq!(row.job_id, id);
}

#[tokio::test]
async fn test_complete_replay_with_conflicting_result_is_rejected() {
    let model = job_model(JobStatus::Succeeded, Some("b1"));
    let id = model.id;
    let existing = result_model(&model, Some(5), None);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .append_query_results([vec![existing]])
        .into_connection();

    let err = repo(db).complete(id, "b1", 6, 100).await.unwrap_err();
    assert!(matches!(err, TransitionError::AlreadyTerminal));
}

#[tokio::test]
async fn test_complete_after_fail_is_rejected() {
    let model = job_model(JobStatus::Failed, Some("b1"));
    let id = model.id;
    let existing = result_model(&model, None, Some("boom"));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .append_query_results([vec![existing]])
        .into_connection();

    let err = repo(db).complete(id, "b1", 5, 100).await.unwrap_err();
    assert!(matches!(err, TransitionError::AlreadyTerminal));
}

#[tokio::test]
async fn test_fail_replay_with_same_error_succeeds() {
    let model = job_model(JobStatus::Failed, Some("b1"));
    let id = model.id;
    let existing = result_model(&model, None, Some("boom"));
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .append_query_results([vec![existing]])
        .into_connection();

    let row = repo(db).fail(id, "b1", "boom", 100).await.unwrap();
    assert_eq!(row.error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_release_of_pending_job_is_rejected() {
    let model = job_model(JobStatus::Pending, None);
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let err = repo(db)
        .release(id, "manual-release", &[JobStatus::Claimed, JobStatus::Processing])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReleaseError::NotReleasable(JobStatus::Pending)
    ));
}

#[tokio::test]
async fn test_release_of_terminal_job_is_rejected() {
    let model = job_model(JobStatus::Succeeded, Some("b1"));
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let err = repo(db)
        .release(id, "manual-release", &[JobStatus::Claimed, JobStatus::Processing])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReleaseError::NotReleasable(JobStatus::Succeeded)
    ));
}

#[tokio::test]
async fn test_heartbeat_of_unknown_bot_reports_missing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let found = BotRepositoryImpl::new(Arc::new(db))
        .heartbeat("ghost")
        .await
        .unwrap();
    assert!(!found);
}

#[tokio::test]
async fn test_claimed_monitor_skips_job_whose_state_changed() {
    // 检测时任务还在 claimed，恢复事务里已经推进到 processing：
    // 监控必须放手，不做任何修改
    let detected = job_model(JobStatus::Claimed, Some("b1"));
    let mut advanced = detected.clone();
    advanced.status = JobStatus::Processing.to_string();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![detected]])
        .append_query_results([vec![advanced]])
        .into_connection();

    let monitor = ClaimedJobMonitor::new(
        Arc::new(JobRepositoryImpl::new(Arc::new(db))),
        StdDuration::from_secs(60),
        Duration::seconds(300),
        100,
        10,
    );

    let report = monitor.run_cycle().await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.recovered, 0);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn test_claimed_monitor_with_nothing_stuck_is_a_noop() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<job::Model>::new()])
        .into_connection();

    let monitor = ClaimedJobMonitor::new(
        Arc::new(JobRepositoryImpl::new(Arc::new(db))),
        StdDuration::from_secs(60),
        Duration::seconds(300),
        100,
        10,
    );

    let report = monitor.run_cycle().await;
    assert_eq!(report.checked, 0);
    assert_eq!(report.recovered, 0);
}
