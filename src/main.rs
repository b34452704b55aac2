// Copyright (c) 2025 jobrs contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::Extension;
use chrono::Duration as ChronoDuration;
use jobrs::config::settings::Settings;
use jobrs::domain::services::bot_service::BotService;
use jobrs::domain::services::job_service::JobService;
use jobrs::domain::services::metrics_service::MetricsService;
use jobrs::infrastructure::database::connection;
use jobrs::infrastructure::datalake::DatalakeSink;
use jobrs::infrastructure::repositories::bot_repo_impl::BotRepositoryImpl;
use jobrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use jobrs::infrastructure::repositories::result_repo_impl::ResultRepositoryImpl;
use jobrs::monitors::bot_health_monitor::BotHealthMonitor;
use jobrs::monitors::claimed_job_monitor::ClaimedJobMonitor;
use jobrs::monitors::populator::Populator;
use jobrs::monitors::processing_job_monitor::ProcessingJobMonitor;
use jobrs::monitors::retention_cleaner::RetentionCleaner;
use jobrs::operations::registry::OperationRegistry;
use jobrs::presentation::routes;
use jobrs::utils::telemetry;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 日志与指标
    telemetry::init_telemetry();
    info!("Starting jobrs coordinator...");
    jobrs::infrastructure::metrics::init_metrics();

    // 2. 配置
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. 数据库连接与迁移
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. 操作注册表，与模式约束比对
    let registry = Arc::new(OperationRegistry::load());
    if registry.names() != migration::CONSTRAINED_OPERATIONS {
        anyhow::bail!(
            "Operation registry {:?} does not match the schema constraint {:?}; \
             a migration must republish the jobs.operation check first",
            registry.names(),
            migration::CONSTRAINED_OPERATIONS,
        );
    }

    // 5. 核心组件
    let datalake = Arc::new(DatalakeSink::new(&settings.datalake.dir)?);
    info!(dir = %settings.datalake.dir, "Datalake sink ready");

    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let bot_repo = Arc::new(BotRepositoryImpl::new(db.clone()));
    let result_repo = Arc::new(ResultRepositoryImpl::new(db.clone()));

    let job_service = Arc::new(JobService::new(
        job_repo.clone(),
        result_repo.clone(),
        registry.clone(),
        datalake.clone(),
        settings.populator.max_pending_jobs,
    ));
    let bot_service = Arc::new(BotService::new(
        bot_repo.clone(),
        registry.clone(),
        datalake.clone(),
    ));
    let metrics_service = Arc::new(MetricsService::new(
        job_repo.clone(),
        bot_repo.clone(),
        result_repo.clone(),
        ChronoDuration::seconds(settings.bots.down_threshold_seconds),
    ));

    // 6. 后台监控
    let check_interval = Duration::from_secs(settings.monitoring.check_interval_seconds);
    let mut monitor_handles = Vec::new();

    monitor_handles.push(
        Populator::new(
            job_service.clone(),
            Duration::from_millis(settings.populator.interval_ms),
            settings.populator.batch_size,
        )
        .start(),
    );
    monitor_handles.push(
        ClaimedJobMonitor::new(
            job_repo.clone(),
            check_interval,
            ChronoDuration::seconds(settings.monitoring.claimed_job_timeout_seconds),
            settings.monitoring.max_recoveries_per_cycle,
            settings.monitoring.recovery_batch_size,
        )
        .start(),
    );
    monitor_handles.push(
        ProcessingJobMonitor::new(
            job_repo.clone(),
            datalake.clone(),
            check_interval,
            ChronoDuration::seconds(settings.monitoring.processing_job_timeout_seconds),
            settings.monitoring.max_recoveries_per_cycle,
            settings.monitoring.recovery_batch_size,
        )
        .start(),
    );
    monitor_handles.push(
        BotHealthMonitor::new(
            bot_repo.clone(),
            check_interval,
            ChronoDuration::seconds(settings.monitoring.processing_job_timeout_seconds),
            ChronoDuration::seconds(settings.bots.down_threshold_seconds),
        )
        .start(),
    );

    let cleaner = Arc::new(RetentionCleaner::new(
        bot_repo.clone(),
        result_repo.clone(),
        Duration::from_secs(settings.cleanup.interval_hours * 3600),
        ChronoDuration::days(settings.bots.retention_days),
    ));
    monitor_handles.push(cleaner.clone().start());

    // 7. 路由与服务器
    let app = routes::routes(settings.admin.token.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(
            settings.server.request_timeout_seconds,
        )))
        .layer(Extension(job_service))
        .layer(Extension(bot_service))
        .layer(Extension(metrics_service))
        .layer(Extension(cleaner))
        .layer(Extension(datalake))
        .layer(Extension(registry))
        .layer(Extension(settings.clone()));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. 停掉监控循环后干净退出
    for handle in monitor_handles {
        handle.abort();
    }
    info!("Coordinator shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
