use crate::domain::models::job::JobStatus;
use crate::domain::repositories::job_repository::{JobRepository, ReleaseError};
use crate::infrastructure::metrics::MONITOR_RECOVERIES;
use crate::monitors::MonitorReport;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// claimed 超时监控
///
/// 认领后迟迟不开工的任务说明机器人在认领与开工之间消失了。
/// 把任务放回队列，别的机器人下一次认领就能接手。
pub struct ClaimedJobMonitor {
    jobs: Arc<dyn JobRepository>,
    interval: Duration,
    timeout: chrono::Duration,
    max_per_cycle: u64,
    batch_size: u64,
}

impl ClaimedJobMonitor {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        interval: Duration,
        timeout: chrono::Duration,
        max_per_cycle: u64,
        batch_size: u64,
    ) -> Self {
        Self {
            jobs,
            interval,
            timeout,
            max_per_cycle,
            batch_size,
        }
    }

    /// 执行一个检测恢复周期
    ///
    /// 小批量推进，单个周期最多恢复 `max_per_cycle` 个，压住病态场景下
    /// 的数据库抖动。测试与管理接口直接调用本方法，不需要等定时器。
    pub async fn run_cycle(&self) -> MonitorReport {
        let mut report = MonitorReport::default();
        let cutoff = Utc::now() - self.timeout;

        while report.checked < self.max_per_cycle {
            let batch = self.batch_size.min(self.max_per_cycle - report.checked);
            let stuck = match self.jobs.find_stuck_claimed(cutoff, batch).await {
                Ok(stuck) => stuck,
                Err(e) => {
                    error!(error = %e, "Failed to detect stuck claimed jobs");
                    report.errors += 1;
                    break;
                }
            };
            if stuck.is_empty() {
                break;
            }
            let fetched = stuck.len() as u64;
            report.checked += fetched;

            for job in stuck {
                match self
                    .jobs
                    .release(job.id, "timeout-in-claimed", &[JobStatus::Claimed])
                    .await
                {
                    Ok(_) => {
                        report.recovered += 1;
                        counter!(MONITOR_RECOVERIES).increment(1);
                        info!(
                            job_id = %job.id,
                            claimed_by = ?job.claimed_by,
                            "Recovered stuck claimed job"
                        );
                    }
                    // 检测与恢复之间状态变了，说明任务已被别处处理
                    Err(ReleaseError::NotReleasable(status)) => {
                        warn!(job_id = %job.id, status = %status, "Job state changed during recovery");
                    }
                    Err(ReleaseError::JobNotFound) => {
                        warn!(job_id = %job.id, "Job disappeared during recovery");
                    }
                    Err(e) => {
                        report.errors += 1;
                        error!(job_id = %job.id, error = %e, "Failed to recover claimed job");
                    }
                }
            }

            if fetched < batch {
                break;
            }
        }

        report
    }

    /// 运行监控循环；单个周期的错误不会中断循环
    pub async fn run(&self) {
        info!(
            timeout_seconds = self.timeout.num_seconds(),
            "ClaimedJobMonitor started"
        );

        let mut interval = tokio::time::interval(self.interval);
        loop {
            interval.tick().await;
            let report = self.run_cycle().await;
            if report.checked > 0 {
                info!(
                    checked = report.checked,
                    recovered = report.recovered,
                    errors = report.errors,
                    "ClaimedJobMonitor cycle completed"
                );
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }
}
