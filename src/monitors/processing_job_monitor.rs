use crate::domain::repositories::job_repository::JobRepository;
use crate::infrastructure::datalake::DatalakeSink;
use crate::infrastructure::metrics::{DATALAKE_APPEND_FAILURES, MONITOR_RECOVERIES};
use crate::monitors::MonitorReport;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// processing 超时监控
///
/// 执行超时的任务记失败终态：写结果行、解绑机器人，并和正常失败
/// 一样镜像到数据湖。和 claimed 超时不同，这里不退回队列——任务
/// 可能已经产生过副作用。
pub struct ProcessingJobMonitor {
    jobs: Arc<dyn JobRepository>,
    datalake: Arc<DatalakeSink>,
    interval: Duration,
    timeout: chrono::Duration,
    max_per_cycle: u64,
    batch_size: u64,
}

impl ProcessingJobMonitor {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        datalake: Arc<DatalakeSink>,
        interval: Duration,
        timeout: chrono::Duration,
        max_per_cycle: u64,
        batch_size: u64,
    ) -> Self {
        Self {
            jobs,
            datalake,
            interval,
            timeout,
            max_per_cycle,
            batch_size,
        }
    }

    /// 执行一个检测恢复周期
    ///
    /// 小批量推进，单个周期最多恢复 `max_per_cycle` 个
    pub async fn run_cycle(&self) -> MonitorReport {
        let mut report = MonitorReport::default();
        let cutoff = Utc::now() - self.timeout;

        while report.checked < self.max_per_cycle {
            let batch = self.batch_size.min(self.max_per_cycle - report.checked);
            let stuck = match self.jobs.find_stuck_processing(cutoff, batch).await {
                Ok(stuck) => stuck,
                Err(e) => {
                    error!(error = %e, "Failed to detect stuck processing jobs");
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
                    .fail_unattended(job.id, "timeout-in-processing")
                    .await
                {
                    Ok(Some(row)) => {
                        report.recovered += 1;
                        counter!(MONITOR_RECOVERIES).increment(1);
                        info!(
                            job_id = %job.id,
                            claimed_by = ?job.claimed_by,
                            "Failed stuck processing job"
                        );
                        if let Err(e) = self.datalake.append(&row).await {
                            counter!(DATALAKE_APPEND_FAILURES).increment(1);
                            error!(job_id = %job.id, error = %e, "Failed to append result to datalake");
                        }
                    }
                    Ok(None) => {
                        warn!(job_id = %job.id, "Job state changed during recovery");
                    }
                    Err(e) => {
                        report.errors += 1;
                        error!(job_id = %job.id, error = %e, "Failed to recover processing job");
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
            "ProcessingJobMonitor started"
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
                    "ProcessingJobMonitor cycle completed"
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
