use crate::domain::services::job_service::JobService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 周期性任务生成器
///
/// 按固定周期生成一批随机任务，走和管理接口完全相同的服务方法。
/// pending 总量的上限由服务层执行。
pub struct Populator {
    service: Arc<JobService>,
    interval: Duration,
    batch_size: u32,
}

impl Populator {
    pub fn new(service: Arc<JobService>, interval: Duration, batch_size: u32) -> Self {
        Self {
            service,
            interval,
            batch_size,
        }
    }

    /// 运行生成循环
    pub async fn run(&self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Populator started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await; // 启动时不立即生成

        loop {
            interval.tick().await;
            match self.service.populate(self.batch_size, None).await {
                Ok(outcome) => {
                    if !outcome.created.is_empty() {
                        info!(count = outcome.created.len(), "Populated jobs");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Populate cycle failed");
                }
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
