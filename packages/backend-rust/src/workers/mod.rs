pub mod learning_style;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::config::LearningStyleConfig;
use crate::services::learning_style::LearningStylePipeline;

use self::learning_style::{next_firing, parse_schedule, run_scheduled, SystemClock};

static WORKER_LEADER: AtomicBool = AtomicBool::new(false);

pub fn is_worker_leader() -> bool {
    WORKER_LEADER.load(Ordering::Relaxed)
}

fn set_worker_leader(val: bool) {
    WORKER_LEADER.store(val, Ordering::Relaxed);
}

pub struct WorkerManager {
    scheduler: Mutex<JobScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    pipeline: Arc<LearningStylePipeline>,
    config: LearningStyleConfig,
}

impl WorkerManager {
    pub async fn new(
        pipeline: Arc<LearningStylePipeline>,
        config: LearningStyleConfig,
    ) -> Result<Self, WorkerError> {
        let scheduler = JobScheduler::new().await?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            scheduler: Mutex::new(scheduler),
            shutdown_tx,
            pipeline,
            config,
        })
    }

    pub async fn start(&self) -> Result<(), WorkerError> {
        if !self.config.worker_leader {
            info!("WORKER_LEADER not set, skipping worker startup");
            return Ok(());
        }

        set_worker_leader(true);
        info!("Starting workers (leader mode)");

        let scheduler = self.scheduler.lock().await;

        if self.config.worker_enabled {
            let schedule = self.config.schedule.clone();
            let tz = self.config.timezone;
            let parsed = parse_schedule(&schedule)?;

            let pipeline = Arc::clone(&self.pipeline);
            let shutdown_rx = self.shutdown_tx.subscribe();
            let job = Job::new_async_tz(schedule.as_str(), tz, move |_uuid, _lock| {
                let pipeline = Arc::clone(&pipeline);
                let mut rx = shutdown_rx.resubscribe();
                Box::pin(async move {
                    tokio::select! {
                        _ = rx.recv() => {},
                        _ = run_scheduled(&pipeline, &SystemClock) => {}
                    }
                })
            })?;
            scheduler.add(job).await?;

            let next = next_firing(&parsed, tz, chrono::Utc::now());
            info!(
                schedule = %schedule,
                timezone = %tz,
                next = ?next.map(|t| t.to_rfc3339()),
                "Learning style worker scheduled"
            );
        } else {
            info!("Learning style worker disabled");
        }

        scheduler.start().await?;
        info!("All workers started");

        Ok(())
    }

    pub async fn stop(&self) {
        if !is_worker_leader() {
            return;
        }

        info!("Stopping workers...");
        let _ = self.shutdown_tx.send(());

        let mut scheduler = self.scheduler.lock().await;
        if let Err(e) = scheduler.shutdown().await {
            warn!(error = %e, "Error shutting down scheduler");
        }

        set_worker_leader(false);
        info!("Workers stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
    #[error("Invalid schedule '{expr}': {reason}")]
    InvalidSchedule { expr: String, reason: String },
}
