use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use tracing::{error, info};

use crate::services::learning_style::{LearningStylePipeline, Period, ProcessReport};

use super::WorkerError;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn parse_schedule(expr: &str) -> Result<Schedule, WorkerError> {
    Schedule::from_str(expr).map_err(|e| WorkerError::InvalidSchedule {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

pub fn next_firing(
    schedule: &Schedule,
    tz: FixedOffset,
    after: DateTime<Utc>,
) -> Option<DateTime<FixedOffset>> {
    schedule.after(&after.with_timezone(&tz)).next()
}

/// One scheduled firing: processes the month before `clock.now()`.
/// Failures are logged and swallowed so the next firing still happens.
pub async fn run_scheduled(
    pipeline: &LearningStylePipeline,
    clock: &dyn Clock,
) -> Option<ProcessReport> {
    let period = Period::previous(clock.now(), pipeline.timezone());
    info!(period = %period, "starting monthly learning style processing");

    match pipeline.process_period(period).await {
        Ok(report) => {
            info!(
                period = %report.period,
                processed_users = report.processed_users,
                "monthly learning style processing completed"
            );
            Some(report)
        }
        Err(err) => {
            error!(period = %period, error = %err, "monthly learning style processing failed");
            None
        }
    }
}
