// src/pipeline/schedule.rs

//! Periodic check loop.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::models::ScheduleConfig;
use crate::pipeline::{CheckReport, Watcher};

/// Fixed-interval scheduler with a shorter retry delay after failures.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
    retry: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration, retry: Duration) -> Self {
        Self { interval, retry }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(
            Duration::from_secs(config.interval_secs),
            Duration::from_secs(config.retry_secs),
        )
    }

    /// Delay before the next cycle given the outcome of the last one.
    pub fn next_delay(&self, outcome: &Result<CheckReport>) -> Duration {
        match outcome {
            Ok(_) => self.interval,
            Err(_) => self.retry,
        }
    }

    /// Check immediately, then keep checking until `shutdown` resolves.
    ///
    /// A running cycle is not interrupted; shutdown is observed while waiting.
    pub async fn run<F>(&self, watcher: &Watcher, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let outcome = watcher.check().await;
            match &outcome {
                Ok(report) if report.has_new() => log::info!(
                    "Scheduled check announced {} new course(s)",
                    report.new_courses.len()
                ),
                Ok(_) => log::debug!("Scheduled check found nothing new"),
                Err(e) => log::error!("Scheduled check failed: {e}"),
            }

            let delay = self.next_delay(&outcome);
            log::debug!("Next check in {}s", delay.as_secs());

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    log::info!("Scheduler stopping");
                    return;
                }
            }
        }
    }
}
