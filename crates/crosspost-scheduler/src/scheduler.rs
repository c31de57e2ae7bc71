//! Tick-driven job scheduler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crosspost_content::{Platform, PublishResult};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::{Job, JobId, JobStore, SchedulerError, SourceRef, TickSummary};

/// Default time between scans for due jobs.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Runs a job and returns one result per platform, or a job-level error.
pub type JobExecutor = Arc<
    dyn Fn(Job) -> Pin<Box<dyn Future<Output = Result<Vec<PublishResult>, String>> + Send>>
        + Send
        + Sync,
>;

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// The job scheduler.
#[derive(Clone)]
pub struct Scheduler {
    store: JobStore,
    executor: JobExecutor,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a new scheduler.
    pub fn new(store: JobStore, executor: JobExecutor, config: SchedulerConfig) -> Self {
        Self {
            store,
            executor,
            config,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Schedule a publish job for a future time.
    pub async fn schedule_job(
        &self,
        source: SourceRef,
        platforms: &[Platform],
        scheduled_at: DateTime<Utc>,
    ) -> Result<JobId, SchedulerError> {
        self.store.create(source, platforms, scheduled_at).await
    }

    /// List all jobs.
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.store.list().await
    }

    /// Get a job by id.
    pub async fn get_job(&self, id: JobId) -> Result<Job, SchedulerError> {
        self.store.get(id).await
    }

    /// Cancel a job that has not started.
    pub async fn cancel_job(&self, id: JobId) -> Result<(), SchedulerError> {
        self.store.cancel(id).await
    }

    /// Delete a job that is not running.
    pub async fn delete_job(&self, id: JobId) -> Result<(), SchedulerError> {
        self.store.delete(id).await
    }

    /// Run the scheduler loop until `shutdown_rx` becomes true.
    ///
    /// A tick in progress always finishes before the loop observes shutdown.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            tick_interval_secs = self.config.tick_interval.as_secs(),
            "scheduler starting"
        );

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    // A dropped sender also means stop
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("scheduler received shutdown signal");
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("scheduler shut down gracefully");
    }

    /// Start the loop on its own task.
    pub fn spawn(&self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = self.clone();
        let task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });
        SchedulerHandle { shutdown_tx, task }
    }

    /// Run every due job once, concurrently, and record the outcomes.
    pub async fn tick(&self) -> TickSummary {
        self.tick_at(Utc::now()).await
    }

    /// `tick` with an explicit notion of the current time.
    #[tracing::instrument(skip(self))]
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();
        let due = self.store.due_jobs(now).await;

        let mut handles: Vec<(JobId, JoinHandle<Result<Vec<PublishResult>, String>>)> =
            Vec::with_capacity(due.len());
        for job in due {
            // Cancelled or deleted since the snapshot was taken
            let Some(job) = self.store.mark_running(job.id).await else {
                continue;
            };

            info!(job_id = %job.id, platforms = ?job.platforms, "executing job");
            summary.started += 1;
            let executor = Arc::clone(&self.executor);
            let id = job.id;
            handles.push((id, tokio::spawn(async move { executor(job).await })));
        }

        for (id, handle) in handles {
            match handle.await {
                Ok(Ok(results)) => {
                    let succeeded = results.iter().filter(|r| r.success).count();
                    info!(
                        job_id = %id,
                        succeeded,
                        failed = results.len() - succeeded,
                        "job completed"
                    );
                    self.store.complete(id, results).await;
                    summary.completed += 1;
                }
                Ok(Err(e)) => {
                    warn!(job_id = %id, error = %e, "job failed");
                    self.store.fail(id, e, Vec::new()).await;
                    summary.failed += 1;
                }
                Err(e) => {
                    error!(job_id = %id, error = %e, "job execution panicked");
                    self.store
                        .fail(id, "job execution panicked".to_string(), Vec::new())
                        .await;
                    summary.failed += 1;
                }
            }
        }

        if summary.started > 0 {
            info!(
                started = summary.started,
                completed = summary.completed,
                failed = summary.failed,
                "tick finished"
            );
        }
        summary
    }
}

/// Handle to a scheduler loop running on its own task.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for any in-flight tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_executor() -> JobExecutor {
        Arc::new(|_job| Box::pin(async { Ok(Vec::new()) }))
    }

    #[test]
    fn test_default_tick_interval() {
        assert_eq!(
            SchedulerConfig::default().tick_interval,
            Duration::from_secs(30)
        );
    }

    #[tokio::test]
    async fn test_tick_with_nothing_due() {
        let scheduler = Scheduler::new(
            JobStore::new(),
            noop_executor(),
            SchedulerConfig::default(),
        );
        assert_eq!(scheduler.tick().await, TickSummary::default());
    }

    #[tokio::test]
    async fn test_shutdown_before_first_tick() {
        let scheduler = Scheduler::new(
            JobStore::new(),
            noop_executor(),
            SchedulerConfig::default(),
        );
        let handle = scheduler.spawn();
        handle.shutdown().await;
    }
}
