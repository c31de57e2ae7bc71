//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crosspost_content::{Platform, PublishResult};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{Job, JobId, JobStatus, SchedulerError, SourceRef};

/// Exclusive owner of every job. Callers only ever see clones.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job.
    ///
    /// Rejects an empty platform list and any `scheduled_at` not strictly in
    /// the future. Duplicate platforms are collapsed in first-occurrence order.
    #[tracing::instrument(skip(self, source), fields(source_id = %source.source_id))]
    pub async fn create(
        &self,
        source: SourceRef,
        platforms: &[Platform],
        scheduled_at: DateTime<Utc>,
    ) -> Result<JobId, SchedulerError> {
        let mut unique = Vec::with_capacity(platforms.len());
        for platform in platforms {
            if !unique.contains(platform) {
                unique.push(*platform);
            }
        }

        if unique.is_empty() {
            return Err(SchedulerError::Validation(
                "at least one platform is required".to_string(),
            ));
        }
        if source.source_id.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "source_id is required".to_string(),
            ));
        }
        if scheduled_at <= Utc::now() {
            return Err(SchedulerError::Validation(
                "scheduled time must be in the future".to_string(),
            ));
        }

        let job = Job::new(source, unique, scheduled_at);
        let id = job.id;
        self.jobs.write().await.insert(id, job);

        info!(job_id = %id, %scheduled_at, "scheduled job");
        Ok(id)
    }

    pub async fn get(&self, id: JobId) -> Result<Job, SchedulerError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SchedulerError::NotFound(id))
    }

    /// Snapshot of every job, ordered by creation time then id.
    pub async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        jobs
    }

    /// Cancel a pending job.
    pub async fn cancel(&self, id: JobId) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(SchedulerError::NotFound(id))?;

        if job.status != JobStatus::Pending {
            return Err(SchedulerError::StateConflict {
                id,
                status: job.status,
            });
        }

        job.status = JobStatus::Cancelled;
        job.completed_at = Some(Utc::now());
        info!(job_id = %id, "cancelled job");
        Ok(())
    }

    /// Remove a job that is not currently running.
    pub async fn delete(&self, id: JobId) -> Result<(), SchedulerError> {
        let mut jobs = self.jobs.write().await;
        let status = jobs.get(&id).ok_or(SchedulerError::NotFound(id))?.status;

        if status == JobStatus::Running {
            return Err(SchedulerError::StateConflict { id, status });
        }

        jobs.remove(&id);
        info!(job_id = %id, %status, "deleted job");
        Ok(())
    }

    /// Pending jobs whose scheduled time is at or before `now`, earliest first.
    pub async fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Job> {
        let mut due: Vec<Job> = {
            let jobs = self.jobs.read().await;
            jobs.values().filter(|j| j.is_due(now)).cloned().collect()
        };
        due.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        due
    }

    /// Move a pending job to running, returning the updated snapshot.
    ///
    /// Returns `None` if the job is gone or no longer pending.
    pub async fn mark_running(&self, id: JobId) -> Option<Job> {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            debug!(job_id = %id, "job vanished before it could start");
            return None;
        };

        if job.status != JobStatus::Pending {
            debug!(job_id = %id, status = %job.status, "job no longer pending, skipping");
            return None;
        }

        job.status = JobStatus::Running;
        Some(job.clone())
    }

    /// Record a finished run.
    pub async fn complete(&self, id: JobId, results: Vec<PublishResult>) {
        self.finish(id, JobStatus::Completed, None, results).await;
    }

    /// Record a run that could not proceed.
    pub async fn fail(&self, id: JobId, error: String, results: Vec<PublishResult>) {
        self.finish(id, JobStatus::Failed, Some(error), results).await;
    }

    async fn finish(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<String>,
        results: Vec<PublishResult>,
    ) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(&id) else {
            warn!(job_id = %id, %status, "cannot finish unknown job");
            return;
        };

        if job.status != JobStatus::Running {
            warn!(
                job_id = %id,
                current = %job.status,
                requested = %status,
                "ignoring transition from non-running job"
            );
            return;
        }

        job.status = status;
        job.results = results;
        job.error = error;
        job.completed_at = Some(Utc::now());
    }
}
