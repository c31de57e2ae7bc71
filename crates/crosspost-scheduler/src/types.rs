//! Scheduler types.

use std::fmt;

use chrono::{DateTime, Utc};
use crosspost_content::{Platform, PublishResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a scheduled job.
pub type JobId = Uuid;

/// Reference to a post held by the content source.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_id: String,
    /// Credential for the content source. Never serialized.
    #[serde(default, skip_serializing)]
    pub access_token: String,
}

impl SourceRef {
    pub fn new(source_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRef")
            .field("source_id", &self.source_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// A scheduled publish job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub source: SourceRef,
    /// Target platforms, without duplicates.
    pub platforms: Vec<Platform>,
    pub scheduled_at: DateTime<Utc>,
    pub status: JobStatus,
    /// One result per platform once the job has run.
    pub results: Vec<PublishResult>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Job-level failure, such as an unreachable content source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Current status of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for its scheduled time.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Ran to completion. Individual platforms may still have failed.
    Completed,
    /// Could not run at all.
    Failed,
    /// Cancelled before it started.
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Job {
    /// Create a pending job with a fresh id.
    pub fn new(source: SourceRef, platforms: Vec<Platform>, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            platforms,
            scheduled_at,
            status: JobStatus::Pending,
            results: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Check if this job should run at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Pending && self.scheduled_at <= now
    }
}

/// What one scheduler tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Jobs moved to running.
    pub started: usize,
    /// Jobs that finished as completed.
    pub completed: usize,
    /// Jobs that finished as failed.
    pub failed: usize,
}
