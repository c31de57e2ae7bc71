//! Error types for the scheduler.

use crosspost_content::{SourceError, TranslateError};
use crosspost_publish::DispatchError;
use thiserror::Error;

use crate::{JobId, JobStatus};

/// Errors that can occur in scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Invalid job request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Job not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The job's current status does not allow the operation.
    #[error("job {id} is {status}")]
    StateConflict { id: JobId, status: JobStatus },
}

/// Errors that fail a whole pipeline run before any platform is attempted.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source content could not be fetched.
    #[error("failed to fetch source content: {0}")]
    Source(#[from] SourceError),

    /// Source content could not be translated.
    #[error("failed to translate content: {0}")]
    Translate(#[from] TranslateError),

    /// The dispatch request was rejected.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
