//! Job scheduling for crosspost.
//!
//! This crate provides:
//! - An in-memory `JobStore` owning every scheduled publish job
//! - A tick-driven `Scheduler` that runs due jobs concurrently
//! - The `ContentPipeline` that fetches, translates and dispatches content

mod error;
mod pipeline;
mod scheduler;
mod store;
mod types;

pub use error::{PipelineError, SchedulerError};
pub use pipeline::{ContentPipeline, LanguagePair};
pub use scheduler::{JobExecutor, Scheduler, SchedulerConfig, SchedulerHandle};
pub use store::JobStore;
pub use types::{Job, JobId, JobStatus, SourceRef, TickSummary};
