//! Fetch, translate and dispatch, as one unit of work.

use std::sync::Arc;

use crosspost_content::{
    ContentSource, Platform, PublishResult, RawContent, Translator, translate_content,
};
use crosspost_publish::{DispatchError, Dispatcher};
use tracing::info;

use crate::{Job, JobExecutor, PipelineError, SourceRef};

/// Source and target languages for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self {
            source: "zh".to_string(),
            target: "en".to_string(),
        }
    }
}

/// Turns a `SourceRef` into published posts.
pub struct ContentPipeline {
    source: Arc<dyn ContentSource>,
    translator: Arc<dyn Translator>,
    languages: LanguagePair,
    dispatcher: Dispatcher,
}

impl ContentPipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        translator: Arc<dyn Translator>,
        languages: LanguagePair,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            source,
            translator,
            languages,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Fetch and translate the referenced content.
    #[tracing::instrument(skip(self, source), fields(source_id = %source.source_id))]
    pub async fn prepare(&self, source: &SourceRef) -> Result<RawContent, PipelineError> {
        let raw = self
            .source
            .fetch(&source.source_id, &source.access_token)
            .await?;

        Ok(translate_content(
            self.translator.as_ref(),
            raw,
            &self.languages.source,
            &self.languages.target,
        )
        .await?)
    }

    /// Prepare the content and publish it to `platforms`.
    ///
    /// Per-platform failures are reported in the results. Only failures that
    /// prevent every platform from being attempted are returned as errors.
    pub async fn run(
        &self,
        source: &SourceRef,
        platforms: &[Platform],
    ) -> Result<Vec<PublishResult>, PipelineError> {
        if platforms.is_empty() {
            return Err(DispatchError::Validation(
                "at least one platform is required".to_string(),
            )
            .into());
        }

        let content = self.prepare(source).await?;
        let results = self.dispatcher.publish_now(content, platforms).await?;
        info!(
            source_id = %source.source_id,
            results = results.len(),
            "pipeline run finished"
        );
        Ok(results)
    }

    /// A `JobExecutor` that runs each job through this pipeline.
    pub fn executor(self: Arc<Self>) -> JobExecutor {
        let executor: JobExecutor = Arc::new(move |job: Job| {
            let pipeline = Arc::clone(&self);
            Box::pin(async move {
                pipeline
                    .run(&job.source, &job.platforms)
                    .await
                    .map_err(|e| e.to_string())
            })
        });
        executor
    }
}
