//! Crosspost: multi-platform content publisher
//!
//! Main binary with subcommands:
//! - `serve`: Scheduler loop plus the JSON API
//! - `publish`: Publish one source post immediately
//! - `platforms`: Show which publishers are configured

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crosspost_content::{
    ContentAdapter, GoogleTranslator, HttpContentSource, PassthroughTranslator, Platform,
    Translator,
};
use crosspost_publish::{Dispatcher, PublisherRegistry, PublishersConfig};
use crosspost_scheduler::{ContentPipeline, LanguagePair, SourceRef};

mod serve;

#[derive(Parser)]
#[command(name = "crosspost")]
#[command(about = "Multi-platform content publisher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and the HTTP API
    Serve {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Address to bind the API server to
        #[arg(long, env = "CROSSPOST_BIND", default_value = "0.0.0.0:8080")]
        bind: String,

        /// Seconds between scans for due jobs
        #[arg(
            long,
            env = "CROSSPOST_TICK_INTERVAL",
            default_value = "30",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        tick_interval: u64,
    },

    /// Publish a source post now and print the results as JSON
    Publish {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Source post id
        source_id: String,

        /// Access token for the source gateway
        #[arg(long, env = "CROSSPOST_ACCESS_TOKEN", default_value = "")]
        access_token: String,

        /// Target platforms (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        platforms: Vec<Platform>,
    },

    /// List configured publishers
    Platforms {
        /// Directory holding per-platform JSON config files
        #[arg(long, env = "CROSSPOST_CONFIG_DIR")]
        config_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TranslatorKind {
    /// Publish source text unchanged
    #[value(name = "none")]
    Passthrough,
    /// Google Cloud Translation
    Google,
}

/// Settings shared by every command that runs the pipeline.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// Directory holding per-platform JSON config files
    #[arg(long, env = "CROSSPOST_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Base URL of the source content gateway
    #[arg(long, env = "CROSSPOST_SOURCE_URL")]
    source_url: String,

    /// Translation backend
    #[arg(long, env = "CROSSPOST_TRANSLATOR", value_enum, default_value = "none")]
    translator: TranslatorKind,

    /// API key for the Google translator
    #[arg(long, env = "GOOGLE_TRANSLATE_API_KEY")]
    google_api_key: Option<String>,

    /// Language of the source posts
    #[arg(long, env = "CROSSPOST_SOURCE_LANG", default_value = "zh")]
    source_lang: String,

    /// Language to publish in
    #[arg(long, env = "CROSSPOST_TARGET_LANG", default_value = "en")]
    target_lang: String,

    /// Origin name used in attribution text
    #[arg(long, env = "CROSSPOST_SOURCE_LABEL")]
    source_label: Option<String>,
}

impl PipelineArgs {
    /// Build the pipeline from configuration and publisher settings.
    fn build(&self) -> Result<Arc<ContentPipeline>> {
        let registry = load_registry(self.config_dir.as_deref())?;

        let source = HttpContentSource::new(&self.source_url)
            .map_err(|e| miette::miette!("failed to create content source: {}", e))?;

        let translator: Arc<dyn Translator> = match self.translator {
            TranslatorKind::Passthrough => Arc::new(PassthroughTranslator),
            TranslatorKind::Google => {
                let api_key = self.google_api_key.as_deref().ok_or_else(|| {
                    miette::miette!("GOOGLE_TRANSLATE_API_KEY is required for the google translator")
                })?;
                Arc::new(
                    GoogleTranslator::new(api_key)
                        .map_err(|e| miette::miette!("failed to create translator: {}", e))?,
                )
            }
        };

        let adapter = match &self.source_label {
            Some(label) => ContentAdapter::new(label),
            None => ContentAdapter::default(),
        };

        let languages = LanguagePair {
            source: self.source_lang.clone(),
            target: self.target_lang.clone(),
        };

        Ok(Arc::new(ContentPipeline::new(
            Arc::new(source),
            translator,
            languages,
            Dispatcher::new(registry, adapter),
        )))
    }
}

fn load_registry(config_dir: Option<&std::path::Path>) -> Result<PublisherRegistry> {
    let config = PublishersConfig::load(config_dir)
        .map_err(|e| miette::miette!("failed to load publisher config: {}", e))?;
    let registry = PublisherRegistry::from_config(&config)
        .map_err(|e| miette::miette!("failed to create publishers: {}", e))?;

    tracing::info!(enabled = ?registry.enabled_platforms(), "publishers loaded");
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "crosspost=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            pipeline,
            bind,
            tick_interval,
        } => serve::run(pipeline.build()?, &bind, tick_interval).await,
        Commands::Publish {
            pipeline,
            source_id,
            access_token,
            platforms,
        } => run_publish(pipeline.build()?, source_id, access_token, &platforms).await,
        Commands::Platforms { config_dir } => run_platforms(config_dir.as_deref()),
    }
}

async fn run_publish(
    pipeline: Arc<ContentPipeline>,
    source_id: String,
    access_token: String,
    platforms: &[Platform],
) -> Result<()> {
    let source = SourceRef::new(source_id, access_token);
    let results = pipeline
        .run(&source, platforms)
        .await
        .map_err(|e| miette::miette!("{}", e))?;

    let output = serde_json::to_string_pretty(&results)
        .map_err(|e| miette::miette!("failed to encode results: {}", e))?;
    println!("{}", output);
    Ok(())
}

fn run_platforms(config_dir: Option<&std::path::Path>) -> Result<()> {
    let registry = load_registry(config_dir)?;

    for platform in Platform::ALL {
        let status = match registry.get(platform) {
            Some(publisher) if publisher.is_enabled() => "enabled",
            Some(_) => "disabled",
            None => "not registered",
        };
        println!("{:<10} {}", platform.as_str(), status);
    }
    Ok(())
}
