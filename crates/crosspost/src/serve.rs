//! Scheduler loop and API server.

use std::sync::Arc;
use std::time::Duration;

use miette::Result;
use tracing::info;

use crosspost_scheduler::{ContentPipeline, JobStore, Scheduler, SchedulerConfig};
use crosspost_web::create_router;

/// Run until ctrl-c, then stop accepting requests and let the current tick finish.
pub async fn run(pipeline: Arc<ContentPipeline>, bind: &str, tick_interval: u64) -> Result<()> {
    let config = SchedulerConfig {
        tick_interval: Duration::from_secs(tick_interval),
    };
    let scheduler = Scheduler::new(JobStore::new(), Arc::clone(&pipeline).executor(), config);
    let scheduler_handle = scheduler.spawn();

    let router = create_router(scheduler, pipeline);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| miette::miette!("failed to bind {}: {}", bind, e))?;

    info!("api server listening on http://{}", bind);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("received shutdown signal");
        })
        .await;

    scheduler_handle.shutdown().await;
    served.map_err(|e| miette::miette!("api server error: {}", e))?;

    info!("shut down cleanly");
    Ok(())
}
