//! The `run` command: browser bootstrap, discovery and shutdown.

use anyhow::Context;
use scout_browser::{BrowserEngine, Surface};
use scout_core::AppConfig;
use scout_scanner::{DiscoveryLoop, ItemExtractor, JsonLinesSink, RecordSink, RunSummary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn open_sink(config: &AppConfig) -> anyhow::Result<Arc<dyn RecordSink>> {
    Ok(match &config.output.path {
        Some(path) => {
            tracing::info!("Appending records to {}", path.display());
            Arc::new(JsonLinesSink::append(path)?)
        }
        None => Arc::new(JsonLinesSink::stdout()),
    })
}

/// Cancel `token` on the first Ctrl-C and exit on the second.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupted, cancelling in-flight extractions");
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });
}

pub async fn scan(config: AppConfig) -> anyhow::Result<RunSummary> {
    let config = Arc::new(config);
    let sink = open_sink(&config)?;

    let engine = BrowserEngine::launch(&config.browser, &config.retry)
        .await
        .context("launching browser")?;
    if let Some(ua) = &engine.profile().user_agent {
        tracing::debug!("User agent: {}", ua);
    }
    let surface: Arc<dyn Surface> = Arc::new(engine);

    let extractor = ItemExtractor::new(Arc::clone(&surface), Arc::clone(&config), sink)?;
    let view = surface
        .open_view(&config.scanning.start_url)
        .await
        .with_context(|| format!("opening {}", config.scanning.start_url))?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let result = DiscoveryLoop::new(view.as_ref(), &config, Arc::new(extractor))
        .run(&cancel)
        .await;

    if let Err(e) = view.close().await {
        tracing::warn!("Failed to close result list: {}", e);
    }
    Ok(result?)
}
