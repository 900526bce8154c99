//! Startup wiring: build collaborators, spawn the loops, serve HTTP.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use atlas_core::Config;
use atlas_notify::{messenger_from_token, render_digest, DIGEST_TITLE};
use atlas_observer::{AtlasMetrics, DigestBuilder, DigestScheduler, PollLoop, SchedulerCursor};
use atlas_orchestrator::{AirflowClient, WorkflowSource};

use crate::router::build_router;
use crate::state::AppState;

fn workflow_source(config: &Config) -> anyhow::Result<Arc<dyn WorkflowSource>> {
    let client = AirflowClient::new(&config.orchestrator)
        .context("invalid orchestrator configuration")?;
    Ok(Arc::new(client))
}

/// Run the HTTP surface and both loops until a shutdown signal arrives.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    config.log_summary();

    let source = workflow_source(config)?;
    let messenger = messenger_from_token(config.messaging.bot_token.as_deref());
    info!(via = messenger.channel_name(), "digest messenger ready");

    let metrics = Arc::new(AtlasMetrics::new(config.env.clone())?);
    let cursor = SchedulerCursor::from_config(&config.schedule, Utc::now())
        .context("invalid digest schedule")?;

    let poller = PollLoop::new(
        source.clone(),
        metrics.clone(),
        Duration::from_secs(config.schedule.poll_interval_secs),
    );
    let builder = DigestBuilder::new(source, config.schedule.snippet_candidates.clone());
    let scheduler = DigestScheduler::new(
        builder,
        messenger,
        config.messaging.digest_channel.clone(),
        metrics.clone(),
        cursor,
    );

    let poll_task = tokio::spawn(poller.run());
    let digest_task = tokio::spawn(scheduler.run());

    let state = Arc::new(AppState {
        env: config.env.clone(),
        metrics,
    });
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poll_task.abort();
    digest_task.abort();
    info!("atlas stopped");
    Ok(())
}

/// Build one digest now, print it as JSON, and optionally deliver it.
pub async fn digest_once(config: &Config, post: bool) -> anyhow::Result<()> {
    let builder = DigestBuilder::new(
        workflow_source(config)?,
        config.schedule.snippet_candidates.clone(),
    );
    let report = builder.build().await.context("failed to build digest")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if post {
        let messenger = messenger_from_token(config.messaging.bot_token.as_deref());
        let blocks = render_digest(&report);
        messenger
            .post(&config.messaging.digest_channel, DIGEST_TITLE, Some(blocks.as_slice()))
            .await
            .context("failed to deliver digest")?;
        info!(
            channel = %config.messaging.digest_channel,
            via = messenger.channel_name(),
            "digest delivered"
        );
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl_c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
