// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `forumkeeper serve`: keep the gateway connected and run the daily pass
//! until a shutdown signal arrives.

use std::sync::Arc;

use forumkeeper_config::ForumkeeperConfig;
use forumkeeper_core::{ForumkeeperError, PluginAdapter};
use forumkeeper_discord::DiscordTransport;
use forumkeeper_lifecycle::{LifecycleScheduler, SchedulerSettings};
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `forumkeeper serve` command.
pub async fn run_serve(config: ForumkeeperConfig) -> Result<(), ForumkeeperError> {
    info!("starting forumkeeper serve");

    let transport = Arc::new(connect_transport(&config).await?);
    let cancel = shutdown::install_signal_handler();

    let scheduler = if config.lifecycle.enabled {
        let settings = SchedulerSettings::from_config(&config.lifecycle)?;
        if settings.forums.is_empty() {
            warn!("lifecycle enabled but no forums configured");
        }
        let scheduler = LifecycleScheduler::new(transport.clone(), settings);
        scheduler.start().await;
        Some(scheduler)
    } else {
        info!("lifecycle scheduler disabled");
        None
    };

    cancel.cancelled().await;

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    if let Err(e) = transport.shutdown().await {
        warn!(error = %e, "transport shutdown failed (non-fatal)");
    }

    info!("forumkeeper serve shutdown complete");
    Ok(())
}

/// Build the Discord transport from `[bot]`.
pub async fn connect_transport(config: &ForumkeeperConfig) -> Result<DiscordTransport, ForumkeeperError> {
    let token = config
        .bot
        .token
        .as_deref()
        .ok_or_else(|| ForumkeeperError::Config("bot.token is required to connect".to_string()))?;
    DiscordTransport::connect(token).await
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("forumkeeper={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
