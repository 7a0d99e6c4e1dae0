// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `forumkeeper purge`: delete one user's messages across the guild.

use std::sync::Arc;
use std::time::Duration;

use forumkeeper_config::ForumkeeperConfig;
use forumkeeper_core::{ChannelId, ForumkeeperError, GuildId, MessagingTransport, PluginAdapter, UserId};
use forumkeeper_lifecycle::{BulkPurgeWorker, PurgeOutcome, PurgeRequest};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::serve::connect_transport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Arguments of `forumkeeper purge` after CLI parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeArgs {
    pub user: u64,
    pub days: Option<u32>,
    pub channel: Option<u64>,
    pub count: Option<usize>,
    pub guild: Option<u64>,
}

impl PurgeArgs {
    /// Resolve against the config; `--guild` wins over `bot.guild_id`.
    pub fn into_request(self, config: &ForumkeeperConfig) -> Result<PurgeRequest, ForumkeeperError> {
        let guild = self
            .guild
            .or(config.bot.guild_id)
            .ok_or_else(|| ForumkeeperError::Config("purge needs --guild or bot.guild_id".to_string()))?;
        Ok(PurgeRequest {
            guild: GuildId(guild),
            target_user: UserId(self.user),
            day_cutoff: self.days,
            channel: self.channel.map(ChannelId),
            count_limit: self.count,
        })
    }
}

/// Runs the `forumkeeper purge` command.
pub async fn run_purge(config: ForumkeeperConfig, args: PurgeArgs) -> Result<(), ForumkeeperError> {
    let request = args.into_request(&config)?;
    let transport = Arc::new(connect_transport(&config).await?);
    transport.wait_until_connected(CONNECT_TIMEOUT).await?;

    let result = execute_purge(transport.clone(), config.purge.page_size, request.clone()).await;

    if let Err(e) = transport.shutdown().await {
        warn!(error = %e, "transport shutdown failed (non-fatal)");
    }

    let outcome = result?;
    for line in summary_lines(&request, &outcome) {
        println!("{line}");
    }
    Ok(())
}

/// Spawn the purge and wait for its completion callback.
pub async fn execute_purge(
    transport: Arc<dyn MessagingTransport>,
    page_size: u8,
    request: PurgeRequest,
) -> Result<PurgeOutcome, ForumkeeperError> {
    info!(user = %request.target_user, guild = %request.guild, "purge requested");

    let (tx, rx) = oneshot::channel();
    let worker = BulkPurgeWorker::new(transport, page_size);
    let handle = worker.purge(request, move |result| {
        let _ = tx.send(result);
    });

    match rx.await {
        Ok(result) => result,
        Err(_) => {
            let reason = match handle.await {
                Err(e) if e.is_panic() => "purge task panicked".to_string(),
                _ => "purge task ended without a result".to_string(),
            };
            Err(ForumkeeperError::Internal(reason))
        }
    }
}

/// The summary printed once a purge finishes.
pub fn summary_lines(request: &PurgeRequest, outcome: &PurgeOutcome) -> Vec<String> {
    let channel = match request.channel {
        Some(id) => id.to_string(),
        None => "All channels".to_string(),
    };
    let range = match request.day_cutoff {
        Some(days) if days > 0 => format!("Last {days} day{}", if days == 1 { "" } else { "s" }),
        _ => "All messages".to_string(),
    };
    let limit = match request.count_limit {
        Some(n) => n.to_string(),
        None => "None".to_string(),
    };

    let mut lines = vec![
        format!("Messages Deleted: {}", outcome.deleted_count),
        format!("Channel: {channel}"),
        format!("Time Range: {range}"),
        format!("Limit: {limit}"),
    ];
    if outcome.channels_failed > 0 || outcome.delete_failures > 0 {
        lines.push(format!(
            "Skipped: {} channel(s), {} message(s)",
            outcome.channels_failed, outcome.delete_failures
        ));
    }
    lines
}
