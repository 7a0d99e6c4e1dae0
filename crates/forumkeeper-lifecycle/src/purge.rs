// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retroactive deletion of one user's messages.
//!
//! A purge walks either a single channel or every text channel of a guild,
//! newest-first, deleting messages by the target author. The optional day
//! cutoff bounds how far back each channel is scanned and the optional count
//! limit bounds the total number of deletions across all channels.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use forumkeeper_core::{ChannelId, ForumkeeperError, GuildId, MessagingTransport, UserId};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::scanner::{HistoryScanner, StopCondition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeRequest {
    pub guild: GuildId,
    pub target_user: UserId,
    /// Only messages from the last N days are considered. `None` or `0` means all history.
    pub day_cutoff: Option<u32>,
    /// Restrict the purge to one channel instead of every text channel of the guild.
    pub channel: Option<ChannelId>,
    /// Upper bound on successful deletions.
    pub count_limit: Option<usize>,
}

impl PurgeRequest {
    pub fn new(guild: GuildId, target_user: UserId) -> Self {
        Self {
            guild,
            target_user,
            day_cutoff: None,
            channel: None,
            count_limit: None,
        }
    }

    fn time_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.day_cutoff
            .filter(|days| *days > 0)
            .map(|days| now - TimeDelta::days(i64::from(days)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub deleted_count: usize,
    pub channels_scanned: usize,
    /// Channels whose history could not be read; they were skipped.
    pub channels_failed: usize,
    pub delete_failures: usize,
}

/// Runs purges off the request path.
#[derive(Clone)]
pub struct BulkPurgeWorker {
    transport: Arc<dyn MessagingTransport>,
    scanner: HistoryScanner,
}

impl BulkPurgeWorker {
    pub fn new(transport: Arc<dyn MessagingTransport>, page_size: u8) -> Self {
        Self {
            transport,
            scanner: HistoryScanner::new(page_size),
        }
    }

    /// Spawn the purge on its own task and hand the result to `on_complete`.
    ///
    /// There is no external cancellation; drop the handle to detach.
    pub fn purge<F>(&self, request: PurgeRequest, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<PurgeOutcome, ForumkeeperError>) + Send + 'static,
    {
        let worker = self.clone();
        tokio::spawn(async move {
            let result = worker.run(&request).await;
            on_complete(result);
        })
    }

    /// Run the purge on the current task.
    ///
    /// Only a failure to enumerate the guild's channels is returned as an
    /// error; per-channel and per-message failures are logged and counted.
    pub async fn run(&self, request: &PurgeRequest) -> Result<PurgeOutcome, ForumkeeperError> {
        self.run_at(request, Utc::now()).await
    }

    async fn run_at(
        &self,
        request: &PurgeRequest,
        now: DateTime<Utc>,
    ) -> Result<PurgeOutcome, ForumkeeperError> {
        let channels = self.target_channels(request).await?;
        let cutoff = request.time_cutoff(now);
        let mut remaining = request.count_limit;
        let mut outcome = PurgeOutcome::default();

        info!(
            user = %request.target_user,
            channels = channels.len(),
            cutoff = ?cutoff,
            limit = ?request.count_limit,
            "purge started"
        );

        for channel in channels {
            if remaining == Some(0) {
                debug!("purge limit reached");
                break;
            }

            let deleted = self.purge_channel(channel, request.target_user, cutoff, remaining, &mut outcome).await;
            outcome.deleted_count += deleted;
            if let Some(budget) = remaining.as_mut() {
                *budget = budget.saturating_sub(deleted);
            }
        }

        info!(
            user = %request.target_user,
            deleted = outcome.deleted_count,
            channels = outcome.channels_scanned,
            channels_failed = outcome.channels_failed,
            delete_failures = outcome.delete_failures,
            "purge complete"
        );
        Ok(outcome)
    }

    async fn target_channels(&self, request: &PurgeRequest) -> Result<Vec<ChannelId>, ForumkeeperError> {
        match request.channel {
            Some(channel) => Ok(vec![channel]),
            None => Ok(self
                .transport
                .list_text_channels(request.guild)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect()),
        }
    }

    /// Returns the number of successful deletions in `channel`.
    async fn purge_channel(
        &self,
        channel: ChannelId,
        target: UserId,
        time_cutoff: Option<DateTime<Utc>>,
        budget: Option<usize>,
        outcome: &mut PurgeOutcome,
    ) -> usize {
        let stop = StopCondition {
            time_cutoff,
            count_limit: budget,
        };
        let mut scan = self
            .scanner
            .scan(self.transport.as_ref(), channel, stop)
            .matching(move |m| m.author_id == target);
        let mut deleted = 0;

        while let Some(item) = scan.next().await {
            let message = match item {
                Ok(message) => message,
                Err(e) => {
                    warn!(channel = %channel, error = %e, "skipping channel");
                    outcome.channels_failed += 1;
                    return deleted;
                }
            };

            match self.transport.delete_message(channel, message.id).await {
                Ok(()) => {
                    debug!(channel = %channel, message = %message.id, "message deleted");
                    deleted += 1;
                }
                Err(e) => {
                    debug!(channel = %channel, message = %message.id, error = %e, "could not delete message");
                    outcome.delete_failures += 1;
                    scan.release_last();
                }
            }
        }

        outcome.channels_scanned += 1;
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forumkeeper_core::{ChannelInfo, MessageId};
    use forumkeeper_test_utils::MockTransport;

    const GUILD: GuildId = GuildId(1);
    const TARGET: UserId = UserId(50);
    const OTHER: UserId = UserId(51);

    fn text_channel(id: u64) -> ChannelInfo {
        ChannelInfo {
            id: ChannelId(id),
            guild_id: GUILD,
            name: format!("channel-{id}"),
        }
    }

    async fn push(transport: &MockTransport, channel: u64, author: UserId, days_ago: i64, now: DateTime<Utc>) -> MessageId {
        transport
            .push_message(ChannelId(channel), author, false, now - TimeDelta::days(days_ago))
            .await
    }

    fn worker(transport: &Arc<MockTransport>) -> BulkPurgeWorker {
        BulkPurgeWorker::new(transport.clone(), 100)
    }

    #[tokio::test]
    async fn deletes_target_messages_inside_the_cutoff() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        push(&transport, 10, OTHER, 0, now).await;
        let b = push(&transport, 10, TARGET, 1, now).await;
        let c = push(&transport, 10, TARGET, 10, now).await;
        push(&transport, 10, TARGET, 40, now).await;

        let mut request = PurgeRequest::new(GUILD, TARGET);
        request.channel = Some(ChannelId(10));
        request.day_cutoff = Some(30);
        let outcome = worker(&transport).run_at(&request, now).await.unwrap();

        assert_eq!(outcome.deleted_count, 2);
        assert_eq!(transport.deleted_messages().await, vec![b, c]);
    }

    #[tokio::test]
    async fn count_limit_deletes_the_newest_first() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        let newest = push(&transport, 10, TARGET, 1, now).await;
        push(&transport, 10, TARGET, 2, now).await;

        let mut request = PurgeRequest::new(GUILD, TARGET);
        request.channel = Some(ChannelId(10));
        request.count_limit = Some(1);
        let outcome = worker(&transport).run_at(&request, now).await.unwrap();

        assert_eq!(outcome.deleted_count, 1);
        assert_eq!(transport.deleted_messages().await, vec![newest]);
    }

    #[tokio::test]
    async fn budget_is_shared_across_channels() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        for id in [10, 11, 12] {
            transport.add_text_channel(text_channel(id)).await;
            for day in 0..3 {
                push(&transport, id, TARGET, day, now).await;
            }
        }

        let mut request = PurgeRequest::new(GUILD, TARGET);
        request.count_limit = Some(4);
        let outcome = worker(&transport).run_at(&request, now).await.unwrap();

        assert_eq!(outcome.deleted_count, 4);
        assert_eq!(outcome.channels_scanned, 2, "third channel never scanned");
        assert!(transport.fetch_calls(ChannelId(12)).await.is_empty());
    }

    #[tokio::test]
    async fn failed_deletes_do_not_consume_budget() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        let undeletable = push(&transport, 10, TARGET, 1, now).await;
        let second = push(&transport, 10, TARGET, 2, now).await;
        let third = push(&transport, 10, TARGET, 3, now).await;
        transport.fail_delete(undeletable).await;

        let mut request = PurgeRequest::new(GUILD, TARGET);
        request.channel = Some(ChannelId(10));
        request.count_limit = Some(2);
        let outcome = worker(&transport).run_at(&request, now).await.unwrap();

        assert_eq!(outcome.deleted_count, 2);
        assert_eq!(outcome.delete_failures, 1);
        assert_eq!(transport.deleted_messages().await, vec![second, third]);
    }

    #[tokio::test]
    async fn unreadable_channel_is_skipped() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        transport.add_text_channel(text_channel(10)).await;
        transport.add_text_channel(text_channel(11)).await;
        push(&transport, 10, TARGET, 1, now).await;
        push(&transport, 11, TARGET, 1, now).await;
        transport.fail_fetch_after(ChannelId(10), 0).await;

        let outcome = worker(&transport)
            .run_at(&PurgeRequest::new(GUILD, TARGET), now)
            .await
            .unwrap();

        assert_eq!(outcome.deleted_count, 1);
        assert_eq!(outcome.channels_failed, 1);
        assert_eq!(outcome.channels_scanned, 1);
    }

    #[tokio::test]
    async fn channel_listing_failure_is_an_error() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_guild(GUILD).await;

        let result = worker(&transport).run(&PurgeRequest::new(GUILD, TARGET)).await;
        assert!(matches!(result, Err(ForumkeeperError::ContainerAccess { .. })));
    }

    #[tokio::test]
    async fn zero_day_cutoff_means_all_history() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        push(&transport, 10, TARGET, 400, now).await;

        let mut request = PurgeRequest::new(GUILD, TARGET);
        request.channel = Some(ChannelId(10));
        request.day_cutoff = Some(0);
        let outcome = worker(&transport).run_at(&request, now).await.unwrap();

        assert_eq!(outcome.deleted_count, 1);
    }

    #[tokio::test]
    async fn purge_reports_through_the_callback() {
        let transport = Arc::new(MockTransport::new());
        let now = Utc::now();
        push(&transport, 10, TARGET, 1, now).await;
        let (tx, rx) = tokio::sync::oneshot::channel();

        let mut request = PurgeRequest::new(GUILD, TARGET);
        request.channel = Some(ChannelId(10));
        let handle = worker(&transport).purge(request, move |result| {
            let _ = tx.send(result);
        });

        let outcome = rx.await.unwrap().unwrap();
        handle.await.unwrap();
        assert_eq!(outcome.deleted_count, 1);
    }
}
