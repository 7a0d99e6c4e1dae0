// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-pass view of a thread: flags, tag names and the two activity clocks.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use forumkeeper_core::{ChannelId, ForumkeeperError, MessagingTransport, ThreadInfo};
use tracing::trace;

use crate::scanner::{HistoryScanner, StopCondition};

/// Built fresh for every pass and never persisted.
///
/// When both timestamps are present, `last_user_message_at` is never newer
/// than `last_any_message_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSnapshot {
    pub thread_id: ChannelId,
    pub forum_id: ChannelId,
    pub pinned: bool,
    pub archived: bool,
    /// A locked thread has already been closed, tagged or not.
    pub locked: bool,
    pub applied_tag_names: BTreeSet<String>,
    /// Newest message by anyone, bots included.
    pub last_any_message_at: Option<DateTime<Utc>>,
    /// Newest message by a non-bot author.
    pub last_user_message_at: Option<DateTime<Utc>>,
}

impl ThreadSnapshot {
    /// Snapshot of the thread's flags and tags with no activity loaded yet.
    pub fn from_thread(thread: &ThreadInfo) -> Self {
        Self {
            thread_id: thread.id,
            forum_id: thread.forum_id,
            pinned: thread.pinned,
            archived: thread.archived,
            locked: thread.locked,
            applied_tag_names: thread.applied_tags.iter().map(|t| t.name.clone()).collect(),
            last_any_message_at: None,
            last_user_message_at: None,
        }
    }

    /// Fill both activity clocks by scanning the thread's history newest-first.
    ///
    /// The scan stops at the first non-bot message, since both timestamps
    /// are known by then.
    pub async fn load_activity(
        &mut self,
        transport: &dyn MessagingTransport,
        scanner: &HistoryScanner,
    ) -> Result<(), ForumkeeperError> {
        let mut scan = scanner.scan(transport, self.thread_id, StopCondition::none());

        while let Some(item) = scan.next().await {
            let message = item?;
            if self.last_any_message_at.is_none() {
                self.last_any_message_at = Some(message.created_at);
            }
            if !message.author_is_bot {
                self.last_user_message_at = Some(message.created_at);
                break;
            }
        }

        trace!(
            thread = %self.thread_id,
            pages = scan.pages_fetched(),
            last_any = ?self.last_any_message_at,
            last_user = ?self.last_user_message_at,
            "thread activity loaded"
        );
        Ok(())
    }

    /// Build a complete snapshot in one call.
    pub async fn build(
        transport: &dyn MessagingTransport,
        scanner: &HistoryScanner,
        thread: &ThreadInfo,
    ) -> Result<Self, ForumkeeperError> {
        let mut snapshot = Self::from_thread(thread);
        snapshot.load_activity(transport, scanner).await?;
        Ok(snapshot)
    }
}
