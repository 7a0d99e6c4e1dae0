// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging transport trait: the boundary between the lifecycle engine and
//! the chat platform (Discord in production, in-memory in tests).

use async_trait::async_trait;

use crate::error::ForumkeeperError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChannelId, ChannelInfo, ConnectionState, ForumTag, GuildId, HistoryMessage, MessageId, Notice,
    TagId, ThreadInfo,
};

/// Platform operations consumed by the scheduler and the purge worker.
///
/// Every async method is an independent suspension point that may fail.
/// Implementations do not retry on behalf of the caller beyond whatever
/// rate-limit handling their HTTP client performs.
#[async_trait]
pub trait MessagingTransport: PluginAdapter {
    /// Current gateway connection state.
    fn connection_state(&self) -> ConnectionState;

    /// Lists the threads of a forum channel.
    async fn list_forum_threads(&self, forum: ChannelId) -> Result<Vec<ThreadInfo>, ForumkeeperError>;

    /// Lists the tags a forum makes available to its threads.
    async fn forum_tags(&self, forum: ChannelId) -> Result<Vec<ForumTag>, ForumkeeperError>;

    /// Lists the text-like channels of a guild, in platform order.
    async fn list_text_channels(&self, guild: GuildId) -> Result<Vec<ChannelInfo>, ForumkeeperError>;

    /// Fetches up to `limit` messages older than `before` (or the newest
    /// messages when `before` is `None`), newest first.
    async fn fetch_messages(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<Vec<HistoryMessage>, ForumkeeperError>;

    /// Posts a notice into a channel or thread.
    async fn send_notice(&self, channel: ChannelId, notice: &Notice) -> Result<MessageId, ForumkeeperError>;

    /// Deletes a single message.
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ForumkeeperError>;

    /// Replaces the applied tag set of a thread.
    async fn set_thread_tags(&self, thread: ChannelId, tags: &[TagId]) -> Result<(), ForumkeeperError>;

    /// Locks and archives a thread in one request.
    async fn lock_and_archive(&self, thread: ChannelId) -> Result<(), ForumkeeperError>;
}
