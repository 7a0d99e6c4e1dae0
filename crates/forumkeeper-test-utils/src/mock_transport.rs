// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging transport for deterministic testing.
//!
//! `MockTransport` implements `MessagingTransport` over in-memory forums,
//! threads, text channels and message history. Mutations are applied to that
//! state and recorded in a call log for assertions. Failures can be injected
//! per forum, guild, channel or message.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, watch};

use forumkeeper_core::{
    ChannelId, ChannelInfo, ConnectionState, ForumTag, ForumkeeperError, GuildId, HealthStatus,
    HistoryMessage, MessageId, MessagingTransport, Notice, PluginAdapter, TagId, ThreadInfo, UserId,
};

/// One request received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListThreads { forum: ChannelId },
    ForumTags { forum: ChannelId },
    ListChannels { guild: GuildId },
    Fetch {
        channel: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    },
    Send { channel: ChannelId, notice: Notice },
    Delete { channel: ChannelId, message: MessageId },
    SetTags { thread: ChannelId, tags: Vec<TagId> },
    LockArchive { thread: ChannelId },
}

impl MockCall {
    /// Whether the call changes platform state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Send { .. } | Self::Delete { .. } | Self::SetTags { .. } | Self::LockArchive { .. }
        )
    }
}

#[derive(Default)]
struct MockState {
    forums: HashMap<ChannelId, Vec<ForumTag>>,
    threads: BTreeMap<ChannelId, ThreadInfo>,
    text_channels: Vec<ChannelInfo>,
    /// Per channel, sorted newest first.
    history: HashMap<ChannelId, Vec<HistoryMessage>>,
    next_sequence: u64,

    failing_forums: HashSet<ChannelId>,
    failing_guilds: HashSet<GuildId>,
    /// Number of pages a channel serves before its fetches start failing.
    fetch_budget: HashMap<ChannelId, usize>,
    fetches_served: HashMap<ChannelId, usize>,
    failing_mutations: HashSet<ChannelId>,
    failing_deletes: HashSet<MessageId>,

    calls: Vec<MockCall>,
    sent: Vec<(ChannelId, Notice)>,
    deleted: Vec<MessageId>,
    tag_updates: Vec<(ChannelId, Vec<TagId>)>,
}

impl MockState {
    /// Snowflake-style id: creation millis in the high bits, a sequence in the low bits.
    fn allocate_id(&mut self, created_at: DateTime<Utc>) -> MessageId {
        self.next_sequence += 1;
        let millis = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
        MessageId((millis << 22) | (self.next_sequence & 0x3F_FFFF))
    }

    fn insert_message(&mut self, message: HistoryMessage) {
        let history = self.history.entry(message.channel_id).or_default();
        history.push(message);
        history.sort_by(|a, b| b.id.cmp(&a.id));
    }
}

fn injected(what: &str) -> std::io::Error {
    std::io::Error::other(format!("injected {what} failure"))
}

/// An in-memory platform for testing.
pub struct MockTransport {
    state: Mutex<MockState>,
    connection: watch::Sender<ConnectionState>,
}

impl MockTransport {
    /// Author id of notices posted through `send_notice`.
    pub const BOT_USER: UserId = UserId(1_000_000);

    /// Create an empty, connected mock.
    pub fn new() -> Self {
        let (connection, _) = watch::channel(ConnectionState::Connected);
        Self {
            state: Mutex::new(MockState::default()),
            connection,
        }
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        self.connection.send_replace(state);
    }

    /// Register a forum and the tags it offers.
    pub async fn add_forum(&self, forum: ChannelId, tags: Vec<ForumTag>) {
        self.state.lock().await.forums.insert(forum, tags);
    }

    /// Register a thread, creating its forum without tags if needed.
    pub async fn add_thread(&self, thread: ThreadInfo) {
        let mut state = self.state.lock().await;
        state.forums.entry(thread.forum_id).or_default();
        state.threads.insert(thread.id, thread);
    }

    pub async fn add_text_channel(&self, channel: ChannelInfo) {
        self.state.lock().await.text_channels.push(channel);
    }

    /// Append a message to a channel's history and return its id.
    pub async fn push_message(
        &self,
        channel: ChannelId,
        author: UserId,
        author_is_bot: bool,
        created_at: DateTime<Utc>,
    ) -> MessageId {
        let mut state = self.state.lock().await;
        let id = state.allocate_id(created_at);
        state.insert_message(HistoryMessage {
            id,
            channel_id: channel,
            author_id: author,
            author_is_bot,
            created_at,
        });
        id
    }

    /// Serve `pages` history pages for `channel`, then fail every later fetch.
    pub async fn fail_fetch_after(&self, channel: ChannelId, pages: usize) {
        self.state.lock().await.fetch_budget.insert(channel, pages);
    }

    /// Make thread and tag listing fail for `forum`.
    pub async fn fail_forum(&self, forum: ChannelId) {
        self.state.lock().await.failing_forums.insert(forum);
    }

    /// Make channel listing fail for `guild`.
    pub async fn fail_guild(&self, guild: GuildId) {
        self.state.lock().await.failing_guilds.insert(guild);
    }

    /// Make sends, tag updates and lock/archive fail for `channel`.
    pub async fn fail_mutations_on(&self, channel: ChannelId) {
        self.state.lock().await.failing_mutations.insert(channel);
    }

    pub async fn fail_delete(&self, message: MessageId) {
        self.state.lock().await.failing_deletes.insert(message);
    }

    /// Every request received so far, in order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    /// `(before, limit)` of every fetch against `channel`, in order.
    pub async fn fetch_calls(&self, channel: ChannelId) -> Vec<(Option<MessageId>, u8)> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Fetch {
                    channel: c,
                    before,
                    limit,
                } if *c == channel => Some((*before, *limit)),
                _ => None,
            })
            .collect()
    }

    /// Notices that were posted successfully.
    pub async fn sent_notices(&self) -> Vec<(ChannelId, Notice)> {
        self.state.lock().await.sent.clone()
    }

    /// Messages that were deleted successfully, in deletion order.
    pub async fn deleted_messages(&self) -> Vec<MessageId> {
        self.state.lock().await.deleted.clone()
    }

    /// Tag sets that were applied successfully.
    pub async fn tag_updates(&self) -> Vec<(ChannelId, Vec<TagId>)> {
        self.state.lock().await.tag_updates.clone()
    }

    pub async fn thread(&self, id: ChannelId) -> Option<ThreadInfo> {
        self.state.lock().await.threads.get(&id).cloned()
    }

    /// Current history of `channel`, newest first.
    pub async fn messages(&self, channel: ChannelId) -> Vec<HistoryMessage> {
        self.state
            .lock()
            .await
            .history
            .get(&channel)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ForumkeeperError> {
        Ok(match self.connection_state() {
            ConnectionState::Connected => HealthStatus::Healthy,
            other => HealthStatus::Degraded(format!("gateway {other}")),
        })
    }

    async fn shutdown(&self) -> Result<(), ForumkeeperError> {
        self.set_connection_state(ConnectionState::Disconnected);
        Ok(())
    }
}

#[async_trait]
impl MessagingTransport for MockTransport {
    fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    async fn list_forum_threads(&self, forum: ChannelId) -> Result<Vec<ThreadInfo>, ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::ListThreads { forum });
        if state.failing_forums.contains(&forum) || !state.forums.contains_key(&forum) {
            return Err(ForumkeeperError::container_access(format!("forum {forum}"), injected("forum")));
        }
        Ok(state
            .threads
            .values()
            .filter(|t| t.forum_id == forum)
            .cloned()
            .collect())
    }

    async fn forum_tags(&self, forum: ChannelId) -> Result<Vec<ForumTag>, ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::ForumTags { forum });
        if state.failing_forums.contains(&forum) {
            return Err(ForumkeeperError::container_access(format!("forum {forum}"), injected("forum")));
        }
        state
            .forums
            .get(&forum)
            .cloned()
            .ok_or_else(|| ForumkeeperError::container_access(format!("forum {forum}"), injected("forum")))
    }

    async fn list_text_channels(&self, guild: GuildId) -> Result<Vec<ChannelInfo>, ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::ListChannels { guild });
        if state.failing_guilds.contains(&guild) {
            return Err(ForumkeeperError::container_access(format!("guild {guild}"), injected("guild")));
        }
        Ok(state
            .text_channels
            .iter()
            .filter(|c| c.guild_id == guild)
            .cloned()
            .collect())
    }

    async fn fetch_messages(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<Vec<HistoryMessage>, ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::Fetch {
            channel,
            before,
            limit,
        });

        let served = state.fetches_served.entry(channel).or_default();
        let attempt = *served;
        *served += 1;
        if state.fetch_budget.get(&channel).is_some_and(|budget| attempt >= *budget) {
            return Err(ForumkeeperError::page_fetch(channel, injected("fetch")));
        }

        Ok(state
            .history
            .get(&channel)
            .map(|history| {
                history
                    .iter()
                    .filter(|m| before.is_none_or(|b| m.id < b))
                    .take(usize::from(limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn send_notice(&self, channel: ChannelId, notice: &Notice) -> Result<MessageId, ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::Send {
            channel,
            notice: notice.clone(),
        });
        if state.failing_mutations.contains(&channel) {
            return Err(ForumkeeperError::mutation("send", channel, injected("send")));
        }

        let now = Utc::now();
        let id = state.allocate_id(now);
        state.insert_message(HistoryMessage {
            id,
            channel_id: channel,
            author_id: Self::BOT_USER,
            author_is_bot: true,
            created_at: now,
        });
        state.sent.push((channel, notice.clone()));
        Ok(id)
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::Delete { channel, message });
        if state.failing_deletes.contains(&message) {
            return Err(ForumkeeperError::mutation("delete", message, injected("delete")));
        }

        let history = state.history.entry(channel).or_default();
        let before = history.len();
        history.retain(|m| m.id != message);
        if history.len() == before {
            return Err(ForumkeeperError::mutation("delete", message, injected("unknown message")));
        }
        state.deleted.push(message);
        Ok(())
    }

    async fn set_thread_tags(&self, thread: ChannelId, tags: &[TagId]) -> Result<(), ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::SetTags {
            thread,
            tags: tags.to_vec(),
        });
        if state.failing_mutations.contains(&thread) {
            return Err(ForumkeeperError::mutation("set tags", thread, injected("tag")));
        }

        let Some(forum) = state.threads.get(&thread).map(|t| t.forum_id) else {
            return Err(ForumkeeperError::mutation("set tags", thread, injected("unknown thread")));
        };
        let available = state.forums.get(&forum).cloned().unwrap_or_default();
        let resolved: Option<Vec<ForumTag>> = tags
            .iter()
            .map(|id| available.iter().find(|t| t.id == *id).cloned())
            .collect();
        let Some(resolved) = resolved else {
            return Err(ForumkeeperError::mutation("set tags", thread, injected("unknown tag")));
        };

        if let Some(info) = state.threads.get_mut(&thread) {
            info.applied_tags = resolved;
        }
        state.tag_updates.push((thread, tags.to_vec()));
        Ok(())
    }

    async fn lock_and_archive(&self, thread: ChannelId) -> Result<(), ForumkeeperError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::LockArchive { thread });
        if state.failing_mutations.contains(&thread) {
            return Err(ForumkeeperError::mutation("lock", thread, injected("lock")));
        }

        match state.threads.get_mut(&thread) {
            Some(info) => {
                info.locked = true;
                info.archived = true;
                Ok(())
            }
            None => Err(ForumkeeperError::mutation("lock", thread, injected("unknown thread"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn history_is_served_newest_first_with_cursor() {
        let mock = MockTransport::new();
        let channel = ChannelId(1);
        let now = Utc::now();
        let old = mock.push_message(channel, UserId(1), false, now - TimeDelta::days(2)).await;
        let new = mock.push_message(channel, UserId(1), false, now).await;
        let mid = mock.push_message(channel, UserId(1), false, now - TimeDelta::days(1)).await;

        let page = mock.fetch_messages(channel, None, 2).await.unwrap();
        assert_eq!(page.iter().map(|m| m.id).collect::<Vec<_>>(), vec![new, mid]);

        let next = mock.fetch_messages(channel, Some(mid), 2).await.unwrap();
        assert_eq!(next.iter().map(|m| m.id).collect::<Vec<_>>(), vec![old]);
    }

    #[tokio::test]
    async fn sent_notices_become_bot_history() {
        let mock = MockTransport::new();
        let notice = Notice {
            mention: None,
            title: "t".into(),
            body: "b".into(),
            tone: forumkeeper_core::NoticeTone::Warning,
        };
        mock.send_notice(ChannelId(3), &notice).await.unwrap();

        let history = mock.messages(ChannelId(3)).await;
        assert_eq!(history.len(), 1);
        assert!(history[0].author_is_bot);
        assert_eq!(history[0].author_id, MockTransport::BOT_USER);
    }

    #[tokio::test]
    async fn unknown_tags_are_rejected() {
        let mock = MockTransport::new();
        mock.add_thread(crate::ThreadBuilder::new(ChannelId(2), ChannelId(1)).build()).await;

        let err = mock.set_thread_tags(ChannelId(2), &[TagId(77)]).await.unwrap_err();
        assert!(matches!(err, ForumkeeperError::Mutation { .. }));
    }

    #[tokio::test]
    async fn shutdown_disconnects() {
        let mock = MockTransport::new();
        assert_eq!(mock.health_check().await.unwrap(), HealthStatus::Healthy);
        mock.shutdown().await.unwrap();
        assert_eq!(mock.connection_state(), ConnectionState::Disconnected);
    }
}
