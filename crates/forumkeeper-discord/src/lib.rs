// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord transport for forumkeeper.
//!
//! Implements [`MessagingTransport`] on top of serenity. The gateway client
//! runs on its own task and only reports connection state; every lifecycle
//! and purge operation goes through the REST client, whose ratelimiter
//! handles 429 responses below this layer.

use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::all::{
    Channel, ChannelType, Client, ConnectionStage, Context, CreateEmbed, CreateMessage,
    EditThread, EventHandler, GatewayIntents, GetMessages, GuildChannel, Message, Ready,
    ResumedEvent, ShardManager, ShardStageUpdateEvent,
};
use serenity::http::Http;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use forumkeeper_core::{
    ChannelId, ChannelInfo, ConnectionState, ForumTag, ForumkeeperError, GuildId, HealthStatus,
    HistoryMessage, MessageId, MessagingTransport, Notice, NoticeTone, PluginAdapter, TagId,
    ThreadInfo, UserId,
};

/// Embed colour for warning notices.
pub const WARNING_COLOUR: u32 = 0xF1_C4_0F;
/// Embed colour for error notices.
pub const ERROR_COLOUR: u32 = 0xE7_4C_3C;

/// Serenity-backed transport.
pub struct DiscordTransport {
    http: Arc<Http>,
    state: Arc<watch::Sender<ConnectionState>>,
    shard_manager: Arc<ShardManager>,
    gateway_task: Mutex<Option<JoinHandle<()>>>,
}

impl DiscordTransport {
    /// Build the client and start the gateway on a background task.
    ///
    /// Returns as soon as the client is built; use [`wait_until_connected`]
    /// before relying on gateway-backed state.
    ///
    /// [`wait_until_connected`]: Self::wait_until_connected
    pub async fn connect(token: &str) -> Result<Self, ForumkeeperError> {
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;
        let (state, _) = watch::channel(ConnectionState::Connecting);
        let state = Arc::new(state);

        let handler = GatewayHandler {
            state: Arc::clone(&state),
        };
        let mut client = Client::builder(token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| ForumkeeperError::TransportUnavailable {
                reason: format!("failed to build Discord client: {e}"),
            })?;

        let http = Arc::clone(&client.http);
        let shard_manager = Arc::clone(&client.shard_manager);
        let task_state = Arc::clone(&state);
        let gateway_task = tokio::spawn(async move {
            if let Err(e) = client.start().await {
                error!(error = %e, "Discord gateway stopped");
            }
            task_state.send_replace(ConnectionState::Disconnected);
        });

        Ok(Self {
            http,
            state,
            shard_manager,
            gateway_task: Mutex::new(Some(gateway_task)),
        })
    }

    /// Wait for the gateway to report `Connected`.
    pub async fn wait_until_connected(&self, timeout: Duration) -> Result<(), ForumkeeperError> {
        let mut rx = self.state.subscribe();
        let connected = tokio::time::timeout(timeout, rx.wait_for(|s| *s == ConnectionState::Connected));
        match connected.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(ForumkeeperError::TransportUnavailable {
                reason: "gateway task ended".to_string(),
            }),
            Err(_) => Err(ForumkeeperError::TransportUnavailable {
                reason: format!("gateway not connected after {}s", timeout.as_secs()),
            }),
        }
    }

    async fn guild_channel(&self, id: ChannelId) -> Result<GuildChannel, ForumkeeperError> {
        let channel = to_serenity_channel(id)?
            .to_channel(&*self.http)
            .await
            .map_err(|e| ForumkeeperError::container_access(format!("channel {id}"), e))?;
        match channel {
            Channel::Guild(channel) => Ok(channel),
            _ => Err(ForumkeeperError::ContainerAccess {
                container: format!("channel {id}"),
                message: "not a guild channel".to_string(),
                source: None,
            }),
        }
    }
}

struct GatewayHandler {
    state: Arc<watch::Sender<ConnectionState>>,
}

#[serenity::async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "Discord gateway ready");
        self.state.send_replace(ConnectionState::Connected);
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        debug!("Discord gateway session resumed");
        self.state.send_replace(ConnectionState::Connected);
    }

    async fn shard_stage_update(&self, _ctx: Context, event: ShardStageUpdateEvent) {
        let state = connection_from_stage(event.new);
        debug!(stage = ?event.new, state = %state, "Discord shard stage changed");
        self.state.send_replace(state);
    }
}

/// Collapse serenity's shard stages into the three states the scheduler cares about.
pub fn connection_from_stage(stage: ConnectionStage) -> ConnectionState {
    match stage {
        ConnectionStage::Connected => ConnectionState::Connected,
        ConnectionStage::Disconnected => ConnectionState::Disconnected,
        _ => ConnectionState::Connecting,
    }
}

pub fn tone_colour(tone: NoticeTone) -> u32 {
    match tone {
        NoticeTone::Warning => WARNING_COLOUR,
        NoticeTone::Error => ERROR_COLOUR,
    }
}

/// Message content carrying the ping, which embeds cannot deliver.
pub fn mention_content(mention: Option<UserId>) -> Option<String> {
    mention.map(|user| format!("<@{user}>"))
}

/// Resolve applied tag ids against the forum's tag list. Unknown ids are kept
/// with an empty name so that rewriting the tag set never drops them.
pub fn resolve_applied_tags(applied: impl IntoIterator<Item = TagId>, available: &[ForumTag]) -> Vec<ForumTag> {
    applied
        .into_iter()
        .map(|id| {
            available
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .unwrap_or(ForumTag { id, name: String::new() })
        })
        .collect()
}

fn nonzero(raw: u64, what: &str) -> Result<NonZeroU64, ForumkeeperError> {
    NonZeroU64::new(raw).ok_or_else(|| ForumkeeperError::Internal(format!("{what} id must be non-zero")))
}

fn to_serenity_channel(id: ChannelId) -> Result<serenity::all::ChannelId, ForumkeeperError> {
    nonzero(id.0, "channel").map(serenity::all::ChannelId::from)
}

fn forum_tags_of(channel: &GuildChannel) -> Vec<ForumTag> {
    channel
        .available_tags
        .iter()
        .map(|t| ForumTag {
            id: TagId(t.id.get()),
            name: t.name.clone(),
        })
        .collect()
}

fn thread_info(thread: &GuildChannel, forum: ChannelId, available: &[ForumTag]) -> ThreadInfo {
    let metadata = thread.thread_metadata.as_ref();
    ThreadInfo {
        id: ChannelId(thread.id.get()),
        forum_id: forum,
        name: thread.name.clone(),
        owner_id: thread.owner_id.map(|u| UserId(u.get())),
        pinned: thread.flags.contains(serenity::all::ChannelFlags::PINNED),
        archived: metadata.is_some_and(|m| m.archived),
        locked: metadata.is_some_and(|m| m.locked),
        applied_tags: resolve_applied_tags(thread.applied_tags.iter().map(|t| TagId(t.get())), available),
    }
}

fn history_message(message: &Message) -> HistoryMessage {
    HistoryMessage {
        id: MessageId(message.id.get()),
        channel_id: ChannelId(message.channel_id.get()),
        author_id: UserId(message.author.id.get()),
        author_is_bot: message.author.bot,
        created_at: DateTime::<Utc>::from_timestamp(message.timestamp.unix_timestamp(), 0)
            .unwrap_or_default(),
    }
}

#[async_trait]
impl PluginAdapter for DiscordTransport {
    fn name(&self) -> &str {
        "discord"
    }

    fn version(&self) -> semver::Version {
        semver::Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| semver::Version::new(0, 1, 0))
    }

    async fn health_check(&self) -> Result<HealthStatus, ForumkeeperError> {
        Ok(match self.connection_state() {
            ConnectionState::Connected => HealthStatus::Healthy,
            ConnectionState::Connecting => HealthStatus::Degraded("gateway connecting".to_string()),
            ConnectionState::Disconnected => HealthStatus::Unhealthy("gateway disconnected".to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), ForumkeeperError> {
        self.shard_manager.shutdown_all().await;
        if let Some(task) = self.gateway_task.lock().await.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Discord gateway task failed during shutdown");
        }
        self.state.send_replace(ConnectionState::Disconnected);
        info!("Discord transport shut down");
        Ok(())
    }
}

#[async_trait]
impl MessagingTransport for DiscordTransport {
    fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    async fn list_forum_threads(&self, forum: ChannelId) -> Result<Vec<ThreadInfo>, ForumkeeperError> {
        let forum_channel = self.guild_channel(forum).await?;
        if forum_channel.kind != ChannelType::Forum {
            return Err(ForumkeeperError::ContainerAccess {
                container: format!("forum {forum}"),
                message: format!("channel is a {:?}, not a forum", forum_channel.kind),
                source: None,
            });
        }
        let available = forum_tags_of(&forum_channel);

        let active = forum_channel
            .guild_id
            .get_active_threads(&*self.http)
            .await
            .map_err(|e| ForumkeeperError::container_access(format!("forum {forum}"), e))?;

        Ok(active
            .threads
            .iter()
            .filter(|t| t.parent_id.is_some_and(|p| p.get() == forum.0))
            .map(|t| thread_info(t, forum, &available))
            .collect())
    }

    async fn forum_tags(&self, forum: ChannelId) -> Result<Vec<ForumTag>, ForumkeeperError> {
        let channel = self.guild_channel(forum).await?;
        Ok(forum_tags_of(&channel))
    }

    async fn list_text_channels(&self, guild: GuildId) -> Result<Vec<ChannelInfo>, ForumkeeperError> {
        let guild_id = serenity::all::GuildId::from(nonzero(guild.0, "guild")?);
        let channels = guild_id
            .channels(&*self.http)
            .await
            .map_err(|e| ForumkeeperError::container_access(format!("guild {guild}"), e))?;

        let mut text: Vec<&GuildChannel> = channels
            .values()
            .filter(|c| c.kind == ChannelType::Text)
            .collect();
        text.sort_by_key(|c| (c.position, c.id));

        Ok(text
            .into_iter()
            .map(|c| ChannelInfo {
                id: ChannelId(c.id.get()),
                guild_id: guild,
                name: c.name.clone(),
            })
            .collect())
    }

    async fn fetch_messages(
        &self,
        channel: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> Result<Vec<HistoryMessage>, ForumkeeperError> {
        let mut request = GetMessages::new().limit(limit.clamp(1, 100));
        if let Some(before) = before {
            request = request.before(serenity::all::MessageId::from(nonzero(before.0, "message")?));
        }

        let messages = to_serenity_channel(channel)?
            .messages(&*self.http, request)
            .await
            .map_err(|e| ForumkeeperError::page_fetch(channel, e))?;
        Ok(messages.iter().map(history_message).collect())
    }

    async fn send_notice(&self, channel: ChannelId, notice: &Notice) -> Result<MessageId, ForumkeeperError> {
        let embed = CreateEmbed::new()
            .title(&notice.title)
            .description(&notice.body)
            .colour(tone_colour(notice.tone));
        let mut message = CreateMessage::new().embed(embed);
        if let Some(content) = mention_content(notice.mention) {
            message = message.content(content);
        }

        let sent = to_serenity_channel(channel)?
            .send_message(&*self.http, message)
            .await
            .map_err(|e| ForumkeeperError::mutation("send", channel, e))?;
        Ok(MessageId(sent.id.get()))
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ForumkeeperError> {
        let id = serenity::all::MessageId::from(nonzero(message.0, "message")?);
        to_serenity_channel(channel)?
            .delete_message(&*self.http, id)
            .await
            .map_err(|e| ForumkeeperError::mutation("delete", message, e))
    }

    async fn set_thread_tags(&self, thread: ChannelId, tags: &[TagId]) -> Result<(), ForumkeeperError> {
        let tag_ids = tags
            .iter()
            .map(|t| nonzero(t.0, "tag").map(serenity::all::ForumTagId::from))
            .collect::<Result<Vec<_>, _>>()?;

        to_serenity_channel(thread)?
            .edit_thread(&*self.http, EditThread::new().applied_tags(tag_ids))
            .await
            .map(|_| ())
            .map_err(|e| ForumkeeperError::mutation("set tags", thread, e))
    }

    async fn lock_and_archive(&self, thread: ChannelId) -> Result<(), ForumkeeperError> {
        to_serenity_channel(thread)?
            .edit_thread(&*self.http, EditThread::new().locked(true).archived(true))
            .await
            .map(|_| ())
            .map_err(|e| ForumkeeperError::mutation("lock", thread, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_stages_collapse_to_three_states() {
        assert_eq!(connection_from_stage(ConnectionStage::Connected), ConnectionState::Connected);
        assert_eq!(
            connection_from_stage(ConnectionStage::Disconnected),
            ConnectionState::Disconnected
        );
        assert_eq!(connection_from_stage(ConnectionStage::Resuming), ConnectionState::Connecting);
        assert_eq!(connection_from_stage(ConnectionStage::Identifying), ConnectionState::Connecting);
    }

    #[test]
    fn tones_map_to_distinct_colours() {
        assert_eq!(tone_colour(NoticeTone::Warning), WARNING_COLOUR);
        assert_eq!(tone_colour(NoticeTone::Error), ERROR_COLOUR);
    }

    #[test]
    fn mention_renders_as_user_ping() {
        assert_eq!(mention_content(Some(UserId(42))).as_deref(), Some("<@42>"));
        assert_eq!(mention_content(None), None);
    }

    #[test]
    fn unknown_applied_tags_are_preserved() {
        let available = vec![ForumTag {
            id: TagId(1),
            name: "Closed".into(),
        }];
        let resolved = resolve_applied_tags([TagId(1), TagId(9)], &available);
        assert_eq!(resolved[0].name, "Closed");
        assert_eq!(resolved[1], ForumTag { id: TagId(9), name: String::new() });
    }

    #[test]
    fn zero_ids_are_rejected_before_reaching_serenity() {
        assert!(matches!(
            to_serenity_channel(ChannelId(0)),
            Err(ForumkeeperError::Internal(_))
        ));
        assert_eq!(to_serenity_channel(ChannelId(5)).unwrap().get(), 5);
    }
}
