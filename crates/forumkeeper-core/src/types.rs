// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the transport trait and the lifecycle engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake!(
    /// Identifier of a guild (server).
    GuildId
);
snowflake!(
    /// Identifier of any channel-like container: text channel, forum, or thread.
    ChannelId
);
snowflake!(
    /// Identifier of a message. Ordered: larger ids are newer.
    MessageId
);
snowflake!(
    /// Identifier of a user or bot principal.
    UserId
);
snowflake!(
    /// Identifier of a forum tag.
    TagId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Gateway connection state as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Connecting,
    Disconnected,
}

/// One item of a channel's message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    pub created_at: DateTime<Utc>,
}

/// A tag that can be applied to threads in a forum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForumTag {
    pub id: TagId,
    pub name: String,
}

/// A thread inside a forum, as listed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: ChannelId,
    pub forum_id: ChannelId,
    pub name: String,
    /// The user who opened the thread.
    pub owner_id: Option<UserId>,
    pub pinned: bool,
    pub archived: bool,
    pub locked: bool,
    pub applied_tags: Vec<ForumTag>,
}

/// A text-like channel that holds plain message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild_id: GuildId,
    pub name: String,
}

/// Visual tone of a notice, mapped to an embed colour by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NoticeTone {
    Warning,
    Error,
}

/// A bot-authored notice posted into a thread or channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// User pinged in the message content, outside the embed.
    pub mention: Option<UserId>,
    pub title: String,
    pub body: String,
    pub tone: NoticeTone,
}
