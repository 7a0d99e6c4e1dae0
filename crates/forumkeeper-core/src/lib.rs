// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for forumkeeper.
//!
//! This crate provides the trait definitions, error types, and common types
//! shared by the lifecycle engine, the Discord adapter, and the test mocks.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ForumkeeperError;
pub use traits::{MessagingTransport, PluginAdapter};
pub use types::{
    ChannelId, ChannelInfo, ConnectionState, ForumTag, GuildId, HealthStatus, HistoryMessage,
    MessageId, Notice, NoticeTone, TagId, ThreadInfo, UserId,
};
