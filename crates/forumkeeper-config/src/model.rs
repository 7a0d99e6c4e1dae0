// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for forumkeeper.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level forumkeeper configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForumkeeperConfig {
    /// Bot identity and connection settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Inactivity reminder and auto-close settings.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// Bulk message purge settings.
    #[serde(default)]
    pub purge: PurgeConfig,

    /// Role identifiers used by the permission layer.
    #[serde(default)]
    pub roles: RolesConfig,
}

/// Bot identity and connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Discord bot token. `None` only allows offline commands.
    #[serde(default)]
    pub token: Option<String>,

    /// The guild the bot manages.
    #[serde(default)]
    pub guild_id: Option<u64>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            guild_id: None,
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Inactivity lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Whether `serve` starts the daily scheduler.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Local time of day for the daily pass, `HH:MM`.
    #[serde(default = "default_fire_at")]
    pub fire_at: String,

    /// Days since the last message of any author before a reminder is posted.
    #[serde(default = "default_reminder_threshold_days")]
    pub reminder_threshold_days: u32,

    /// Days since the last non-bot message before the thread is closed.
    #[serde(default = "default_close_threshold_days")]
    pub close_threshold_days: u32,

    /// Case-insensitive substring identifying the "closed" tag.
    #[serde(default = "default_closed_tag_match")]
    pub closed_tag_match: String,

    /// Messages requested per history page (1..=100).
    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Forums watched by the scheduler.
    #[serde(default)]
    pub forums: Vec<ForumConfig>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fire_at: default_fire_at(),
            reminder_threshold_days: default_reminder_threshold_days(),
            close_threshold_days: default_close_threshold_days(),
            closed_tag_match: default_closed_tag_match(),
            page_size: default_page_size(),
            forums: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_fire_at() -> String {
    "12:00".to_string()
}

fn default_reminder_threshold_days() -> u32 {
    7
}

fn default_close_threshold_days() -> u32 {
    30
}

fn default_closed_tag_match() -> String {
    "closed".to_string()
}

fn default_page_size() -> u8 {
    100
}

/// A forum watched by the lifecycle scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForumConfig {
    /// Forum channel id.
    pub id: u64,

    /// Display name used in logs and in the closure notice.
    pub name: String,
}

/// Bulk purge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PurgeConfig {
    /// Messages requested per history page (1..=100).
    #[serde(default = "default_page_size")]
    pub page_size: u8,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Role configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RolesConfig {
    /// Roles allowed to trigger moderator commands such as purge.
    #[serde(default)]
    pub moderators: Vec<u64>,
}
