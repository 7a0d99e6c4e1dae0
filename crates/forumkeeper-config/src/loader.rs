// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./forumkeeper.toml` >
//! `~/.config/forumkeeper/forumkeeper.toml` > `/etc/forumkeeper/forumkeeper.toml`
//! with environment variable overrides via the `FORUMKEEPER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ForumkeeperConfig;

/// File name looked up in the working directory and the config directories.
pub const CONFIG_FILE_NAME: &str = "forumkeeper.toml";

/// System-wide configuration path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/forumkeeper/forumkeeper.toml";

/// Per-user configuration path, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("forumkeeper").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/forumkeeper/forumkeeper.toml`
/// 3. `~/.config/forumkeeper/forumkeeper.toml`
/// 4. `./forumkeeper.toml`
/// 5. `FORUMKEEPER_*` environment variables
pub fn load_config() -> Result<ForumkeeperConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ForumkeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ForumkeeperConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ForumkeeperConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ForumkeeperConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ForumkeeperConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider mapping `FORUMKEEPER_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `FORUMKEEPER_LIFECYCLE_FIRE_AT` must map to
/// `lifecycle.fire_at`, not `lifecycle.fire.at`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("FORUMKEEPER_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 4] = ["bot", "lifecycle", "purge", "roles"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("bot_token"), "bot.token");
        assert_eq!(map_env_key("bot_guild_id"), "bot.guild_id");
        assert_eq!(map_env_key("lifecycle_fire_at"), "lifecycle.fire_at");
        assert_eq!(
            map_env_key("lifecycle_close_threshold_days"),
            "lifecycle.close_threshold_days"
        );
        assert_eq!(map_env_key("purge_page_size"), "purge.page_size");
    }

    #[test]
    fn unknown_prefix_passes_through() {
        assert_eq!(map_env_key("botany"), "botany");
        assert_eq!(map_env_key("other_key"), "other_key");
    }
}
