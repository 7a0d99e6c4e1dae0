// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as time-of-day syntax, threshold ordering, and
//! duplicate forum ids.

use std::collections::HashSet;

use chrono::NaiveTime;

use crate::diagnostic::ConfigError;
use crate::model::ForumkeeperConfig;

/// Maximum page size accepted by the platform's history endpoint.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Parse a `HH:MM` time of day.
pub fn parse_fire_at(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ForumkeeperConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let lifecycle = &config.lifecycle;

    if parse_fire_at(&lifecycle.fire_at).is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "lifecycle.fire_at `{}` is not a valid HH:MM time of day",
                lifecycle.fire_at
            ),
        });
    }

    if lifecycle.reminder_threshold_days == 0 {
        errors.push(ConfigError::Validation {
            message: "lifecycle.reminder_threshold_days must be at least 1".to_string(),
        });
    }

    if lifecycle.close_threshold_days <= lifecycle.reminder_threshold_days {
        errors.push(ConfigError::Validation {
            message: format!(
                "lifecycle.close_threshold_days ({}) must be greater than reminder_threshold_days ({})",
                lifecycle.close_threshold_days, lifecycle.reminder_threshold_days
            ),
        });
    }

    if lifecycle.closed_tag_match.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "lifecycle.closed_tag_match must not be empty".to_string(),
        });
    }

    for (key, size) in [
        ("lifecycle.page_size", lifecycle.page_size),
        ("purge.page_size", config.purge.page_size),
    ] {
        if size == 0 || size > MAX_PAGE_SIZE {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be between 1 and {MAX_PAGE_SIZE}, got {size}"),
            });
        }
    }

    let mut seen_ids = HashSet::new();
    for (i, forum) in lifecycle.forums.iter().enumerate() {
        if !seen_ids.insert(forum.id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate forum id `{}` in [[lifecycle.forums]]", forum.id),
            });
        }
        if forum.id == 0 {
            errors.push(ConfigError::Validation {
                message: format!("lifecycle.forums[{i}].id must be a non-zero snowflake"),
            });
        }
        if forum.name.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("lifecycle.forums[{i}].name must not be empty"),
            });
        }
    }

    if config.bot.guild_id == Some(0) {
        errors.push(ConfigError::Validation {
            message: "bot.guild_id must be a non-zero snowflake".to_string(),
        });
    }

    if let Some(token) = &config.bot.token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "bot.token must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
