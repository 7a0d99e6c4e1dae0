// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the forumkeeper configuration system.

use forumkeeper_config::diagnostic::ConfigError;
use forumkeeper_config::model::ForumConfig;
use forumkeeper_config::{load_and_validate_str, load_config, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[bot]
token = "abc.def"
guild_id = 1000
log_level = "debug"

[lifecycle]
enabled = false
fire_at = "09:30"
reminder_threshold_days = 5
close_threshold_days = 21
closed_tag_match = "resolved"
page_size = 50

[[lifecycle.forums]]
id = 11
name = "Bug Report"

[[lifecycle.forums]]
id = 12
name = "Support"

[purge]
page_size = 25

[roles]
moderators = [7, 8]
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.token.as_deref(), Some("abc.def"));
    assert_eq!(config.bot.guild_id, Some(1000));
    assert_eq!(config.bot.log_level, "debug");
    assert!(!config.lifecycle.enabled);
    assert_eq!(config.lifecycle.fire_at, "09:30");
    assert_eq!(config.lifecycle.reminder_threshold_days, 5);
    assert_eq!(config.lifecycle.close_threshold_days, 21);
    assert_eq!(config.lifecycle.closed_tag_match, "resolved");
    assert_eq!(config.lifecycle.page_size, 50);
    assert_eq!(
        config.lifecycle.forums,
        vec![
            ForumConfig {
                id: 11,
                name: "Bug Report".to_string()
            },
            ForumConfig {
                id: 12,
                name: "Support".to_string()
            },
        ]
    );
    assert_eq!(config.purge.page_size, 25);
    assert_eq!(config.roles.moderators, vec![7, 8]);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert!(config.bot.token.is_none());
    assert!(config.bot.guild_id.is_none());
    assert_eq!(config.bot.log_level, "info");
    assert!(config.lifecycle.enabled);
    assert_eq!(config.lifecycle.fire_at, "12:00");
    assert_eq!(config.lifecycle.reminder_threshold_days, 7);
    assert_eq!(config.lifecycle.close_threshold_days, 30);
    assert_eq!(config.lifecycle.closed_tag_match, "closed");
    assert_eq!(config.lifecycle.page_size, 100);
    assert!(config.lifecycle.forums.is_empty());
    assert_eq!(config.purge.page_size, 100);
    assert!(config.roles.moderators.is_empty());
}

/// Unknown field in [lifecycle] is rejected with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[lifecycle]
fire_a = "12:00"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "fire_a"
                && suggestion.as_deref() == Some("fire_at")
                && valid_keys.contains("closed_tag_match")
        })
    });
    assert!(has_unknown_key, "expected UnknownKey for fire_a, got: {errors:?}");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn unknown_top_level_section_rejected() {
    let toml = r#"
[votes]
storage = "votes.json"
"#;

    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("votes"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Forum entries require both id and name.
#[test]
fn forum_without_name_is_missing_key() {
    let toml = r#"
[[lifecycle.forums]]
id = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("name is required");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "name")),
        "got: {errors:?}"
    );
}

/// A string where a number is expected is reported as an invalid type.
#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[lifecycle]
close_threshold_days = "thirty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after successful deserialization.
#[test]
fn validation_errors_surface_from_str_loader() {
    let toml = r#"
[lifecycle]
fire_at = "midday"
reminder_threshold_days = 10
close_threshold_days = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// Environment variables override file values, mapping underscores in keys correctly.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "forumkeeper.toml",
            r#"
[bot]
guild_id = 1

[lifecycle]
fire_at = "12:00"
"#,
        )?;
        jail.set_env("FORUMKEEPER_LIFECYCLE_FIRE_AT", "06:15");
        jail.set_env("FORUMKEEPER_LIFECYCLE_CLOSE_THRESHOLD_DAYS", "45");
        jail.set_env("FORUMKEEPER_BOT_TOKEN", "from-env");

        let config = load_config()?;
        assert_eq!(config.bot.guild_id, Some(1));
        assert_eq!(config.bot.token.as_deref(), Some("from-env"));
        assert_eq!(config.lifecycle.fire_at, "06:15");
        assert_eq!(config.lifecycle.close_threshold_days, 45);
        Ok(())
    });
}

/// ConfigError renders through miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "fire_a".to_string(),
        suggestion: Some("fire_at".to_string()),
        valid_keys: "enabled, fire_at".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `fire_at`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("fire_a"));
}
