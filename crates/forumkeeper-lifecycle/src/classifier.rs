// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure lifecycle verdicts for forum threads.
//!
//! Classification never performs I/O. Given a [`ThreadSnapshot`], a policy
//! and the current instant, it returns exactly one [`LifecycleVerdict`].

use std::fmt;

use chrono::{DateTime, Utc};
use forumkeeper_config::model::LifecycleConfig;
use strum::Display;

use crate::snapshot::ThreadSnapshot;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Case-insensitive substring match on tag names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatcher {
    needle: String,
}

impl TagMatcher {
    pub fn substring(needle: &str) -> Self {
        Self {
            needle: needle.trim().to_lowercase(),
        }
    }

    pub fn matches(&self, tag_name: &str) -> bool {
        tag_name.to_lowercase().contains(&self.needle)
    }

    pub fn matches_any<'a>(&self, tag_names: impl IntoIterator<Item = &'a str>) -> bool {
        tag_names.into_iter().any(|name| self.matches(name))
    }
}

impl Default for TagMatcher {
    fn default() -> Self {
        Self::substring("closed")
    }
}

/// Thresholds and the closed-tag rule applied to every thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub reminder_threshold_days: i64,
    pub close_threshold_days: i64,
    pub closed_tag: TagMatcher,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            reminder_threshold_days: 7,
            close_threshold_days: 30,
            closed_tag: TagMatcher::default(),
        }
    }
}

impl LifecyclePolicy {
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self {
            reminder_threshold_days: i64::from(config.reminder_threshold_days),
            close_threshold_days: i64::from(config.close_threshold_days),
            closed_tag: TagMatcher::substring(&config.closed_tag_match),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    Pinned,
    AlreadyClosed,
    NoUserActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleVerdict {
    Active,
    NeedsReminder,
    NeedsClose,
    Skip(SkipReason),
}

impl fmt::Display for LifecycleVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::NeedsReminder => f.write_str("needs_reminder"),
            Self::NeedsClose => f.write_str("needs_close"),
            Self::Skip(reason) => write!(f, "skip({reason})"),
        }
    }
}

/// Whole days elapsed between `then` and `now`, truncated toward zero.
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds() / SECONDS_PER_DAY
}

/// Verdicts that need no history: pinned threads, and threads already closed
/// by a closed tag or the lock flag. The scheduler uses this to avoid
/// scanning those threads.
pub fn precheck(snapshot: &ThreadSnapshot, policy: &LifecyclePolicy) -> Option<SkipReason> {
    if snapshot.pinned {
        return Some(SkipReason::Pinned);
    }
    if snapshot.locked
        || policy
            .closed_tag
            .matches_any(snapshot.applied_tag_names.iter().map(String::as_str))
    {
        return Some(SkipReason::AlreadyClosed);
    }
    None
}

/// Classify a thread. Rules apply in order and the first match wins:
/// pinned, already closed, no user activity, close threshold on the last
/// user message, reminder window on the last message of anyone.
pub fn classify(
    snapshot: &ThreadSnapshot,
    policy: &LifecyclePolicy,
    now: DateTime<Utc>,
) -> LifecycleVerdict {
    if let Some(reason) = precheck(snapshot, policy) {
        return LifecycleVerdict::Skip(reason);
    }

    let Some(last_user) = snapshot.last_user_message_at else {
        return LifecycleVerdict::Skip(SkipReason::NoUserActivity);
    };
    let last_any = snapshot.last_any_message_at.unwrap_or(last_user);

    if days_since(last_user, now) >= policy.close_threshold_days {
        return LifecycleVerdict::NeedsClose;
    }

    let idle = days_since(last_any, now);
    if idle >= policy.reminder_threshold_days && idle < policy.close_threshold_days {
        return LifecycleVerdict::NeedsReminder;
    }

    LifecycleVerdict::Active
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use forumkeeper_core::ChannelId;
    use proptest::prelude::*;

    fn snapshot(last_any_days: Option<i64>, last_user_days: Option<i64>, now: DateTime<Utc>) -> ThreadSnapshot {
        ThreadSnapshot {
            thread_id: ChannelId(1),
            forum_id: ChannelId(2),
            pinned: false,
            archived: false,
            locked: false,
            applied_tag_names: Default::default(),
            last_any_message_at: last_any_days.map(|d| now - TimeDelta::days(d)),
            last_user_message_at: last_user_days.map(|d| now - TimeDelta::days(d)),
        }
    }

    #[test]
    fn days_truncate_toward_zero() {
        let now = Utc::now();
        assert_eq!(days_since(now - TimeDelta::hours(23), now), 0);
        assert_eq!(days_since(now - TimeDelta::hours(47), now), 1);
        assert_eq!(days_since(now - TimeDelta::days(30), now), 30);
    }

    #[test]
    fn recent_user_activity_is_active() {
        let now = Utc::now();
        let verdict = classify(&snapshot(Some(2), Some(2), now), &LifecyclePolicy::default(), now);
        assert_eq!(verdict, LifecycleVerdict::Active);
    }

    #[test]
    fn idle_for_reminder_window_needs_reminder() {
        let now = Utc::now();
        let verdict = classify(&snapshot(Some(10), Some(10), now), &LifecyclePolicy::default(), now);
        assert_eq!(verdict, LifecycleVerdict::NeedsReminder);
    }

    #[test]
    fn bot_chatter_does_not_keep_thread_open() {
        let now = Utc::now();
        let verdict = classify(&snapshot(Some(1), Some(35), now), &LifecyclePolicy::default(), now);
        assert_eq!(verdict, LifecycleVerdict::NeedsClose);
    }

    #[test]
    fn recent_bot_message_suppresses_reminder() {
        let now = Utc::now();
        let verdict = classify(&snapshot(Some(1), Some(20), now), &LifecyclePolicy::default(), now);
        assert_eq!(verdict, LifecycleVerdict::Active);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let now = Utc::now();
        let policy = LifecyclePolicy::default();
        assert_eq!(
            classify(&snapshot(Some(7), Some(7), now), &policy, now),
            LifecycleVerdict::NeedsReminder
        );
        assert_eq!(
            classify(&snapshot(Some(30), Some(30), now), &policy, now),
            LifecycleVerdict::NeedsClose
        );
    }

    #[test]
    fn missing_last_any_falls_back_to_last_user() {
        let now = Utc::now();
        let verdict = classify(&snapshot(None, Some(8), now), &LifecyclePolicy::default(), now);
        assert_eq!(verdict, LifecycleVerdict::NeedsReminder);
    }

    #[test]
    fn no_user_messages_is_skipped() {
        let now = Utc::now();
        let verdict = classify(&snapshot(Some(50), None, now), &LifecyclePolicy::default(), now);
        assert_eq!(verdict, LifecycleVerdict::Skip(SkipReason::NoUserActivity));
    }

    #[test]
    fn pinned_wins_over_everything() {
        let now = Utc::now();
        let mut snap = snapshot(Some(100), Some(100), now);
        snap.pinned = true;
        snap.applied_tag_names.insert("Closed".into());
        assert_eq!(
            classify(&snap, &LifecyclePolicy::default(), now),
            LifecycleVerdict::Skip(SkipReason::Pinned)
        );
    }

    #[test]
    fn locked_thread_without_tag_is_already_closed() {
        let now = Utc::now();
        let mut snap = snapshot(Some(40), Some(40), now);
        snap.locked = true;
        assert_eq!(
            precheck(&snap, &LifecyclePolicy::default()),
            Some(SkipReason::AlreadyClosed)
        );
        assert_eq!(
            classify(&snap, &LifecyclePolicy::default(), now),
            LifecycleVerdict::Skip(SkipReason::AlreadyClosed)
        );
    }

    #[test]
    fn closed_tag_matches_case_insensitive_substring() {
        let now = Utc::now();
        let mut snap = snapshot(Some(100), Some(100), now);
        snap.applied_tag_names.insert("Bug".into());
        snap.applied_tag_names.insert("CLOSED - fixed".into());
        assert_eq!(
            classify(&snap, &LifecyclePolicy::default(), now),
            LifecycleVerdict::Skip(SkipReason::AlreadyClosed)
        );
    }

    #[test]
    fn policy_follows_config() {
        let config = LifecycleConfig {
            reminder_threshold_days: 3,
            close_threshold_days: 14,
            closed_tag_match: " Resolved ".into(),
            ..LifecycleConfig::default()
        };
        let policy = LifecyclePolicy::from_config(&config);
        assert_eq!(policy.reminder_threshold_days, 3);
        assert_eq!(policy.close_threshold_days, 14);
        assert!(policy.closed_tag.matches("resolved ✅"));
        assert!(!policy.closed_tag.matches("open"));
    }

    #[test]
    fn verdicts_render_for_logs() {
        assert_eq!(LifecycleVerdict::NeedsClose.to_string(), "needs_close");
        assert_eq!(
            LifecycleVerdict::Skip(SkipReason::AlreadyClosed).to_string(),
            "skip(already_closed)"
        );
    }

    proptest! {
        #[test]
        fn verdict_is_consistent_with_thresholds(
            any_secs in 0i64..(60 * SECONDS_PER_DAY),
            user_offset in 0i64..(60 * SECONDS_PER_DAY),
        ) {
            let now = Utc::now();
            let policy = LifecyclePolicy::default();
            let last_any = now - TimeDelta::seconds(any_secs);
            // The last user message can never be newer than the last message of anyone.
            let last_user = last_any - TimeDelta::seconds(user_offset);
            let snap = ThreadSnapshot {
                last_any_message_at: Some(last_any),
                last_user_message_at: Some(last_user),
                ..snapshot(None, None, now)
            };

            let any_days = days_since(last_any, now);
            let user_days = days_since(last_user, now);
            match classify(&snap, &policy, now) {
                LifecycleVerdict::NeedsClose => prop_assert!(user_days >= 30),
                LifecycleVerdict::NeedsReminder => {
                    prop_assert!(user_days < 30);
                    prop_assert!((7..30).contains(&any_days));
                }
                LifecycleVerdict::Active => {
                    prop_assert!(user_days < 30);
                    prop_assert!(any_days < 7);
                }
                LifecycleVerdict::Skip(reason) => prop_assert!(false, "unexpected skip {reason}"),
            }
        }
    }
}
