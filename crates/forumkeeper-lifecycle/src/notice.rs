// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder and closure notices posted into threads.

use forumkeeper_core::{Notice, NoticeTone, UserId};

use crate::classifier::LifecyclePolicy;

/// Renders notices with the thresholds of the active policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeTemplates {
    reminder_days: i64,
    close_days: i64,
}

impl NoticeTemplates {
    pub fn new(policy: &LifecyclePolicy) -> Self {
        Self {
            reminder_days: policy.reminder_threshold_days,
            close_days: policy.close_threshold_days,
        }
    }

    /// Nudge posted into a thread idle for the reminder window.
    pub fn reminder(&self, owner: Option<UserId>) -> Notice {
        Notice {
            mention: owner,
            title: "Inactive post".to_string(),
            body: format!(
                "It looks like this post hasn't had any activity in the last {} days.\n\
                 Has your issue been resolved? If so, please close this post with the `/close` command.\n\
                 If not, please add more information or ping the moderators.\n\n\
                 > Note: posts without a reply from you for {} days are closed automatically.",
                self.reminder_days, self.close_days
            ),
            tone: NoticeTone::Warning,
        }
    }

    /// Final message posted into a thread that was just closed.
    pub fn closure(&self, forum_name: &str) -> Notice {
        Notice {
            mention: None,
            title: "Post closed".to_string(),
            body: format!(
                "This post has been automatically closed due to inactivity \
                 ({}+ days with no user response).\n\n\
                 If you still need help, feel free to create a new post in the {forum_name} forum.",
                self.close_days
            ),
            tone: NoticeTone::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_mentions_owner_and_interpolates_thresholds() {
        let policy = LifecyclePolicy {
            reminder_threshold_days: 5,
            close_threshold_days: 21,
            ..LifecyclePolicy::default()
        };
        let notice = NoticeTemplates::new(&policy).reminder(Some(UserId(42)));

        assert_eq!(notice.mention, Some(UserId(42)));
        assert_eq!(notice.tone, NoticeTone::Warning);
        assert!(notice.body.contains("last 5 days"));
        assert!(notice.body.contains("for 21 days"));
        assert!(notice.body.contains("/close"));
    }

    #[test]
    fn closure_names_the_forum() {
        let notice = NoticeTemplates::new(&LifecyclePolicy::default()).closure("Bug Report");

        assert_eq!(notice.mention, None);
        assert_eq!(notice.title, "Post closed");
        assert_eq!(notice.tone, NoticeTone::Error);
        assert!(notice.body.contains("30+ days"));
        assert!(notice.body.contains("in the Bug Report forum"));
    }
}
