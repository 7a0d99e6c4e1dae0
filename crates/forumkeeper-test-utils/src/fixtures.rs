// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture builders.

use forumkeeper_core::{ChannelId, ForumTag, ThreadInfo, UserId};

/// Builds a [`ThreadInfo`] that is open, unpinned and untagged unless told otherwise.
#[derive(Debug, Clone)]
pub struct ThreadBuilder {
    thread: ThreadInfo,
}

impl ThreadBuilder {
    pub fn new(id: ChannelId, forum: ChannelId) -> Self {
        Self {
            thread: ThreadInfo {
                id,
                forum_id: forum,
                name: format!("thread-{id}"),
                owner_id: None,
                pinned: false,
                archived: false,
                locked: false,
                applied_tags: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.thread.name = name.to_string();
        self
    }

    pub fn owner(mut self, owner: UserId) -> Self {
        self.thread.owner_id = Some(owner);
        self
    }

    pub fn pinned(mut self) -> Self {
        self.thread.pinned = true;
        self
    }

    pub fn archived(mut self) -> Self {
        self.thread.archived = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.thread.locked = true;
        self
    }

    pub fn tag(mut self, tag: ForumTag) -> Self {
        self.thread.applied_tags.push(tag);
        self
    }

    pub fn build(self) -> ThreadInfo {
        self.thread
    }
}
