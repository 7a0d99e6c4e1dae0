// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backward cursor pagination over a channel's message history.
//!
//! A [`HistoryScan`] walks one container newest-first, holding at most one
//! page in memory. The first page is fetched without a cursor; every later
//! page is requested strictly before the oldest item of the previous one.
//! The scan ends when a page comes back empty or short, when an item crosses
//! the time cutoff, when the count limit of matching items is reached, or
//! when a fetch fails. A failed fetch is surfaced once and never retried.

use chrono::{DateTime, Utc};
use forumkeeper_core::{ChannelId, ForumkeeperError, HistoryMessage, MessageId, MessagingTransport};
use tracing::{debug, trace};

/// Largest page the history endpoint serves.
pub const MAX_PAGE_SIZE: u8 = 100;

/// Termination rules evaluated per scanned item.
///
/// Both fields may be set at once; an empty condition scans to exhaustion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopCondition {
    /// Items created strictly before this instant end the scan and are not yielded.
    /// The boundary is inclusive: an item created exactly at the cutoff is yielded.
    pub time_cutoff: Option<DateTime<Utc>>,
    /// Maximum number of matching items to yield.
    pub count_limit: Option<usize>,
}

impl StopCondition {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn time_cutoff(cutoff: DateTime<Utc>) -> Self {
        Self {
            time_cutoff: Some(cutoff),
            count_limit: None,
        }
    }

    pub fn count_limit(limit: usize) -> Self {
        Self {
            time_cutoff: None,
            count_limit: Some(limit),
        }
    }
}

/// Position of an in-flight scan. Owned by exactly one [`HistoryScan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    pub container: ChannelId,
    /// Exclusive upper bound for the next fetch; `None` starts from the newest message.
    pub before: Option<MessageId>,
    pub page_size: u8,
}

/// Factory for history scans with a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryScanner {
    page_size: u8,
}

impl Default for HistoryScanner {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
        }
    }
}

impl HistoryScanner {
    /// Page sizes are clamped to `1..=100`.
    pub fn new(page_size: u8) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_size(&self) -> u8 {
        self.page_size
    }

    /// Start a new scan of `container`. Nothing is fetched until the first `next()`.
    pub fn scan<'a>(
        &self,
        transport: &'a dyn MessagingTransport,
        container: ChannelId,
        stop: StopCondition,
    ) -> HistoryScan<'a> {
        HistoryScan {
            transport,
            cursor: ScanCursor {
                container,
                before: None,
                page_size: self.page_size,
            },
            stop,
            filter: None,
            page: Vec::new().into_iter(),
            more_pages: true,
            finished: false,
            yielded: 0,
            pages_fetched: 0,
        }
    }
}

type ItemFilter<'a> = Box<dyn Fn(&HistoryMessage) -> bool + Send + Sync + 'a>;

/// A lazy, finite, newest-first sequence of history items for one container.
pub struct HistoryScan<'a> {
    transport: &'a dyn MessagingTransport,
    cursor: ScanCursor,
    stop: StopCondition,
    filter: Option<ItemFilter<'a>>,
    page: std::vec::IntoIter<HistoryMessage>,
    more_pages: bool,
    finished: bool,
    yielded: usize,
    pages_fetched: usize,
}

impl<'a> HistoryScan<'a> {
    /// Only yield (and count) items accepted by `filter`.
    ///
    /// The time cutoff still applies to every item, matching or not.
    pub fn matching<F>(mut self, filter: F) -> Self
    where
        F: Fn(&HistoryMessage) -> bool + Send + Sync + 'a,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Advance to the next matching item.
    ///
    /// Returns `None` once the scan has terminated. A fetch error is returned
    /// once as `Some(Err(_))`, after which the scan is finished.
    pub async fn next(&mut self) -> Option<Result<HistoryMessage, ForumkeeperError>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(limit) = self.stop.count_limit
                && self.yielded >= limit
            {
                trace!(container = %self.cursor.container, limit, "scan reached count limit");
                return self.finish();
            }

            let Some(item) = self.page.next() else {
                if !self.more_pages {
                    return self.finish();
                }
                if let Err(e) = self.fetch_page().await {
                    self.finished = true;
                    return Some(Err(e));
                }
                continue;
            };

            if let Some(cutoff) = self.stop.time_cutoff
                && item.created_at < cutoff
            {
                trace!(container = %self.cursor.container, message = %item.id, "scan crossed time cutoff");
                return self.finish();
            }

            if self.filter.as_ref().is_some_and(|accept| !accept(&item)) {
                continue;
            }

            self.yielded += 1;
            return Some(Ok(item));
        }
    }

    /// Stop counting the most recently yielded item toward the count limit.
    ///
    /// Lets a consumer that failed to act on an item keep scanning for a
    /// replacement instead of spending its budget on the failure.
    pub fn release_last(&mut self) {
        self.yielded = self.yielded.saturating_sub(1);
    }

    pub fn cursor(&self) -> ScanCursor {
        self.cursor
    }

    /// Matching items yielded so far, net of released ones.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn finish(&mut self) -> Option<Result<HistoryMessage, ForumkeeperError>> {
        self.finished = true;
        self.page = Vec::new().into_iter();
        None
    }

    async fn fetch_page(&mut self) -> Result<(), ForumkeeperError> {
        let ScanCursor {
            container,
            before,
            page_size,
        } = self.cursor;

        let page = self.transport.fetch_messages(container, before, page_size).await?;
        self.pages_fetched += 1;

        debug!(
            container = %container,
            before = ?before.map(|id| id.0),
            returned = page.len(),
            page = self.pages_fetched,
            "fetched history page"
        );

        // A short page means the platform has nothing older.
        self.more_pages = page.len() >= usize::from(page_size);
        self.cursor.before = page.last().map(|m| m.id).or(before);
        self.page = page.into_iter();
        Ok(())
    }
}
