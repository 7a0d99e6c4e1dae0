// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forum thread lifecycle engine for forumkeeper.
//!
//! - [`scanner`]: backward cursor pagination over message history.
//! - [`classifier`]: pure inactivity verdicts.
//! - [`scheduler`]: the daily pass that reminds and closes threads.
//! - [`purge`]: bulk deletion of one user's messages.
//!
//! Everything talks to the platform through
//! [`MessagingTransport`](forumkeeper_core::MessagingTransport).

pub mod classifier;
pub mod notice;
pub mod purge;
pub mod scanner;
pub mod schedule;
pub mod scheduler;
pub mod snapshot;

pub use classifier::{LifecyclePolicy, LifecycleVerdict, SkipReason, TagMatcher, classify};
pub use purge::{BulkPurgeWorker, PurgeOutcome, PurgeRequest};
pub use scanner::{HistoryScan, HistoryScanner, ScanCursor, StopCondition};
pub use schedule::{ScheduleState, next_fire_time};
pub use scheduler::{ForumTarget, LifecycleScheduler, RunReport, SchedulerSettings};
pub use snapshot::ThreadSnapshot;
