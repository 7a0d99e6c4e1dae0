// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily inactivity pass over the configured forums.
//!
//! One background task waits for the configured local time of day, runs a
//! pass, then computes the next fire from the current time. `stop()` only
//! cancels the wait: a pass that has already started runs to completion.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveTime, Utc};
use forumkeeper_config::model::LifecycleConfig;
use forumkeeper_config::parse_fire_at;
use forumkeeper_core::{
    ChannelId, ConnectionState, ForumTag, ForumkeeperError, MessagingTransport, TagId, ThreadInfo,
};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classifier::{self, LifecyclePolicy, LifecycleVerdict};
use crate::notice::NoticeTemplates;
use crate::scanner::HistoryScanner;
use crate::schedule::{ScheduleState, next_fire_time};
use crate::snapshot::ThreadSnapshot;

/// A forum watched by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForumTarget {
    pub id: ChannelId,
    /// Shown in logs and in the closure notice.
    pub name: String,
}

/// Everything a pass needs besides the transport.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub fire_at: NaiveTime,
    pub policy: LifecyclePolicy,
    pub page_size: u8,
    pub forums: Vec<ForumTarget>,
}

impl SchedulerSettings {
    pub fn from_config(config: &LifecycleConfig) -> Result<Self, ForumkeeperError> {
        let fire_at = parse_fire_at(&config.fire_at).ok_or_else(|| {
            ForumkeeperError::Config(format!("invalid lifecycle.fire_at `{}`", config.fire_at))
        })?;

        Ok(Self {
            fire_at,
            policy: LifecyclePolicy::from_config(config),
            page_size: config.page_size,
            forums: config
                .forums
                .iter()
                .map(|f| ForumTarget {
                    id: ChannelId(f.id),
                    name: f.name.clone(),
                })
                .collect(),
        })
    }
}

/// Outcome counters of one lifecycle pass.
///
/// Threads that failed to evaluate count toward both `skipped` and `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// The transport was not connected, so nothing was inspected.
    pub skipped_disconnected: bool,
    /// The transport became unavailable mid-pass and the rest was abandoned.
    pub aborted: bool,
    pub forums_scanned: usize,
    pub forums_failed: usize,
    pub threads_checked: usize,
    pub active: usize,
    pub reminded: usize,
    pub closed: usize,
    pub skipped: usize,
    pub failures: usize,
    pub mutation_failures: usize,
}

impl RunReport {
    fn log(&self) {
        if self.skipped_disconnected {
            return;
        }
        info!(
            forums = self.forums_scanned,
            forums_failed = self.forums_failed,
            threads = self.threads_checked,
            reminded = self.reminded,
            closed = self.closed,
            skipped = self.skipped,
            failures = self.failures,
            mutation_failures = self.mutation_failures,
            aborted = self.aborted,
            "lifecycle pass complete"
        );
    }
}

/// Owns the daily trigger and the pass logic.
pub struct LifecycleScheduler {
    engine: Arc<LifecycleEngine>,
    task: Mutex<Option<RunningTask>>,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl LifecycleScheduler {
    pub fn new(transport: Arc<dyn MessagingTransport>, settings: SchedulerSettings) -> Self {
        let (state, _) = watch::channel(ScheduleState::Idle);
        let engine = LifecycleEngine {
            transport,
            scanner: HistoryScanner::new(settings.page_size),
            notices: NoticeTemplates::new(&settings.policy),
            settings,
            state,
            fire_lock: Mutex::new(()),
        };
        Self {
            engine: Arc::new(engine),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ScheduleState {
        *self.engine.state.borrow()
    }

    /// Observe state transitions of the background task.
    pub fn subscribe(&self) -> watch::Receiver<ScheduleState> {
        self.engine.state.subscribe()
    }

    /// Spawn the background task. Calling `start` on a running scheduler is a no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            debug!("lifecycle scheduler already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(Arc::clone(&self.engine), cancel.clone()));
        *task = Some(RunningTask { cancel, handle });

        info!(
            fire_at = %self.engine.settings.fire_at,
            forums = self.engine.settings.forums.len(),
            "lifecycle scheduler started"
        );
    }

    /// Cancel the pending wait and wait for the background task to exit.
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            error!(error = %e, "lifecycle scheduler task failed");
        }
        info!("lifecycle scheduler stopped");
    }

    /// Run one pass now, serialized with any scheduled pass.
    pub async fn run_once(&self) -> RunReport {
        self.engine.run_pass().await
    }
}

async fn run_loop(engine: Arc<LifecycleEngine>, cancel: CancellationToken) {
    let mut previous: Option<DateTime<Local>> = None;

    while !cancel.is_cancelled() {
        // Never fire the same target twice if the timer wakes a little early.
        let now = Local::now();
        let from = previous.map_or(now, |p| p.max(now));
        let next_fire = next_fire_time(&from, engine.settings.fire_at);
        engine.state.send_replace(ScheduleState::Waiting { next_fire });
        info!(next_fire = %next_fire, "next lifecycle pass scheduled");

        let wait = (next_fire - Local::now()).to_std().unwrap_or_default();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        previous = Some(next_fire);
        engine.state.send_replace(ScheduleState::Firing);
        engine.run_pass().await.log();
    }

    engine.state.send_replace(ScheduleState::Idle);
}

struct LifecycleEngine {
    transport: Arc<dyn MessagingTransport>,
    settings: SchedulerSettings,
    scanner: HistoryScanner,
    notices: NoticeTemplates,
    state: watch::Sender<ScheduleState>,
    fire_lock: Mutex<()>,
}

impl LifecycleEngine {
    async fn run_pass(&self) -> RunReport {
        let _guard = self.fire_lock.lock().await;
        let mut report = RunReport::default();

        let connection = self.transport.connection_state();
        if connection != ConnectionState::Connected {
            warn!(state = %connection, "transport not connected, skipping lifecycle pass");
            report.skipped_disconnected = true;
            return report;
        }

        let now = Utc::now();
        for forum in &self.settings.forums {
            if let Err(e) = self.process_forum(forum, now, &mut report).await {
                if !e.is_unit_scoped() {
                    error!(forum = %forum.name, error = %e, "lifecycle pass aborted");
                    report.aborted = true;
                    break;
                }
                warn!(forum = %forum.name, error = %e, "skipping forum");
                report.forums_failed += 1;
            }
        }

        report
    }

    async fn process_forum(
        &self,
        forum: &ForumTarget,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<(), ForumkeeperError> {
        let threads = self.transport.list_forum_threads(forum.id).await?;
        let tags = self.transport.forum_tags(forum.id).await?;
        let closed_tag = tags
            .iter()
            .find(|t| self.settings.policy.closed_tag.matches(&t.name));

        debug!(forum = %forum.name, threads = threads.len(), "scanning forum");
        report.forums_scanned += 1;

        for thread in threads.iter().filter(|t| !t.archived) {
            report.threads_checked += 1;
            if let Err(e) = self.process_thread(forum, thread, closed_tag, now, report).await {
                if !e.is_unit_scoped() {
                    return Err(e);
                }
                warn!(thread = %thread.id, forum = %forum.name, error = %e, "skipping thread");
                report.skipped += 1;
                report.failures += 1;
            }
        }

        Ok(())
    }

    async fn process_thread(
        &self,
        forum: &ForumTarget,
        thread: &ThreadInfo,
        closed_tag: Option<&ForumTag>,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<(), ForumkeeperError> {
        let policy = &self.settings.policy;
        let mut snapshot = ThreadSnapshot::from_thread(thread);

        let verdict = match classifier::precheck(&snapshot, policy) {
            Some(reason) => LifecycleVerdict::Skip(reason),
            None => {
                snapshot
                    .load_activity(self.transport.as_ref(), &self.scanner)
                    .await?;
                classifier::classify(&snapshot, policy, now)
            }
        };
        debug!(thread = %thread.id, verdict = %verdict, "thread classified");

        match verdict {
            LifecycleVerdict::Active => report.active += 1,
            LifecycleVerdict::Skip(_) => report.skipped += 1,
            LifecycleVerdict::NeedsReminder => self.remind(thread, report).await,
            LifecycleVerdict::NeedsClose => self.close(forum, thread, closed_tag, report).await,
        }
        Ok(())
    }

    async fn remind(&self, thread: &ThreadInfo, report: &mut RunReport) {
        let notice = self.notices.reminder(thread.owner_id);
        match self.transport.send_notice(thread.id, &notice).await {
            Ok(message) => {
                debug!(thread = %thread.id, message = %message, "inactivity reminder sent");
                report.reminded += 1;
            }
            Err(e) => {
                warn!(thread = %thread.id, error = %e, "failed to send inactivity reminder");
                report.mutation_failures += 1;
            }
        }
    }

    /// Tag, lock and archive, then notify. Each step is attempted regardless
    /// of the others. The closed tag, not the archive flag, is what keeps a
    /// closed thread out of later passes.
    async fn close(
        &self,
        forum: &ForumTarget,
        thread: &ThreadInfo,
        closed_tag: Option<&ForumTag>,
        report: &mut RunReport,
    ) {
        match closed_tag {
            Some(tag) => {
                let tags = tags_with_closed(&thread.applied_tags, tag.id);
                if let Err(e) = self.transport.set_thread_tags(thread.id, &tags).await {
                    warn!(thread = %thread.id, error = %e, "failed to apply closed tag");
                    report.mutation_failures += 1;
                }
            }
            None => {
                warn!(forum = %forum.name, "forum has no closed tag, closing without tagging");
            }
        }

        match self.transport.lock_and_archive(thread.id).await {
            Ok(()) => {
                info!(thread = %thread.id, forum = %forum.name, "thread closed for inactivity");
                report.closed += 1;
            }
            Err(e) => {
                warn!(thread = %thread.id, error = %e, "failed to lock and archive thread");
                report.mutation_failures += 1;
            }
        }

        let notice = self.notices.closure(&forum.name);
        if let Err(e) = self.transport.send_notice(thread.id, &notice).await {
            warn!(thread = %thread.id, error = %e, "failed to send closure notice");
            report.mutation_failures += 1;
        }
    }
}

/// The thread's applied tags plus the closed tag, without duplicates and in
/// their original order.
pub fn tags_with_closed(applied: &[ForumTag], closed: TagId) -> Vec<TagId> {
    let mut tags: Vec<TagId> = Vec::with_capacity(applied.len() + 1);
    for id in applied.iter().map(|t| t.id).chain(std::iter::once(closed)) {
        if !tags.contains(&id) {
            tags.push(id);
        }
    }
    tags
}
