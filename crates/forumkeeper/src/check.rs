// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `forumkeeper check`: run a single lifecycle pass and print the counters.

use std::sync::Arc;
use std::time::Duration;

use forumkeeper_config::ForumkeeperConfig;
use forumkeeper_core::{ForumkeeperError, MessagingTransport, PluginAdapter};
use forumkeeper_lifecycle::{LifecycleScheduler, RunReport, SchedulerSettings};
use tracing::warn;

use crate::serve::connect_transport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the `forumkeeper check` command.
pub async fn run_check(config: ForumkeeperConfig) -> Result<(), ForumkeeperError> {
    let settings = SchedulerSettings::from_config(&config.lifecycle)?;
    let transport = Arc::new(connect_transport(&config).await?);
    transport.wait_until_connected(CONNECT_TIMEOUT).await?;

    let report = run_pass(transport.clone(), settings).await;
    println!("{}", format_report(&report));

    if let Err(e) = transport.shutdown().await {
        warn!(error = %e, "transport shutdown failed (non-fatal)");
    }
    Ok(())
}

/// One pass outside the daily timer.
pub async fn run_pass(transport: Arc<dyn MessagingTransport>, settings: SchedulerSettings) -> RunReport {
    LifecycleScheduler::new(transport, settings).run_once().await
}

/// Human-readable summary of a pass.
pub fn format_report(report: &RunReport) -> String {
    if report.skipped_disconnected {
        return "lifecycle pass skipped: transport not connected".to_string();
    }

    let mut lines = vec![
        format!("Forums scanned:    {} ({} failed)", report.forums_scanned, report.forums_failed),
        format!("Threads checked:   {}", report.threads_checked),
        format!("  active:          {}", report.active),
        format!("  reminded:        {}", report.reminded),
        format!("  closed:          {}", report.closed),
        format!("  skipped:         {}", report.skipped),
        format!("Failures:          {}", report.failures),
        format!("Mutation failures: {}", report.mutation_failures),
    ];
    if report.aborted {
        lines.push("pass aborted: transport became unavailable".to_string());
    }
    lines.join("\n")
}
