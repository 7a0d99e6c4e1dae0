// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for forumkeeper.
//!
//! Every failure category degrades to "skip this unit, log, continue the
//! larger batch". None of these variants is fatal to the process.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across the transport trait and lifecycle operations.
#[derive(Debug, Error)]
pub enum ForumkeeperError {
    /// Configuration errors (invalid TOML, missing token, bad time-of-day).
    #[error("configuration error: {0}")]
    Config(String),

    /// The messaging transport is not connected to the platform.
    #[error("transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    /// A forum, channel, or thread could not be found or is forbidden.
    #[error("cannot access {container}: {message}")]
    ContainerAccess {
        container: String,
        message: String,
        source: Option<BoxedSource>,
    },

    /// A history page could not be fetched mid-scan.
    #[error("failed to fetch history page in {container}: {message}")]
    PageFetch {
        container: String,
        message: String,
        source: Option<BoxedSource>,
    },

    /// A remote mutation (tag update, lock, archive, send, delete) failed.
    #[error("{action} failed on {target}: {message}")]
    Mutation {
        action: &'static str,
        target: String,
        message: String,
        source: Option<BoxedSource>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ForumkeeperError {
    pub fn container_access(container: impl ToString, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ContainerAccess {
            container: container.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn page_fetch(container: impl ToString, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::PageFetch {
            container: container.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub fn mutation(
        action: &'static str,
        target: impl ToString,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Mutation {
            action,
            target: target.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Whether this error only affects the unit it was raised for.
    ///
    /// Everything except `Config` and `TransportUnavailable` is scoped to a
    /// single container, thread, or mutation.
    pub fn is_unit_scoped(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::TransportUnavailable { .. })
    }
}
