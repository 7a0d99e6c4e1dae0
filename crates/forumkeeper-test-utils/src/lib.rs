// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for forumkeeper integration tests.
//!
//! Provides an in-memory platform for fast, deterministic tests without a
//! Discord connection.
//!
//! # Components
//!
//! - [`MockTransport`] - In-memory forums, threads, channels and history with failure injection
//! - [`ThreadBuilder`] - Fluent construction of [`ThreadInfo`](forumkeeper_core::ThreadInfo) fixtures

pub mod fixtures;
pub mod mock_transport;

pub use fixtures::ThreadBuilder;
pub use mock_transport::{MockCall, MockTransport};
