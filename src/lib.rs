// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! suiterunner is an in-process test harness built around registered test
//! suites. A suite is a named group of test functions, each with optional
//! setup and teardown callbacks. The harness executes all registered test
//! functions on a bounded pool of worker threads, records expectation and
//! assertion failures with source locations, contains unexpected panics, and
//! reports results in declaration order regardless of completion order.
//!
//! The typical flow:
//!
//! 1. Build suites with [`registry::SuiteBuilder`] and collect them in a
//!    [`registry::SuiteRegistry`].
//! 2. Parse [`dispatch::Opts`] in the host binary and call
//!    [`dispatch::Opts::exec`], or call [`run::run_tests`] directly.
//! 3. Inside test functions, use the [`context::TestContext`] handle to make
//!    checks against [`matcher::Matcher`] implementations.

pub mod context;
pub mod dispatch;
pub mod errors;
mod helpers;
pub mod matcher;
pub mod mocks;
pub mod output;
mod protect;
pub mod registry;
pub mod reporter;
pub mod run;
pub mod runner;
pub mod stop;
pub mod test_filter;
