// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by suiterunner.
//!
//! Only configuration-class errors live here. Failures inside test functions
//! are never surfaced as `Err` values; they become failure records on the
//! test that produced them.

use std::io;
use thiserror::Error;

/// An error that occurred while compiling the test name filter.
///
/// A broken filter pattern indicates a mistake in how the harness was
/// invoked, not a test outcome, so it aborts the run before any test starts.
#[derive(Debug, Error)]
#[error("invalid value for the test filter pattern `{pattern}`")]
pub struct FilterPatternError {
    pub(crate) pattern: String,
    #[source]
    pub(crate) source: regex::Error,
}

impl FilterPatternError {
    /// Returns the pattern that failed to compile.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// An error returned by the top-level run entry points.
#[derive(Debug, Error)]
pub enum RunError {
    /// The test name filter failed to compile.
    #[error(transparent)]
    Filter(#[from] FilterPatternError),

    /// Writing test output to the console failed.
    #[error("error writing test output")]
    Report(#[source] io::Error),
}
