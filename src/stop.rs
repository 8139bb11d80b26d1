// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot stop signalling between test functions and the runner.

use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const STOP_REQUESTED: u8 = 1;
const STOPPED: u8 = 2;

/// The observable state of a [`StopSignal`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StopState {
    /// No stop has been requested.
    Running,

    /// A stop has been requested; in-flight tests run to completion but no
    /// new test starts.
    StopRequested,

    /// The runner has joined its workers after a stop request.
    Stopped,
}

/// A one-shot broadcast flag that lets any test request that no further
/// tests start.
///
/// The signal transitions at most once from `Running` to `StopRequested`,
/// and never resets. Cancellation is cooperative: workers check the signal
/// before starting each test and never interrupt a test that is already
/// running.
#[derive(Debug, Default)]
pub struct StopSignal {
    state: AtomicU8,
}

impl StopSignal {
    /// Creates a new signal in the `Running` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that no further tests start. Idempotent.
    ///
    /// Returns true if this call performed the transition, false if a stop
    /// had already been requested.
    pub fn request_stop(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, STOP_REQUESTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns true if a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.state.load(Ordering::Acquire) != RUNNING
    }

    /// Returns the current state.
    pub fn state(&self) -> StopState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => StopState::Running,
            STOP_REQUESTED => StopState::StopRequested,
            _ => StopState::Stopped,
        }
    }

    /// Records that all workers have been joined after a stop request.
    pub(crate) fn mark_stopped(&self) {
        let _ = self.state.compare_exchange(
            STOP_REQUESTED,
            STOPPED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}
