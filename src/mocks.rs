// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mock-controller contract consumed by the runner.
//!
//! Mocking subsystems are external to the harness. A suite that uses mocks
//! supplies a factory through
//! [`SuiteBuilder::mock_controller`](crate::registry::SuiteBuilder::mock_controller);
//! the runner creates one controller per test before setup runs and calls
//! [`MockController::finish`] exactly once after teardown, so unsatisfied
//! expectations surface as failure records on the test that created them.

use crate::context::TestContext;
use std::sync::Arc;

/// A per-test mock controller.
pub trait MockController: Send + Sync {
    /// Reports any errors the controller is sitting on, such as unsatisfied
    /// call expectations, by appending failure records to the test.
    ///
    /// Called by the runner after teardown completes. Test functions should
    /// not call this themselves.
    fn finish(&self, cx: &TestContext);
}

/// Creates a fresh [`MockController`] for each scheduled test.
pub type MockControllerFactory = Arc<dyn Fn() -> Arc<dyn MockController> + Send + Sync>;
