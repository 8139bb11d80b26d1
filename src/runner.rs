// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parallel scheduling of test functions.
//!
//! The runner flattens every suite's filtered tests into one shared queue
//! and executes them on a bounded pool of worker threads. Completion is
//! decoupled from reporting: each scheduled test carries its own one-shot
//! result channel, and the consuming side waits on those channels in
//! declaration order, so output order never depends on which worker finished
//! first.

use crate::{
    context::{TestContext, format_failure_output},
    protect::run_with_protection,
    registry::TestFunction,
    reporter::TestEvent,
    stop::StopSignal,
};
use clap::Args;
use crossbeam_channel::{Receiver, Sender};
use std::{
    num::NonZeroUsize,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tracing::debug;

const DEFAULT_PARALLELISM: NonZeroUsize = NonZeroUsize::new(16).unwrap();

/// Test runner options.
#[derive(Debug, Args)]
pub struct TestRunnerOpts {
    /// Maximum number of tests to run concurrently
    #[arg(long, default_value = "16")]
    pub parallelism: NonZeroUsize,

    /// Stop reporting results after the first failing test
    #[arg(long)]
    pub stop_early: bool,
}

impl Default for TestRunnerOpts {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            stop_early: false,
        }
    }
}

impl TestRunnerOpts {
    /// Creates a new test runner wired to the given stop signal.
    pub fn build(self, stop: Arc<StopSignal>) -> TestRunner {
        TestRunner {
            parallelism: self.parallelism,
            stop_early: self.stop_early,
            stop,
        }
    }
}

/// Context for running tests.
pub struct TestRunner {
    parallelism: NonZeroUsize,
    stop_early: bool,
    stop: Arc<StopSignal>,
}

/// The filtered tests of one suite, in declaration order.
pub struct SuiteBatch<'a> {
    /// The suite name, used in banners and full test names.
    pub suite_name: &'a str,

    /// The tests to run.
    pub test_functions: Vec<&'a TestFunction>,
}

/// Information about a test that finished running.
#[derive(Clone, Debug)]
pub struct TestRunResult {
    /// True if the test recorded at least one failure or panicked.
    pub failed: bool,

    /// The formatted failure blocks, empty for a passing test.
    pub output: Vec<u8>,

    /// Wall-clock span of the setup, body, and teardown phases.
    pub duration: Duration,
}

/// One scheduled test execution: the test function plus the one-shot channel
/// its result travels through. The sender is consumed by the single send, so
/// a completion can never be signalled twice.
struct WorkItem<'a> {
    test_function: &'a TestFunction,
    completion: Sender<TestRunResult>,
}

impl TestRunner {
    /// Executes the batched tests, invoking the callback with ordered
    /// progress events, and returns aggregate statistics for the run.
    ///
    /// Events arrive in declaration order within each suite and in
    /// registration order across suites, regardless of completion order.
    pub fn execute<'a, F>(&self, suites: &[SuiteBatch<'a>], mut on_event: F) -> RunStats
    where
        F: FnMut(TestEvent<'a>),
    {
        let initial_run_count = suites.iter().map(|suite| suite.test_functions.len()).sum();
        let mut stats = RunStats {
            initial_run_count,
            ..RunStats::default()
        };

        // One shared FIFO queue across all suites, so workers stay busy even
        // when individual suites are small.
        let (work_sender, work_receiver) = crossbeam_channel::unbounded::<WorkItem<'a>>();

        // One completion channel per test. Tests that never start keep their
        // senders queued; dropping the queue when the workers exit closes
        // those channels, which is how the draining side learns that a
        // result will never arrive.
        let mut completions: Vec<Vec<Receiver<TestRunResult>>> = Vec::with_capacity(suites.len());
        for suite in suites {
            let mut receivers = Vec::with_capacity(suite.test_functions.len());
            for &test_function in &suite.test_functions {
                let (sender, receiver) = crossbeam_channel::bounded(1);
                // Failure to send means the receiver was dropped.
                let _ = work_sender.send(WorkItem {
                    test_function,
                    completion: sender,
                });
                receivers.push(receiver);
            }
            completions.push(receivers);
        }
        drop(work_sender);

        debug!(
            test_count = initial_run_count,
            parallelism = self.parallelism.get(),
            "starting test run"
        );

        let stop = &self.stop;
        thread::scope(|scope| {
            for _ in 0..self.parallelism.get() {
                let work_receiver = work_receiver.clone();
                scope.spawn(move || {
                    for item in work_receiver.iter() {
                        if stop.is_stop_requested() {
                            debug!("stop requested, worker exiting");
                            return;
                        }

                        let result = run_test_function(item.test_function, stop);
                        // Failure to send means the receiver was dropped.
                        let _ = item.completion.send(result);
                    }
                });
            }
            drop(work_receiver);

            // Reporting is suppressed, but results still drained, once the
            // run has failed and stop-early was requested.
            let mut muted = false;

            'drain: for (suite, receivers) in suites.iter().zip(&completions) {
                let suite_muted = muted;
                if !suite_muted {
                    on_event(TestEvent::SuiteStarted {
                        suite_name: suite.suite_name,
                    });
                }

                for (test_function, receiver) in suite.test_functions.iter().zip(receivers) {
                    let result = if stop.is_stop_requested() {
                        // The test may never start now. Drain its result only
                        // if it was in flight when the stop was requested.
                        match receiver.try_recv() {
                            Ok(result) => {
                                if !muted {
                                    on_event(TestEvent::TestStarted {
                                        suite_name: suite.suite_name,
                                        test_name: test_function.name(),
                                    });
                                }
                                result
                            }
                            Err(_) => break 'drain,
                        }
                    } else {
                        if !muted {
                            on_event(TestEvent::TestStarted {
                                suite_name: suite.suite_name,
                                test_name: test_function.name(),
                            });
                        }
                        match receiver.recv() {
                            Ok(result) => result,
                            // Disconnected: the workers exited after a stop
                            // request without starting this test.
                            Err(_) => break 'drain,
                        }
                    };

                    stats.final_run_count += 1;
                    if result.failed {
                        stats.failed += 1;
                    } else {
                        stats.passed += 1;
                    }

                    if !muted {
                        on_event(TestEvent::TestFinished {
                            suite_name: suite.suite_name,
                            test_name: test_function.name(),
                            result,
                        });
                    }
                    if self.stop_early && stats.failed > 0 {
                        muted = true;
                    }
                }

                if !suite_muted {
                    on_event(TestEvent::SuiteFinished {
                        suite_name: suite.suite_name,
                    });
                }
            }
        });

        // All workers are joined at this point, fulfilling the guarantee
        // that no test is abandoned mid-flight.
        if stop.is_stop_requested() {
            stats.stop_requested = true;
            stop.mark_stopped();
            on_event(TestEvent::RunEarlyExit);
        }
        stats
    }
}

/// Runs a single test function through its full phase sequence and
/// finalizes its result.
fn run_test_function(test_function: &TestFunction, stop: &Arc<StopSignal>) -> TestRunResult {
    let mock = test_function.mock_factory().map(|factory| factory());
    let cx = TestContext::new(test_function.name(), Arc::clone(stop), mock);

    let start = Instant::now();

    // Run the setup callback, if any, paying attention to whether it
    // panics. The body only runs if setup completed normally.
    let mut set_up_panicked = false;
    if let Some(set_up) = test_function.set_up() {
        set_up_panicked = run_with_protection(&cx, |cx| set_up(cx));
    }

    let mut panicked = set_up_panicked;
    if !set_up_panicked {
        let body = test_function.run();
        panicked |= run_with_protection(&cx, |cx| body(cx));
    }

    // Teardown runs unconditionally; its own panics are recorded but do not
    // prevent completion.
    if let Some(tear_down) = test_function.tear_down() {
        panicked |= run_with_protection(&cx, |cx| tear_down(cx));
    }

    let duration = start.elapsed();

    // Let the mock controller report any errors it is sitting on. This
    // happens outside the measured duration.
    if let Some(controller) = cx.mock_controller().cloned() {
        controller.finish(&cx);
    }

    let records = cx.take_records();
    TestRunResult {
        // A panic with no records can only be an abort raised without a
        // prior failure; report it as failed rather than passing silently.
        failed: !records.is_empty() || panicked,
        output: format_failure_output(&records),
        duration,
    }
}

/// Statistics for a test run.
#[derive(Copy, Clone, Default, Debug)]
pub struct RunStats {
    /// The total number of tests that were expected to run at the
    /// beginning.
    ///
    /// If the run was stopped, this will be more than `final_run_count`.
    pub initial_run_count: usize,

    /// The total number of tests that actually ran.
    pub final_run_count: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// True if a stop was requested during the run.
    pub stop_requested: bool,
}

impl RunStats {
    /// Returns true if this run is considered a success.
    ///
    /// A run is marked as failed if any of the following are true:
    /// * the run was stopped before every test started
    /// * any test failed
    pub fn is_success(&self) -> bool {
        if self.stop_requested || self.initial_run_count > self.final_run_count {
            return false;
        }
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{SuiteBuilder, TestSuite};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn run_single(suite: &TestSuite) -> TestRunResult {
        let stop = Arc::new(StopSignal::new());
        run_test_function(&suite.test_functions()[0], &stop)
    }

    #[test]
    fn passing_test_has_no_output() {
        let suite = SuiteBuilder::new("T").test("Passes", |_| {}).build();
        let result = run_single(&suite);
        assert!(!result.failed);
        assert!(result.output.is_empty());
    }

    #[test]
    fn set_up_panic_skips_body_but_not_teardown() {
        let body_ran = Arc::new(AtomicBool::new(false));
        let teardown_ran = Arc::new(AtomicBool::new(false));

        let suite = {
            let body_ran = Arc::clone(&body_ran);
            let teardown_ran = Arc::clone(&teardown_ran);
            SuiteBuilder::new("T")
                .set_up(|_| panic!("setup exploded"))
                .tear_down(move |_| teardown_ran.store(true, Ordering::SeqCst))
                .test("Skipped", move |_| body_ran.store(true, Ordering::SeqCst))
                .build()
        };

        let result = run_single(&suite);
        assert!(result.failed);
        assert!(!body_ran.load(Ordering::SeqCst));
        assert!(teardown_ran.load(Ordering::SeqCst));

        let output = String::from_utf8(result.output).unwrap();
        assert!(output.contains("panic: setup exploded"));
    }

    #[test]
    fn teardown_failure_is_recorded_in_addition_to_body_failure() {
        let suite = SuiteBuilder::new("T")
            .tear_down(|cx| cx.add_failure("teardown failed"))
            .test("Fails", |cx| cx.add_failure("body failed"))
            .build();

        let result = run_single(&suite);
        assert!(result.failed);
        let output = String::from_utf8(result.output).unwrap();
        let body_at = output.find("body failed").expect("body failure reported");
        let teardown_at = output.find("teardown failed").expect("teardown failure reported");
        assert!(body_at < teardown_at, "records are chronological");
    }

    #[test]
    fn abort_without_records_still_fails() {
        let suite = SuiteBuilder::new("T").test("BareAbort", |cx| cx.abort_test()).build();
        let result = run_single(&suite);
        assert!(result.failed);
        assert!(result.output.is_empty());
    }

    #[test]
    fn mock_finish_failures_count() {
        struct Unsatisfied;
        impl crate::mocks::MockController for Unsatisfied {
            fn finish(&self, cx: &TestContext) {
                cx.add_failure("unsatisfied expectation");
            }
        }

        let suite = SuiteBuilder::new("T")
            .mock_controller(|| Arc::new(Unsatisfied))
            .test("UsesMocks", |_| {})
            .build();

        let result = run_single(&suite);
        assert!(result.failed);
        assert!(String::from_utf8(result.output).unwrap().contains("unsatisfied expectation"));
    }

    #[test]
    fn stats_is_success() {
        assert!(RunStats::default().is_success(), "empty run is a success");
        assert!(
            RunStats {
                initial_run_count: 42,
                final_run_count: 42,
                passed: 42,
                ..RunStats::default()
            }
            .is_success()
        );
        assert!(
            !RunStats {
                initial_run_count: 42,
                final_run_count: 41,
                ..RunStats::default()
            }
            .is_success(),
            "stopped run counts as a failure"
        );
        assert!(
            !RunStats {
                initial_run_count: 1,
                final_run_count: 1,
                failed: 1,
                ..RunStats::default()
            }
            .is_success()
        );
        assert!(
            !RunStats {
                stop_requested: true,
                ..RunStats::default()
            }
            .is_success()
        );
    }
}
