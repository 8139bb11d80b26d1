// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level run entry points.

use crate::{
    errors::RunError,
    registry::SuiteRegistry,
    reporter::{ReporterOpts, TestEvent, TestReporter, write_event},
    runner::{RunStats, SuiteBatch, TestRunnerOpts},
    stop::StopSignal,
    test_filter::TestFilter,
};
use std::{
    io,
    sync::{Arc, Once, OnceLock},
};
use termcolor::WriteColor;

static RUN_ONCE: Once = Once::new();
static RUN_OUTCOME: OnceLock<i32> = OnceLock::new();

/// Runs everything in the registry, reporting progress to stdout, and
/// returns the process exit code: 0 on success, 1 if any test failed or a
/// stop was requested mid-run.
///
/// The run executes at most once per process. Hosts often call this from
/// more than one generated bridge function; calls after the first are silent
/// no-ops that return the first run's exit code.
///
/// An invalid filter pattern is a configuration error and is reported on
/// every call, before the once-only check.
pub fn run_tests(
    registry: &SuiteRegistry,
    filter_pattern: Option<&str>,
    runner_opts: TestRunnerOpts,
    reporter_opts: ReporterOpts,
) -> Result<i32, RunError> {
    let filter = TestFilter::new(filter_pattern)?;

    let mut first_error = None;
    RUN_ONCE.call_once(|| {
        let reporter = TestReporter::new(reporter_opts);
        let code = match run_with(registry, &filter, runner_opts, |event| {
            reporter.report_event(event)
        }) {
            Ok(stats) => {
                if stats.is_success() {
                    0
                } else {
                    1
                }
            }
            Err(err) => {
                first_error = Some(err);
                1
            }
        };
        let _ = RUN_OUTCOME.set(code);
    });

    match first_error {
        Some(err) => Err(err),
        None => Ok(RUN_OUTCOME.get().copied().unwrap_or(1)),
    }
}

/// Runs everything in the registry, writing progress to the given writer.
///
/// Unlike [`run_tests`] this is not latched, so hosts that manage their own
/// lifecycle (and the harness's own tests) can invoke it repeatedly with
/// independent registries.
pub fn run_tests_to(
    registry: &SuiteRegistry,
    filter: &TestFilter,
    runner_opts: TestRunnerOpts,
    mut writer: impl WriteColor,
) -> Result<RunStats, RunError> {
    run_with(registry, filter, runner_opts, |event| {
        write_event(event, &mut writer)
    })
}

/// Builds the global batch and drives the runner, funnelling events into the
/// supplied sink. The first sink error wins; later events are dropped.
fn run_with<F>(
    registry: &SuiteRegistry,
    filter: &TestFilter,
    runner_opts: TestRunnerOpts,
    mut sink: F,
) -> Result<RunStats, RunError>
where
    F: FnMut(&TestEvent<'_>) -> io::Result<()>,
{
    let stop = Arc::new(StopSignal::new());
    let runner = runner_opts.build(Arc::clone(&stop));

    // Batching is global rather than per suite so workers stay utilized
    // across suite boundaries.
    let batch: Vec<SuiteBatch<'_>> = registry
        .suites()
        .iter()
        .map(|suite| SuiteBatch {
            suite_name: suite.name(),
            test_functions: suite
                .test_functions()
                .iter()
                .filter(|test_function| filter.is_match(suite.name(), test_function.name()))
                .collect(),
        })
        .collect();

    let mut sink_error: Option<io::Error> = None;
    let stats = runner.execute(&batch, |event| {
        if sink_error.is_none()
            && let Err(err) = sink(&event)
        {
            sink_error = Some(err);
        }
    });

    match sink_error {
        Some(err) => Err(RunError::Report(err)),
        None => Ok(stats),
    }
}
