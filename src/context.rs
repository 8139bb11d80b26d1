// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test state and the check entry points available to test functions.

use crate::{
    helpers::base_file_name,
    matcher::{MatchOutcome, Matcher},
    mocks::MockController,
    stop::StopSignal,
};
use std::{
    fmt,
    panic::{self, Location},
    sync::{Arc, Mutex},
};
use swrite::{SWrite, swrite};

/// A single failed expectation, assertion, or contained panic for a test.
///
/// Most users never construct these directly; they are generated by
/// [`TestContext::expect_that`], [`TestContext::assert_that`], and the panic
/// containment in the runner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureRecord {
    /// The base name of the file in which the failure occurred, e.g.
    /// `"widget.rs"`.
    pub file_name: String,

    /// The line number at which the failure occurred.
    pub line_number: u32,

    /// The message generated by the harness. For a failed match this has the
    /// form:
    ///
    /// ```text
    /// Expected: 17
    /// Actual:   "taco", which is not numeric
    /// ```
    pub generated_message: String,

    /// The message supplied by the user at the call site, if any.
    pub user_message: String,
}

/// The sentinel panic payload used to unwind out of a test after an
/// assertion failure. Recognized and swallowed by the runner's panic
/// containment; any other payload is reported as an unexpected panic.
pub(crate) struct TestAbort;

/// Dependencies and mutable state for one running test.
///
/// A fresh context is created immediately before a test's setup phase and
/// dropped once its results have been collected. Test functions receive a
/// shared reference, so a test may hand the context to threads it spawns and
/// record failures from them concurrently.
pub struct TestContext {
    test_name: String,
    stop: Arc<StopSignal>,
    mock: Option<Arc<dyn MockController>>,

    // Failure records accumulated so far. Only ever appended to.
    records: Mutex<Vec<FailureRecord>>,
}

impl TestContext {
    /// Creates a new context. Called by the runner for each scheduled test.
    pub fn new(
        test_name: impl Into<String>,
        stop: Arc<StopSignal>,
        mock: Option<Arc<dyn MockController>>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            stop,
            mock,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Returns the name of the running test.
    pub fn name(&self) -> &str {
        &self.test_name
    }

    /// Returns the mock controller for this test, if the suite registered a
    /// factory for one.
    pub fn mock_controller(&self) -> Option<&Arc<dyn MockController>> {
        self.mock.as_ref()
    }

    /// Confirms that the supplied matcher matches the candidate value,
    /// recording a failure and continuing the test if it does not.
    #[track_caller]
    pub fn expect_that<T, M>(&self, candidate: &T, matcher: &M)
    where
        T: fmt::Debug + ?Sized,
        M: Matcher<T> + ?Sized,
    {
        self.check_that(candidate, matcher, String::new(), Location::caller());
    }

    /// Like [`expect_that`](Self::expect_that), with a user-supplied message
    /// added to the failure output.
    #[track_caller]
    pub fn expect_that_with<T, M>(&self, candidate: &T, matcher: &M, user_message: impl fmt::Display)
    where
        T: fmt::Debug + ?Sized,
        M: Matcher<T> + ?Sized,
    {
        self.check_that(
            candidate,
            matcher,
            user_message.to_string(),
            Location::caller(),
        );
    }

    /// Confirms that the supplied matcher matches the candidate value,
    /// recording a failure and aborting the test immediately if it does not.
    ///
    /// Statements after a failed assertion never run; the current phase
    /// unwinds and the test's teardown (if any) still executes.
    #[track_caller]
    pub fn assert_that<T, M>(&self, candidate: &T, matcher: &M)
    where
        T: fmt::Debug + ?Sized,
        M: Matcher<T> + ?Sized,
    {
        if !self.check_that(candidate, matcher, String::new(), Location::caller()) {
            self.abort_test();
        }
    }

    /// Like [`assert_that`](Self::assert_that), with a user-supplied message
    /// added to the failure output.
    #[track_caller]
    pub fn assert_that_with<T, M>(&self, candidate: &T, matcher: &M, user_message: impl fmt::Display)
    where
        T: fmt::Debug + ?Sized,
        M: Matcher<T> + ?Sized,
    {
        if !self.check_that(
            candidate,
            matcher,
            user_message.to_string(),
            Location::caller(),
        ) {
            self.abort_test();
        }
    }

    /// Records a failure with the caller's file and line, and continues
    /// running the test.
    #[track_caller]
    pub fn add_failure(&self, message: impl Into<String>) {
        let caller = Location::caller();
        self.add_failure_record(FailureRecord {
            file_name: base_file_name(caller.file()),
            line_number: caller.line(),
            generated_message: message.into(),
            user_message: String::new(),
        });
    }

    /// Records a fully-formed failure and continues running the test.
    pub fn add_failure_record(&self, record: FailureRecord) {
        self.records
            .lock()
            .expect("failure record lock poisoned")
            .push(record);
    }

    /// Immediately stops executing the test, causing it to fail with the
    /// failures previously recorded.
    ///
    /// Callers are expected to have recorded at least one failure first; an
    /// abort with no prior records is still reported as a failed test, with
    /// empty output.
    pub fn abort_test(&self) -> ! {
        panic::panic_any(TestAbort);
    }

    /// Requests that the runner start no further tests. The currently
    /// running tests finish, their results are reported, and the run ends
    /// with a failing status.
    pub fn stop_running_tests(&self) {
        self.stop.request_stop();
    }

    /// Returns a snapshot of the failure records accumulated so far.
    pub fn failure_records(&self) -> Vec<FailureRecord> {
        self.records
            .lock()
            .expect("failure record lock poisoned")
            .clone()
    }

    /// Drains the accumulated records for result finalization.
    pub(crate) fn take_records(&self) -> Vec<FailureRecord> {
        std::mem::take(&mut *self.records.lock().expect("failure record lock poisoned"))
    }

    /// Evaluates the matcher, recording a failure on mismatch. Returns true
    /// if the candidate matched.
    fn check_that<T, M>(
        &self,
        candidate: &T,
        matcher: &M,
        user_message: String,
        caller: &'static Location<'static>,
    ) -> bool
    where
        T: fmt::Debug + ?Sized,
        M: Matcher<T> + ?Sized,
    {
        let detail = match matcher.matches(candidate) {
            MatchOutcome::Matched => return true,
            MatchOutcome::Unmatched { detail } | MatchOutcome::Indeterminate { detail } => detail,
        };

        // Make sure the expected and actual values align.
        let mut generated_message = format!(
            "Expected: {}\nActual:   {:?}",
            matcher.description(),
            candidate
        );
        if let Some(detail) = detail {
            swrite!(generated_message, ", {}", detail);
        }

        self.add_failure_record(FailureRecord {
            file_name: base_file_name(caller.file()),
            line_number: caller.line(),
            generated_message,
            user_message,
        });
        false
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("test_name", &self.test_name)
            .field("records", &self.records)
            .finish_non_exhaustive()
    }
}

/// Formats accumulated failure records into the console block printed
/// between a test's RUN and result banners.
pub(crate) fn format_failure_output(records: &[FailureRecord]) -> Vec<u8> {
    let mut out = String::new();
    for record in records {
        swrite!(
            out,
            "{}:{}:\n{}\n{}\n",
            record.file_name,
            record.line_number,
            record.generated_message,
            record.user_message
        );
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Equals(i64);

    impl Matcher<i64> for Equals {
        fn matches(&self, candidate: &i64) -> MatchOutcome {
            if *candidate == self.0 {
                MatchOutcome::Matched
            } else {
                MatchOutcome::Unmatched { detail: None }
            }
        }

        fn description(&self) -> String {
            self.0.to_string()
        }
    }

    struct NeverNumeric;

    impl Matcher<i64> for NeverNumeric {
        fn matches(&self, _candidate: &i64) -> MatchOutcome {
            MatchOutcome::Indeterminate {
                detail: Some("which is not numeric".to_owned()),
            }
        }

        fn description(&self) -> String {
            "\"taco\"".to_owned()
        }
    }

    fn new_context() -> TestContext {
        TestContext::new("ContextTest", Arc::new(StopSignal::new()), None)
    }

    #[test]
    fn matched_expectation_records_nothing() {
        let cx = new_context();
        cx.expect_that(&17, &Equals(17));
        assert_eq!(cx.failure_records(), vec![]);
    }

    #[test]
    fn unmatched_expectation_records_and_continues() {
        let cx = new_context();
        cx.expect_that(&17, &Equals(19));
        cx.expect_that(&17, &Equals(17));

        let records = cx.failure_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "context.rs");
        assert!(records[0].line_number > 0);
        assert_eq!(records[0].generated_message, "Expected: 19\nActual:   17");
        assert_eq!(records[0].user_message, "");
    }

    #[test]
    fn indeterminate_match_appends_detail_clause() {
        let cx = new_context();
        cx.expect_that(&17, &NeverNumeric);

        let records = cx.failure_records();
        assert_eq!(
            records[0].generated_message,
            "Expected: \"taco\"\nActual:   17, which is not numeric"
        );
    }

    #[test]
    fn user_message_is_captured() {
        let cx = new_context();
        cx.expect_that_with(&17, &Equals(19), format_args!("while processing user {}", 12));
        assert_eq!(cx.failure_records()[0].user_message, "while processing user 12");
    }

    #[test]
    fn add_failure_uses_the_call_site() {
        let cx = new_context();
        cx.add_failure("oh dear");

        let records = cx.failure_records();
        assert_eq!(records[0].file_name, "context.rs");
        assert_eq!(records[0].generated_message, "oh dear");
    }

    #[test]
    fn failed_assertion_panics_with_the_abort_sentinel() {
        let cx = new_context();
        let payload = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            cx.assert_that(&17, &Equals(19));
        }))
        .unwrap_err();

        assert!(payload.is::<TestAbort>());
        assert_eq!(cx.failure_records().len(), 1);
    }

    #[test]
    fn passing_assertion_does_not_abort() {
        let cx = new_context();
        cx.assert_that(&17, &Equals(17));
        assert_eq!(cx.failure_records(), vec![]);
    }

    #[test]
    fn failure_output_format() {
        let records = vec![
            FailureRecord {
                file_name: "widget.rs".to_owned(),
                line_number: 52,
                generated_message: "Expected: 17.5\nActual:   17".to_owned(),
                user_message: String::new(),
            },
            FailureRecord {
                file_name: "widget.rs".to_owned(),
                line_number: 53,
                generated_message: "Expected: 19\nActual:   17".to_owned(),
                user_message: "foo bar: 112".to_owned(),
            },
        ];

        let output = String::from_utf8(format_failure_output(&records)).unwrap();
        assert_eq!(
            output,
            "widget.rs:52:\nExpected: 17.5\nActual:   17\n\n\
             widget.rs:53:\nExpected: 19\nActual:   17\nfoo bar: 112\n"
        );
    }
}
