// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Suite registration and listing.
//!
//! Suites are assembled with [`SuiteBuilder`] and collected in a
//! [`SuiteRegistry`], which the run entry points consume. Registries are
//! plain values rather than process globals, so hosts (and the harness's own
//! tests) can build as many independent ones as they like.

use crate::{context::TestContext, mocks::MockControllerFactory, output::OutputFormat, test_filter::TestFilter};
use serde::Serialize;
use std::{
    io::{self, Write},
    sync::Arc,
};
use termcolor::{ColorSpec, WriteColor};

/// A callback invoked with the running test's context. Used for test bodies
/// as well as setup and teardown phases.
pub type TestCallback = Arc<dyn Fn(&TestContext) + Send + Sync>;

/// One schedulable test: a named body plus its bound lifecycle callbacks.
///
/// Immutable once built. The scheduler references test functions in place;
/// it never copies them.
pub struct TestFunction {
    name: String,
    set_up: Option<TestCallback>,
    run: TestCallback,
    tear_down: Option<TestCallback>,
    mock_factory: Option<MockControllerFactory>,
}

impl TestFunction {
    /// Returns the name of this test within its suite.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_up(&self) -> Option<&TestCallback> {
        self.set_up.as_ref()
    }

    pub(crate) fn run(&self) -> &TestCallback {
        &self.run
    }

    pub(crate) fn tear_down(&self) -> Option<&TestCallback> {
        self.tear_down.as_ref()
    }

    pub(crate) fn mock_factory(&self) -> Option<&MockControllerFactory> {
        self.mock_factory.as_ref()
    }
}

/// A named group of test functions sharing optional setup and teardown.
pub struct TestSuite {
    name: String,
    test_functions: Vec<TestFunction>,
}

impl TestSuite {
    /// Returns the suite name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the suite's test functions in declaration order.
    pub fn test_functions(&self) -> &[TestFunction] {
        &self.test_functions
    }
}

/// Builds a [`TestSuite`], binding the suite's setup and teardown callbacks
/// to every test declared on it.
///
/// ```
/// use suiterunner::registry::SuiteBuilder;
///
/// let suite = SuiteBuilder::new("WidgetTest")
///     .set_up(|_cx| { /* runs before each test */ })
///     .test("CreatesWidget", |_cx| { /* the test body */ })
///     .tear_down(|_cx| { /* runs after each test */ })
///     .build();
/// assert_eq!(suite.test_functions().len(), 1);
/// ```
pub struct SuiteBuilder {
    name: String,
    set_up: Option<TestCallback>,
    tear_down: Option<TestCallback>,
    mock_factory: Option<MockControllerFactory>,
    tests: Vec<(String, TestCallback)>,
}

impl SuiteBuilder {
    /// Starts a new suite with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            set_up: None,
            tear_down: None,
            mock_factory: None,
            tests: Vec::new(),
        }
    }

    /// Sets the callback run before each test in this suite.
    pub fn set_up(mut self, set_up: impl Fn(&TestContext) + Send + Sync + 'static) -> Self {
        self.set_up = Some(Arc::new(set_up));
        self
    }

    /// Sets the callback run after each test in this suite. Teardown runs
    /// unconditionally, including after setup or body failures.
    pub fn tear_down(mut self, tear_down: impl Fn(&TestContext) + Send + Sync + 'static) -> Self {
        self.tear_down = Some(Arc::new(tear_down));
        self
    }

    /// Sets the factory used to create a mock controller for each test.
    pub fn mock_controller(
        mut self,
        factory: impl Fn() -> Arc<dyn crate::mocks::MockController> + Send + Sync + 'static,
    ) -> Self {
        self.mock_factory = Some(Arc::new(factory));
        self
    }

    /// Declares a test. Tests run in declaration order as far as reporting
    /// is concerned, though they may execute concurrently.
    pub fn test(mut self, name: impl Into<String>, body: impl Fn(&TestContext) + Send + Sync + 'static) -> Self {
        self.tests.push((name.into(), Arc::new(body)));
        self
    }

    /// Finalizes the suite.
    pub fn build(self) -> TestSuite {
        let test_functions = self
            .tests
            .into_iter()
            .map(|(name, run)| TestFunction {
                name,
                set_up: self.set_up.clone(),
                run,
                tear_down: self.tear_down.clone(),
                mock_factory: self.mock_factory.clone(),
            })
            .collect();
        TestSuite {
            name: self.name,
            test_functions,
        }
    }
}

/// An ordered collection of registered suites.
///
/// Suites are reported in registration order, so the order of
/// [`register`](Self::register) calls is meaningful.
#[derive(Default)]
pub struct SuiteRegistry {
    suites: Vec<TestSuite>,
}

/// Serializable view of a registered suite, used by the JSON list formats.
#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct SuiteListEntry<'a> {
    name: &'a str,
    tests: Vec<TestListEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct TestListEntry<'a> {
    name: &'a str,
    matches_filter: bool,
}

impl SuiteRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a suite. Suites run and report in registration order.
    pub fn register(&mut self, suite: TestSuite) {
        self.suites.push(suite);
    }

    /// Returns the registered suites in registration order.
    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Returns the total number of registered tests across all suites.
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|suite| suite.test_functions.len()).sum()
    }

    /// Writes the registered tests to the given writer in the requested
    /// format, marking tests that do not match the filter as skipped.
    pub fn write_list(
        &self,
        filter: &TestFilter,
        format: OutputFormat,
        mut writer: impl WriteColor,
    ) -> io::Result<()> {
        match format {
            OutputFormat::Plain => self.write_list_plain(filter, &mut writer),
            OutputFormat::Json => {
                serde_json::to_writer(&mut writer, &self.list_entries(filter)).map_err(io::Error::from)
            }
            OutputFormat::JsonPretty => {
                serde_json::to_writer_pretty(&mut writer, &self.list_entries(filter))
                    .map_err(io::Error::from)
            }
        }
    }

    fn list_entries<'a>(&'a self, filter: &TestFilter) -> Vec<SuiteListEntry<'a>> {
        self.suites
            .iter()
            .map(|suite| SuiteListEntry {
                name: &suite.name,
                tests: suite
                    .test_functions
                    .iter()
                    .map(|tf| TestListEntry {
                        name: &tf.name,
                        matches_filter: filter.is_match(&suite.name, &tf.name),
                    })
                    .collect(),
            })
            .collect()
    }

    fn write_list_plain(&self, filter: &TestFilter, writer: &mut impl WriteColor) -> io::Result<()> {
        for suite in &self.suites {
            writer.set_color(&suite_name_spec())?;
            write!(writer, "{}", suite.name)?;
            writer.reset()?;
            writeln!(writer, ":")?;

            for tf in &suite.test_functions {
                writer.set_color(&test_name_spec())?;
                write!(writer, "    {}", tf.name)?;
                writer.reset()?;

                if !filter.is_match(&suite.name, &tf.name) {
                    write!(writer, " (skipped)")?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn suite_name_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec
        .set_fg(Some(termcolor::Color::Magenta))
        .set_bold(true);
    color_spec
}

pub(crate) fn test_name_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec
        .set_fg(Some(termcolor::Color::Blue))
        .set_bold(true);
    color_spec
}
