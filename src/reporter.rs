// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting of test results to the console.

use crate::runner::TestRunResult;
use clap::{Args, ValueEnum};
use std::{
    io::{self, IsTerminal, Write},
    time::Duration,
};
use termcolor::{BufferWriter, ColorChoice, ColorSpec, WriteColor};

/// When to color console output.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Color {
    /// Color output unconditionally.
    Always,

    /// Color output when stdout is a terminal.
    #[default]
    Auto,

    /// Never color output.
    Never,
}

impl Color {
    pub(crate) fn color_choice(self) -> ColorChoice {
        match self {
            Color::Always => ColorChoice::Always,
            Color::Auto => {
                if io::stdout().is_terminal() {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                }
            }
            Color::Never => ColorChoice::Never,
        }
    }
}

/// Reporter options.
#[derive(Debug, Default, Args)]
pub struct ReporterOpts {
    /// When to use colored output
    #[arg(long, value_enum, default_value_t)]
    pub color: Color,
}

/// A progress event emitted by the runner, in reporting order.
#[derive(Clone, Debug)]
pub enum TestEvent<'a> {
    /// A suite's tests are about to be reported.
    SuiteStarted {
        /// The suite name.
        suite_name: &'a str,
    },

    /// A test is being waited on.
    TestStarted {
        /// The suite name.
        suite_name: &'a str,
        /// The test name.
        test_name: &'a str,
    },

    /// A test finished running.
    TestFinished {
        /// The suite name.
        suite_name: &'a str,
        /// The test name.
        test_name: &'a str,
        /// Information about how the test ran.
        result: TestRunResult,
    },

    /// A suite's tests have all been reported.
    SuiteFinished {
        /// The suite name.
        suite_name: &'a str,
    },

    /// The run is exiting before reporting every scheduled test because a
    /// stop was requested.
    RunEarlyExit,
}

/// Durations below this threshold are not worth printing.
const DURATION_PRINT_THRESHOLD: Duration = Duration::from_millis(25);

/// Writes a single event to the given writer in the console format.
pub fn write_event(event: &TestEvent<'_>, mut writer: impl WriteColor) -> io::Result<()> {
    match event {
        TestEvent::SuiteStarted { suite_name } => {
            writeln!(writer, "[----------] Running tests from {suite_name}")?;
        }
        TestEvent::TestStarted {
            suite_name,
            test_name,
        } => {
            writer.set_color(&pass_spec())?;
            write!(writer, "[ RUN      ]")?;
            writer.reset()?;
            writeln!(writer, " {suite_name}.{test_name}")?;
        }
        TestEvent::TestFinished {
            suite_name,
            test_name,
            result,
        } => {
            writer.write_all(&result.output)?;

            if result.failed {
                writer.set_color(&fail_spec())?;
                write!(writer, "[  FAILED  ]")?;
            } else {
                writer.set_color(&pass_spec())?;
                write!(writer, "[       OK ]")?;
            }
            writer.reset()?;

            write!(writer, " {suite_name}.{test_name}")?;
            if result.duration >= DURATION_PRINT_THRESHOLD {
                write!(writer, " ({:?})", result.duration)?;
            }
            writeln!(writer)?;
        }
        TestEvent::SuiteFinished { suite_name } => {
            writeln!(writer, "[----------] Finished with tests from {suite_name}")?;
        }
        TestEvent::RunEarlyExit => {
            writeln!(writer, "Exiting early due to user request.")?;
        }
    }
    Ok(())
}

/// Reports test events to stdout, flushing after each event so progress is
/// visible while slow tests run.
pub struct TestReporter {
    stdout: BufferWriter,
}

impl TestReporter {
    /// Creates a new reporter with the given options.
    pub fn new(opts: ReporterOpts) -> Self {
        Self {
            stdout: BufferWriter::stdout(opts.color.color_choice()),
        }
    }

    /// Reports a single test event.
    pub fn report_event(&self, event: &TestEvent<'_>) -> io::Result<()> {
        let mut buffer = self.stdout.buffer();
        write_event(event, &mut buffer)?;
        self.stdout.print(&buffer)
    }
}

fn pass_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec
        .set_fg(Some(termcolor::Color::Green))
        .set_bold(true);
    color_spec
}

fn fail_spec() -> ColorSpec {
    let mut color_spec = ColorSpec::new();
    color_spec
        .set_fg(Some(termcolor::Color::Red))
        .set_bold(true);
    color_spec
}
