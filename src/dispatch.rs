// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line options for hosts embedding the harness.
//!
//! A host binary builds its registry, parses `Opts`, and hands control to
//! [`Opts::exec`]:
//!
//! ```no_run
//! use clap::Parser;
//! use suiterunner::{dispatch::Opts, registry::SuiteRegistry};
//!
//! fn main() {
//!     let registry = SuiteRegistry::new();
//!     // ... register suites ...
//!     let code = Opts::parse().exec(&registry).unwrap_or_else(|err| {
//!         eprintln!("{err}");
//!         2
//!     });
//!     std::process::exit(code);
//! }
//! ```

use crate::{
    errors::RunError,
    output::OutputFormat,
    registry::SuiteRegistry,
    reporter::ReporterOpts,
    run::run_tests,
    runner::TestRunnerOpts,
    test_filter::TestFilter,
};
use clap::{Args, Parser};

/// Runs registered test suites and reports the results.
#[derive(Debug, Parser)]
#[command(name = "suiterunner")]
pub enum Opts {
    /// List registered tests
    List {
        /// Output format
        #[arg(short = 'T', long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Filter options.
        #[command(flatten)]
        filter_opts: TestFilterOpts,
    },
    /// Run tests
    Run {
        /// Filter options.
        #[command(flatten)]
        filter_opts: TestFilterOpts,

        /// Runner options.
        #[command(flatten)]
        runner_opts: TestRunnerOpts,

        /// Reporter options.
        #[command(flatten)]
        reporter_opts: ReporterOpts,
    },
}

/// Options selecting which tests to run.
#[derive(Debug, Default, Args)]
pub struct TestFilterOpts {
    /// Regular expression matched against `Suite.Test` names
    #[arg(long)]
    pub run: Option<String>,
}

impl Opts {
    /// Executes the selected command against the given registry, returning
    /// the process exit code.
    pub fn exec(self, registry: &SuiteRegistry) -> Result<i32, RunError> {
        match self {
            Opts::List {
                format,
                filter_opts,
            } => {
                let filter = TestFilter::new(filter_opts.run.as_deref())?;
                let stdout = termcolor::BufferWriter::stdout(termcolor::ColorChoice::Auto);
                let mut buffer = stdout.buffer();
                registry
                    .write_list(&filter, format, &mut buffer)
                    .map_err(RunError::Report)?;
                stdout.print(&buffer).map_err(RunError::Report)?;
                Ok(0)
            }
            Opts::Run {
                filter_opts,
                runner_opts,
                reporter_opts,
            } => run_tests(
                registry,
                filter_opts.run.as_deref(),
                runner_opts,
                reporter_opts,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_options() {
        let opts = Opts::parse_from([
            "suiterunner",
            "run",
            "--run",
            "^FooTest\\.",
            "--parallelism",
            "4",
            "--stop-early",
        ]);
        match opts {
            Opts::Run {
                filter_opts,
                runner_opts,
                ..
            } => {
                assert_eq!(filter_opts.run.as_deref(), Some("^FooTest\\."));
                assert_eq!(runner_opts.parallelism.get(), 4);
                assert!(runner_opts.stop_early);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parallelism_defaults_to_16() {
        let opts = Opts::parse_from(["suiterunner", "run"]);
        match opts {
            Opts::Run { runner_opts, .. } => {
                assert_eq!(runner_opts.parallelism.get(), 16);
                assert!(!runner_opts.stop_early);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_list_format() {
        let opts = Opts::parse_from(["suiterunner", "list", "-T", "json-pretty"]);
        match opts {
            Opts::List { format, .. } => assert_eq!(format, OutputFormat::JsonPretty),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
