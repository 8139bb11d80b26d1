// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Output formats for listing registered tests.

use clap::ValueEnum;
use std::fmt;

/// The format used by [`SuiteRegistry::write_list`](crate::registry::SuiteRegistry::write_list).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Indented human-readable text.
    #[default]
    Plain,

    /// Compact JSON.
    Json,

    /// Pretty-printed JSON.
    JsonPretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonPretty => write!(f, "json-pretty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_clap_value_names() {
        for format in OutputFormat::value_variants() {
            let rendered = format.to_string();
            let parsed = OutputFormat::from_str(&rendered, false).expect("value round-trips");
            assert_eq!(*format, parsed);
        }
    }
}
