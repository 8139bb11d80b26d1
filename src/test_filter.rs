// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering of tests by name.

use crate::errors::FilterPatternError;
use regex::Regex;

/// A filter for tests, matched against `"SuiteName.TestName"` strings.
///
/// The pattern is an unanchored regular expression; an empty pattern matches
/// every test.
#[derive(Clone, Debug)]
pub struct TestFilter {
    pattern: Regex,
}

impl TestFilter {
    /// Creates a new `TestFilter` from the given pattern.
    ///
    /// `None` is equivalent to the empty pattern and matches all tests.
    pub fn new(pattern: Option<&str>) -> Result<Self, FilterPatternError> {
        let pattern = pattern.unwrap_or("");
        let pattern = Regex::new(pattern).map_err(|source| FilterPatternError {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self { pattern })
    }

    /// Creates a new `TestFilter` that matches every test.
    pub fn any() -> Self {
        Self {
            pattern: Regex::new("").expect("empty pattern is valid"),
        }
    }

    /// Returns true if the given test matches this filter.
    pub fn is_match(&self, suite_name: &str, test_name: &str) -> bool {
        self.pattern
            .is_match(&format!("{suite_name}.{test_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_and_missing_patterns_match_all() {
        for filter in [TestFilter::new(None).unwrap(), TestFilter::any()] {
            assert!(filter.is_match("FooTest", "DoesBar"));
            assert!(filter.is_match("", ""));
        }
    }

    #[test]
    fn pattern_is_unanchored() {
        let filter = TestFilter::new(Some("Bar")).unwrap();
        assert!(filter.is_match("FooTest", "DoesBar"));
        assert!(filter.is_match("BarTest", "DoesFoo"));
        assert!(!filter.is_match("FooTest", "DoesBaz"));
    }

    #[test]
    fn suite_prefix_pattern() {
        let filter = TestFilter::new(Some(r"^FooTest\.")).unwrap();
        assert!(filter.is_match("FooTest", "DoesBar"));
        assert!(!filter.is_match("OtherFooTest", "DoesBar"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = TestFilter::new(Some("(")).unwrap_err();
        assert_eq!(err.pattern(), "(");
    }

    proptest! {
        // Any test matches a filter built from its own escaped full name.
        #[test]
        fn proptest_exact(suite_name in "[A-Za-z0-9_]{1,12}", test_name in "[A-Za-z0-9_]{1,12}") {
            let full_name = format!("{suite_name}.{test_name}");
            let filter = TestFilter::new(Some(&regex::escape(&full_name))).unwrap();
            prop_assert!(filter.is_match(&suite_name, &test_name));
        }

        #[test]
        fn proptest_empty(suite_name in any::<String>(), test_name in any::<String>()) {
            let filter = TestFilter::new(None).unwrap();
            prop_assert!(filter.is_match(&suite_name, &test_name));
        }
    }
}
