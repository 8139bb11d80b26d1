// Copyright (c) The suiterunner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The matcher contract consumed by expectations and assertions.
//!
//! Matcher libraries are external to the harness; any predicate object that
//! implements [`Matcher`] can be used with
//! [`TestContext::expect_that`](crate::context::TestContext::expect_that) and
//! friends. The harness only depends on the ternary match outcome and the
//! human-readable description.

/// The result of evaluating a matcher against a candidate value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchOutcome {
    /// The candidate matched.
    Matched,

    /// The candidate did not match.
    Unmatched {
        /// Additional detail about the mismatch, appended to the failure
        /// message as a relative clause when present.
        detail: Option<String>,
    },

    /// The matcher could not be evaluated against the candidate, for example
    /// because the candidate has an incompatible shape.
    ///
    /// Treated as a failure, like [`MatchOutcome::Unmatched`].
    Indeterminate {
        /// Detail explaining why the match was indeterminate.
        detail: Option<String>,
    },
}

impl MatchOutcome {
    /// Returns true if the candidate matched.
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched)
    }
}

/// A predicate with a description, evaluated against candidate values of
/// type `T`.
pub trait Matcher<T: ?Sized> {
    /// Evaluates this matcher against the candidate.
    fn matches(&self, candidate: &T) -> MatchOutcome;

    /// Returns a description of the matched-value set, used as the
    /// "Expected:" line of failure messages.
    fn description(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IsEven;

    impl Matcher<i64> for IsEven {
        fn matches(&self, candidate: &i64) -> MatchOutcome {
            if candidate % 2 == 0 {
                MatchOutcome::Matched
            } else {
                MatchOutcome::Unmatched { detail: None }
            }
        }

        fn description(&self) -> String {
            "an even number".to_owned()
        }
    }

    #[test]
    fn outcome_is_match() {
        assert!(IsEven.matches(&4).is_match());
        assert!(!IsEven.matches(&5).is_match());
        assert!(
            !MatchOutcome::Indeterminate {
                detail: Some("which is not numeric".to_owned())
            }
            .is_match()
        );
    }
}
