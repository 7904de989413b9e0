// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deciding the build status from an aggregated result.

use crate::{config::PolicyConfig, result::TestResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic produced when none of the reports contained a result.
pub static NO_RESULTS_MESSAGE: &str = "None of the test reports contained any result";

/// The status of a build.
///
/// Ordered from best to worst. A status can only get worse over the life of a build.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatus {
    /// No problems so far.
    #[default]
    Success,

    /// Some tests failed.
    Unstable,

    /// The build failed.
    Failure,
}

impl BuildStatus {
    /// Applies `change`, never improving the status.
    pub fn apply(self, change: StatusChange) -> Self {
        match change {
            StatusChange::Unchanged => self,
            StatusChange::DowngradeTo(status) => self.max(status),
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Unstable => write!(f, "unstable"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// A requested change to the build status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusChange {
    /// Leave the status as it is.
    Unchanged,

    /// Move the status to at least the given status.
    DowngradeTo(BuildStatus),
}

/// The outcome of [`decide`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decision {
    /// How the build status should change.
    pub change: StatusChange,

    /// Whether the step must stop without recording the result.
    pub must_abort: bool,

    /// A message explaining the decision, if any.
    pub diagnostic: Option<&'static str>,
}

/// Decides how `result` affects the build status under `policy`.
pub fn decide(result: &TestResult, policy: &PolicyConfig) -> Decision {
    let counts = result.counts();
    if policy.fail_if_no_results && counts.is_empty() {
        return Decision {
            change: StatusChange::DowngradeTo(BuildStatus::Failure),
            must_abort: true,
            diagnostic: Some(NO_RESULTS_MESSAGE),
        };
    }

    let change = if counts.failed == 0 {
        StatusChange::Unchanged
    } else if policy.failed_tests_fail_build {
        StatusChange::DowngradeTo(BuildStatus::Failure)
    } else {
        StatusChange::DowngradeTo(BuildStatus::Unstable)
    };
    Decision {
        change,
        must_abort: false,
        diagnostic: None,
    }
}
