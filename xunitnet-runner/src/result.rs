// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cumulative test result recorded for a build.

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use xunitnet_junit::{TestCase, TestCaseStatus, TestSuite};

/// The test results accumulated over a build, keyed by suite name and then by classname and test
/// name.
///
/// Counts are always computed from the individual test cases, so at every level the number of
/// passed, failed and skipped tests adds up to the total.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestResult {
    timestamp: Option<DateTime<FixedOffset>>,
    suites: IndexMap<String, SuiteResult>,
}

impl TestResult {
    /// Creates an empty result stamped with `as_of`.
    pub fn new(as_of: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp: Some(as_of),
            suites: IndexMap::new(),
        }
    }

    /// Returns the time this result was created as of.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp
    }

    /// Returns the suites in the order they were first seen.
    pub fn suites(&self) -> impl ExactSizeIterator<Item = &SuiteResult> + '_ {
        self.suites.values()
    }

    /// Returns the suite with the given name.
    pub fn suite(&self, name: &str) -> Option<&SuiteResult> {
        self.suites.get(name)
    }

    /// Merges a JUnit test suite into this result.
    ///
    /// Suites with the same name are combined. A test case that was already recorded (same
    /// classname and name) is replaced by the newer one.
    pub fn merge_suite(&mut self, suite: &TestSuite) {
        let entry = self
            .suites
            .entry(suite.name.clone())
            .or_insert_with(|| SuiteResult::new(suite.name.clone()));
        for test_case in &suite.test_cases {
            let case = CaseResult::from_junit(test_case);
            entry.cases.insert(case.key(), case);
        }
    }

    /// Returns the counts over all suites.
    pub fn counts(&self) -> ResultCounts {
        self.suites.values().map(SuiteResult::counts).sum()
    }

    /// Returns the total duration of all test cases.
    pub fn duration(&self) -> Duration {
        self.suites.values().map(SuiteResult::duration).sum()
    }
}

/// The results for one suite.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SuiteResult {
    name: String,
    #[serde(with = "case_list")]
    cases: IndexMap<CaseKey, CaseResult>,
}

/// Identifies a test case within a suite.
type CaseKey = (Option<String>, String);

/// Stores the cases of a suite as a list, since their keys are not strings.
mod case_list {
    use super::{CaseKey, CaseResult};
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        cases: &IndexMap<CaseKey, CaseResult>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(cases.values())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<CaseKey, CaseResult>, D::Error> {
        let cases = Vec::<CaseResult>::deserialize(deserializer)?;
        Ok(cases.into_iter().map(|case| (case.key(), case)).collect())
    }
}

impl SuiteResult {
    fn new(name: String) -> Self {
        Self {
            name,
            cases: IndexMap::new(),
        }
    }

    /// Returns the name of the suite.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the test cases in the order they were first seen.
    pub fn cases(&self) -> impl ExactSizeIterator<Item = &CaseResult> + '_ {
        self.cases.values()
    }

    /// Returns the counts for this suite.
    pub fn counts(&self) -> ResultCounts {
        self.cases.values().map(CaseResult::counts).sum()
    }

    /// Returns the total duration of the test cases in this suite.
    pub fn duration(&self) -> Duration {
        self.cases.values().filter_map(|case| case.duration).sum()
    }
}

/// The result of one test case.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CaseResult {
    /// The name of the test.
    pub name: String,

    /// The class or type the test belongs to.
    pub classname: Option<String>,

    /// How long the test took.
    pub duration: Option<Duration>,

    /// The outcome of the test.
    pub status: CaseStatus,
}

impl CaseResult {
    fn from_junit(test_case: &TestCase) -> Self {
        let status = match &test_case.status {
            TestCaseStatus::Success => CaseStatus::Passed,
            TestCaseStatus::NonSuccess {
                message,
                description,
                ..
            } => CaseStatus::Failed {
                message: message.clone(),
                details: description.clone(),
            },
            TestCaseStatus::Skipped { message, .. } => CaseStatus::Skipped {
                message: message.clone(),
            },
        };
        Self {
            name: test_case.name.clone(),
            classname: test_case.classname.clone(),
            duration: test_case.time,
            status,
        }
    }

    fn key(&self) -> CaseKey {
        (self.classname.clone(), self.name.clone())
    }

    /// Returns the name of the test qualified with its classname, for display.
    pub fn display_name(&self) -> String {
        match &self.classname {
            Some(classname) => format!("{classname}#{}", self.name),
            None => self.name.clone(),
        }
    }

    fn counts(&self) -> ResultCounts {
        let mut counts = ResultCounts {
            total: 1,
            ..ResultCounts::default()
        };
        match self.status {
            CaseStatus::Passed => counts.passed = 1,
            CaseStatus::Failed { .. } => counts.failed = 1,
            CaseStatus::Skipped { .. } => counts.skipped = 1,
        }
        counts
    }
}

/// The outcome of one test case.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CaseStatus {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed {
        /// The failure message.
        message: Option<String>,

        /// Details such as a stack trace.
        details: Option<String>,
    },

    /// The test was not run.
    Skipped {
        /// Why the test was skipped.
        message: Option<String>,
    },
}

/// Test counts for a result, suite or case.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultCounts {
    /// The number of tests.
    pub total: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,
}

impl ResultCounts {
    /// Returns true if there are no tests at all.
    pub fn is_empty(&self) -> bool {
        self.passed == 0 && self.failed == 0 && self.skipped == 0
    }
}

impl std::ops::Add for ResultCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
        }
    }
}

impl std::iter::Sum for ResultCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}
