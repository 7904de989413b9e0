// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Folding converted JUnit reports into the cumulative result for a build.

use crate::{
    config::PolicyConfig, errors::AggregateError, helpers::plural, locate::locate,
    result::TestResult,
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use std::{fs::File, io::BufReader};
use tracing::debug;
use xunitnet_junit::read_test_suites;

/// Reads the JUnit reports matching `pattern` under `root` and merges them into `previous`.
///
/// `previous` is never modified: the merge happens on a copy, which is returned. If there is no
/// previous result, a new one stamped `as_of` is created.
///
/// Finding no reports is an error if `policy.fail_if_no_results` is set. Otherwise the previous
/// result (or an empty one) is returned unchanged.
pub fn aggregate(
    root: &Utf8Path,
    pattern: &str,
    previous: Option<&TestResult>,
    as_of: DateTime<FixedOffset>,
    policy: &PolicyConfig,
) -> Result<TestResult, AggregateError> {
    let reports = locate(root, pattern)?;
    if reports.is_empty() {
        if policy.fail_if_no_results {
            return Err(AggregateError::NoTestReports);
        }
        return Ok(previous
            .cloned()
            .unwrap_or_else(|| TestResult::new(as_of)));
    }

    let mut result = previous
        .cloned()
        .unwrap_or_else(|| TestResult::new(as_of));
    let mut suite_count = 0;
    for report in &reports {
        let path = root.join(report);
        let file = File::open(&path).map_err(|error| AggregateError::Open {
            path: path.clone(),
            error,
        })?;
        let suites = read_test_suites(BufReader::new(file))
            .map_err(|error| AggregateError::Read { path, error })?;
        debug!(
            "read {} {} from {report}",
            suites.len(),
            plural::suites_str(suites.len()),
        );
        for suite in &suites {
            result.merge_suite(suite);
        }
        suite_count += suites.len();
    }

    debug!(
        "aggregated {suite_count} {} from {} JUnit {}",
        plural::suites_str(suite_count),
        reports.len(),
        plural::reports_str(reports.len()),
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::FailureKind, result::ResultCounts};
    use camino_tempfile::Utf8TempDir;
    use camino_tempfile_ext::prelude::*;
    use chrono::TimeZone;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static FIRST: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <testsuite name="Calc.Tests" tests="2" failures="1" errors="0" skipped="0">
            <testcase name="Adds" classname="Calc.Tests" time="0.010"/>
            <testcase name="Divides" classname="Calc.Tests" time="0.020">
                <failure message="boom">at Calc.Divide()</failure>
            </testcase>
        </testsuite>
    "#};

    static SECOND: &str = indoc! {r#"
        <testsuites>
            <testsuite name="Calc.Tests">
                <testcase name="Divides" classname="Calc.Tests" time="0.020"/>
            </testsuite>
            <testsuite name="Other.Tests">
                <testcase name="Later" classname="Other.Tests">
                    <skipped message="not now"/>
                </testcase>
            </testsuite>
        </testsuites>
    "#};

    fn as_of() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 26, 16, 3, 9)
            .unwrap()
    }

    fn policy(fail_if_no_results: bool) -> PolicyConfig {
        PolicyConfig {
            pattern: "**/*.xml".to_owned(),
            fail_if_no_results,
            failed_tests_fail_build: false,
        }
    }

    #[test]
    fn new_result_is_stamped() {
        let dir = Utf8TempDir::new().unwrap();
        dir.child("out/TEST-1.xml").write_str(FIRST).unwrap();

        let result = aggregate(dir.path(), "out/TEST-*.xml", None, as_of(), &policy(true))
            .expect("aggregation succeeds");
        assert_eq!(result.timestamp(), Some(as_of()));
        assert_eq!(
            result.counts(),
            ResultCounts {
                total: 2,
                passed: 1,
                failed: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn merge_is_additive() {
        let dir = Utf8TempDir::new().unwrap();
        dir.child("first/TEST-1.xml").write_str(FIRST).unwrap();
        dir.child("second/TEST-1.xml").write_str(SECOND).unwrap();

        let first = aggregate(dir.path(), "first/*.xml", None, as_of(), &policy(true))
            .expect("first aggregation succeeds");
        let second = aggregate(
            dir.path(),
            "second/*.xml",
            Some(&first),
            as_of(),
            &policy(true),
        )
        .expect("second aggregation succeeds");

        // The previous snapshot is untouched.
        assert_eq!(first.counts().total, 2);

        // Divides re-appeared and passed this time, Later is new.
        assert_eq!(
            second.counts(),
            ResultCounts {
                total: 3,
                passed: 2,
                failed: 0,
                skipped: 1
            }
        );
        let names: Vec<_> = second.suites().map(|suite| suite.name()).collect();
        assert_eq!(names, vec!["Calc.Tests", "Other.Tests"]);
    }

    #[test]
    fn no_reports() {
        let dir = Utf8TempDir::new().unwrap();

        let error = aggregate(dir.path(), "*.xml", None, as_of(), &policy(true))
            .expect_err("no reports fails");
        assert!(matches!(error, AggregateError::NoTestReports), "{error:?}");
        assert_eq!(error.kind(), FailureKind::Configuration);
        assert_eq!(
            error.to_string(),
            "No test report files were found or the XUnit input XML file contained no tests."
        );

        let result = aggregate(dir.path(), "*.xml", None, as_of(), &policy(false))
            .expect("allowed when not failing");
        assert!(result.counts().is_empty());
    }

    #[test]
    fn failure_leaves_previous_untouched() {
        let dir = Utf8TempDir::new().unwrap();
        dir.child("good/TEST-1.xml").write_str(FIRST).unwrap();
        dir.child("bad/TEST-1.xml").write_str(SECOND).unwrap();
        dir.child("bad/TEST-2.xml")
            .write_str("<testsuite><testcase></testsuite>")
            .unwrap();

        let previous = aggregate(dir.path(), "good/*.xml", None, as_of(), &policy(true))
            .expect("aggregation succeeds");
        let snapshot = previous.clone();
        let error = aggregate(
            dir.path(),
            "bad/*.xml",
            Some(&previous),
            as_of(),
            &policy(true),
        )
        .expect_err("malformed report fails");
        assert_eq!(error.kind(), FailureKind::Parse);
        assert_eq!(previous, snapshot);
    }

    #[test]
    fn doctype_is_screened() {
        let dir = Utf8TempDir::new().unwrap();
        dir.child("TEST-1.xml")
            .write_str(indoc! {r#"
                <!DOCTYPE testsuite SYSTEM "http://127.0.0.1:1/evil.dtd">
                <testsuite name="x"/>
            "#})
            .unwrap();

        let error = aggregate(dir.path(), "*.xml", None, as_of(), &policy(true))
            .expect_err("external DTD is rejected");
        assert_eq!(error.kind(), FailureKind::SecurityRejection);
    }
}
