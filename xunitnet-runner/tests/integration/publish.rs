// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use indoc::formatdoc;
use pretty_assertions::assert_eq;
use xunitnet_metadata::XunitnetExitCode;
use xunitnet_runner::{
    decision::BuildStatus,
    errors::{FailureKind, PublishError},
    observer::CollectingObserver,
    result::{CaseStatus, ResultCounts},
    worker::LocalWorker,
};

#[test]
fn publish_records_results() -> Result<()> {
    let env = TestEnv::new();
    env.write("Calc/TestResults/calc.xml", V2_MIXED);
    env.write("Legacy/TestResults/legacy.xml", V1_PASSING);
    env.write("Legacy/notes.txt", "not a report");

    let mut observer = CollectingObserver::new();
    let outcome = publisher("1", policy("**/TestResults/*.xml")).perform(
        env.workspace.path(),
        &env.store,
        &LocalWorker,
        &mut observer,
    )?;

    assert_eq!(outcome.status, BuildStatus::Unstable);
    assert!(outcome.summary.found);
    assert_eq!(outcome.summary.file_count, 2);
    assert_eq!(
        outcome.counts,
        ResultCounts {
            total: 5,
            passed: 3,
            failed: 1,
            skipped: 1,
        }
    );
    assert!(!observer.has_fatal_error());

    let record = env.store.read("1")?.expect("record was written");
    assert_eq!(record.status, BuildStatus::Unstable);
    assert_eq!(record.started_at, started_at());
    let result = record.test_result.expect("result was recorded");
    assert_eq!(result.timestamp(), Some(started_at()));

    let mut suite_names: Vec<_> = result.suites().map(|suite| suite.name()).collect();
    suite_names.sort_unstable();
    assert_eq!(
        suite_names,
        vec!["Adding", "Dividing", "Legacy.Tests.Parsing"]
    );

    let by_zero = result
        .suite("Dividing")
        .and_then(|suite| suite.cases().find(|case| case.name == "ByZero"))
        .expect("ByZero was recorded");
    assert_eq!(by_zero.classname.as_deref(), Some("Calc.Tests.Dividing"));
    assert_eq!(
        by_zero.status,
        CaseStatus::Failed {
            message: Some("Attempted to divide by zero.".to_owned()),
            details: Some("at Calc.Divider.Divide(Int32 a, Int32 b)".to_owned()),
        }
    );

    // The temporary JUnit directory is gone.
    assert_eq!(env.top_level_entries(), vec!["Calc", "Legacy"]);
    Ok(())
}

#[test]
fn results_accumulate_across_steps() -> Result<()> {
    let env = TestEnv::new();
    env.write("first/calc.xml", V2_MIXED);
    env.write("second/legacy.xml", V1_PASSING);

    let mut observer = CollectingObserver::new();
    let first = publisher("7", policy("first/*.xml")).perform(
        env.workspace.path(),
        &env.store,
        &LocalWorker,
        &mut observer,
    )?;
    assert_eq!(first.status, BuildStatus::Unstable);
    assert_eq!(first.counts.total, 3);

    let second = publisher("7", policy("second/*.xml")).perform(
        env.workspace.path(),
        &env.store,
        &LocalWorker,
        &mut observer,
    )?;
    // The status never improves, even though the second step only had passing tests.
    assert_eq!(second.status, BuildStatus::Unstable);
    assert_eq!(
        second.counts,
        ResultCounts {
            total: 5,
            passed: 3,
            failed: 1,
            skipped: 1,
        }
    );

    // Publishing the same reports again replaces the earlier results rather than adding to them.
    let third = publisher("7", policy("second/*.xml")).perform(
        env.workspace.path(),
        &env.store,
        &LocalWorker,
        &mut observer,
    )?;
    assert_eq!(third.counts.total, 5);
    Ok(())
}

#[test]
fn failed_tests_can_fail_the_build() -> Result<()> {
    let env = TestEnv::new();
    env.write("calc.xml", V2_MIXED);

    let mut policy = policy("*.xml");
    policy.failed_tests_fail_build = true;
    let outcome = publisher("1", policy).perform(
        env.workspace.path(),
        &env.store,
        &LocalWorker,
        &mut CollectingObserver::new(),
    )?;
    assert_eq!(outcome.status, BuildStatus::Failure);
    Ok(())
}

#[test]
fn no_reports_fails_the_build() -> Result<()> {
    let env = TestEnv::new();
    env.write("other/readme.md", "nothing here");

    let mut observer = CollectingObserver::new();
    let error = publisher("1", policy("**/*.xml"))
        .perform(env.workspace.path(), &env.store, &LocalWorker, &mut observer)
        .expect_err("no reports is an error");

    assert!(matches!(error, PublishError::NoReportsFound), "{error:?}");
    assert_eq!(
        error.to_string(),
        "No XUnit test report files were found. Configuration error?"
    );
    assert_eq!(error.process_exit_code(), XunitnetExitCode::NO_TEST_RESULTS);
    assert!(observer.has_fatal_error());

    let record = env.store.read("1")?.expect("failure was recorded");
    assert_eq!(record.status, BuildStatus::Failure);
    assert_eq!(record.test_result, None);
    Ok(())
}

#[test]
fn no_reports_allowed() -> Result<()> {
    let env = TestEnv::new();

    let mut policy = policy("**/*.xml");
    policy.fail_if_no_results = false;
    let mut observer = CollectingObserver::new();
    let outcome = publisher("1", policy).perform(
        env.workspace.path(),
        &env.store,
        &LocalWorker,
        &mut observer,
    )?;

    assert_eq!(outcome.status, BuildStatus::Success);
    assert!(!outcome.summary.found);
    assert!(!observer.has_fatal_error());
    assert_eq!(
        observer
            .diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.message.as_str())
            .collect::<Vec<_>>(),
        vec![
            "Recording XUnit tests results",
            "No XUnit test report files were found."
        ]
    );
    Ok(())
}

#[test]
fn reports_without_collections() -> Result<()> {
    let env = TestEnv::new();
    env.write("empty.xml", V2_NO_COLLECTIONS);

    let error = publisher("1", policy("*.xml"))
        .perform(
            env.workspace.path(),
            &env.store,
            &LocalWorker,
            &mut CollectingObserver::new(),
        )
        .expect_err("no JUnit reports were produced");
    assert_eq!(
        error.to_string(),
        "No test report files were found or the XUnit input XML file contained no tests."
    );
    assert!(error.is_missing_results());

    let record = env.store.read("1")?.expect("failure was recorded");
    assert_eq!(record.status, BuildStatus::Failure);
    assert_eq!(env.top_level_entries(), vec!["empty.xml"]);
    Ok(())
}

#[test]
fn reports_without_results() -> Result<()> {
    let env = TestEnv::new();
    env.write("empty.xml", V2_EMPTY_COLLECTION);

    let mut observer = CollectingObserver::new();
    let error = publisher("1", policy("*.xml"))
        .perform(env.workspace.path(), &env.store, &LocalWorker, &mut observer)
        .expect_err("empty results fail the step");
    assert_eq!(
        error.to_string(),
        "None of the test reports contained any result"
    );
    assert_eq!(error.process_exit_code(), XunitnetExitCode::NO_TEST_RESULTS);
    assert!(observer.has_fatal_error());

    // The status is recorded, but the empty result is not.
    let record = env.store.read("1")?.expect("failure was recorded");
    assert_eq!(record.status, BuildStatus::Failure);
    assert_eq!(record.test_result, None);
    Ok(())
}

#[test]
fn external_entity_is_rejected() -> Result<()> {
    let env = TestEnv::new();
    let secret_path = env.workspace.path().join("secret.txt");
    env.write("secret.txt", "TOP-SECRET-CONTENT");
    env.write("good.xml", V1_PASSING);
    env.write(
        "xxe.xml",
        &formatdoc! {r#"
            <?xml version="1.0"?>
            <!DOCTYPE assemblies [
              <!ENTITY secret SYSTEM "file://{secret_path}">
            ]>
            <assemblies>
              <assembly name="&secret;">
                <collection name="c"><test name="t" type="T" result="Pass" /></collection>
              </assembly>
            </assemblies>
        "#},
    );

    let error = publisher("1", policy("*.xml"))
        .perform(
            env.workspace.path(),
            &env.store,
            &LocalWorker,
            &mut CollectingObserver::new(),
        )
        .expect_err("external entity is rejected");
    assert_eq!(error.kind(), FailureKind::SecurityRejection);
    assert_eq!(
        error.process_exit_code(),
        XunitnetExitCode::SECURITY_REJECTION
    );
    let mut chain = String::new();
    let mut source: Option<&dyn std::error::Error> = Some(&error);
    while let Some(error) = source {
        chain.push_str(&error.to_string());
        source = error.source();
    }
    assert!(!chain.contains("TOP-SECRET-CONTENT"), "{chain}");

    // Nothing was recorded, and no converted reports were left behind.
    assert_eq!(env.store.read("1")?, None);
    assert_eq!(
        env.top_level_entries(),
        vec!["good.xml", "secret.txt", "xxe.xml"]
    );
    Ok(())
}

#[test]
fn concurrent_publishers_are_serialized() -> Result<()> {
    const STEPS: usize = 4;
    const TESTS_PER_STEP: usize = 3;

    let env = TestEnv::new();
    for index in 0..STEPS {
        env.write(
            &format!("step{index}/results.xml"),
            &v1_class(&format!("Step{index}"), TESTS_PER_STEP),
        );
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..STEPS)
            .map(|index| {
                let env = &env;
                scope.spawn(move || {
                    publisher("shared", policy(&format!("step{index}/*.xml"))).perform(
                        env.workspace.path(),
                        &env.store,
                        &LocalWorker,
                        &mut CollectingObserver::new(),
                    )
                })
            })
            .collect();
        for handle in handles {
            handle
                .join()
                .expect("thread did not panic")
                .expect("publishing succeeds");
        }
    });

    // No step's results were lost.
    let record = env.store.read("shared")?.expect("record was written");
    let result = record.test_result.expect("result was recorded");
    assert_eq!(result.suites().len(), STEPS);
    assert_eq!(result.counts().total, STEPS * TESTS_PER_STEP);
    assert_eq!(record.status, BuildStatus::Success);
    Ok(())
}
