// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests that run the `xunitnet` binary.

use camino::Utf8Path;
use camino_tempfile::Utf8TempDir;
use camino_tempfile_ext::prelude::*;
use indoc::{formatdoc, indoc};
use pretty_assertions::assert_eq;
use std::process::Output;
use test_case::test_case;
use xunitnet_metadata::XunitnetExitCode;

static MIXED: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <assemblies>
      <assembly name="Calc.Tests.dll" run-date="2024-03-26" run-time="16:03:09">
        <collection name="Adding" time="0.010">
          <test name="Calc.Tests.Adding.Adds" type="Calc.Tests.Adding" method="Adds" time="0.010" result="Pass" />
        </collection>
        <collection name="Dividing" time="0.020">
          <test name="Calc.Tests.Dividing.ByZero" type="Calc.Tests.Dividing" method="ByZero" time="0.020" result="Fail">
            <failure exception-type="System.DivideByZeroException">
              <message>Attempted to divide by zero.</message>
            </failure>
          </test>
        </collection>
      </assembly>
    </assemblies>
"#};

static PASSING: &str = indoc! {r#"
    <assemblies>
      <assembly name="Calc.Tests.dll">
        <collection name="Adding">
          <test name="Calc.Tests.Adding.Adds" type="Calc.Tests.Adding" method="Adds" result="Pass" />
        </collection>
      </assembly>
    </assemblies>
"#};

fn xunitnet(args: &[&str], dir: &Utf8Path) -> Output {
    duct::cmd(env!("CARGO_BIN_EXE_xunitnet"), args)
        .dir(dir)
        .env("XUNITNET_COLOR", "never")
        .env_remove("XUNITNET_BUILD_ID")
        .env_remove("XUNITNET_LOG")
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .expect("xunitnet can be executed")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("stdout is UTF-8")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn transform_writes_one_file_per_collection() {
    let dir = Utf8TempDir::new().unwrap();
    dir.child("results.xml").write_str(MIXED).unwrap();

    let output = xunitnet(&["transform", "results.xml", "--output-dir", "junit"], dir.path());
    assert_eq!(output.status.code(), Some(XunitnetExitCode::OK), "{}", stderr(&output));

    let written: Vec<_> = stdout(&output).lines().map(str::to_owned).collect();
    assert_eq!(written.len(), 2);
    for path in &written {
        let file_name = Utf8Path::new(path).file_name().expect("path has a file name");
        assert!(file_name.starts_with("TEST-"), "{file_name}");
        assert!(file_name.ends_with(".xml"), "{file_name}");
        let contents = std::fs::read_to_string(dir.path().join(path)).unwrap();
        assert!(contents.contains("<testsuite "), "{contents}");
    }
}

#[test]
fn transform_rejects_external_entities() {
    let dir = Utf8TempDir::new().unwrap();
    dir.child("secret.txt").write_str("TOP-SECRET").unwrap();
    let secret = dir.path().join("secret.txt");
    dir.child("xxe.xml")
        .write_str(&formatdoc! {r#"
            <?xml version="1.0"?>
            <!DOCTYPE assemblies [<!ENTITY secret SYSTEM "file://{secret}">]>
            <assemblies><assembly name="&secret;"/></assemblies>
        "#})
        .unwrap();

    let output = xunitnet(&["transform", "xxe.xml", "--output-dir", "junit"], dir.path());
    assert_eq!(
        output.status.code(),
        Some(XunitnetExitCode::SECURITY_REJECTION),
        "{}",
        stderr(&output)
    );
    assert!(!stderr(&output).contains("TOP-SECRET"));
    assert_eq!(stdout(&output), "");
    let written = std::fs::read_dir(dir.path().join("junit")).unwrap().count();
    assert_eq!(written, 0);
}

#[test]
fn transform_unknown_root_is_a_parse_error() {
    let dir = Utf8TempDir::new().unwrap();
    dir.child("nunit.xml")
        .write_str("<test-run><test-suite/></test-run>")
        .unwrap();

    let output = xunitnet(&["transform", "nunit.xml", "--output-dir", "junit"], dir.path());
    assert_eq!(output.status.code(), Some(XunitnetExitCode::PARSE_ERROR));
}

#[test_case(false ; "in process")]
#[test_case(true ; "isolated worker")]
fn publish_and_show(isolated: bool) {
    let dir = Utf8TempDir::new().unwrap();
    dir.child("Calc/TestResults/results.xml")
        .write_str(MIXED)
        .unwrap();

    let mut args = vec!["publish", "--build-id", "12"];
    if isolated {
        args.push("--isolated");
    }
    let output = xunitnet(&args, dir.path());
    assert_eq!(
        output.status.code(),
        Some(XunitnetExitCode::UNSTABLE),
        "{}",
        stderr(&output)
    );
    assert!(
        stderr(&output).contains("Recording XUnit tests results"),
        "{}",
        stderr(&output)
    );

    let output = xunitnet(
        &["show", "--build-id", "12", "--message-format", "json"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(XunitnetExitCode::OK));
    let record: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(record["status"], "unstable");
    let suites = record["test-result"]["suites"]
        .as_object()
        .expect("suites is a map");
    assert_eq!(
        suites.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["Adding", "Dividing"]
    );

    let output = xunitnet(&["show", "--build-id", "12"], dir.path());
    assert_eq!(output.status.code(), Some(XunitnetExitCode::OK));
    let plain = stdout(&output);
    assert!(plain.starts_with("build 12: unstable\n"), "{plain}");
    assert!(
        plain.contains("FAIL Calc.Tests.Dividing#ByZero: Attempted to divide by zero."),
        "{plain}"
    );

    // Only the report and the store are left in the workspace.
    let mut entries: Vec<_> = dir
        .path()
        .read_dir_utf8()
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["Calc", "target"]);
}

#[test]
fn publish_status_never_improves() {
    let dir = Utf8TempDir::new().unwrap();
    dir.child("first/results.xml").write_str(MIXED).unwrap();
    dir.child("second/results.xml").write_str(PASSING).unwrap();

    let output = xunitnet(
        &["publish", "--build-id", "3", "--pattern", "first/*.xml"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(XunitnetExitCode::UNSTABLE));

    let output = xunitnet(
        &["publish", "--build-id", "3", "--pattern", "second/*.xml"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(XunitnetExitCode::UNSTABLE));

    let output = xunitnet(
        &[
            "publish",
            "--build-id",
            "4",
            "--pattern",
            "first/*.xml",
            "--failed-tests-fail-build",
        ],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(XunitnetExitCode::BUILD_FAILED));
}

#[test]
fn publish_without_reports() {
    let dir = Utf8TempDir::new().unwrap();

    let output = xunitnet(&["publish", "--build-id", "5"], dir.path());
    assert_eq!(
        output.status.code(),
        Some(XunitnetExitCode::NO_TEST_RESULTS)
    );
    assert!(
        stderr(&output).contains("No XUnit test report files were found. Configuration error?"),
        "{}",
        stderr(&output)
    );

    let output = xunitnet(
        &["publish", "--build-id", "6", "--no-fail-if-no-results"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(XunitnetExitCode::OK));
}

#[test]
fn config_file_sets_policy() {
    let dir = Utf8TempDir::new().unwrap();
    dir.child("reports/results.xml").write_str(MIXED).unwrap();
    dir.child(".config/xunitnet.toml")
        .write_str(indoc! {r#"
            [publish]
            pattern = "reports/*.xml"
            failed-tests-fail-build = true

            [store]
            dir = "records"
        "#})
        .unwrap();

    let output = xunitnet(&["publish", "--build-id", "8"], dir.path());
    assert_eq!(
        output.status.code(),
        Some(XunitnetExitCode::BUILD_FAILED),
        "{}",
        stderr(&output)
    );
    assert!(dir.path().join("records/builds/8/build.json").is_file());
}

#[test]
fn invalid_config_is_a_setup_error() {
    let dir = Utf8TempDir::new().unwrap();
    dir.child(".config/xunitnet.toml")
        .write_str("[publish]\nfail-if-no-results = \"sometimes\"\n")
        .unwrap();

    let output = xunitnet(&["publish"], dir.path());
    assert_eq!(output.status.code(), Some(XunitnetExitCode::SETUP_ERROR));
}

#[test]
fn show_unknown_build() {
    let dir = Utf8TempDir::new().unwrap();

    let output = xunitnet(&["show", "--build-id", "missing"], dir.path());
    assert_eq!(output.status.code(), Some(XunitnetExitCode::SETUP_ERROR));
    assert!(
        stderr(&output).contains("no record found for build `missing`"),
        "{}",
        stderr(&output)
    );
}
