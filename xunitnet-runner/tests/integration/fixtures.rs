// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino_tempfile::Utf8TempDir;
use camino_tempfile_ext::prelude::*;
use chrono::{DateTime, FixedOffset, TimeZone};
use indoc::{formatdoc, indoc};
use xunitnet_runner::{build_store::BuildStore, config::PolicyConfig, publisher::Publisher};

/// Two collections: one passing test and one failing test, plus a skipped test.
pub(crate) static V2_MIXED: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <assemblies>
      <assembly name="C:\src\Calc.Tests.dll" run-date="2024-03-26" run-time="16:03:09" total="3" passed="1" failed="1" skipped="1">
        <collection name="Adding" time="0.120" total="1" passed="1" failed="0" skipped="0">
          <test name="Calc.Tests.Adding.Adds" type="Calc.Tests.Adding" method="Adds" time="0.0120000" result="Pass" />
        </collection>
        <collection name="Dividing" time="0.500" total="2" passed="0" failed="1" skipped="1">
          <test name="Calc.Tests.Dividing.ByZero" type="Calc.Tests.Dividing" method="ByZero" time="0.4" result="Fail">
            <failure exception-type="System.DivideByZeroException">
              <message><![CDATA[Attempted to divide by zero.]]></message>
              <stack-trace><![CDATA[at Calc.Divider.Divide(Int32 a, Int32 b)]]></stack-trace>
            </failure>
          </test>
          <test name="Calc.Tests.Dividing.Later" type="Calc.Tests.Dividing" method="Later" time="0" result="Skip">
            <reason><![CDATA[not yet]]></reason>
          </test>
        </collection>
      </assembly>
    </assemblies>
"#};

/// An xUnit.net v1 report with two passing tests in one class.
pub(crate) static V1_PASSING: &str = indoc! {r#"
    <?xml version="1.0" encoding="utf-8"?>
    <assembly name="Legacy.Tests.dll" run-date="2024-03-26" run-time="16:04:00" total="2" passed="2" failed="0" skipped="0">
      <class name="Legacy.Tests.Parsing" time="0.020" total="2" passed="2" failed="0" skipped="0">
        <test name="Legacy.Tests.Parsing.Parses" type="Legacy.Tests.Parsing" method="Parses" result="Pass" time="0.010" />
        <test name="Legacy.Tests.Parsing.Rejects" type="Legacy.Tests.Parsing" method="Rejects" result="Pass" time="0.010" />
      </class>
    </assembly>
"#};

/// A report that has an assembly but no collections.
pub(crate) static V2_NO_COLLECTIONS: &str = indoc! {r#"
    <assemblies>
      <assembly name="Empty.Tests.dll" total="0" />
    </assemblies>
"#};

/// A report with one collection that contains no tests.
pub(crate) static V2_EMPTY_COLLECTION: &str = indoc! {r#"
    <assemblies>
      <assembly name="Empty.Tests.dll">
        <collection name="Nothing" total="0" />
      </assembly>
    </assemblies>
"#};

/// An xUnit.net v1 report with `count` passing tests in the class `class`.
pub(crate) fn v1_class(class: &str, count: usize) -> String {
    let tests: String = (0..count)
        .map(|index| {
            format!(
                r#"<test name="{class}.T{index}" type="{class}" method="T{index}" result="Pass" time="0.001" />"#
            )
        })
        .collect();
    formatdoc! {r#"
        <assembly name="{class}.dll">
          <class name="{class}">{tests}</class>
        </assembly>
    "#}
}

pub(crate) fn started_at() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 26, 16, 0, 0)
        .unwrap()
}

pub(crate) fn policy(pattern: &str) -> PolicyConfig {
    PolicyConfig {
        pattern: pattern.to_owned(),
        fail_if_no_results: true,
        failed_tests_fail_build: false,
    }
}

pub(crate) fn publisher(build_id: &str, policy: PolicyConfig) -> Publisher {
    Publisher::new(build_id, policy, started_at())
}

pub(crate) struct TestEnv {
    pub(crate) workspace: Utf8TempDir,
    // Kept alive for the duration of the test.
    _store_dir: Utf8TempDir,
    pub(crate) store: BuildStore,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        let workspace = Utf8TempDir::with_prefix("xunitnet-workspace-").unwrap();
        let store_dir = Utf8TempDir::with_prefix("xunitnet-store-").unwrap();
        let store = BuildStore::new(store_dir.path()).unwrap();
        Self {
            workspace,
            _store_dir: store_dir,
            store,
        }
    }

    pub(crate) fn write(&self, path: &str, contents: &str) {
        self.workspace.child(path).write_str(contents).unwrap();
    }

    /// Returns the names of the entries at the top of the workspace, sorted.
    pub(crate) fn top_level_entries(&self) -> Vec<String> {
        let mut entries: Vec<_> = self
            .workspace
            .path()
            .read_dir_utf8()
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_owned())
            .collect();
        entries.sort();
        entries
    }
}
