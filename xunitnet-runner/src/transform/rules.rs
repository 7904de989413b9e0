// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mapping from xUnit.net report elements to JUnit test suites.
//!
//! The mapping is data: each JUnit field lists the places in the xUnit.net element it may be read
//! from, in order of preference. The code below only walks the tables.

use super::dom::Element;
use crate::errors::TransformError;
use chrono::NaiveDateTime;
use std::time::Duration;
use xunitnet_junit::{NonSuccessKind, TestCase, TestCaseStatus, TestSuite, parse_seconds};

/// The name given to a suite when neither the fixture nor its tests provide one.
pub(crate) static UNNAMED_SUITE: &str = "(unnamed)";

/// How one version of the xUnit.net format lays out assemblies and fixtures.
#[derive(Debug)]
pub(crate) struct Dialect {
    /// The root element.
    pub(crate) root: &'static str,

    /// The element under the root that describes an assembly, or `None` if the root is itself the
    /// assembly.
    pub(crate) assembly: Option<&'static str>,

    /// The element under an assembly that becomes a JUnit test suite.
    pub(crate) fixture: &'static str,
}

pub(crate) static DIALECTS: &[Dialect] = &[
    // xUnit.net v2: assemblies/assembly/collection/test
    Dialect {
        root: "assemblies",
        assembly: Some("assembly"),
        fixture: "collection",
    },
    // xUnit.net v1: assembly/class/test
    Dialect {
        root: "assembly",
        assembly: None,
        fixture: "class",
    },
];

static TEST_ELEMENT: &str = "test";

/// A place a value is read from, relative to an element.
#[derive(Debug)]
pub(crate) enum Source {
    /// An attribute on the element itself.
    Attribute(&'static str),

    /// An attribute on a descendant.
    AttributeAt(&'static [&'static str], &'static str),

    /// The text content of a descendant.
    Text(&'static [&'static str]),
}

impl Source {
    fn read<'a>(&self, element: &'a Element) -> Option<&'a str> {
        let value = match self {
            Source::Attribute(name) => element.attribute(name),
            Source::AttributeAt(path, name) => element.descendant(path)?.attribute(name),
            Source::Text(path) => Some(element.descendant(path)?.text.as_str()),
        };
        value.filter(|value| !value.is_empty())
    }
}

#[derive(Debug)]
pub(crate) struct Rule<F> {
    field: F,
    sources: &'static [Source],
}

fn lookup<'a, F: PartialEq>(
    rules: &[Rule<F>],
    element: &'a Element,
    field: F,
) -> Option<&'a str> {
    rules
        .iter()
        .filter(|rule| rule.field == field)
        .flat_map(|rule| rule.sources)
        .find_map(|source| source.read(element))
}

#[derive(Debug, Eq, PartialEq)]
enum AssemblyField {
    Name,
    RunDate,
    RunTime,
}

static ASSEMBLY_RULES: &[Rule<AssemblyField>] = &[
    Rule {
        field: AssemblyField::Name,
        sources: &[Source::Attribute("name")],
    },
    Rule {
        field: AssemblyField::RunDate,
        sources: &[Source::Attribute("run-date")],
    },
    Rule {
        field: AssemblyField::RunTime,
        sources: &[Source::Attribute("run-time")],
    },
];

#[derive(Debug, Eq, PartialEq)]
enum FixtureField {
    Name,
    Time,
}

static FIXTURE_RULES: &[Rule<FixtureField>] = &[
    Rule {
        field: FixtureField::Name,
        sources: &[Source::Attribute("name")],
    },
    Rule {
        field: FixtureField::Time,
        sources: &[Source::Attribute("time")],
    },
];

#[derive(Debug, Eq, PartialEq)]
enum TestField {
    Classname,
    Name,
    Result,
    Time,
    FailureMessage,
    FailureType,
    FailureBody,
    SkipReason,
    Output,
}

static TEST_RULES: &[Rule<TestField>] = &[
    Rule {
        field: TestField::Classname,
        sources: &[Source::Attribute("type")],
    },
    Rule {
        field: TestField::Name,
        sources: &[Source::Attribute("name"), Source::Attribute("method")],
    },
    Rule {
        field: TestField::Result,
        sources: &[Source::Attribute("result")],
    },
    Rule {
        field: TestField::Time,
        sources: &[Source::Attribute("time")],
    },
    Rule {
        field: TestField::FailureMessage,
        sources: &[Source::Text(&["failure", "message"])],
    },
    Rule {
        field: TestField::FailureType,
        sources: &[Source::AttributeAt(&["failure"], "exception-type")],
    },
    Rule {
        field: TestField::FailureBody,
        sources: &[Source::Text(&["failure", "stack-trace"])],
    },
    Rule {
        // v1 wraps the reason in a message element, v2 uses a CDATA section directly.
        field: TestField::SkipReason,
        sources: &[Source::Text(&["reason", "message"]), Source::Text(&["reason"])],
    },
    Rule {
        field: TestField::Output,
        sources: &[Source::Text(&["output"])],
    },
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Outcome {
    Pass,
    Fail,
    Skip,
}

static RESULT_RULES: &[(&str, Outcome)] = &[
    ("Pass", Outcome::Pass),
    ("Fail", Outcome::Fail),
    ("Skip", Outcome::Skip),
    ("Ignore", Outcome::Skip),
];

/// Maps a parsed xUnit.net document to one test suite per fixture, in document order.
pub(crate) fn map_document(root: &Element) -> Result<Vec<TestSuite>, TransformError> {
    let Some(dialect) = DIALECTS.iter().find(|dialect| dialect.root == root.name) else {
        return Err(TransformError::UnexpectedRoot {
            found: root.name.clone(),
            expected: DIALECTS.iter().map(|dialect| dialect.root).collect(),
        });
    };

    let assemblies: Vec<&Element> = match dialect.assembly {
        Some(name) => root.children_named(name).collect(),
        None => vec![root],
    };

    let mut suites = Vec::new();
    for assembly in assemblies {
        let timestamp = assembly_timestamp(assembly);
        let package = lookup(ASSEMBLY_RULES, assembly, AssemblyField::Name);

        for fixture in assembly.children_named(dialect.fixture) {
            let mut suite = map_fixture(dialect, fixture)?;
            if let Some(timestamp) = timestamp {
                suite.set_timestamp(timestamp);
            }
            if let Some(package) = package {
                suite.set_extra("package", package);
            }
            suites.push(suite);
        }
    }

    Ok(suites)
}

fn assembly_timestamp(assembly: &Element) -> Option<NaiveDateTime> {
    let date = lookup(ASSEMBLY_RULES, assembly, AssemblyField::RunDate)?;
    let time = lookup(ASSEMBLY_RULES, assembly, AssemblyField::RunTime)?;
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").ok()
}

fn map_fixture(dialect: &Dialect, fixture: &Element) -> Result<TestSuite, TransformError> {
    let tests: Vec<&Element> = fixture.children_named(TEST_ELEMENT).collect();

    let name = lookup(FIXTURE_RULES, fixture, FixtureField::Name)
        .or_else(|| {
            tests
                .first()
                .copied()
                .and_then(|test| lookup(TEST_RULES, test, TestField::Classname))
        })
        .unwrap_or(UNNAMED_SUITE);

    let mut suite = TestSuite::new(name);
    if let Some(time) = lookup(FIXTURE_RULES, fixture, FixtureField::Time) {
        suite.set_time(parse_time(time, dialect.fixture, name)?);
    }
    for test in tests {
        suite.add_test_case(map_test(test)?);
    }

    Ok(suite)
}

fn map_test(test: &Element) -> Result<TestCase, TransformError> {
    let classname = lookup(TEST_RULES, test, TestField::Classname);
    let name = test_name(test, classname);

    let result = lookup(TEST_RULES, test, TestField::Result).unwrap_or_default();
    let outcome = RESULT_RULES
        .iter()
        .find(|(value, _)| value.eq_ignore_ascii_case(result))
        .map(|(_, outcome)| *outcome)
        .ok_or_else(|| TransformError::UnknownResult {
            test: name.to_owned(),
            result: result.to_owned(),
        })?;

    let status = match outcome {
        Outcome::Pass => TestCaseStatus::success(),
        Outcome::Fail => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            if let Some(message) = lookup(TEST_RULES, test, TestField::FailureMessage) {
                status.set_message(message);
            }
            if let Some(ty) = lookup(TEST_RULES, test, TestField::FailureType) {
                status.set_type(ty);
            }
            if let Some(body) = lookup(TEST_RULES, test, TestField::FailureBody) {
                status.set_description(body);
            }
            status
        }
        Outcome::Skip => {
            let mut status = TestCaseStatus::skipped();
            if let Some(reason) = lookup(TEST_RULES, test, TestField::SkipReason) {
                status.set_message(reason);
            }
            status
        }
    };

    let mut test_case = TestCase::new(name, status);
    if let Some(classname) = classname {
        test_case.set_classname(classname);
    }
    if let Some(time) = lookup(TEST_RULES, test, TestField::Time) {
        test_case.set_time(parse_time(time, TEST_ELEMENT, name)?);
    }
    if let Some(output) = lookup(TEST_RULES, test, TestField::Output) {
        test_case.set_system_out(output);
    }

    Ok(test_case)
}

// xUnit.net names tests "{type}.{method}"; JUnit carries the type separately as the classname.
fn test_name<'a>(test: &'a Element, classname: Option<&str>) -> &'a str {
    let name = lookup(TEST_RULES, test, TestField::Name).unwrap_or_default();
    classname
        .and_then(|classname| name.strip_prefix(classname))
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

fn parse_time(value: &str, element: &'static str, name: &str) -> Result<Duration, TransformError> {
    parse_seconds(value).map_err(|error| TransformError::InvalidTime {
        element,
        name: name.to_owned(),
        error,
    })
}
