// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a `TestSuite` as a standalone document.

use crate::{
    NonSuccessKind, Output, TestCase, TestCaseStatus, TestSuite, errors::SerializeError,
    report::strip_invalid_xml_chars, time::format_seconds,
};
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::io::{self, Write};

static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";
static SKIPPED_TAG: &str = "skipped";
static SYSTEM_OUT_TAG: &str = "system-out";
static SYSTEM_ERR_TAG: &str = "system-err";

static TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn serialize_test_suite_document(
    test_suite: &TestSuite,
    writer: impl io::Write,
) -> Result<(), SerializeError> {
    let mut writer = Writer::new_with_indent(writer, b' ', 4);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_test_suite(test_suite, &mut writer)?;

    // Add a trailing newline.
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn serialize_test_suite(
    test_suite: &TestSuite,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let TestSuite {
        name,
        tests,
        failures,
        errors,
        skipped,
        timestamp,
        time: _,
        test_cases,
        extra,
    } = test_suite;

    let mut test_suite_tag = BytesStart::new(TESTSUITE_TAG);
    test_suite_tag.extend_attributes([
        ("name", strip_invalid_xml_chars(name).as_str()),
        ("tests", tests.to_string().as_str()),
        ("failures", failures.to_string().as_str()),
        ("errors", errors.to_string().as_str()),
        ("skipped", skipped.to_string().as_str()),
    ]);
    if let Some(time) = test_suite.effective_time() {
        test_suite_tag.push_attribute(("time", format_seconds(time).as_str()));
    }
    if let Some(timestamp) = timestamp {
        test_suite_tag.push_attribute((
            "timestamp",
            timestamp.format(TIMESTAMP_FORMAT).to_string().as_str(),
        ));
    }
    for (k, v) in extra {
        test_suite_tag.push_attribute((k.as_str(), strip_invalid_xml_chars(v).as_str()));
    }

    if test_cases.is_empty() {
        writer.write_event(Event::Empty(test_suite_tag))?;
        return Ok(());
    }

    writer.write_event(Event::Start(test_suite_tag))?;
    for test_case in test_cases {
        serialize_test_case(test_case, writer)?;
    }
    serialize_end_tag(TESTSUITE_TAG, writer)?;

    Ok(())
}

fn serialize_test_case(
    test_case: &TestCase,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let TestCase {
        name,
        classname,
        time,
        status,
        system_out,
        system_err,
    } = test_case;

    let mut test_case_tag = BytesStart::new(TESTCASE_TAG);
    test_case_tag.push_attribute(("name", strip_invalid_xml_chars(name).as_str()));
    if let Some(classname) = classname {
        test_case_tag.push_attribute(("classname", strip_invalid_xml_chars(classname).as_str()));
    }
    if let Some(time) = time {
        test_case_tag.push_attribute(("time", format_seconds(*time).as_str()));
    }

    if matches!(status, TestCaseStatus::Success) && system_out.is_none() && system_err.is_none()
    {
        writer.write_event(Event::Empty(test_case_tag))?;
        return Ok(());
    }

    writer.write_event(Event::Start(test_case_tag))?;

    match status {
        TestCaseStatus::Success => {}
        TestCaseStatus::NonSuccess {
            kind,
            message,
            ty,
            description,
        } => {
            let tag_name = match kind {
                NonSuccessKind::Failure => FAILURE_TAG,
                NonSuccessKind::Error => ERROR_TAG,
            };
            serialize_status(
                message.as_deref(),
                ty.as_deref(),
                description.as_deref(),
                tag_name,
                writer,
            )?;
        }
        TestCaseStatus::Skipped {
            message,
            ty,
            description,
        } => {
            serialize_status(
                message.as_deref(),
                ty.as_deref(),
                description.as_deref(),
                SKIPPED_TAG,
                writer,
            )?;
        }
    }

    if let Some(system_out) = system_out {
        serialize_output(system_out, SYSTEM_OUT_TAG, writer)?;
    }
    if let Some(system_err) = system_err {
        serialize_output(system_err, SYSTEM_ERR_TAG, writer)?;
    }

    serialize_end_tag(TESTCASE_TAG, writer)?;

    Ok(())
}

fn serialize_status(
    message: Option<&str>,
    ty: Option<&str>,
    description: Option<&str>,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    let mut tag = BytesStart::new(tag_name);
    if let Some(message) = message {
        tag.push_attribute(("message", strip_invalid_xml_chars(message).as_str()));
    }
    if let Some(ty) = ty {
        tag.push_attribute(("type", strip_invalid_xml_chars(ty).as_str()));
    }

    match description {
        Some(description) => {
            writer.write_event(Event::Start(tag))?;
            let description = strip_invalid_xml_chars(description);
            writer.write_event(Event::Text(BytesText::new(&description)))?;
            serialize_end_tag(tag_name, writer)?;
        }
        None => {
            writer.write_event(Event::Empty(tag))?;
        }
    }

    Ok(())
}

fn serialize_output(
    output: &Output,
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    writer.write_event(Event::Start(BytesStart::new(tag_name)))?;
    writer.write_event(Event::Text(BytesText::new(output.as_str())))?;
    serialize_end_tag(tag_name, writer)?;

    Ok(())
}

fn serialize_end_tag(
    tag_name: &'static str,
    writer: &mut Writer<impl io::Write>,
) -> Result<(), SerializeError> {
    writer.write_event(Event::End(BytesEnd::new(tag_name)))?;
    Ok(())
}
