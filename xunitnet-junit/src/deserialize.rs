// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit documents into [`TestSuite`]s.

use crate::{
    NonSuccessKind, TestCase, TestCaseStatus, TestSuite, doctype::screen_doctype,
    errors::DeserializeError, time::parse_seconds,
};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::io::BufRead;

static ACCEPTED_ROOTS: &[&str] = &["testsuites", "testsuite"];

/// Creates a reader with the configuration used for all documents read by xunitnet.
///
/// The reader never expands entities or loads external resources on its own; callers must still
/// pass `Event::DocType` contents through [`screen_doctype`].
pub fn hardened_reader<R: BufRead>(reader: R) -> Reader<R> {
    let mut reader = Reader::from_reader(reader);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = true;
    config.check_comments = true;
    reader
}

/// Reads every `testsuite` element in a JUnit document.
///
/// Nested testsuites are flattened, in document order of their closing tags. Counts are computed
/// from the testcases that were read rather than taken from attributes, so they are always
/// consistent with the testcases. `failure` and `error` children mark a testcase as failed, and
/// `skipped` marks it as skipped.
pub fn read_test_suites(input: impl BufRead) -> Result<Vec<TestSuite>, DeserializeError> {
    let mut reader = hardened_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut suites = Vec::new();
    let mut seen_root = false;

    loop {
        let position = reader.buffer_position() as u64;
        let xml_error = |error: quick_xml::Error| DeserializeError::Xml { position, error };

        let event = reader.read_event_into(&mut buf).map_err(xml_error)?;
        match event {
            Event::DocType(doctype) => screen_doctype(&doctype)?,
            Event::Start(start) => {
                let frame = open_frame(&start, &stack, seen_root).map_err(|error| match error {
                    OpenError::Xml(error) => xml_error(error),
                    OpenError::Other(error) => error,
                })?;
                seen_root = true;
                stack.push(frame);
            }
            Event::Empty(start) => {
                let frame = open_frame(&start, &stack, seen_root).map_err(|error| match error {
                    OpenError::Xml(error) => xml_error(error),
                    OpenError::Other(error) => error,
                })?;
                seen_root = true;
                close_frame(frame, &mut stack, &mut suites);
            }
            Event::End(_) => {
                // check_end_names guarantees this matches the innermost open element.
                if let Some(frame) = stack.pop() {
                    close_frame(frame, &mut stack, &mut suites);
                }
            }
            Event::Text(text) => {
                if stack.is_empty() {
                    return Err(DeserializeError::TrailingContent);
                }
                let text = text.unescape().map_err(xml_error)?;
                append_text(&mut stack, &text);
            }
            Event::CData(cdata) => {
                let text = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                append_text(&mut stack, &text);
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) => {}
        }
        buf.clear();
    }

    if let Some(frame) = stack.last() {
        return Err(DeserializeError::UnexpectedEof {
            open: frame.element_name().to_owned(),
        });
    }
    if !seen_root {
        return Err(DeserializeError::NoRoot);
    }

    Ok(suites)
}

#[derive(Debug)]
enum Frame {
    Suites,
    Suite(TestSuite),
    Case(TestCase),
    Status {
        status: TestCaseStatus,
        text: String,
    },
    SystemOut(String),
    SystemErr(String),
    Other(String),
}

impl Frame {
    fn element_name(&self) -> &str {
        match self {
            Frame::Suites => "testsuites",
            Frame::Suite(_) => "testsuite",
            Frame::Case(_) => "testcase",
            Frame::Status { status, .. } => match status {
                TestCaseStatus::NonSuccess {
                    kind: NonSuccessKind::Failure,
                    ..
                } => "failure",
                TestCaseStatus::NonSuccess {
                    kind: NonSuccessKind::Error,
                    ..
                } => "error",
                _ => "skipped",
            },
            Frame::SystemOut(_) => "system-out",
            Frame::SystemErr(_) => "system-err",
            Frame::Other(name) => name.as_str(),
        }
    }
}

enum OpenError {
    Xml(quick_xml::Error),
    Other(DeserializeError),
}

fn open_frame(
    start: &BytesStart<'_>,
    stack: &[Frame],
    seen_root: bool,
) -> Result<Frame, OpenError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let Some(parent) = stack.last() else {
        if seen_root {
            return Err(OpenError::Other(DeserializeError::TrailingContent));
        }
        return match name.as_str() {
            "testsuites" => Ok(Frame::Suites),
            "testsuite" => Ok(Frame::Suite(suite_from_attributes(start)?)),
            _ => Err(OpenError::Other(DeserializeError::UnexpectedRoot {
                found: name.clone(),
                expected: ACCEPTED_ROOTS,
            })),
        };
    };

    let frame = match (parent, name.as_str()) {
        (Frame::Suites | Frame::Suite(_), "testsuite") => {
            Frame::Suite(suite_from_attributes(start)?)
        }
        (Frame::Suite(_), "testcase") => {
            let attributes = attributes(start)?;
            let mut test_case = TestCase::new(
                lookup(&attributes, "name").unwrap_or_default(),
                TestCaseStatus::success(),
            );
            if let Some(classname) = lookup(&attributes, "classname") {
                test_case.set_classname(classname);
            }
            if let Some(time) = lookup(&attributes, "time").and_then(lenient_seconds) {
                test_case.set_time(time);
            }
            Frame::Case(test_case)
        }
        (Frame::Case(_), "failure" | "error" | "skipped") => {
            let attributes = attributes(start)?;
            let mut status = match name.as_str() {
                "failure" => TestCaseStatus::non_success(NonSuccessKind::Failure),
                "error" => TestCaseStatus::non_success(NonSuccessKind::Error),
                _ => TestCaseStatus::skipped(),
            };
            if let Some(message) = lookup(&attributes, "message") {
                status.set_message(message);
            }
            if let Some(ty) = lookup(&attributes, "type") {
                status.set_type(ty);
            }
            Frame::Status {
                status,
                text: String::new(),
            }
        }
        (Frame::Case(_), "system-out") => Frame::SystemOut(String::new()),
        (Frame::Case(_), "system-err") => Frame::SystemErr(String::new()),
        _ => Frame::Other(name.clone()),
    };
    Ok(frame)
}

fn close_frame(frame: Frame, stack: &mut [Frame], suites: &mut Vec<TestSuite>) {
    match (frame, stack.last_mut()) {
        (Frame::Suite(suite), _) => suites.push(suite),
        (Frame::Case(test_case), Some(Frame::Suite(suite))) => {
            suite.add_test_case(test_case);
        }
        (Frame::Status { mut status, text }, Some(Frame::Case(test_case))) => {
            if !text.is_empty() {
                status.set_description(text);
            }
            // A failure or error takes precedence over an earlier skipped marker.
            let replace = match (&test_case.status, &status) {
                (TestCaseStatus::NonSuccess { .. }, _) => false,
                (TestCaseStatus::Skipped { .. }, TestCaseStatus::Skipped { .. }) => false,
                _ => true,
            };
            if replace {
                test_case.status = status;
            }
        }
        (Frame::SystemOut(text), Some(Frame::Case(test_case))) => {
            test_case.set_system_out(text);
        }
        (Frame::SystemErr(text), Some(Frame::Case(test_case))) => {
            test_case.set_system_err(text);
        }
        _ => {}
    }
}

fn append_text(stack: &mut [Frame], text: &str) {
    match stack.last_mut() {
        Some(Frame::Status { text: buf, .. } | Frame::SystemOut(buf) | Frame::SystemErr(buf)) => {
            buf.push_str(text);
        }
        _ => {}
    }
}

fn suite_from_attributes(start: &BytesStart<'_>) -> Result<TestSuite, OpenError> {
    let attributes = attributes(start)?;
    let mut suite = TestSuite::new(lookup(&attributes, "name").unwrap_or_default());
    if let Some(time) = lookup(&attributes, "time").and_then(lenient_seconds) {
        suite.set_time(time);
    }
    Ok(suite)
}

fn attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, OpenError> {
    start
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(|error| OpenError::Xml(error.into()))?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(OpenError::Xml)?;
            Ok((key, value.into_owned()))
        })
        .collect()
}

fn lookup<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// Reports in the wild use thousands separators ("1,234.5"); tolerate them and ignore values that
// still don't parse.
fn lenient_seconds(value: &str) -> Option<std::time::Duration> {
    parse_seconds(&value.replace(',', "")).ok()
}
