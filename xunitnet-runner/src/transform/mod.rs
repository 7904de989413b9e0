// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of xUnit.net reports into JUnit reports.
//!
//! Both the v2 (`assemblies`) and v1 (`assembly`) formats are accepted. Each fixture in the input
//! becomes one JUnit document with a `testsuite` root, written to its own file.

mod dom;
mod rules;

use crate::errors::TransformError;
use atomicwrites::{AtomicFile, DisallowOverwrite};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{BufRead, Write};
use tracing::{debug, warn};
use uuid::Uuid;
use xunitnet_junit::TestSuite;

/// The prefix of every JUnit report file written by [`transform`].
pub const JUNIT_FILE_PREFIX: &str = "TEST-";

/// The extension of every JUnit report file written by [`transform`].
pub const JUNIT_FILE_EXTENSION: &str = "xml";

/// Converts an xUnit.net report into JUnit test suites, one per fixture, without writing anything.
pub fn transform_document(input: impl BufRead) -> Result<Vec<TestSuite>, TransformError> {
    let root = dom::parse_document(input)?;
    rules::map_document(&root)
}

/// Converts an xUnit.net report and writes one JUnit report per fixture into `output_dir`.
///
/// Returns the paths written, in fixture order. File names are unique, and existing files are never
/// overwritten. If any step fails, no files are left behind.
pub fn transform(
    input: impl BufRead,
    output_dir: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, TransformError> {
    let suites = transform_document(input)?;

    // Generate every document before writing any, so that a mapping error writes nothing.
    let documents = suites
        .iter()
        .map(|suite| {
            let mut buf = Vec::new();
            suite.serialize(&mut buf).map_err(TransformError::Serialize)?;
            Ok(buf)
        })
        .collect::<Result<Vec<_>, TransformError>>()?;

    write_documents(&documents, output_dir)
}

fn write_documents(
    documents: &[Vec<u8>],
    output_dir: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, TransformError> {
    let mut written = Vec::with_capacity(documents.len());
    for document in documents {
        let path = output_dir.join(format!(
            "{JUNIT_FILE_PREFIX}{}.{JUNIT_FILE_EXTENSION}",
            Uuid::new_v4()
        ));

        let res = AtomicFile::new(&path, DisallowOverwrite).write(|file| file.write_all(document));
        if let Err(error) = res {
            remove_written(&written);
            let error = match error {
                atomicwrites::Error::Internal(error) | atomicwrites::Error::User(error) => error,
            };
            return Err(TransformError::Write { path, error });
        }

        debug!("wrote JUnit report {path}");
        written.push(path);
    }

    Ok(written)
}

fn remove_written(written: &[Utf8PathBuf]) {
    for path in written {
        if let Err(error) = std::fs::remove_file(path) {
            warn!("failed to remove partially written JUnit report {path}: {error}");
        }
    }
}
