// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// A request to convert the xUnit reports under a directory into JUnit reports.
///
/// All fields are plain values so that the request can be sent to a worker in another process.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveRequest {
    /// The directory that the pattern is resolved against.
    pub root: Utf8PathBuf,

    /// The pattern that selects xUnit reports, relative to `root`.
    pub pattern: String,

    /// The name of the directory, created under `root`, that converted reports are written to.
    pub output_dir_name: String,

    /// Whether finding no reports is a fatal error.
    pub fail_if_no_results: bool,
}

/// What a worker did with an [`ArchiveRequest`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveSummary {
    /// True if at least one report matched the pattern.
    pub found: bool,

    /// The number of reports that were converted.
    pub file_count: usize,
}

/// A worker's reply to an [`ArchiveRequest`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveResponse {
    /// The outcome of the request.
    pub summary: ArchiveSummary,

    /// Messages produced by the worker, in order, to be replayed by the caller.
    #[serde(default)]
    pub diagnostics: Vec<WorkerDiagnostic>,
}

/// A message produced by a worker.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkerDiagnostic {
    /// How severe the message is.
    pub level: DiagnosticLevel,

    /// The message.
    pub message: String,
}

impl WorkerDiagnostic {
    /// Creates an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            message: message.into(),
        }
    }

    /// Creates a fatal diagnostic.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Fatal,
            message: message.into(),
        }
    }
}

/// The severity of a [`WorkerDiagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticLevel {
    /// An informational message.
    Info,

    /// A message describing a condition that fails the step.
    Fatal,
}
