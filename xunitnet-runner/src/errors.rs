// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by xunitnet.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::io;
use thiserror::Error;
use xunitnet_junit::{DeserializeError, DoctypeViolation, ParseSecondsError, SerializeError};
use xunitnet_metadata::{WorkerCommandError, XunitnetExitCode};

/// The broad category an error falls into.
///
/// Every error in this crate exposes its kind through a `kind` method. Callers use the kind to pick
/// an exit code or decide how to present the error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// The inputs or settings for the step are wrong: no reports were found, reports contained no
    /// results, a pattern was invalid or a configuration file could not be read.
    Configuration,

    /// A report was not well-formed, had an unexpected root element, or used an unknown entity.
    Parse,

    /// A report was refused because its document type declaration was unsafe.
    SecurityRejection,

    /// A report was well-formed but could not be mapped to JUnit.
    Transformation,

    /// Reading or writing files failed.
    Io,

    /// Calling the worker failed.
    Worker,
}

impl FailureKind {
    /// Returns the process exit code associated with this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Configuration => XunitnetExitCode::SETUP_ERROR,
            Self::Parse => XunitnetExitCode::PARSE_ERROR,
            Self::SecurityRejection => XunitnetExitCode::SECURITY_REJECTION,
            Self::Transformation => XunitnetExitCode::TRANSFORMATION_ERROR,
            Self::Io => XunitnetExitCode::IO_ERROR,
            Self::Worker => XunitnetExitCode::WORKER_ERROR,
        }
    }

    /// Recovers a kind from an exit code produced by [`Self::exit_code`].
    pub fn from_exit_code(code: i32) -> Option<Self> {
        let kind = match code {
            XunitnetExitCode::SETUP_ERROR | XunitnetExitCode::NO_TEST_RESULTS => {
                Self::Configuration
            }
            XunitnetExitCode::PARSE_ERROR => Self::Parse,
            XunitnetExitCode::SECURITY_REJECTION => Self::SecurityRejection,
            XunitnetExitCode::TRANSFORMATION_ERROR => Self::Transformation,
            XunitnetExitCode::IO_ERROR => Self::Io,
            XunitnetExitCode::WORKER_ERROR => Self::Worker,
            _ => return None,
        };
        Some(kind)
    }
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse xunitnet config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        FailureKind::Configuration
    }
}

/// An error that occurred while locating reports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LocateError {
    /// The pattern contained no globs.
    #[error("report pattern `{pattern}` is empty")]
    EmptyPattern {
        /// The pattern as given.
        pattern: String,
    },

    /// A glob in the pattern could not be parsed.
    #[error("invalid glob `{glob}` in report pattern")]
    InvalidPattern {
        /// The glob that failed to parse.
        glob: String,

        /// The underlying error.
        #[source]
        error: globset::Error,
    },
}

impl LocateError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        FailureKind::Configuration
    }
}

/// An error that occurred while converting an xUnit.net report to JUnit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransformError {
    /// The report is not well-formed XML, or uses an unknown entity.
    #[error("malformed XML at byte {position}")]
    Xml {
        /// The byte offset at which the error was detected.
        position: u64,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The report's document type declaration was refused.
    #[error("report rejected for security reasons")]
    Security(#[from] DoctypeViolation),

    /// The report has a root element that is not an xUnit.net root.
    #[error("unexpected root element `{found}` (expected one of: {})", .expected.join(", "))]
    UnexpectedRoot {
        /// The root element found.
        found: String,

        /// The root elements that are accepted.
        expected: Vec<&'static str>,
    },

    /// The report ended while elements were still open.
    #[error("unexpected end of report: element `{open}` was never closed")]
    UnexpectedEof {
        /// The innermost element still open.
        open: String,
    },

    /// The report has no root element.
    #[error("report has no root element")]
    NoRoot,

    /// The report has more than one root element.
    #[error("report has more than one root element")]
    MultipleRoots,

    /// The report has text before or after its root element.
    #[error("report has text outside the root element")]
    ContentOutsideRoot,

    /// A test has a `result` value that has no JUnit equivalent.
    #[error("test `{test}` has unknown result `{result}`")]
    UnknownResult {
        /// The name of the test.
        test: String,

        /// The result value.
        result: String,
    },

    /// A `time` attribute could not be converted to a duration.
    #[error("invalid time on {element} `{name}`")]
    InvalidTime {
        /// The element the attribute was on.
        element: &'static str,

        /// The name of the element.
        name: String,

        /// The underlying error.
        #[source]
        error: ParseSecondsError,
    },

    /// A JUnit document could not be generated.
    #[error("error generating JUnit document")]
    Serialize(#[source] SerializeError),

    /// A JUnit document could not be written.
    #[error("error writing JUnit report to `{path}`")]
    Write {
        /// The path being written.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },
}

impl TransformError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Xml { .. }
            | Self::UnexpectedRoot { .. }
            | Self::UnexpectedEof { .. }
            | Self::NoRoot
            | Self::MultipleRoots
            | Self::ContentOutsideRoot => FailureKind::Parse,
            Self::Security(_) => FailureKind::SecurityRejection,
            Self::UnknownResult { .. } | Self::InvalidTime { .. } | Self::Serialize(_) => {
                FailureKind::Transformation
            }
            Self::Write { .. } => FailureKind::Io,
        }
    }
}

/// An error that occurred while converting the reports selected by an archive request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Locating reports failed.
    #[error("error locating xUnit reports")]
    Locate(#[from] LocateError),

    /// The output directory could not be created.
    #[error("error creating JUnit output directory `{path}`")]
    CreateOutputDir {
        /// The directory.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A report could not be opened.
    #[error("error opening xUnit report `{path}`")]
    Open {
        /// The report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A report could not be converted.
    #[error("could not transform the xUnit report `{path}`")]
    Transform {
        /// The report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: TransformError,
    },
}

impl PipelineError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Locate(error) => error.kind(),
            Self::CreateOutputDir { .. } | Self::Open { .. } => FailureKind::Io,
            Self::Transform { error, .. } => error.kind(),
        }
    }
}

/// An error that occurred while calling a worker.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkerError {
    /// The request or response could not be encoded or decoded.
    #[error("error exchanging JSON with the worker")]
    Json(#[source] serde_json::Error),

    /// Reading the request or writing the response failed.
    #[error("error communicating with the worker")]
    Io(#[source] io::Error),

    /// The worker ran the pipeline, and the pipeline failed.
    #[error("worker failed to convert reports")]
    Pipeline(#[from] PipelineError),

    /// The worker process failed.
    #[error("worker process failed")]
    Command(#[from] WorkerCommandError),
}

impl WorkerError {
    /// Returns the kind of this error.
    ///
    /// For a worker process that exited with a documented exit code, this is the kind of the error
    /// the process reported.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Json(_) | Self::Io(_) => FailureKind::Worker,
            Self::Pipeline(error) => error.kind(),
            Self::Command(WorkerCommandError::CommandFailed {
                exit_code: Some(code),
                ..
            }) => FailureKind::from_exit_code(*code).unwrap_or(FailureKind::Worker),
            Self::Command(_) => FailureKind::Worker,
        }
    }
}

/// An error that occurred while aggregating JUnit reports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AggregateError {
    /// No JUnit reports were found.
    #[error("No test report files were found or the XUnit input XML file contained no tests.")]
    NoTestReports,

    /// Locating reports failed.
    #[error("error locating JUnit reports")]
    Locate(#[from] LocateError),

    /// A report could not be opened.
    #[error("error opening JUnit report `{path}`")]
    Open {
        /// The report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A report could not be read.
    #[error("error reading JUnit report `{path}`")]
    Read {
        /// The report.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: DeserializeError,
    },
}

impl AggregateError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoTestReports => FailureKind::Configuration,
            Self::Locate(error) => error.kind(),
            Self::Open { .. } => FailureKind::Io,
            Self::Read { error, .. } => {
                if error.is_security_rejection() {
                    FailureKind::SecurityRejection
                } else {
                    FailureKind::Parse
                }
            }
        }
    }
}

/// An error that occurred while accessing the build record store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildStoreError {
    /// The build ID can't be used as a directory name.
    #[error("invalid build ID `{build_id}`: must be non-empty and must not contain path separators")]
    InvalidBuildId {
        /// The build ID.
        build_id: String,
    },

    /// A directory in the store could not be created.
    #[error("error creating build directory `{dir}`")]
    DirCreate {
        /// The directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The lock file could not be opened or locked.
    #[error("error acquiring lock on `{path}`")]
    FileLock {
        /// The lock file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The build record could not be read.
    #[error("error reading build record from `{path}`")]
    RecordRead {
        /// The record file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// The build record could not be parsed.
    #[error("error deserializing build record from `{path}`")]
    RecordDeserialize {
        /// The record file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The build record could not be serialized.
    #[error("error serializing build record to `{path}`")]
    RecordSerialize {
        /// The record file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// The build record could not be written.
    #[error("error writing build record to `{path}`")]
    RecordWrite {
        /// The record file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: atomicwrites::Error<io::Error>,
    },
}

impl BuildStoreError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidBuildId { .. } => FailureKind::Configuration,
            _ => FailureKind::Io,
        }
    }
}

/// An error that occurred while publishing results for a build.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PublishError {
    /// No xUnit.net reports matched the pattern.
    #[error("No XUnit test report files were found. Configuration error?")]
    NoReportsFound,

    /// Reports were found, but none of them contained any result.
    #[error("{message}")]
    NoTestResults {
        /// The diagnostic produced while deciding the build status.
        message: &'static str,
    },

    /// Calling the worker failed.
    #[error("error converting xUnit reports")]
    Worker(#[from] WorkerError),

    /// Aggregating the converted reports failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Accessing the build record failed.
    #[error("error accessing build record")]
    Store(#[from] BuildStoreError),
}

impl PublishError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoReportsFound | Self::NoTestResults { .. } => FailureKind::Configuration,
            Self::Worker(error) => error.kind(),
            Self::Aggregate(error) => error.kind(),
            Self::Store(error) => error.kind(),
        }
    }

    /// Returns true if this error means that there were no results to record.
    pub fn is_missing_results(&self) -> bool {
        matches!(
            self,
            Self::NoReportsFound
                | Self::NoTestResults { .. }
                | Self::Aggregate(AggregateError::NoTestReports)
        )
    }

    /// Returns the process exit code for this error.
    pub fn process_exit_code(&self) -> i32 {
        if self.is_missing_results() {
            XunitnetExitCode::NO_TEST_RESULTS
        } else {
            self.kind().exit_code()
        }
    }
}
