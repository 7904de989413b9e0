// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;
use xunitnet_metadata::XunitnetExitCode;
use xunitnet_runner::errors::{
    BuildStoreError, ConfigParseError, PublishError, TransformError, WorkerError,
};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholder messages: errors are expected to be printed with the
// display_to_stderr method, which colorizes them.

/// An expected error that xunitnet reports to the user, as opposed to a panic.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("build store error")]
    BuildStoreError {
        #[from]
        err: BuildStoreError,
    },
    #[error("publish failed")]
    PublishFailed {
        #[from]
        err: PublishError,
    },
    #[error("worker failed")]
    WorkerFailed {
        #[from]
        err: WorkerError,
    },
    #[error("could not determine the path to the current executable")]
    CurrentExe {
        #[source]
        err: std::io::Error,
    },
    #[error("input file could not be opened")]
    InputOpen {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("output directory could not be created")]
    OutputDirCreate {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("transform failed")]
    TransformFailed {
        input: Utf8PathBuf,
        #[source]
        err: TransformError,
    },
    #[error("build not found")]
    BuildNotFound { build_id: String },
    #[error("error serializing build record")]
    RecordSerialize {
        #[source]
        err: serde_json::Error,
    },
    #[error("error writing to stdout")]
    WriteOutput {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::BuildNotFound { .. } => {
                XunitnetExitCode::SETUP_ERROR
            }
            Self::BuildStoreError { err } => err.kind().exit_code(),
            Self::PublishFailed { err } => err.process_exit_code(),
            Self::WorkerFailed { err } => err.kind().exit_code(),
            Self::TransformFailed { err, .. } => err.kind().exit_code(),
            Self::CurrentExe { .. }
            | Self::InputOpen { .. }
            | Self::OutputDirCreate { .. }
            | Self::RecordSerialize { .. }
            | Self::WriteOutput { .. } => XunitnetExitCode::IO_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::BuildStoreError { err } => {
                error!("{err}");
                err.source()
            }
            Self::PublishFailed { err } => {
                error!("{err}");
                err.source()
            }
            Self::WorkerFailed { err } => {
                error!("{err}");
                err.source()
            }
            Self::CurrentExe { err } => {
                error!("could not determine the path to the current executable");
                Some(err as &dyn Error)
            }
            Self::InputOpen { path, err } => {
                error!("could not open input file `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::OutputDirCreate { path, err } => {
                error!(
                    "could not create output directory `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::TransformFailed { input, err } => {
                error!(
                    "could not transform the xUnit report `{}`",
                    input.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::BuildNotFound { build_id } => {
                error!(
                    "no record found for build `{}`",
                    build_id.style(styles.bold)
                );
                None
            }
            Self::RecordSerialize { err } => {
                error!("failed to serialize build record");
                Some(err as &dyn Error)
            }
            Self::WriteOutput { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use xunitnet_runner::errors::AggregateError;

    #[test_case(
        ExpectedError::BuildNotFound { build_id: "1".to_owned() },
        XunitnetExitCode::SETUP_ERROR
        ; "build not found"
    )]
    #[test_case(
        ExpectedError::PublishFailed { err: PublishError::NoReportsFound },
        XunitnetExitCode::NO_TEST_RESULTS
        ; "no reports"
    )]
    #[test_case(
        ExpectedError::PublishFailed { err: AggregateError::NoTestReports.into() },
        XunitnetExitCode::NO_TEST_RESULTS
        ; "no junit reports"
    )]
    #[test_case(
        ExpectedError::TransformFailed {
            input: "a.xml".into(),
            err: TransformError::NoRoot,
        },
        XunitnetExitCode::PARSE_ERROR
        ; "transform parse error"
    )]
    #[test_case(
        ExpectedError::WriteOutput { err: std::io::Error::other("closed") },
        XunitnetExitCode::IO_ERROR
        ; "write output"
    )]
    fn exit_codes(error: ExpectedError, expected: i32) {
        assert_eq!(error.process_exit_code(), expected);
    }
}
