// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `xunitnet` failures.
///
/// `xunitnet` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum XunitnetExitCode {}

impl XunitnetExitCode {
    /// No errors occurred and the build status is success.
    pub const OK: i32 = 0;

    /// Reports were recorded and some tests failed, marking the build unstable.
    pub const UNSTABLE: i32 = 4;

    /// Reports were recorded and the build was marked as failed.
    pub const BUILD_FAILED: i32 = 100;

    /// No test reports were found, or the reports contained no results.
    pub const NO_TEST_RESULTS: i32 = 101;

    /// An input report was not well-formed or had an unexpected root element.
    pub const PARSE_ERROR: i32 = 102;

    /// An input report was rejected because its document type declaration was unsafe.
    pub const SECURITY_REJECTION: i32 = 103;

    /// An input report could not be mapped to JUnit.
    pub const TRANSFORMATION_ERROR: i32 = 104;

    /// The worker process could not be run or returned an invalid response.
    pub const WORKER_ERROR: i32 = 105;

    /// Reading or writing files produced an error.
    pub const IO_ERROR: i32 = 110;

    /// A user issue happened while setting up an xunitnet invocation, such as an invalid pattern
    /// or configuration file.
    pub const SETUP_ERROR: i32 = 96;
}
