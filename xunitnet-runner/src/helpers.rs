// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for xunitnet-runner.

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "report" if `count` is 1, otherwise "reports".
    pub fn reports_str(count: usize) -> &'static str {
        if count == 1 { "report" } else { "reports" }
    }

    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "suite" if `count` is 1, otherwise "suites".
    pub fn suites_str(count: usize) -> &'static str {
        if count == 1 { "suite" } else { "suites" }
    }
}
