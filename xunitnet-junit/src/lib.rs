// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate and read JUnit test-suite documents.
//!
//! Documents written by this crate have a single `testsuite` root element. Documents read by this
//! crate may have either a `testsuite` or a `testsuites` root.
//!
//! Neither the writer nor the reader ever resolves entities or loads external resources. The
//! reader additionally refuses document type declarations that carry an external identifier or
//! declare entities: see [`screen_doctype`].

mod deserialize;
mod doctype;
mod errors;
mod report;
mod serialize;
mod time;

pub use deserialize::{hardened_reader, read_test_suites};
pub use doctype::{DoctypeViolation, screen_doctype};
pub use errors::{DeserializeError, SerializeError};
pub use report::*;
pub use time::{ParseSecondsError, format_seconds, parse_seconds};
