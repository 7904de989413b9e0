// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::doctype::DoctypeViolation;
use std::{io, str::Utf8Error};
use thiserror::Error;

/// An error that occurs while serializing a [`TestSuite`](crate::TestSuite).
///
/// Returned by [`TestSuite::serialize`](crate::TestSuite::serialize) and
/// [`TestSuite::to_string`](crate::TestSuite::to_string).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// An error occurred while writing XML events.
    #[error("error serializing JUnit document")]
    Xml(#[from] quick_xml::Error),

    /// An I/O error occurred while writing to the underlying writer.
    #[error("error writing JUnit document")]
    Io(#[from] io::Error),

    /// The serialized output was not valid UTF-8.
    #[error("serialized JUnit document is not valid UTF-8")]
    Utf8(#[source] Utf8Error),
}

/// An error that occurs while reading a JUnit document.
///
/// Returned by [`read_test_suites`](crate::read_test_suites).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The document is not well-formed XML, or contains an unknown entity reference.
    #[error("malformed XML at byte {position}")]
    Xml {
        /// The byte offset at which the error was detected.
        position: u64,

        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The document type declaration was rejected.
    #[error("document type declaration rejected")]
    Doctype(#[from] DoctypeViolation),

    /// The root element is not one that was expected.
    #[error("unexpected root element `{found}` (expected one of: {})", .expected.join(", "))]
    UnexpectedRoot {
        /// The name of the root element found.
        found: String,

        /// The names that would have been accepted.
        expected: &'static [&'static str],
    },

    /// The document ended while elements were still open.
    #[error("unexpected end of document: element `{open}` was never closed")]
    UnexpectedEof {
        /// The innermost element that was still open.
        open: String,
    },

    /// The document had no root element.
    #[error("document has no root element")]
    NoRoot,

    /// Content was found after the root element was closed.
    #[error("unexpected content after the root element")]
    TrailingContent,
}

impl DeserializeError {
    /// Returns true if this error was caused by a rejected document type declaration.
    pub fn is_security_rejection(&self) -> bool {
        matches!(self, Self::Doctype(_))
    }
}
