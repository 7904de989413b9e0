// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the boundary between xunitnet and its workers.
//!
//! A publish step hands the report conversion to a worker, which may run in the same process or in
//! a separate `xunitnet worker` process. The request and response types in this crate are what
//! crosses that boundary, encoded as JSON.

mod errors;
mod exit_codes;
mod worker;

pub use errors::*;
pub use exit_codes::*;
pub use worker::*;
