// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for xunitnet: converting xUnit.net reports into JUnit reports and recording
//! the results for a build.
//!
//! A publishing step goes through these stages:
//!
//! 1. [`locate`] selects the xUnit.net reports in a workspace.
//! 2. [`transform`] converts each report into one JUnit document per test collection.
//!    [`pipeline`] drives these two stages, behind the [`worker`] boundary.
//! 3. [`aggregate`] folds the JUnit documents into the cumulative [`result`] of the build.
//! 4. [`decision`] decides how the result affects the build status.
//! 5. [`build_store`] persists the result and status under a per-build lock.
//!
//! [`publisher`] ties these together.

pub mod aggregate;
pub mod build_store;
pub mod config;
pub mod decision;
pub mod errors;
pub mod helpers;
pub mod locate;
pub mod observer;
pub mod pipeline;
pub mod publisher;
pub mod result;
pub mod transform;
pub mod worker;
