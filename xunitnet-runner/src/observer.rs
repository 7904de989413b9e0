// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sinks for the user-facing messages produced while converting reports.

use tracing::{error, info};
use xunitnet_metadata::{DiagnosticLevel, WorkerDiagnostic};

/// Receives messages produced while converting and recording reports.
pub trait ReportObserver {
    /// An informational message.
    fn message(&mut self, message: &str);

    /// A message describing a condition that fails the step.
    fn fatal_error(&mut self, message: &str);

    /// Replays diagnostics collected elsewhere, such as in a worker, in order.
    fn replay(&mut self, diagnostics: &[WorkerDiagnostic]) {
        for diagnostic in diagnostics {
            match diagnostic.level {
                DiagnosticLevel::Info => self.message(&diagnostic.message),
                DiagnosticLevel::Fatal => self.fatal_error(&diagnostic.message),
            }
        }
    }
}

/// A [`ReportObserver`] that logs through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ReportObserver for TracingObserver {
    fn message(&mut self, message: &str) {
        info!("{message}");
    }

    fn fatal_error(&mut self, message: &str) {
        error!("{message}");
    }
}

/// A [`ReportObserver`] that keeps every message, for sending across the worker boundary.
#[derive(Clone, Debug, Default)]
pub struct CollectingObserver {
    diagnostics: Vec<WorkerDiagnostic>,
}

impl CollectingObserver {
    /// Creates a new, empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages collected so far.
    pub fn diagnostics(&self) -> &[WorkerDiagnostic] {
        &self.diagnostics
    }

    /// Returns true if a fatal error was reported.
    pub fn has_fatal_error(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.level == DiagnosticLevel::Fatal)
    }

    /// Consumes the observer, returning the messages collected.
    pub fn into_diagnostics(self) -> Vec<WorkerDiagnostic> {
        self.diagnostics
    }
}

impl ReportObserver for CollectingObserver {
    fn message(&mut self, message: &str) {
        self.diagnostics.push(WorkerDiagnostic::info(message));
    }

    fn fatal_error(&mut self, message: &str) {
        self.diagnostics.push(WorkerDiagnostic::fatal(message));
    }
}
