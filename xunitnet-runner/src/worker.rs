// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary between a publish step and the code that converts reports.
//!
//! Requests and responses only ever cross the boundary as JSON, whether the worker runs in this
//! process ([`LocalWorker`]) or in a separate `xunitnet worker` process ([`ProcessWorker`]).

use crate::{errors::WorkerError, observer::CollectingObserver, pipeline};
use camino::Utf8PathBuf;
use std::io::{Read, Write};
use tracing::debug;
use xunitnet_metadata::{ArchiveRequest, ArchiveResponse, WorkerCommandError};

/// Runs archive requests.
pub trait Worker {
    /// Runs a single request to completion.
    fn call(&self, request: &ArchiveRequest) -> Result<ArchiveResponse, WorkerError>;
}

/// Serves a single request: reads an [`ArchiveRequest`] as JSON from `input`, runs it, and writes
/// an [`ArchiveResponse`] as JSON to `output`.
///
/// This is the body of the `xunitnet worker` command.
pub fn serve(input: impl Read, mut output: impl Write) -> Result<(), WorkerError> {
    let request: ArchiveRequest = serde_json::from_reader(input).map_err(WorkerError::Json)?;
    debug!("worker received request for pattern `{}`", request.pattern);

    let mut observer = CollectingObserver::new();
    let summary = pipeline::run(&request, &mut observer)?;
    let response = ArchiveResponse {
        summary,
        diagnostics: observer.into_diagnostics(),
    };

    serde_json::to_writer(&mut output, &response).map_err(WorkerError::Json)?;
    output.flush().map_err(WorkerError::Io)
}

/// A worker that runs requests in the current process.
///
/// The request and response still make a round trip through JSON, so that the behavior matches a
/// [`ProcessWorker`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalWorker;

impl Worker for LocalWorker {
    fn call(&self, request: &ArchiveRequest) -> Result<ArchiveResponse, WorkerError> {
        let request_json = serde_json::to_vec(request).map_err(WorkerError::Json)?;
        let mut response_json = Vec::new();
        serve(request_json.as_slice(), &mut response_json)?;
        serde_json::from_slice(&response_json).map_err(WorkerError::Json)
    }
}

/// A worker that runs each request in a child process.
#[derive(Clone, Debug)]
pub struct ProcessWorker {
    program: Utf8PathBuf,
    args: Vec<String>,
}

impl ProcessWorker {
    /// The subcommand that serves requests.
    pub const WORKER_SUBCOMMAND: &'static str = "worker";

    /// Creates a worker that runs `program worker`, where `program` is an `xunitnet` binary.
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self::with_args(program, [Self::WORKER_SUBCOMMAND])
    }

    /// Creates a worker that runs `program` with arbitrary arguments.
    ///
    /// The program must read a request from standard input and write a response to standard
    /// output.
    pub fn with_args(
        program: impl Into<Utf8PathBuf>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn call_impl(&self, request: &ArchiveRequest) -> Result<ArchiveResponse, WorkerCommandError> {
        let input = serde_json::to_vec(request).map_err(WorkerCommandError::Json)?;
        let expression = duct::cmd(self.program.as_str(), &self.args)
            .stdin_bytes(input)
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        debug!("executing worker: {:?}", expression);

        let output = expression.run().map_err(WorkerCommandError::Exec)?;
        if !output.status.success() {
            return Err(WorkerCommandError::CommandFailed {
                exit_code: output.status.code(),
                stderr: output.stderr,
            });
        }

        serde_json::from_slice(&output.stdout).map_err(WorkerCommandError::Json)
    }
}

impl Worker for ProcessWorker {
    fn call(&self, request: &ArchiveRequest) -> Result<ArchiveResponse, WorkerError> {
        Ok(self.call_impl(request)?)
    }
}
