// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converting every xUnit.net report selected by a pattern.

use crate::{
    errors::PipelineError, helpers::plural, locate::locate, observer::ReportObserver,
    transform::transform,
};
use std::{fs::File, io::BufReader};
use tracing::{debug, info};
use xunitnet_metadata::{ArchiveRequest, ArchiveSummary};

/// Logged when no report matches and that is fatal.
pub static NO_REPORTS_FATAL_MESSAGE: &str =
    "No XUnit test report files were found. Configuration error?";

/// Logged when no report matches and that is allowed.
pub static NO_REPORTS_MESSAGE: &str = "No XUnit test report files were found.";

/// Converts the reports selected by `request` into JUnit reports under
/// `request.root/request.output_dir_name`.
///
/// Finding no reports is reported to `observer` and results in `found = false`; it is up to the
/// caller to decide whether that fails the step. The first report that can't be converted stops
/// the run.
pub fn run(
    request: &ArchiveRequest,
    observer: &mut dyn ReportObserver,
) -> Result<ArchiveSummary, PipelineError> {
    let reports = locate(&request.root, &request.pattern)?;
    if reports.is_empty() {
        if request.fail_if_no_results {
            observer.fatal_error(NO_REPORTS_FATAL_MESSAGE);
        } else {
            observer.message(NO_REPORTS_MESSAGE);
        }
        return Ok(ArchiveSummary {
            found: false,
            file_count: 0,
        });
    }

    let output_dir = request.root.join(&request.output_dir_name);
    std::fs::create_dir_all(&output_dir).map_err(|error| PipelineError::CreateOutputDir {
        path: output_dir.clone(),
        error,
    })?;

    let mut file_count = 0;
    for report in &reports {
        let path = request.root.join(report);
        let file = File::open(&path).map_err(|error| PipelineError::Open {
            path: path.clone(),
            error,
        })?;
        let written = transform(BufReader::new(file), &output_dir)
            .map_err(|error| PipelineError::Transform { path, error })?;
        debug!(
            "converted {report} into {} JUnit {}",
            written.len(),
            plural::reports_str(written.len()),
        );
        file_count += 1;
    }

    info!(
        "converted {file_count} xUnit {} into {output_dir}",
        plural::reports_str(file_count)
    );
    Ok(ArchiveSummary {
        found: true,
        file_count,
    })
}
