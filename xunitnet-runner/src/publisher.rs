// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The publishing step: convert, aggregate, decide and record.

use crate::{
    aggregate::aggregate,
    build_store::{BuildRecord, BuildStore, ExclusiveLockedBuild},
    config::PolicyConfig,
    decision::{BuildStatus, StatusChange, decide},
    errors::{AggregateError, PublishError},
    helpers::plural,
    observer::ReportObserver,
    result::ResultCounts,
    transform::{JUNIT_FILE_EXTENSION, JUNIT_FILE_PREFIX},
    worker::Worker,
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use std::io;
use tracing::{debug, info, warn};
use uuid::Uuid;
use xunitnet_metadata::{ArchiveRequest, ArchiveSummary};

/// The first message of every publishing step.
pub static RECORDING_MESSAGE: &str = "Recording XUnit tests results";

static TEMP_DIR_PREFIX: &str = "tempJunitReports";

/// What a successful publishing step did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PublishOutcome {
    /// The build status after the step.
    pub status: BuildStatus,

    /// What the worker converted.
    pub summary: ArchiveSummary,

    /// Counts over the cumulative result of the build.
    pub counts: ResultCounts,
}

/// Publishes xUnit.net results for one build.
#[derive(Clone, Debug)]
pub struct Publisher {
    build_id: String,
    policy: PolicyConfig,
    started_at: DateTime<FixedOffset>,
}

impl Publisher {
    /// Creates a new publisher.
    ///
    /// `started_at` is used as the start time of the build if nothing was recorded for it yet.
    pub fn new(
        build_id: impl Into<String>,
        policy: PolicyConfig,
        started_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            build_id: build_id.into(),
            policy,
            started_at,
        }
    }

    /// Converts the xUnit.net reports in `workspace` through `worker` and records the results for
    /// the build.
    ///
    /// The cumulative result is updated under an exclusive lock on the build record, so
    /// concurrent publishers for the same build are serialized. Converted reports are written to
    /// a temporary directory in the workspace, which is removed before returning.
    pub fn perform(
        &self,
        workspace: &Utf8Path,
        store: &BuildStore,
        worker: &dyn Worker,
        observer: &mut dyn ReportObserver,
    ) -> Result<PublishOutcome, PublishError> {
        observer.message(RECORDING_MESSAGE);

        let output_dir_name = format!("{TEMP_DIR_PREFIX}{}", Uuid::new_v4());
        let request = ArchiveRequest {
            root: workspace.to_owned(),
            pattern: self.policy.pattern.clone(),
            output_dir_name: output_dir_name.clone(),
            fail_if_no_results: self.policy.fail_if_no_results,
        };

        let res = self.perform_impl(&request, store, worker, observer);
        remove_temp_dir(&workspace.join(&output_dir_name));
        res
    }

    fn perform_impl(
        &self,
        request: &ArchiveRequest,
        store: &BuildStore,
        worker: &dyn Worker,
        observer: &mut dyn ReportObserver,
    ) -> Result<PublishOutcome, PublishError> {
        let response = worker.call(request)?;
        observer.replay(&response.diagnostics);
        let summary = response.summary;

        let mut locked = store.lock_exclusive(&self.build_id)?;
        let mut record = locked
            .record()
            .cloned()
            .unwrap_or_else(|| BuildRecord::new(self.started_at));

        if !summary.found {
            if self.policy.fail_if_no_results {
                fail_build(&mut locked, record)?;
                return Err(PublishError::NoReportsFound);
            }
            return Ok(PublishOutcome {
                status: record.status,
                summary,
                counts: record
                    .test_result
                    .as_ref()
                    .map(|result| result.counts())
                    .unwrap_or_default(),
            });
        }

        let pattern = format!(
            "{}/{JUNIT_FILE_PREFIX}*.{JUNIT_FILE_EXTENSION}",
            request.output_dir_name
        );
        let result = match aggregate(
            &request.root,
            &pattern,
            record.test_result.as_ref(),
            record.started_at,
            &self.policy,
        ) {
            Ok(result) => result,
            Err(error @ AggregateError::NoTestReports) => {
                observer.fatal_error(&error.to_string());
                fail_build(&mut locked, record)?;
                return Err(error.into());
            }
            Err(error) => return Err(error.into()),
        };

        let decision = decide(&result, &self.policy);
        record.status = record.status.apply(decision.change);
        if let Some(diagnostic) = decision.diagnostic {
            observer.fatal_error(diagnostic);
        }
        if decision.must_abort {
            let message = decision.diagnostic.unwrap_or_default();
            locked.commit(record)?;
            return Err(PublishError::NoTestResults { message });
        }

        let counts = result.counts();
        record.test_result = Some(result);
        let status = record.status;
        locked.commit(record)?;

        info!(
            "recorded {} {} ({} passed, {} failed, {} skipped) for build `{}`: status is {status}",
            counts.total,
            plural::tests_str(counts.total),
            counts.passed,
            counts.failed,
            counts.skipped,
            self.build_id,
        );
        Ok(PublishOutcome {
            status,
            summary,
            counts,
        })
    }
}

fn fail_build(
    locked: &mut ExclusiveLockedBuild,
    mut record: BuildRecord,
) -> Result<(), PublishError> {
    record.status = record
        .status
        .apply(StatusChange::DowngradeTo(BuildStatus::Failure));
    locked.commit(record)?;
    Ok(())
}

fn remove_temp_dir(dir: &Utf8Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!("removed {dir}"),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!("failed to remove temporary directory {dir}: {error}"),
    }
}
