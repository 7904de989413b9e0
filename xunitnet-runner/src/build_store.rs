// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build record storage.
//!
//! The store is a directory with one subdirectory per build. Each build directory contains:
//!
//! - A lock file (`build.lock`) guarding the record against concurrent publishers.
//! - The record itself (`build.json`), replaced atomically on every commit.

use crate::{decision::BuildStatus, errors::BuildStoreError, result::TestResult};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, FixedOffset};
use debug_ignore::DebugIgnore;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{self, Write},
};
use tracing::debug;

static BUILD_LOCK_FILE_NAME: &str = "build.lock";
static BUILD_JSON_FILE_NAME: &str = "build.json";

/// Everything recorded about a build.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildRecord {
    /// The current status of the build.
    pub status: BuildStatus,

    /// When the build started. Test results are stamped with this time.
    pub started_at: DateTime<FixedOffset>,

    /// The cumulative test result, if any results were recorded.
    #[serde(default)]
    pub test_result: Option<TestResult>,
}

impl BuildRecord {
    /// Creates a record for a build that has just started.
    pub fn new(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            status: BuildStatus::Success,
            started_at,
            test_result: None,
        }
    }
}

/// Manages the records of builds.
#[derive(Debug)]
pub struct BuildStore {
    builds_dir: Utf8PathBuf,
}

impl BuildStore {
    /// Creates a new `BuildStore` at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(store_dir: &Utf8Path) -> Result<Self, BuildStoreError> {
        let builds_dir = store_dir.join("builds");
        std::fs::create_dir_all(&builds_dir).map_err(|error| BuildStoreError::DirCreate {
            dir: builds_dir.clone(),
            error,
        })?;

        Ok(Self { builds_dir })
    }

    /// Returns the directory for the given build.
    pub fn build_dir(&self, build_id: &str) -> Result<Utf8PathBuf, BuildStoreError> {
        validate_build_id(build_id)?;
        Ok(self.builds_dir.join(build_id))
    }

    /// Acquires an exclusive lock on the record for `build_id`, blocking until it is available.
    ///
    /// The lock is held until the returned value is dropped. Nothing else can read or write the
    /// record in the meantime.
    pub fn lock_exclusive(&self, build_id: &str) -> Result<ExclusiveLockedBuild, BuildStoreError> {
        let build_dir = self.build_dir(build_id)?;
        std::fs::create_dir_all(&build_dir).map_err(|error| BuildStoreError::DirCreate {
            dir: build_dir.clone(),
            error,
        })?;

        let file = open_lock_file(&build_dir)?;
        file.lock().map_err(|error| BuildStoreError::FileLock {
            path: build_dir.join(BUILD_LOCK_FILE_NAME),
            error,
        })?;
        debug!("acquired exclusive lock on build `{build_id}`");
        let record = read_build_json(&build_dir)?;

        Ok(ExclusiveLockedBuild {
            build_dir,
            locked_file: DebugIgnore(file),
            record,
        })
    }

    /// Reads the record for `build_id` under a shared lock.
    ///
    /// Returns `None` if nothing was ever recorded for the build.
    pub fn read(&self, build_id: &str) -> Result<Option<BuildRecord>, BuildStoreError> {
        let build_dir = self.build_dir(build_id)?;
        if !build_dir.is_dir() {
            return Ok(None);
        }

        let file = open_lock_file(&build_dir)?;
        file.lock_shared()
            .map_err(|error| BuildStoreError::FileLock {
                path: build_dir.join(BUILD_LOCK_FILE_NAME),
                error,
            })?;
        read_build_json(&build_dir)
    }
}

/// A build record that has been locked for exclusive access.
#[derive(Debug)]
pub struct ExclusiveLockedBuild {
    build_dir: Utf8PathBuf,
    // Held for RAII lock semantics; the lock is released when this struct is dropped.
    #[expect(dead_code)]
    locked_file: DebugIgnore<File>,
    record: Option<BuildRecord>,
}

impl ExclusiveLockedBuild {
    /// Returns the directory of the locked build.
    pub fn build_dir(&self) -> &Utf8Path {
        &self.build_dir
    }

    /// Returns the stored record, if any.
    pub fn record(&self) -> Option<&BuildRecord> {
        self.record.as_ref()
    }

    /// Persists `record`, replacing the stored one.
    ///
    /// The write is atomic: if it fails, the previously stored record is left in place.
    pub fn commit(&mut self, record: BuildRecord) -> Result<(), BuildStoreError> {
        let path = self.build_dir.join(BUILD_JSON_FILE_NAME);
        let bytes = serde_json::to_vec_pretty(&record).map_err(|error| {
            BuildStoreError::RecordSerialize {
                path: path.clone(),
                error,
            }
        })?;

        atomicwrites::AtomicFile::new(&path, atomicwrites::AllowOverwrite)
            .write(|file| file.write_all(&bytes))
            .map_err(|error| BuildStoreError::RecordWrite {
                path: path.clone(),
                error,
            })?;
        debug!("wrote build record to {path}");

        self.record = Some(record);
        Ok(())
    }
}

fn validate_build_id(build_id: &str) -> Result<(), BuildStoreError> {
    let valid = !build_id.is_empty()
        && build_id != "."
        && build_id != ".."
        && !build_id.contains(['/', '\\', ':']);
    if valid {
        Ok(())
    } else {
        Err(BuildStoreError::InvalidBuildId {
            build_id: build_id.to_owned(),
        })
    }
}

fn open_lock_file(build_dir: &Utf8Path) -> Result<File, BuildStoreError> {
    let lock_file_path = build_dir.join(BUILD_LOCK_FILE_NAME);
    std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_file_path)
        .map_err(|error| BuildStoreError::FileLock {
            path: lock_file_path,
            error,
        })
}

fn read_build_json(build_dir: &Utf8Path) -> Result<Option<BuildRecord>, BuildStoreError> {
    let path = build_dir.join(BUILD_JSON_FILE_NAME);
    let contents = match std::fs::read(&path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(BuildStoreError::RecordRead { path, error }),
    };

    serde_json::from_slice(&contents)
        .map(Some)
        .map_err(|error| BuildStoreError::RecordDeserialize { path, error })
}
