// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding report files under a directory.

use crate::errors::LocateError;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use tracing::debug;
use walkdir::WalkDir;

/// Finds the files under `root` that match `pattern`.
///
/// `pattern` is an Ant-style include pattern: `*` matches within a single path segment, `**`
/// matches any number of segments, and several patterns may be separated by commas. A pattern that
/// ends in `/` matches everything below that directory.
///
/// Returned paths are relative to `root`, use `/` as the separator and are sorted. If `root`
/// doesn't exist, the result is empty.
pub fn locate(root: &Utf8Path, pattern: &str) -> Result<BTreeSet<Utf8PathBuf>, LocateError> {
    let glob_set = build_glob_set(pattern)?;

    let mut matches = BTreeSet::new();
    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                // A missing root, or a directory that can't be read: nothing to include from it.
                debug!("skipping unreadable entry under {root}: {error}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(relative) = Utf8Path::from_path(relative) else {
            debug!("skipping non-UTF-8 path {}", entry.path().display());
            continue;
        };
        let relative = relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/");

        if glob_set.is_match(&relative) {
            debug!("located {relative}");
            matches.insert(Utf8PathBuf::from(relative));
        }
    }

    Ok(matches)
}

fn build_glob_set(pattern: &str) -> Result<GlobSet, LocateError> {
    let mut builder = GlobSetBuilder::new();
    let mut count = 0;
    for glob in split_globs(pattern)
        .into_iter()
        .map(str::trim)
        .filter(|glob| !glob.is_empty())
    {
        let glob = match glob.strip_suffix('/') {
            Some(dir) => format!("{dir}/**"),
            None => glob.to_owned(),
        };
        let compiled = GlobBuilder::new(&glob)
            .literal_separator(true)
            .case_insensitive(cfg!(any(windows, target_os = "macos")))
            .build()
            .map_err(|error| LocateError::InvalidPattern {
                glob: glob.clone(),
                error,
            })?;
        builder.add(compiled);
        count += 1;
    }

    if count == 0 {
        return Err(LocateError::EmptyPattern {
            pattern: pattern.to_owned(),
        });
    }

    builder.build().map_err(|error| LocateError::InvalidPattern {
        glob: pattern.to_owned(),
        error,
    })
}

/// Splits a pattern on the commas that separate globs.
///
/// Commas inside `{a,b}` alternates and `[...]` classes, or escaped with `\`, belong to the glob.
fn split_globs(pattern: &str) -> Vec<&str> {
    let mut globs = Vec::new();
    let mut depth = 0usize;
    let mut in_class = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, c) in pattern.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => depth += 1,
            '}' if !in_class => depth = depth.saturating_sub(1),
            ',' if !in_class && depth == 0 => {
                globs.push(&pattern[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    globs.push(&pattern[start..]);
    globs
}
