// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for xunitnet.
//!
//! The embedded default configuration is layered under an optional per-workspace config file.

use crate::errors::ConfigParseError;
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Trait for handling configuration warnings.
pub trait ConfigWarnings {
    /// Handle unknown configuration keys found in a config file.
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    );
}

/// Logs configuration warnings through `tracing`.
pub struct DefaultConfigWarnings;

impl ConfigWarnings for DefaultConfigWarnings {
    fn unknown_config_keys(
        &mut self,
        config_file: &Utf8Path,
        workspace_root: &Utf8Path,
        unknown: &BTreeSet<String>,
    ) {
        let mut unknown_str = String::new();
        let mut iter = unknown.iter();
        match (iter.next(), unknown.len()) {
            (Some(key), 1) => {
                // Print this on the same line.
                unknown_str.push_str("key: ");
                unknown_str.push_str(key);
            }
            _ => {
                unknown_str.push_str("keys:\n");
                for ignored_key in unknown {
                    unknown_str.push('\n');
                    unknown_str.push_str("  - ");
                    unknown_str.push_str(ignored_key);
                }
            }
        }

        warn!(
            "in config file {}, ignoring unknown configuration {unknown_str}",
            config_file
                .strip_prefix(workspace_root)
                .unwrap_or(config_file),
        )
    }
}

/// Policy for one publishing step.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PolicyConfig {
    /// The pattern selecting xUnit.net reports, relative to the workspace.
    pub pattern: String,

    /// Whether finding no reports, or no results in them, fails the build.
    pub fail_if_no_results: bool,

    /// Whether failed tests mark the build as failed rather than unstable.
    pub failed_tests_fail_build: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoreConfig {
    dir: Utf8PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct XunitnetConfigDeserialize {
    publish: PolicyConfig,
    store: StoreConfig,
}

/// Overall configuration for xunitnet.
#[derive(Clone, Debug)]
pub struct XunitnetConfig {
    workspace_root: Utf8PathBuf,
    config_file: Utf8PathBuf,
    policy: PolicyConfig,
    store_dir: Utf8PathBuf,
}

impl XunitnetConfig {
    /// The default location of the config within the workspace: `.config/xunitnet.toml`.
    pub const CONFIG_PATH: &'static str = ".config/xunitnet.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Values in the workspace config file override the defaults.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the configuration for the workspace at `workspace_root`.
    ///
    /// If `config_file` is given it must exist. Otherwise `.config/xunitnet.toml` in the
    /// workspace is read if present, and the defaults are used if not.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_warnings(workspace_root, config_file, &mut DefaultConfigWarnings)
    }

    /// Reads the configuration with custom warning handling.
    pub fn from_sources_with_warnings(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        warnings: &mut impl ConfigWarnings,
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let (config_file, required) = match config_file {
            Some(config_file) => (config_file.to_owned(), true),
            None => (workspace_root.join(Self::CONFIG_PATH), false),
        };

        let config = Self::make_default_config()
            .add_source(File::new(config_file.as_str(), FileFormat::Toml).required(required))
            .build()
            .map_err(|error| ConfigParseError::new(&config_file, error))?;

        let mut unknown = BTreeSet::new();
        let deserialized: XunitnetConfigDeserialize =
            serde_ignored::deserialize(config, |path: serde_ignored::Path| {
                unknown.insert(path.to_string());
            })
            .map_err(|error| ConfigParseError::new(&config_file, error))?;

        if !unknown.is_empty() {
            warnings.unknown_config_keys(&config_file, &workspace_root, &unknown);
        }

        Ok(Self {
            policy: deserialized.publish,
            store_dir: workspace_root.join(deserialized.store.dir),
            workspace_root,
            config_file,
        })
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// Returns the workspace root.
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Returns the config file that was read, or would have been read if it existed.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the publishing policy.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Returns a mutable reference to the publishing policy, for command-line overrides.
    pub fn policy_mut(&mut self) -> &mut PolicyConfig {
        &mut self.policy
    }

    /// Returns the directory build records are stored in.
    ///
    /// A relative directory in the config is resolved against the workspace root.
    pub fn store_dir(&self) -> &Utf8Path {
        &self.store_dir
    }
}
