// Copyright (c) The xunitnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line parsing and command routing.

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, StdoutStyles},
};
use camino::Utf8PathBuf;
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::{
    fs::File,
    io::{self, BufReader, Write},
};
use tracing::{debug, info};
use xunitnet_metadata::XunitnetExitCode;
use xunitnet_runner::{
    build_store::{BuildRecord, BuildStore},
    config::XunitnetConfig,
    decision::BuildStatus,
    helpers::plural,
    observer::TracingObserver,
    publisher::Publisher,
    result::CaseStatus,
    transform::transform,
    worker::{self, LocalWorker, ProcessWorker, Worker},
};

/// Convert xUnit.net test reports into JUnit reports and record the results of builds.
#[derive(Debug, Parser)]
#[command(
    name = "xunitnet",
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct XunitnetApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl XunitnetApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        match &self.command {
            // The worker's stdout carries the response, so it should never use coloring.
            Command::Worker => OutputContext::worker_init(),
            _ => self.output.init(),
        }
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        match self.command {
            Command::Publish(opts) => opts.exec(),
            Command::Transform(opts) => opts.exec(),
            Command::Show(opts) => opts.exec(output),
            Command::Worker => {
                worker::serve(io::stdin().lock(), io::stdout().lock())?;
                Ok(XunitnetExitCode::OK)
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert xUnit.net reports and record the results for a build
    ///
    /// Exits with 0 if the build is successful, 4 if it is unstable because tests failed, and 100
    /// if it failed.
    Publish(PublishOpts),

    /// Convert a single xUnit.net report into JUnit reports
    Transform(TransformOpts),

    /// Show the results recorded for a build
    Show(ShowOpts),

    /// Private command: serve one conversion request read from stdin.
    #[command(name = ProcessWorker::WORKER_SUBCOMMAND, hide = true)]
    Worker,
}

#[derive(Debug, Args)]
struct WorkspaceOpts {
    /// Workspace that patterns and the store directory are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    workspace: Utf8PathBuf,

    /// Config file [default: .config/xunitnet.toml in the workspace]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl WorkspaceOpts {
    fn load_config(&self) -> Result<XunitnetConfig> {
        let config = XunitnetConfig::from_sources(&self.workspace, self.config_file.as_deref())?;
        debug!("build records are stored in {}", config.store_dir());
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct PublishOpts {
    #[clap(flatten)]
    workspace: WorkspaceOpts,

    /// Identifier of the build the results belong to
    #[arg(long, value_name = "ID", env = "XUNITNET_BUILD_ID", default_value = "local")]
    build_id: String,

    /// Pattern selecting xUnit.net reports, relative to the workspace
    #[arg(long, value_name = "PATTERN")]
    pattern: Option<String>,

    /// Do not fail the build if no reports or no results are found
    #[arg(long)]
    no_fail_if_no_results: bool,

    /// Fail the build, rather than marking it unstable, if any test failed
    #[arg(long)]
    failed_tests_fail_build: bool,

    /// Convert reports in a separate worker process
    #[arg(long)]
    isolated: bool,
}

impl PublishOpts {
    fn exec(self) -> Result<i32> {
        let mut config = self.workspace.load_config()?;
        let policy = config.policy_mut();
        if let Some(pattern) = self.pattern {
            policy.pattern = pattern;
        }
        if self.no_fail_if_no_results {
            policy.fail_if_no_results = false;
        }
        if self.failed_tests_fail_build {
            policy.failed_tests_fail_build = true;
        }

        let store = BuildStore::new(config.store_dir())?;
        let publisher = Publisher::new(
            self.build_id,
            config.policy().clone(),
            Local::now().fixed_offset(),
        );

        let worker: Box<dyn Worker> = if self.isolated {
            Box::new(ProcessWorker::new(current_exe()?))
        } else {
            Box::new(LocalWorker)
        };

        let outcome = publisher.perform(
            config.workspace_root(),
            &store,
            worker.as_ref(),
            &mut TracingObserver,
        )?;
        Ok(status_exit_code(outcome.status))
    }
}

fn current_exe() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().map_err(|err| ExpectedError::CurrentExe { err })?;
    Utf8PathBuf::try_from(exe).map_err(|err| ExpectedError::CurrentExe {
        err: err.into_io_error(),
    })
}

fn status_exit_code(status: BuildStatus) -> i32 {
    match status {
        BuildStatus::Success => XunitnetExitCode::OK,
        BuildStatus::Unstable => XunitnetExitCode::UNSTABLE,
        BuildStatus::Failure => XunitnetExitCode::BUILD_FAILED,
    }
}

#[derive(Debug, Args)]
struct TransformOpts {
    /// The xUnit.net report to convert
    #[arg(value_name = "INPUT")]
    input: Utf8PathBuf,

    /// Directory to write JUnit reports to, created if missing
    #[arg(long, value_name = "DIR")]
    output_dir: Utf8PathBuf,
}

impl TransformOpts {
    fn exec(self) -> Result<i32> {
        let file = File::open(&self.input).map_err(|err| ExpectedError::InputOpen {
            path: self.input.clone(),
            err,
        })?;
        std::fs::create_dir_all(&self.output_dir).map_err(|err| {
            ExpectedError::OutputDirCreate {
                path: self.output_dir.clone(),
                err,
            }
        })?;

        let written = transform(BufReader::new(file), &self.output_dir).map_err(|err| {
            ExpectedError::TransformFailed {
                input: self.input.clone(),
                err,
            }
        })?;
        info!(
            "wrote {} JUnit {} to {}",
            written.len(),
            plural::reports_str(written.len()),
            self.output_dir,
        );

        let mut stdout = io::stdout().lock();
        for path in &written {
            writeln!(stdout, "{path}").map_err(|err| ExpectedError::WriteOutput { err })?;
        }
        Ok(XunitnetExitCode::OK)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// A human-readable summary
    #[default]
    Plain,
    /// The build record as JSON
    Json,
    /// The build record as pretty-printed JSON
    JsonPretty,
}

#[derive(Debug, Args)]
struct ShowOpts {
    #[clap(flatten)]
    workspace: WorkspaceOpts,

    /// Identifier of the build to show
    #[arg(long, value_name = "ID", env = "XUNITNET_BUILD_ID")]
    build_id: String,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,
}

impl ShowOpts {
    fn exec(self, output: OutputContext) -> Result<i32> {
        let config = self.workspace.load_config()?;
        let store = BuildStore::new(config.store_dir())?;
        let record = store
            .read(&self.build_id)?
            .ok_or_else(|| ExpectedError::BuildNotFound {
                build_id: self.build_id.clone(),
            })?;

        let mut stdout = io::stdout().lock();
        match self.message_format {
            MessageFormat::Plain => {
                write_plain(&self.build_id, &record, &output.stdout_styles(), &mut stdout)
                    .map_err(|err| ExpectedError::WriteOutput { err })?;
            }
            MessageFormat::Json => {
                serde_json::to_writer(&mut stdout, &record)
                    .map_err(|err| ExpectedError::RecordSerialize { err })?;
                writeln!(stdout).map_err(|err| ExpectedError::WriteOutput { err })?;
            }
            MessageFormat::JsonPretty => {
                serde_json::to_writer_pretty(&mut stdout, &record)
                    .map_err(|err| ExpectedError::RecordSerialize { err })?;
                writeln!(stdout).map_err(|err| ExpectedError::WriteOutput { err })?;
            }
        }
        Ok(XunitnetExitCode::OK)
    }
}

fn write_plain(
    build_id: &str,
    record: &BuildRecord,
    styles: &StdoutStyles,
    writer: &mut impl Write,
) -> io::Result<()> {
    let status_style = match record.status {
        BuildStatus::Success => styles.passed,
        BuildStatus::Unstable => styles.skipped,
        BuildStatus::Failure => styles.failed,
    };
    writeln!(
        writer,
        "{} {}: {}",
        "build".style(styles.heading),
        build_id.style(styles.heading),
        record.status.style(status_style),
    )?;
    writeln!(writer, "started at {}", record.started_at.to_rfc3339())?;

    let Some(result) = &record.test_result else {
        writeln!(writer, "no test results recorded")?;
        return Ok(());
    };

    let counts = result.counts();
    writeln!(
        writer,
        "{} {}: {} passed, {} failed, {} skipped",
        counts.total,
        plural::tests_str(counts.total),
        counts.passed.style(styles.passed),
        counts.failed.style(styles.failed),
        counts.skipped.style(styles.skipped),
    )?;

    for suite in result.suites() {
        let counts = suite.counts();
        writeln!(
            writer,
            "  {}: {} {}, {} failed, {} skipped",
            suite.name().style(styles.heading),
            counts.total,
            plural::tests_str(counts.total),
            counts.failed,
            counts.skipped,
        )?;
        for case in suite.cases() {
            if let CaseStatus::Failed { message, .. } = &case.status {
                write!(
                    writer,
                    "    {} {}",
                    "FAIL".style(styles.failed),
                    case.display_name()
                )?;
                match message {
                    Some(message) => writeln!(writer, ": {message}")?,
                    None => writeln!(writer)?,
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use clap::CommandFactory;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use xunitnet_junit::{NonSuccessKind, TestCase, TestCaseStatus, TestSuite};
    use xunitnet_runner::result::TestResult;

    #[test]
    fn verify_app() {
        XunitnetApp::command().debug_assert();
    }

    #[test]
    fn parse_publish() {
        let app = XunitnetApp::try_parse_from([
            "xunitnet",
            "publish",
            "--workspace",
            "ws",
            "--build-id",
            "42",
            "--pattern",
            "**/*.xml",
            "--no-fail-if-no-results",
            "--isolated",
            "--color",
            "never",
        ])
        .expect("arguments are valid");

        let Command::Publish(opts) = app.command else {
            panic!("expected publish command");
        };
        assert_eq!(opts.workspace.workspace, "ws");
        assert_eq!(opts.build_id, "42");
        assert_eq!(opts.pattern.as_deref(), Some("**/*.xml"));
        assert!(opts.no_fail_if_no_results);
        assert!(!opts.failed_tests_fail_build);
        assert!(opts.isolated);
    }

    #[test]
    fn parse_show_formats() {
        let app = XunitnetApp::try_parse_from([
            "xunitnet",
            "show",
            "--build-id",
            "1",
            "--message-format",
            "json-pretty",
        ])
        .expect("arguments are valid");
        let Command::Show(opts) = app.command else {
            panic!("expected show command");
        };
        assert_eq!(opts.message_format, MessageFormat::JsonPretty);
        assert_eq!(opts.workspace.workspace, ".");
    }

    #[test]
    fn worker_is_hidden() {
        let help = XunitnetApp::command().render_help().to_string();
        assert!(help.contains("publish"), "{help}");
        assert!(!help.contains("worker"), "{help}");
    }

    fn started_at() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 26, 16, 3, 9)
            .unwrap()
    }

    #[test]
    fn plain_output() {
        let mut suite = TestSuite::new("Calc.Tests");
        let mut passed = TestCase::new("Adds", TestCaseStatus::success());
        passed.set_classname("Calc.Tests");
        let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
        status.set_message("expected 2");
        let mut failed = TestCase::new("Divides", status);
        failed.set_classname("Calc.Tests");
        suite.add_test_cases([passed, failed]);

        let mut result = TestResult::new(started_at());
        result.merge_suite(&suite);
        let record = BuildRecord {
            status: BuildStatus::Unstable,
            started_at: started_at(),
            test_result: Some(result),
        };

        let mut out = Vec::new();
        write_plain("7", &record, &StdoutStyles::default(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            indoc! {"
                build 7: unstable
                started at 2024-03-26T16:03:09+00:00
                2 tests: 1 passed, 1 failed, 0 skipped
                  Calc.Tests: 2 tests, 1 failed, 0 skipped
                    FAIL Calc.Tests#Divides: expected 2
            "}
        );
    }

    #[test]
    fn plain_output_without_results() {
        let record = BuildRecord::new(started_at());
        let mut out = Vec::new();
        write_plain("7", &record, &StdoutStyles::default(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "build 7: success\nstarted at 2024-03-26T16:03:09+00:00\nno test results recorded\n"
        );
    }
}
