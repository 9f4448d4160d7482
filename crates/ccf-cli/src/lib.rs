//! Shared plumbing for the job-wrapper binaries.
//!
//! Flag structs, flag-to-request mapping, usage handling and exit codes. The
//! binaries themselves only parse, validate, build the services and report.

use anyhow::Context;
use ccf_api_client::XnatClient;
use ccf_core::validation::require;
use ccf_core::{
    ArchiveConfig, ArchiveError, ArchiveResult, Credentials, ErrorMetadata, LogLevel, Protocol,
    PutOutcome, PutRequest, ResourceFilePath, ResourceLocation, RunningState,
    RunningStatusRecord, UploadMode,
};
use ccf_services::{ResourcePutOrchestrator, ServerFailoverResolver, StdinPrompt};
use clap::error::ErrorKind;
use clap::{ArgGroup, Args, Parser};
use serde::Serialize;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr; stdout carries the JSON result.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Flags naming the archive, the account and the target resource
#[derive(Args, Clone, Default)]
pub struct ConnectionArgs {
    /// Archive user
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Archive password
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Primary archive server, e.g. db.humanconnectome.org
    #[arg(long, value_name = "HOST")]
    pub server: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    /// Session classifier, e.g. 3T
    #[arg(long)]
    pub classifier: Option<String>,

    /// Resource container within the session
    #[arg(long)]
    pub resource: Option<String>,

    /// Use http instead of https
    #[arg(long)]
    pub use_http: bool,
}

impl ConnectionArgs {
    pub fn credentials(&self) -> ArchiveResult<Credentials> {
        let user = require("user", self.user.as_deref())?;
        let password = require("password", self.password.as_deref())?;
        Ok(Credentials::new(user, password))
    }

    pub fn location(&self, config: &ArchiveConfig) -> ArchiveResult<ResourceLocation> {
        let server = require("server", self.server.as_deref())?;
        let project = require("project", self.project.as_deref())?;
        let subject = require("subject", self.subject.as_deref())?;
        let classifier = require("classifier", self.classifier.as_deref())?;
        let resource = require("resource", self.resource.as_deref())?;
        ResourceLocation::new(
            config.protocol,
            &server,
            &project,
            &subject,
            &classifier,
            &resource,
        )
    }
}

#[derive(Parser, Clone)]
#[command(name = "put_resource_file")]
#[command(about = "PUT a local file or directory (or a server-side path) into an archive resource")]
pub struct PutArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Event reason recorded by the archive
    #[arg(long)]
    pub reason: Option<String>,

    /// Local file or directory, or a server-side path with --use-reference
    #[arg(long, value_name = "PATH")]
    pub file: Option<String>,

    /// Target path inside the resource; defaults to the file name (or the resource root for a directory)
    #[arg(long, value_name = "PATH")]
    pub file_path_within_resource: Option<String>,

    /// Do not ask for confirmation
    #[arg(long)]
    pub force: bool,

    /// Let the archive pull --file from a path it can see instead of sending the bytes
    #[arg(long)]
    pub use_reference: bool,
}

impl PutArgs {
    /// Build the request without touching the network.
    pub fn to_request(&self, config: &ArchiveConfig) -> ArchiveResult<PutRequest> {
        let location = self.connection.location(config)?;
        let reason = require("reason", self.reason.as_deref())?;
        let file = require("file", self.file.as_deref())?;

        let file_path = match self.file_path_within_resource.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => ResourceFilePath::parse(p)?,
            _ => ResourceFilePath::root(),
        };
        let mode = if self.use_reference {
            UploadMode::ByReference
        } else {
            UploadMode::ByContent
        };

        Ok(
            PutRequest::new(location.with_file_path(file_path), file, reason, mode)
                .force(self.force),
        )
    }
}

#[derive(Parser, Clone)]
#[command(name = "mark_running_status")]
#[command(about = "Mark or unmark a job as running against a subject")]
#[command(group(
    ArgGroup::new("status")
        .args(["submitted", "queued", "running", "not_running", "not_queued", "done"])
        .multiple(false)
))]
pub struct MarkArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Scan name, for per-scan jobs
    #[arg(long)]
    pub scan: Option<String>,

    /// Reason written into the marker; defaults to the status flag
    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub submitted: bool,
    #[arg(long)]
    pub queued: bool,
    #[arg(long)]
    pub running: bool,
    #[arg(long)]
    pub not_running: bool,
    #[arg(long)]
    pub not_queued: bool,
    #[arg(long)]
    pub done: bool,
}

impl MarkArgs {
    /// Target state and the name of the flag that selected it.
    pub fn status(&self) -> ArchiveResult<(RunningState, &'static str)> {
        let flags = [
            (self.submitted, RunningState::Running, "submitted"),
            (self.queued, RunningState::Running, "queued"),
            (self.running, RunningState::Running, "running"),
            (self.not_running, RunningState::Absent, "not-running"),
            (self.not_queued, RunningState::Absent, "not-queued"),
            (self.done, RunningState::Absent, "done"),
        ];
        flags
            .into_iter()
            .find(|(set, _, _)| *set)
            .map(|(_, state, name)| (state, name))
            .ok_or_else(|| {
                ArchiveError::validation(
                    "one of --submitted, --queued, --running, --not-running, --not-queued, --done is required",
                )
            })
    }

    pub fn to_record(&self, config: &ArchiveConfig) -> ArchiveResult<RunningStatusRecord> {
        let credentials = self.connection.credentials()?;
        let location = self.connection.location(config)?;
        let (state, flag) = self.status()?;
        let reason = match self.reason.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => flag.to_string(),
        };
        let scan = self
            .scan
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let record = RunningStatusRecord {
            subject: location.subject,
            classifier: location.classifier,
            scan,
            resource: location.resource,
            state,
            reason,
            user: credentials.user,
        };
        record.validate()?;
        Ok(record)
    }
}

#[derive(Parser, Clone)]
#[command(name = "delete_resource")]
#[command(about = "Delete an archive resource and every file in it")]
pub struct DeleteArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Do not ask for confirmation
    #[arg(long)]
    pub force: bool,
}

/// What to print and which status to exit with when flags cannot be used
#[derive(Debug)]
pub struct UsageExit {
    pub code: u8,
    pub stdout: String,
    pub stderr: Option<String>,
}

impl UsageExit {
    pub fn emit(self) -> ExitCode {
        print!("{}", self.stdout);
        if let Some(message) = self.stderr {
            eprint!("{}", message);
        }
        ExitCode::from(self.code)
    }
}

/// Parse flags; `--help` and unknown options both print usage and end with status 1.
pub fn parse_args<T, I, S>(args: I) -> Result<T, UsageExit>
where
    T: Parser,
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    T::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => UsageExit {
            code: 1,
            stdout: e.render().to_string(),
            stderr: None,
        },
        _ => UsageExit {
            code: 1,
            stdout: T::command().render_help().to_string(),
            stderr: Some(e.render().to_string()),
        },
    })
}

/// Load configuration from the environment; `--use-http` overrides the protocol.
pub fn load_config(use_http: bool) -> ArchiveResult<ArchiveConfig> {
    let config = ArchiveConfig::from_env()
        .map_err(|e| ArchiveError::validation(format!("invalid configuration: {:#}", e)))?;
    Ok(if use_http {
        config.with_protocol(Protocol::Http)
    } else {
        config
    })
}

/// Wire the HTTP client, failover and stdin prompt together.
pub fn build_orchestrator(
    config: &ArchiveConfig,
    credentials: Credentials,
) -> ArchiveResult<ResourcePutOrchestrator> {
    let client = Arc::new(XnatClient::new(config)?);
    let resolver = ServerFailoverResolver::from_config(client.clone(), config);
    Ok(ResourcePutOrchestrator::new(
        client,
        resolver,
        Arc::new(StdinPrompt),
        credentials,
    ))
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize result")?;
    println!("{}", out);
    Ok(())
}

/// Exit status for an error that ended a command.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<ArchiveError>()
        .map(|e| u8::try_from(e.exit_code()).unwrap_or(2))
        .unwrap_or(2)
}

pub fn put_outcome_exit_code(outcome: &PutOutcome) -> u8 {
    if outcome.is_success() {
        0
    } else {
        2
    }
}

/// Log the error (if any) at the level its kind calls for and turn the result into an exit status.
pub fn finish(result: anyhow::Result<u8>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            match e.downcast_ref::<ArchiveError>() {
                Some(archive) => match archive.log_level() {
                    LogLevel::Error => {
                        tracing::error!(code = archive.error_code(), error = %archive, "Command failed")
                    }
                    LogLevel::Warn => {
                        tracing::warn!(code = archive.error_code(), error = %archive, "Command failed")
                    }
                    LogLevel::Debug => {
                        tracing::debug!(code = archive.error_code(), error = %archive, "Command ended")
                    }
                },
                None => tracing::error!(error = %format!("{:#}", e), "Command failed"),
            }
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
