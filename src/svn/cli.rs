//! Hardened wrapper around the `svn` command-line client.
//!
//! Every invocation:
//! - runs with `LC_ALL=C` so error codes and XML are not localized
//! - passes `--non-interactive --no-auth-cache`
//! - uses the connection's private `--config-dir` when one is set
//! - sends the password on stdin (`--password-from-stdin`), never argv
//! - ends options with `--` before the target

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use thiserror::Error;

use crate::types::Revision;

/// Error codes svn prints when a path does not exist at the revision.
const NOT_FOUND_CODES: &[&str] = &["W170000", "E170000", "W160013", "E160013"];

/// Error codes svn prints when authentication or authorization fails.
const AUTH_CODES: &[&str] = &["E170001", "E215004"];

/// Errors returned by svn operations.
#[derive(Error, Debug)]
pub enum SvnError {
    /// The svn binary could not be run.
    #[error("failed to run svn")]
    Io(#[from] io::Error),
    /// The path does not exist at the requested revision.
    #[error("path not found: {0}")]
    NotFound(String),
    /// Credentials were rejected or missing.
    #[error("authorization failed: {0}")]
    Authorization(String),
    /// svn exited unsuccessfully for another reason.
    #[error("svn {command} failed (exit code: {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Output parsing or unexpected svn data.
    #[error("failed to parse svn output: {0}")]
    Parse(String),
    /// Invalid inputs were provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl SvnError {
    /// Returns true when svn reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SvnError::NotFound(_))
    }
}

/// Map a failed svn invocation to an error using the codes on stderr.
fn classify_failure(command: &str, code: Option<i32>, stderr: &str) -> SvnError {
    let message = stderr
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string();

    if NOT_FOUND_CODES.iter().any(|c| stderr.contains(c)) {
        SvnError::NotFound(message)
    } else if AUTH_CODES.iter().any(|c| stderr.contains(c)) {
        SvnError::Authorization(message)
    } else {
        SvnError::CommandFailed {
            command: command.to_string(),
            code,
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Validate that a target URL is safe to hand to svn.
///
/// Rejects:
/// - Empty strings
/// - Strings starting with `-` (could be interpreted as flags)
/// - Strings containing null bytes or control characters
fn validate_target(value: &str) -> Result<(), SvnError> {
    if value.is_empty() {
        return Err(SvnError::InvalidInput("target cannot be empty".to_string()));
    }
    if value.starts_with('-') {
        return Err(SvnError::InvalidInput(
            "target cannot start with '-'".to_string(),
        ));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(SvnError::InvalidInput(
            "target cannot contain null or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Build `url/path@rev`, the peg form svn expects for a path at a revision.
///
/// The peg suffix is always present, so an `@` inside the path is never
/// mistaken for a peg revision.
pub fn peg_target(url: &str, path: &str, revision: Revision) -> String {
    let base = url.trim_end_matches('/');
    let path = path.trim_matches('/');
    if path.is_empty() {
        format!("{}@{}", base, revision)
    } else {
        format!("{}/{}@{}", base, path, revision)
    }
}

/// Session options applied to every command of one connection.
#[derive(Debug, Clone, Default)]
pub struct SvnAuth {
    pub username: Option<String>,
    pub password: Option<String>,
    pub config_dir: Option<PathBuf>,
}

/// svn CLI wrapper with security hardening.
#[derive(Debug, Clone)]
pub struct SvnCli {
    svn_path: String,
}

impl Default for SvnCli {
    fn default() -> Self {
        Self::new()
    }
}

impl SvnCli {
    /// Create a new SvnCli instance using the system svn.
    pub fn new() -> Self {
        Self {
            svn_path: "svn".into(),
        }
    }

    /// Create an SvnCli that runs a specific svn binary.
    pub fn with_binary(svn_path: impl Into<String>) -> Self {
        Self {
            svn_path: svn_path.into(),
        }
    }

    /// Create a hardened Command with security settings.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.svn_path);
        cmd.env("LC_ALL", "C");
        cmd.env("LANG", "C");
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Return the installed client version (`svn --version --quiet`).
    pub fn version(&self) -> Result<String, SvnError> {
        let output = self.command().args(["--version", "--quiet"]).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure("--version", output.status.code(), &stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// `svn info --xml` for a peg target.
    pub fn info(&self, auth: &SvnAuth, target: &str) -> Result<String, SvnError> {
        let output = self.run(auth, &["info", "--xml"], target, Stdio::piped())?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `svn list --xml` of the immediate children of a peg target.
    pub fn list(&self, auth: &SvnAuth, target: &str) -> Result<String, SvnError> {
        let output = self.run(
            auth,
            &["list", "--xml", "--depth", "immediates"],
            target,
            Stdio::piped(),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `svn proplist --xml -v` of a peg target.
    pub fn proplist(&self, auth: &SvnAuth, target: &str) -> Result<String, SvnError> {
        let output = self.run(
            auth,
            &["proplist", "--xml", "--verbose"],
            target,
            Stdio::piped(),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `svn cat` of a peg target, streamed straight into `out`.
    pub fn cat(&self, auth: &SvnAuth, target: &str, out: File) -> Result<(), SvnError> {
        self.run(auth, &["cat"], target, Stdio::from(out))?;
        Ok(())
    }

    fn run(
        &self,
        auth: &SvnAuth,
        args: &[&str],
        target: &str,
        stdout: Stdio,
    ) -> Result<Output, SvnError> {
        validate_target(target)?;

        let mut cmd = self.command();
        cmd.args(args);
        cmd.args(["--non-interactive", "--no-auth-cache"]);
        if let Some(dir) = &auth.config_dir {
            cmd.arg("--config-dir").arg(dir);
        }
        if let Some(username) = &auth.username {
            cmd.arg("--username").arg(username);
        }
        if auth.password.is_some() {
            cmd.arg("--password-from-stdin");
            cmd.stdin(Stdio::piped());
        }
        cmd.arg("--").arg(target);
        cmd.stdout(stdout);
        cmd.stderr(Stdio::piped());

        log::debug!("svn {} {}", args.join(" "), target);

        let mut child = cmd.spawn()?;
        if let (Some(password), Some(mut stdin)) = (&auth.password, child.stdin.take()) {
            stdin.write_all(password.as_bytes())?;
            stdin.write_all(b"\n")?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(args[0], output.status.code(), &stderr));
        }

        Ok(output)
    }
}
