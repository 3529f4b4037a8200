//! Invocation of external utilities.
//!
//! Every command the agent shells out to (cgroup report, `quota`, `ps`,
//! `zabbix_sender`) goes through a [`CommandRunner`]. Production code uses
//! [`SystemCommandRunner`]; tests use [`StaticCommandRunner`] with captured
//! output.

use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Exit status reported when a command cannot be spawned, matching the
/// shell's "command not found".
pub const STATUS_NOT_FOUND: i32 = 127;

/// A program plus its fixed arguments.
///
/// Deserializes from a list whose first element is the program:
/// `["quota", "-vw"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for CommandSpec {
    type Error = String;

    fn try_from(mut parts: Vec<String>) -> Result<Self, Self::Error> {
        if parts.is_empty() || parts[0].trim().is_empty() {
            return Err("command must name a program".to_string());
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a command run for its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
}

/// Runs external commands on behalf of the pipeline.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` to completion and captures its standard output.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started; a non-zero
    /// exit is reported through [`CommandOutput::status`].
    fn output(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;

    /// Runs `program` to completion and returns its exit status.
    ///
    /// With `quiet` set, standard output and error are discarded; otherwise
    /// they are inherited from the agent.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started.
    fn status(&self, program: &str, args: &[String], quiet: bool) -> io::Result<i32>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn output(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        tracing::debug!(program, ?args, "Running command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn status(&self, program: &str, args: &[String], quiet: bool) -> io::Result<i32> {
        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());
        if quiet {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        let status = cmd.status()?;
        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// A recorded call made against a [`StaticCommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub quiet: Option<bool>,
}

/// A [`CommandRunner`] that answers from canned output keyed by program name.
///
/// Programs without a registered response behave as if they were not
/// installed. Every call is recorded so tests can assert on arguments.
#[derive(Debug, Default)]
pub struct StaticCommandRunner {
    outputs: HashMap<String, String>,
    statuses: HashMap<String, i32>,
    calls: Mutex<Vec<Invocation>>,
}

impl StaticCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the stdout `program` produces when run for output.
    pub fn with_output(mut self, program: &str, stdout: &str) -> Self {
        self.outputs.insert(program.to_string(), stdout.to_string());
        self
    }

    /// Registers the exit status `program` returns when run for status.
    pub fn with_status(mut self, program: &str, status: i32) -> Self {
        self.statuses.insert(program.to_string(), status);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, program: &str, args: &[String], quiet: Option<bool>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                quiet,
            });
        }
    }
}

fn not_found(program: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{program}: command not found"))
}

impl CommandRunner for StaticCommandRunner {
    fn output(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        self.record(program, args, None);
        let stdout = self.outputs.get(program).ok_or_else(|| not_found(program))?;
        Ok(CommandOutput {
            status: Some(0),
            stdout: stdout.clone(),
        })
    }

    fn status(&self, program: &str, args: &[String], quiet: bool) -> io::Result<i32> {
        self.record(program, args, Some(quiet));
        self.statuses
            .get(program)
            .copied()
            .ok_or_else(|| not_found(program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_spec_from_list() {
        let parts = vec!["quota".to_string(), "-vw".to_string()];
        let spec = CommandSpec::try_from(parts).unwrap();
        assert_eq!(spec, CommandSpec::new("quota", ["-vw"]));
        assert_eq!(spec.to_string(), "quota -vw");
        assert!(CommandSpec::try_from(Vec::new()).is_err());
    }

    #[test]
    fn static_runner_reports_missing_programs() {
        let runner = StaticCommandRunner::new().with_output("ps", "a\nb\n");
        assert_eq!(runner.output("ps", &[]).unwrap().stdout, "a\nb\n");

        let err = runner.output("quota", &["-vw".to_string()]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(runner.calls().len(), 2);
    }

    #[cfg(unix)]
    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_status() {
        let runner = SystemCommandRunner;
        assert_eq!(runner.status("sh", &sh("exit 3"), true).unwrap(), 3);
        let out = runner.output("sh", &sh("echo hi")).unwrap();
        assert_eq!(out.stdout, "hi\n");
        assert!(runner.output("zagent-no-such-binary", &[]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn signal_termination_maps_to_shell_status() {
        let runner = SystemCommandRunner;
        assert_eq!(runner.status("sh", &sh("kill -9 $$"), true).unwrap(), 137);
        assert_eq!(runner.status("sh", &sh("kill -15 $$"), false).unwrap(), 143);
    }

    #[cfg(unix)]
    #[test]
    fn inherited_output_still_reports_status() {
        let runner = SystemCommandRunner;
        assert_eq!(runner.status("sh", &sh("echo sent; exit 0"), false).unwrap(), 0);
        assert_eq!(runner.status("sh", &sh("echo failed >&2; exit 2"), false).unwrap(), 2);
        assert!(runner.status("zagent-no-such-binary", &[], false).is_err());
    }
}
