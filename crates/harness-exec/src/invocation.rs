use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use harness_log::Severity;

use crate::ExecError;

/// Pass-through execution options.
///
/// An explicit structure instead of a dynamic keyword pass-through: every
/// supported option is enumerated here and unknown ones cannot be expressed.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Kill the child if it is still running after this long.
    pub timeout: Option<Duration>,
    /// Environment overrides applied on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Working directory; inherited when `None`.
    pub cwd: Option<PathBuf>,
}

/// One command execution request; not reused.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program and arguments.
    pub argv: Vec<String>,
    /// Capture stdout through a pipe (inherit when false).
    pub capture_stdout: bool,
    /// Capture stderr through a pipe (inherit when false).
    pub capture_stderr: bool,
    /// Level at which captured stdout lines are routed.
    pub stdout_log_level: Severity,
    /// Route captured stderr lines at ERROR.
    pub log_stderr: bool,
    pub options: ExecOptions,
}

impl Invocation {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            capture_stdout: true,
            capture_stderr: true,
            stdout_log_level: Severity::Debug,
            log_stderr: true,
            options: ExecOptions::default(),
        }
    }

    /// Build from a single command line, split on whitespace.
    ///
    /// The first token becomes the program and the display name used to tag
    /// output lines.
    pub fn from_command_line(line: &str) -> Self {
        Self::new(line.split_whitespace())
    }

    pub fn with_stdout_level(mut self, level: Severity) -> Self {
        self.stdout_log_level = level;
        self
    }

    pub fn with_log_stderr(mut self, log_stderr: bool) -> Self {
        self.log_stderr = log_stderr;
        self
    }

    pub fn with_capture(mut self, stdout: bool, stderr: bool) -> Self {
        self.capture_stdout = stdout;
        self.capture_stderr = stderr;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.push((key.into(), value.into()));
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(cwd.into());
        self
    }

    /// Display name for output tagging: the first argv token.
    pub fn command_name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    /// Full command line as logged.
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Validate before spawning.
    ///
    /// Rules:
    /// - `argv` has at least one token and the program is not blank.
    pub fn validate(&self) -> Result<(), ExecError> {
        match self.argv.first() {
            None => Err(ExecError::InvalidInvocation("empty argv".into())),
            Some(program) if program.trim().is_empty() => Err(ExecError::InvalidInvocation(
                "command is empty".into(),
            )),
            Some(_) => Ok(()),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invocation(cmd='{}', args={}, stdout_level={}, log_stderr={}, timeout={:?})",
            self.command_name(),
            self.argv.len().saturating_sub(1),
            self.stdout_log_level,
            self.log_stderr,
            self.options.timeout,
        )
    }
}

/// Terminal result of a completed process; immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_splits_on_whitespace() {
        let inv = Invocation::from_command_line("echo hello   world");
        assert_eq!(inv.argv, ["echo", "hello", "world"]);
        assert_eq!(inv.command_name(), "echo");
        assert_eq!(inv.command_line(), "echo hello world");
    }

    #[test]
    fn defaults_match_the_invocation_surface() {
        let inv = Invocation::new(["true"]);
        assert_eq!(inv.stdout_log_level, Severity::Debug);
        assert!(inv.log_stderr);
        assert!(inv.capture_stdout);
        assert!(inv.capture_stderr);
        assert!(inv.options.timeout.is_none());
    }

    #[test]
    fn empty_argv_is_rejected() {
        let inv = Invocation::new(Vec::<String>::new());
        assert!(matches!(
            inv.validate(),
            Err(ExecError::InvalidInvocation(_))
        ));

        let blank = Invocation::new(["  "]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn builders_set_options() {
        let inv = Invocation::new(["sleep", "5"])
            .with_timeout(Duration::from_millis(100))
            .with_env("KEY", "value")
            .with_cwd("/tmp")
            .with_stdout_level(Severity::Info);

        assert_eq!(inv.options.timeout, Some(Duration::from_millis(100)));
        assert_eq!(inv.options.env, vec![("KEY".into(), "value".into())]);
        assert_eq!(inv.options.cwd.as_deref(), Some(std::path::Path::new("/tmp")));
        assert_eq!(inv.stdout_log_level, Severity::Info);
    }
}
