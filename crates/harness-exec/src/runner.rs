use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use harness_log::{ExceptionInfo, Router};

use crate::{ExecError, Invocation, ProcessResult};

/// Logger name used for every record the executor emits.
const LOGGER: &str = "exec";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs external commands and feeds their captured output through a router.
///
/// Execution is synchronous: `run` blocks the calling thread until the child
/// exits or the configured timeout kills it. Every failure path logs its full
/// diagnostic context before returning, so the log files stay the durable
/// source of truth even when callers ignore the returned value.
pub struct Executor<'r> {
    router: &'r Router,
}

impl<'r> Executor<'r> {
    pub fn new(router: &'r Router) -> Self {
        Self { router }
    }

    /// Run a command and return its result.
    ///
    /// Captured stdout lines are routed at `invocation.stdout_log_level`,
    /// stderr lines at ERROR, each tagged with the command name. After any
    /// successful spawn the full command line and exit code are logged,
    /// regardless of the exit code's value.
    pub fn run(&self, invocation: &Invocation) -> Result<ProcessResult, ExecError> {
        invocation.validate()?;

        self.router.info(
            LOGGER,
            format!("Running command: '{}'", invocation.command_line()),
        )?;

        let mut cmd = Command::new(&invocation.argv[0]);
        cmd.args(&invocation.argv[1..]);
        cmd.stdout(if invocation.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(if invocation.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        if let Some(cwd) = &invocation.options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &invocation.options.env {
            cmd.env(key, value);
        }

        trace!(
            command = %invocation.command_name(),
            args = ?invocation.argv,
            timeout = ?invocation.options.timeout,
            "spawning subprocess",
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) if source.raw_os_error() == Some(libc::ENOEXEC) => {
                self.log_not_executable_hints(invocation)?;
                return Err(ExecError::NotExecutable {
                    command: invocation.command_name().to_string(),
                    source,
                });
            }
            Err(source) => {
                self.router.error(
                    LOGGER,
                    format!("cannot spawn command: '{}'", invocation.command_line()),
                )?;
                return Err(ExecError::SpawnOrRuntime {
                    context: "spawn failed".to_string(),
                    source,
                });
            }
        };

        let stdout = child.stdout.take().map(drain_pipe);
        let stderr = child.stderr.take().map(drain_pipe);

        let waited = wait_with_deadline(&mut child, invocation.options.timeout);

        let stdout_lines = match collect_lines(stdout) {
            Some(lines) => lines,
            None => return self.unexpected(invocation),
        };
        let stderr_lines = match collect_lines(stderr) {
            Some(lines) => lines,
            None => return self.unexpected(invocation),
        };

        let status = match waited {
            Ok(status) => status,
            Err((context, source)) => {
                // Route whatever was captured before the failure, then fail.
                self.route_output(invocation, &stdout_lines, &stderr_lines)?;
                return Err(ExecError::SpawnOrRuntime { context, source });
            }
        };

        let exit_code = match status.code() {
            Some(code) => code,
            None => {
                self.route_output(invocation, &stdout_lines, &stderr_lines)?;
                return Err(ExecError::SpawnOrRuntime {
                    context: "process terminated by signal".to_string(),
                    source: io::Error::other("no exit code"),
                });
            }
        };

        self.route_output(invocation, &stdout_lines, &stderr_lines)?;
        self.router.log(
            invocation.stdout_log_level,
            LOGGER,
            format!("'{}' ReturnCode={}", invocation.command_line(), exit_code),
        )?;
        debug!(exit_code, "subprocess exited");

        Ok(ProcessResult {
            exit_code,
            stdout_lines,
            stderr_lines,
        })
    }

    /// Run a command, treating any failure as fatal for the whole run.
    ///
    /// Non-zero exit logs the captured stdout and stderr at ERROR; any error
    /// raised during execution is logged with full exception context. Either
    /// way the calling process terminates with status -1 and this function
    /// does not return.
    pub fn run_checked(&self, invocation: &Invocation) -> ProcessResult {
        match self.checked(invocation) {
            Ok(result) => result,
            Err(_) => std::process::exit(-1),
        }
    }

    /// Decision logic behind [`Executor::run_checked`], separated so the
    /// classification can be tested without terminating the test process.
    pub(crate) fn checked(&self, invocation: &Invocation) -> Result<ProcessResult, ExecError> {
        match self.run(invocation) {
            Ok(result) if result.exit_code != 0 => {
                self.router.error(LOGGER, result.stdout_lines.join("\n"))?;
                self.router.error(LOGGER, result.stderr_lines.join("\n"))?;
                Err(ExecError::NonZeroExit {
                    code: result.exit_code,
                })
            }
            Ok(result) => Ok(result),
            Err(err) => {
                let info = ExceptionInfo::from_error(&err);
                self.router.exception(LOGGER, "Exception Captured:", info)?;
                Err(err)
            }
        }
    }

    fn route_output(
        &self,
        invocation: &Invocation,
        stdout_lines: &[String],
        stderr_lines: &[String],
    ) -> Result<(), ExecError> {
        let cmd = invocation.command_name();
        if invocation.capture_stdout {
            for line in stdout_lines {
                self.router.log(
                    invocation.stdout_log_level,
                    LOGGER,
                    format!("<{cmd}> {line}"),
                )?;
            }
        }
        if invocation.capture_stderr && invocation.log_stderr {
            for line in stderr_lines {
                self.router.error(LOGGER, format!("<{cmd}> {line}"))?;
            }
        }
        Ok(())
    }

    fn log_not_executable_hints(&self, invocation: &Invocation) -> Result<(), ExecError> {
        self.router.error(
            LOGGER,
            format!("cannot execute the command\n{}", invocation.command_line()),
        )?;
        self.router.error(
            LOGGER,
            "This is likely due to a problem with the executable format",
        )?;
        self.router.error(
            LOGGER,
            "Most often, a script with no #! at the beginning can cause this error",
        )?;
        self.router.error(
            LOGGER,
            "Try adding 'bash' or 'sh' as first arg to fix this problem",
        )?;
        Ok(())
    }

    fn unexpected(&self, invocation: &Invocation) -> Result<ProcessResult, ExecError> {
        self.router
            .error(LOGGER, format!("{:?}", invocation.argv))?;
        Err(ExecError::Unexpected {
            argv: invocation.argv.clone(),
        })
    }
}

/// Drain a child pipe to completion on its own thread.
fn drain_pipe<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

/// Lossy-decode a capture thread's bytes into lines; `None` if the thread
/// was lost.
fn collect_lines(handle: Option<JoinHandle<Vec<u8>>>) -> Option<Vec<String>> {
    match handle {
        None => Some(Vec::new()),
        Some(handle) => match handle.join() {
            Ok(bytes) => Some(
                String::from_utf8_lossy(&bytes)
                    .lines()
                    .map(String::from)
                    .collect(),
            ),
            Err(_) => None,
        },
    }
}

/// Wait for the child, killing it if the deadline passes.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, (String, io::Error)> {
    let Some(limit) = timeout else {
        return child.wait().map_err(|e| ("wait failed".to_string(), e));
    };

    let deadline = Instant::now() + limit;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err((
                    format!("timed out after {limit:?}"),
                    io::Error::new(io::ErrorKind::TimedOut, "child killed after timeout"),
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(("wait failed".to_string(), source));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_log::{ERROR_LOG, ERRORS_LOG, RouterConfig, Severity, TEST_LOG};
    use std::path::Path;

    fn router_in(dir: &Path) -> Router {
        Router::standard(&RouterConfig {
            dir: dir.to_path_buf(),
            console: false,
        })
    }

    fn read(dir: &Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap_or_default()
    }

    #[test]
    fn echo_success_routes_stdout_at_requested_level() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["echo", "hello"]).with_stdout_level(Severity::Info);
        let result = executor.run(&inv).unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout_lines, vec!["hello".to_string()]);
        assert!(result.stderr_lines.is_empty());

        let test_log = read(dir.path(), TEST_LOG);
        assert!(test_log.contains("Running command: 'echo hello'"));
        assert!(test_log.contains("<echo> hello"));
        assert!(test_log.contains("'echo hello' ReturnCode=0"));
        // Nothing here was an error.
        assert_eq!(read(dir.path(), ERROR_LOG), "");
    }

    #[test]
    fn stderr_is_routed_at_error_level() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["sh", "-c", "echo oops >&2"]);
        let result = executor.run(&inv).unwrap();

        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stderr_lines, vec!["oops".to_string()]);
        assert!(read(dir.path(), ERRORS_LOG).contains("<sh> oops"));
    }

    #[test]
    fn stderr_logging_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["sh", "-c", "echo quiet >&2"]).with_log_stderr(false);
        let result = executor.run(&inv).unwrap();

        // Still captured, just not routed.
        assert_eq!(result.stderr_lines, vec!["quiet".to_string()]);
        assert!(!read(dir.path(), ERRORS_LOG).contains("quiet"));
    }

    #[test]
    fn nonzero_exit_is_returned_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["sh", "-c", "exit 3"]);
        let result = executor.run(&inv).unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(read(dir.path(), TEST_LOG).contains("ReturnCode=3"));
    }

    #[test]
    fn checked_fails_the_run_on_nonzero_exit() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["sh", "-c", "echo out; echo err >&2; exit 2"]);
        let err = executor.checked(&inv).unwrap_err();

        assert!(matches!(err, ExecError::NonZeroExit { code: 2 }));
        let errors = read(dir.path(), ERRORS_LOG);
        assert!(errors.contains("out"));
        assert!(errors.contains("err"));
    }

    #[test]
    fn checked_logs_exception_context_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["/nonexistent/program"]);
        let err = executor.checked(&inv).unwrap_err();

        assert!(matches!(err, ExecError::SpawnOrRuntime { .. }));
        let errors = read(dir.path(), ERRORS_LOG);
        assert!(errors.contains("Exception Captured:"));
        assert!(errors.contains("EXC**"));
    }

    #[cfg(unix)]
    #[test]
    fn data_file_without_shebang_is_not_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let script = dir.path().join("plain.dat");
        std::fs::write(&script, "just some data\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let inv = Invocation::new([script.to_str().unwrap()]);
        let err = executor.run(&inv).unwrap_err();

        assert!(matches!(err, ExecError::NotExecutable { .. }));
        let errors = read(dir.path(), ERRORS_LOG);
        assert!(errors.contains("cannot execute the command"));
        assert!(errors.contains("no #! at the beginning"));
        assert!(errors.contains("Try adding 'bash' or 'sh'"));
    }

    #[test]
    fn timeout_kills_the_child_and_routes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        // `exec` so the kill hits the sleeper itself, not a shell parent
        // whose child would keep the stdout pipe open.
        let inv = Invocation::new(["sh", "-c", "echo early; exec sleep 30"])
            .with_timeout(Duration::from_millis(200))
            .with_stdout_level(Severity::Info);
        let start = Instant::now();
        let err = executor.run(&inv).unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(10));
        match err {
            ExecError::SpawnOrRuntime { context, .. } => {
                assert!(context.contains("timed out"), "context: {context}");
            }
            other => panic!("expected SpawnOrRuntime, got {other:?}"),
        }
        assert!(read(dir.path(), TEST_LOG).contains("<sh> early"));
    }

    #[test]
    fn env_and_cwd_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let work = tempfile::tempdir().unwrap();
        let inv = Invocation::new(["sh", "-c", "echo $HARNESS_MARKER; pwd"])
            .with_env("HARNESS_MARKER", "marked")
            .with_cwd(work.path());
        let result = executor.run(&inv).unwrap();

        assert_eq!(result.stdout_lines[0], "marked");
        assert!(result.stdout_lines[1].contains(
            work.path().file_name().unwrap().to_str().unwrap()
        ));
    }

    #[test]
    fn spawn_failure_is_logged_before_returning() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_in(dir.path());
        let executor = Executor::new(&router);

        let inv = Invocation::new(["/definitely/not/here"]);
        let err = executor.run(&inv).unwrap_err();

        assert!(matches!(err, ExecError::SpawnOrRuntime { .. }));
        assert!(read(dir.path(), ERRORS_LOG).contains("cannot spawn command"));
    }
}
