use std::io;

use thiserror::Error;

use harness_log::LogError;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The target program is not in a runnable format (ENOEXEC), typically a
    /// script missing its interpreter directive.
    #[error("command is not executable: {command}")]
    NotExecutable {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Any other OS-level failure during spawn or run, including timeout
    /// kills and signal termination. Partial output is routed before this is
    /// returned.
    #[error("process execution failed: {context}")]
    SpawnOrRuntime {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A failure not recognized as one of the above; the raw invocation
    /// arguments are logged before this is returned.
    #[error("unexpected execution failure for {argv:?}")]
    Unexpected { argv: Vec<String> },

    /// Produced only by the checked execution path.
    #[error("process exited with non-zero code: {code}")]
    NonZeroExit { code: i32 },

    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),

    /// Logging-layer failure surfacing through the executor; never caught,
    /// since dropping records would corrupt the audit trail.
    #[error("logging failed: {0}")]
    Log(#[from] LogError),
}
