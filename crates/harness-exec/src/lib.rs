//! Process execution for the test harness.
//!
//! Wraps external commands so that everything they print becomes structured
//! log records routed through a [`harness_log::Router`], and every abnormal
//! termination becomes a typed [`ExecError`].

mod error;
pub use error::ExecError;

mod invocation;
pub use invocation::{ExecOptions, Invocation, ProcessResult};

mod runner;
pub use runner::Executor;
