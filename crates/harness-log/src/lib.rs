//! Structured logging core for the test harness.
//!
//! Records flow from an emitting caller through a [`Router`] to every
//! registered [`Sink`] whose level filter accepts them. File sinks serialize
//! their writes with a whole-file exclusive lock so lines from concurrent
//! writers (threads or separate processes sharing the same files) never
//! interleave.

mod error;
pub use error::{LogError, LogResult};

mod record;
pub use record::{ExceptionInfo, LogRecord, MessageArgs, Severity};

mod header;
pub use header::{general_header, init_local_offset};

pub mod lock;

mod sink;
pub use sink::{Sink, SinkTarget};

mod router;
pub use router::{ERROR_LOG, ERRORS_LOG, Router, RouterConfig, TEST_LOG, TESTER_LOG};
