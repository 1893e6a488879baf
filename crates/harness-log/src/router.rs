//! Record router: owns the registered sinks and dispatches every emitted
//! record to the sinks whose filter accepts it, in registration order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::LogError;
use crate::record::{ExceptionInfo, LogRecord, MessageArgs, Severity};
use crate::sink::{Sink, SinkTarget};

/// Per-run error log; callers truncate it between runs.
pub const ERROR_LOG: &str = "error.log";
/// Long-lived error log, written first so it always carries the full history.
pub const ERRORS_LOG: &str = "errors.log";
/// Per-run test log; callers truncate it between runs.
pub const TEST_LOG: &str = "test.log";
/// Long-lived test log.
pub const TESTER_LOG: &str = "tester.log";

/// Configuration for the standard sink layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Directory the four log files live in.
    pub dir: PathBuf,
    /// Whether to install the all-level console sink.
    pub console: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            console: true,
        }
    }
}

/// Ordered set of sinks.
///
/// Constructed once at startup and shared by reference; registration
/// happens-before any emission, so dispatch needs no synchronization.
#[derive(Debug, Default)]
pub struct Router {
    sinks: Vec<Sink>,
}

impl Router {
    /// Empty router with no sinks.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Router carrying the standard console/error/test sink set.
    pub fn standard(config: &RouterConfig) -> Self {
        let mut router = Self::new();
        router.install_standard(config);
        router
    }

    /// Append a sink; sinks are dispatched in registration order.
    pub fn register(&mut self, sink: Sink) {
        self.sinks.push(sink);
    }

    /// Install the canonical sinks, discarding anything registered before.
    ///
    /// - console: all levels, unlocked;
    /// - error: ERROR and above, duplicated to `errors.log` then `error.log`;
    /// - test: all levels, duplicated to `tester.log` then `test.log`.
    pub fn install_standard(&mut self, config: &RouterConfig) {
        self.sinks.clear();

        if config.console {
            self.register(Sink::console("console", Severity::Debug));
        }
        self.register(Sink::files(
            "error",
            Severity::Error,
            vec![
                SinkTarget::append(config.dir.join(ERRORS_LOG)),
                SinkTarget::append(config.dir.join(ERROR_LOG)),
            ],
        ));
        self.register(Sink::files(
            "test",
            Severity::Debug,
            vec![
                SinkTarget::append(config.dir.join(TESTER_LOG)),
                SinkTarget::append(config.dir.join(TEST_LOG)),
            ],
        ));
    }

    /// Same layout rooted at `dir`, with the defaults for everything else.
    pub fn standard_in(dir: impl AsRef<Path>) -> Self {
        Self::standard(&RouterConfig {
            dir: dir.as_ref().to_path_buf(),
            ..RouterConfig::default()
        })
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    /// Dispatch a record to every sink that accepts its level.
    ///
    /// Filtered-out sinks are skipped entirely: no open, no lock
    /// acquisition, no contention.
    pub fn emit(&self, record: &LogRecord) -> Result<(), LogError> {
        trace!(record = %record, "dispatching record");
        for sink in &self.sinks {
            if !sink.accepts(record.level) {
                continue;
            }
            sink.write(record)?;
        }
        Ok(())
    }

    /// Emit a plain message at the given level.
    pub fn log(
        &self,
        level: Severity,
        logger: &str,
        message: impl Into<String>,
    ) -> Result<(), LogError> {
        self.emit(&LogRecord::new(level, logger, message))
    }

    pub fn debug(&self, logger: &str, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Severity::Debug, logger, message)
    }

    pub fn info(&self, logger: &str, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Severity::Info, logger, message)
    }

    pub fn warning(&self, logger: &str, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Severity::Warning, logger, message)
    }

    pub fn error(&self, logger: &str, message: impl Into<String>) -> Result<(), LogError> {
        self.log(Severity::Error, logger, message)
    }

    /// Emit a templated message.
    pub fn log_args(
        &self,
        level: Severity,
        logger: &str,
        template: impl Into<String>,
        args: MessageArgs,
    ) -> Result<(), LogError> {
        self.emit(&LogRecord::new(level, logger, template).with_args(args))
    }

    /// Emit an ERROR record carrying full exception context.
    pub fn exception(
        &self,
        logger: &str,
        message: impl Into<String>,
        info: ExceptionInfo,
    ) -> Result<(), LogError> {
        self.emit(&LogRecord::new(Severity::Error, logger, message).with_exception(info))
    }
}
