mod args;
mod exception;
mod severity;

pub use args::MessageArgs;
pub use exception::ExceptionInfo;
pub use severity::Severity;

use std::fmt;

use time::OffsetDateTime;

use crate::header::local_offset;

/// One unit of data flowing through the router.
///
/// Immutable once built; sinks only ever borrow it.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity used for sink filtering and the header label.
    pub level: Severity,
    /// Short logger name, padded to 5 columns in the header.
    pub logger: String,
    /// Local wall-clock time at construction.
    pub created_at: OffsetDateTime,
    /// Message template; may span multiple lines.
    pub message: String,
    /// Arguments substituted into the template.
    pub args: MessageArgs,
    /// Exception context, when emitted from a catch boundary.
    pub exception: Option<ExceptionInfo>,
}

impl LogRecord {
    pub fn new<L, M>(level: Severity, logger: L, message: M) -> Self
    where
        L: Into<String>,
        M: Into<String>,
    {
        Self {
            level,
            logger: logger.into(),
            created_at: OffsetDateTime::now_utc().to_offset(local_offset()),
            message: message.into(),
            args: MessageArgs::None,
            exception: None,
        }
    }

    pub fn with_args(mut self, args: MessageArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Message with arguments applied; used verbatim when there are none.
    pub fn rendered_message(&self) -> String {
        if self.args.is_empty() {
            self.message.clone()
        } else {
            self.args.fill(&self.message)
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogRecord(level={}, logger='{}', exception={})",
            self.level,
            self.logger,
            self.exception.is_some(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_message_without_args() {
        let record = LogRecord::new(Severity::Info, "test", "raw {} braces");
        assert_eq!(record.rendered_message(), "raw {} braces");
    }

    #[test]
    fn args_are_applied() {
        let record = LogRecord::new(Severity::Info, "test", "count={}")
            .with_args(MessageArgs::positional(["3"]));
        assert_eq!(record.rendered_message(), "count=3");
    }

    #[test]
    fn builder_attaches_exception() {
        let record = LogRecord::new(Severity::Error, "test", "failed")
            .with_exception(ExceptionInfo::new("E", "boom", Vec::new()));
        assert!(record.exception.is_some());
    }
}
