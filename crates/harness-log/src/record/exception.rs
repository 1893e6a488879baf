use std::error::Error;

/// Exception context attached to a record at the catch boundary.
///
/// Rendered as its own block of `EXC**`-headed lines after the record's
/// message lines, regardless of the record's own severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Concrete type of the failure (e.g. `harness_exec::ExecError`).
    pub type_name: String,
    /// Top-level failure message.
    pub message: String,
    /// One entry per underlying cause, outermost first.
    pub frames: Vec<String>,
}

impl ExceptionInfo {
    pub fn new<T, M>(type_name: T, message: M, frames: Vec<String>) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            frames,
        }
    }

    /// Capture an error and its `source()` chain.
    pub fn from_error<E: Error>(err: &E) -> Self {
        let mut frames = Vec::new();
        let mut cause = err.source();
        while let Some(inner) = cause {
            frames.push(inner.to_string());
            cause = inner.source();
        }
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            frames,
        }
    }

    /// Lines to write under the `EXC**` header: cause frames first, then the
    /// `type: message` summary last.
    pub fn lines(&self) -> Vec<String> {
        let mut out = self.frames.clone();
        out.push(format!("{}: {}", self.type_name, self.message));
        out
    }
}
