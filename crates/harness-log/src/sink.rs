use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

use tracing::trace;

use crate::error::LogError;
use crate::header::general_header;
use crate::lock;
use crate::record::{LogRecord, Severity};

/// One physical log file bound to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkTarget {
    pub path: PathBuf,
    pub append_mode: bool,
}

impl SinkTarget {
    pub fn new(path: impl Into<PathBuf>, append_mode: bool) -> Self {
        Self {
            path: path.into(),
            append_mode,
        }
    }

    /// Append-mode target, the normal case.
    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self::new(path, true)
    }
}

/// Where a sink's formatted lines go.
///
/// The console variant carries no targets and is never lock-protected; file
/// sinks are lock-protected per target. The split is structural so the two
/// cannot be mixed.
#[derive(Debug, Clone)]
enum SinkOutput {
    Console,
    Files(Vec<SinkTarget>),
}

/// A named destination with its own level filter.
///
/// Every bound target of a file sink receives byte-identical content: the
/// duplication is intentional (a long-lived historical log next to a per-run
/// log that callers truncate between runs), not a cache.
#[derive(Debug, Clone)]
pub struct Sink {
    name: String,
    min_level: Severity,
    output: SinkOutput,
}

impl Sink {
    /// Console sink writing to stdout, unlocked.
    pub fn console(name: impl Into<String>, min_level: Severity) -> Self {
        Self {
            name: name.into(),
            min_level,
            output: SinkOutput::Console,
        }
    }

    /// File sink writing identical content to every target.
    pub fn files(name: impl Into<String>, min_level: Severity, targets: Vec<SinkTarget>) -> Self {
        Self {
            name: name.into(),
            min_level,
            output: SinkOutput::Files(targets),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    pub fn is_console(&self) -> bool {
        matches!(self.output, SinkOutput::Console)
    }

    pub fn targets(&self) -> &[SinkTarget] {
        match &self.output {
            SinkOutput::Console => &[],
            SinkOutput::Files(targets) => targets,
        }
    }

    /// Inclusive threshold check: a record at exactly `min_level` passes.
    #[inline]
    pub fn accepts(&self, level: Severity) -> bool {
        level.rank() >= self.min_level.rank()
    }

    /// Format and write one record.
    ///
    /// Message lines come first, then one `EXC**`-headed line per exception
    /// frame. For file sinks the lock is held once per record per target, so
    /// a record's lines are contiguous in the file.
    pub fn write(&self, record: &LogRecord) -> Result<(), LogError> {
        let lines = render_lines(record)?;
        match &self.output {
            SinkOutput::Console => write_console(&lines),
            SinkOutput::Files(targets) => {
                for target in targets {
                    write_target(target, &lines)?;
                }
                Ok(())
            }
        }
    }
}

/// Render all header-prefixed lines for a record.
fn render_lines(record: &LogRecord) -> Result<Vec<String>, LogError> {
    let header = general_header(record.level, record.created_at, &record.logger)?;
    let message = record.rendered_message();

    let mut out: Vec<String> = message
        .lines()
        .map(|line| format!("{header} {line}"))
        .collect();

    if let Some(exc) = &record.exception {
        let exc_header = general_header(Severity::Exception, record.created_at, &record.logger)?;
        out.extend(exc.lines().iter().map(|line| format!("{exc_header} {line}")));
    }
    Ok(out)
}

fn write_console(lines: &[String]) -> Result<(), LogError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{line}").map_err(LogError::Console)?;
    }
    out.flush().map_err(LogError::Console)
}

fn write_target(target: &SinkTarget, lines: &[String]) -> Result<(), LogError> {
    let map_io = |source: io::Error| LogError::Io {
        path: target.path.clone(),
        source,
    };

    let mut opts = OpenOptions::new();
    opts.create(true);
    if target.append_mode {
        opts.append(true);
    } else {
        opts.write(true);
    }
    let file: File = opts.open(&target.path).map_err(map_io)?;

    let _guard = lock::exclusive(&file).map_err(map_io)?;
    trace!(path = %target.path.display(), lines = lines.len(), "writing locked record");

    let mut writer = &file;
    writer.seek(SeekFrom::End(0)).map_err(map_io)?;
    for line in lines {
        writeln!(writer, "{line}").map_err(map_io)?;
    }
    writer.flush().map_err(map_io)
}
