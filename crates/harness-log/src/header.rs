use std::sync::{OnceLock, RwLock};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::error::LogError;
use crate::record::Severity;

/// `yymmdd-HH:MM:SS`, the timestamp prefix of every log line.
const HEADER_TS: &[BorrowedFormatItem<'static>] =
    format_description!("[year repr:last_two][month][day]-[hour]:[minute]:[second]");

/// Cached local UTC offset, detected once.
static LOCAL_OFFSET: RwLock<UtcOffset> = RwLock::new(UtcOffset::UTC);
static INIT_DONE: OnceLock<()> = OnceLock::new();

/// Detect and cache the local UTC offset.
///
/// Call in `main()` before spawning any threads; offset detection fails in
/// multi-thread contexts on most Unix platforms. Falls back to UTC silently.
pub fn init_local_offset() {
    INIT_DONE.get_or_init(|| {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        if let Ok(mut guard) = LOCAL_OFFSET.write() {
            *guard = offset;
        }
    });
}

/// Current cached offset; attempts detection on first use.
pub(crate) fn local_offset() -> UtcOffset {
    init_local_offset();
    LOCAL_OFFSET.read().map(|g| *g).unwrap_or(UtcOffset::UTC)
}

/// Render the fixed-width line header: timestamp, logger name padded to 5
/// columns, severity label padded to 5 columns.
///
/// Pure: the same `(level, created_at, logger)` triple always renders the
/// same string.
pub fn general_header(
    level: Severity,
    created_at: OffsetDateTime,
    logger: &str,
) -> Result<String, LogError> {
    let ts = created_at.format(&HEADER_TS)?;
    Ok(format!("{ts} {logger:<5} {:<5}", level.label()))
}
