//! Whole-file exclusive append lock.
//!
//! Advisory `flock(2)` on Unix: blocking, no timeout, released on every exit
//! path via `Drop`. The guard does not seek or flush; callers position the
//! cursor at end-of-file and flush before releasing so concurrent writers
//! always append.

use std::fs::File;
use std::io;

/// Guard holding the exclusive lock; unlocks on drop.
pub struct LockGuard<'a> {
    #[allow(dead_code)]
    file: &'a File,
}

/// Acquire a blocking exclusive lock on the whole file.
///
/// While held, no other holder in any process may acquire a lock (exclusive
/// or shared) on the same file.
#[cfg(unix)]
pub fn exclusive(file: &File) -> io::Result<LockGuard<'_>> {
    use std::os::unix::io::AsRawFd;

    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(LockGuard { file })
}

#[cfg(not(unix))]
pub fn exclusive(file: &File) -> io::Result<LockGuard<'_>> {
    // No flock equivalent without platform-specific APIs; single-process
    // serialization still holds through the open-write-flush sequence.
    Ok(LockGuard { file })
}

#[cfg(unix)]
impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
    }
}
