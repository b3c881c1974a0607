//! Advisory process-level lock for the single-writer discipline (spec §5).
//!
//! Only one writer may hold the store open for mutation at a time. A
//! lockfile records the holding PID and acquisition time; a lock whose
//! holder is dead, or that has outlived the stale grace period, is
//! breakable with a warning.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lock is considered stale (breakable without checking liveness) after
/// this long, even if the holding process is still technically alive —
/// guards against a wedged process that never releases.
const STALE_GRACE_PERIOD: Duration = Duration::from_secs(300);

/// Advisory lock guard. Removes the lockfile when dropped.
pub struct WriterLock {
    path: PathBuf,
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Attempt to acquire the writer lock in `pui_dir`. Returns `None` if another
/// live, non-stale writer currently holds it.
pub fn acquire(pui_dir: &Path, verbose: bool) -> Option<WriterLock> {
    let lock_path = pui_dir.join("writer.lock");
    let pid = std::process::id();

    if let Some(lock) = try_create(&lock_path, pid) {
        return Some(lock);
    }

    match read_holder(&lock_path) {
        Some((holder_pid, acquired_at)) => {
            let age = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .saturating_sub(Duration::from_secs(acquired_at));

            if is_process_alive(holder_pid) && age < STALE_GRACE_PERIOD {
                return None;
            }

            if verbose {
                eprintln!(
                    "pui: breaking stale writer lock from pid {} (age {}s)",
                    holder_pid,
                    age.as_secs()
                );
            }
            let _ = fs::remove_file(&lock_path);
            try_create(&lock_path, pid)
        }
        None => {
            // Lockfile is unreadable or corrupt; treat as stale.
            let _ = fs::remove_file(&lock_path);
            try_create(&lock_path, pid)
        }
    }
}

fn try_create(lock_path: &Path, pid: u32) -> Option<WriterLock> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)
        .ok()?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let _ = write!(file, "{pid}\n{now}");
    Some(WriterLock {
        path: lock_path.to_path_buf(),
    })
}

fn read_holder(lock_path: &Path) -> Option<(u32, u64)> {
    let content = fs::read_to_string(lock_path).ok()?;
    let mut lines = content.lines();
    let pid = lines.next()?.trim().parse().ok()?;
    let acquired_at = lines.next()?.trim().parse().ok()?;
    Some((pid, acquired_at))
}

fn is_process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: kill with signal 0 is a standard POSIX existence check; it
        // sends no signal and only inspects permissions/existence.
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock = acquire(dir.path(), false).unwrap();
        assert!(dir.path().join("writer.lock").exists());
        drop(lock);
        assert!(!dir.path().join("writer.lock").exists());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let _lock = acquire(dir.path(), false).unwrap();
        assert!(acquire(dir.path(), false).is_none());
    }

    #[test]
    fn test_breaks_lock_from_dead_pid() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("writer.lock");
        // A pid that's extremely unlikely to be alive.
        fs::write(&lock_path, "999999\n0").unwrap();
        let lock = acquire(dir.path(), false);
        assert!(lock.is_some());
    }

    #[test]
    fn test_corrupt_lockfile_is_broken() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("writer.lock"), "not a pid").unwrap();
        assert!(acquire(dir.path(), false).is_some());
    }
}
