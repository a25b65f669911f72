//! Exclusive lock serializing registry writers across processes.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use super::RegistryError;

/// How long a writer waits for another one to finish.
const WAIT_LIMIT: Duration = Duration::from_secs(30);
const FIRST_RETRY: Duration = Duration::from_millis(10);
const MAX_RETRY: Duration = Duration::from_millis(500);

/// Held while the registry file is rewritten. Unlocks on drop.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Lock `path`, creating it and its parent directories if missing.
    pub fn acquire(path: &Path) -> Result<Self, RegistryError> {
        Self::acquire_within(path, WAIT_LIMIT)
    }

    /// Lock `path`, giving up with `RegistryError::LockFailed` after `limit`.
    ///
    /// Retries back off exponentially from 10 ms up to 500 ms.
    pub fn acquire_within(path: &Path, limit: Duration) -> Result<Self, RegistryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + limit;
        let mut delay = FIRST_RETRY;
        while let Err(e) = file.try_lock_exclusive() {
            if e.kind() != io::ErrorKind::WouldBlock {
                return Err(e.into());
            }
            let now = Instant::now();
            if now >= deadline {
                log::warn!("gave up waiting for {} after {:?}", path.display(), limit);
                return Err(RegistryError::LockFailed);
            }
            thread::sleep(delay.min(deadline - now));
            delay = (delay * 2).min(MAX_RETRY);
        }

        log::trace!("locked {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("failed to unlock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[test]
    fn creates_lock_file_and_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("repositories.lock");

        let lock = RegistryLock::acquire(&path).unwrap();

        assert!(path.is_file());
        assert_eq!(lock.path(), path);
    }

    #[test]
    fn second_writer_gives_up_while_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repositories.lock");

        let _held = RegistryLock::acquire(&path).unwrap();
        let started = Instant::now();
        let err = RegistryLock::acquire_within(&path, Duration::from_millis(100)).unwrap_err();

        assert!(matches!(err, RegistryError::LockFailed));
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repositories.lock");

        drop(RegistryLock::acquire(&path).unwrap());
        assert!(RegistryLock::acquire_within(&path, Duration::ZERO).is_ok());
    }

    #[test]
    fn waiter_gets_lock_once_holder_finishes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("repositories.lock");
        let (locked_tx, locked_rx) = mpsc::channel();

        let holder_path = path.clone();
        let holder = thread::spawn(move || {
            let lock = RegistryLock::acquire(&holder_path).unwrap();
            locked_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
            drop(lock);
        });

        locked_rx.recv().unwrap();
        let waited = RegistryLock::acquire_within(&path, Duration::from_secs(5));
        holder.join().unwrap();

        assert!(waited.is_ok());
    }
}
