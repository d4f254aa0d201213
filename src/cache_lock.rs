//! Exclusive ownership of an accessory cache file.
//!
//! Two bridges writing the same cache would overwrite each other's
//! accessories. The lock is a Unix socket bound next to the cache file: the
//! OS drops the binding when the process dies, so a crashed bridge never
//! leaves a lock that blocks the next start.

use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheLockError {
    #[error("another bridge is already using {0}")]
    AlreadyRunning(PathBuf),

    #[error("failed to acquire cache lock: {0}")]
    Io(#[from] io::Error),
}

/// Held for as long as the bridge owns the cache. Dropping it removes the socket.
pub struct CacheLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl CacheLock {
    /// Lock the cache at `cache_path`.
    pub fn acquire(cache_path: &Path) -> Result<Self, CacheLockError> {
        let path = Self::socket_path(cache_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // A leftover socket nobody answers on belongs to a dead process
        if path.exists() {
            if UnixStream::connect(&path).is_ok() {
                return Err(CacheLockError::AlreadyRunning(cache_path.to_path_buf()));
            }
            let _ = std::fs::remove_file(&path);
        }

        match UnixListener::bind(&path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path,
            }),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                Err(CacheLockError::AlreadyRunning(cache_path.to_path_buf()))
            }
            Err(e) => Err(CacheLockError::Io(e)),
        }
    }

    /// Socket path guarding `cache_path`: same directory, `.lock` extension.
    pub fn socket_path(cache_path: &Path) -> PathBuf {
        cache_path.with_extension("lock")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
