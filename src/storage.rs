//! Flat key→value persistence. One file per key, little-endian integers,
//! assumed durable and atomic per key. Missing keys are "feature never used
//! yet", not errors; write failures are logged and swallowed because the
//! interval must keep running regardless of storage health.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// Interval bookkeeping.
pub const KEY_STATE: &str = "state";
pub const KEY_WAKEUP_ID: &str = "wakeup_id";
pub const KEY_REMAINING: &str = "remaining";
pub const KEY_DEFERRED_EVENT: &str = "deferred_event";

// Configuration strings written by the companion, read by the core.
pub const KEY_WEBHOOK_TOKEN: &str = "webhook_token";
pub const KEY_EVENT_STARTED: &str = "event_started";
pub const KEY_EVENT_CANCELED: &str = "event_canceled";
pub const KEY_EVENT_FINISHED: &str = "event_finished";
pub const KEY_TASK_TITLE: &str = "task_title";
pub const KEY_TASKLIST_TOKEN: &str = "tasklist_token";

// Interval duration overrides.
pub const KEY_WORK_SECS: &str = "work_secs";
pub const KEY_BREAK_SECS: &str = "break_secs";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store i/o failure: {0}")]
    Io(#[from] io::Error),
}

pub trait Store {
    fn read_u32(&self, key: &str) -> Option<u32>;
    fn write_u32(&mut self, key: &str, value: u32);
    fn read_i64(&self, key: &str) -> Option<i64>;
    fn write_i64(&mut self, key: &str, value: i64);
    /// Bounded string read: at most `cap` bytes are considered, longer
    /// stored values are truncated, never overflowed. `None` means the key
    /// is not present.
    fn read_string(&self, key: &str, cap: usize) -> Option<String>;
    fn write_string(&mut self, key: &str, value: &str);
    fn delete(&mut self, key: &str);
    fn exists(&self, key: &str) -> bool;
}

/// Store backed by a directory with one file per key.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn read_bytes(&self, key: &str) -> Option<Vec<u8>> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("failed to read key `{}`: {}", key, e);
                None
            }
        }
    }

    fn write_bytes(&self, key: &str, bytes: &[u8]) {
        if let Err(e) = fs::write(self.path(key), bytes) {
            log::error!("failed to write key `{}`: {}", key, e);
        }
    }
}

impl Store for FileStore {
    fn read_u32(&self, key: &str) -> Option<u32> {
        let bytes = self.read_bytes(key)?;
        if bytes.len() < 4 {
            log::warn!("key `{}` holds {} bytes, expected 4", key, bytes.len());
            return None;
        }
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[..4]);
        Some(u32::from_le_bytes(buf))
    }

    fn write_u32(&mut self, key: &str, value: u32) {
        self.write_bytes(key, &value.to_le_bytes());
    }

    fn read_i64(&self, key: &str) -> Option<i64> {
        let bytes = self.read_bytes(key)?;
        if bytes.len() < 8 {
            log::warn!("key `{}` holds {} bytes, expected 8", key, bytes.len());
            return None;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        Some(i64::from_le_bytes(buf))
    }

    fn write_i64(&mut self, key: &str, value: i64) {
        self.write_bytes(key, &value.to_le_bytes());
    }

    fn read_string(&self, key: &str, cap: usize) -> Option<String> {
        let mut bytes = self.read_bytes(key)?;
        if bytes.len() > cap {
            bytes.truncate(cap);
        }
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_string(&mut self, key: &str, value: &str) {
        self.write_bytes(key, value.as_bytes());
    }

    fn delete(&mut self, key: &str) {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to delete key `{}`: {}", key, e),
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }
}
