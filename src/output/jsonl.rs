//! Append-only newline-delimited JSON writer

use crate::Result;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Lock-guarded appender shared by concurrent writers
///
/// Each record becomes exactly one line; the lock keeps lines from
/// interleaving when several writer tasks share one file.
pub struct JsonlAppender {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAppender {
    /// Opens the file for appending, creating it if absent
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Serializes the record and appends it as one line
    pub fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock().unwrap();
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    /// The file this appender writes to
    pub fn path(&self) -> &Path {
        &self.path
    }
}
