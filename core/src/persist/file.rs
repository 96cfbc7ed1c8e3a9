//! persist/file.rs
//! File-backed counter region.
//!
//! Crash consistency: the region is written to `<path>.tmp`, synced, then
//! renamed over `<path>`. A power cut leaves either the old or the new value.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::persist::store::{decode_region, encode_region, CounterStore, StoreError};

#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_region(&self, value: u64) -> io::Result<()> {
        let tmp = self.tmp_path();
        {
            let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp)?;
            file.write_all(&encode_region(value))?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        sync_parent_dir(&self.path);
        Ok(())
    }
}

impl CounterStore for FileCounterStore {
    fn read(&mut self) -> Result<Option<u64>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => decode_region(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read(e)),
        }
    }

    fn write(&mut self, value: u64) -> Result<(), StoreError> {
        self.write_region(value).map_err(StoreError::PersistenceWriteFailure)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Best effort: persist the rename itself. Not every platform can open a directory.
fn sync_parent_dir(path: &Path) {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Ok(handle) = File::open(dir) {
            let _ = handle.sync_all();
        }
    }
}
