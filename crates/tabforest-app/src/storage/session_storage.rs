//! File-backed snapshot storage
//!
//! All calls do blocking file I/O; async callers should go through
//! `tokio::task::spawn_blocking`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use tabforest_core::prelude::*;
use tabforest_core::RecoverableBrowserState;
use tabforest_engine::Engine;

use super::reader::{BrowserStateReader, ReadOptions};
use super::writer::BrowserStateWriter;
use crate::config::StorageSettings;
use crate::state::BrowserState;

#[derive(Debug, Clone)]
pub struct SessionStorage {
    dir: PathBuf,
    file_name: String,
}

impl SessionStorage {
    pub fn new(dir: impl Into<PathBuf>, settings: &StorageSettings) -> Self {
        Self {
            dir: dir.into(),
            file_name: settings.file_name.clone(),
        }
    }

    /// Location of the snapshot file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.tmp", self.file_name))
    }

    /// Write the non-private part of `state`
    pub fn save(&self, state: &BrowserState) -> Result<()> {
        self.save_snapshot(&state.to_recoverable())
    }

    /// Sidecar lock serializing writers; never renamed or removed
    fn lock_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.lock", self.file_name))
    }

    /// Write `snapshot` to a temp file, then swap it in.
    ///
    /// The whole write and rename happen under an exclusive lock on the
    /// sidecar file, so concurrent savers take turns.
    pub fn save_snapshot(&self, snapshot: &RecoverableBrowserState) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::storage(format!("Failed to create {:?}: {}", self.dir, e)))?;

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| Error::storage(format!("Failed to open {:?}: {}", lock_path, e)))?;
        lock.lock_exclusive()
            .map_err(|e| Error::storage(format!("Failed to lock {:?}: {}", lock_path, e)))?;

        let result = self.write_and_swap(snapshot);

        if let Err(e) = lock.unlock() {
            warn!("Failed to unlock {:?}: {}", lock_path, e);
        }
        result
    }

    fn write_and_swap(&self, snapshot: &RecoverableBrowserState) -> Result<()> {
        let temp_path = self.temp_path();
        let file = File::create(&temp_path)
            .map_err(|e| Error::storage(format!("Failed to open {:?}: {}", temp_path, e)))?;

        let mut writer = BufWriter::new(&file);
        BrowserStateWriter::write(snapshot, &mut writer)?;
        writer.flush()?;
        drop(writer);
        file.sync_all()?;

        let path = self.path();
        fs::rename(&temp_path, &path)
            .map_err(|e| Error::storage(format!("Failed to replace {:?}: {}", path, e)))?;

        debug!("Saved {} tabs to {:?}", snapshot.tabs.len(), path);
        Ok(())
    }

    /// Read the stored snapshot; `Ok(None)` when there is none
    pub fn restore<E: Engine>(
        &self,
        engine: &E,
        options: &ReadOptions,
    ) -> Result<Option<RecoverableBrowserState>> {
        let path = self.path();
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let restored = BrowserStateReader::read(engine, BufReader::new(file), options)
            .with_context(|| format!("Failed to read snapshot {:?}", path))?;
        if let Some(state) = &restored {
            info!("Restored {} tabs from {:?}", state.tabs.len(), path);
        }
        Ok(restored)
    }

    /// Delete the stored snapshot, if any
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.path())?;
        remove_if_exists(&self.temp_path())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
