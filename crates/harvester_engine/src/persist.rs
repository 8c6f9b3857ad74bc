//! Timestamped JSON list files, written atomically.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use harvester_core::{HarvestSet, ListKind};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::list_filename;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("list file {path} is not a JSON array of strings: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Saves and loads identifier lists as pretty-printed JSON arrays.
#[derive(Clone)]
pub struct ListStore {
    dir: PathBuf,
    clock: Clock,
}

impl fmt::Debug for ListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListStore").field("dir", &self.dir).finish()
    }
}

impl ListStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, || Local::now().naive_local())
    }

    pub fn with_clock<F>(dir: impl Into<PathBuf>, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        Self {
            dir: dir.into(),
            clock: Arc::new(clock),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `members` in the given order; an existing file of the same name is replaced.
    pub fn save<S: AsRef<str>>(
        &self,
        username: &str,
        label: &str,
        members: &[S],
    ) -> Result<PathBuf, StoreError> {
        let filename = list_filename(username, label, (self.clock)());
        let members: Vec<&str> = members.iter().map(AsRef::as_ref).collect();
        let body = serde_json::to_string_pretty(&members).map_err(|source| StoreError::Format {
            path: self.dir.join(&filename),
            source,
        })?;
        let path = self.write_atomic(&filename, &body)?;
        engine_logging::engine_info!("saved {} entries to {}", members.len(), path.display());
        Ok(path)
    }

    pub fn save_set(&self, username: &str, set: &HarvestSet) -> Result<PathBuf, StoreError> {
        self.save(username, set.label(), &set.to_vec())
    }

    pub fn load(path: &Path) -> Result<Vec<String>, StoreError> {
        let body = fs::read_to_string(path)?;
        serde_json::from_str(&body).map_err(|source| StoreError::Format {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_set(path: &Path, kind: ListKind) -> Result<HarvestSet, StoreError> {
        let members = Self::load(path)?;
        engine_logging::engine_info!("loaded {} {} from {}", members.len(), kind, path.display());
        Ok(HarvestSet::from_members(kind, members))
    }

    fn write_atomic(&self, filename: &str, content: &str) -> Result<PathBuf, StoreError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        Ok(target)
    }
}
