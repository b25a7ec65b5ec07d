//! File-backed preference store: one JSON object per domain.
//!
//! Writes are buffered per domain and only reach disk on `synchronize`.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use app_core::PreferenceStore;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::paths;

type DomainEntries = Map<String, Value>;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("I/O error accessing preferences at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse preferences at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct JsonPreferenceStore {
    dir: PathBuf,
    pending: HashMap<String, DomainEntries>,
}

impl JsonPreferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            pending: HashMap::new(),
        }
    }

    /// Store rooted at [`paths::prefs_dir`].
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(paths::prefs_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn domain_path(&self, domain: &str) -> PathBuf {
        domain_path(&self.dir, domain)
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str, domain: &str) -> anyhow::Result<Option<Value>> {
        if let Some(entries) = self.pending.get(domain) {
            return Ok(entries.get(key).cloned());
        }
        let mut entries = read_domain(&domain_path(&self.dir, domain))?;
        Ok(entries.remove(key))
    }

    fn set(&mut self, key: &str, value: Value, domain: &str) -> anyhow::Result<()> {
        if !self.pending.contains_key(domain) {
            let entries = read_domain(&domain_path(&self.dir, domain))?;
            self.pending.insert(domain.to_string(), entries);
        }
        if let Some(entries) = self.pending.get_mut(domain) {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn synchronize(&mut self, domain: &str) -> bool {
        let Some(entries) = self.pending.get(domain) else {
            debug!(%domain, "nothing to synchronize");
            return true;
        };

        let path = domain_path(&self.dir, domain);
        match write_domain(&path, entries) {
            Ok(()) => {
                debug!(%domain, path = %path.display(), "preferences synchronized");
                self.pending.remove(domain);
                true
            }
            Err(err) => {
                warn!(%domain, error = %err, "failed to synchronize preferences");
                false
            }
        }
    }
}

fn domain_path(dir: &Path, domain: &str) -> PathBuf {
    dir.join(format!("{domain}.json"))
}

fn read_domain(path: &Path) -> Result<DomainEntries, PrefsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(DomainEntries::new()),
        Err(source) => {
            return Err(PrefsError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&raw).map_err(|source| PrefsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_domain(path: &Path, entries: &DomainEntries) -> Result<(), PrefsError> {
    let io_err = |source| PrefsError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(io_err)?;

    let json = serde_json::to_vec_pretty(entries)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
