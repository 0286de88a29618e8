use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stock_logging::{stock_debug, stock_info};

use crate::persist::{AtomicFileWriter, PersistError};

/// Opaque session cookies, keyed by cookie name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialBundle(BTreeMap<String, String>);

impl CredentialBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a browser `Cookie` header (`a=1; b=2`). Pairs without a name
    /// are skipped.
    pub fn from_cookie_header(header: &str) -> Self {
        let mut bundle = Self::new();
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            bundle.insert(name, value.trim());
        }
        bundle
    }

    pub fn to_cookie_header(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to read credential cache {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("credential cache {path:?} is malformed: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize credentials: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to write credential cache {path:?}: {source}")]
    Write { path: PathBuf, source: PersistError },
}

/// The on-disk cookie cache: one JSON object, rewritten whole on every store.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no cache file exists yet.
    pub fn load(&self) -> Result<Option<CredentialBundle>, CacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                stock_debug!("No credential cache at {:?}", self.path);
                return Ok(None);
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let bundle: CredentialBundle =
            serde_json::from_str(&content).map_err(|source| CacheError::Parse {
                path: self.path.clone(),
                source,
            })?;
        stock_debug!(
            "Loaded {} credential entries from {:?}",
            bundle.len(),
            self.path
        );
        Ok(Some(bundle))
    }

    pub fn store(&self, bundle: &CredentialBundle) -> Result<(), CacheError> {
        let content = serde_json::to_string_pretty(bundle).map_err(CacheError::Serialize)?;
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| CacheError::Write {
                path: self.path.clone(),
                source: PersistError::OutputDir {
                    path: self.path.clone(),
                    reason: "cache path has no file name".into(),
                },
            })?;
        AtomicFileWriter::for_file(&self.path)
            .write(&filename, content.as_bytes())
            .map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        stock_info!(
            "Stored {} credential entries to {:?}",
            bundle.len(),
            self.path
        );
        Ok(())
    }
}
