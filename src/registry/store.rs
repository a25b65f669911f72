//! Persistent registry of named repositories.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ConfigPaths, RegistryLock};
use crate::types::RepoName;

/// URL schemes the svn client can open.
const SUPPORTED_SCHEMES: &[&str] = &["svn://", "svn+ssh://", "http://", "https://", "file://"];

/// Errors returned by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// An underlying IO operation failed.
    #[error("registry file access failed")]
    Io(#[from] io::Error),
    /// The registry file is not valid JSON.
    #[error("malformed registry file")]
    Json(#[from] serde_json::Error),
    /// Failed to acquire the registry lock within the timeout.
    #[error("lock acquisition failed")]
    LockFailed,
    /// The repository URL cannot be used.
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    /// The repository name cannot be used.
    #[error("invalid repository name: {0}")]
    InvalidName(String),
}

/// Where a named repository lives and how to authenticate to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLocation {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl RepositoryLocation {
    /// Create a location without credentials after validating the URL.
    pub fn new(url: impl Into<String>) -> Result<Self, RegistryError> {
        let url = url.into().trim().to_string();
        validate_url(&url)?;
        Ok(Self {
            url,
            username: None,
            password: None,
        })
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self.password = password;
        self
    }
}

/// Validate a repository URL before it is stored.
///
/// Rejects:
/// - Unsupported schemes
/// - Whitespace or control characters
/// - A leading `-` (could be interpreted as a flag)
fn validate_url(url: &str) -> Result<(), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    if url.starts_with('-') {
        return Err(invalid("cannot start with '-'"));
    }
    if url.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(invalid("cannot contain whitespace or control characters"));
    }
    let Some(scheme) = SUPPORTED_SCHEMES.iter().find(|s| url.starts_with(*s)) else {
        return Err(invalid("unsupported scheme"));
    };
    if url.len() == scheme.len() {
        return Err(invalid("missing host or path"));
    }
    Ok(())
}

/// Snapshot of all registered repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    repositories: BTreeMap<String, RepositoryLocation>,
}

impl Registry {
    /// Look up a repository by name.
    pub fn get(&self, name: &str) -> Option<&RepositoryLocation> {
        self.repositories.get(name)
    }

    /// Add or replace a repository.
    pub fn insert(&mut self, name: &str, location: RepositoryLocation) {
        self.repositories.insert(name.to_string(), location);
    }

    /// Remove a repository. Returns true if it was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        self.repositories.remove(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepositoryLocation)> {
        self.repositories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Read a registry file. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the registry atomically: temp file in the same dir, then rename.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(self)?;
        if let Err(e) = write_private(&tmp, contents.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// The registry can hold passwords, so it is only readable by the owner.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}

/// Reads and updates the registry file under `ConfigPaths`.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    paths: ConfigPaths,
}

impl RegistryStore {
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Load the current registry without locking.
    pub fn load(&self) -> Result<Registry, RegistryError> {
        Registry::load(&self.paths.registry_file())
    }

    /// Register (or re-register) a repository under `name`.
    pub fn register(&self, name: &str, location: RepositoryLocation) -> Result<(), RegistryError> {
        let name: RepoName = name
            .parse()
            .map_err(|e| RegistryError::InvalidName(format!("{}", e)))?;
        validate_url(&location.url)?;

        self.update(|registry| {
            registry.insert(name.as_str(), location);
            true
        })?;
        log::info!("registered repository {}", name);
        Ok(())
    }

    /// Remove `name`. Returns false if it was not registered.
    pub fn unregister(&self, name: &str) -> Result<bool, RegistryError> {
        let name = name.trim();
        let removed = self.update(|registry| registry.remove(name))?;
        if removed {
            log::info!("unregistered repository {}", name);
        }
        Ok(removed)
    }

    /// Load, modify and save under the registry lock. `change` returns
    /// whether anything changed; unchanged registries are not rewritten.
    fn update(&self, change: impl FnOnce(&mut Registry) -> bool) -> Result<bool, RegistryError> {
        let _lock = RegistryLock::acquire(&self.paths.lock_path())?;

        let path = self.paths.registry_file();
        let mut registry = Registry::load(&path)?;
        let changed = change(&mut registry);
        if changed {
            registry.save(&path)?;
        }
        Ok(changed)
    }
}
