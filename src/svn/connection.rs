//! `Connector` / `Connection` implementation backed by the svn client.

use std::collections::BTreeMap;
use std::fs::File;

use tempfile::TempDir;

use super::cli::{SvnAuth, SvnCli, peg_target};
use super::xml::{ListEntry, parse_info, parse_list, parse_proplist};
use super::SvnError;
use crate::registry::{RegistryStore, RepositoryLocation};
use crate::repository::{Connection, Connector, RepositoryError};
use crate::types::{NodeKind, RepoName, Revision};

/// Opens `SvnConnection`s for names found in the registry.
///
/// The registry is read on every `open`, so a broken registry file surfaces
/// as a connection error for the requested name.
pub struct SvnConnector {
    store: RegistryStore,
    cli: SvnCli,
}

impl SvnConnector {
    pub fn new(store: RegistryStore) -> Self {
        Self {
            store,
            cli: SvnCli::new(),
        }
    }

    /// Use a specific svn client instead of the one on `PATH`.
    pub fn with_cli(mut self, cli: SvnCli) -> Self {
        self.cli = cli;
        self
    }
}

impl Connector for SvnConnector {
    type Connection = SvnConnection;

    fn open(&self, name: &RepoName) -> Result<SvnConnection, RepositoryError> {
        let registry = self.store.load()?;
        let location = registry
            .get(name.as_str())
            .ok_or_else(|| RepositoryError::NotRegistered(name.to_string()))?
            .clone();

        let config_dir = tempfile::Builder::new().prefix("svnup-").tempdir()?;
        let auth = SvnAuth {
            username: location.username.clone(),
            password: location.password.clone(),
            config_dir: Some(config_dir.path().to_path_buf()),
        };

        let xml = self
            .cli
            .info(&auth, &peg_target(&location.url, "", Revision::Head))?;
        let info = parse_info(&xml)?;
        if info.kind != NodeKind::Directory {
            return Err(SvnError::InvalidInput(format!(
                "{} is a file, not a repository directory",
                location.url
            ))
            .into());
        }
        log::debug!("opened {} at {} (head r{})", name, location.url, info.revision);

        Ok(SvnConnection {
            name: name.clone(),
            location,
            cli: self.cli.clone(),
            auth,
            config_dir: Some(config_dir),
        })
    }
}

/// An open connection to one registered repository.
///
/// Owns a private svn `--config-dir`; `close` removes it.
pub struct SvnConnection {
    name: RepoName,
    location: RepositoryLocation,
    cli: SvnCli,
    auth: SvnAuth,
    config_dir: Option<TempDir>,
}

impl SvnConnection {
    /// Returns true until `close` has been called.
    pub fn is_open(&self) -> bool {
        self.config_dir.is_some()
    }

    fn target(&self, path: &str, revision: Revision) -> Result<String, SvnError> {
        if !self.is_open() {
            return Err(SvnError::InvalidInput(format!(
                "connection to {} is closed",
                self.name
            )));
        }
        Ok(peg_target(&self.location.url, path, revision))
    }

    /// Immediate children of a directory at `revision`.
    pub fn list(&self, path: &str, revision: Revision) -> Result<Vec<ListEntry>, SvnError> {
        let xml = self.cli.list(&self.auth, &self.target(path, revision)?)?;
        parse_list(&xml)
    }

    /// Versioned properties of `path` at `revision`.
    pub fn properties(
        &self,
        path: &str,
        revision: Revision,
    ) -> Result<BTreeMap<String, String>, SvnError> {
        let xml = self.cli.proplist(&self.auth, &self.target(path, revision)?)?;
        parse_proplist(&xml)
    }

    /// Write the content of file `path` at `revision` into `out`.
    pub fn download(&self, path: &str, revision: Revision, out: File) -> Result<(), SvnError> {
        let target = self.target(path, revision)?;
        self.cli.cat(&self.auth, &target, out)
    }
}

impl Connection for SvnConnection {
    fn name(&self) -> &RepoName {
        &self.name
    }

    fn classify(&self, path: &str, revision: Revision) -> Result<NodeKind, RepositoryError> {
        let target = self.target(path, revision)?;
        match self.cli.info(&self.auth, &target) {
            Ok(xml) => Ok(parse_info(&xml)?.kind),
            Err(err) if err.is_not_found() => Ok(NodeKind::None),
            Err(err) => Err(err.into()),
        }
    }

    fn close(&mut self) {
        if let Some(dir) = self.config_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("failed to remove {}: {}", path.display(), e);
            }
            log::debug!("closed connection to {}", self.name);
        }
    }
}

impl Drop for SvnConnection {
    fn drop(&mut self) {
        self.close();
    }
}
