//! Seams between the update dispatcher and the code that talks to a repository.
//!
//! The dispatcher only knows these traits. `SvnConnector` / `SvnRetriever`
//! implement them over the `svn` client; tests implement them with fakes.

use std::path::Path;

use thiserror::Error;

use crate::registry::RegistryError;
use crate::retrieve::RetrieveError;
use crate::svn::SvnError;
use crate::types::{NodeKind, RepoName, Revision};
use crate::update::UpdateOutcome;

/// Errors raised while opening or querying a repository connection.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No repository is registered under the name.
    #[error("repository '{0}' is not registered")]
    NotRegistered(String),
    /// The registry could not be read.
    #[error("failed to read the repository registry")]
    Registry(#[from] RegistryError),
    /// The svn client reported an error.
    #[error("svn request failed")]
    Svn(#[from] SvnError),
    /// Local setup for the connection failed.
    #[error("failed to prepare the svn session")]
    Io(#[from] std::io::Error),
}

/// Opens connections to named repositories.
pub trait Connector {
    type Connection: Connection;

    /// Open a connection to the repository registered under `name`.
    fn open(&self, name: &RepoName) -> Result<Self::Connection, RepositoryError>;
}

/// An open connection to one repository.
pub trait Connection {
    /// Name the connection was opened for.
    fn name(&self) -> &RepoName;

    /// Resolve what `path` is at `revision`.
    ///
    /// A path that does not exist is `NodeKind::None`, not an error.
    fn classify(&self, path: &str, revision: Revision) -> Result<NodeKind, RepositoryError>;

    /// Release the connection. Must be safe to call more than once.
    fn close(&mut self);
}

/// Copies repository content to the local filesystem.
pub trait Retriever {
    type Connection: Connection;

    /// Retrieve a single file.
    fn retrieve_file(
        &self,
        connection: &Self::Connection,
        source: &str,
        destination: &Path,
        revision: Revision,
        include_properties: bool,
    ) -> Result<UpdateOutcome, RetrieveError>;

    /// Retrieve a directory, descending into subdirectories when `recursive`.
    fn retrieve_directory(
        &self,
        connection: &Self::Connection,
        source: &str,
        destination: &Path,
        revision: Revision,
        recursive: bool,
        include_properties: bool,
    ) -> Result<UpdateOutcome, RetrieveError>;
}
