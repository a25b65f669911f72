//! Update dispatcher
//!
//! Resolves whether a repository path is a file or a directory at a revision
//! and hands the request to the matching retrieval routine:
//!
//! 1. validate the repository name (no connection on failure)
//! 2. open a connection, held by a guard that closes it on every exit path
//! 3. classify the path while the connection is held
//! 4. validate the destination (only after a successful classification)
//! 5. dispatch: directory / file retrieval, or `false` for a missing path

use std::io;
use std::ops::Deref;

use thiserror::Error;

use super::request::parse_repository_name;
use super::{UpdateOutcome, UpdateRequest, ValidationError};
use crate::repository::{Connection, Connector, RepositoryError, Retriever};
use crate::retrieve::RetrieveError;
use crate::types::{NodeKind, RepoName, Revision};

/// Errors returned by the update dispatcher.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A required argument is missing or empty.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The repository could not be reached or queried.
    #[error("unable to connect to {name}: provide a valid SVN repository")]
    Connection {
        name: String,
        #[source]
        source: RepositoryError,
    },
    /// Writing the local copy failed.
    #[error("failed to write local copy")]
    Local(#[source] io::Error),
}

impl UpdateError {
    fn connection(name: &RepoName, source: RepositoryError) -> Self {
        UpdateError::Connection {
            name: name.to_string(),
            source,
        }
    }

    fn retrieve(name: &RepoName, err: RetrieveError) -> Self {
        match err {
            RetrieveError::Repository(source) => Self::connection(name, source),
            RetrieveError::Io(e) => UpdateError::Local(e),
        }
    }

    /// Name of the repository a connection error refers to.
    pub fn repository(&self) -> Option<&str> {
        match self {
            UpdateError::Connection { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Closes the wrapped connection when dropped.
struct ConnectionGuard<C: Connection> {
    connection: C,
}

impl<C: Connection> ConnectionGuard<C> {
    fn new(connection: C) -> Self {
        Self { connection }
    }
}

impl<C: Connection> Deref for ConnectionGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C: Connection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        log::debug!("releasing connection to {}", self.connection.name());
        self.connection.close();
    }
}

/// Routes update requests to file or directory retrieval.
pub struct Dispatcher<K, R> {
    connector: K,
    retriever: R,
}

impl<K, R> Dispatcher<K, R>
where
    K: Connector,
    R: Retriever<Connection = K::Connection>,
{
    pub fn new(connector: K, retriever: R) -> Self {
        Self {
            connector,
            retriever,
        }
    }

    /// Retrieve `request.source_path` into `request.destination_path`.
    ///
    /// Returns `Done(false)` when the path does not exist at the revision.
    pub fn update(&self, request: &UpdateRequest) -> Result<UpdateOutcome, UpdateError> {
        let name = request.repository_name()?;
        let connection = self.open(&name)?;

        let source = request.source();
        let revision = request.revision;
        let kind = connection
            .classify(source, revision)
            .map_err(|e| UpdateError::connection(&name, e))?;
        log::debug!("{}:/{}@{} is {}", name, source, revision, kind);

        let destination = request.destination()?;

        let result = match kind {
            NodeKind::Directory => {
                log::info!(
                    "retrieving directory {}:/{}@{} into {} (recursive: {})",
                    name,
                    source,
                    revision,
                    destination.display(),
                    request.recursive
                );
                self.retriever.retrieve_directory(
                    &connection,
                    source,
                    &destination,
                    revision,
                    request.recursive,
                    request.include_properties,
                )
            }
            NodeKind::File => {
                log::info!(
                    "retrieving file {}:/{}@{} into {}",
                    name,
                    source,
                    revision,
                    destination.display()
                );
                self.retriever.retrieve_file(
                    &connection,
                    source,
                    &destination,
                    revision,
                    request.include_properties,
                )
            }
            NodeKind::None => return Ok(UpdateOutcome::Done(false)),
        };

        result.map_err(|e| UpdateError::retrieve(&name, e))
    }

    /// Resolve what `path` is at `revision` without retrieving anything.
    pub fn classify(
        &self,
        name: &str,
        path: &str,
        revision: Revision,
    ) -> Result<NodeKind, UpdateError> {
        let name = parse_repository_name(name)?;
        let connection = self.open(&name)?;
        connection
            .classify(path.trim(), revision)
            .map_err(|e| UpdateError::connection(&name, e))
    }

    fn open(&self, name: &RepoName) -> Result<ConnectionGuard<K::Connection>, UpdateError> {
        self.connector
            .open(name)
            .map(ConnectionGuard::new)
            .map_err(|e| UpdateError::connection(name, e))
    }
}
