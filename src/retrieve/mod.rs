//! Copies files and directory trees out of a repository.

mod dir;
mod file;

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::repository::{RepositoryError, Retriever};
use crate::svn::{SvnConnection, SvnError};
use crate::types::Revision;
use crate::update::UpdateOutcome;

/// Errors raised while copying repository content.
#[derive(Error, Debug)]
pub enum RetrieveError {
    /// Reading from the repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// Writing to the local filesystem failed.
    #[error("failed to write local files")]
    Io(#[from] io::Error),
}

impl From<SvnError> for RetrieveError {
    fn from(err: SvnError) -> Self {
        RetrieveError::Repository(err.into())
    }
}

/// `Retriever` over an open `SvnConnection`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvnRetriever;

impl Retriever for SvnRetriever {
    type Connection = SvnConnection;

    fn retrieve_file(
        &self,
        connection: &SvnConnection,
        source: &str,
        destination: &Path,
        revision: Revision,
        include_properties: bool,
    ) -> Result<UpdateOutcome, RetrieveError> {
        file::retrieve(connection, source, destination, revision, include_properties)
    }

    fn retrieve_directory(
        &self,
        connection: &SvnConnection,
        source: &str,
        destination: &Path,
        revision: Revision,
        recursive: bool,
        include_properties: bool,
    ) -> Result<UpdateOutcome, RetrieveError> {
        dir::retrieve(
            connection,
            source,
            destination,
            revision,
            recursive,
            include_properties,
        )
    }
}

/// Repository path of `name` inside directory `parent`.
fn child_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_path_joins_with_single_slash() {
        assert_eq!(child_path("", "a.txt"), "a.txt");
        assert_eq!(child_path("/", "a.txt"), "a.txt");
        assert_eq!(child_path("temp", "a.txt"), "temp/a.txt");
        assert_eq!(child_path("temp/", "a.txt"), "temp/a.txt");
        assert_eq!(child_path("temp//", "sub"), "temp/sub");
    }

    #[test]
    fn svn_errors_are_repository_errors() {
        let err: RetrieveError = SvnError::NotFound("E160013".to_string()).into();
        assert!(matches!(
            err,
            RetrieveError::Repository(RepositoryError::Svn(SvnError::NotFound(_)))
        ));
    }
}
