use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ParseError, RepoName, Revision};

/// Missing or empty required arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing repository name")]
    MissingRepositoryName,
    #[error("missing local destination")]
    MissingDestination,
    #[error("invalid repository name: {0}")]
    InvalidRepositoryName(String),
}

/// One update call.
///
/// Defaults: revision `HEAD`, not recursive, no properties. Strings are
/// kept as given; the dispatcher trims and validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub name: String,
    pub source_path: String,
    pub destination_path: String,
    pub revision: Revision,
    pub recursive: bool,
    pub include_properties: bool,
}

impl UpdateRequest {
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            revision: Revision::Head,
            recursive: false,
            include_properties: false,
        }
    }

    #[must_use]
    pub fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn with_properties(mut self, include_properties: bool) -> Self {
        self.include_properties = include_properties;
        self
    }

    /// The repository name, trimmed. Empty is a validation error.
    pub fn repository_name(&self) -> Result<RepoName, ValidationError> {
        parse_repository_name(&self.name)
    }

    /// The repository path, trimmed. Empty means the repository root.
    pub fn source(&self) -> &str {
        self.source_path.trim()
    }

    /// The local destination, trimmed. Empty is a validation error.
    pub fn destination(&self) -> Result<PathBuf, ValidationError> {
        let destination = self.destination_path.trim();
        if destination.is_empty() {
            return Err(ValidationError::MissingDestination);
        }
        Ok(PathBuf::from(destination))
    }
}

pub(crate) fn parse_repository_name(name: &str) -> Result<RepoName, ValidationError> {
    name.parse().map_err(|e| match e {
        ParseError::Empty => ValidationError::MissingRepositoryName,
        other => ValidationError::InvalidRepositoryName(other.to_string()),
    })
}
