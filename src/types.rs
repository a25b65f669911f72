//! Shared types for svnup

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for parsing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("value cannot be empty")]
    Empty,
    #[error("invalid character in value: {0:?}")]
    InvalidCharacter(char),
    #[error("invalid revision: {0}")]
    InvalidRevision(String),
    #[error("unknown node kind: {0}")]
    UnknownKind(String),
}

/// Logical name of a registered repository
///
/// Validation rules:
/// - Surrounding whitespace is trimmed
/// - Non-empty after trimming
/// - No control characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName(String);

impl RepoName {
    /// Returns the repository name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RepoName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        if let Some(c) = s.chars().find(|c| c.is_control()) {
            return Err(ParseError::InvalidCharacter(c));
        }

        Ok(RepoName(s.to_string()))
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A repository revision to read from.
///
/// `Head` is resolved by the server at query time and is never pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Revision {
    #[default]
    Head,
    Number(u64),
}

impl Revision {
    /// Raw sentinel used by callers that pass revisions as plain integers.
    pub const HEAD_SENTINEL: i64 = -1;

    /// Converts a raw integer revision; any negative value means `Head`.
    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            Revision::Head
        } else {
            Revision::Number(raw as u64)
        }
    }
}

impl FromStr for Revision {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }

        if s.eq_ignore_ascii_case("head") {
            return Ok(Revision::Head);
        }

        s.parse::<i64>()
            .map(Revision::from_raw)
            .map_err(|_| ParseError::InvalidRevision(s.to_string()))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Head => write!(f, "HEAD"),
            Revision::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Kind of node a repository path resolves to at a given revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
    /// The path does not exist at the revision.
    None,
}

impl NodeKind {
    /// Returns the svn spelling of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Directory => "dir",
            NodeKind::None => "none",
        }
    }
}

impl FromStr for NodeKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "file" => Ok(NodeKind::File),
            "dir" | "directory" => Ok(NodeKind::Directory),
            "none" => Ok(NodeKind::None),
            "" => Err(ParseError::Empty),
            other => Err(ParseError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_name_tests {
        use super::*;

        #[test]
        fn valid_name_simple() {
            let name: RepoName = "mySVN".parse().unwrap();
            assert_eq!(name.as_str(), "mySVN");
        }

        #[test]
        fn valid_name_is_trimmed() {
            let name: RepoName = "  mySVN\t".parse().unwrap();
            assert_eq!(name.as_str(), "mySVN");
        }

        #[test]
        fn valid_name_with_spaces_inside() {
            let name: RepoName = "my repo".parse().unwrap();
            assert_eq!(name.as_str(), "my repo");
        }

        #[test]
        fn invalid_name_empty() {
            assert_eq!("".parse::<RepoName>(), Err(ParseError::Empty));
        }

        #[test]
        fn invalid_name_whitespace_only() {
            assert_eq!("   \n".parse::<RepoName>(), Err(ParseError::Empty));
        }

        #[test]
        fn invalid_name_control_char() {
            assert_eq!(
                "my\u{7}repo".parse::<RepoName>(),
                Err(ParseError::InvalidCharacter('\u{7}'))
            );
        }

        #[test]
        fn name_display() {
            let name: RepoName = "mySVN".parse().unwrap();
            assert_eq!(format!("{}", name), "mySVN");
        }
    }

    mod revision_tests {
        use super::*;

        #[test]
        fn default_is_head() {
            assert_eq!(Revision::default(), Revision::Head);
        }

        #[test]
        fn from_raw_sentinel_is_head() {
            assert_eq!(Revision::from_raw(Revision::HEAD_SENTINEL), Revision::Head);
        }

        #[test]
        fn from_raw_any_negative_is_head() {
            assert_eq!(Revision::from_raw(-42), Revision::Head);
        }

        #[test]
        fn from_raw_zero_is_number() {
            assert_eq!(Revision::from_raw(0), Revision::Number(0));
        }

        #[test]
        fn parse_head_keyword() {
            assert_eq!("HEAD".parse::<Revision>(), Ok(Revision::Head));
            assert_eq!("head".parse::<Revision>(), Ok(Revision::Head));
        }

        #[test]
        fn parse_number() {
            assert_eq!("42".parse::<Revision>(), Ok(Revision::Number(42)));
        }

        #[test]
        fn parse_minus_one() {
            assert_eq!("-1".parse::<Revision>(), Ok(Revision::Head));
        }

        #[test]
        fn parse_garbage() {
            assert_eq!(
                "r42".parse::<Revision>(),
                Err(ParseError::InvalidRevision("r42".to_string()))
            );
        }

        #[test]
        fn parse_empty() {
            assert_eq!("".parse::<Revision>(), Err(ParseError::Empty));
        }

        #[test]
        fn display() {
            assert_eq!(Revision::Head.to_string(), "HEAD");
            assert_eq!(Revision::Number(7).to_string(), "7");
        }
    }

    mod node_kind_tests {
        use super::*;

        #[test]
        fn parse_svn_kinds() {
            assert_eq!("file".parse::<NodeKind>(), Ok(NodeKind::File));
            assert_eq!("dir".parse::<NodeKind>(), Ok(NodeKind::Directory));
            assert_eq!("none".parse::<NodeKind>(), Ok(NodeKind::None));
        }

        #[test]
        fn parse_unknown_kind() {
            assert_eq!(
                "symlink".parse::<NodeKind>(),
                Err(ParseError::UnknownKind("symlink".to_string()))
            );
        }

        #[test]
        fn display_round_trips_svn_spelling() {
            for kind in [NodeKind::File, NodeKind::Directory, NodeKind::None] {
                assert_eq!(kind.to_string().parse::<NodeKind>(), Ok(kind));
            }
        }
    }
}
