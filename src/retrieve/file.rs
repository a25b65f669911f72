use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::RetrieveError;
use crate::svn::SvnConnection;
use crate::types::Revision;
use crate::update::{PropertyNode, UpdateOutcome};

const PART_SUFFIX: &str = ".svnup-part";

pub(super) fn retrieve(
    connection: &SvnConnection,
    source: &str,
    destination: &Path,
    revision: Revision,
    include_properties: bool,
) -> Result<UpdateOutcome, RetrieveError> {
    let target = resolve_destination(source, destination)?;
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    download(connection, source, revision, &target)?;
    log::debug!("wrote {}", target.display());

    if include_properties {
        let properties = connection.properties(source, revision)?;
        Ok(UpdateOutcome::Properties(PropertyNode::File(properties)))
    } else {
        Ok(UpdateOutcome::Done(true))
    }
}

/// Download `source` into `target` through a uniquely named sibling part
/// file.
///
/// `target` is only replaced once the whole file has been written. The part
/// file is removed when the download fails.
pub(super) fn download(
    connection: &SvnConnection,
    source: &str,
    revision: Revision,
    target: &Path,
) -> Result<(), RetrieveError> {
    let part = part_file(target)?;
    connection.download(source, revision, part.reopen()?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(part.path(), fs::Permissions::from_mode(0o644))?;
    }

    part.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// An existing directory destination receives the file under its own name.
fn resolve_destination(source: &str, destination: &Path) -> io::Result<PathBuf> {
    if !destination.is_dir() {
        return Ok(destination.to_path_buf());
    }
    let name = Path::new(source.trim_end_matches('/'))
        .file_name()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot derive a file name from '{}'", source),
            )
        })?;
    Ok(destination.join(name))
}

/// `.<name>.<random>.svnup-part` next to `target`.
fn part_file(target: &Path) -> io::Result<NamedTempFile> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut prefix = OsString::from(".");
    prefix.push(target.file_name().unwrap_or_default());
    prefix.push(".");

    tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(PART_SUFFIX)
        .tempfile_in(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Connector;
    use crate::svn::SvnConnector;
    use crate::svn::testing::{local_repository, require_svn, store_with};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn file_destination_is_used_as_is() {
        let temp = tempdir().unwrap();
        let dest = temp.path().join("copy.txt");
        assert_eq!(resolve_destination("temp/a.txt", &dest).unwrap(), dest);
    }

    #[test]
    fn directory_destination_gets_source_basename() {
        let temp = tempdir().unwrap();
        assert_eq!(
            resolve_destination("temp/a.txt", temp.path()).unwrap(),
            temp.path().join("a.txt")
        );
    }

    #[test]
    fn directory_destination_without_basename_fails() {
        let temp = tempdir().unwrap();
        let err = resolve_destination("", temp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    fn leftover_parts(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().ends_with(PART_SUFFIX))
            .collect()
    }

    #[test]
    fn part_files_for_one_target_are_distinct() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("a.txt");

        let first = part_file(&target).unwrap();
        let second = part_file(&target).unwrap();

        assert_ne!(first.path(), second.path());
        for part in [&first, &second] {
            assert_eq!(part.path().parent(), Some(temp.path()));
            let name = part.path().file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with(".a.txt."), "{name}");
            assert!(name.ends_with(PART_SUFFIX), "{name}");
        }
        assert_eq!(leftover_parts(temp.path()).len(), 2);

        drop(first);
        drop(second);
        assert!(leftover_parts(temp.path()).is_empty());
        assert!(!target.exists());
    }

    #[test]
    fn retrieves_file_and_properties() {
        if !require_svn() {
            return;
        }
        let temp = tempdir().unwrap();
        let url = local_repository(temp.path());
        let connector = SvnConnector::new(store_with(temp.path(), "local", &url));
        let conn = connector.open(&"local".parse().unwrap()).unwrap();

        let out = temp.path().join("out").join("nested").join("a.txt");
        let outcome = retrieve(&conn, "temp/a.txt", &out, Revision::Head, true).unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("owner".to_string(), "ops".to_string());
        assert_eq!(outcome, UpdateOutcome::Properties(PropertyNode::File(expected)));
        assert_eq!(fs::read_to_string(&out).unwrap(), "a\n");
        assert!(leftover_parts(out.parent().unwrap()).is_empty());
    }

    #[test]
    fn older_revision_has_no_properties() {
        if !require_svn() {
            return;
        }
        let temp = tempdir().unwrap();
        let url = local_repository(temp.path());
        let connector = SvnConnector::new(store_with(temp.path(), "local", &url));
        let conn = connector.open(&"local".parse().unwrap()).unwrap();

        let outcome = retrieve(&conn, "temp/a.txt", temp.path(), Revision::Number(1), true).unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::Properties(PropertyNode::File(BTreeMap::new()))
        );
        assert_eq!(
            fs::read_to_string(temp.path().join("a.txt")).unwrap(),
            "a\n"
        );
    }

    #[test]
    fn failed_download_leaves_no_part_file() {
        if !require_svn() {
            return;
        }
        let temp = tempdir().unwrap();
        let url = local_repository(temp.path());
        let connector = SvnConnector::new(store_with(temp.path(), "local", &url));
        let conn = connector.open(&"local".parse().unwrap()).unwrap();

        let out = temp.path().join("missing.txt");
        let err = download(&conn, "missing.txt", Revision::Head, &out).unwrap_err();

        assert!(matches!(err, RetrieveError::Repository(_)));
        assert!(!out.exists());
        assert!(leftover_parts(temp.path()).is_empty());
    }
}
