use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{RetrieveError, child_path, file};
use crate::svn::{SvnConnection, SvnError};
use crate::types::{NodeKind, Revision};
use crate::update::{PropertyNode, UpdateOutcome};

pub(super) fn retrieve(
    connection: &SvnConnection,
    source: &str,
    destination: &Path,
    revision: Revision,
    recursive: bool,
    include_properties: bool,
) -> Result<UpdateOutcome, RetrieveError> {
    let mut files = 0usize;
    let tree = copy_tree(
        connection,
        source,
        destination,
        revision,
        recursive,
        include_properties,
        &mut files,
    )?;
    log::info!("retrieved {} file(s) into {}", files, destination.display());

    if include_properties {
        Ok(UpdateOutcome::Properties(tree))
    } else {
        Ok(UpdateOutcome::Done(true))
    }
}

fn copy_tree(
    connection: &SvnConnection,
    source: &str,
    destination: &Path,
    revision: Revision,
    recursive: bool,
    include_properties: bool,
    files: &mut usize,
) -> Result<PropertyNode, RetrieveError> {
    fs::create_dir_all(destination)?;

    let mut children = BTreeMap::new();
    for entry in connection.list(source, revision)? {
        validate_entry_name(&entry.name)?;
        let path = child_path(source, &entry.name);
        let local = destination.join(&entry.name);

        match entry.kind {
            NodeKind::File => {
                file::download(connection, &path, revision, &local)?;
                *files += 1;
                let properties = if include_properties {
                    connection.properties(&path, revision)?
                } else {
                    BTreeMap::new()
                };
                children.insert(entry.name, PropertyNode::File(properties));
            }
            NodeKind::Directory if recursive => {
                let node = copy_tree(
                    connection,
                    &path,
                    &local,
                    revision,
                    recursive,
                    include_properties,
                    files,
                )?;
                children.insert(entry.name, node);
            }
            NodeKind::Directory => log::debug!("skipping directory {}", path),
            NodeKind::None => log::warn!("skipping entry {} of unknown kind", path),
        }
    }
    Ok(PropertyNode::Directory(children))
}

/// Reject entry names that would escape the destination directory.
fn validate_entry_name(name: &str) -> Result<(), SvnError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if unsafe_name {
        return Err(SvnError::Parse(format!("unsafe entry name {:?}", name)));
    }
    Ok(())
}
