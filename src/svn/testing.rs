//! Fixtures for tests that drive a real `svn` client.

use std::path::Path;
use std::process::Command;

use crate::registry::{ConfigPaths, RegistryStore, RepositoryLocation};

fn svn_tests_enabled() -> bool {
    match std::env::var("SVNUP_RUN_SVN_TESTS") {
        Ok(value) => {
            let value = value.to_ascii_lowercase();
            value == "1" || value == "true" || value == "yes"
        }
        Err(_) => false,
    }
}

pub(crate) fn require_svn() -> bool {
    if svn_tests_enabled() {
        true
    } else {
        eprintln!("skipping svn test (set SVNUP_RUN_SVN_TESTS=1)");
        false
    }
}

fn run(cmd: &mut Command) {
    let status = cmd.status().unwrap();
    assert!(status.success(), "{:?} failed", cmd);
}

/// Create a `file://` repository under `root`.
///
/// r1 imports `readme.txt`, `temp/a.txt` and `temp/sub/b.txt`.
/// r2 sets `owner=ops` on `temp/a.txt`.
pub(crate) fn local_repository(root: &Path) -> String {
    let repo = root.join("repo");
    run(Command::new("svnadmin").arg("create").arg(&repo));

    let import = root.join("import");
    std::fs::create_dir_all(import.join("temp").join("sub")).unwrap();
    std::fs::write(import.join("readme.txt"), "hello\n").unwrap();
    std::fs::write(import.join("temp").join("a.txt"), "a\n").unwrap();
    std::fs::write(import.join("temp").join("sub").join("b.txt"), "b\n").unwrap();

    let url = format!("file://{}", repo.display());
    run(Command::new("svn")
        .args(["import", "--non-interactive", "-m", "initial"])
        .arg(&import)
        .arg(&url));

    let wc = root.join("wc");
    run(Command::new("svn")
        .args(["checkout", "--non-interactive", "--quiet"])
        .arg(&url)
        .arg(&wc));
    run(Command::new("svn")
        .args(["propset", "--quiet", "owner", "ops"])
        .arg(wc.join("temp").join("a.txt")));
    run(Command::new("svn")
        .args(["commit", "--non-interactive", "--quiet", "-m", "props"])
        .arg(&wc));

    url
}

/// A registry under `root/config` holding `name -> url`.
pub(crate) fn store_with(root: &Path, name: &str, url: &str) -> RegistryStore {
    let store = RegistryStore::new(ConfigPaths::new(root.join("config")));
    store
        .register(name, RepositoryLocation::new(url).unwrap())
        .unwrap();
    store
}
