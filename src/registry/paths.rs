//! Config directory path management
//!
//! ```text
//! ~/.config/svnup/
//! ├── repositories.json   # name -> url/credentials
//! └── repositories.lock   # flock-based locking for writers
//! ```

use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "SVNUP_CONFIG_DIR";

/// Manages all filesystem paths for the config directory layout
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    root: PathBuf,
}

impl ConfigPaths {
    /// Creates a new ConfigPaths with the specified root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root config directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the registry file path: `{root}/repositories.json`
    pub fn registry_file(&self) -> PathBuf {
        self.root.join("repositories.json")
    }

    /// Returns the lock file path: `{root}/repositories.lock`
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("repositories.lock")
    }
}

impl Default for ConfigPaths {
    /// Uses `$SVNUP_CONFIG_DIR` when set, otherwise the system config
    /// directory + "svnup".
    ///
    /// `dirs::config_dir()` resolves to:
    /// - Linux: `~/.config`
    /// - macOS: `~/Library/Application Support`
    /// - Windows: `C:\Users\<user>\AppData\Roaming`
    fn default() -> Self {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Self::new(dir);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        Self::new(config_dir.join("svnup"))
    }
}
