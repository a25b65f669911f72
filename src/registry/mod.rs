//! Named repository registry

mod lock;
mod paths;
mod store;

pub use lock::RegistryLock;
pub use paths::{CONFIG_DIR_ENV, ConfigPaths};
pub use store::{Registry, RegistryError, RegistryStore, RepositoryLocation};
