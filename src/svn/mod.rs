//! Subversion access through the `svn` command-line client

mod cli;
mod connection;
mod xml;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::{SvnAuth, SvnCli, SvnError, peg_target};
pub use connection::{SvnConnection, SvnConnector};
pub use xml::{InfoEntry, ListEntry, parse_info, parse_list, parse_proplist};
