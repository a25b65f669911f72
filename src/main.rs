pub mod registry;
pub mod repository;
pub mod retrieve;
pub mod svn;
pub mod types;
pub mod update;

use std::error::Error;
use std::io::BufRead;

use clap::{Parser, Subcommand};

use crate::registry::{ConfigPaths, RegistryStore, RepositoryLocation};
use crate::retrieve::SvnRetriever;
use crate::svn::{SvnCli, SvnConnector};
use crate::types::Revision;
use crate::update::{Dispatcher, UpdateError, UpdateRequest};

#[derive(Parser)]
#[command(
    name = "svnup",
    about = "Fetch files and directories from named Subversion repositories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a repository path to the local filesystem
    Update {
        /// Registered repository name
        name: String,
        /// Path inside the repository (empty for the root)
        svn_path: String,
        /// Local file or directory to write to
        local_path: String,
        /// Revision number, or HEAD (negative numbers also mean HEAD)
        #[arg(short, long, default_value = "HEAD", allow_hyphen_values = true)]
        revision: Revision,
        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,
        /// Print the versioned properties of everything retrieved
        #[arg(long)]
        properties: bool,
    },

    /// Show whether a repository path is a file, a directory, or missing
    Kind {
        /// Registered repository name
        name: String,
        /// Path inside the repository
        svn_path: String,
        /// Revision number, or HEAD
        #[arg(short, long, default_value = "HEAD", allow_hyphen_values = true)]
        revision: Revision,
    },

    /// Register a repository under a name
    Register {
        name: String,
        /// Repository URL (svn://, svn+ssh://, http://, https:// or file://)
        url: String,
        #[arg(long)]
        username: Option<String>,
        /// Read the password from the first line of stdin
        #[arg(long)]
        password_stdin: bool,
    },

    /// Remove a registered repository
    Unregister { name: String },

    /// List registered repositories
    List,

    /// Check dependencies
    Doctor,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Update {
            name,
            svn_path,
            local_path,
            revision,
            recursive,
            properties,
        } => cmd_update(
            UpdateRequest::new(name, svn_path, local_path)
                .with_revision(revision)
                .recursive(recursive)
                .with_properties(properties),
        ),
        Commands::Kind {
            name,
            svn_path,
            revision,
        } => cmd_kind(&name, &svn_path, revision),
        Commands::Register {
            name,
            url,
            username,
            password_stdin,
        } => cmd_register(&name, &url, username, password_stdin),
        Commands::Unregister { name } => cmd_unregister(&name),
        Commands::List => cmd_list(),
        Commands::Doctor => cmd_doctor(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        if let Some(UpdateError::Connection { .. }) = e.downcast_ref::<UpdateError>() {
            eprintln!();
            eprintln!("Hint: Check registered repositories with: svnup list");
        }
        std::process::exit(1);
    }
}

fn dispatcher() -> Dispatcher<SvnConnector, SvnRetriever> {
    let store = RegistryStore::new(ConfigPaths::default());
    Dispatcher::new(SvnConnector::new(store), SvnRetriever)
}

fn cmd_update(request: UpdateRequest) -> Result<(), Box<dyn Error>> {
    let outcome = dispatcher().update(&request)?;
    if !outcome.is_success() {
        log::warn!("{} does not exist at {}", request.source(), request.revision);
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn cmd_kind(name: &str, svn_path: &str, revision: Revision) -> Result<(), Box<dyn Error>> {
    let kind = dispatcher().classify(name, svn_path, revision)?;
    println!("{}", kind);
    Ok(())
}

fn cmd_register(
    name: &str,
    url: &str,
    username: Option<String>,
    password_stdin: bool,
) -> Result<(), Box<dyn Error>> {
    let password = if password_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        (!line.is_empty()).then_some(line)
    } else {
        None
    };

    let location = RepositoryLocation::new(url)?.with_credentials(username, password);
    let store = RegistryStore::new(ConfigPaths::default());
    store.register(name, location)?;

    println!("Registered {} -> {}", name.trim(), url);
    Ok(())
}

fn cmd_unregister(name: &str) -> Result<(), Box<dyn Error>> {
    let store = RegistryStore::new(ConfigPaths::default());
    if store.unregister(name)? {
        println!("Unregistered {}", name);
    } else {
        println!("{} was not registered", name);
    }
    Ok(())
}

fn cmd_list() -> Result<(), Box<dyn Error>> {
    let registry = RegistryStore::new(ConfigPaths::default()).load()?;

    if registry.is_empty() {
        println!("No repositories registered");
        return Ok(());
    }

    println!("{:<24} {:<12} URL", "NAME", "USER");
    println!("{}", "-".repeat(80));

    for (name, location) in registry.iter() {
        println!(
            "{:<24} {:<12} {}",
            name,
            location.username.as_deref().unwrap_or("-"),
            location.url
        );
    }

    Ok(())
}

fn cmd_doctor() -> Result<(), Box<dyn Error>> {
    println!("svnup System Check\n");

    let version = SvnCli::new().version();
    let svn_ok = version.is_ok();
    println!(
        "[{}] svn: {}",
        if svn_ok { "OK" } else { "FAIL" },
        match &version {
            Ok(v) => v.clone(),
            Err(e) => format!("not usable ({})", e),
        }
    );

    let store = RegistryStore::new(ConfigPaths::default());
    let registry_file = store.paths().registry_file();
    let registry = store.load();
    let registry_ok = registry.is_ok();
    println!(
        "[{}] Registry: {} ({})",
        if registry_ok { "OK" } else { "FAIL" },
        registry_file.display(),
        match &registry {
            Ok(_) if !registry_file.exists() => "not created yet".to_string(),
            Ok(r) => format!("{} repositories", r.names().count()),
            Err(e) => e.to_string(),
        }
    );

    if !svn_ok || !registry_ok {
        std::process::exit(1);
    }

    Ok(())
}
