//! Command-line interface.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recalld", about = "Vector cache database server", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server.
    Serve(ServeArgs),
    /// Manage the database catalog.
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Serve a database registered in the catalog.
    #[arg(long, conflicts_with_all = ["data_dir", "dims", "mode"])]
    pub db: Option<String>,

    /// Record directory for an ad-hoc database.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Vector dimension for an ad-hoc database.
    #[arg(long)]
    pub dims: Option<usize>,

    /// Similarity mode: L2NORM or COSINE.
    #[arg(long)]
    pub mode: Option<String>,

    /// Catalog file. Defaults to ~/.recall.json.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum DbCommand {
    /// Register a database in the catalog.
    Add {
        name: String,
        /// Vector dimension.
        #[arg(long)]
        dims: usize,
        /// Similarity mode: L2NORM or COSINE.
        #[arg(long)]
        mode: String,
        /// Record directory.
        #[arg(long)]
        uri: String,
        /// Catalog file. Defaults to ~/.recall.json.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Remove a database from the catalog.
    Remove {
        name: String,
        /// Catalog file. Defaults to ~/.recall.json.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List registered databases.
    List {
        /// Catalog file. Defaults to ~/.recall.json.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

/// The default catalog location: `~/.recall.json`.
pub fn default_catalog_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".recall.json")
}
