use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chreg")]
#[command(about = "Content handler registry", long_about = None)]
pub struct Cli {
    /// Configuration file (overrides CHREG_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// List every registered handler
    List,
    /// Search handlers by field value
    Find(FindArgs),
    /// Show handlers whose ids conflict with an id
    Conflicts(ConflictsArgs),
    /// Register a handler from a JSON or TOML file
    Register(RegisterArgs),
    /// Unregister a handler
    Unregister(UnregisterArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to (overrides server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    /// Field name or index (types, suffixes, actions, id)
    pub field: String,
    pub value: String,
    /// Caller application id used for access filtering
    #[arg(long, default_value = "")]
    pub caller: String,
}

#[derive(clap::Args, Debug)]
pub struct ConflictsArgs {
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct RegisterArgs {
    /// Handler definition; `.toml` files are read as TOML, anything else as JSON
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct UnregisterArgs {
    pub id: String,
}
