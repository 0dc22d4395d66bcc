//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "deploy", version, about = "Build and publish a project to a remote FTP/FTPS/SFTP target")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build (if configured) and publish a profile's local build directory.
    Deploy(DeployArgs),
    /// Manage deployment profiles.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Inspect the deployment history journal.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Name of the profile to deploy.
    pub profile: String,

    /// Skip the build command even if one is configured.
    #[arg(long)]
    pub skip_build: bool,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Create or update a profile.
    Add(ProfileAddArgs),
    /// List all known profile names.
    List,
    /// Show a single profile's configuration (credentials are never printed).
    Show(ProfileNameArg),
    /// Delete a profile and its stored credential.
    Remove(ProfileNameArg),
}

#[derive(Debug, Args)]
pub struct ProfileNameArg {
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ProfileAddArgs {
    pub name: String,
    #[arg(long)]
    pub host: String,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long, value_enum)]
    pub protocol: ProtocolArg,
    #[arg(long)]
    pub username: String,
    /// Password/passphrase. If omitted, prompted for interactively.
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub remote_root: String,
    #[arg(long)]
    pub local_build_dir: String,
    #[arg(long)]
    pub build_command: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
    #[arg(long, default_value_t = 4)]
    pub pool_size: usize,
    #[arg(long, default_value_t = true)]
    pub app_offline: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProtocolArg {
    Ftp,
    Ftps,
    Sftp,
}

impl From<ProtocolArg> for deploy_core::Protocol {
    fn from(value: ProtocolArg) -> Self {
        match value {
            ProtocolArg::Ftp => deploy_core::Protocol::Ftp,
            ProtocolArg::Ftps => deploy_core::Protocol::Ftps,
            ProtocolArg::Sftp => deploy_core::Protocol::Sftp,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List recent deployment history entries.
    List(HistoryListArgs),
    /// Delete all history entries.
    Clear,
}

#[derive(Debug, Args)]
pub struct HistoryListArgs {
    /// Restrict to a single profile.
    #[arg(long)]
    pub profile: Option<String>,
    /// Maximum number of entries to show.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}
