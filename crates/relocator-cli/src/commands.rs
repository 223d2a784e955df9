use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dir-relocator")]
#[command(about = "Move large directories to a backup volume and leave junctions behind", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List configured root pairs
    Roots,
    /// Add a root pair and make it active
    AddRoot(RootArgs),
    /// Change the active root pair
    EditRoot(RootEditArgs),
    /// Duplicate the active root pair under a new original path
    CopyRoot(RootEditArgs),
    /// Delete the active root pair
    DeleteRoot,
    /// Make a root pair active, by name or original path
    Select { root: String },
    /// List the directories under the active root, largest first
    Scan,
    /// Move a directory to the backup location and link it back
    Relocate(PathArgs),
    /// Bring a relocated directory back and remove its junction
    Restore(PathArgs),
    /// Delete the stray backup of a directory that is not relocated
    RemoveBackup {
        #[command(flatten)]
        target: PathArgs,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Hide a directory from listings
    Ignore(PathArgs),
    /// List the children of a directory in its place
    Skip(PathArgs),
    /// Clear an ignore or skip mark
    Unmark(PathArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct RootArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub original: PathBuf,
    #[arg(long)]
    pub backup: PathBuf,
}

#[derive(Debug, Args)]
pub struct RootEditArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub original: Option<PathBuf>,
    #[arg(long)]
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Directory below the active root; relative paths resolve against its original path
    pub path: PathBuf,
}
