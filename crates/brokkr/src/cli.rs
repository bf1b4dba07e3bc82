//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Brokkr - project scaffolding from templates
#[derive(Parser, Debug)]
#[command(name = "brokkr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project from a template and publish it to GitHub
    New(NewProjectArgs),

    /// List projects created by brokkr
    List(ListProjectArgs),

    /// Open an existing project
    Open(OpenProjectArgs),
}

#[derive(Args, Debug)]
pub struct NewProjectArgs {
    /// Project (and GitHub repository) name
    pub name: String,

    /// One-line project description
    #[arg(short, long)]
    pub description: Option<String>,

    /// GitHub account owning the repository
    #[arg(short, long, env = "BROKKR_AUTHOR")]
    pub author: Option<String>,

    /// Create the GitHub repository as private
    #[arg(long)]
    pub private: bool,

    /// Template id inside the template archive
    #[arg(short, long, default_value = "basic")]
    pub template: String,

    /// Target directory (defaults to <project_dir>/<name>)
    #[arg(short, long)]
    pub path: Option<Utf8PathBuf>,

    /// Prompt for missing fields instead of using defaults
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Args, Debug)]
pub struct ListProjectArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OpenProjectArgs {
    /// Name of a registered project
    pub name: String,

    /// Open the GitHub repository in the browser instead
    #[arg(short, long)]
    pub browser: bool,
}
