//! Project subcommands (new, list, open)

mod list;
mod new;
mod open;

use anyhow::Result;

use crate::cli::ProjectCommands;

pub async fn run(cmd: ProjectCommands) -> Result<()> {
    match cmd {
        ProjectCommands::New(args) => new::run(args).await,
        ProjectCommands::List(args) => list::run(args),
        ProjectCommands::Open(args) => open::run(args).await,
    }
}
