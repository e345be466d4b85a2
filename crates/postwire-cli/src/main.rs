//! postwire-cli: browse and moderate a blog from the terminal.
//! Each invocation is one page-level caller of the postwire client.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;


use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_client_from_cli};
use handlers::{comments, diagnostics, images, posts};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let client = build_client_from_cli(&cli)?;

    match cli.command {
        Commands::Posts(cmd) => posts::handle(&client, cmd.action).await?,
        Commands::Images(cmd) => images::handle(&client, cmd.action).await?,
        Commands::Comments(cmd) => comments::handle(&client, cmd.action).await?,
        Commands::Diagnostics => diagnostics::handle(&client).await?,
    }

    Ok(())
}
