use clap::{Parser, Subcommand};
use colored::*;
use std::process;
use tracing::debug;

mod cli;

use cli::server::ServerCommands;
use marmot_config::WorkingContext;

#[derive(Parser)]
#[command(name = "marmot")]
#[command(about = "Marmot - scaffold and run java webapps on embedded jetty")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage webapp servers
    #[command(subcommand)]
    Server(ServerCommands),
    /// Initialize the current directory as a marmot webapp
    Init {
        /// Delete WEB-INF and initialize again
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    marmot_cli::init_tracing();
    let cli = Cli::parse();

    match handle_command(cli.command).await {
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let context = WorkingContext::from_env()?;
    debug!("marmot {} in {:?}", marmot_cli::VERSION, context.cwd());

    match command {
        Commands::Server(server_cmd) => cli::server::handle_server_command(server_cmd, context).await,
        Commands::Init { force } => cli::init::handle_init(&context, force),
    }
}
