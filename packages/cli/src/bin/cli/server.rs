use clap::{Args, Subcommand};
use colored::*;
use marmot_cli::output;
use marmot_config::WorkingContext;
use marmot_server::{ServerArgs, ServerError};

/// `-p`, `-i` and `-n` are taken as text and validated by the server crate,
/// so a bad value is reported the same way from every entry point.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectorArgs {
    /// Port of the webapp
    #[arg(short, long)]
    port: Option<String>,
    /// Registry id of the webapp
    #[arg(short, long)]
    id: Option<String>,
    /// Name of the webapp
    #[arg(short, long)]
    name: Option<String>,
}

impl From<SelectorArgs> for ServerArgs {
    fn from(args: SelectorArgs) -> Self {
        ServerArgs {
            port: args.port,
            id: args.id,
            name: args.name,
        }
    }
}

#[derive(Subcommand)]
pub enum ServerCommands {
    /// Start the webapp in the current directory
    Start(SelectorArgs),
    /// Stop webapps (the current directory's when no option is given)
    Stop(SelectorArgs),
    /// Restart a webapp in its own directory
    Restart(SelectorArgs),
    /// Stop and unregister webapps
    #[command(alias = "rm")]
    Remove(SelectorArgs),
    /// List registered webapps
    #[command(alias = "ls")]
    List,
}

pub async fn handle_server_command(
    command: ServerCommands,
    context: WorkingContext,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = marmot_server::init(context);

    match command {
        ServerCommands::Start(args) => {
            let outcome = manager.start(&args.into()).await?;
            println!("{}", output::started(&outcome));
        }
        ServerCommands::Stop(args) => {
            let outcome = manager.stop(&args.into()).await?;
            println!("{}", output::stopped(&outcome));
        }
        ServerCommands::Restart(args) => {
            let outcome = manager.restart(&args.into()).await?;
            if !outcome.stopped.stopped().is_empty() {
                println!("{}", output::stopped(&outcome.stopped));
            }
            println!("{}", output::started(&outcome.started));
        }
        ServerCommands::Remove(args) => match manager.remove(&args.into()).await {
            Ok(outcome) => println!("{}", output::removed(&outcome)),
            Err(ServerError::MissingSelector) => {
                println!(
                    "{}",
                    output::notice(
                        "You must specify the '-p [port]', '-i [id]' or '-n [name]' when deleting the webapp"
                    )
                );
            }
            Err(e) => return Err(e.into()),
        },
        ServerCommands::List => {
            let records = manager.list().await?;
            if records.is_empty() {
                println!("{}", "No webapps registered".yellow());
                println!("{}", "Use 'marmot server start' in a webapp directory".dimmed());
            } else {
                println!("{}", output::records_table(&records));
            }
        }
    }

    Ok(())
}

