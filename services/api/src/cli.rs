use crate::demo::{run_claim_text, run_claim_total, run_demo, ClaimTextArgs, ClaimTotalArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use claimdesk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "claimdesk",
    about = "Compute debt claims and run the claim intake service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute claim totals or draft claim statements from local files
    Claim {
        #[command(subcommand)]
        command: ClaimCommand,
    },
    /// Walk a sample intake end to end and print the resulting claim
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ClaimCommand {
    /// Itemize principal, interest and expenses for a bond record
    Total(ClaimTotalArgs),
    /// Draft the claim statement for a transaction export
    Text(ClaimTextArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Claim {
            command: ClaimCommand::Total(args),
        } => run_claim_total(args),
        Command::Claim {
            command: ClaimCommand::Text(args),
        } => run_claim_text(args),
        Command::Demo(args) => run_demo(args),
    }
}
