use crate::demo::{run_appraisal, run_demo, AppraiseArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use vehicle_valuation::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Vehicle Valuation",
    about = "Price used vehicles from the command line or over HTTP",
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
    /// Value a single vehicle and print the breakdown
    Appraise(AppraiseArgs),
    /// Walk through a fully described and a sparsely described appraisal
    Demo,
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
        Command::Appraise(args) => run_appraisal(args),
        Command::Demo => run_demo(),
    }
}
