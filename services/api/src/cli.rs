use crate::demo::{run_demo, run_lookup, DemoArgs, LookupArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housing_lookup::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Housing Lookup",
    about = "Serve the city/institution catalog and exercise the debounced lookup fields",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP catalog service (default command)
    Serve(ServeArgs),
    /// Replay keystrokes through a lookup field backed by a running catalog service
    Lookup(LookupArgs),
    /// Walk a listing draft through city and institution lookups against the built-in catalog
    Demo(DemoArgs),
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
        Command::Lookup(args) => run_lookup(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
