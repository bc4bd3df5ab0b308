use crate::demo::{run_catalog, run_demo, run_estimate, CatalogArgs, DemoArgs, EstimateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use study_quote::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Study Abroad Quote Engine",
    about = "Price study-abroad programs and serve the quote API",
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
    /// Price a single selection and print the breakdown
    Estimate(EstimateArgs),
    /// Walk through the quote wizard end to end and save the result
    Demo(DemoArgs),
    /// List the programs and their weekly rates
    Catalog(CatalogArgs),
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
        Command::Estimate(args) => run_estimate(args),
        Command::Demo(args) => run_demo(args).await,
        Command::Catalog(args) => run_catalog(args),
    }
}
