use crate::demo::{run_demo, run_portfolio_report, DemoArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use neo_portfolio::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Neo Portfolio Service",
    about = "Serve and inspect the real-estate portfolio dashboard core from the command line",
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
    /// Print portfolio metrics and reports for the stored dataset
    Report(ReportArgs),
    /// Run an end-to-end CLI demo over the built-in seed portfolio
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
        Command::Report(args) => run_portfolio_report(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
