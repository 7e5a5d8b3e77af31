use crate::demo::{run_calculate, run_demo, CalculateArgs, DemoArgs};
use crate::server;
use campusnet::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Campusnet Academic Records",
    about = "Run and demonstrate the Campusnet grade calculation service from the command line",
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
    /// Work with grade calculations against the bundled demo dataset
    Grades {
        #[command(subcommand)]
        command: GradesCommand,
    },
    /// Run an end-to-end CLI demo covering calculation, aggregation, and GPA
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum GradesCommand {
    /// Calculate a single enrollment's grade and print the breakdown
    Calculate(CalculateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Hydrate the in-memory document store with the demo dataset
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Grades {
            command: GradesCommand::Calculate(args),
        } => run_calculate(args),
        Command::Demo(args) => run_demo(args),
    }
}
