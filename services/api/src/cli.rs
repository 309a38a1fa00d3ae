use crate::server;
use crate::simulate::{run_evaluate, run_simulation, EvaluateArgs, SimulateArgs};
use clap::{Args, Parser, Subcommand};
use memory_navigator::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Memory Navigator",
    about = "Evaluate wearable telemetry for elder safety and run the ingestion service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP ingestion service (default command)
    Serve(ServeArgs),
    /// Evaluate a single telemetry reading against a profile and print the result
    Evaluate(EvaluateArgs),
    /// Generate scenario telemetry and print how the engine classifies it
    Simulate(SimulateArgs),
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
        Command::Evaluate(args) => run_evaluate(args),
        Command::Simulate(args) => run_simulation(args),
    }
}
