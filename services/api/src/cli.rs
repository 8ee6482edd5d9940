use crate::commands::{run_batch, run_evaluate, run_rule_sets, BatchArgs, EvaluateArgs};
use crate::server;
use agri_credit::config::AppConfig;
use agri_credit::error::AppError;
use agri_credit::telemetry;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "agri-credit",
    about = "Score smallholder farmer creditworthiness over HTTP or from the command line",
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
    /// Score one farmer and print the JSON payload
    Evaluate(EvaluateArgs),
    /// Score every farmer in a profile CSV export
    Batch(BatchArgs),
    /// List registered rule-set versions
    RuleSets,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Profile CSV export to seed the in-memory profile store with
    #[arg(long)]
    pub(crate) profiles: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            return Ok(());
        }
        // Argument errors share exit code 1 with scoring failures.
        Err(err) => return Err(AppError::Usage(err.to_string())),
    };
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args, &command_config()?),
        Command::Batch(args) => run_batch(args, &command_config()?),
        Command::RuleSets => run_rule_sets(),
    }
}

/// Configuration for one-shot commands, with logging installed so scoring and
/// persistence events are reported the same way as under `serve`.
fn command_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}
