use crate::report::{
    run_audit, run_duration, run_leaderboard, run_validate, AuditArgs, DurationArgs,
    LeaderboardArgs, ValidateArgs,
};
use crate::server;
use callqa::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "callqa",
    about = "Score recorded sales calls, audit signal aggregation and validate scores against outcomes",
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
    /// Print the score-to-outcome correlation report for a dataset snapshot
    Validate(ValidateArgs),
    /// Rank agents with enough calls by overall quality score
    Leaderboard(LeaderboardArgs),
    /// Print signal aggregation consistency for assessed calls
    Audit(AuditArgs),
    /// Print the call duration summary, distribution and agent rankings
    Duration(DurationArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON dataset snapshot to serve (overrides CALLQA_DATASET)
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Validate(args) => run_validate(args),
        Command::Leaderboard(args) => run_leaderboard(args),
        Command::Audit(args) => run_audit(args),
        Command::Duration(args) => run_duration(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["callqa"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn duration_accepts_a_call_export() {
        let cli = Cli::try_parse_from(["callqa", "duration", "--calls-csv", "calls.csv"])
            .expect("parse");
        match cli.command {
            Some(Command::Duration(args)) => {
                assert_eq!(args.calls_csv, Some(PathBuf::from("calls.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn leaderboard_takes_a_minimum_call_count() {
        let cli = Cli::try_parse_from([
            "callqa",
            "leaderboard",
            "--min-calls",
            "3",
            "--timeframe",
            "all",
        ])
        .expect("parse");
        match cli.command {
            Some(Command::Leaderboard(args)) => {
                assert_eq!(args.min_calls, Some(3));
                assert_eq!(args.window.timeframe, Some(callqa::analytics::Timeframe::All));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_unknown_precision() {
        let result = Cli::try_parse_from(["callqa", "validate", "--precision", "fuzzy"]);
        assert!(result.is_err());
    }
}
