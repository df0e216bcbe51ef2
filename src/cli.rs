use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Team task and time tracker.
/// Storage defaults to ~/.taskflow/taskflow.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tf", version, about = "Team task, timer and workload CLI")]
pub struct Cli {
    /// Path to the JSON database file. config.json is read from the same directory.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Act as this user id instead of the configured one.
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Display name for --actor.
    #[arg(long, global = true, requires = "actor")]
    pub actor_name: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recur_count_is_bounded() {
        let ok = Cli::try_parse_from(["tf", "recur", "Standup", "--every", "daily", "--count", "30"]);
        assert!(ok.is_ok());
        for count in ["0", "1001", "4000000000"] {
            let res = Cli::try_parse_from(["tf", "recur", "Standup", "--every", "daily", "--count", count]);
            assert!(res.is_err(), "--count {count} should be rejected");
        }
    }
}
