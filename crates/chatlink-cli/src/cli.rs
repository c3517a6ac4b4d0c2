//! CLI argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "chatlink",
    version,
    about = "Terminal client for a persistent chatlink session",
    long_about = "Logs in to the chat backend (reusing a stored credential when it is still valid),\n\
                  opens the realtime session and prints every inbound frame until interrupted.\n\n\
                  Configuration is read from --config (TOML, YAML or JSON) and CHATLINK_* environment\n\
                  variables, e.g. CHATLINK_API__BASE_URL or CHATLINK_SESSION__HEARTBEAT_INTERVAL_MS."
)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', env = "CHATLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for received frames
    #[arg(long, short = 'f', value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// How received frames are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored one-line summaries
    Human,
    /// One JSON document per line
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::parse_from(["chatlink", "-vv", "-c", "chat.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("chat.toml")));
        assert_eq!(cli.format, OutputFormat::Human);
    }

    #[test]
    fn test_json_format() {
        let cli = Cli::parse_from(["chatlink", "--format", "json", "--no-color"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.no_color);
    }
}
