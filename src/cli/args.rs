//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use boxcutter::config::DEFAULT_CONFIG_NAME;

/// Headless live HTML previews
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: boxcutter.toml)
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONFIG_NAME, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Drive a preview from a JSON step script and print its traffic
    #[command(visible_alias = "r")]
    Replay {
        /// Step script (JSON array)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        steps: PathBuf,
    },

    /// Preview an HTML file, re-syncing on every save
    #[command(visible_alias = "w")]
    Watch {
        /// HTML file to preview
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Source id (default: the file path)
        #[arg(long)]
        id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from(["boxcutter", "-v", "replay", "steps.json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("boxcutter.toml"));
        assert!(matches!(cli.command, Commands::Replay { ref steps } if steps == &PathBuf::from("steps.json")));
    }

    #[test]
    fn test_parse_watch_with_config() {
        let cli =
            Cli::try_parse_from(["boxcutter", "w", "page.html", "--id", "home", "-C", "x.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        match cli.command {
            Commands::Watch { file, id } => {
                assert_eq!(file, PathBuf::from("page.html"));
                assert_eq!(id.as_deref(), Some("home"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
