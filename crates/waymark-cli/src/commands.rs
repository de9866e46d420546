//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use waymark::LogFormat;

/// Waymark: validate and replay resilient navigation chains
#[derive(Parser, Debug)]
#[command(name = "waymark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format (defaults to the config file's `log_format`)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Color output (auto, always, never)
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default tracing directive for the verbosity level
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a chain script
    Check(CheckArgs),

    /// Replay chains against a scripted application model
    Replay(ReplayArgs),
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Chain script (YAML)
    pub script: PathBuf,
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Chain script (YAML)
    pub script: PathBuf,

    /// Scripted application model (YAML)
    #[arg(long)]
    pub app: PathBuf,

    /// Replay only this chain
    #[arg(long)]
    pub chain: Option<String>,

    /// Print results as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Waymark configuration file (YAML)
    #[arg(long, env = "WAYMARK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log format argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Color choice argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorArg {
    /// Resolve against the terminal
    #[must_use]
    pub fn use_color(self) -> bool {
        match self {
            Self::Auto => console::colors_enabled_stderr(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "waymark", "-vv", "replay", "s.yaml", "--app", "a.yaml", "--chain", "login", "--json",
        ])
        .unwrap();
        assert_eq!(cli.log_directive(), "trace");
        match cli.command {
            Commands::Replay(args) => {
                assert_eq!(args.script, PathBuf::from("s.yaml"));
                assert_eq!(args.app, PathBuf::from("a.yaml"));
                assert_eq!(args.chain.as_deref(), Some("login"));
                assert!(args.json);
            }
            Commands::Check(_) => panic!("expected replay"),
        }
    }

    #[test]
    fn test_replay_requires_app() {
        assert!(Cli::try_parse_from(["waymark", "replay", "s.yaml"]).is_err());
    }

    #[test]
    fn test_global_log_format_after_subcommand() {
        let cli = Cli::try_parse_from(["waymark", "check", "s.yaml", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format.map(LogFormat::from), Some(LogFormat::Json));
        assert_eq!(cli.log_directive(), "info");
    }

    #[test]
    fn test_verbosity_directives() {
        let quiet = Cli::try_parse_from(["waymark", "check", "s.yaml"]).unwrap();
        assert_eq!(quiet.log_directive(), "info");
        let verbose = Cli::try_parse_from(["waymark", "-v", "check", "s.yaml"]).unwrap();
        assert_eq!(verbose.log_directive(), "debug");
    }

    #[test]
    fn test_color_choice() {
        assert!(ColorArg::Always.use_color());
        assert!(!ColorArg::Never.use_color());
    }
}
