//! Command-line interface for railvox
//!
//! Provides argument parsing using clap derive macros.

use crate::vox::key::VoxKey;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Railway announcements from pre-recorded clips
#[derive(Parser, Debug)]
#[command(
    name = "railvox",
    version,
    about = "Railway announcements from pre-recorded clips"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: session progress, -vv: every clip)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Files describing one announcement
#[derive(Args, Debug, Clone)]
pub struct PhraseArgs {
    /// Resolved phrase tree (JSON)
    #[arg(long, short = 'p', value_name = "FILE")]
    pub phrase: PathBuf,

    /// Slot values for the phrase (TOML or JSON)
    #[arg(long, short = 's', value_name = "FILE")]
    pub state: Option<PathBuf>,
}

/// Overrides for the configured speech settings
#[derive(Args, Debug, Clone, Default)]
pub struct SpeechArgs {
    /// Base URL or directory of the clips
    #[arg(long, value_name = "PATH")]
    pub vox_path: Option<String>,

    /// Impulse response file for reverb (empty disables)
    #[arg(long, value_name = "FILE")]
    pub reverb: Option<String>,

    /// Chime played before the announcement (empty disables)
    #[arg(long, value_name = "FILE")]
    pub chime: Option<String>,

    /// Volume, 0.0 to 1.9
    #[arg(long, value_name = "VOLUME")]
    pub volume: Option<f64>,

    /// Playback rate, 0.1 to 1.9
    #[arg(long, value_name = "RATE")]
    pub rate: Option<f64>,

    /// Audio output device
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Record to a WAV file instead of playing
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a phrase into vox keys and print them
    Resolve {
        #[command(flatten)]
        phrase: PhraseArgs,

        /// Print the keys as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a phrase and speak it
    Speak {
        #[command(flatten)]
        phrase: PhraseArgs,

        #[command(flatten)]
        speech: SpeechArgs,
    },

    /// Speak a list of vox keys (clip ids, or numbers for silence)
    Say {
        /// Keys to speak, e.g. 0.2 station.CRE.mid
        #[arg(required = true, value_name = "KEY", allow_negative_numbers = true)]
        keys: Vec<VoxKey>,

        #[command(flatten)]
        speech: SpeechArgs,
    },

    /// List available audio output devices
    Devices,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus environment overrides)
    Show,
    /// Print the configuration file path
    Path,
    /// Dump the default configuration as TOML
    Dump,
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
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["railvox"]).is_err());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["railvox", "-vv", "devices"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "railvox", "resolve", "--phrase", "p.json", "--state", "s.toml", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve { phrase, json } => {
                assert_eq!(phrase.phrase, PathBuf::from("p.json"));
                assert_eq!(phrase.state, Some(PathBuf::from("s.toml")));
                assert!(json);
            }
            _ => panic!("Expected Resolve command"),
        }
    }

    #[test]
    fn test_resolve_requires_phrase() {
        assert!(Cli::try_parse_from(["railvox", "resolve"]).is_err());
    }

    #[test]
    fn test_parse_speak_with_overrides() {
        let cli = Cli::try_parse_from([
            "railvox",
            "speak",
            "-p",
            "p.json",
            "--reverb",
            "ir.wav",
            "--volume",
            "1.5",
            "--rate",
            "0.8",
            "-o",
            "out.wav",
        ])
        .unwrap();
        match cli.command {
            Commands::Speak { phrase, speech } => {
                assert_eq!(phrase.state, None);
                assert_eq!(speech.reverb.as_deref(), Some("ir.wav"));
                assert_eq!(speech.volume, Some(1.5));
                assert_eq!(speech.rate, Some(0.8));
                assert_eq!(speech.output, Some(PathBuf::from("out.wav")));
                assert!(speech.chime.is_none());
            }
            _ => panic!("Expected Speak command"),
        }
    }

    #[test]
    fn test_parse_say_keys() {
        let cli =
            Cli::try_parse_from(["railvox", "say", "0.2", "station.CRE.mid", "0.65"]).unwrap();
        match cli.command {
            Commands::Say { keys, .. } => {
                assert_eq!(keys, crate::vox![0.2, "station.CRE.mid", 0.65]);
            }
            _ => panic!("Expected Say command"),
        }
    }

    #[test]
    fn test_say_rejects_negative_silence() {
        assert!(Cli::try_parse_from(["railvox", "say", "-1"]).is_err());
    }

    #[test]
    fn test_say_requires_keys() {
        assert!(Cli::try_parse_from(["railvox", "say"]).is_err());
    }

    #[test]
    fn test_parse_config_actions() {
        for (arg, expected) in [("show", "Show"), ("path", "Path"), ("dump", "Dump")] {
            let cli = Cli::try_parse_from(["railvox", "config", arg]).unwrap();
            match cli.command {
                Commands::Config { action } => assert_eq!(format!("{:?}", action), expected),
                _ => panic!("Expected Config command"),
            }
        }
    }

    #[test]
    fn test_global_options_after_command() {
        let cli =
            Cli::try_parse_from(["railvox", "devices", "--config", "/etc/railvox.toml", "-q"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/railvox.toml")));
        assert!(cli.quiet);
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["railvox", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
