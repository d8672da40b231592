//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::playback::DEFAULT_SCREEN_SIZE;

/// Environment override for the pause between emulated phrases
pub const PHRASE_DELAY_ENV: &str = "VOICECODER_PHRASE_DELAY_MS";

const DEFAULT_PHRASE_DELAY_MS: u64 = 250;

/// Environment override for the dry-run screen size, as `WIDTHxHEIGHT`
pub const SCREEN_SIZE_ENV: &str = "VOICECODER_SCREEN_SIZE";

/// Voice command daemon
#[derive(Debug, Parser)]
#[command(name = "voicecoder", version, about)]
pub struct Cli {
    /// Path to the definitions file
    pub definitions: PathBuf,

    /// Phrases to run through the compiled grammars instead of live input,
    /// e.g. "change mode program" "dot"
    pub phrases: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Definitions file, reread on every reload
    pub definitions_path: PathBuf,

    /// Phrases to emulate; empty means read phrases from stdin
    pub phrases: Vec<String>,

    /// Pause after each emulated phrase
    pub phrase_delay: Duration,

    /// Screen the dry-run sink reports to `mouse_grid`
    pub screen_size: (i32, i32),

    pub verbose: bool,
}

impl Config {
    /// Load configuration from parsed arguments and the environment
    pub fn load(cli: Cli) -> Result<Self> {
        let delay_ms = match std::env::var(PHRASE_DELAY_ENV) {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of milliseconds", PHRASE_DELAY_ENV))?,
            Err(_) => DEFAULT_PHRASE_DELAY_MS,
        };

        let screen_size = match std::env::var(SCREEN_SIZE_ENV) {
            Ok(value) => parse_screen_size(&value)
                .with_context(|| format!("{} must look like 1920x1080", SCREEN_SIZE_ENV))?,
            Err(_) => DEFAULT_SCREEN_SIZE,
        };

        Ok(Self {
            definitions_path: cli.definitions,
            phrases: cli.phrases,
            phrase_delay: Duration::from_millis(delay_ms),
            screen_size,
            verbose: cli.verbose,
        })
    }

    /// Whether phrases come from the command line rather than live input
    pub fn is_emulated(&self) -> bool {
        !self.phrases.is_empty()
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// `WIDTHxHEIGHT`, both positive
fn parse_screen_size(value: &str) -> Result<(i32, i32)> {
    let Some((width, height)) = value.trim().split_once(['x', 'X']) else {
        bail!("missing `x` separator in `{}`", value);
    };
    let width: i32 = width.trim().parse()?;
    let height: i32 = height.trim().parse()?;
    if width <= 0 || height <= 0 {
        bail!("screen size `{}` must be positive", value);
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["voicecoder", "defs.json", "change mode program", "dot"])
            .unwrap();
        assert_eq!(cli.definitions, PathBuf::from("defs.json"));
        assert_eq!(cli.phrases, vec!["change mode program", "dot"]);
        assert!(!cli.verbose);

        let cli = Cli::try_parse_from(["voicecoder", "-v", "defs.json"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.phrases.is_empty());
    }

    #[test]
    fn test_definitions_path_required() {
        assert!(Cli::try_parse_from(["voicecoder"]).is_err());
    }

    #[test]
    fn test_parse_screen_size() {
        assert_eq!(parse_screen_size("2560x1440").unwrap(), (2560, 1440));
        assert_eq!(parse_screen_size(" 800 X 600 ").unwrap(), (800, 600));
        assert!(parse_screen_size("1920").is_err());
        assert!(parse_screen_size("0x1080").is_err());
        assert!(parse_screen_size("wide x tall").is_err());
    }

    #[test]
    fn test_config_load() {
        let cli = Cli::try_parse_from(["voicecoder", "--verbose", "defs.json", "dot"]).unwrap();
        let config = Config::load(cli).unwrap();
        assert!(config.is_emulated());
        assert_eq!(config.log_filter(), "debug");
        if std::env::var(PHRASE_DELAY_ENV).is_err() {
            assert_eq!(config.phrase_delay, Duration::from_millis(250));
        }
        if std::env::var(SCREEN_SIZE_ENV).is_err() {
            assert_eq!(config.screen_size, DEFAULT_SCREEN_SIZE);
        }
    }
}
