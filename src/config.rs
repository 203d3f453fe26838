//! Command line flags, the optional JSON config file, and the settings the
//! program actually runs with.
//!
//! Precedence is flag, then config file, then built-in default. Boolean
//! switches can only be turned on from either place.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::connect::{RetryPolicy, DEFAULT_WAIT};
use crate::error::{RelayError, Result};
use crate::relay::{RelayConfig, DEFAULT_DELAY};

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "midi-note-delay")]
#[command(version, about = "Relay MIDI notes to a virtual port, delaying note-off")]
pub struct Cli {
    /// List all the connected MIDI devices
    #[arg(short, long)]
    pub list: bool,

    /// The input MIDI device name
    #[arg(short, long)]
    pub input: Option<String>,

    /// The virtual output MIDI device name. Defaults to [INPUT]-delayed
    #[arg(short, long)]
    pub output: Option<String>,

    /// How long in ms to delay the midi noteoff signal [default: 100]
    #[arg(short, long, value_name = "MS")]
    pub delay: Option<u64>,

    /// How long in ms to wait between each connection attempt to the midi input.
    /// 0 exits on the first failed attempt [default: 1000]
    #[arg(short, long, value_name = "MS")]
    pub wait: Option<u64>,

    /// Ignore a noteon that arrives while a delayed noteoff for the same note is still pending
    #[arg(long, visible_alias = "db")]
    pub debounce: bool,

    /// Log MIDI messages to the screen
    #[arg(short, long)]
    pub verbose: bool,

    /// Read defaults from a JSON config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Contents of the JSON config file. Every field is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<String>,
    pub output: Option<String>,
    pub delay_ms: Option<u64>,
    pub wait_ms: Option<u64>,
    #[serde(default)]
    pub debounce: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| RelayError::Config { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| RelayError::ConfigParse { path: path.to_path_buf(), source })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input: String,
    pub output: String,
    pub delay: Duration,
    pub wait: Duration,
    pub debounce: bool,
    pub verbose: bool,
}

impl Settings {
    /// Merge flags over the config file (if any) over defaults.
    pub fn resolve(cli: &Cli, file: Option<&FileConfig>) -> Result<Self> {
        let file = file.cloned().unwrap_or_default();
        let input = cli.input.clone().or(file.input).ok_or(RelayError::MissingInput)?;
        let output = cli
            .output
            .clone()
            .or(file.output)
            .unwrap_or_else(|| format!("{}-delayed", input));
        let delay = cli.delay.or(file.delay_ms).map(Duration::from_millis).unwrap_or(DEFAULT_DELAY);
        let wait = cli.wait.or(file.wait_ms).map(Duration::from_millis).unwrap_or(DEFAULT_WAIT);
        Ok(Self {
            input,
            output,
            delay,
            wait,
            debounce: cli.debounce || file.debounce,
            verbose: cli.verbose || file.verbose,
        })
    }

    /// Load the config file named on the command line, then resolve.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = cli.config.as_deref().map(FileConfig::load).transpose()?;
        Self::resolve(cli, file.as_ref())
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig { delay: self.delay, debounce: self.debounce }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.wait)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("midi-note-delay").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_apply_when_only_input_given() {
        let settings = Settings::resolve(&parse(&["-i", "Piano"]), None).unwrap();
        assert_eq!(
            settings,
            Settings {
                input: "Piano".into(),
                output: "Piano-delayed".into(),
                delay: Duration::from_millis(100),
                wait: Duration::from_millis(1000),
                debounce: false,
                verbose: false,
            }
        );
    }

    #[test]
    fn long_flags_and_debounce_alias() {
        let cli = parse(&["--input", "Keys", "--output", "Out", "--delay", "250", "--wait", "0", "--db", "--verbose"]);
        let settings = Settings::resolve(&cli, None).unwrap();
        assert_eq!(settings.output, "Out");
        assert_eq!(settings.delay, Duration::from_millis(250));
        assert_eq!(settings.wait, Duration::ZERO);
        assert!(settings.debounce);
        assert!(settings.verbose);
        assert_eq!(settings.retry_policy(), RetryPolicy::fixed(Duration::ZERO));
        assert_eq!(settings.relay_config(), RelayConfig { delay: Duration::from_millis(250), debounce: true });
    }

    #[test]
    fn missing_input_is_an_error() {
        let err = Settings::resolve(&parse(&["--delay", "5"]), None).unwrap_err();
        assert!(matches!(err, RelayError::MissingInput));
        assert_eq!(err.to_string(), "Please provide a midi input name with -i or --input");
    }

    #[test]
    fn list_needs_no_input() {
        let cli = parse(&["--list"]);
        assert!(cli.list);
        assert!(cli.input.is_none());
    }

    #[test]
    fn flags_override_config_file() {
        let file = FileConfig {
            input: Some("FromFile".into()),
            output: Some("FileOut".into()),
            delay_ms: Some(40),
            wait_ms: Some(500),
            debounce: true,
            verbose: false,
        };
        let settings = Settings::resolve(&parse(&["-i", "FromFlag", "-d", "80"]), Some(&file)).unwrap();
        assert_eq!(settings.input, "FromFlag");
        assert_eq!(settings.output, "FileOut");
        assert_eq!(settings.delay, Duration::from_millis(80));
        assert_eq!(settings.wait, Duration::from_millis(500));
        assert!(settings.debounce);
    }

    #[test]
    fn loads_config_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "input": "nanoKEY2", "delay_ms": 30 }}"#).unwrap();
        let cli = Cli { config: Some(file.path().to_path_buf()), ..Cli::default() };
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.input, "nanoKEY2");
        assert_eq!(settings.output, "nanoKEY2-delayed");
        assert_eq!(settings.delay, Duration::from_millis(30));
    }

    #[test]
    fn rejects_unknown_config_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "input": "x", "transpose": 3 }}"#).unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, RelayError::ConfigParse { .. }));
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = FileConfig::load(Path::new("/nonexistent/midi-note-delay.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/midi-note-delay.json"));
    }
}
