//! Player configuration — loads optional ~/.textly/config.yaml.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dsl::{CompileOptions, OptimizeOptions};
use crate::vm::RunOptions;

const DEFAULT_DELAY_MS: u64 = 100;
const DEFAULT_BEAT_MS: u64 = 1000;

/// Settings shared by every subcommand. CLI flags override these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Pause after each typed character, in milliseconds.
    #[serde(default = "default_delay", deserialize_with = "millis")]
    pub delay: u64,
    /// Length of one `{.}` beat, in milliseconds.
    #[serde(default = "default_beat", deserialize_with = "millis")]
    pub beat: u64,
    #[serde(default)]
    pub optimize: bool,
    /// Pre-apply deletions. Implies `optimize`.
    #[serde(default)]
    pub flatten: bool,
    /// One word per line.
    #[serde(default)]
    pub list: bool,
}

fn default_delay() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_beat() -> u64 {
    DEFAULT_BEAT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY_MS,
            beat: DEFAULT_BEAT_MS,
            optimize: false,
            flatten: false,
            list: false,
        }
    }
}

impl Config {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            delay: Duration::from_millis(self.delay),
            beat: Duration::from_millis(self.beat),
            list: self.list,
        }
    }

    pub fn compile_options(&self) -> CompileOptions {
        let optimize = (self.optimize || self.flatten).then_some(OptimizeOptions {
            flatten: self.flatten,
        });
        CompileOptions { optimize }
    }
}

/// Default path for the config file.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".textly");
    path.push("config.yaml");
    path
}

/// Load a config from a YAML file. Returns defaults if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Config, io::Error> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Parse `250ms`, `1.5s`, `2s` or a bare millisecond count.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if let Some(ms) = text.strip_suffix("ms") {
        return ms
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| format!("invalid duration {text:?}: {e}"));
    }
    if let Some(secs) = text.strip_suffix('s') {
        let secs: f64 = secs
            .trim()
            .parse()
            .map_err(|e| format!("invalid duration {text:?}: {e}"))?;
        return Duration::try_from_secs_f64(secs)
            .map_err(|e| format!("invalid duration {text:?}: {e}"));
    }
    text.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("invalid duration {text:?}: {e}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMillis {
    Count(u64),
    Text(String),
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match RawMillis::deserialize(deserializer)? {
        RawMillis::Count(ms) => Ok(ms),
        RawMillis::Text(text) => parse_duration(&text)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .map_err(serde::de::Error::custom),
    }
}
