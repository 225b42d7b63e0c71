use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::Mood;

const DEFAULT_DATA_FILE: &str = "data/mood_links.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where links are saved. Relative paths resolve against the working directory.
    pub data_file: PathBuf,
    /// Look up page titles when adding links.
    pub fetch_titles: bool,
    pub fetch_timeout_secs: u64,
    /// Mood shown at startup.
    pub default_mood: Mood,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            fetch_titles: true,
            fetch_timeout_secs: 4,
            default_mood: Mood::Happy,
        }
    }
}

impl Config {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("moodplayer")
        .join("config.toml")
}

/// Reads the config file. A missing or invalid file yields the defaults.
pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(e) => {
            log::warn!("cannot read {}: {}", path.display(), e);
            Config::default()
        }
    }
}

fn parse_config(content: &str) -> Config {
    toml::from_str(content).unwrap_or_else(|e| {
        log::warn!("invalid config, using defaults: {}", e);
        Config::default()
    })
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = parse_config("default_mood = \"chill\"\n");
        assert_eq!(cfg.default_mood, Mood::Chill);
        assert_eq!(cfg.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert!(cfg.fetch_titles);
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let cfg = parse_config("default_mood = \"sad\"\n");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_config_round_trip() {
        let cfg = Config {
            data_file: PathBuf::from("/tmp/links.txt"),
            fetch_titles: false,
            fetch_timeout_secs: 2,
            default_mood: Mood::Mixed,
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(parse_config(&text), cfg);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let cfg = Config {
            fetch_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(1));
    }
}
