//! Engine configuration
//!
//! Stored as JSON in ~/.config/swiftmend/config.json. Everything has a
//! sensible default, so the engine runs with no config file at all.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_max_attempts() -> u32 {
    5
}

fn default_ios_target() -> String {
    "16.0".to_string()
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_call_timeout_secs() -> u64 {
    90
}

fn default_reset_timeout_secs() -> u64 {
    60
}

/// Circuit breaker tuning for the LLM strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            call_timeout_secs: default_call_timeout_secs(),
            reset_timeout_secs: default_reset_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recovery attempts allowed per error fingerprint before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_fingerprint: u32,
    /// Where the learned-fix knowledge base lives. Defaults to the config
    /// directory next to this file.
    #[serde(default)]
    pub knowledge_path: Option<PathBuf>,
    /// iOS version the generated apps target.
    #[serde(default = "default_ios_target")]
    pub ios_target: String,
    #[serde(default)]
    pub breaker: BreakerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts_per_fingerprint: default_max_attempts(),
            knowledge_path: None,
            ios_target: default_ios_target(),
            breaker: BreakerConfig::default(),
        }
    }
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("swiftmend"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return defaults. A corrupt file is backed
    /// up and replaced with defaults rather than aborting the run.
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        let backup = path.with_extension("json.corrupt");
                        let _ = fs::write(&backup, &content);
                        eprintln!(
                            "  Warning: Config file was corrupted ({}). A backup was saved and defaults were loaded.",
                            err
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        fs::create_dir_all(&dir)?;
        let path = dir.join("config.json");
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Resolved knowledge base path.
    pub fn knowledge_path(&self) -> PathBuf {
        self.knowledge_path.clone().unwrap_or_else(|| {
            Self::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("knowledge.json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_attempts_per_fingerprint, 5);
        assert_eq!(config.ios_target, "16.0");
        assert_eq!(config.breaker.failure_threshold, 3);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str("{\"ios_target\": \"17.0\"}").unwrap();
        assert_eq!(config.ios_target, "17.0");
        assert_eq!(config.max_attempts_per_fingerprint, 5);
        assert_eq!(config.breaker.reset_timeout_secs, 60);
    }

    #[test]
    fn test_explicit_knowledge_path_wins() {
        let config = Config {
            knowledge_path: Some(PathBuf::from("/tmp/kb.json")),
            ..Default::default()
        };
        assert_eq!(config.knowledge_path(), PathBuf::from("/tmp/kb.json"));
    }
}
