use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:9702";
pub const CONFIG_DIR_ENV_VAR: &str = "TPLCTL_CONFIG_DIR";

/// User context stored in ~/.tplctl/config.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Config {
    /// Get the config directory path (~/.tplctl/ unless overridden)
    fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = env::var(CONFIG_DIR_ENV_VAR) {
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tplctl"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        Ok(Some(config))
    }

    /// Save config to the default location, returning the file written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create config directory: {}", dir.display())
                })?;
            }
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Delete the config file; returns false if there was none
    pub fn delete_at(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(path)
            .with_context(|| format!("Failed to delete config at {}", path.display()))?;

        Ok(true)
    }
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub timeout: Duration,
    pub username: Option<String>,
    pub token: Option<String>,
}

impl Settings {
    /// Merge flag/environment values (already folded together by clap) over
    /// the stored user context
    pub fn resolve(api_url: Option<String>, timeout_secs: u64, config: Option<Config>) -> Self {
        let config = config.unwrap_or_default();

        Self {
            api_url: api_url
                .filter(|url| !url.is_empty())
                .or(config.address)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            username: config.username,
            token: config.token,
        }
    }
}

/// Prompt user for username
pub fn prompt_username() -> Result<String> {
    eprint!("Enter your username: ");
    io::stderr().flush()?;

    let mut username = String::new();
    io::stdin()
        .read_line(&mut username)
        .context("Failed to read username")?;

    let username = username.trim().to_string();

    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }

    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use temp_dir::TempDir;

    #[test]
    fn test_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("nested").join("config.json");
        let config = Config {
            address: Some("https://templates.internal:9702".to_string()),
            username: Some("test-user".to_string()),
            token: None,
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, Some(config));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("token"));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load_from(&dir.child("config.json")).unwrap(), None);
    }

    #[test]
    fn test_load_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_delete_missing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("config.json");
        assert!(!Config::delete_at(&path).unwrap());

        Config::default().save_to(&path).unwrap();
        assert!(Config::delete_at(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_settings_flag_wins_over_config() {
        let config = Config {
            address: Some("http://stored:9702".to_string()),
            username: Some("dev".to_string()),
            token: Some("t".to_string()),
        };

        let settings = Settings::resolve(Some("http://flag:9702".to_string()), 5, Some(config));

        assert_eq!(settings.api_url, "http://flag:9702");
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.username.as_deref(), Some("dev"));
        assert_eq!(settings.token.as_deref(), Some("t"));
    }

    #[test]
    fn test_settings_fall_back_to_config_then_default() {
        let config = Config {
            address: Some("http://stored:9702".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Settings::resolve(None, 30, Some(config)).api_url,
            "http://stored:9702"
        );
        assert_eq!(Settings::resolve(None, 30, None).api_url, DEFAULT_API_URL);
    }
}
