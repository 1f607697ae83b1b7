use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
const CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "edumate.log";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for OpenRouter; falls back to `OPENROUTER_API_KEY`
    pub api_key: Option<String>,

    /// Base URL of the completion service
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Sent as `HTTP-Referer`
    pub referer: String,

    /// Sent as `X-Title`
    pub app_title: String,

    pub request_timeout_secs: u64,

    /// Holds the log file and the default config file
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Config {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            referer: "http://localhost".to_string(),
            app_title: "EduMate Study Assistant".to_string(),
            request_timeout_secs: 30,
            data_dir: home.join(".edumate"),
        }
    }
}

impl Config {
    /// Default location of the config file (`~/.edumate/config.toml`)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".edumate").join(CONFIG_FILE))
    }

    /// Load configuration from an explicit file, or from the default location.
    ///
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file {} does not exist", path.display());
                }
                Self::load_from(path)
            }
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Write a default config file unless one already exists.
    /// Returns whether a file was written.
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Config::default().save(path)?;
        Ok(true)
    }

    /// Check if API key is configured
    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_some()
    }

    /// Get API key from config or environment
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Key suitable for display: first and last four characters only
    pub fn masked_api_key(&self) -> Option<String> {
        self.get_api_key().map(|key| mask_key(&key))
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = self
            .masked_api_key()
            .unwrap_or_else(|| format!("<not set, export {API_KEY_ENV}>"));
        writeln!(f, "api_key              = {key}")?;
        writeln!(f, "base_url             = {}", self.base_url)?;
        writeln!(f, "model                = {}", self.model)?;
        writeln!(f, "temperature          = {}", self.temperature)?;
        writeln!(f, "max_tokens           = {}", self.max_tokens)?;
        writeln!(f, "referer              = {}", self.referer)?;
        writeln!(f, "app_title            = {}", self.app_title)?;
        writeln!(f, "request_timeout_secs = {}", self.request_timeout_secs)?;
        write!(f, "data_dir             = {}", self.data_dir.display())
    }
}
