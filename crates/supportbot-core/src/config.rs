use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::ai::{ollama, openai};
use crate::provider::Provider;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub ollama_url: String,
    pub bind_address: String,
    pub port: u16,
    /// Where chat frontends reach the relay
    pub server_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some("openai".to_string()),
            model: None,
            openai_api_key: None,
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
            ollama_url: ollama::DEFAULT_BASE_URL.to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
            server_url: "http://127.0.0.1:3000".to_string(),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Read a config file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn provider_kind(&self) -> Result<Provider> {
        match self.provider.as_deref() {
            None => Ok(Provider::OpenAI),
            Some(name) => Provider::from_str(name)
                .ok_or_else(|| anyhow!("Unknown provider '{}' (expected openai or ollama)", name)),
        }
    }

    /// Configured model, or the provider's default
    pub fn model_for(&self, provider: Provider) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    /// `OPENAI_API_KEY` wins over the key stored in the file
    pub fn resolved_openai_key(&self) -> Option<String> {
        self.openai_key_with_env(std::env::var("OPENAI_API_KEY").ok())
    }

    /// Key precedence given an already-read environment value; blank counts as unset
    pub fn openai_key_with_env(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.openai_api_key.clone())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| anyhow!("Invalid bind address {}:{}: {}", self.bind_address, self.port, e))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("supportbot"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.provider_kind().unwrap(), Provider::OpenAI);
        assert_eq!(config.model_for(Provider::OpenAI), "gpt-4o");
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::new();
        config.provider = Some("ollama".to_string());
        config.model = Some("qwen2.5:7b".to_string());
        config.port = 8088;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.provider_kind().unwrap(), Provider::Ollama);
        assert_eq!(loaded.model_for(Provider::Ollama), "qwen2.5:7b");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "port": 4000 }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_addr().unwrap().port(), 4000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_environment_key_wins_over_file_key() {
        let mut config = Config::new();
        assert_eq!(config.openai_key_with_env(None), None);

        config.openai_api_key = Some("sk-file".to_string());
        assert_eq!(config.openai_key_with_env(None).as_deref(), Some("sk-file"));
        assert_eq!(config.openai_key_with_env(Some("  ".to_string())).as_deref(), Some("sk-file"));
        assert_eq!(
            config.openai_key_with_env(Some("sk-env".to_string())).as_deref(),
            Some("sk-env")
        );
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let mut config = Config::new();
        config.provider = Some("claude".to_string());
        assert!(config.provider_kind().is_err());
    }
}
