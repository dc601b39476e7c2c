use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_CONFIG_PATH: &str = "SE_TRIAGE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_MODEL: &str = "SE_TRIAGE_MODEL";
const ENV_PROVIDER_URL: &str = "SE_TRIAGE_PROVIDER_URL";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PROVIDER_URL: &str = "https://api.openai.com/v1";

/// Analysis provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Chat-completions model name
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_PROVIDER_URL.to_string(),
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub provider: ProviderFileSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFileSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    ///
    /// Environment variables take precedence over the YAML file.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        let model = std::env::var(ENV_MODEL)
            .ok()
            .or(file.provider.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = std::env::var(ENV_PROVIDER_URL)
            .ok()
            .or(file.provider.base_url)
            .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string());

        Self {
            provider: ProviderConfig { model, base_url },
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
