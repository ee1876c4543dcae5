use crate::styles::StyleKey;
use anyhow::{anyhow, Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Named providers with a well-known endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
    OpenRouter,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAI, Provider::Anthropic, Provider::OpenRouter];

    pub fn key(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
            Provider::OpenRouter => "openrouter",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Anthropic => "Anthropic (Claude)",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    /// Default API root for the provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub current_style: StyleKey,
    /// Explicit wire protocol, overriding endpoint sniffing.
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("current_style", &self.current_style)
            .field("protocol", &self.protocol)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from file and environment variables, or create default
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        RuntimeOverrides::from_env().apply(&mut config);
        Ok(config)
    }

    /// Load only what the config file holds, without environment overrides.
    pub fn load_file() -> Result<Self> {
        let path = Self::get_config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Environment variables override the config file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        RuntimeOverrides::from_lookup(lookup).apply(self);
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".pmpt-cli"))
    }

    pub fn config_file_exists() -> bool {
        Self::get_config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Switch to a named provider, clearing any custom URL.
    pub fn use_provider(&mut self, provider: Provider) {
        self.provider = Some(provider);
        self.base_url = None;
    }

    /// Switch to a custom endpoint, clearing the named provider.
    pub fn use_base_url(&mut self, base_url: String) {
        self.provider = None;
        self.base_url = Some(base_url);
    }

    /// Effective base URL, if one can be determined.
    pub fn get_base_url(&self) -> Option<&str> {
        match self.provider {
            Some(provider) => Some(provider.default_base_url()),
            None => self.base_url.as_deref().filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// True when there is an endpoint, a key and a model to call.
    pub fn is_configured(&self) -> bool {
        let filled = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        self.get_base_url().is_some() && filled(&self.api_key) && filled(&self.model)
    }

    pub fn show_config_info() -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());

        let config = Self::load()?;
        if config_path.exists() {
            println!("Status: Found");
        } else {
            println!("Status: Not found (using defaults)");
        }

        match config.provider {
            Some(provider) => println!("Provider: {}", provider),
            None => println!("Provider: Custom"),
        }
        println!("Base URL: {}", config.get_base_url().unwrap_or("Not set"));
        println!("API Key: {}", if config.api_key.is_some() { "Set" } else { "Not set" });
        println!("Model: {}", config.model.as_deref().unwrap_or("Not set"));
        println!("Style: {}", config.current_style.style().name);

        println!("\nTo run setup:");
        println!("  pmpt --setup");
        println!("\nOr set environment variables:");
        println!("  export PMPT_API_KEY=<your-key>");
        println!("  export PMPT_MODEL=<model-name>");

        Ok(())
    }
}

/// Settings that apply to this process only and are never written to the
/// config file: environment variables and command-line flags.
#[derive(Clone, Default, PartialEq)]
pub struct RuntimeOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub style: Option<StyleKey>,
}

impl RuntimeOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup("PMPT_API_KEY"),
            model: lookup("PMPT_MODEL"),
            base_url: lookup("PMPT_BASE_URL"),
            style: None,
        }
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.use_base_url(base_url.clone());
        }
        if let Some(style) = self.style {
            config.current_style = style;
        }
    }
}

impl fmt::Debug for RuntimeOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeOverrides")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("style", &self.style)
            .finish()
    }
}

/// Supplies a fresh configuration snapshot for each enhancement call.
pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> Config;
}

impl ConfigSource for Config {
    fn snapshot(&self) -> Config {
        self.clone()
    }
}

#[derive(Debug, Default)]
struct Layers {
    file: Config,
    overrides: RuntimeOverrides,
}

/// Configuration shared between the session and the enhancer.
///
/// Keeps what belongs in the config file apart from the runtime overrides.
/// The session mutates the file layer (setup, style changes) and saves only
/// that; the enhancer reads both layers merged, once per call.
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Layers>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self::with_overrides(config, RuntimeOverrides::default())
    }

    pub fn with_overrides(file: Config, overrides: RuntimeOverrides) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Layers { file, overrides })),
        }
    }

    /// Changes the file layer.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard.file);
    }

    pub fn update_overrides<F>(&self, f: F)
    where
        F: FnOnce(&mut RuntimeOverrides),
    {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard.overrides);
    }

    /// The file layer alone, as it should be saved.
    pub fn persisted(&self) -> Config {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).file.clone()
    }
}

impl ConfigSource for SharedConfig {
    fn snapshot(&self) -> Config {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut config = guard.file.clone();
        guard.overrides.apply(&mut config);
        config
    }
}
