//! Configuration loading, validation, and management for Parley.
//!
//! Loads configuration from `~/.parley/config.toml` with environment
//! variable overrides. Validates all settings at startup; the result is
//! treated as immutable for the rest of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.parley/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Completion model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Log verbosity (`trace`, `debug`, `info`, `warn`, `error`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Assistant persona and history settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Weather skill settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Voice front-end settings
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    150
}
fn default_log_level() -> String {
    "info".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("log_level", &self.log_level)
            .field("assistant", &self.assistant)
            .field("weather", &self.weather)
            .field("voice", &self.voice)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Display name, also used in the completion system prompt
    #[serde(default = "default_assistant_name")]
    pub name: String,

    /// Maximum number of messages kept in the conversation log
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// How many trailing log entries are sent with each completion
    #[serde(default = "default_context_messages")]
    pub context_messages: usize,
}

fn default_assistant_name() -> String {
    "Assistant".into()
}
fn default_history_limit() -> usize {
    20
}
fn default_context_messages() -> usize {
    10
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            history_limit: default_history_limit(),
            context_messages: default_context_messages(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. Absent = weather skill replies "not configured".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

fn default_weather_endpoint() -> String {
    "http://api.openweathermap.org/data/2.5/weather".into()
}
fn default_weather_timeout() -> u64 {
    5
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_weather_endpoint(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Speaking rate in words per minute
    #[serde(default = "default_voice_rate")]
    pub rate: u32,

    /// Output volume, 0.0 to 1.0
    #[serde(default = "default_voice_volume")]
    pub volume: f32,

    /// Seconds to wait for speech to start
    #[serde(default = "default_voice_timeout")]
    pub timeout_secs: u64,

    /// Maximum phrase length in seconds
    #[serde(default = "default_voice_phrase_limit")]
    pub phrase_limit_secs: u64,

    /// Seconds of silence that end a phrase
    #[serde(default = "default_pause_threshold")]
    pub pause_threshold_secs: f32,

    /// Speech-to-text command (argv). Placeholders: `{timeout}`,
    /// `{phrase_limit}`, `{pause_threshold}`. Absent = voice input disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_command: Option<Vec<String>>,

    /// Text-to-speech command (argv). Placeholders: `{text}`, `{rate}`,
    /// `{volume}` (0.0-1.0), `{amplitude}` (0-200). Absent = platform default (`say` on macOS, `espeak` elsewhere).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak_command: Option<Vec<String>>,
}

fn default_voice_rate() -> u32 {
    200
}
fn default_voice_volume() -> f32 {
    0.8
}
fn default_voice_timeout() -> u64 {
    15
}
fn default_voice_phrase_limit() -> u64 {
    15
}
fn default_pause_threshold() -> f32 {
    1.0
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            rate: default_voice_rate(),
            volume: default_voice_volume(),
            timeout_secs: default_voice_timeout(),
            phrase_limit_secs: default_voice_phrase_limit(),
            pause_threshold_secs: default_pause_threshold(),
            listen_command: None,
            speak_command: None,
        }
    }
}

impl VoiceConfig {
    /// The speak command to use: configured, or the platform default.
    pub fn effective_speak_command(&self) -> Vec<String> {
        if let Some(cmd) = &self.speak_command {
            return cmd.clone();
        }
        if cfg!(target_os = "macos") {
            vec!["say".into(), "-r".into(), "{rate}".into(), "{text}".into()]
        } else {
            vec![
                "espeak".into(),
                "-s".into(),
                "{rate}".into(),
                "-a".into(),
                "{amplitude}".into(),
                "{text}".into(),
            ]
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.parley/config.toml),
    /// then apply environment variable overrides.
    ///
    /// Recognized variables:
    /// - `PARLEY_API_KEY` / `OPENAI_API_KEY`: completion credential
    /// - `PARLEY_PROVIDER`, `PARLEY_MODEL`
    /// - `WEATHER_API_KEY`, `ASSISTANT_NAME`, `LOG_LEVEL`, `DEBUG`
    /// - `ASSISTANT_VOICE_RATE`, `ASSISTANT_VOICE_VOLUME`
    /// - `VOICE_TIMEOUT`, `VOICE_PHRASE_LIMIT`, `VOICE_PAUSE_THRESHOLD`
    ///
    /// A `.env` file in the working directory supplies any of these that the
    /// process environment does not set.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        let dotenv = read_dotenv(Path::new(".env"));
        config.apply_env(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()));
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// Environment values win over the file. Numeric values that fail to
    /// parse are logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("PARLEY_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(provider) = lookup("PARLEY_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("PARLEY_MODEL") {
            self.default_model = model;
        }
        if let Some(key) = lookup("WEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Some(name) = lookup("ASSISTANT_NAME") {
            self.assistant.name = name;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if lookup("DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            self.log_level = "debug".into();
        }

        override_parsed(&lookup, "ASSISTANT_VOICE_RATE", &mut self.voice.rate);
        override_parsed(&lookup, "ASSISTANT_VOICE_VOLUME", &mut self.voice.volume);
        override_parsed(&lookup, "VOICE_TIMEOUT", &mut self.voice.timeout_secs);
        override_parsed(&lookup, "VOICE_PHRASE_LIMIT", &mut self.voice.phrase_limit_secs);
        override_parsed(&lookup, "VOICE_PAUSE_THRESHOLD", &mut self.voice.pause_threshold_secs);
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".parley")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.voice.volume) {
            return Err(ConfigError::ValidationError(
                "voice.volume must be between 0.0 and 1.0".into(),
            ));
        }

        if self.assistant.history_limit < 2 {
            return Err(ConfigError::ValidationError(
                "assistant.history_limit must hold at least one exchange (>= 2)".into(),
            ));
        }

        if self.assistant.context_messages == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.context_messages must be > 0".into(),
            ));
        }

        if self.weather.timeout_secs == 0
            || self.voice.timeout_secs == 0
            || self.voice.phrase_limit_secs == 0
        {
            return Err(ConfigError::ValidationError(
                "timeouts must be > 0 seconds".into(),
            ));
        }

        Ok(())
    }

    /// Check if a completion API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// The model to request: the default provider's `default_model` when
    /// set, otherwise the global `default_model`.
    pub fn effective_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.as_deref())
            .unwrap_or(&self.default_model)
    }

    /// Fail unless the completion credential is present.
    pub fn require_api_key(&self) -> Result<(), ConfigError> {
        // Local backends accept any key.
        if self.has_api_key() || self.default_provider == "ollama" {
            Ok(())
        } else {
            Err(ConfigError::MissingCredential("OPENAI_API_KEY".into()))
        }
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            log_level: default_log_level(),
            assistant: AssistantConfig::default(),
            weather: WeatherConfig::default(),
            voice: VoiceConfig::default(),
            providers: HashMap::new(),
        }
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(key, value = %raw, "Ignoring unparseable environment override"),
    }
}

/// Get the user's home directory.
/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment. A missing file yields nothing; bad lines are skipped.
pub fn read_dotenv(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring unreadable .env file: {e}");
            return HashMap::new();
        }
    };

    iter.filter_map(|item| match item {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Skipping malformed .env line: {e}");
            None
        }
    })
    .collect()
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("{0} is required. Set it in the environment or in config.toml")]
    MissingCredential(String),
}
