//! Daemon configuration: a TOML file for the stable surface, environment
//! variables for secrets and deployment overrides.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use gembot_core::GeminiConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Canned follow/unblock templates for one language. `{user_name}` is
/// interpolated with the resolved display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedMessages {
    pub follow: String,
    pub unblock: String,
}

/// LINE channel credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub channel_secret: String,
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub line: LineConfig,
    pub gemini: GeminiConfig,
    /// Cache service URL; the in-process store is used when unset.
    pub cache_url: Option<String>,
    /// Media above this many bytes is rejected without a model call.
    pub max_file_size: usize,
    /// Port the webhook server listens on.
    pub port: u16,
    /// Canned welcome messages keyed by language code. Languages not in the
    /// table get a model-generated welcome instead.
    pub canned_messages: HashMap<String, CannedMessages>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut canned_messages = HashMap::new();
        canned_messages.insert(
            "en".to_string(),
            CannedMessages {
                follow: "Hello {user_name}, thanks for adding me! Send me a message and I'll do my best to help.".to_string(),
                unblock: "Welcome back, {user_name}! Glad to see you again.".to_string(),
            },
        );
        canned_messages.insert(
            "ja".to_string(),
            CannedMessages {
                follow: "{user_name}さん、友だち追加ありがとうございます！メッセージを送ってください。".to_string(),
                unblock: "{user_name}さん、おかえりなさい！またお話しできてうれしいです。".to_string(),
            },
        );
        canned_messages.insert(
            "ko".to_string(),
            CannedMessages {
                follow: "{user_name}님, 친구 추가 감사합니다! 메시지를 보내 주세요.".to_string(),
                unblock: "{user_name}님, 다시 만나서 반가워요!".to_string(),
            },
        );

        Self {
            line: LineConfig::default(),
            gemini: GeminiConfig::default(),
            cache_url: None,
            max_file_size: 10 * 1024 * 1024,
            port: 5000,
            canned_messages,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a file if it exists, otherwise returns the
    /// default config
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Default config file location (`~/.config/gembot/config.toml`).
    pub fn default_config_file() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("gembot").join("config.toml"))
    }

    /// Apply environment overrides. Secrets are expected to come from the
    /// environment in deployment; the config file covers everything else.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("LINE_CHANNEL_ACCESS_TOKEN") {
            self.line.channel_access_token = token;
        }
        if let Ok(secret) = std::env::var("LINE_CHANNEL_SECRET") {
            self.line.channel_secret = secret;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.cache_url = Some(url);
        }
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!(port = %port, "Ignoring unparseable PORT override"),
            }
        }
    }
}
