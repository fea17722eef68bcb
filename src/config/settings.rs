//! Tunables loaded from `config.toml`.
//!
//! Every section has defaults, so the file is optional. A file that exists but does
//! not parse is a hard error.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level structure of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Chat completion and image generation
    pub ai: AiConfig,
    /// Public trivia/joke/image APIs
    pub http: HttpConfig,
    /// Interactive component lifetimes
    pub games: GamesConfig,
    /// Machine translation
    pub translation: TranslationConfig,
    /// AI reply-chain reconstruction
    pub conversation: ConversationConfig,
    /// Disposable mailbox command
    pub mailbox: MailboxConfig,
}

/// `[ai]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// OpenAI-compatible base URL (without `/chat/completions`)
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Instruction sent as the first turn of every conversation
    pub system_prompt: String,
    /// Image generation endpoint, the prompt is appended as a path segment
    pub image_url: String,
    /// Deadline for a chat completion
    pub timeout_secs: u64,
    /// Deadline for an image generation
    pub image_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.aimlapi.com/v1".to_string(),
            model: "google/gemma-3n-e4b-it".to_string(),
            system_prompt: "[SYSTEM] Du bist ein hilfreicher Assistent namens CometAI (in Beta)."
                .to_string(),
            image_url: "https://image.pollinations.ai/prompt/".to_string(),
            timeout_secs: 60,
            image_timeout_secs: 120,
        }
    }
}

/// `[http]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Deadline for public API calls
    pub timeout_secs: u64,
    /// User agent sent with every outbound request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("comet/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// `[games]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GamesConfig {
    /// Idle time after which an online rock-paper-scissors round is cancelled
    pub rps_timeout_secs: u64,
    /// Idle time after which poll buttons stop accepting votes
    pub poll_timeout_secs: u64,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            rps_timeout_secs: 60,
            poll_timeout_secs: 180,
        }
    }
}

/// `[translation]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Translation endpoint (Google `translate_a/single` compatible)
    pub endpoint: String,
    /// How long DE/EN buttons stay active
    pub buttons_timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            buttons_timeout_secs: 300,
        }
    }
}

/// `[conversation]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Maximum number of ancestors visited when walking a reply chain
    pub max_depth: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { max_depth: 25 }
    }
}

/// `[mailbox]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// mail.tm compatible API base URL
    pub api_base: String,
    /// Seconds between inbox polls
    pub poll_interval_secs: u64,
    /// Total lifetime of a mailbox watch
    pub lifetime_secs: u64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.mail.tm".to_string(),
            poll_interval_secs: 10,
            lifetime_secs: 600,
        }
    }
}

impl AiConfig {
    /// Chat completion deadline
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Image generation deadline
    #[must_use]
    pub const fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads `./config.toml` when present, otherwise returns the defaults.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if path.exists() {
        tracing::debug!("Loading configuration from {:?}", path);
        load_config(path)
    } else {
        tracing::info!("No config.toml found, using built-in defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [ai]
            model = "some/other-model"
            timeout_secs = 30

            [games]
            rps_timeout_secs = 90
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.ai.model, "some/other-model");
        assert_eq!(config.ai.timeout(), Duration::from_secs(30));
        // untouched keys keep their defaults
        assert_eq!(config.ai.base_url, "https://api.aimlapi.com/v1");
        assert_eq!(config.games.rps_timeout_secs, 90);
        assert_eq!(config.games.poll_timeout_secs, 180);
        assert_eq!(config.conversation.max_depth, 25);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.mailbox.poll_interval_secs, 10);
        assert_eq!(config.http.timeout_secs, 10);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let result: std::result::Result<AppConfig, _> = toml::from_str("[ai]\ntimeout_secs = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.toml")).unwrap();
        assert_eq!(config.ai.image_timeout_secs, 120);
        assert_eq!(config.translation.buttons_timeout_secs, 300);
        assert_eq!(config.mailbox.lifetime_secs, 600);
    }
}
