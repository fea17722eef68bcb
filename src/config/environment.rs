//! Secrets and process settings read from environment variables.
//!
//! Nothing in here is ever written to `config.toml`; tokens and keys come from the
//! environment (or a `.env` file loaded by `dotenvy` in `main`).

use crate::errors::{Error, Result};

/// Values taken from the process environment at start-up.
#[derive(Clone)]
pub struct Environment {
    /// Discord bot token
    pub discord_token: String,
    /// API key for the chat completion provider, AI commands apologise without it
    pub ai_api_key: Option<String>,
    /// Port of the status/restart endpoint
    pub web_port: Option<u16>,
    /// Bearer token guarding the status/restart endpoint
    pub owner_api_key: Option<String>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("discord_token", &"<redacted>")
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("web_port", &self.web_port)
            .field("owner_api_key", &self.owner_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Environment {
    /// Reads all variables from the process environment.
    ///
    /// `DISCORD_TOKEN` is preferred, `DISCORD_BOT_TOKEN` is accepted as a fallback.
    ///
    /// # Errors
    /// Fails when no bot token is set or `WEB_PORT` is not a valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the environment from an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let discord_token = non_empty("DISCORD_TOKEN")
            .or_else(|| non_empty("DISCORD_BOT_TOKEN"))
            .ok_or_else(|| Error::Config {
                message: "DISCORD_TOKEN is not set".to_string(),
            })?;

        let web_port = non_empty("WEB_PORT")
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|e| Error::Config {
                    message: format!("WEB_PORT '{raw}' is not a valid port: {e}"),
                })
            })
            .transpose()?;

        Ok(Self {
            discord_token,
            ai_api_key: non_empty("AI_API_KEY"),
            web_port,
            owner_api_key: non_empty("OWNER_API_KEY"),
        })
    }

    /// The status endpoint only runs when both a port and an owner key are configured.
    #[must_use]
    pub fn web_endpoint(&self) -> Option<(u16, &str)> {
        match (self.web_port, self.owner_api_key.as_deref()) {
            (Some(port), Some(key)) => Some((port, key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_token_fallback() {
        let env = Environment::from_lookup(lookup(&[("DISCORD_BOT_TOKEN", "abc")])).unwrap();
        assert_eq!(env.discord_token, "abc");
        assert!(env.ai_api_key.is_none());
        assert!(env.web_endpoint().is_none());
    }

    #[test]
    fn test_missing_token_is_error() {
        let result = Environment::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_web_endpoint_needs_port_and_key() {
        let env = Environment::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("WEB_PORT", "8080"),
        ]))
        .unwrap();
        assert!(env.web_endpoint().is_none());

        let env = Environment::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("WEB_PORT", "8080"),
            ("OWNER_API_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(env.web_endpoint(), Some((8080, "secret")));
    }

    #[test]
    fn test_bad_port_is_error() {
        let result = Environment::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("WEB_PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
