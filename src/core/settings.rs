//! Per-server settings and default seeding for new servers and members.

use crate::{
    core::{layout, store},
    errors::{Error, Result},
};
use sea_orm::ConnectionTrait;
use serde_json::Value;
use std::fmt;

/// Response language of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// German, the language all texts are written in
    #[default]
    De,
    /// English, produced by machine translation
    En,
}

impl Language {
    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
        }
    }

    /// Parses an ISO code, case-insensitively.
    pub fn parse(code: &str) -> Result<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            other => Err(Error::NotFound {
                what: format!("Sprache '{other}'"),
            }),
        }
    }

    /// The other language
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::De => Self::En,
            Self::En => Self::De,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Preferred language of a server, German when unset or unknown.
pub async fn language<C>(db: &C, guild: u64) -> Result<Language>
where
    C: ConnectionTrait,
{
    let stored = store::get_string(db, &format!("{}/language", layout::settings(guild))).await?;
    Ok(stored
        .and_then(|code| Language::parse(&code).ok())
        .unwrap_or_default())
}

/// Stores the preferred language of a server.
pub async fn set_language<C>(db: &C, guild: u64, language: Language) -> Result<()>
where
    C: ConnectionTrait,
{
    store::set(db, &layout::settings(guild), "language", language.code()).await
}

/// Channel that receives copies of moderation results.
pub async fn mod_log_channel<C>(db: &C, guild: u64) -> Result<Option<u64>>
where
    C: ConnectionTrait,
{
    let stored =
        store::get_i64(db, &format!("{}/mod_log_channel", layout::settings(guild))).await?;
    Ok(stored.and_then(|id| u64::try_from(id).ok()).filter(|id| *id != 0))
}

/// Sets or clears the moderation log channel.
pub async fn set_mod_log_channel<C>(db: &C, guild: u64, channel: Option<u64>) -> Result<()>
where
    C: ConnectionTrait,
{
    let value = match channel {
        // Snowflakes fit in 63 bits.
        Some(id) => i64::try_from(id).map_or(Value::Null, Value::from),
        None => Value::Null,
    };
    store::set(db, &layout::settings(guild), "mod_log_channel", value).await
}

/// Writes the missing server and member defaults. Returns the number of leaves
/// written.
pub async fn ensure_guild_defaults<C, I>(db: &C, guild: u64, members: I) -> Result<usize>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = u64>,
{
    let mut written = store::ensure_defaults(db, &layout::server(guild), &layout::server_defaults()).await?;

    let user_defaults = layout::user_defaults();
    for member in members {
        written += store::ensure_defaults(db, &layout::user(guild, member), &user_defaults).await?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{set_balance, setup_test_db};

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("EN").unwrap(), Language::En);
        assert_eq!(Language::parse(" de ").unwrap(), Language::De);
        assert!(Language::parse("fr").is_err());
        assert_eq!(Language::De.toggled(), Language::En);
    }

    #[tokio::test]
    async fn test_language_defaults_to_german() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(language(&db, 1).await?, Language::De);
        set_language(&db, 1, Language::En).await?;
        assert_eq!(language(&db, 1).await?, Language::En);
        Ok(())
    }

    #[tokio::test]
    async fn test_mod_log_channel_set_and_clear() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(mod_log_channel(&db, 1).await?, None);
        set_mod_log_channel(&db, 1, Some(1_234_567_890_123)).await?;
        assert_eq!(mod_log_channel(&db, 1).await?, Some(1_234_567_890_123));
        set_mod_log_channel(&db, 1, None).await?;
        assert_eq!(mod_log_channel(&db, 1).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_guild_defaults_keep_existing_values() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, 1, 10, 500).await?;

        let written = ensure_guild_defaults(&db, 1, [10, 11]).await?;
        assert!(written > 0);
        assert_eq!(crate::core::economy::balance(&db, 1, 10).await?, 500);
        assert_eq!(
            store::get(&db, "servers/1/users/11/eco/inventory/_init").await?,
            Some(Value::Bool(true))
        );
        assert_eq!(language(&db, 1).await?, Language::De);

        assert_eq!(ensure_guild_defaults(&db, 1, [10, 11]).await?, 0);
        Ok(())
    }
}
