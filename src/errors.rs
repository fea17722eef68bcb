//! Unified error type for the whole bot.
//!
//! Domain rejections (not enough coins, invalid target, malformed time string, ...)
//! are ordinary variants so the core layer can return them with `?`; the bot layer
//! uses [`Error::is_user_facing`] to decide whether to render them as a failure card
//! or to log them and apologise.

use thiserror::Error;

/// Why a user was refused as the target of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetIssue {
    /// Bots never take part in the economy or games
    Bot,
    /// The actor tried to target themselves
    SelfTarget,
    /// The target is not part of this game
    NotParticipant,
    /// The bot's highest role does not outrank the target's
    RoleHierarchy,
}

/// All errors produced by Comet.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Chat framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),

    /// Outbound HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialisation error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Formatting into a string buffer failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Amount is zero, negative or otherwise unusable
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Balance does not cover the requested amount
    #[error("Insufficient funds: have {current}, need {required}")]
    InsufficientFunds {
        /// Current balance
        current: i64,
        /// Amount that would have been needed
        required: i64,
    },

    /// Action targeted a user that may not be targeted
    #[error("Invalid target: {issue:?}")]
    InvalidTarget {
        /// The reason for the refusal
        issue: TargetIssue,
    },

    /// Daily bonus already collected inside the current window
    #[error("Daily bonus already claimed, {remaining_secs}s remaining")]
    AlreadyClaimed {
        /// Seconds until the next claim is possible
        remaining_secs: i64,
    },

    /// Time string could not be parsed
    #[error("Invalid time: {input}")]
    InvalidTime {
        /// The rejected input
        input: String,
    },

    /// Looked-up entity does not exist
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing entity
        what: String,
    },

    /// Mini-game state machine refused a transition
    #[error("Game error: {message}")]
    Game {
        /// Human readable reason
        message: String,
    },

    /// Third-party service answered with something unusable
    #[error("{service} failed: {message}")]
    ExternalService {
        /// Service name
        service: &'static str,
        /// Failure details
        message: String,
    },
}

impl Error {
    /// Returns true for permission and invalid-input errors that should be shown
    /// to the user as a failure card instead of being logged as a fault.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::InsufficientFunds { .. }
                | Self::InvalidTarget { .. }
                | Self::AlreadyClaimed { .. }
                | Self::InvalidTime { .. }
                | Self::NotFound { .. }
                | Self::Game { .. }
        )
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
